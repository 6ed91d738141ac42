//! Modular context and modular arithmetic over [`Mpz`].
//!
//! A [`ModCtx`] is an immutable bundle describing one modulus: its bit
//! length, the chosen reduction and the Montgomery parameters R, R^2 and
//! -m^-1 mod 2^32 (or the Barrett mu). It is built once per ring and shared
//! read-only by every value in that ring.

use crate::error::{Error, Result};
use crate::reduce::uninv_minus1;

use super::{norm, ucmp, Mpz};

/// The reduction algorithm carried by a modular context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reduction {
    /// Montgomery multiplication; requires an odd modulus.
    Montgomery,
    /// Barrett reduction with a precomputed mu.
    Barrett,
}

/// Immutable description of a modulus.
#[derive(Clone, Debug)]
pub struct ModCtx {
    /// The modulus.
    pub m: Mpz,
    /// Bit length of the modulus.
    pub bits: usize,
    /// Selected reduction.
    pub reduction: Reduction,
    /// Montgomery R = 2^(32k) mod m.
    pub mont_r: Mpz,
    /// Montgomery R^2 mod m.
    pub mont_r2: Mpz,
    /// -m^-1 mod 2^32.
    pub mont_inv: u32,
    /// Barrett mu = floor(2^(2*32k) / m).
    pub mu: Mpz,
    /// Limb count of the modulus.
    pub k: usize,
}

impl ModCtx {
    /// Build a context. Montgomery reduction requires an odd modulus.
    pub fn new(m: Mpz, reduction: Reduction) -> Result<Self> {
        if m.is_zero() || m.is_negative() {
            return Err(Error::InvalidArgument("modulus must be positive"));
        }
        let k = m.limb_len();
        let bits = m.bit_len();

        let (mont_r, mont_r2, mont_inv) = if reduction == Reduction::Montgomery {
            if m.limb(0) & 1 == 0 {
                return Err(Error::InvalidArgument("Montgomery modulus must be odd"));
            }
            let mut r = Mpz::new();
            r.set_bit(32 * k);
            let r = r.rem_positive(&m);
            let r2 = (&r * &r).rem_positive(&m);
            (r, r2, uninv_minus1(m.limb(0)))
        } else {
            (Mpz::new(), Mpz::new(), 0)
        };

        let mu = if reduction == Reduction::Barrett {
            let mut t = Mpz::new();
            t.set_bit(2 * 32 * k);
            match t.divrem(&m) {
                Ok((q, _)) => q,
                Err(_) => unreachable!(),
            }
        } else {
            Mpz::new()
        };

        Ok(Self {
            m,
            bits,
            reduction,
            mont_r,
            mont_r2,
            mont_inv,
            mu,
            k,
        })
    }
}

// =============================================================================
// MODULAR OPERATIONS
// =============================================================================

impl Mpz {
    /// Reduce into [0, m); handles negative values.
    pub fn mod_positive(&mut self, ctx: &ModCtx) -> &mut Self {
        let r = self.rem_positive(&ctx.m);
        self.set(&r);
        self
    }

    /// Reduce against the context (Barrett when configured, plain
    /// division otherwise). The value must be non-negative.
    pub fn reduce(&mut self, ctx: &ModCtx) -> &mut Self {
        debug_assert!(!self.is_negative());
        if ctx.reduction == Reduction::Barrett && self.limb_len() <= 2 * ctx.k {
            // q3 = ((x >> 32(k-1)) * mu) >> 32(k+1); r = x - q3*m.
            let q1 = self.shr(32 * (ctx.k - 1));
            let q3 = (&q1 * &ctx.mu).shr(32 * (ctx.k + 1));
            let mut r = self.clone();
            let t = &q3 * &ctx.m;
            r = &r - &t;
            while r.cmp_abs(&ctx.m) != core::cmp::Ordering::Less || r.is_negative() {
                if r.is_negative() {
                    r = &r + &ctx.m;
                } else {
                    r = &r - &ctx.m;
                }
            }
            self.set(&r);
        } else {
            self.mod_positive(ctx);
        }
        self
    }

    /// self = (self + rhs) mod m for operands already in [0, m).
    pub fn add_mod(&mut self, rhs: &Mpz, ctx: &ModCtx) -> &mut Self {
        let mut s = &*self + rhs;
        if s.cmp_abs(&ctx.m) != core::cmp::Ordering::Less {
            s = &s - &ctx.m;
        }
        self.set(&s);
        self
    }

    /// self = (self - rhs) mod m for operands already in [0, m).
    pub fn sub_mod(&mut self, rhs: &Mpz, ctx: &ModCtx) -> &mut Self {
        let mut d = &*self - rhs;
        if d.is_negative() {
            d = &d + &ctx.m;
        }
        self.set(&d);
        self
    }

    /// self = self * rhs mod m, honouring the context's reduction (a
    /// Montgomery product when the context is Montgomery).
    pub fn mul_mod(&mut self, rhs: &Mpz, ctx: &ModCtx) -> &mut Self {
        if ctx.reduction == Reduction::Montgomery {
            self.mul_mont(rhs, ctx)
        } else {
            let p = &*self * rhs;
            self.set(&p);
            self.reduce(ctx)
        }
    }

    /// self = self^2 mod m under the context's reduction.
    pub fn square_mod(&mut self, ctx: &ModCtx) -> &mut Self {
        let rhs = self.clone();
        self.mul_mod(&rhs, ctx)
    }

    /// Montgomery product: self = self * rhs * R^-1 mod m (CIOS).
    pub fn mul_mont(&mut self, rhs: &Mpz, ctx: &ModCtx) -> &mut Self {
        let k = ctx.k;
        let mut t = vec![0u32; k + 2];
        for i in 0..k {
            let ai = self.limb(i);

            // t += ai * rhs
            let mut carry = 0u64;
            for j in 0..k {
                let s = t[j] as u64 + ai as u64 * rhs.limb(j) as u64 + carry;
                t[j] = s as u32;
                carry = s >> 32;
            }
            let s = t[k] as u64 + carry;
            t[k] = s as u32;
            t[k + 1] = t[k + 1].wrapping_add((s >> 32) as u32);

            // u = t[0] * (-m^-1) mod 2^32; t = (t + u*m) / 2^32
            let u = t[0].wrapping_mul(ctx.mont_inv);
            let s = t[0] as u64 + u as u64 * ctx.m.limb(0) as u64;
            let mut carry = s >> 32;
            for j in 1..k {
                let s = t[j] as u64 + u as u64 * ctx.m.limb(j) as u64 + carry;
                t[j - 1] = s as u32;
                carry = s >> 32;
            }
            let s = t[k] as u64 + carry;
            t[k - 1] = s as u32;
            t[k] = t[k + 1].wrapping_add((s >> 32) as u32);
            t[k + 1] = 0;
        }

        norm(&mut t);
        if ucmp(&t, ctx.m.limbs()) != core::cmp::Ordering::Less {
            t = super::usub(&t, ctx.m.limbs());
        }
        self.limbs = t;
        self.neg = false;
        self
    }

    /// Leave the Montgomery domain: self = self * R^-1 mod m.
    pub fn reduce_mont(&mut self, ctx: &ModCtx) -> &mut Self {
        let one = Mpz::from(1u32);
        self.mul_mont(&one, ctx)
    }

    /// Enter the Montgomery domain: self = self * R mod m.
    pub fn to_mont(&mut self, ctx: &ModCtx) -> &mut Self {
        let r2 = ctx.mont_r2.clone();
        self.mul_mont(&r2, ctx)
    }

    /// Modular inverse respecting the context's domain: for a Montgomery
    /// context the input and output are both Montgomery residues.
    pub fn invert_mod(&self, ctx: &ModCtx) -> Option<Mpz> {
        let mut inv = self.invert(&ctx.m)?;
        if ctx.reduction == Reduction::Montgomery {
            // (aR)^-1 = a^-1 R^-1; two R^2 products restore a^-1 R.
            inv.to_mont(ctx);
            inv.to_mont(ctx);
        }
        Some(inv)
    }
}
