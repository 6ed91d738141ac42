//! A parameterisable binary Number Theoretic Transform.
//!
//! Cooley–Tukey decimation-in-time forward transform and Gentleman–Sande
//! inverse over Z_q[X]/(X^N + 1), generic over the word reducer. Twiddle
//! tables hold g^rev(i) (and the inverse generator's powers) in the
//! reducer representation. Every operation accepts a stride so the NTRU
//! solver can transform interleaved residue columns in place.

use crate::bits;
use crate::error::{Error, Result};
use crate::reduce::{umod_mul, umod_mul_inverse, Reducer};

/// NTT context for a ring of length n (a power of two).
#[derive(Clone)]
pub struct NttContext<R: Reducer> {
    reduce: R,
    n: usize,
    inv_n: u32,
    fwd: Vec<u32>,
    inv: Vec<u32>,
}

impl<R: Reducer> NttContext<R> {
    /// Build a context, deriving the 2N-th primitive root of unity.
    pub fn new(reduce: R, n: usize) -> Result<Self> {
        let q = reduce.modulus();
        let g = find_prim_root(q, n)?;
        Self::with_root(reduce, g, n)
    }

    /// Build a context from a known generator; its inverse is derived.
    pub fn with_root(reduce: R, g: u32, n: usize) -> Result<Self> {
        let q = reduce.modulus();
        let invg = umod_mul_inverse(g, q).ok_or(Error::NotInvertible)?;
        Self::with_roots(reduce, g, invg, n)
    }

    /// Build a context from a generator and its inverse.
    pub fn with_roots(reduce: R, g: u32, invg: u32, n: usize) -> Result<Self> {
        if n == 0 || !n.is_power_of_two() {
            return Err(Error::InvalidArgument("NTT length must be a power of two"));
        }
        let logn = bits::ilog2(n as u64) as usize;
        let mut ctx = Self {
            inv_n: reduce.inverse_2k(n as u32),
            reduce,
            n,
            fwd: vec![0u32; n],
            inv: vec![0u32; n],
        };
        ctx.fwd = ctx.gen_table(g, logn);
        ctx.inv = ctx.gen_table(invg, logn);
        Ok(ctx)
    }

    /// The ring length.
    pub fn len(&self) -> usize {
        self.n
    }

    /// True when the ring is empty (never, for a valid context).
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// The underlying reducer.
    pub fn reducer(&self) -> &R {
        &self.reduce
    }

    /// Table for the specified generator: p[rev(i)] = g^i in the reducer
    /// representation, filled by left-to-right square-and-multiply.
    fn gen_table(&self, g: u32, logn: usize) -> Vec<u32> {
        let n = 1usize << logn;
        let mut p = vec![0u32; n];
        let g_base = self.reduce.convert_to(g);
        let mut result = self.reduce.convert_to(1);
        for i in 0..n as u16 {
            let exp = (bits::bit_reverse_u16(i) >> (16 - logn)) as usize;
            p[exp] = result;
            result = self.reduce.mul(result, g_base);
        }
        p
    }

    /// Cooley–Tukey forward NTT, in place.
    pub fn fwd(&self, a: &mut [u32], logn: usize, stride: usize) {
        let p = &self.fwd;
        let n = 1usize << logn;
        if logn == 0 {
            return;
        }

        let mut t = n;
        let mut m = 1;
        while m < n {
            let ht = t >> 1;
            for i in 0..m {
                let j1 = i * t;
                let j2 = j1 + ht;
                let s = p[m + i];
                for j in 0..ht {
                    let i0 = (j1 + j) * stride;
                    let i1 = (j2 + j) * stride;
                    let u = a[i0];
                    let v = self.reduce.mul(a[i1], s);
                    a[i0] = self.reduce.add(u, v);
                    a[i1] = self.reduce.sub(u, v);
                }
            }
            t = ht;
            m <<= 1;
        }
    }

    /// Gentleman–Sande inverse NTT, in place, with the final scaling by
    /// 1/n.
    pub fn inv(&self, a: &mut [u32], logn: usize, stride: usize) {
        let p = &self.inv;
        let n = 1usize << logn;
        if logn == 0 {
            return;
        }

        let mut t = 1;
        let mut m = n;
        while m > 1 {
            let hm = m >> 1;
            let dt = t << 1;
            for i in 0..hm {
                let j1 = i * dt;
                let j2 = j1 + t;
                let s = p[hm + i];
                for j in 0..t {
                    let i0 = (j1 + j) * stride;
                    let i1 = (j2 + j) * stride;
                    let u = a[i0];
                    let v = a[i1];
                    let w = self.reduce.sub(u, v);
                    a[i0] = self.reduce.add(u, v);
                    a[i1] = self.reduce.mul(w, s);
                }
            }
            t = dt;
            m = hm;
        }

        // Divide each element by n via the precomputed 1/n.
        for j in 0..n {
            let idx = j * stride;
            a[idx] = self.reduce.mul(a[idx], self.inv_n);
        }
    }

    /// Pointwise multiplication in the NTT domain.
    pub fn mul(&self, out: &mut [u32], x: &[u32], y: &[u32], stride: usize) {
        for i in 0..self.n {
            out[i * stride] = self.reduce.mul(x[i * stride], y[i * stride]);
        }
    }

    /// Pointwise squaring in the NTT domain.
    pub fn sqr(&self, out: &mut [u32], x: &[u32], stride: usize) {
        for i in 0..self.n {
            out[i * stride] = self.reduce.sqr(x[i * stride]);
        }
    }

    /// Pointwise negation in the NTT domain.
    pub fn negate(&self, a: &mut [u32], stride: usize) {
        for i in 0..self.n {
            a[i * stride] = self.reduce.negate(a[i * stride]);
        }
    }

    /// Pointwise inversion via the Fermat exponent q - 2; fails when any
    /// coefficient is zero.
    pub fn inverse(&self, a: &mut [u32], stride: usize) -> bool {
        let q = self.reduce.modulus();
        for i in 0..self.n {
            let x = a[i * stride];
            if x == 0 {
                return false;
            }
            a[i * stride] = self.reduce.pow(x, q - 2);
        }
        true
    }
}

/// Search for a primitive 2n-th root of unity modulo q, from 2 upward.
pub fn find_prim_root(q: u32, n: usize) -> Result<u32> {
    for m in 2..q {
        let mut sum = 0u32;
        let mut p = m;

        // Walk m^2 .. m^2n mod q, counting how often a power hits 1.
        for _ in 1..2 * n as u32 {
            p = umod_mul(m, p, q);
            sum += (p == 1) as u32;
        }

        // The 2n-th power must be the only one equal to 1.
        if sum != 1 || p != 1 {
            continue;
        }
        return Ok(m);
    }

    Err(Error::InvalidArgument(
        "modulus has no primitive 2n-th root of unity",
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::reduce::MontgomeryReducer;

    const Q: u32 = 12289;

    fn ctx(n: usize) -> NttContext<MontgomeryReducer> {
        NttContext::new(MontgomeryReducer::new(Q, 31), n).unwrap()
    }

    /// Schoolbook negacyclic convolution for cross-checking.
    fn negacyclic_mul(a: &[u32], b: &[u32], q: u32) -> Vec<u32> {
        let n = a.len();
        let mut out = vec![0i64; n];
        for i in 0..n {
            for j in 0..n {
                let prod = a[i] as i64 * b[j] as i64 % q as i64;
                if i + j < n {
                    out[i + j] = (out[i + j] + prod) % q as i64;
                } else {
                    out[i + j - n] = (out[i + j - n] - prod).rem_euclid(q as i64);
                }
            }
        }
        out.iter().map(|&x| x.rem_euclid(q as i64) as u32).collect()
    }

    #[test]
    fn forward_inverse_round_trip() {
        let t = ctx(64);
        let mut a: Vec<u32> = (0..64u32).map(|i| (i * 97 + 3) % Q).collect();
        let orig = a.clone();
        for x in a.iter_mut() {
            *x = t.reducer().convert_to(*x);
        }
        t.fwd(&mut a, 6, 1);
        t.inv(&mut a, 6, 1);
        for x in a.iter_mut() {
            *x = t.reducer().convert_from(*x);
        }
        assert_eq!(a, orig);
    }

    #[test]
    fn pointwise_product_is_negacyclic_convolution() {
        let t = ctx(32);
        let a: Vec<u32> = (0..32u32).map(|i| (i * 31 + 11) % Q).collect();
        let b: Vec<u32> = (0..32u32).map(|i| (i * 131 + 5) % Q).collect();
        let expect = negacyclic_mul(&a, &b, Q);

        let mut an: Vec<u32> = a.iter().map(|&x| t.reducer().convert_to(x)).collect();
        let mut bn: Vec<u32> = b.iter().map(|&x| t.reducer().convert_to(x)).collect();
        t.fwd(&mut an, 5, 1);
        t.fwd(&mut bn, 5, 1);
        let mut prod = vec![0u32; 32];
        t.mul(&mut prod, &an, &bn, 1);
        t.inv(&mut prod, 5, 1);
        let got: Vec<u32> = prod.iter().map(|&x| t.reducer().convert_from(x)).collect();
        assert_eq!(got, expect);
    }

    #[test]
    fn strided_transform_matches_dense() {
        let t = ctx(16);
        let vals: Vec<u32> = (0..16u32).map(|i| t.reducer().convert_to((i * 7 + 1) % Q)).collect();

        let mut dense = vals.clone();
        t.fwd(&mut dense, 4, 1);

        let stride = 3;
        let mut wide = vec![0u32; 16 * stride];
        for (i, &v) in vals.iter().enumerate() {
            wide[i * stride] = v;
        }
        t.fwd(&mut wide, 4, stride);
        for i in 0..16 {
            assert_eq!(wide[i * stride], dense[i]);
        }
    }

    #[test]
    fn inverse_of_ring_element() {
        let t = ctx(16);
        let mut a: Vec<u32> = (1..17u32).map(|i| t.reducer().convert_to(i)).collect();
        let orig = a.clone();
        assert!(t.inverse(&mut a, 1));
        let mut prod = vec![0u32; 16];
        t.mul(&mut prod, &a, &orig, 1);
        for &x in &prod {
            assert_eq!(t.reducer().convert_from(x), 1);
        }

        let mut with_zero = orig.clone();
        with_zero[3] = 0;
        assert!(!t.inverse(&mut with_zero, 1));
    }

    #[test]
    fn root_search_finds_valid_generator() {
        let g = find_prim_root(Q, 512).unwrap();
        // g^(2n) == 1 and g^n == -1 for a primitive 2n-th root
        assert_eq!(crate::reduce::umod_pow(g, 1024, Q), 1);
        assert_eq!(crate::reduce::umod_pow(g, 512, Q), Q - 1);
    }
}
