//! Weierstrass prime point with Jacobian coordinates
//! (x = X/Z^2, y = Y/Z^3).

use crate::error::{Error, Result};
use crate::mpz::{Mpz, Reduction};

use super::{EccConfig, PointOutcome};

/// Jacobian (X, Y, Z) point.
#[derive(Clone, Debug)]
pub struct JacobianPoint {
    pub(super) x: Mpz,
    pub(super) y: Mpz,
    pub(super) z: Mpz,
    pub(super) z_is_one: bool,
}

impl JacobianPoint {
    /// Import canonical coordinates into the field representation.
    pub fn convert_to(cfg: &EccConfig, x: &Mpz, y: &Mpz) -> Self {
        let mut px = x.clone();
        let mut py = y.clone();
        let mut pz = Mpz::from(1u32);
        px.mod_positive(&cfg.modctx);
        py.mod_positive(&cfg.modctx);
        if cfg.modctx.reduction == Reduction::Montgomery {
            px.to_mont(&cfg.modctx);
            py.to_mont(&cfg.modctx);
            pz.to_mont(&cfg.modctx);
        }
        Self {
            x: px,
            y: py,
            z: pz,
            z_is_one: true,
        }
    }

    /// Export canonical (x, y) = (X/Z^2, Y/Z^3).
    pub fn convert_from(&self, cfg: &EccConfig) -> Result<(Mpz, Mpz)> {
        let ctx = &cfg.modctx;
        let (x, y, z) = if ctx.reduction == Reduction::Montgomery {
            let mut x = self.x.clone();
            let mut y = self.y.clone();
            let mut z = self.z.clone();
            x.reduce_mont(ctx);
            y.reduce_mont(ctx);
            z.reduce_mont(ctx);
            (x, y, z)
        } else {
            (self.x.clone(), self.y.clone(), self.z.clone())
        };

        let inv_z = z.invert(&ctx.m).ok_or(Error::PointError)?;
        let inv_z2 = (&inv_z * &inv_z).rem_positive(&ctx.m);
        let out_x = (&x * &inv_z2).rem_positive(&ctx.m);
        let out_y = (&(&y * &inv_z2).rem_positive(&ctx.m) * &inv_z).rem_positive(&ctx.m);
        Ok((out_x, out_y))
    }

    /// Scale so Z = 1 while staying Jacobian.
    pub fn convert_to_mixed(&mut self, cfg: &EccConfig) -> Result<()> {
        let (x, y) = self.convert_from(cfg)?;
        *self = Self::convert_to(cfg, &x, &y);
        Ok(())
    }

    /// Negate: Y = -Y mod p.
    pub fn negate(&mut self, cfg: &EccConfig) {
        let y = self.y.clone().rem_positive(&cfg.modctx.m);
        let mut neg = &cfg.modctx.m - &y;
        if neg == cfg.modctx.m {
            neg = Mpz::new();
        }
        self.y = neg;
    }

    /// True for the degenerate zero point.
    pub fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero() && self.z.is_zero()
    }

    /// `w` repeated doublings.
    pub fn doubling(&mut self, cfg: &EccConfig, w: usize) -> Result<PointOutcome> {
        let ctx = &cfg.modctx;
        let mut w = w;
        debug_assert!(w > 0);
        loop {
            if self.y.is_zero() {
                return Ok(PointOutcome::Infinity);
            }

            // s = y^2, v = 4*x*y^2
            let mut s = self.y.clone();
            s.square_mod(ctx);
            let mut v = s.clone();
            v.mul_mod(&self.x, ctx);
            let t = v.clone();
            v.add_mod(&t, ctx);
            let t = v.clone();
            v.add_mod(&t, ctx);

            // m = 3*x^2 + a*z^4, with the a = -3 shortcut
            // m = 3*(x - z^2)*(x + z^2)
            let m = if cfg.a_is_minus_3 {
                let mut z2 = self.z.clone();
                z2.square_mod(ctx);
                let mut sum = self.x.clone();
                sum.add_mod(&z2, ctx);
                let mut diff = self.x.clone();
                diff.sub_mod(&z2, ctx);
                let mut a = sum;
                a.mul_mod(&diff, ctx);
                let mut m = a.clone();
                m.add_mod(&a, ctx).add_mod(&a, ctx);
                m
            } else {
                let mut z4 = self.z.clone();
                z4.square_mod(ctx).square_mod(ctx);
                z4.mul_mod(&cfg.a, ctx);
                let mut x2 = self.x.clone();
                x2.square_mod(ctx);
                let mut m = x2.clone();
                m.add_mod(&x2, ctx).add_mod(&x2, ctx).add_mod(&z4, ctx);
                m
            };

            // x' = m^2 - 2v
            let mut xr = m.clone();
            xr.square_mod(ctx).sub_mod(&v, ctx).sub_mod(&v, ctx);

            // z' = 2*y*z
            self.z.mul_mod(&self.y, ctx);
            let zt = self.z.clone();
            self.z.add_mod(&zt, ctx);
            self.z_is_one = false;

            // y' = m*(v - x') - 8*y^4
            let mut s4 = s;
            s4.square_mod(ctx);
            let mut e = s4.clone();
            e.add_mod(&s4, ctx);
            let e2 = e.clone();
            e.add_mod(&e2, ctx);
            let e3 = e.clone();
            e.add_mod(&e3, ctx);
            let mut yr = v;
            yr.sub_mod(&xr, ctx).mul_mod(&m, ctx).sub_mod(&e, ctx);

            self.x = xr;
            self.y = yr;

            w -= 1;
            if w == 0 {
                return Ok(PointOutcome::Ok);
            }
        }
    }

    /// Point addition; takes the mixed-coordinate shortcut when the
    /// right-hand side has Z = 1.
    pub fn addition(&mut self, cfg: &EccConfig, rhs: &JacobianPoint) -> Result<PointOutcome> {
        let ctx = &cfg.modctx;

        let (mut u1, mut v1) = if rhs.z_is_one {
            (self.x.clone(), self.y.clone())
        } else {
            let mut w = rhs.z.clone();
            w.square_mod(ctx);
            let mut u1 = self.x.clone();
            u1.mul_mod(&w, ctx);
            let mut v1 = self.y.clone();
            v1.mul_mod(&w, ctx).mul_mod(&rhs.z, ctx);
            (u1, v1)
        };

        let mut a = self.z.clone();
        a.square_mod(ctx);
        let mut u2 = rhs.x.clone();
        u2.mul_mod(&a, ctx);
        let mut v2 = rhs.y.clone();
        v2.mul_mod(&a, ctx).mul_mod(&self.z, ctx);

        if u1 == u2 {
            if v1 != v2 {
                return Ok(PointOutcome::Infinity);
            }
            return self.doubling(cfg, 1);
        }

        // h = u2 - u1, r = v2 - v1
        let mut h = u2;
        h.sub_mod(&u1, ctx);
        let mut r = v2;
        r.sub_mod(&v1, ctx);

        // z' = h * z1 * z2
        self.z.mul_mod(&h, ctx);
        if !rhs.z_is_one {
            self.z.mul_mod(&rhs.z, ctx);
        }
        self.z_is_one = false;

        // h2 = h^2, h3 = h^3, r2 = r^2
        let mut h2 = h.clone();
        h2.square_mod(ctx);
        let mut h3 = h2.clone();
        h3.mul_mod(&h, ctx);
        let mut r2 = r.clone();
        r2.square_mod(ctx);

        // x' = r^2 - h^3 - 2*u1*h^2
        u1.mul_mod(&h2, ctx);
        let mut xr = r2;
        xr.sub_mod(&h3, ctx).sub_mod(&u1, ctx).sub_mod(&u1, ctx);

        // y' = r*(u1*h^2 - x') - v1*h^3
        u1.sub_mod(&xr, ctx);
        v1.mul_mod(&h3, ctx);
        let mut yr = r;
        yr.mul_mod(&u1, ctx).sub_mod(&v1, ctx);

        self.x = xr;
        self.y = yr;

        Ok(PointOutcome::Ok)
    }
}
