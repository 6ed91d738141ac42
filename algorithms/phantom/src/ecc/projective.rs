//! Weierstrass prime point with homogeneous projective coordinates
//! (x = X/Z, y = Y/Z).

use crate::error::{Error, Result};
use crate::mpz::{Mpz, Reduction};

use super::{EccConfig, PointOutcome};

/// Projective (X, Y, Z) point.
#[derive(Clone, Debug)]
pub struct ProjectivePoint {
    pub(super) x: Mpz,
    pub(super) y: Mpz,
    pub(super) z: Mpz,
    pub(super) z_is_one: bool,
}

impl ProjectivePoint {
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

    /// Export canonical (x, y) = (X/Z, Y/Z).
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
        let out_x = (&x * &inv_z).rem_positive(&ctx.m);
        let out_y = (&y * &inv_z).rem_positive(&ctx.m);
        Ok((out_x, out_y))
    }

    /// Scale so Z = 1 while staying projective.
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

            // m = a*z^2 + 3*x^2, with the a = -3 shortcut
            // m = 3*(x - z)*(x + z) scaled by z: 3*(x^2 - z^2)
            let m = if cfg.a_is_minus_3 {
                let mut x2 = self.x.clone();
                x2.square_mod(ctx);
                let mut z2 = self.z.clone();
                z2.square_mod(ctx);
                let mut d = x2;
                d.sub_mod(&z2, ctx);
                let mut m = d.clone();
                m.add_mod(&d, ctx).add_mod(&d, ctx);
                m
            } else {
                let mut x2 = self.x.clone();
                x2.square_mod(ctx);
                let mut m = x2.clone();
                m.add_mod(&x2, ctx).add_mod(&x2, ctx);
                let mut az2 = self.z.clone();
                az2.square_mod(ctx).mul_mod(&cfg.a, ctx);
                m.add_mod(&az2, ctx);
                m
            };

            // s = y*z
            let mut s = self.y.clone();
            s.mul_mod(&self.z, ctx);

            // b = x*y*s
            let mut b = self.x.clone();
            b.mul_mod(&self.y, ctx).mul_mod(&s, ctx);

            // h = m^2 - 8b
            let mut b8 = b.clone();
            let t = b8.clone();
            b8.add_mod(&t, ctx);
            let t = b8.clone();
            b8.add_mod(&t, ctx);
            let t = b8.clone();
            b8.add_mod(&t, ctx);
            let mut h = m.clone();
            h.square_mod(ctx).sub_mod(&b8, ctx);

            // x' = 2*h*s
            let mut xr = h.clone();
            xr.mul_mod(&s, ctx);
            let t = xr.clone();
            xr.add_mod(&t, ctx);

            // y' = m*(4b - h) - 8*y^2*s^2
            let mut b4 = b;
            let t = b4.clone();
            b4.add_mod(&t, ctx);
            let t = b4.clone();
            b4.add_mod(&t, ctx);
            b4.sub_mod(&h, ctx).mul_mod(&m, ctx);
            let mut y2s2 = self.y.clone();
            y2s2.square_mod(ctx);
            let mut s2 = s.clone();
            s2.square_mod(ctx);
            y2s2.mul_mod(&s2, ctx);
            let t = y2s2.clone();
            y2s2.add_mod(&t, ctx);
            let t = y2s2.clone();
            y2s2.add_mod(&t, ctx);
            let t = y2s2.clone();
            y2s2.add_mod(&t, ctx);
            let mut yr = b4;
            yr.sub_mod(&y2s2, ctx);

            // z' = 8*s^3
            let mut zr = s.clone();
            zr.square_mod(ctx).mul_mod(&s, ctx);
            let t = zr.clone();
            zr.add_mod(&t, ctx);
            let t = zr.clone();
            zr.add_mod(&t, ctx);
            let t = zr.clone();
            zr.add_mod(&t, ctx);

            self.x = xr;
            self.y = yr;
            self.z = zr;
            self.z_is_one = false;

            w -= 1;
            if w == 0 {
                return Ok(PointOutcome::Ok);
            }
        }
    }

    /// Point addition.
    pub fn addition(&mut self, cfg: &EccConfig, rhs: &ProjectivePoint) -> Result<PointOutcome> {
        let ctx = &cfg.modctx;

        // u1 = y2*z1, u2 = y1*z2, v1 = x2*z1, v2 = x1*z2
        let mut u1 = rhs.y.clone();
        u1.mul_mod(&self.z, ctx);
        let mut u2 = self.y.clone();
        if !rhs.z_is_one {
            u2.mul_mod(&rhs.z, ctx);
        }
        let mut v1 = rhs.x.clone();
        v1.mul_mod(&self.z, ctx);
        let mut v2 = self.x.clone();
        if !rhs.z_is_one {
            v2.mul_mod(&rhs.z, ctx);
        }

        if v1 == v2 {
            if u1 != u2 {
                return Ok(PointOutcome::Infinity);
            }
            return self.doubling(cfg, 1);
        }

        // u = u1 - u2, v = v1 - v2
        u1.sub_mod(&u2, ctx);
        v1.sub_mod(&v2, ctx);

        // w = v^2, v2 = v^2 * v2, vc = v^3
        let mut w = v1.clone();
        w.square_mod(ctx);
        v2.mul_mod(&w, ctx);
        let mut vc = w.clone();
        vc.mul_mod(&v1, ctx);

        // zz = z1*z2
        let mut zz = self.z.clone();
        if !rhs.z_is_one {
            zz.mul_mod(&rhs.z, ctx);
        }

        // z' = zz * v^3
        let mut zr = zz.clone();
        zr.mul_mod(&vc, ctx);

        // a = zz*u^2 - 2*v2 - v^3
        let mut a = u1.clone();
        a.square_mod(ctx).mul_mod(&zz, ctx);
        a.sub_mod(&v2, ctx).sub_mod(&v2, ctx).sub_mod(&vc, ctx);

        // x' = v * a
        let mut xr = v1.clone();
        xr.mul_mod(&a, ctx);

        // y' = u*(v^2*v2 - a) - v^3*u2
        let mut yv = u2;
        yv.mul_mod(&vc, ctx);
        let mut yr = v2;
        yr.sub_mod(&a, ctx).mul_mod(&u1, ctx).sub_mod(&yv, ctx);

        self.x = xr;
        self.y = yr;
        self.z = zr;
        self.z_is_one = false;

        Ok(PointOutcome::Ok)
    }
}
