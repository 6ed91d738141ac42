//! Weierstrass prime point with affine coordinates.

use crate::error::{Error, Result};
use crate::mpz::{Mpz, Reduction};

use super::{EccConfig, PointOutcome};

/// Affine (x, y) point; z is carried for interface symmetry.
#[derive(Clone, Debug)]
pub struct AffinePoint {
    pub(super) x: Mpz,
    pub(super) y: Mpz,
    pub(super) z: Mpz,
    pub(super) z_is_one: bool,
}

impl AffinePoint {
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

    /// Export canonical (x, y).
    pub fn convert_from(&self, cfg: &EccConfig) -> Result<(Mpz, Mpz)> {
        let mut x = self.x.clone();
        let mut y = self.y.clone();
        if cfg.modctx.reduction == Reduction::Montgomery {
            x.reduce_mont(&cfg.modctx);
            y.reduce_mont(&cfg.modctx);
        }
        Ok((x, y))
    }

    /// Negate: y = -y mod p.
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
        self.x.is_zero() && self.y.is_zero()
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

            // lambda = (3x^2 + a) / 2y
            let mut two_y = self.y.clone();
            two_y.add_mod(&self.y, ctx);
            let inv = two_y.invert_mod(ctx).ok_or(Error::PointError)?;

            let mut x2 = self.x.clone();
            x2.square_mod(ctx);
            let mut lambda = x2.clone();
            lambda.add_mod(&x2, ctx).add_mod(&x2, ctx).add_mod(&cfg.a, ctx);
            lambda.mul_mod(&inv, ctx);

            // xr = lambda^2 - 2x
            let mut two_x = self.x.clone();
            two_x.add_mod(&self.x, ctx);
            let mut xr = lambda.clone();
            xr.square_mod(ctx).sub_mod(&two_x, ctx);

            // yr = lambda*(x - xr) - y
            let mut yr = self.x.clone();
            yr.sub_mod(&xr, ctx).mul_mod(&lambda, ctx).sub_mod(&self.y, ctx);

            self.x = xr;
            self.y = yr;

            w -= 1;
            if w == 0 {
                return Ok(PointOutcome::Ok);
            }
        }
    }

    /// Point addition.
    pub fn addition(&mut self, cfg: &EccConfig, rhs: &AffinePoint) -> Result<PointOutcome> {
        let ctx = &cfg.modctx;

        if self.x == rhs.x {
            if self.y != rhs.y {
                return Ok(PointOutcome::Infinity);
            }
            return self.doubling(cfg, 1);
        }

        // lambda = (yb - ya) / (xb - xa)
        let mut dx = rhs.x.clone();
        dx.sub_mod(&self.x, ctx);
        let inv = dx.invert_mod(ctx).ok_or(Error::PointError)?;
        let mut lambda = rhs.y.clone();
        lambda.sub_mod(&self.y, ctx).mul_mod(&inv, ctx);

        // xr = lambda^2 - xa - xb
        let mut xr = lambda.clone();
        xr.square_mod(ctx).sub_mod(&self.x, ctx).sub_mod(&rhs.x, ctx);

        // yr = lambda*(xa - xr) - ya
        let mut yr = self.x.clone();
        yr.sub_mod(&xr, ctx).mul_mod(&lambda, ctx).sub_mod(&self.y, ctx);

        self.x = xr;
        self.y = yr;

        Ok(PointOutcome::Ok)
    }
}
