//! Weierstrass prime-field elliptic curve points and scalar recoding.
//!
//! The three coordinate systems (affine, projective, Jacobian) share one
//! operation set and are carried as a tagged sum; the formulas are the
//! standard ones, with the a = -3 shortcut taken in the projective and
//! Jacobian doublings when the curve allows it.

use crate::error::{Error, Result};
use crate::mpz::{ModCtx, Mpz, Reduction};

mod affine;
mod curves;
mod jacobian;
mod projective;
mod scalar;

pub use affine::AffinePoint;
pub use curves::{secp192r1, secp256r1};
pub use jacobian::JacobianPoint;
pub use projective::ProjectivePoint;
pub use scalar::{ScalarCoding, ScalarParser, SCALAR_IS_HIGH, SCALAR_IS_LOW, SCALAR_IS_SUBTRACT};

/// Outcome of a point operation that can degenerate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointOutcome {
    /// The operation produced a finite point.
    Ok,
    /// The operation hit the point at infinity.
    Infinity,
}

/// Coordinate system selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coordinates {
    /// (x, y).
    Affine,
    /// (X, Y, Z) with x = X/Z, y = Y/Z.
    Projective,
    /// (X, Y, Z) with x = X/Z^2, y = Y/Z^3.
    Jacobian,
}

/// Curve configuration: the field context and the Weierstrass constants.
#[derive(Clone, Debug)]
pub struct EccConfig {
    /// Prime field context.
    pub modctx: ModCtx,
    /// Curve constant a, in the context's representation.
    pub a: Mpz,
    /// Curve constant b, in the context's representation.
    pub b: Mpz,
    /// True when a = p - 3, enabling the doubling shortcut.
    pub a_is_minus_3: bool,
    /// Group order of the base point.
    pub order: Mpz,
    /// Field size in bits.
    pub bits: usize,
}

impl EccConfig {
    /// Build a configuration from canonical curve constants.
    pub fn new(p: Mpz, a: Mpz, b: Mpz, order: Mpz, reduction: Reduction) -> Result<Self> {
        let three = Mpz::from(3u32);
        let a_is_minus_3 = (&p - &a) == three;
        let bits = p.bit_len();
        let modctx = ModCtx::new(p, reduction)?;

        let mut a_repr = a;
        let mut b_repr = b;
        a_repr.mod_positive(&modctx);
        b_repr.mod_positive(&modctx);
        if modctx.reduction == Reduction::Montgomery {
            a_repr.to_mont(&modctx);
            b_repr.to_mont(&modctx);
        }

        Ok(Self {
            modctx,
            a: a_repr,
            b: b_repr,
            a_is_minus_3,
            order,
            bits,
        })
    }

    /// Canonical byte width of a field element.
    pub fn byte_len(&self) -> usize {
        (self.bits + 7) >> 3
    }
}

/// A Weierstrass prime-field point in one of the coordinate systems.
#[derive(Clone, Debug)]
pub enum PrimePoint {
    /// Affine coordinates.
    Affine(AffinePoint),
    /// Homogeneous projective coordinates.
    Projective(ProjectivePoint),
    /// Jacobian coordinates.
    Jacobian(JacobianPoint),
}

impl PrimePoint {
    /// Import an affine (x, y) pair into the chosen coordinate system.
    pub fn convert_to(coords: Coordinates, cfg: &EccConfig, x: &Mpz, y: &Mpz) -> Self {
        match coords {
            Coordinates::Affine => Self::Affine(AffinePoint::convert_to(cfg, x, y)),
            Coordinates::Projective => Self::Projective(ProjectivePoint::convert_to(cfg, x, y)),
            Coordinates::Jacobian => Self::Jacobian(JacobianPoint::convert_to(cfg, x, y)),
        }
    }

    /// Export to a canonical affine (x, y) pair.
    pub fn convert_from(&self, cfg: &EccConfig) -> Result<(Mpz, Mpz)> {
        match self {
            Self::Affine(p) => p.convert_from(cfg),
            Self::Projective(p) => p.convert_from(cfg),
            Self::Jacobian(p) => p.convert_from(cfg),
        }
    }

    /// Scale so z = 1 while staying in the current system.
    pub fn convert_to_mixed(&mut self, cfg: &EccConfig) -> Result<()> {
        match self {
            Self::Affine(_) => Ok(()),
            Self::Projective(p) => p.convert_to_mixed(cfg),
            Self::Jacobian(p) => p.convert_to_mixed(cfg),
        }
    }

    /// `w` repeated doublings in place.
    pub fn doubling(&mut self, cfg: &EccConfig, w: usize) -> Result<PointOutcome> {
        match self {
            Self::Affine(p) => p.doubling(cfg, w),
            Self::Projective(p) => p.doubling(cfg, w),
            Self::Jacobian(p) => p.doubling(cfg, w),
        }
    }

    /// Point addition in place; both operands must use the same
    /// coordinate system.
    pub fn addition(&mut self, cfg: &EccConfig, rhs: &PrimePoint) -> Result<PointOutcome> {
        match (self, rhs) {
            (Self::Affine(p), Self::Affine(q)) => p.addition(cfg, q),
            (Self::Projective(p), Self::Projective(q)) => p.addition(cfg, q),
            (Self::Jacobian(p), Self::Jacobian(q)) => p.addition(cfg, q),
            _ => Err(Error::InvalidArgument("mismatched point coordinate systems")),
        }
    }

    /// Negate the point.
    pub fn negate(&mut self, cfg: &EccConfig) {
        match self {
            Self::Affine(p) => p.negate(cfg),
            Self::Projective(p) => p.negate(cfg),
            Self::Jacobian(p) => p.negate(cfg),
        }
    }

    /// True for the zero (degenerate) point.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Affine(p) => p.is_zero(),
            Self::Projective(p) => p.is_zero(),
            Self::Jacobian(p) => p.is_zero(),
        }
    }
}

/// Scalar multiplication by a secret byte string (little-endian), using
/// the parser's MSB-first binary recoding over the chosen coordinate
/// system.
pub fn scalar_mul(
    cfg: &EccConfig,
    coords: Coordinates,
    x: &Mpz,
    y: &Mpz,
    secret: &[u8],
) -> Result<(Mpz, Mpz)> {
    let mut parser = ScalarParser::new(ScalarCoding::Binary, secret)?;
    let m = parser.num_symbols();
    if m == 0 {
        return Err(Error::InvalidArgument("scalar is zero"));
    }

    let base = PrimePoint::convert_to(coords, cfg, x, y);
    let mut acc = base.clone();
    parser.pull(); // the leading symbol is always 1

    for _ in 1..m {
        if acc.doubling(cfg, 1)? == PointOutcome::Infinity {
            return Err(Error::PointError);
        }
        if parser.pull() == SCALAR_IS_HIGH {
            if acc.addition(cfg, &base)? == PointOutcome::Infinity {
                return Err(Error::PointError);
            }
        }
    }
    acc.convert_from(cfg)
}
