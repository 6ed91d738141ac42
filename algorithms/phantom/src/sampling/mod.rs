//! Discrete Gaussian sample generation.
//!
//! A tabulated CDF sampler provides the base distribution; a ladder of
//! combiner nodes widens it, and a bootstrap wrapper serves arbitrary
//! centre and variance via biased rounding.

mod cdf;
mod sampler;

pub use cdf::GaussianCdf;
pub use sampler::GaussianSampler;

use crate::csprng::Csprng;

/// A source of discrete Gaussian samples.
pub trait Gaussian {
    /// Draw a signed sample.
    fn sample_signed(&self, rng: &mut Csprng) -> i32;
    /// Draw a non-negative sample.
    fn sample_unsigned(&self, rng: &mut Csprng) -> i32;
}
