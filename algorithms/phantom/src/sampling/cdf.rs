//! Tabulated cumulative-distribution Gaussian sampler.

use crate::bits;
use crate::csprng::Csprng;
use crate::ct;

use super::Gaussian;

const M_2_SQRTPI: f64 = 1.128_379_167_095_512_6;
const M_SQRT1_2: f64 = core::f64::consts::FRAC_1_SQRT_2;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Gaussian sampler over a precomputed CDF table.
///
/// The table holds `2^ceil(log2(tail * sigma))` thresholds scaled to the
/// full u64 range; sampling draws one uniform word and binary-searches in
/// a fixed number of steps, so the search is constant-time with respect
/// to the drawn value.
pub struct GaussianCdf {
    cdf: Vec<u64>,
    steps: usize,
}

impl GaussianCdf {
    /// Build the table for the target standard deviation and tail cut.
    pub fn new(sigma: f64, tail: f32) -> Self {
        let bits = bits::ilog2_ceil((tail as f64 * sigma) as u64);
        let size = 1usize << bits;
        let mut cdf = vec![0u64; size];

        // 2/sqrt(2*pi) * 2^64 / sigma
        let d = M_2_SQRTPI * M_SQRT1_2 * TWO_POW_64 / sigma;
        let e = -0.5 / (sigma * sigma);

        let mut s = 0.5 * d;
        cdf[0] = 0;
        let mut i = 1;
        let mut j = 1.0f64;
        let mut ej = e;
        while i < size - 1 {
            cdf[i] = s.round() as u64;
            if cdf[i] == 0 {
                // overflow
                break;
            }
            s += d * (ej * j).exp();
            j += 1.0;
            if cdf[i - 1] > cdf[i] {
                break;
            }
            ej += e;
            i += 1;
        }
        for v in cdf.iter_mut().skip(i) {
            *v = u64::MAX;
        }

        let mut steps = 0;
        let mut st = size >> 1;
        while st > 0 {
            steps += 1;
            st >>= 1;
        }

        Self { cdf, steps }
    }

    /// Fixed-step binary search: the largest index a with l[a] <= x.
    fn binary_search(x: u64, l: &[u64], steps: usize) -> u32 {
        let mut a = 0u64;
        let mut st = (l.len() >> 1) as u64;
        for _ in 0..steps {
            let b = a + st;
            let c = ct::cmp_lessthan(l[b as usize], x);
            a = ct::if_true(c, b) + ct::if_false(c, a);
            st >>= 1;
        }
        a as u32
    }
}

impl Gaussian for GaussianCdf {
    fn sample_signed(&self, rng: &mut Csprng) -> i32 {
        let x: u64 = rng.get();
        let a = Self::binary_search(x, &self.cdf, self.steps) as i32;
        // Mix the low bit of the draw in as the sign.
        let m = (x as i32 & 1).wrapping_neg();
        (a ^ m).wrapping_sub(m)
    }

    fn sample_unsigned(&self, rng: &mut Csprng) -> i32 {
        let x: u64 = rng.get();
        Self::binary_search(x, &self.cdf, self.steps) as i32
    }
}
