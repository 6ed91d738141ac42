//! Bootstrap Gaussian sampler for arbitrary centre and variance.
//!
//! A ladder of combiner nodes widens the base CDF sampler (each level
//! scales the variance by z1^2 + z2^2); the top of the ladder feeds a
//! flip-and-round routine that resolves an arbitrary real centre at a
//! fixed bit precision, refined by k rounds of biased rounding at the
//! per-base-digit centres.

use crate::csprng::Csprng;

use super::{Gaussian, GaussianCdf};

struct Combiner {
    z1: i64,
    z2: i64,
}

/// Wide-range Gaussian sampler combining a base sampler network with
/// bootstrap rounding.
pub struct GaussianSampler {
    base: GaussianCdf,
    combiners: Vec<Combiner>,
    base_centre: Vec<f32>,
    k: usize,
    flips: usize,
    log_base: usize,
    mask: u64,
    wide_sigma2: f64,
    inv_wide_sigma2: f64,
    rr_sigma2: f64,
}

impl GaussianSampler {
    /// Build the combiner ladder.
    ///
    /// `base_sigma` is the base sampler deviation, `max_slevels` the
    /// ladder height, `log_base` the rounding digit width, `precision`
    /// the centre resolution in bits, `max_flips` the bit-flip budget and
    /// `eta` the smoothing parameter.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        base_sigma: f32,
        max_slevels: usize,
        log_base: usize,
        precision: usize,
        max_flips: usize,
        eta: f32,
    ) -> Self {
        let inv_two_eta_2 = 1.0 / (2.0 * eta as f64 * eta as f64);
        let base = GaussianCdf::new(base_sigma as f64, 10.0);

        let base_sigma2 = base_sigma as f64 * base_sigma as f64;
        let mut wide_sigma2 = base_sigma2;
        let mut combiners = Vec::with_capacity(max_slevels - 1);
        for _ in 0..max_slevels - 1 {
            let z1 = (wide_sigma2 * inv_two_eta_2).sqrt().floor() as i64;
            let z1 = z1.max(1);
            let z2 = if z1 > 1 { z1 - 1 } else { 1 };
            combiners.push(Combiner { z1, z2 });
            wide_sigma2 *= (z1 * z1 + z2 * z2) as f64;
        }

        let step = 1.0 / (1u64 << log_base) as f64;
        let base_centre = (0..1usize << log_base)
            .map(|i| (i as f64 * step) as f32)
            .collect();

        // Make (precision - flips) divisible by the digit width by
        // reducing the number of flips.
        let k = (precision - max_flips).div_ceil(log_base);
        let flips = precision - log_base * k;

        let mut rr_sigma2 = 1.0f64;
        let t = 1.0 / (1u64 << (2 * log_base)) as f64;
        let mut s = 1.0f64;
        for _ in 0..k.saturating_sub(1) {
            s *= t;
            rr_sigma2 += s;
        }
        rr_sigma2 *= base_sigma2;

        Self {
            base,
            combiners,
            base_centre,
            k,
            flips,
            log_base,
            mask: (1u64 << log_base) - 1,
            wide_sigma2,
            inv_wide_sigma2: 1.0 / wide_sigma2,
            rr_sigma2,
        }
    }

    /// The ladder-top variance.
    pub fn wide_sigma2(&self) -> f64 {
        self.wide_sigma2
    }

    fn combined_sample(&self, level: usize, rng: &mut Csprng) -> i64 {
        if level == 0 {
            return self.base.sample_signed(rng) as i64;
        }
        let c = &self.combiners[level - 1];
        c.z1 * self.combined_sample(level - 1, rng) + c.z2 * self.combined_sample(level - 1, rng)
    }

    /// Draw a sample with the requested variance `sigma2` around `centre`.
    pub fn sample(&self, rng: &mut Csprng, sigma2: f64, centre: f64) -> i32 {
        let x = self.combined_sample(self.combiners.len(), rng) as f64;

        // Scale the wide sample toward the requested deviation.
        let mut c = centre + x * ((sigma2 - self.rr_sigma2) * self.inv_wide_sigma2).sqrt();
        let ci = c.floor();
        c -= ci;

        ci as i32 + self.flip_and_round(rng, c)
    }

    /// Round `centre` up or down according to biased coin flips on its
    /// fractional bits.
    fn flip_and_round(&self, rng: &mut Csprng, centre: f64) -> i32 {
        let precision = self.flips + self.log_base * self.k;
        let c = (centre * (1u64 << precision) as f64) as i64;
        let base_c = c >> self.flips;
        let mut rbits = 0u64;

        let mut j = 0usize;
        for i in (0..self.flips).rev() {
            // Draw 64 random bits at a time rather than one per flip.
            if j & 0x3f == 0 {
                rbits = rng.get();
            }
            let rbit = rbits & 0x1;
            rbits >>= 1;
            j += 1;

            // Round toward zero once a disambiguating position is found.
            let check = (c >> i) & 1;
            if (rbit as i64) > check {
                return self.round(rng, base_c);
            }
            if (rbit as i64) < check {
                return self.round(rng, base_c + 1);
            }
        }
        self.round(rng, base_c + 1)
    }

    /// k rounds of biased rounding at the per-digit centres.
    fn round(&self, rng: &mut Csprng, centre: i64) -> i32 {
        let mut centre = centre;
        for _ in 0..self.k {
            let mut sample = self.base_centre[(self.mask & centre as u64) as usize] as i64
                + self.base.sample_signed(rng) as i64;
            if (self.mask & centre as u64) > 0 && centre < 0 {
                sample -= 1;
            }
            for _ in 0..self.log_base {
                // Division by two with the quotient rounded toward zero.
                centre = (centre + ((centre >> 63) & 1)) >> 1;
            }
            centre += sample;
        }
        centre as i32
    }
}
