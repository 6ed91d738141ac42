//! Floating-point FFT over R[X]/(X^N + 1).
//!
//! The representation is Falcon's: an array of N doubles holds N/2 complex
//! values (real parts in the lower half, imaginary parts in the upper half)
//! at the odd powers of the 2N-th root of unity, stored in bit-reversed
//! order. Under this layout the first forward iteration is a no-op.
//!
//! The shared twiddle table GM[j] = exp(i*pi*rev10(j)/1024) covers ring
//! degrees up to 1024 (log N <= 10) and is materialized once.

use std::sync::LazyLock;

use crate::error::{Error, Result};

pub mod poly;

/// Twiddle table: 1024 complex values as (re, im) pairs.
static GM_TAB: LazyLock<Vec<f64>> = LazyLock::new(|| {
    let mut tab = vec![0f64; 2048];
    for j in 0..1024u16 {
        let rev = (j.reverse_bits() >> 6) as f64;
        let angle = core::f64::consts::PI * rev / 1024.0;
        tab[2 * j as usize] = angle.cos();
        tab[2 * j as usize + 1] = angle.sin();
    }
    tab
});

// Complex helpers over the split representation.

#[inline]
fn cmul(a_re: f64, a_im: f64, b_re: f64, b_im: f64) -> (f64, f64) {
    (a_re * b_re - a_im * b_im, a_re * b_im + a_im * b_re)
}

#[inline]
fn cdiv(a_re: f64, a_im: f64, b_re: f64, b_im: f64) -> (f64, f64) {
    let inv_m = 1.0 / (b_re * b_re + b_im * b_im);
    let t_re = b_re * inv_m;
    let t_im = -b_im * inv_m;
    cmul(a_re, a_im, t_re, t_im)
}

/// FFT engine for a fixed ring degree N = 2^logn.
#[derive(Clone, Copy, Debug)]
pub struct Fft {
    logn: usize,
    n: usize,
}

impl Fft {
    /// Create an engine; `logn` in 1..=10.
    pub fn new(logn: usize) -> Result<Self> {
        if logn == 0 || logn > 10 {
            return Err(Error::InvalidArgument("FFT degree must be 2..=1024"));
        }
        Ok(Self { logn, n: 1 << logn })
    }

    /// Ring degree N.
    pub fn len(&self) -> usize {
        self.n
    }

    /// True when the ring would be empty (never, for a valid engine).
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Forward FFT, in place.
    ///
    /// The first iteration (f[j] + i*f[j + N/2]) is a no-op under the
    /// chosen representation: everything is already where it should be.
    pub fn fwd(&self, f: &mut [f64]) {
        let hn = self.n >> 1;
        let mut t = hn;

        let mut m = 2;
        for _u in 1..self.logn {
            let ht = t >> 1;
            let hm = m >> 1;
            let mut coeff = m << 1;

            let mut j1 = 0;
            for _i1 in 0..hm {
                let j2 = j1 + ht;
                let s_re = GM_TAB[coeff];
                let s_im = GM_TAB[coeff + 1];
                coeff += 2;
                for j in j1..j2 {
                    let x_re = f[j];
                    let x_im = f[j + hn];
                    let (y_re, y_im) = cmul(f[j + ht], f[j + ht + hn], s_re, s_im);
                    f[j] = x_re + y_re;
                    f[j + hn] = x_im + y_im;
                    f[j + ht] = x_re - y_re;
                    f[j + ht + hn] = x_im - y_im;
                }
                j1 += t;
            }

            t = ht;
            m <<= 1;
        }
    }

    /// Inverse FFT, in place.
    pub fn inv(&self, f: &mut [f64]) {
        let hn = self.n >> 1;
        let mut t = 1;
        let mut m = self.n;

        for _u in (2..=self.logn).rev() {
            let hm = m >> 1;
            let dt = t << 1;
            let mut coeff = m;

            let mut j1 = 0;
            while j1 < hn {
                let j2 = j1 + t;
                let s_re = GM_TAB[coeff];
                let s_im = -GM_TAB[coeff + 1];
                coeff += 2;
                for j in j1..j2 {
                    let x_re = f[j];
                    let x_im = f[j + hn];
                    let y_re = f[j + t];
                    let y_im = f[j + t + hn];
                    f[j] = x_re + y_re;
                    f[j + hn] = x_im + y_im;
                    let (d_re, d_im) = (x_re - y_re, x_im - y_im);
                    let (z_re, z_im) = cmul(d_re, d_im, s_re, s_im);
                    f[j + t] = z_re;
                    f[j + t + hn] = z_im;
                }
                j1 += dt;
            }

            t = dt;
            m = hm;
        }

        // The last iteration is a no-op provided we divide by N/2 instead
        // of N.
        let ni = f64::powi(2.0, 1 - self.logn as i32);
        for v in f.iter_mut().take(self.n) {
            *v *= ni;
        }
    }

    /// Split f into f0, f1 with f0(X^2) + X*f1(X^2) = f, all in FFT form.
    ///
    /// The bit-reversed representation changes indexes with regard to the
    /// textbook description: complex values are processed in pairs, the
    /// difference part is multiplied by the conjugate outer twiddle and
    /// halved.
    pub fn split_fft(&self, f0: &mut [f64], f1: &mut [f64], f: &[f64], logn: usize) {
        let n = 1usize << logn;
        let hn = n >> 1;
        let qn = hn >> 1;

        // For logn = 1 there is a single complex value (the conjugate is
        // implicit) and the loop below is skipped.
        f0[0] = f[0];
        f1[0] = f[hn];

        let mut coeff = n;
        for u in 0..qn {
            let a_re = f[u << 1];
            let a_im = f[(u << 1) + hn];
            let b_re = f[(u << 1) + 1];
            let b_im = f[(u << 1) + 1 + hn];

            f0[u] = (a_re + b_re) * 0.5;
            f0[u + qn] = (a_im + b_im) * 0.5;

            let c_re = GM_TAB[coeff];
            let c_im = -GM_TAB[coeff + 1];
            coeff += 2;
            let (t_re, t_im) = cmul(a_re - b_re, a_im - b_im, c_re, c_im);
            f1[u] = t_re * 0.5;
            f1[u + qn] = t_im * 0.5;
        }
    }

    /// Merge f0, f1 into f = f0(X^2) + X*f1(X^2), all in FFT form.
    pub fn merge_fft(&self, f: &mut [f64], f0: &[f64], f1: &[f64], logn: usize) {
        let n = 1usize << logn;
        let hn = n >> 1;
        let qn = hn >> 1;

        // An extra copy to handle the special case logn = 1.
        f[0] = f0[0];
        f[hn] = f1[0];

        let mut coeff = n;
        for u in 0..qn {
            let c_re = GM_TAB[coeff];
            let c_im = GM_TAB[coeff + 1];
            coeff += 2;

            let a_re = f0[u];
            let a_im = f0[u + qn];
            let (b_re, b_im) = cmul(f1[u], f1[u + qn], c_re, c_im);
            f[u << 1] = a_re + b_re;
            f[(u << 1) + hn] = a_im + b_im;
            f[(u << 1) + 1] = a_re - b_re;
            f[(u << 1) + 1 + hn] = a_im - b_im;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    /// Schoolbook negacyclic product over f64 coefficients.
    fn negacyclic_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
        let n = a.len();
        let mut out = vec![0f64; n];
        for i in 0..n {
            for j in 0..n {
                let p = a[i] * b[j];
                if i + j < n {
                    out[i + j] += p;
                } else {
                    out[i + j - n] -= p;
                }
            }
        }
        out
    }

    fn ramp(n: usize, scale: f64, offset: f64) -> Vec<f64> {
        (0..n).map(|i| (i as f64).mul_add(scale, offset).sin()).collect()
    }

    #[test]
    fn round_trip_error_is_tiny() {
        for logn in 1..=10usize {
            let n = 1usize << logn;
            let fft = Fft::new(logn).unwrap();
            let orig = ramp(n, 0.37, 1.1);
            let mut f = orig.clone();
            fft.fwd(&mut f);
            fft.inv(&mut f);
            let norm: f64 = orig.iter().map(|x| x * x).sum::<f64>().sqrt();
            for (a, b) in f.iter().zip(orig.iter()) {
                assert!((a - b).abs() <= norm * 2f64.powi(-50), "logn = {logn}");
            }
        }
    }

    #[test]
    fn fft_multiplication_matches_schoolbook() {
        for logn in 2..=6usize {
            let n = 1usize << logn;
            let fft = Fft::new(logn).unwrap();
            let a = ramp(n, 0.73, 0.2);
            let b = ramp(n, 1.31, 2.5);
            let expect = negacyclic_mul(&a, &b);

            let mut fa = a.clone();
            let mut fb = b.clone();
            fft.fwd(&mut fa);
            fft.fwd(&mut fb);
            poly::mul(&mut fa, &fb, logn);
            fft.inv(&mut fa);

            for (g, e) in fa.iter().zip(expect.iter()) {
                assert!((g - e).abs() < 1e-9, "logn = {logn}: {g} vs {e}");
            }
        }
    }

    #[test]
    fn split_then_merge_is_identity() {
        for logn in 1..=8usize {
            let n = 1usize << logn;
            let fft = Fft::new(logn).unwrap();
            let mut f = ramp(n, 0.11, 0.7);
            fft.fwd(&mut f);
            let orig = f.clone();

            let hn = n >> 1;
            let mut f0 = vec![0f64; hn];
            let mut f1 = vec![0f64; hn];
            fft.split_fft(&mut f0, &mut f1, &f, logn);
            let mut merged = vec![0f64; n];
            fft.merge_fft(&mut merged, &f0, &f1, logn);

            for (a, b) in merged.iter().zip(orig.iter()) {
                assert!((a - b).abs() < 1e-12, "logn = {logn}");
            }
        }
    }

    #[test]
    fn split_halves_are_even_and_odd_parts() {
        // f = f0(X^2) + X f1(X^2): check in the coefficient domain.
        let logn = 5usize;
        let n = 1usize << logn;
        let fft = Fft::new(logn).unwrap();
        let half = Fft::new(logn - 1).unwrap();
        let coeffs = ramp(n, 0.19, 1.9);

        let mut f = coeffs.clone();
        fft.fwd(&mut f);
        let hn = n >> 1;
        let mut f0 = vec![0f64; hn];
        let mut f1 = vec![0f64; hn];
        fft.split_fft(&mut f0, &mut f1, &f, logn);
        half.inv(&mut f0);
        half.inv(&mut f1);

        for u in 0..hn {
            assert!((f0[u] - coeffs[2 * u]).abs() < 1e-10);
            assert!((f1[u] - coeffs[2 * u + 1]).abs() < 1e-10);
        }
    }
}
