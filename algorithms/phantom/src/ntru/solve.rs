//! The NTRU equation solver: given short f, g, find F, G with
//! f*G - g*F = q (mod X^N + 1).
//!
//! The resultant computation runs in a residue number system over the
//! 31-bit prime table with per-prime NTTs; big integers are rebuilt with
//! the CRT, the deepest level solves a Bezout identity with an extended
//! binary GCD, and each lift back up is followed by Babai reduction in the
//! floating-point FFT. This follows the Falcon keygen construction.

use crate::bits;
use crate::fft::{poly, Fft};
use crate::ntru::number;
use crate::ntru::primes::{SMALL_PRIMES, MAX_BL_LARGE, MAX_BL_SMALL};
use crate::ntt::NttContext;
use crate::reduce::{MontgomeryReducer, Reducer};

/// Below this depth the k*f products use the NTT instead of the quadratic
/// schoolbook loop.
const DEPTH_INT_FG: usize = 4;

/// Solver for a fixed ring degree and modulus.
pub struct NtruSolver<'a> {
    logn: usize,
    q: u32,
    reduction: &'a MontgomeryReducer,
    ntt: &'a NttContext<MontgomeryReducer>,
}

/// Map a signed coefficient into [0, p).
#[inline]
fn modp_set(x: i32, p: u32) -> u32 {
    (x as u32).wrapping_add(p & ((x >> 31) as u32))
}

/// Montgomery context and NTT for prime table entry `idx` at ring degree
/// 2^logn.
fn prime_ctx(idx: usize, logn: usize) -> (MontgomeryReducer, NttContext<MontgomeryReducer>) {
    let sp = SMALL_PRIMES[idx];
    let red = MontgomeryReducer::new(sp.p, 31);
    let g = calc_gen_from_g1024(&red, sp.g, logn);
    let ntt = match NttContext::with_root(red.clone(), g, 1 << logn) {
        Ok(t) => t,
        Err(_) => unreachable!(),
    };
    (red, ntt)
}

/// Square the 2048-th root down to a primitive 2^(logn+1)-th root.
fn calc_gen_from_g1024(mont: &MontgomeryReducer, g: u32, logn: usize) -> u32 {
    let mut g = mont.convert_to(g);
    for _ in logn..10 {
        g = mont.mul(g, g);
    }
    mont.convert_from(g)
}

/// Constant-time round-to-nearest of a double whose magnitude fits 63
/// bits.
fn const_time_rint(x: f64) -> i64 {
    // Adding 2^52 forces round-to-nearest-even for |x| < 2^52; both the
    // positive and negative variants are computed and the right one is
    // selected by masks.
    let sx = (x - 1.0) as i64;
    let tx = x as i64;
    let rp = (x + 4_503_599_627_370_496.0) as i64 - 4_503_599_627_370_496;
    let rn = (x - 4_503_599_627_370_496.0) as i64 + 4_503_599_627_370_496;

    let m = ((sx as u64) >> 63) as i64;
    let m = -m;
    let rn = rn & m;
    let rp = rp & !m;

    // Clamp to tx when the 12 top bits show |tx| >= 2^52.
    let ub = ((tx as u64) >> 52) as u32;
    let m = -((((ub + 1) & 0xFFF).wrapping_sub(2) >> 31) as i64);
    let rp = rp & m;
    let rn = rn & m;
    let tx = tx & !m;

    tx | rn | rp
}

impl<'a> NtruSolver<'a> {
    /// Create a solver bound to the scheme's reduction and NTT.
    pub fn new(
        logn: usize,
        q: u32,
        reduction: &'a MontgomeryReducer,
        ntt: &'a NttContext<MontgomeryReducer>,
    ) -> Self {
        Self {
            logn,
            q,
            reduction,
            ntt,
        }
    }

    /// Attempt to solve the NTRU equation; false requests a fresh (f, g).
    pub fn solve(&self, f: &[i32], g: &[i32], big_f: &mut [i32], big_g: &mut [i32]) -> bool {
        let logn = self.logn;

        let deepest = match self.solve_deepest(f, g) {
            Some(v) => v,
            None => return false,
        };
        let (mut fd, mut gd) = deepest;

        for depth in (0..logn).rev() {
            tracing::trace!(depth, "ntru solve lift");
            match self.solve_intermediate(f, g, depth, &fd, &gd) {
                Some((nf, ng)) => {
                    fd = nf;
                    gd = ng;
                }
                None => return false,
            }
        }

        // One signed 31-bit word per coefficient at depth 0.
        if !poly_big_to_small(big_f, &fd, logn) || !poly_big_to_small(big_g, &gd, logn) {
            return false;
        }

        self.verify_equation(f, g, big_f, big_g)
    }

    /// Check f*G - g*F = q modulo the first small prime via the NTT.
    fn verify_equation(&self, f: &[i32], g: &[i32], big_f: &[i32], big_g: &[i32]) -> bool {
        let logn = self.logn;
        let n = 1usize << logn;
        let (red, ntt) = prime_ctx(0, logn);
        let p = red.modulus();

        let mut ft: Vec<u32> = f.iter().map(|&x| modp_set(x, p)).collect();
        let mut gt: Vec<u32> = g.iter().map(|&x| modp_set(x, p)).collect();
        let mut big_ft: Vec<u32> = big_f.iter().map(|&x| modp_set(x, p)).collect();
        let mut big_gt: Vec<u32> = big_g.iter().map(|&x| modp_set(x, p)).collect();

        ntt.fwd(&mut ft, logn, 1);
        ntt.fwd(&mut gt, logn, 1);
        ntt.fwd(&mut big_ft, logn, 1);
        ntt.fwd(&mut big_gt, logn, 1);

        let r = red.mul(self.q, 1);
        for u in 0..n {
            let z = red.sub(red.mul(ft[u], big_gt[u]), red.mul(gt[u], big_ft[u]));
            if z != r {
                return false;
            }
        }
        true
    }

    /// Derive the public key h = g/f mod q; also returns h in NTT form.
    /// Fails when f is not invertible in the NTT domain.
    pub fn gen_public(&self, h: &mut [i32], h_ntt: &mut [u32], f: &[i32], g: &[i32]) -> bool {
        let n = 1usize << self.logn;
        let q = self.q;

        let mut uh: Vec<u32> = f
            .iter()
            .map(|&x| self.reduction.convert_to(modp_set(x, q)))
            .collect();
        let mut t: Vec<u32> = g
            .iter()
            .map(|&x| self.reduction.convert_to(modp_set(x, q)))
            .collect();
        self.ntt.fwd(&mut uh, self.logn, 1);
        self.ntt.fwd(&mut t, self.logn, 1);

        if !self.ntt.inverse(&mut uh, 1) {
            return false;
        }

        for i in 0..n {
            uh[i] = self.reduction.mul(uh[i], t[i]);
        }
        h_ntt.copy_from_slice(&uh);

        self.ntt.inv(&mut uh, self.logn, 1);
        for i in 0..n {
            h[i] = self.reduction.convert_from(uh[i]) as i32;
        }
        true
    }

    /// Deepest level: degree-1 resultants, extended GCD, scale by q.
    fn solve_deepest(&self, f: &[i32], g: &[i32]) -> Option<(Vec<u32>, Vec<u32>)> {
        let logn = self.logn;
        let len = MAX_BL_SMALL[logn];

        let (mut fp, mut gp) = self.gen_rns_fg(f, g, logn, false);
        debug_assert_eq!(fp.len(), len);

        rebuild_crt(&mut fp, len, len, 1, false);
        rebuild_crt(&mut gp, len, len, 1, false);

        // f*u - g*v = 1, then scale the Bezout pair by q.
        let (mut u, mut v) = bezout(&fp, &gp, len)?;
        if number::mul_small(&mut v, self.q) != 0 || number::mul_small(&mut u, self.q) != 0 {
            return None;
        }

        // F = q*v, G = q*u.
        Some((v, u))
    }

    /// Compute f and g at the given depth in RNS (and NTT when asked),
    /// one coefficient per `slen` words.
    fn gen_rns_fg(&self, f: &[i32], g: &[i32], depth: usize, ntt_flag: bool) -> (Vec<u32>, Vec<u32>) {
        let logn = self.logn;
        let p0 = SMALL_PRIMES[0].p;

        let mut ft: Vec<u32> = f.iter().map(|&x| modp_set(x, p0)).collect();
        let mut gt: Vec<u32> = g.iter().map(|&x| modp_set(x, p0)).collect();

        if depth == 0 {
            if ntt_flag {
                let (_, ntt) = prime_ctx(0, logn);
                ntt.fwd(&mut ft, logn, 1);
                ntt.fwd(&mut gt, logn, 1);
            }
            return (ft, gt);
        }

        for d in 0..depth {
            let out_ntt = (d + 1) < depth || ntt_flag;
            let (nf, ng) = gen_rns_fg_step(&mut ft, &mut gt, logn - d, d, d != 0, out_ntt);
            ft = nf;
            gt = ng;
        }
        (ft, gt)
    }

    /// Lift (F, G) from depth+1 to this depth and Babai-reduce them.
    fn solve_intermediate(
        &self,
        f: &[i32],
        g: &[i32],
        depth: usize,
        fd: &[u32],
        gd: &[u32],
    ) -> Option<(Vec<u32>, Vec<u32>)> {
        let logn_top = self.logn;
        let logn = logn_top - depth;
        let n = 1usize << logn;
        let hn = n >> 1;

        let slen = MAX_BL_SMALL[depth];
        let dlen = MAX_BL_SMALL[depth + 1];
        let llen = MAX_BL_LARGE[depth];

        // Input f, g for this level in RNS + NTT.
        let (mut ft, mut gt) = self.gen_rns_fg(f, g, depth, true);

        let mut big_ft = vec![0u32; n * llen];
        let mut big_gt = vec![0u32; n * llen];

        // Reduce the deeper F, G modulo each of the llen primes.
        for u in 0..llen {
            let red = MontgomeryReducer::new(SMALL_PRIMES[u].p, 31);
            let r2 = red.r2();
            let rx = red.gen_rx(dlen);
            for v in 0..hn {
                big_ft[v * llen + u] =
                    number::mod_small_signed(&fd[v * dlen..(v + 1) * dlen], r2, &red, rx);
                big_gt[v * llen + u] =
                    number::mod_small_signed(&gd[v * dlen..(v + 1) * dlen], r2, &red, rx);
            }
        }

        // Lift: F = F'(X^2)*adj(g), G = G'(X^2)*adj(f), prime by prime.
        for u in 0..llen {
            let (red, ntt) = prime_ctx(u, logn);
            let r2 = red.r2();

            // Once slen primes are done, f and g are out of NTT form and
            // can be rebuilt as big integers.
            if u == slen {
                rebuild_crt(&mut ft, slen, slen, n, true);
                rebuild_crt(&mut gt, slen, slen, n, true);
            }

            let mut fx = vec![0u32; n];
            let mut gx = vec![0u32; n];
            if u < slen {
                for v in 0..n {
                    fx[v] = ft[v * slen + u];
                    gx[v] = gt[v * slen + u];
                }
                ntt.inv(&mut ft[u..], logn, slen);
                ntt.inv(&mut gt[u..], logn, slen);
            } else {
                let rx = red.gen_rx(slen);
                for v in 0..n {
                    fx[v] =
                        number::mod_small_signed(&ft[v * slen..(v + 1) * slen], r2, &red, rx);
                    gx[v] =
                        number::mod_small_signed(&gt[v * slen..(v + 1) * slen], r2, &red, rx);
                }
                ntt.fwd(&mut fx, logn, 1);
                ntt.fwd(&mut gx, logn, 1);
            }

            // F', G' from the deeper level (degree n/2), NTT'd.
            let mut fp = vec![0u32; hn];
            let mut gp = vec![0u32; hn];
            for v in 0..hn {
                fp[v] = big_ft[v * llen + u];
                gp[v] = big_gt[v * llen + u];
            }
            ntt.fwd(&mut fp, logn - 1, 1);
            ntt.fwd(&mut gp, logn - 1, 1);

            for v in 0..hn {
                let ft_a = fx[2 * v];
                let ft_b = fx[2 * v + 1];
                let gt_a = gx[2 * v];
                let gt_b = gx[2 * v + 1];
                let m_fp = red.mul(fp[v], r2);
                let m_gp = red.mul(gp[v], r2);
                big_ft[(2 * v) * llen + u] = red.mul(gt_b, m_fp);
                big_ft[(2 * v + 1) * llen + u] = red.mul(gt_a, m_fp);
                big_gt[(2 * v) * llen + u] = red.mul(ft_b, m_gp);
                big_gt[(2 * v + 1) * llen + u] = red.mul(ft_a, m_gp);
            }
            ntt.inv(&mut big_ft[u..], logn, llen);
            ntt.inv(&mut big_gt[u..], logn, llen);
        }

        rebuild_crt(&mut big_ft, llen, llen, n, true);
        rebuild_crt(&mut big_gt, llen, llen, n, true);

        // Babai reduction: repeatedly subtract round((F*adj(f) +
        // G*adj(g)) / (f*adj(f) + g*adj(g))) times (f, g).
        let fft = match Fft::new(logn) {
            Ok(t) => t,
            Err(_) => unreachable!(),
        };

        let maxbl_f = poly_max_bitlength(&ft, slen, slen, logn);
        let maxbl_g = poly_max_bitlength(&gt, slen, slen, logn);
        let maxbl_fg = maxbl_f.max(maxbl_g);

        let mut rt3 = vec![0f64; n];
        let mut rt4 = vec![0f64; n];
        let mut rt5 = vec![0f64; hn];
        poly_big_to_fp(&mut rt3, &ft, slen, slen, logn, maxbl_fg, maxbl_fg);
        poly_big_to_fp(&mut rt4, &gt, slen, slen, logn, maxbl_fg, maxbl_fg);
        fft.fwd(&mut rt3);
        fft.fwd(&mut rt4);
        poly::invnorm2(&mut rt5, &rt3, &rt4, logn);
        poly::adjoint(&mut rt3, logn);
        poly::adjoint(&mut rt4, logn);

        let mut rt1 = vec![0f64; n];
        let mut rt2 = vec![0f64; n];
        let mut k = vec![0i32; n];

        let mut maxbl_big: u32;
        let mut prev_maxbl_big = u32::MAX;
        let mut big_len = llen;
        loop {
            let maxbl_f = poly_max_bitlength(&big_ft, big_len, llen, logn);
            let maxbl_g = poly_max_bitlength(&big_gt, big_len, llen, logn);
            maxbl_big = maxbl_f.max(maxbl_g);
            while (big_len * 31) as u32 >= maxbl_big + 43 {
                big_len -= 1;
            }

            if maxbl_big <= maxbl_fg || maxbl_big >= prev_maxbl_big {
                break;
            }
            prev_maxbl_big = maxbl_big;

            // Aim for k coefficients of about 30 bits.
            let scale_big = maxbl_big.saturating_sub(30);
            poly_big_to_fp(&mut rt1, &big_ft, big_len, llen, logn, maxbl_big, scale_big);
            poly_big_to_fp(&mut rt2, &big_gt, big_len, llen, logn, maxbl_big, scale_big);

            fft.fwd(&mut rt1);
            fft.fwd(&mut rt2);
            poly::mul(&mut rt1, &rt3, logn);
            poly::mul(&mut rt2, &rt4, logn);
            poly::add_inplace(&mut rt2, &rt1);
            poly::mul_auto_adjoint(&mut rt2, &rt5, logn);
            fft.inv(&mut rt2);

            // Largest k magnitude decides the scaling.
            let mut max_kx = 0u64;
            for &v in rt2.iter() {
                let kx = const_time_rint(v);
                let sm = kx >> 63;
                let kxa = ((kx ^ sm) - sm) as u64;
                let cond = crate::ct::if_lte(kxa, max_kx, u64::MAX);
                max_kx = (!cond & kxa) | (cond & max_kx);
            }
            if max_kx >= 1u64 << 62 {
                return None;
            }
            let mut scale_k = bits::bitlength((max_kx >> 31) as u32);

            if scale_k + scale_big < maxbl_fg {
                scale_k = maxbl_fg - scale_big;
                if scale_k > 62 {
                    break;
                }
            }
            let final_scale = scale_big + scale_k - maxbl_fg;

            for (ku, &v) in k.iter_mut().zip(rt2.iter()) {
                let kx = const_time_rint(v);
                let sm = kx >> 63;
                let kxa = ((kx ^ sm) - sm) as u64;
                let ks = (kxa >> scale_k) as i64;
                *ku = ((ks ^ sm) - sm) as i32;
            }

            if depth <= DEPTH_INT_FG {
                poly_sub_scaled_ntt(&mut big_ft, big_len, llen, &ft, slen, slen, &k, final_scale, logn);
                poly_sub_scaled_ntt(&mut big_gt, big_len, llen, &gt, slen, slen, &k, final_scale, logn);
            } else {
                poly_sub_scaled(&mut big_ft, big_len, llen, &ft, slen, slen, &k, final_scale, logn);
                poly_sub_scaled(&mut big_gt, big_len, llen, &gt, slen, slen, &k, final_scale, logn);
            }
        }

        if maxbl_big > (slen * 31) as u32 {
            return None;
        }

        // Compact to slen words per coefficient, sign-extending when the
        // working length fell below slen.
        let compact = |src: &[u32]| -> Vec<u32> {
            let mut out = vec![0u32; n * slen];
            for u in 0..n {
                let coeff = &src[u * llen..u * llen + slen];
                let dst = &mut out[u * slen..(u + 1) * slen];
                dst.copy_from_slice(coeff);
                if big_len < slen {
                    let sign = (dst[big_len - 1] >> 30).wrapping_neg() >> 1;
                    for w in dst.iter_mut().skip(big_len) {
                        *w = sign;
                    }
                }
            }
            out
        };

        Some((compact(&big_ft), compact(&big_gt)))
    }
}

// =============================================================================
// RNS / NTT STEP
// =============================================================================

/// One halving step: from (f, g) at `logn` produce (N(f), N(g)) at
/// `logn - 1` with the wider word budget of the next depth.
fn gen_rns_fg_step(
    fs: &mut Vec<u32>,
    gs: &mut Vec<u32>,
    logn: usize,
    depth: usize,
    in_ntt: bool,
    out_ntt: bool,
) -> (Vec<u32>, Vec<u32>) {
    let n = 1usize << logn;
    let hn = n >> 1;
    let slen = MAX_BL_SMALL[depth];
    let tlen = MAX_BL_SMALL[depth + 1];

    let mut fd = vec![0u32; hn * tlen];
    let mut gd = vec![0u32; hn * tlen];

    // First slen words: use the input residues directly, de-NTTizing as
    // we go.
    for u in 0..slen {
        let (red, ntt) = prime_ctx(u, logn);
        let r2 = red.r2();

        crt_extract(&ntt, &red, n, logn, !in_ntt, r2, slen, tlen, &fs[..], u, &mut fd);
        crt_extract(&ntt, &red, n, logn, !in_ntt, r2, slen, tlen, &gs[..], u, &mut gd);

        if in_ntt {
            ntt.inv(&mut fs[u..], logn, slen);
            ntt.inv(&mut gs[u..], logn, slen);
        }

        if !out_ntt {
            ntt.inv(&mut fd[u..], logn - 1, tlen);
            ntt.inv(&mut gd[u..], logn - 1, tlen);
        }
    }

    // The residues are plain now; rebuild the integer values.
    rebuild_crt(fs, slen, slen, n, true);
    rebuild_crt(gs, slen, slen, n, true);

    // Remaining words come from modular reduction of the rebuilt values.
    for u in slen..tlen {
        let (red, ntt) = prime_ctx(u, logn);
        let r2 = red.r2();
        let rx = red.gen_rx(slen);

        crt_mod_extract(&ntt, &red, n, logn, r2, rx, slen, tlen, fs, u, &mut fd);
        crt_mod_extract(&ntt, &red, n, logn, r2, rx, slen, tlen, gs, u, &mut gd);

        if !out_ntt {
            ntt.inv(&mut fd[u..], logn - 1, tlen);
            ntt.inv(&mut gd[u..], logn - 1, tlen);
        }
    }

    (fd, gd)
}

/// Gather residue column u, NTT it if needed, and write the products of
/// even/odd pairs into the destination column (the norm N(f) in RNS+NTT).
#[allow(clippy::too_many_arguments)]
fn crt_extract(
    ntt: &NttContext<MontgomeryReducer>,
    red: &MontgomeryReducer,
    n: usize,
    logn: usize,
    ntt_flag: bool,
    r2: u32,
    slen: usize,
    tlen: usize,
    src: &[u32],
    u: usize,
    dst: &mut [u32],
) {
    let hn = n >> 1;
    let mut t1 = vec![0u32; n];
    for v in 0..n {
        t1[v] = src[v * slen + u];
    }
    if ntt_flag {
        ntt.fwd(&mut t1, logn, 1);
    }
    for v in 0..hn {
        let w0 = t1[2 * v];
        let w1 = t1[2 * v + 1];
        dst[v * tlen + u] = red.mul(red.mul(w0, w1), r2);
    }
}

/// As [`crt_extract`] but reducing rebuilt big-integer coefficients
/// modulo the prime first.
#[allow(clippy::too_many_arguments)]
fn crt_mod_extract(
    ntt: &NttContext<MontgomeryReducer>,
    red: &MontgomeryReducer,
    n: usize,
    logn: usize,
    r2: u32,
    rx: u32,
    slen: usize,
    tlen: usize,
    src: &[u32],
    u: usize,
    dst: &mut [u32],
) {
    let hn = n >> 1;
    let mut t1 = vec![0u32; n];
    for v in 0..n {
        t1[v] = number::mod_small_signed(&src[v * slen..(v + 1) * slen], r2, red, rx);
    }
    ntt.fwd(&mut t1, logn, 1);
    for v in 0..hn {
        let w0 = t1[2 * v];
        let w1 = t1[2 * v + 1];
        dst[v * tlen + u] = red.mul(red.mul(w0, w1), r2);
    }
}

// =============================================================================
// CRT RECONSTRUCTION
// =============================================================================

/// Rebuild `num` integers of `xlen` words from their RNS residues, in
/// place. When `normalize_signed` is set the results are centred around 0
/// in two's complement.
pub fn rebuild_crt(x: &mut [u32], xlen: usize, xstride: usize, num: usize, normalize_signed: bool) {
    let mut tmp = vec![0u32; xlen];
    tmp[0] = SMALL_PRIMES[0].p;
    for u in 1..xlen {
        // tmp[..u] holds the product q of the primes processed so far;
        // each value gains (x mod q) + q * (s * (xp - xq) mod p).
        let sp = SMALL_PRIMES[u];
        let red = MontgomeryReducer::new(sp.p, 31);
        let r2 = red.r2();

        for v in 0..num {
            let base = v * xstride;
            let xp = x[base + u];
            let xq = number::mod_small_unsigned(&x[base..base + u], r2, &red);
            let xr = red.mul(sp.s, red.sub(xp, xq));
            number::add_mul_small(&mut x[base..base + u + 1], &tmp[..u], xr);
        }

        tmp[u] = number::mul_small(&mut tmp[..u], sp.p);
    }

    if normalize_signed {
        for v in 0..num {
            let base = v * xstride;
            number::norm_zero(&mut x[base..base + xlen], &tmp);
        }
    }
}

// =============================================================================
// BEZOUT (EXTENDED BINARY GCD)
// =============================================================================

/// Extended binary GCD on odd x and y of equal encoded length: returns
/// (u, v) with x*u - y*v = 1, 0 <= u <= y, 0 <= v <= x, or None when the
/// GCD is not 1.
pub fn bezout(x: &[u32], y: &[u32], len: usize) -> Option<(Vec<u32>, Vec<u32>)> {
    // Invariants across the loop:
    //   a = x*u0 - y*v0
    //   b = x*u1 - y*v1
    // Reduction steps keep 0 <= u0,u1 <= y and 0 <= v0,v1 <= x; the loop
    // ends when a == b == gcd(x, y).
    let xlen = exact_length(x, len);
    let ylen = exact_length(y, len);
    if xlen == 0 || ylen == 0 || (x[0] & y[0] & 1) == 0 {
        return None;
    }

    let mut u0 = vec![0u32; len];
    let mut v0 = vec![0u32; len];
    let mut u1 = vec![0u32; len];
    let mut v1 = vec![0u32; len];
    let mlen = xlen.max(ylen);
    let mut a = vec![0u32; mlen];
    let mut b = vec![0u32; mlen];

    a[..xlen].copy_from_slice(&x[..xlen]);
    b[..ylen].copy_from_slice(&y[..ylen]);
    let mut alen = xlen;
    let mut blen = ylen;

    u0[0] = 1;
    u1[..ylen].copy_from_slice(&y[..ylen]);
    v1[..xlen].copy_from_slice(&x[..xlen]);
    v1[0] ^= 1; // x is odd, so x - 1 just clears the low bit

    // Trivial solutions for x = 1 or y = 1.
    if xlen == 1 && x[0] == 1 {
        return Some((u0, v0));
    }
    if ylen == 1 && y[0] == 1 {
        return Some((u1, v1));
    }

    let x0i = crate::reduce::uninv_minus1(x[0]);
    let y0i = crate::reduce::uninv_minus1(y[0]);

    loop {
        // With large operands, 31 approximated subtraction/shift steps
        // driven by the top and bottom words stand in for 31 exact
        // iterations.
        if alen >= 3 || blen >= 3 {
            let wlen = alen.max(blen);
            let mut a_hi = ((a[wlen - 1] as u64) << 31) | a[wlen - 2] as u64;
            let mut b_hi = ((b[wlen - 1] as u64) << 31) | b[wlen - 2] as u64;
            let mut a_lo = a[0];
            let mut b_lo = b[0];
            let mut uxa = 1u32;
            let mut uxb = 0u32;
            let mut uya = 0u32;
            let mut uyb = 1u32;
            for i in 0..31 {
                let m = 1u32 << i;
                if a_lo & m == 0 {
                    a_hi >>= 1;
                    b_lo = b_lo.wrapping_shl(1);
                    uya = uya.wrapping_shl(1);
                    uyb = uyb.wrapping_shl(1);
                } else if b_lo & m == 0 {
                    b_hi >>= 1;
                    a_lo = a_lo.wrapping_shl(1);
                    uxa = uxa.wrapping_shl(1);
                    uxb = uxb.wrapping_shl(1);
                } else if a_hi > b_hi {
                    a_hi = a_hi.wrapping_sub(b_hi);
                    a_lo = a_lo.wrapping_sub(b_lo);
                    uxa = uxa.wrapping_sub(uya);
                    uxb = uxb.wrapping_sub(uyb);
                    a_hi >>= 1;
                    b_lo = b_lo.wrapping_shl(1);
                    uya = uya.wrapping_shl(1);
                    uyb = uyb.wrapping_shl(1);
                } else {
                    b_hi = b_hi.wrapping_sub(a_hi);
                    b_lo = b_lo.wrapping_sub(a_lo);
                    uya = uya.wrapping_sub(uxa);
                    uyb = uyb.wrapping_sub(uxb);
                    b_hi >>= 1;
                    a_lo = a_lo.wrapping_shl(1);
                    uxa = uxa.wrapping_shl(1);
                    uxb = uxb.wrapping_shl(1);
                }
            }

            // A factor may land exactly on 2^31, which does not fit the
            // signed updates; handle those cases with the single-factor
            // reduction.
            if uxa == 0x8000_0000 {
                if uxb != 0 || uyb != 1 {
                    return None;
                }
                let mut ya = uya as i32;
                if reduce(&mut b[..wlen], &a[..wlen], ya) {
                    ya = -ya;
                }
                reduce_mod(&mut u1, &u0, &y[..ylen], y0i, ya);
                reduce_mod(&mut v1, &v0, &x[..xlen], x0i, ya);
            } else if uyb == 0x8000_0000 {
                if uya != 0 || uxa != 1 {
                    return None;
                }
                let mut xb = uxb as i32;
                if reduce(&mut a[..wlen], &b[..wlen], xb) {
                    xb = -xb;
                }
                reduce_mod(&mut u0, &u1, &y[..ylen], y0i, xb);
                reduce_mod(&mut v0, &v1, &x[..xlen], x0i, xb);
            } else {
                let mut xa = uxa as i32;
                let mut xb = uxb as i32;
                let mut ya = uya as i32;
                let mut yb = uyb as i32;
                let r = co_reduce(&mut a[..wlen], &mut b[..wlen], xa, xb, ya, yb);
                if r & 1 != 0 {
                    xa = -xa;
                    xb = -xb;
                }
                if r & 2 != 0 {
                    ya = -ya;
                    yb = -yb;
                }
                co_reduce_mod(&mut u0, &mut u1, &y[..ylen], y0i, xa, xb, ya, yb);
                co_reduce_mod(&mut v0, &mut v1, &x[..xlen], x0i, xa, xb, ya, yb);
            }
            alen = exact_length(&a, wlen);
            blen = exact_length(&b, wlen);
            continue;
        }

        // If a is even, halve it and adjust (u0, v0).
        if a[0] & 1 == 0 {
            number::rshift1(&mut a[..alen]);
            alen = exact_length(&a, alen);
            number::rshift1_mod(&mut u0[..ylen], &y[..ylen]);
            number::rshift1_mod(&mut v0[..xlen], &x[..xlen]);
            continue;
        }

        // If b is even, halve it and adjust (u1, v1).
        if b[0] & 1 == 0 {
            number::rshift1(&mut b[..blen]);
            blen = exact_length(&b, blen);
            number::rshift1_mod(&mut u1[..ylen], &y[..ylen]);
            number::rshift1_mod(&mut v1[..xlen], &x[..xlen]);
            continue;
        }

        let r = if alen < blen {
            core::cmp::Ordering::Less
        } else if alen > blen {
            core::cmp::Ordering::Greater
        } else {
            number::ucmp(&a[..alen], &b[..alen])
        };

        match r {
            core::cmp::Ordering::Equal => {
                // a == b == gcd(x, y); success only when that is 1.
                return (alen == 1 && a[0] == 1).then_some((u0, v0));
            }
            core::cmp::Ordering::Greater => {
                number::sub(&mut a[..alen], &b[..alen]);
                alen = exact_length(&a, alen);
                let u1c = u1.clone();
                number::sub_mod(&mut u0[..ylen], &u1c[..ylen], &y[..ylen]);
                let v1c = v1.clone();
                number::sub_mod(&mut v0[..xlen], &v1c[..xlen], &x[..xlen]);
            }
            core::cmp::Ordering::Less => {
                number::sub(&mut b[..blen], &a[..blen]);
                blen = exact_length(&b, blen);
                let u0c = u0.clone();
                number::sub_mod(&mut u1[..ylen], &u0c[..ylen], &y[..ylen]);
                let v0c = v0.clone();
                number::sub_mod(&mut v1[..xlen], &v0c[..xlen], &x[..xlen]);
            }
        }
    }
}

/// Length of x with high zero words stripped.
fn exact_length(x: &[u32], xlen: usize) -> usize {
    let mut l = xlen;
    while l > 0 && x[l - 1] == 0 {
        l -= 1;
    }
    l
}

/// Replace a with (a*xa + b*xb)/2^31 and b with (a*ya + b*yb)/2^31,
/// negating either result if it came out negative. Returns a bitmask of
/// which results were negated.
fn co_reduce(a: &mut [u32], b: &mut [u32], xa: i32, xb: i32, ya: i32, yb: i32) -> i32 {
    let len = a.len();
    let mut cca = 0i64;
    let mut ccb = 0i64;
    for u in 0..len {
        let wa = a[u] as i64;
        let wb = b[u] as i64;
        let za = wa
            .wrapping_mul(xa as i64)
            .wrapping_add(wb.wrapping_mul(xb as i64))
            .wrapping_add(cca);
        let zb = wa
            .wrapping_mul(ya as i64)
            .wrapping_add(wb.wrapping_mul(yb as i64))
            .wrapping_add(ccb);
        if u > 0 {
            a[u - 1] = (za as u32) & number::MASK31;
            b[u - 1] = (zb as u32) & number::MASK31;
        }
        cca = za >> 31;
        ccb = zb >> 31;
    }
    a[len - 1] = cca as u32;
    b[len - 1] = ccb as u32;

    let mut r = 0;
    if cca < 0 {
        negate31(a);
        r |= 1;
    }
    if ccb < 0 {
        negate31(b);
        r |= 2;
    }
    r
}

/// Two's complement negation over 31-bit limbs.
fn negate31(a: &mut [u32]) {
    let mut c = 1u32;
    for w in a.iter_mut() {
        let v = c.wrapping_add(!*w);
        *w = v & number::MASK31;
        c = (!v) >> 31;
    }
}

/// Montgomery variant of [`co_reduce`] modulo the odd m; m0i is
/// -1/m[0] mod 2^31.
#[allow(clippy::too_many_arguments)]
fn co_reduce_mod(
    a: &mut [u32],
    b: &mut [u32],
    m: &[u32],
    m0i: u32,
    xa: i32,
    xb: i32,
    ya: i32,
    yb: i32,
) {
    let len = m.len();

    // Four combined Montgomery multiplications.
    let fx = (a[0]
        .wrapping_mul(xa as u32)
        .wrapping_add(b[0].wrapping_mul(xb as u32)))
    .wrapping_mul(m0i)
        & number::MASK31;
    let fy = (a[0]
        .wrapping_mul(ya as u32)
        .wrapping_add(b[0].wrapping_mul(yb as u32)))
    .wrapping_mul(m0i)
        & number::MASK31;

    let mut cca = 0i64;
    let mut ccb = 0i64;
    for u in 0..len {
        let wa = a[u] as i64;
        let wb = b[u] as i64;
        let mut za = wa
            .wrapping_mul(xa as i64)
            .wrapping_add(wb.wrapping_mul(xb as i64))
            .wrapping_add(cca);
        let mut zb = wa
            .wrapping_mul(ya as i64)
            .wrapping_add(wb.wrapping_mul(yb as i64))
            .wrapping_add(ccb);
        za = za.wrapping_add((m[u] as u64).wrapping_mul(fx as u64) as i64);
        zb = zb.wrapping_add((m[u] as u64).wrapping_mul(fy as u64) as i64);
        if u > 0 {
            a[u - 1] = (za as u32) & number::MASK31;
            b[u - 1] = (zb as u32) & number::MASK31;
        }
        cca = za >> 31;
        ccb = zb >> 31;
    }
    a[len - 1] = (cca as u32) & number::MASK31;
    b[len - 1] = (ccb as u32) & number::MASK31;

    // Fold back into [0, m).
    if cca < 0 {
        number::add(&mut a[..len], m);
    } else if number::ucmp(&a[..len], m) != core::cmp::Ordering::Less {
        number::sub(&mut a[..len], m);
    }
    if ccb < 0 {
        number::add(&mut b[..len], m);
    } else if number::ucmp(&b[..len], m) != core::cmp::Ordering::Less {
        number::sub(&mut b[..len], m);
    }
}

/// Replace a with (a + k*b)/2^31; returns true when the result had to be
/// negated.
fn reduce(a: &mut [u32], b: &[u32], k: i32) -> bool {
    let len = a.len();
    let mut cc = 0i64;
    for u in 0..len {
        let z = (b[u] as i64)
            .wrapping_mul(k as i64)
            .wrapping_add(a[u] as i64)
            .wrapping_add(cc);
        if u > 0 {
            a[u - 1] = (z as u32) & number::MASK31;
        }
        cc = z >> 31;
    }
    a[len - 1] = cc as u32;
    if cc < 0 {
        negate31(a);
        true
    } else {
        false
    }
}

/// Replace a with (a + k*b)/2^31 mod m; m odd, m0i = -1/m[0] mod 2^31.
fn reduce_mod(a: &mut [u32], b: &[u32], m: &[u32], m0i: u32, k: i32) {
    let len = m.len();
    let f = a[0]
        .wrapping_add(b[0].wrapping_mul(k as u32))
        .wrapping_mul(m0i)
        & number::MASK31;
    let mut cc = 0i64;
    for u in 0..len {
        let mut z = (a[u] as i64)
            .wrapping_add((b[u] as i64).wrapping_mul(k as i64))
            .wrapping_add(cc);
        z = z.wrapping_add((m[u] as u64).wrapping_mul(f as u64) as i64);
        if u > 0 {
            a[u - 1] = (z as u32) & number::MASK31;
        }
        cc = z >> 31;
    }
    a[len - 1] = (cc as u32) & number::MASK31;

    if cc < 0 {
        number::add(&mut a[..len], m);
    } else if number::ucmp(&a[..len], m) != core::cmp::Ordering::Less {
        number::sub(&mut a[..len], m);
    }
}

// =============================================================================
// SCALED POLYNOMIAL SUBTRACTION
// =============================================================================

/// Maximum signed bit length over a polynomial's coefficients.
fn poly_max_bitlength(f: &[u32], flen: usize, fstride: usize, logn: usize) -> u32 {
    let n = 1usize << logn;
    let mut maxbl = 0;
    for u in 0..n {
        let bl = signed_bit_length(&f[u * fstride..u * fstride + flen]);
        maxbl = maxbl.max(bl);
    }
    maxbl
}

/// Bit length of a signed big integer, excluding the sign bit.
fn signed_bit_length(x: &[u32]) -> u32 {
    let mut xlen = x.len();
    if xlen == 0 {
        return 0;
    }
    let sign = (x[xlen - 1] >> 30).wrapping_neg() >> 1;
    while xlen > 0 && x[xlen - 1] == sign {
        xlen -= 1;
    }
    if xlen == 0 {
        return 0;
    }
    (xlen as u32 - 1) * 31 + bits::bitlength(x[xlen - 1] ^ sign)
}

/// Top 63 bits of a signed big integer starting at bit `sc`.
fn get_top(x: &[u32], sc: u32) -> i64 {
    let xlen = x.len();
    if xlen == 0 {
        return 0;
    }
    let sign = (x[xlen - 1] >> 30).wrapping_neg();
    let k = (sc / 31) as usize;
    let off = sc - 31 * k as u32;

    let (w0, w1, w2) = if k + 2 < xlen {
        (x[k], x[k + 1], x[k + 2] | (sign << 31))
    } else if k + 1 < xlen {
        (x[k], x[k + 1], sign)
    } else if k < xlen {
        (x[k], sign, sign)
    } else {
        (sign, sign, sign)
    };

    let z = ((w0 as u64) >> off)
        | ((w1 as u64) << (31 - off))
        | ((w2 as u64) << (62 - off));
    z as i64
}

/// Convert a polynomial of scaled big integers to floating point; each
/// value is approximately coeff * 2^-scale.
fn poly_big_to_fp(d: &mut [f64], f: &[u32], flen: usize, fstride: usize, logn: usize, maxbl: u32, scale: u32) {
    let n = 1usize << logn;
    let off = if maxbl < 63 { 0 } else { maxbl - 63 };
    for u in 0..n {
        let top = get_top(&f[u * fstride..u * fstride + flen], off);
        d[u] = (top as f64) * f64::powi(2.0, off as i32 - scale as i32);
    }
}

/// Final conversion to one small signed word per coefficient; fails when
/// any coefficient exceeds the packing range.
fn poly_big_to_small(d: &mut [i32], s: &[u32], logn: usize) -> bool {
    let n = 1usize << logn;
    for u in 0..n {
        let w = s[u] | ((s[u] & 0x4000_0000) << 1);
        let z = w as i32;
        if !(-8191..=8191).contains(&z) {
            return false;
        }
        d[u] = z;
    }
    true
}

/// Add k*y*2^sc to x (schoolbook helper for the scaled subtraction).
fn add_scaled_mul_small(x: &mut [u32], y: &[u32], k: i32, sch: u32, scl: u32) {
    let ylen = y.len();
    if ylen == 0 {
        return;
    }
    let xlen = x.len();
    let ysign = (y[ylen - 1] >> 30).wrapping_neg() >> 1;
    let mut tw = 0u32;
    let mut cc = 0i32;
    for u in sch as usize..xlen {
        let v = u - sch as usize;
        let wy = if v < ylen { y[v] } else { ysign };
        let wys = ((wy << scl) & number::MASK31) | tw;
        tw = if scl == 0 { 0 } else { wy >> (31 - scl) };

        let z = (wys as i64)
            .wrapping_mul(k as i64)
            .wrapping_add(x[u] as i64)
            .wrapping_add(cc as i64) as u64;
        x[u] = (z as u32) & number::MASK31;
        cc = (z >> 31) as u32 as i32;
    }
}

/// Subtract y*2^sc from x.
fn sub_scaled(x: &mut [u32], y: &[u32], sch: u32, scl: u32) {
    let ylen = y.len();
    if ylen == 0 {
        return;
    }
    let xlen = x.len();
    let ysign = (y[ylen - 1] >> 30).wrapping_neg() >> 1;
    let mut tw = 0u32;
    let mut cc = 0u32;
    for u in sch as usize..xlen {
        let v = u - sch as usize;
        let wy = if v < ylen { y[v] } else { ysign };
        let wys = ((wy << scl) & number::MASK31) | tw;
        tw = if scl == 0 { 0 } else { wy >> (31 - scl) };

        let w = x[u].wrapping_sub(wys).wrapping_sub(cc);
        x[u] = w & number::MASK31;
        cc = w >> 31;
    }
}

/// Subtract k*f (scaled by 2^sc) from F with the quadratic schoolbook
/// loop; space-efficient, used at high depth where the degree is small.
#[allow(clippy::too_many_arguments)]
fn poly_sub_scaled(
    big: &mut [u32],
    big_len: usize,
    big_stride: usize,
    f: &[u32],
    flen: usize,
    fstride: usize,
    k: &[i32],
    sc: u32,
    logn: usize,
) {
    let n = 1usize << logn;
    let sch = bits::fast_div31(sc);
    let scl = sc - 31 * sch;

    for u in 0..n {
        let mut kf = -k[u];
        let mut x = u;
        for v in 0..n {
            add_scaled_mul_small(
                &mut big[x * big_stride..x * big_stride + big_len],
                &f[v * fstride..v * fstride + flen],
                kf,
                sch,
                scl,
            );
            if u + v == n - 1 {
                x = 0;
                kf = -kf;
            } else {
                x += 1;
            }
        }
    }
}

/// Subtract k*f (scaled by 2^sc) from F, computing k*f in RNS+NTT; used
/// at low depth where the degree is large and the integers small.
#[allow(clippy::too_many_arguments)]
fn poly_sub_scaled_ntt(
    big: &mut [u32],
    big_len: usize,
    big_stride: usize,
    f: &[u32],
    flen: usize,
    fstride: usize,
    k: &[i32],
    sc: u32,
    logn: usize,
) {
    let n = 1usize << logn;
    let tlen = flen + 1;
    let mut fk = vec![0u32; n * tlen];
    let mut t1 = vec![0u32; n];

    // k*f in RNS notation, prime by prime.
    for u in 0..tlen {
        let (red, ntt) = prime_ctx(u, logn);
        let r2 = red.r2();
        let rx = red.gen_rx(flen);
        let p = red.modulus();

        for (t, &kv) in t1.iter_mut().zip(k.iter()) {
            *t = modp_set(kv, p);
        }
        ntt.fwd(&mut t1, logn, 1);

        for v in 0..n {
            fk[v * tlen + u] =
                number::mod_small_signed(&f[v * fstride..v * fstride + flen], r2, &red, rx);
        }
        ntt.fwd(&mut fk[u..], logn, tlen);
        for v in 0..n {
            let idx = v * tlen + u;
            fk[idx] = red.mul(red.mul(t1[v], fk[idx]), r2);
        }
        ntt.inv(&mut fk[u..], logn, tlen);
    }

    rebuild_crt(&mut fk, tlen, tlen, n, true);

    let sch = bits::fast_div31(sc);
    let scl = sc - 31 * sch;
    for u in 0..n {
        sub_scaled(
            &mut big[u * big_stride..u * big_stride + big_len],
            &fk[u * tlen..(u + 1) * tlen],
            sch,
            scl,
        );
    }
}
