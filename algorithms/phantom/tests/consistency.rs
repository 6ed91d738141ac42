//! Algebraic invariants across the arithmetic substrate.

#![allow(clippy::unwrap_used)]

use phantom::ecc::{ScalarCoding, ScalarParser, SCALAR_IS_HIGH, SCALAR_IS_LOW, SCALAR_IS_SUBTRACT};
use phantom::fft::{poly, Fft};
use phantom::ntt::NttContext;
use phantom::reduce::{umod_mul, MontgomeryReducer, Reducer};
use phantom::{ModCtx, Mpz, Reduction};
use rand::{Rng, SeedableRng};

fn rng() -> rand::rngs::StdRng {
    rand::rngs::StdRng::seed_from_u64(0x1357_9bdf_2468_ace0)
}

// =============================================================================
// MODULAR IDENTITIES
// =============================================================================

#[test]
fn word_montgomery_identities() {
    let q = 12289u32;
    let m = MontgomeryReducer::new(q, 31);
    let mut rng = rng();
    for _ in 0..2000 {
        let x = rng.gen_range(0..q);
        // convert_from(convert_to(x)) == x mod q
        assert_eq!(m.convert_from(m.convert_to(x)), x);
        // mul(R^2, 1) == R^2 * R^-1 == R
        assert_eq!(m.mul(m.r2(), 1), m.r());
        if x != 0 {
            // mul(inv(x), x) == 1 (mod q)
            let mx = m.convert_to(x);
            assert_eq!(m.convert_from(m.mul(m.inverse(mx), mx)), 1);
        }
    }
}

#[test]
fn bigint_montgomery_identities() {
    let p = Mpz::from_str_radix("fffffffffffffffffffffffffffffffeffffffffffffffff", 16).unwrap();
    let ctx = ModCtx::new(p.clone(), Reduction::Montgomery).unwrap();
    let mut rng = rng();
    for _ in 0..50 {
        let mut bytes = [0u8; 24];
        rng.fill(&mut bytes);
        let mut x = Mpz::new();
        x.set_bytes(&bytes, true);
        x.mod_positive(&ctx);
        if x.is_zero() {
            continue;
        }

        let mut xm = x.clone();
        xm.to_mont(&ctx);
        let mut back = xm.clone();
        back.reduce_mont(&ctx);
        assert_eq!(back, x);

        let inv = xm.invert_mod(&ctx).unwrap();
        let mut prod = xm.clone();
        prod.mul_mont(&inv, &ctx);
        prod.reduce_mont(&ctx);
        assert_eq!(prod, Mpz::from(1u32));
    }
}

#[test]
fn bigint_bytes_round_trip_randomized() {
    let mut rng = rng();
    for len in 1..64usize {
        let mut bytes = vec![0u8; len];
        rng.fill(&mut bytes[..]);
        bytes[0] |= 1; // canonical: no leading zero
        let mut v = Mpz::new();
        v.set_bytes(&bytes, true);
        assert_eq!(v.get_bytes(true), bytes, "len {len}");
    }
}

// =============================================================================
// NTT
// =============================================================================

#[test]
fn ntt_round_trip_full_degree() {
    let q = 12289u32;
    let t = NttContext::new(MontgomeryReducer::new(q, 31), 512).unwrap();
    let mut rng = rng();
    let orig: Vec<u32> = (0..512).map(|_| rng.gen_range(0..q)).collect();
    let mut a: Vec<u32> = orig.iter().map(|&x| t.reducer().convert_to(x)).collect();
    t.fwd(&mut a, 9, 1);
    t.inv(&mut a, 9, 1);
    let back: Vec<u32> = a.iter().map(|&x| t.reducer().convert_from(x)).collect();
    assert_eq!(back, orig);
}

#[test]
fn ntt_is_multiplicative() {
    let q = 12289u32;
    let n = 128usize;
    let t = NttContext::new(MontgomeryReducer::new(q, 31), n).unwrap();
    let mut rng = rng();
    let a: Vec<u32> = (0..n).map(|_| rng.gen_range(0..q)).collect();
    let b: Vec<u32> = (0..n).map(|_| rng.gen_range(0..q)).collect();

    let mut an: Vec<u32> = a.iter().map(|&x| t.reducer().convert_to(x)).collect();
    let mut bn: Vec<u32> = b.iter().map(|&x| t.reducer().convert_to(x)).collect();
    t.fwd(&mut an, 7, 1);
    t.fwd(&mut bn, 7, 1);

    // fwd(a)*fwd(b) pointwise equals fwd of the negacyclic product.
    let mut lhs = vec![0u32; n];
    t.mul(&mut lhs, &an, &bn, 1);

    let mut prod = vec![0i64; n];
    for i in 0..n {
        for j in 0..n {
            let p = umod_mul(a[i], b[j], q) as i64;
            if i + j < n {
                prod[i + j] = (prod[i + j] + p) % q as i64;
            } else {
                prod[i + j - n] = (prod[i + j - n] - p).rem_euclid(q as i64);
            }
        }
    }
    let mut rhs: Vec<u32> = prod
        .iter()
        .map(|&x| t.reducer().convert_to(x.rem_euclid(q as i64) as u32))
        .collect();
    t.fwd(&mut rhs, 7, 1);

    assert_eq!(lhs, rhs);
}

// =============================================================================
// FFT
// =============================================================================

#[test]
fn fft_round_trip_error_bound_n1024() {
    let fft = Fft::new(10).unwrap();
    let mut rng = rng();
    let orig: Vec<f64> = (0..1024).map(|_| rng.gen_range(-100.0..100.0)).collect();
    let mut f = orig.clone();
    fft.fwd(&mut f);
    fft.inv(&mut f);
    let norm: f64 = orig.iter().map(|x| x * x).sum::<f64>().sqrt();
    for (a, b) in f.iter().zip(orig.iter()) {
        assert!((a - b).abs() <= norm * 2f64.powi(-50));
    }
}

#[test]
fn fft_adjoint_and_norm_helpers_are_consistent() {
    let logn = 6usize;
    let n = 1usize << logn;
    let hn = n >> 1;
    let fft = Fft::new(logn).unwrap();
    let mut rng = rng();
    let mut a: Vec<f64> = (0..n).map(|_| rng.gen_range(-4.0..4.0)).collect();
    let mut b: Vec<f64> = (0..n).map(|_| rng.gen_range(-4.0..4.0)).collect();
    fft.fwd(&mut a);
    fft.fwd(&mut b);

    // 1/invnorm2 == a*adj(a) + b*adj(b), elementwise on the real half.
    let mut inv = vec![0f64; hn];
    poly::invnorm2(&mut inv, &a, &b, logn);

    let mut aa = a.clone();
    poly::mul_self_adjoint(&mut aa, logn);
    let mut bb = b.clone();
    poly::mul_self_adjoint(&mut bb, logn);
    for u in 0..hn {
        let denom = aa[u] + bb[u];
        assert!((inv[u] * denom - 1.0).abs() < 1e-9);
    }
}

// =============================================================================
// SCALAR RECODING
// =============================================================================

fn to_value(secret: &[u8]) -> u128 {
    secret
        .iter()
        .enumerate()
        .fold(0u128, |acc, (i, &b)| acc | (b as u128) << (8 * i))
}

#[test]
fn all_codings_reconstruct_random_scalars() {
    let mut rng = rng();
    for _ in 0..40 {
        let mut secret = [0u8; 12];
        rng.fill(&mut secret);
        let value = to_value(&secret);

        // Binary.
        let mut p = ScalarParser::new(ScalarCoding::Binary, &secret).unwrap();
        let mut acc = 0u128;
        for _ in 0..p.num_symbols() {
            acc = (acc << 1) | (p.pull() == SCALAR_IS_HIGH) as u128;
        }
        assert_eq!(acc, value);

        // Window widths.
        for w in 2..=8u32 {
            let mut p = ScalarParser::new(ScalarCoding::Window(w), &secret).unwrap();
            let mut acc = 0u128;
            for _ in 0..p.num_symbols() {
                let sym = p.pull();
                let digit = if sym == SCALAR_IS_LOW { 0 } else { sym };
                acc = (acc << w) | digit as u128;
            }
            assert_eq!(acc, value, "window w = {w}");
        }

        // NAF widths.
        for w in 2..=7u32 {
            let mut p = ScalarParser::new(ScalarCoding::Naf(w), &secret).unwrap();
            let mut acc = 0i128;
            for _ in 0..p.num_symbols() {
                acc <<= 1;
                let sym = p.pull();
                if sym != SCALAR_IS_LOW {
                    let mag = (sym & 0xFF) as i128;
                    acc += if sym & SCALAR_IS_SUBTRACT != 0 { -mag } else { mag };
                }
            }
            assert_eq!(acc as u128, value, "NAF w = {w}");
        }
    }
}
