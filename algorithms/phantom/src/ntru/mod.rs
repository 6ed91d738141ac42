//! The NTRU lattice trapdoor: equation solver, LDL* tree and the
//! tree-based Gaussian lattice sampler.

pub mod ldl;
mod number;
pub mod primes;
mod solve;
mod tree;

pub use solve::{rebuild_crt, NtruSolver};
pub use tree::{gaussian_lattice_sample, gram_schmidt_norm, MasterTree};

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::csprng::Csprng;
    use crate::ntt::NttContext;
    use crate::reduce::MontgomeryReducer;
    use crate::sampling::{Gaussian, GaussianCdf};

    const Q: u32 = 12289;

    fn rng() -> Csprng {
        fn cb(buf: &mut [u8]) {
            for (i, b) in buf.iter_mut().enumerate() {
                *b = (i as u8).wrapping_mul(73).wrapping_add(29);
            }
        }
        Csprng::new(0, cb).unwrap()
    }

    /// f*G - g*F over Z[X]/(X^n + 1) with i64 coefficients.
    fn ntru_residue(f: &[i32], g: &[i32], big_f: &[i32], big_g: &[i32]) -> Vec<i64> {
        let n = f.len();
        let mut acc = vec![0i64; n];
        for i in 0..n {
            for j in 0..n {
                let fg = f[i] as i64 * big_g[j] as i64 - g[i] as i64 * big_f[j] as i64;
                if i + j < n {
                    acc[i + j] += fg;
                } else {
                    acc[i + j - n] -= fg;
                }
            }
        }
        acc
    }

    #[test]
    fn solver_satisfies_ntru_equation_small_degree() {
        let logn = 4usize;
        let n = 1usize << logn;
        let red = MontgomeryReducer::new(Q, 32);
        let ntt = NttContext::new(red.clone(), n).unwrap();
        let solver = NtruSolver::new(logn, Q, &red, &ntt);

        let sigma = 1.17 * (Q as f64 / (2 * n) as f64).sqrt();
        let sampler = GaussianCdf::new(sigma, 10.0);
        let mut rng = rng();

        let mut f = vec![0i32; n];
        let mut g = vec![0i32; n];
        let mut big_f = vec![0i32; n];
        let mut big_g = vec![0i32; n];

        let mut solved = false;
        for _ in 0..64 {
            for v in f.iter_mut() {
                *v = sampler.sample_signed(&mut rng);
            }
            for v in g.iter_mut() {
                *v = sampler.sample_signed(&mut rng);
            }
            if solver.solve(&f, &g, &mut big_f, &mut big_g) {
                solved = true;
                break;
            }
        }
        assert!(solved, "no candidate solved in 64 attempts");

        let acc = ntru_residue(&f, &g, &big_f, &big_g);
        assert_eq!(acc[0], Q as i64);
        for &c in &acc[1..] {
            assert_eq!(c, 0);
        }
    }

    #[test]
    fn public_key_matches_h_f_equals_g() {
        let logn = 4usize;
        let n = 1usize << logn;
        let red = MontgomeryReducer::new(Q, 32);
        let ntt = NttContext::new(red.clone(), n).unwrap();
        let solver = NtruSolver::new(logn, Q, &red, &ntt);

        let mut f = vec![0i32; n];
        let mut g = vec![0i32; n];
        f[0] = 3;
        f[1] = -1;
        f[3] = 2;
        g[0] = 1;
        g[2] = -2;
        g[5] = 1;

        let mut h = vec![0i32; n];
        let mut h_ntt = vec![0u32; n];
        while !solver.gen_public(&mut h, &mut h_ntt, &f, &g) {
            // Walk to the next candidate if this f is not invertible.
            f[0] += 1;
        }

        // h*f = g (mod q, mod X^n + 1).
        let mut acc = vec![0i64; n];
        for i in 0..n {
            for j in 0..n {
                let p = h[i] as i64 * f[j] as i64;
                if i + j < n {
                    acc[i + j] += p;
                } else {
                    acc[i + j - n] -= p;
                }
            }
        }
        for i in 0..n {
            let want = (g[i] as i64).rem_euclid(Q as i64);
            assert_eq!(acc[i].rem_euclid(Q as i64), want, "coefficient {i}");
        }
    }

    #[test]
    fn master_tree_preimage_is_short_and_consistent() {
        let logn = 4usize;
        let n = 1usize << logn;
        let red = MontgomeryReducer::new(Q, 32);
        let ntt = NttContext::new(red.clone(), n).unwrap();
        let solver = NtruSolver::new(logn, Q, &red, &ntt);

        let sigma = 1.17 * (Q as f64 / (2 * n) as f64).sqrt();
        let sampler = GaussianCdf::new(sigma, 10.0);
        let mut rng = rng();

        let mut f = vec![0i32; n];
        let mut g = vec![0i32; n];
        let mut big_f = vec![0i32; n];
        let mut big_g = vec![0i32; n];
        let mut h = vec![0i32; n];
        let mut h_ntt = vec![0u32; n];
        loop {
            for v in f.iter_mut() {
                *v = sampler.sample_signed(&mut rng);
            }
            for v in g.iter_mut() {
                *v = sampler.sample_signed(&mut rng);
            }
            if solver.solve(&f, &g, &mut big_f, &mut big_g)
                && solver.gen_public(&mut h, &mut h_ntt, &f, &g)
            {
                break;
            }
        }

        let tree = MasterTree::build(Q, logn, &f, &g, &big_f, &big_g);
        let c: Vec<i32> = (0..n as i32).map(|i| (i * 531 + 17).rem_euclid(Q as i32)).collect();
        let mut s1 = vec![0i32; n];
        let mut s2 = vec![0i32; n];
        tree.sample_preimage(&mut rng, Q, &c, Some(&mut s1), &mut s2);

        // s1 + s2*h = c (mod q): the sampled pair is a preimage.
        let mut acc: Vec<i64> = s1.iter().map(|&v| v as i64).collect();
        for i in 0..n {
            for j in 0..n {
                let p = s2[i] as i64 * h[j] as i64;
                if i + j < n {
                    acc[i + j] += p;
                } else {
                    acc[i + j - n] -= p;
                }
            }
        }
        for i in 0..n {
            assert_eq!(
                acc[i].rem_euclid(Q as i64),
                (c[i] as i64).rem_euclid(Q as i64),
                "coefficient {i}"
            );
        }

        // And it is short relative to q.
        let norm2: i64 = s1.iter().chain(s2.iter()).map(|&v| v as i64 * v as i64).sum();
        assert!(norm2 < (Q as i64) * (Q as i64), "norm^2 = {norm2}");
    }
}
