//! Master tree over an NTRU secret basis and the tree-based Gaussian
//! lattice sampler.
//!
//! The tree packs the FFT of the basis B = [[g, -f], [G, -F]] alongside
//! the normalized LDL* tree of its Gram matrix; sampling walks the tree to
//! produce a short preimage for a target ring element.

use crate::csprng::Csprng;
use crate::fft::{poly, Fft};
use crate::sampling::{Gaussian, GaussianCdf};

use super::ldl;

/// Gaussian tail cut used by the leaf samplers.
const LEAF_TAIL: f32 = 10.0;

/// The secret basis and its normalized LDL* tree, all in FFT form.
pub struct MasterTree {
    data: Vec<f64>,
    logn: usize,
}

impl MasterTree {
    /// Build the tree for the basis (f, g, F, G) over modulus q.
    pub fn build(q: u32, logn: usize, f: &[i32], g: &[i32], big_f: &[i32], big_g: &[i32]) -> Self {
        let len = (logn + 5) << logn;
        let mut data = vec![0f64; len];
        let mut tmp = vec![0f64; 7usize << logn];
        load_skey(&mut data, q, logn, f, g, big_f, big_g, &mut tmp);
        Self { data, logn }
    }

    /// Ring degree log2.
    pub fn logn(&self) -> usize {
        self.logn
    }

    fn b00(&self) -> &[f64] {
        &self.data[..1 << self.logn]
    }

    fn b01(&self) -> &[f64] {
        &self.data[1 << self.logn..2 << self.logn]
    }

    fn b10(&self) -> &[f64] {
        &self.data[2 << self.logn..3 << self.logn]
    }

    fn b11(&self) -> &[f64] {
        &self.data[3 << self.logn..4 << self.logn]
    }

    fn tree(&self) -> &[f64] {
        &self.data[4 << self.logn..]
    }

    /// Sample a lattice point close to the target c (ring coefficients in
    /// [0, q)); writes the short pair (s1, s2).
    ///
    /// The target is mapped through the secret basis, sampled with the
    /// tree, and mapped back: s1 = c - round(z*B) on the first row, s2 =
    /// -round on the second.
    pub fn sample_preimage(
        &self,
        rng: &mut Csprng,
        q: u32,
        c: &[i32],
        s1: Option<&mut [i32]>,
        s2: &mut [i32],
    ) {
        let logn = self.logn;
        let n = 1usize << logn;

        let mut c0 = vec![0f64; n];
        let mut c1 = vec![0f64; n];
        let mut z0 = vec![0f64; n];
        let mut z1 = vec![0f64; n];
        let mut tmp = vec![0f64; 7 * n];

        for (d, &v) in c0.iter_mut().zip(c.iter()) {
            *d = v as f64;
        }

        // Map the target onto the basis: c0 = (c * B11) / q,
        // c1 = -(c * B01) / q.
        let fft = match Fft::new(logn) {
            Ok(f) => f,
            Err(_) => unreachable!(),
        };
        fft.fwd(&mut c0);
        c1.copy_from_slice(&c0);
        let ni = 1.0 / q as f64;
        poly::mul(&mut c1, self.b01(), logn);
        poly::mul_const(&mut c1, -ni, logn);
        poly::mul(&mut c0, self.b11(), logn);
        poly::mul_const(&mut c0, ni, logn);

        gaussian_lattice_sample(rng, &mut z0, &mut z1, self.tree(), &c0, &c1, logn, &mut tmp);

        // Lattice point: (z0, z1) * B.
        c0.copy_from_slice(&z0);
        c1.copy_from_slice(&z1);
        poly::mul(&mut z0, self.b00(), logn);
        poly::mul(&mut z1, self.b10(), logn);
        poly::add_inplace(&mut z0, &z1);
        z1.copy_from_slice(&c0);
        poly::mul(&mut z1, self.b01(), logn);

        c0.copy_from_slice(&z0);
        poly::mul(&mut c1, self.b11(), logn);
        poly::add_inplace(&mut c1, &z1);

        fft.inv(&mut c0);
        fft.inv(&mut c1);

        if let Some(s1) = s1 {
            for i in 0..n {
                s1[i] = c[i] - c0[i].round() as i32;
            }
        }
        for i in 0..n {
            s2[i] = -(c1[i].round() as i32);
        }
    }
}

/// Load the private key into the B0 matrix, build the Gram matrix and the
/// normalized tree. `tmp` needs 7n slots.
#[allow(clippy::too_many_arguments)]
fn load_skey(
    sk: &mut [f64],
    q: u32,
    logn: usize,
    f_src: &[i32],
    g_src: &[i32],
    big_f_src: &[i32],
    big_g_src: &[i32],
    tmp: &mut [f64],
) {
    let n = 1usize << logn;

    // B0 = [[g, -f], [G, -F]]: the key elements load directly into the
    // matrix slots.
    {
        let (b00, rest) = sk.split_at_mut(n);
        let (b01, rest) = rest.split_at_mut(n);
        let (b10, rest) = rest.split_at_mut(n);
        let (b11, _) = rest.split_at_mut(n);

        for u in 0..n {
            b01[u] = f_src[u] as f64;
            b00[u] = g_src[u] as f64;
            b11[u] = big_f_src[u] as f64;
            b10[u] = big_g_src[u] as f64;
        }

        let fft = match Fft::new(logn) {
            Ok(f) => f,
            Err(_) => unreachable!(),
        };
        fft.fwd(b00);
        fft.fwd(b01);
        fft.fwd(b10);
        fft.fwd(b11);
        poly::negate(b01);
        poly::negate(b11);
    }

    // Gram matrix G = B * B*:
    //   g00 = b00*adj(b00) + b01*adj(b01)
    //   g01 = b00*adj(b10) + b01*adj(b11)
    //   g11 = b10*adj(b10) + b11*adj(b11)
    {
        let (b, tree) = sk.split_at_mut(4 * n);
        let (g00, rest) = tmp.split_at_mut(n);
        let (g01, rest) = rest.split_at_mut(n);
        let (g11, gxx_all) = rest.split_at_mut(n);
        let (gxx, _) = gxx_all.split_at_mut(n);

        g00.copy_from_slice(&b[..n]);
        poly::mul_self_adjoint(g00, logn);
        gxx.copy_from_slice(&b[n..2 * n]);
        poly::mul_self_adjoint(gxx, logn);
        poly::add_inplace(g00, gxx);

        g01.copy_from_slice(&b[..n]);
        poly::mul_adjoint(g01, &b[2 * n..3 * n], logn);
        gxx.copy_from_slice(&b[n..2 * n]);
        poly::mul_adjoint(gxx, &b[3 * n..4 * n], logn);
        poly::add_inplace(g01, gxx);

        g11.copy_from_slice(&b[2 * n..3 * n]);
        poly::mul_self_adjoint(g11, logn);
        gxx.copy_from_slice(&b[3 * n..4 * n]);
        poly::mul_self_adjoint(gxx, logn);
        poly::add_inplace(g11, gxx);

        let mut build_tmp = vec![0f64; 4 * n];
        ldl::create_tree(tree, g00, g01, g11, logn, &mut build_tmp);
    }

    // Normalize the leaves to sigma / sqrt(x).
    let sigma = (q as f64).sqrt() * 1.55;
    ldl::normalize(&mut sk[4 * n..], sigma, logn);
}

/// Gram–Schmidt norm of the candidate basis: max of ||(f, g)||^2 and
/// q^2 * ||(q f~, q g~) / (f f~ + g g~)||^2 over FFT. Values above
/// `thresh` (or NaN) report 2*thresh so the caller resamples.
pub fn gram_schmidt_norm(f: &[i32], g: &[i32], q: u32, logn: usize, bd: f64, thresh: f64) -> f64 {
    let n = 1usize << logn;

    let mut f_fft = vec![0f64; n];
    let mut g_fft = vec![0f64; n];
    let mut modx = 0f64;
    for i in 0..n {
        f_fft[i] = f[i] as f64;
        g_fft[i] = g[i] as f64;
        modx += f_fft[i] * f_fft[i] + g_fft[i] * g_fft[i];
    }
    modx = modx.sqrt();

    // ||(g, -f)|| already exceeds the bound: no point continuing.
    if modx > bd {
        return modx;
    }

    let fft = match Fft::new(logn) {
        Ok(t) => t,
        Err(_) => unreachable!(),
    };
    let mut t = vec![0f64; n];

    fft.fwd(&mut f_fft);
    fft.fwd(&mut g_fft);

    poly::invnorm2(&mut t, &f_fft, &g_fft, logn);
    poly::adjoint(&mut f_fft, logn);
    poly::adjoint(&mut g_fft, logn);
    poly::mul_const(&mut f_fft, q as f64, logn);
    poly::mul_const(&mut g_fft, q as f64, logn);
    poly::mul_auto_adjoint(&mut f_fft, &t, logn);
    poly::mul_auto_adjoint(&mut g_fft, &t, logn);

    fft.inv(&mut f_fft);
    fft.inv(&mut g_fft);

    let mut b_n1 = 0f64;
    for i in 0..n {
        b_n1 += f_fft[i] * f_fft[i] + g_fft[i] * g_fft[i];
    }

    if b_n1 >= thresh || b_n1.is_nan() {
        return 2.0 * thresh;
    }

    if modx > b_n1 {
        modx
    } else {
        b_n1
    }
}

/// Sample (z0, z1) from the tree around the target (t0, t1), everything
/// in FFT representation. `tmp` needs 7n slots at the top level.
#[allow(clippy::too_many_arguments)]
pub fn gaussian_lattice_sample(
    rng: &mut Csprng,
    z0: &mut [f64],
    z1: &mut [f64],
    tree: &[f64],
    t0: &[f64],
    t1: &[f64],
    logn: usize,
    tmp: &mut [f64],
) {
    let n = 1usize << logn;
    if n == 1 {
        let sigma = tree[0];
        let sampler = GaussianCdf::new(sigma, LEAF_TAIL);
        z0[0] = t0[0].floor() + sampler.sample_signed(rng) as f64;
        z1[0] = t1[0].floor() + sampler.sample_signed(rng) as f64;
        return;
    }

    let hn = n >> 1;
    let tree0 = &tree[n..];
    let tree1 = &tree[n + ldl::treesize(logn - 1)..];

    let fft = match Fft::new(logn) {
        Ok(f) => f,
        Err(_) => unreachable!(),
    };

    // Split t1 (z1 doubles as scratch), recurse on the right subtree into
    // tmp, merge back into z1.
    {
        let (z1a, z1b) = z1.split_at_mut(hn);
        fft.split_fft(z1a, z1b, t1, logn);
    }
    {
        let (out, rest) = tmp.split_at_mut(n);
        let (oa, ob) = out.split_at_mut(hn);
        let (z1a, z1b) = z1.split_at(hn);
        gaussian_lattice_sample(rng, oa, ob, tree1, z1a, z1b, logn - 1, rest);
    }
    {
        let (out, _) = tmp.split_at(n);
        fft.merge_fft(z1, &out[..hn], &out[hn..], logn);
    }

    // tb0 = t0 + (t1 - z1) * L, built in tmp.
    {
        let (tb0, _) = tmp.split_at_mut(n);
        tb0.copy_from_slice(t1);
        poly::sub_inplace(tb0, z1);
        poly::mul(tb0, &tree[..n], logn);
        poly::add_inplace(tb0, t0);
    }

    // Second recursion on the left subtree.
    {
        let (tb0, _) = tmp.split_at_mut(n);
        let (z0a, z0b) = z0.split_at_mut(hn);
        fft.split_fft(z0a, z0b, tb0, logn);
    }
    {
        let (_tb0, rest) = tmp.split_at_mut(n);
        let (out, deeper) = rest.split_at_mut(n);
        let (oa, ob) = out.split_at_mut(hn);
        let (z0a, z0b) = z0.split_at(hn);
        gaussian_lattice_sample(rng, oa, ob, tree0, z0a, z0b, logn - 1, deeper);
    }
    {
        let (_, rest) = tmp.split_at(n);
        let (out, _) = rest.split_at(n);
        fft.merge_fft(z0, &out[..hn], &out[hn..], logn);
    }
}
