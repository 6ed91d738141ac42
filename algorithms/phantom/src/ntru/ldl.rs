//! LDL* decomposition of the self-adjoint Gram matrix into a binary tree
//! of FFT polynomials.

use crate::bits;
use crate::fft::{poly, Fft};

/// Size of the tree for a ring of degree 2^logn: s(0) = 1 and
/// s(logn) = 2^logn + 2*s(logn - 1), i.e. (logn + 1) << logn.
pub fn treesize(logn: usize) -> usize {
    (logn + 1) << logn
}

/// L[1,0] and D[1,1] of the LDL* factorization of [[g00, g01], [adj(g01),
/// g11]], all in FFT representation. `tmp` needs n slots.
fn ldl_fft(
    d11: &mut [f64],
    l10: &mut [f64],
    g00: &[f64],
    g01: &[f64],
    g11: &[f64],
    logn: usize,
    tmp: &mut [f64],
) {
    let n = 1usize << logn;

    // mu = G[0,1] / G[0,0]
    tmp[..n].copy_from_slice(&g01[..n]);
    poly::div(&mut tmp[..n], g00, logn);

    // L[1,0] = adj(mu), aux = mu * adj(mu)
    l10[..n].copy_from_slice(&tmp[..n]);
    poly::adjoint(l10, logn);
    poly::mul(&mut tmp[..n], l10, logn);

    // D[1,1] = G[1,1] - aux * G[0,0]
    poly::mul(&mut tmp[..n], g00, logn);
    d11[..n].copy_from_slice(&g11[..n]);
    poly::sub_inplace(&mut d11[..n], &tmp[..n]);
}

/// Recursive LDL* step producing each row of the quasicyclic tree.
fn fft_inner(tree: &mut [f64], g0: &mut [f64], g1: &mut [f64], logn: usize, tmp: &mut [f64]) {
    if logn == 0 {
        tree[0] = g0[0];
        return;
    }
    let n = 1usize << logn;
    let hn = n >> 1;

    // d00 = g0 is implicit; write L[1,0] into the node and d11 into tmp.
    {
        let (t0, t1) = tmp.split_at_mut(n);
        let (node, _) = tree.split_at_mut(n);
        // self-adjoint input: g11 = g0, g01 = g1 with d11 into t0.
        ldl_fft(t0, node, g0, g1, g0, logn, t1);
    }

    let fft = match Fft::new(logn) {
        Ok(f) => f,
        Err(_) => unreachable!(),
    };

    // Split d00 (in g0) into g1's halves and d11 (in tmp) into g0's.
    {
        let (g1a, g1b) = g1.split_at_mut(hn);
        fft.split_fft(g1a, g1b, g0, logn);
    }
    {
        let (g0a, g0b) = g0.split_at_mut(hn);
        fft.split_fft(g0a, g0b, &tmp[..n], logn);
    }

    let (_node, children) = tree.split_at_mut(n);
    let (left, right) = children.split_at_mut(treesize(logn - 1));
    {
        let (g1a, g1b) = g1.split_at_mut(hn);
        fft_inner(left, g1a, g1b, logn - 1, tmp);
    }
    {
        let (g0a, g0b) = g0.split_at_mut(hn);
        fft_inner(right, g0a, g0b, logn - 1, tmp);
    }
}

/// Build the LDL* tree from the Gram matrix rows g00, g01, g11 (FFT
/// representation). `tmp` needs 4n slots.
pub fn create_tree(
    tree: &mut [f64],
    g00: &[f64],
    g01: &[f64],
    g11: &[f64],
    logn: usize,
    tmp: &mut [f64],
) {
    if logn == 0 {
        tree[0] = g00[0];
        return;
    }

    let n = 1usize << logn;
    let hn = n >> 1;

    let (d00, rest) = tmp.split_at_mut(n);
    let (d11, scratch) = rest.split_at_mut(n);

    d00.copy_from_slice(&g00[..n]);
    {
        let (node, _) = tree.split_at_mut(n);
        ldl_fft(d11, node, g00, g01, g11, logn, scratch);
    }

    let fft = match Fft::new(logn) {
        Ok(f) => f,
        Err(_) => unreachable!(),
    };

    // d00 splits into scratch, d11 splits into d00; scratch then becomes
    // the new d11.
    {
        let (sa, sb) = scratch.split_at_mut(hn);
        fft.split_fft(sa, sb, d00, logn);
    }
    {
        let (da, db) = d00.split_at_mut(hn);
        fft.split_fft(da, db, d11, logn);
    }
    d11[..n].copy_from_slice(&scratch[..n]);

    let (_, children) = tree.split_at_mut(n);
    let (left, right) = children.split_at_mut(treesize(logn - 1));
    {
        let (da, db) = d11.split_at_mut(hn);
        let mut tmp2 = vec![0f64; 1 << logn];
        fft_inner(left, da, db, logn - 1, &mut tmp2);
    }
    {
        let (da, db) = d00.split_at_mut(hn);
        let mut tmp2 = vec![0f64; 1 << logn];
        fft_inner(right, da, db, logn - 1, &mut tmp2);
    }
}

/// Replace each leaf value x with sigma / sqrt(x).
pub fn normalize(tree: &mut [f64], sigma: f64, logn: usize) {
    let n = 1usize << logn;
    if n == 1 {
        tree[0] = sigma * bits::inv_sqrt(tree[0]);
    } else {
        let (_, children) = tree.split_at_mut(n);
        let (left, right) = children.split_at_mut(treesize(logn - 1));
        normalize(left, sigma, logn - 1);
        normalize(right, sigma, logn - 1);
    }
}
