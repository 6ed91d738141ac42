//! FF1 Feistel core (SP 800-38G, 10 rounds, CBC-MAC round function).

use crate::bits;
use crate::error::Result;
use crate::mpz::Mpz;

use super::{BlockEncryptor, Ff1Ctx};

const ROUNDS: usize = 10;

#[inline]
fn ceil2(x: usize, bit: u32) -> usize {
    (x >> bit) + usize::from(x & ((1 << bit) - 1) > 0)
}

struct Layout {
    b: usize,
    d: usize,
    tweaklen: usize,
    pad: usize,
    qlen: usize,
}

fn setup(ctx: &Ff1Ctx, v: usize, radix: u32) -> Layout {
    let ceil_vlog2 = v * bits::ilog2_ceil(radix as u64) as usize;
    let b = ceil2(ceil_vlog2, 3);
    let d = 4 * ceil2(b, 2) + 4;
    let tweaklen = ctx.tweak.len();
    let pad = (-(tweaklen as i64) - b as i64 - 1).rem_euclid(16) as usize;
    let qlen = tweaklen + pad + 1 + b;
    Layout {
        b,
        d,
        tweaklen,
        pad,
        qlen,
    }
}

/// P = [1, 2, 1] || [radix]^3 || [10] || [u mod 256] || [n]^4 || [t]^4.
fn compute_p(radix: u32, tweaklen: usize, inlen: usize, u: usize) -> [u8; 16] {
    let mut p = [0u8; 16];
    p[0] = 0x1;
    p[1] = 0x2;
    p[2] = 0x1;
    let r = (radix << 8) | 10;
    p[3..7].copy_from_slice(&r.to_be_bytes());
    p[7] = u as u8;
    p[8..12].copy_from_slice(&(inlen as u32).to_be_bytes());
    p[12..16].copy_from_slice(&(tweaklen as u32).to_be_bytes());
    p
}

/// CBC-MAC over P || Q.
fn prf(ctx: &Ff1Ctx, p: &[u8; 16], q: &[u8]) -> [u8; 16] {
    let mut r = *p;
    ctx.aes.encrypt_block(&mut r);
    for block in q.chunks_exact(16) {
        for (ri, &qi) in r.iter_mut().zip(block.iter()) {
            *ri ^= qi;
        }
        ctx.aes.encrypt_block(&mut r);
    }
    r
}

/// Extend R to S by encrypting R xor the block counter.
fn compute_s(ctx: &Ff1Ctx, s: &mut [u8], cnt: usize, r: &[u8; 16]) {
    s[..16].copy_from_slice(r);
    for j in 1..=cnt {
        let mut tmp = *r;
        let jb = (j as u32).to_be_bytes();
        for (t, &b) in tmp[12..16].iter_mut().zip(jb.iter()) {
            *t ^= b;
        }
        ctx.aes.encrypt_block(&mut tmp);
        s[16 * j..16 * (j + 1)].copy_from_slice(&tmp);
    }
}

/// Write the low `m` base-radix digits of `n` into `out` (big-endian
/// digit order); floored division keeps the digits canonical for
/// negative values.
fn store_digits(out: &mut [u32], m: usize, n: &Mpz, radix: u32) -> Result<()> {
    let mut n = n.clone();
    for k in (0..m).rev() {
        let (q, r) = n.fdiv_qr_ui(radix)?;
        out[k] = r;
        n = q;
    }
    Ok(())
}

/// FF1 encryption of a symbol array.
pub fn encrypt(ctx: &Ff1Ctx, radix: u32, input: &[u32]) -> Result<Vec<u32>> {
    let inlen = input.len();
    if inlen == 0 {
        return Ok(Vec::new());
    }

    let u = inlen >> 1;
    let v = inlen - u;
    let mut a: Vec<u32> = input[..u].to_vec();
    let mut b: Vec<u32> = input[u..].to_vec();

    let l = setup(ctx, v, radix);
    let p = compute_p(radix, l.tweaklen, inlen, u);

    let mut q = vec![0u8; l.qlen];
    q[..l.tweaklen].copy_from_slice(&ctx.tweak);

    let cnt = ceil2(l.d, 4).saturating_sub(1);
    let slen = 16 + cnt * 16;
    let mut s = vec![0u8; slen];

    let mut bnum = Mpz::new();
    let mut anum = Mpz::new();
    let mut y = Mpz::new();

    for i in 0..ROUNDS {
        let m = if i & 1 == 1 { v } else { u };

        q[l.tweaklen + l.pad] = i as u8;
        bnum.from_radix_array(&b, radix);
        let bytes = bnum.get_bytes(true);
        for w in q[l.qlen - l.b..].iter_mut() {
            *w = 0;
        }
        q[l.qlen - bytes.len()..].copy_from_slice(&bytes);

        let r = prf(ctx, &p, &q);
        compute_s(ctx, &mut s, cnt, &r);

        y.set_bytes(&s[..l.d], true);
        anum.from_radix_array(&a, radix);

        core::mem::swap(&mut a, &mut b);

        let n = &anum + &y;
        store_digits(&mut b, m, &n, radix)?;
    }

    let mut out = a;
    out.extend_from_slice(&b);
    Ok(out)
}

/// FF1 decryption of a symbol array.
pub fn decrypt(ctx: &Ff1Ctx, radix: u32, input: &[u32]) -> Result<Vec<u32>> {
    let inlen = input.len();
    if inlen == 0 {
        return Ok(Vec::new());
    }

    let u = inlen >> 1;
    let v = inlen - u;
    let mut a: Vec<u32> = input[..u].to_vec();
    let mut b: Vec<u32> = input[u..].to_vec();

    let l = setup(ctx, v, radix);
    let p = compute_p(radix, l.tweaklen, inlen, u);

    let mut q = vec![0u8; l.qlen];
    q[..l.tweaklen].copy_from_slice(&ctx.tweak);

    let cnt = ceil2(l.d, 4).saturating_sub(1);
    let slen = 16 + cnt * 16;
    let mut s = vec![0u8; slen];

    let mut bnum = Mpz::new();
    let mut anum = Mpz::new();
    let mut y = Mpz::new();

    for i in (0..ROUNDS).rev() {
        let m = if i & 1 == 1 { v } else { u };

        q[l.tweaklen + l.pad] = i as u8;
        anum.from_radix_array(&a, radix);
        let bytes = anum.get_bytes(true);
        for w in q[l.qlen - l.b..].iter_mut() {
            *w = 0;
        }
        q[l.qlen - bytes.len()..].copy_from_slice(&bytes);

        let r = prf(ctx, &p, &q);
        compute_s(ctx, &mut s, cnt, &r);

        y.set_bytes(&s[..l.d], true);
        bnum.from_radix_array(&b, radix);

        core::mem::swap(&mut a, &mut b);

        let n = &bnum - &y;
        store_digits(&mut a, m, &n, radix)?;
    }

    let mut out = a;
    out.extend_from_slice(&b);
    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::fpe::{FpeCtx, FpeFormat, FpeType};

    const KEY: [u8; 16] = [
        0x2B, 0x7E, 0x15, 0x16, 0x28, 0xAE, 0xD2, 0xA6, 0xAB, 0xF7, 0x15, 0x88, 0x09, 0xCF, 0x4F,
        0x3C,
    ];

    fn ctx(tweak: &[u8]) -> FpeCtx {
        FpeCtx::new(&KEY, FpeType::Ff1Aes128, FpeFormat::Numeric, tweak).unwrap()
    }

    #[test]
    fn nist_sample_1() {
        // SP 800-38G, FF1-AES128 sample 1: radix 10, empty tweak.
        let c = ctx(&[]);
        let pt: Vec<u32> = vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let ct = c.encrypt_symbols(10, &pt).unwrap();
        assert_eq!(ct, vec![2, 4, 3, 3, 4, 7, 7, 4, 8, 4]);
        assert_eq!(c.decrypt_symbols(10, &ct).unwrap(), pt);
    }

    #[test]
    fn nist_sample_2() {
        // Sample 2: tweak 39383736353433323130.
        let c = ctx(&[0x39, 0x38, 0x37, 0x36, 0x35, 0x34, 0x33, 0x32, 0x31, 0x30]);
        let pt: Vec<u32> = vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let ct = c.encrypt_symbols(10, &pt).unwrap();
        assert_eq!(ct, vec![6, 1, 2, 4, 2, 0, 0, 7, 7, 3]);
        assert_eq!(c.decrypt_symbols(10, &ct).unwrap(), pt);
    }

    #[test]
    fn round_trip_across_radixes() {
        let c = ctx(b"tweak");
        for radix in [10u32, 26, 36, 62, 96] {
            let pt: Vec<u32> = (0..17).map(|i| (i * 7 + 3) % radix).collect();
            let ct = c.encrypt_symbols(radix, &pt).unwrap();
            assert_eq!(ct.len(), pt.len());
            assert!(ct.iter().all(|&s| s < radix));
            assert_eq!(c.decrypt_symbols(radix, &ct).unwrap(), pt, "radix {radix}");
        }
    }

    #[test]
    fn empty_input_passes_through() {
        let c = ctx(&[]);
        assert!(c.encrypt_symbols(10, &[]).unwrap().is_empty());
        assert!(c.decrypt_symbols(10, &[]).unwrap().is_empty());
    }

    #[test]
    fn single_symbol_wide_radix_round_trips() {
        let c = ctx(&[1, 2, 3]);
        for sec in [0u32, 1, 43_199, 86_399] {
            let ct = c.encrypt_symbols(86_400, &[sec]).unwrap();
            assert_eq!(ct.len(), 1);
            assert!(ct[0] < 86_400);
            assert_eq!(c.decrypt_symbols(86_400, &ct).unwrap(), vec![sec]);
        }
    }
}
