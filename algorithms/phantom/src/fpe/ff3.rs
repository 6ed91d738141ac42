//! FF3-1 Feistel core (8 rounds, reversed-tweak halves).

use crate::error::{Error, Result};
use crate::mpz::Mpz;

use super::{BlockEncryptor, Ff3Ctx};

const ROUNDS: usize = 8;

/// P block: the active tweak half (xor the round index into byte 3)
/// followed by the numeral value right-aligned little-endian in 12 bytes.
fn compute_p(ctx: &Ff3Ctx, round: usize, num: &Mpz) -> Result<[u8; 16]> {
    let offset = if round & 1 == 1 { 4 } else { 0 };
    let mut p = [0u8; 16];
    p[0] = ctx.tweak[offset];
    p[1] = ctx.tweak[offset + 1];
    p[2] = ctx.tweak[offset + 2];
    p[3] = ctx.tweak[offset + 3] ^ round as u8;

    let bytes = num.get_bytes(false);
    if bytes.len() > 12 {
        return Err(Error::InvalidArgument("input exceeds the FF3-1 domain"));
    }
    p[16 - bytes.len()..].copy_from_slice(&bytes);
    Ok(p)
}

/// Write the low `m` base-radix digits of `n` into `out`.
fn store_digits(out: &mut [u32], m: usize, n: &Mpz, radix: u32) -> Result<()> {
    let mut n = n.clone();
    for k in (0..m).rev() {
        let (q, r) = n.fdiv_qr_ui(radix)?;
        out[k] = r;
        n = q;
    }
    Ok(())
}

/// FF3-1 encryption of a symbol array.
pub fn encrypt(ctx: &Ff3Ctx, radix: u32, input: &[u32]) -> Result<Vec<u32>> {
    let inlen = input.len();
    if inlen == 0 {
        return Ok(Vec::new());
    }

    let u = inlen >> 1;
    let v = inlen - u;
    let mut a: Vec<u32> = input[..u].to_vec();
    let mut b: Vec<u32> = input[u..].to_vec();

    let mut bnum = Mpz::new();
    let mut anum = Mpz::new();
    let mut y = Mpz::new();

    for i in 0..ROUNDS {
        let m = if i & 1 == 1 { v } else { u };

        bnum.from_radix_array(&b, radix);
        let mut s = compute_p(ctx, i, &bnum)?;
        ctx.aes.encrypt_block(&mut s);

        y.set_bytes(&s, true);
        anum.from_radix_array(&a, radix);

        core::mem::swap(&mut a, &mut b);

        let n = &anum + &y;
        store_digits(&mut b, m, &n, radix)?;
    }

    let mut out = a;
    out.extend_from_slice(&b);
    Ok(out)
}

/// FF3-1 decryption of a symbol array.
pub fn decrypt(ctx: &Ff3Ctx, radix: u32, input: &[u32]) -> Result<Vec<u32>> {
    let inlen = input.len();
    if inlen == 0 {
        return Ok(Vec::new());
    }

    let u = inlen >> 1;
    let v = inlen - u;
    let mut a: Vec<u32> = input[..u].to_vec();
    let mut b: Vec<u32> = input[u..].to_vec();

    let mut bnum = Mpz::new();
    let mut anum = Mpz::new();
    let mut y = Mpz::new();

    for i in (0..ROUNDS).rev() {
        let m = if i & 1 == 1 { v } else { u };

        anum.from_radix_array(&a, radix);
        let mut s = compute_p(ctx, i, &anum)?;
        ctx.aes.encrypt_block(&mut s);

        y.set_bytes(&s, true);
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

    use crate::fpe::{FpeCtx, FpeFormat, FpeType};

    const KEY: [u8; 16] = [
        0x2B, 0x7E, 0x15, 0x16, 0x28, 0xAE, 0xD2, 0xA6, 0xAB, 0xF7, 0x15, 0x88, 0x09, 0xCF, 0x4F,
        0x3C,
    ];

    fn ctx(tweak: &[u8]) -> FpeCtx {
        FpeCtx::new(&KEY, FpeType::Ff3_1Aes128, FpeFormat::Numeric, tweak).unwrap()
    }

    #[test]
    fn tweak_must_be_seven_bytes() {
        assert!(FpeCtx::new(&KEY, FpeType::Ff3_1Aes128, FpeFormat::Numeric, &[0; 7]).is_ok());
        assert!(FpeCtx::new(&KEY, FpeType::Ff3_1Aes128, FpeFormat::Numeric, &[0; 8]).is_err());
        assert!(FpeCtx::new(&KEY, FpeType::Ff3_1Aes128, FpeFormat::Numeric, &[]).is_err());
    }

    #[test]
    fn round_trip_radix_62() {
        let c = ctx(&[0xD8, 0xE7, 0x92, 0x0A, 0xFA, 0x33, 0x0A]);
        let pt: Vec<u32> = (0..16u32).map(|i| (i * 11 + 7) % 62).collect();
        let ct = c.encrypt_symbols(62, &pt).unwrap();
        assert_eq!(ct.len(), pt.len());
        assert!(ct.iter().all(|&s| s < 62));
        assert_ne!(ct, pt);
        assert_eq!(c.decrypt_symbols(62, &ct).unwrap(), pt);
    }

    #[test]
    fn round_trip_many_lengths() {
        let c = ctx(&[1, 2, 3, 4, 5, 6, 7]);
        for len in 2..=20usize {
            let pt: Vec<u32> = (0..len as u32).map(|i| (i * 3 + 1) % 10).collect();
            let ct = c.encrypt_symbols(10, &pt).unwrap();
            assert_eq!(c.decrypt_symbols(10, &ct).unwrap(), pt, "len {len}");
        }
    }

    #[test]
    fn distinct_tweaks_give_distinct_ciphertexts() {
        let c1 = ctx(&[1, 2, 3, 4, 5, 6, 7]);
        let c2 = ctx(&[1, 2, 3, 4, 5, 6, 8]);
        let pt: Vec<u32> = vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        assert_ne!(
            c1.encrypt_symbols(10, &pt).unwrap(),
            c2.encrypt_symbols(10, &pt).unwrap()
        );
    }
}
