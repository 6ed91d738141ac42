//! Known-answer tests against published vectors.

#![allow(clippy::unwrap_used)]

use phantom::fpe::{FpeCtx, FpeFormat, FpeType};
use phantom::{Sha3, Shake};

// =============================================================================
// SHA-3 / SHAKE (FIPS 202)
// =============================================================================

#[test]
fn shake128_empty_message() {
    let mut xof = Shake::new(16).unwrap();
    xof.absorb(b"");
    xof.finalize();
    let mut out = [0u8; 32];
    xof.squeeze(&mut out);
    assert_eq!(
        hex::encode(out),
        "7f9c2ba4e88f827d616045507605853ed73b8093f6efbc88eb1a6eacfa66ef26"
    );
}

#[test]
fn shake256_empty_message() {
    let mut xof = Shake::new(32).unwrap();
    xof.finalize();
    let mut out = [0u8; 32];
    xof.squeeze(&mut out);
    assert_eq!(
        hex::encode(out),
        "46b9dd2b0ba88d13233b3feb743eeb243fcd52ea62b81b82b50c27646ed5762f"
    );
}

#[test]
fn sha3_256_empty_message() {
    let digest = Sha3::digest(32, b"").unwrap();
    assert_eq!(
        hex::encode(digest),
        "a7ffc6f8bf1ed76651c14756a061d62683cfbb0b5b97a6d9dbe0a8ca8ed6c7ee"
    );
}

#[test]
fn sha3_256_abc() {
    let digest = Sha3::digest(32, b"abc").unwrap();
    assert_eq!(
        hex::encode(digest),
        "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
    );
}

#[test]
fn shake128_incremental_matches_oneshot() {
    let msg = b"The quick brown fox jumps over the lazy dog";
    let mut a = Shake::new(16).unwrap();
    a.absorb(msg);
    a.finalize();
    let mut one = [0u8; 48];
    a.squeeze(&mut one);

    let mut b = Shake::new(16).unwrap();
    b.absorb(&msg[..11]);
    b.absorb(&msg[11..]);
    b.finalize();
    let mut two = [0u8; 48];
    b.squeeze(&mut two[..5]);
    b.squeeze(&mut two[5..]);
    assert_eq!(one, two);
}

// =============================================================================
// FF1 (SP 800-38G)
// =============================================================================

const FF1_KEY: [u8; 16] = [
    0x2B, 0x7E, 0x15, 0x16, 0x28, 0xAE, 0xD2, 0xA6, 0xAB, 0xF7, 0x15, 0x88, 0x09, 0xCF, 0x4F, 0x3C,
];

#[test]
fn ff1_aes128_sample_1() {
    let ctx = FpeCtx::new(&FF1_KEY, FpeType::Ff1Aes128, FpeFormat::Numeric, &[]).unwrap();
    let pt: Vec<u32> = vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
    let ct = ctx.encrypt_symbols(10, &pt).unwrap();
    assert_eq!(ct, vec![2, 4, 3, 3, 4, 7, 7, 4, 8, 4]);
    let rt = ctx.decrypt_symbols(10, &ct).unwrap();
    assert_eq!(rt, pt);
}

#[test]
fn ff1_aes128_sample_2() {
    let tweak = [0x39u8, 0x38, 0x37, 0x36, 0x35, 0x34, 0x33, 0x32, 0x31, 0x30];
    let ctx = FpeCtx::new(&FF1_KEY, FpeType::Ff1Aes128, FpeFormat::Numeric, &tweak).unwrap();
    let pt: Vec<u32> = vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
    let ct = ctx.encrypt_symbols(10, &pt).unwrap();
    assert_eq!(ct, vec![6, 1, 2, 4, 2, 0, 0, 7, 7, 3]);
    let rt = ctx.decrypt_symbols(10, &ct).unwrap();
    assert_eq!(rt, pt);
}
