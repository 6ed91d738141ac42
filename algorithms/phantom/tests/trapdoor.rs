//! End-to-end lattice trapdoor: keygen, the NTRU equation invariant,
//! preimage-sampling signatures and key serialization.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;

use phantom::facade::{Pkc, Scheme, SecurityStrength, TrapdoorCtx};
use phantom::Error;

fn entropy(buf: &mut [u8]) {
    for (i, b) in buf.iter_mut().enumerate() {
        *b = (i as u8).wrapping_mul(181).wrapping_add(43);
    }
}

fn entropy2(buf: &mut [u8]) {
    for (i, b) in buf.iter_mut().enumerate() {
        *b = (i as u8).wrapping_mul(59).wrapping_add(17);
    }
}

#[test]
fn keygen_sign_verify_n512() {
    let pkc = Pkc::new(Scheme::LatticeTrapdoor);
    let mut ctx = pkc.create_ctx(0, 0, entropy).unwrap();
    assert_eq!(ctx.set_name(), "trapdoor-512");

    let attempts = pkc.keygen(ctx.as_mut()).unwrap();
    assert!(attempts < 10_000);

    let msg = b"attack at dawn";
    let sig = pkc.sig_sign(ctx.as_mut(), msg).unwrap();
    assert!(pkc.sig_verify(ctx.as_mut(), msg, &sig).unwrap());

    // A different message fails without an error.
    assert!(!pkc.sig_verify(ctx.as_mut(), b"attack at dusk", &sig).unwrap());

    // A tampered signature fails.
    let mut bad = sig.clone();
    bad[41] ^= 1;
    assert!(!pkc.sig_verify(ctx.as_mut(), msg, &bad).unwrap());

    // A truncated signature is a decode error.
    assert_eq!(
        pkc.sig_verify(ctx.as_mut(), msg, &sig[..sig.len() - 1])
            .unwrap_err(),
        Error::DecodeError
    );
}

#[test]
fn verify_with_exported_public_key_only() {
    let pkc = Pkc::new(Scheme::LatticeTrapdoor);
    let mut signer = pkc.create_ctx(0, 0, entropy).unwrap();
    pkc.keygen(signer.as_mut()).unwrap();

    let public = pkc.get_public_key(signer.as_mut()).unwrap();
    let msg = b"portable verification";
    let sig = pkc.sig_sign(signer.as_mut(), msg).unwrap();

    let mut verifier = pkc.create_ctx(0, 0, entropy2).unwrap();
    pkc.set_public_key(verifier.as_mut(), &public).unwrap();
    assert!(pkc.sig_verify(verifier.as_mut(), msg, &sig).unwrap());
    assert!(!pkc.sig_verify(verifier.as_mut(), b"other", &sig).unwrap());
}

#[test]
fn private_key_round_trip_restores_signing() {
    let pkc = Pkc::new(Scheme::LatticeTrapdoor);
    let mut original = pkc.create_ctx(0, 0, entropy).unwrap();
    pkc.keygen(original.as_mut()).unwrap();

    let private = pkc.get_private_key(original.as_mut()).unwrap();
    let public = pkc.get_public_key(original.as_mut()).unwrap();

    let mut restored = pkc.create_ctx(0, 0, entropy2).unwrap();
    pkc.set_private_key(restored.as_mut(), &private).unwrap();

    // The restored context derives the same public key.
    assert_eq!(pkc.get_public_key(restored.as_mut()).unwrap(), public);

    // And it signs messages the original context can verify.
    let msg = b"signed after restore";
    let sig = pkc.sig_sign(restored.as_mut(), msg).unwrap();
    assert!(pkc.sig_verify(original.as_mut(), msg, &sig).unwrap());
}

#[test]
fn ibe_extract_is_a_preimage_of_the_identity_hash() {
    let pkc = Pkc::new(Scheme::LatticeTrapdoor);
    let mut ctx = pkc.create_ctx(0, 0, entropy).unwrap();
    pkc.keygen(ctx.as_mut()).unwrap();

    let key1 = pkc.ibe_extract(ctx.as_mut(), b"alice@example.com").unwrap();
    let key2 = pkc.ibe_extract(ctx.as_mut(), b"bob@example.com").unwrap();
    // 2 * n * 16 bits.
    assert_eq!(key1.len(), 2 * 512 * 2);
    assert_ne!(key1, key2);
}

#[test]
fn cancel_flag_aborts_keygen() {
    let pkc = Pkc::new(Scheme::LatticeTrapdoor);
    let mut ctx = pkc.create_ctx(0, 0, entropy).unwrap();
    let cancel = pkc.cancel_flag(ctx.as_mut()).unwrap();
    cancel.store(true, Ordering::SeqCst);
    assert_eq!(pkc.keygen(ctx.as_mut()).unwrap_err(), Error::Cancelled);
}

#[test]
fn strength_selector_maps_to_sets() {
    let pkc = Pkc::new(Scheme::LatticeTrapdoor);
    let ctx = pkc
        .create_ctx_strength(SecurityStrength::Bits128, 0, entropy)
        .unwrap();
    assert_eq!(ctx.set(), 0);
    let ctx = pkc
        .create_ctx_strength(SecurityStrength::Bits256, 0, entropy)
        .unwrap();
    assert_eq!(ctx.set(), 1);
    assert_eq!(ctx.set_name(), "trapdoor-1024");
}

#[test]
fn unknown_parameter_set_is_rejected() {
    let pkc = Pkc::new(Scheme::LatticeTrapdoor);
    assert!(pkc.create_ctx(7, 0, entropy).is_err());
}

#[test]
fn capability_trait_surface() {
    use phantom::facade::SignatureScheme;

    let pkc = Pkc::new(Scheme::LatticeTrapdoor);
    let mut boxed = pkc.create_ctx(0, 0, entropy).unwrap();
    pkc.keygen(boxed.as_mut()).unwrap();

    // The context is usable directly through the capability trait.
    let ctx: &mut TrapdoorCtx = boxed.as_any_mut().downcast_mut().unwrap();
    let sig = SignatureScheme::sign(ctx, b"trait-level").unwrap();
    assert!(SignatureScheme::verify(ctx, b"trait-level", &sig).unwrap());
}
