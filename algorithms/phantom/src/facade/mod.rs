//! Scheme-independent user contexts and the public-key facade.
//!
//! A [`UserCtx`] is an opaque per-scheme object; the [`Pkc`] facade
//! creates one from a scheme selector and parameter set (or security
//! strength) and routes key I/O and operations to it. Scheme capabilities
//! are factored into traits so external collaborators can implement any
//! subset.

use core::any::Any;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::csprng::EntropyCallback;
use crate::error::{Error, Result};

mod trapdoor;

pub use trapdoor::{TrapdoorCtx, TrapdoorParams};

/// Available schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    /// NTRU lattice trapdoor: preimage-sampling signatures and identity
    /// key extraction.
    LatticeTrapdoor,
}

/// Coarse security-strength selector mapped onto parameter sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecurityStrength {
    /// 128-bit classical strength.
    Bits128,
    /// 256-bit classical strength.
    Bits256,
}

/// Opaque per-scheme context.
pub trait UserCtx: Any {
    /// The owning scheme.
    fn scheme(&self) -> Scheme;
    /// Parameter set index.
    fn set(&self) -> usize;
    /// Human-readable parameter set name.
    fn set_name(&self) -> &'static str;
    /// Upcast for scheme dispatch.
    fn as_any(&self) -> &dyn Any;
    /// Mutable upcast for scheme dispatch.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// =============================================================================
// CAPABILITY TRAITS
// =============================================================================

/// Message signing and verification.
pub trait SignatureScheme {
    /// Sign a message.
    fn sign(&mut self, msg: &[u8]) -> Result<Vec<u8>>;
    /// Verify a signature; Ok(false) reports a mismatch without leaking
    /// which step failed.
    fn verify(&mut self, msg: &[u8], sig: &[u8]) -> Result<bool>;
}

/// Public-key encryption.
pub trait Pke {
    /// Encrypt a plaintext.
    fn encrypt(&mut self, pt: &[u8]) -> Result<Vec<u8>>;
    /// Decrypt a ciphertext.
    fn decrypt(&mut self, ct: &[u8]) -> Result<Vec<u8>>;
}

/// Key encapsulation.
pub trait Kem {
    /// Encapsulate to a peer public key: (ciphertext, shared key).
    fn encapsulate(&mut self, peer_pk: &[u8]) -> Result<(Vec<u8>, Vec<u8>)>;
    /// Decapsulate a ciphertext to the shared key.
    fn decapsulate(&mut self, ct: &[u8]) -> Result<Vec<u8>>;
}

/// Interactive key exchange.
pub trait KeyExchange {
    /// Generate the ephemeral state.
    fn setup(&mut self) -> Result<()>;
    /// Produce the message for the peer.
    fn init(&mut self) -> Result<Vec<u8>>;
    /// Consume the peer's message and derive the shared secret.
    fn finalize(&mut self, peer: &[u8]) -> Result<Vec<u8>>;
}

/// Identity-based encryption.
pub trait Ibe {
    /// Install a user decryption key obtained from the key authority.
    fn load_user_key(&mut self, id: &[u8], key: &[u8]) -> Result<()>;
    /// Extract the user key for an identity (key-authority side).
    fn extract(&mut self, id: &[u8]) -> Result<Vec<u8>>;
    /// Encrypt to an identity.
    fn encrypt(&mut self, id: &[u8], pt: &[u8]) -> Result<Vec<u8>>;
    /// Decrypt with the installed user key.
    fn decrypt(&mut self, ct: &[u8]) -> Result<Vec<u8>>;
    /// Sign with the installed user key.
    fn sign(&mut self, msg: &[u8]) -> Result<Vec<u8>>;
    /// Verify an identity-bound signature.
    fn verify(&mut self, id: &[u8], msg: &[u8], sig: &[u8]) -> Result<bool>;
}

// =============================================================================
// FACADE
// =============================================================================

/// Scheme facade owning context creation and dispatch.
pub struct Pkc {
    scheme: Scheme,
}

impl Pkc {
    /// Select a scheme.
    pub fn new(scheme: Scheme) -> Self {
        Self { scheme }
    }

    /// Create a context for a specific parameter set.
    pub fn create_ctx(
        &self,
        set: usize,
        seed_period: u64,
        entropy: EntropyCallback,
    ) -> Result<Box<dyn UserCtx>> {
        match self.scheme {
            Scheme::LatticeTrapdoor => Ok(Box::new(TrapdoorCtx::new(set, seed_period, entropy)?)),
        }
    }

    /// Create a context from a security-strength level.
    pub fn create_ctx_strength(
        &self,
        strength: SecurityStrength,
        seed_period: u64,
        entropy: EntropyCallback,
    ) -> Result<Box<dyn UserCtx>> {
        let set = match strength {
            SecurityStrength::Bits128 => 0,
            SecurityStrength::Bits256 => 1,
        };
        self.create_ctx(set, seed_period, entropy)
    }

    fn trapdoor<'c>(&self, ctx: &'c mut dyn UserCtx) -> Result<&'c mut TrapdoorCtx> {
        ctx.as_any_mut()
            .downcast_mut::<TrapdoorCtx>()
            .ok_or(Error::InvalidArgument("context does not match the scheme"))
    }

    /// Generate a key pair; returns the number of rejected candidates.
    pub fn keygen(&self, ctx: &mut dyn UserCtx) -> Result<u32> {
        self.trapdoor(ctx)?.keygen()
    }

    /// A cooperative cancel flag checked between keygen candidates.
    pub fn cancel_flag(&self, ctx: &mut dyn UserCtx) -> Result<Arc<AtomicBool>> {
        Ok(self.trapdoor(ctx)?.cancel_flag())
    }

    /// Serialize the public key.
    pub fn get_public_key(&self, ctx: &mut dyn UserCtx) -> Result<Vec<u8>> {
        self.trapdoor(ctx)?.get_public_key()
    }

    /// Load an encoded public key.
    pub fn set_public_key(&self, ctx: &mut dyn UserCtx, key: &[u8]) -> Result<()> {
        self.trapdoor(ctx)?.set_public_key(key)
    }

    /// Serialize the private key.
    pub fn get_private_key(&self, ctx: &mut dyn UserCtx) -> Result<Vec<u8>> {
        self.trapdoor(ctx)?.get_private_key()
    }

    /// Load an encoded private key and rebuild the derived state.
    pub fn set_private_key(&self, ctx: &mut dyn UserCtx, key: &[u8]) -> Result<()> {
        self.trapdoor(ctx)?.set_private_key(key)
    }

    /// Sign a message.
    pub fn sig_sign(&self, ctx: &mut dyn UserCtx, msg: &[u8]) -> Result<Vec<u8>> {
        self.trapdoor(ctx)?.sign(msg)
    }

    /// Verify a signature.
    pub fn sig_verify(&self, ctx: &mut dyn UserCtx, msg: &[u8], sig: &[u8]) -> Result<bool> {
        self.trapdoor(ctx)?.verify(msg, sig)
    }

    /// Extract an identity user key (key-authority side).
    pub fn ibe_extract(&self, ctx: &mut dyn UserCtx, id: &[u8]) -> Result<Vec<u8>> {
        self.trapdoor(ctx)?.extract_user_key(id)
    }
}
