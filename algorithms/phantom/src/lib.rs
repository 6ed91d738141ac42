//! # Phantom
//!
//! Cryptographic primitives: the arithmetic and sampling substrate behind
//! lattice and classical public-key schemes, the NTRU trapdoor with its
//! tree-based Gaussian lattice sampler, and format-preserving encryption.
//!
//! # Usage
//! ```rust
//! use phantom::fpe::{self, FpeCtx, FpeFormat, FpeType};
//!
//! let key = [0u8; 16];
//! let ctx = FpeCtx::new(&key, FpeType::Ff1Aes128, FpeFormat::Numeric, b"tweak")?;
//! let mut card = "4000-1234-5678-9010".to_string();
//! fpe::encrypt_str(&ctx, &mut card)?;
//! fpe::decrypt_str(&ctx, &mut card)?;
//! assert_eq!(card, "4000-1234-5678-9010");
//! # Ok::<(), phantom::Error>(())
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod bits;
pub mod csprng;
pub mod ct;
pub mod ecc;
mod error;
pub mod facade;
pub mod fft;
pub mod fpe;
pub mod mpz;
pub mod ntru;
pub mod ntt;
pub mod packing;
pub mod reduce;
pub mod sampling;
pub mod sha3;

// =============================================================================
// EXPORTS
// =============================================================================

pub use csprng::{Csprng, EntropyCallback};
pub use error::{Error, Result};
pub use facade::{Pkc, Scheme, SecurityStrength, UserCtx};
pub use mpz::{ModCtx, Mpz, Reduction};
pub use sha3::{Sha3, Shake};
