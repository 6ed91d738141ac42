//! Error taxonomy shared by every component.
//!
//! No panics cross the library boundary: fallible constructors and
//! scheme-layer entry points return [`Error`], arithmetic primitives return
//! `Option`/`Result` locally and are absorbed by their callers (the NTRU
//! solver retries, verification reports `false`).

/// Library-wide error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Bad parameter set, unsupported key length, tweak of the wrong size,
    /// alphabet mismatch, or a zero-length input where one is forbidden.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A modular or polynomial inverse does not exist.
    #[error("value is not invertible")]
    NotInvertible,

    /// An elliptic curve operation hit a non-invertible z coordinate.
    #[error("elliptic curve point error")]
    PointError,

    /// A packed key, signature or ciphertext is malformed.
    #[error("malformed encoded object")]
    DecodeError,

    /// AEAD tag mismatch or signature verification mismatch.
    #[error("authentication failed")]
    AuthFailed,

    /// The CSPRNG entropy callback refused to provide entropy.
    #[error("entropy source refused or exhausted")]
    ResourceExhausted,

    /// Key generation or sampling was aborted by a cooperative cancel.
    #[error("operation cancelled")]
    Cancelled,
}

/// Library-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;
