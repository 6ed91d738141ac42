//! Format-preserving encryption: FF1 and FF3-1 Feistel cores over an AES
//! block-cipher seam, with alphabet mapping and the higher-level integer,
//! float and ISO-8601 pipelines.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::{Aes128Enc, Aes192Enc, Aes256Enc};

use crate::error::{Error, Result};

mod ff1;
mod ff3;
mod format;

pub use format::{
    decrypt_float, decrypt_iso8601, decrypt_number, decrypt_str, encrypt_float, encrypt_iso8601,
    encrypt_number, encrypt_str, FpeFormat, PadCode,
};

/// Forward-direction block cipher consumed by the Feistel cores.
pub trait BlockEncryptor {
    /// Encrypt one 16-byte block in place.
    fn encrypt_block(&self, block: &mut [u8; 16]);
}

/// AES block encryptor at any of the three key lengths.
pub enum AesEncryptor {
    /// AES-128.
    Aes128(Box<Aes128Enc>),
    /// AES-192.
    Aes192(Box<Aes192Enc>),
    /// AES-256.
    Aes256(Box<Aes256Enc>),
}

impl AesEncryptor {
    /// Key the cipher; the key length selects the variant.
    pub fn new(key: &[u8]) -> Result<Self> {
        match key.len() {
            16 => Ok(Self::Aes128(Box::new(Aes128Enc::new(
                GenericArray::from_slice(key),
            )))),
            24 => Ok(Self::Aes192(Box::new(Aes192Enc::new(
                GenericArray::from_slice(key),
            )))),
            32 => Ok(Self::Aes256(Box::new(Aes256Enc::new(
                GenericArray::from_slice(key),
            )))),
            _ => Err(Error::InvalidArgument("AES key must be 16, 24 or 32 bytes")),
        }
    }
}

impl BlockEncryptor for AesEncryptor {
    fn encrypt_block(&self, block: &mut [u8; 16]) {
        let ga = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.encrypt_block(ga),
            Self::Aes192(c) => c.encrypt_block(ga),
            Self::Aes256(c) => c.encrypt_block(ga),
        }
    }
}

/// FPE algorithm and AES key length selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FpeType {
    /// FF1 with AES-128.
    Ff1Aes128,
    /// FF1 with AES-192.
    Ff1Aes192,
    /// FF1 with AES-256.
    Ff1Aes256,
    /// FF3-1 with AES-128.
    Ff3_1Aes128,
    /// FF3-1 with AES-192.
    Ff3_1Aes192,
    /// FF3-1 with AES-256.
    Ff3_1Aes256,
}

impl FpeType {
    fn key_len(self) -> usize {
        match self {
            Self::Ff1Aes128 | Self::Ff3_1Aes128 => 16,
            Self::Ff1Aes192 | Self::Ff3_1Aes192 => 24,
            Self::Ff1Aes256 | Self::Ff3_1Aes256 => 32,
        }
    }

    fn is_ff1(self) -> bool {
        matches!(self, Self::Ff1Aes128 | Self::Ff1Aes192 | Self::Ff1Aes256)
    }
}

/// FF1 context: keyed cipher plus a variable-length tweak.
pub struct Ff1Ctx {
    pub(crate) tweak: Vec<u8>,
    pub(crate) aes: AesEncryptor,
}

/// FF3-1 context: keyed cipher plus the 8-byte expanded tweak.
pub struct Ff3Ctx {
    pub(crate) tweak: [u8; 8],
    pub(crate) aes: AesEncryptor,
}

enum CipherCtx {
    Ff1(Ff1Ctx),
    Ff3(Ff3Ctx),
}

/// A complete FPE context: cipher mode, tweak and alphabet format.
pub struct FpeCtx {
    cipher: CipherCtx,
    format: FpeFormat,
}

impl FpeCtx {
    /// Build a context from the user key, mode, format and tweak.
    ///
    /// FF3-1 requires exactly 7 tweak bytes; they are expanded to the
    /// internal 8-byte form (byte 3 keeps its high nibble on the left
    /// half, its low nibble shifts into byte 7).
    pub fn new(user_key: &[u8], fpe_type: FpeType, format: FpeFormat, tweak: &[u8]) -> Result<Self> {
        if user_key.len() != fpe_type.key_len() {
            return Err(Error::InvalidArgument("key length does not match FPE type"));
        }
        let aes = AesEncryptor::new(user_key)?;

        let cipher = if fpe_type.is_ff1() {
            CipherCtx::Ff1(Ff1Ctx {
                tweak: tweak.to_vec(),
                aes,
            })
        } else {
            if tweak.len() != 7 {
                return Err(Error::InvalidArgument("FF3-1 tweak must be 7 bytes"));
            }
            CipherCtx::Ff3(Ff3Ctx {
                tweak: [
                    tweak[0],
                    tweak[1],
                    tweak[2],
                    tweak[3] & 0xF0,
                    tweak[4],
                    tweak[5],
                    tweak[6],
                    tweak[3] << 4,
                ],
                aes,
            })
        };

        Ok(Self { cipher, format })
    }

    /// The configured alphabet format.
    pub fn format(&self) -> FpeFormat {
        self.format
    }

    /// Encrypt a symbol array in the given radix.
    pub fn encrypt_symbols(&self, radix: u32, input: &[u32]) -> Result<Vec<u32>> {
        match &self.cipher {
            CipherCtx::Ff1(c) => ff1::encrypt(c, radix, input),
            CipherCtx::Ff3(c) => ff3::encrypt(c, radix, input),
        }
    }

    /// Decrypt a symbol array in the given radix.
    pub fn decrypt_symbols(&self, radix: u32, input: &[u32]) -> Result<Vec<u32>> {
        match &self.cipher {
            CipherCtx::Ff1(c) => ff1::decrypt(c, radix, input),
            CipherCtx::Ff3(c) => ff3::decrypt(c, radix, input),
        }
    }
}
