//! Keccak-f1600 permutation, SHAKE-128/256 XOF and fixed-length SHA-3.
//!
//! The sponge state is 25 64-bit lanes. SHAKE objects support incremental
//! absorption, finalization with the 0x1F domain byte, arbitrary squeezing
//! and state cloning for forked squeeze sequences. The fixed-length digests
//! use the 0x06 domain byte.

use crate::error::{Error, Result};

/// Number of Keccak-f1600 rounds.
const ROUNDS: usize = 24;

/// Iota round constants.
const RC: [u64; ROUNDS] = [
    0x0000_0000_0000_0001,
    0x0000_0000_0000_8082,
    0x8000_0000_0000_808a,
    0x8000_0000_8000_8000,
    0x0000_0000_0000_808b,
    0x0000_0000_8000_0001,
    0x8000_0000_8000_8081,
    0x8000_0000_0000_8009,
    0x0000_0000_0000_008a,
    0x0000_0000_0000_0088,
    0x0000_0000_8000_8009,
    0x0000_0000_8000_000a,
    0x0000_0000_8000_808b,
    0x8000_0000_0000_008b,
    0x8000_0000_0000_8089,
    0x8000_0000_0000_8003,
    0x8000_0000_0000_8002,
    0x8000_0000_0000_0080,
    0x0000_0000_0000_800a,
    0x8000_0000_8000_000a,
    0x8000_0000_8000_8081,
    0x8000_0000_0000_8080,
    0x0000_0000_8000_0001,
    0x8000_0000_8000_8008,
];

/// Rho rotation schedule.
const RHO: [u32; 24] = [
    1, 3, 6, 10, 15, 21, 28, 36, 45, 55, 2, 14, 27, 41, 56, 8, 25, 43, 62, 18, 39, 61, 20, 44,
];

/// Pi lane permutation.
const PI: [usize; 24] = [
    10, 7, 11, 17, 18, 3, 5, 16, 8, 21, 24, 4, 15, 23, 19, 13, 12, 2, 20, 14, 22, 9, 6, 1,
];

/// Apply the Keccak-f1600 permutation to 25 lanes.
pub fn keccak_f1600(st: &mut [u64; 25]) {
    for &rc in RC.iter() {
        // Theta
        let mut bc = [0u64; 5];
        for (i, b) in bc.iter_mut().enumerate() {
            *b = st[i] ^ st[i + 5] ^ st[i + 10] ^ st[i + 15] ^ st[i + 20];
        }
        for i in 0..5 {
            let t = bc[(i + 4) % 5] ^ bc[(i + 1) % 5].rotate_left(1);
            for j in (0..25).step_by(5) {
                st[j + i] ^= t;
            }
        }

        // Rho and Pi
        let mut t = st[1];
        for i in 0..24 {
            let j = PI[i];
            let tmp = st[j];
            st[j] = t.rotate_left(RHO[i]);
            t = tmp;
        }

        // Chi
        for j in (0..25).step_by(5) {
            let mut row = [0u64; 5];
            row.copy_from_slice(&st[j..j + 5]);
            for i in 0..5 {
                st[j + i] = row[i] ^ (!row[(i + 1) % 5] & row[(i + 2) % 5]);
            }
        }

        // Iota
        st[0] ^= rc;
    }
}

// =============================================================================
// SPONGE
// =============================================================================

/// Common sponge core shared by the XOF and the fixed digests.
#[derive(Clone)]
struct Sponge {
    st: [u64; 25],
    pt: usize,
    rate: usize,
}

impl Sponge {
    fn new(rate: usize) -> Self {
        Self {
            st: [0u64; 25],
            pt: 0,
            rate,
        }
    }

    #[inline]
    fn xor_byte(&mut self, idx: usize, b: u8) {
        self.st[idx >> 3] ^= (b as u64) << ((idx & 7) << 3);
    }

    #[inline]
    fn get_byte(&self, idx: usize) -> u8 {
        (self.st[idx >> 3] >> ((idx & 7) << 3)) as u8
    }

    fn absorb(&mut self, data: &[u8]) {
        let mut j = self.pt;
        for &b in data {
            self.xor_byte(j, b);
            j += 1;
            if j >= self.rate {
                keccak_f1600(&mut self.st);
                j = 0;
            }
        }
        self.pt = j;
    }

    fn finalize(&mut self, domain: u8) {
        self.xor_byte(self.pt, domain);
        let idx = self.rate - 1;
        self.xor_byte(idx, 0x80);
        keccak_f1600(&mut self.st);
        self.pt = 0;
    }

    fn squeeze(&mut self, out: &mut [u8]) {
        let mut j = self.pt;
        for b in out.iter_mut() {
            if j >= self.rate {
                keccak_f1600(&mut self.st);
                j = 0;
            }
            *b = self.get_byte(j);
            j += 1;
        }
        self.pt = j;
    }
}

// =============================================================================
// SHAKE XOF
// =============================================================================

/// SHAKE-128/256 extendable output function.
///
/// `mdlen` selects the variant: 16 bytes for SHAKE-128, 32 for SHAKE-256,
/// setting the rate to `200 - 2 * mdlen`.
#[derive(Clone)]
pub struct Shake {
    sponge: Sponge,
    mdlen: usize,
    finalized: bool,
}

impl Shake {
    /// Create a SHAKE instance. Accepted security sizes are 16 or 32 bytes.
    pub fn new(mdlen: usize) -> Result<Self> {
        if mdlen != 16 && mdlen != 32 {
            return Err(Error::InvalidArgument("SHAKE security size must be 16 or 32"));
        }
        Ok(Self {
            sponge: Sponge::new(200 - 2 * mdlen),
            mdlen,
            finalized: false,
        })
    }

    /// The configured security size in bytes.
    pub fn length(&self) -> usize {
        self.mdlen
    }

    /// XOR bytes into the sponge; may be called any number of times before
    /// [`Self::finalize`]. A zero-length slice is a no-op.
    pub fn absorb(&mut self, data: &[u8]) {
        debug_assert!(!self.finalized);
        self.sponge.absorb(data);
    }

    /// Append the XOF domain byte and padding, then permute. Squeezing is
    /// valid from this point on.
    pub fn finalize(&mut self) {
        self.sponge.finalize(0x1F);
        self.finalized = true;
    }

    /// Emit output bytes, permuting on rate boundaries. A zero-length slice
    /// is a no-op.
    pub fn squeeze(&mut self, out: &mut [u8]) {
        debug_assert!(self.finalized);
        self.sponge.squeeze(out);
    }

    /// Clone the current state for a forked squeeze sequence.
    pub fn get_copy(&self) -> Self {
        self.clone()
    }
}

// =============================================================================
// SHA-3 FIXED DIGESTS
// =============================================================================

/// Fixed-length SHA-3 (224/256/384/512).
#[derive(Clone)]
pub struct Sha3 {
    sponge: Sponge,
    mdlen: usize,
}

impl Sha3 {
    /// Create a SHA-3 instance; `mdlen` is the digest size in bytes
    /// (28, 32, 48 or 64).
    pub fn new(mdlen: usize) -> Result<Self> {
        match mdlen {
            28 | 32 | 48 | 64 => Ok(Self {
                sponge: Sponge::new(200 - 2 * mdlen),
                mdlen,
            }),
            _ => Err(Error::InvalidArgument("SHA-3 digest size must be 28/32/48/64")),
        }
    }

    /// Absorb message bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.sponge.absorb(data);
    }

    /// Finalize with the SHA-3 domain byte and return the digest.
    pub fn finalize(mut self) -> Vec<u8> {
        self.sponge.finalize(0x06);
        let mut out = vec![0u8; self.mdlen];
        self.sponge.squeeze(&mut out);
        out
    }

    /// One-shot digest.
    pub fn digest(mdlen: usize, data: &[u8]) -> Result<Vec<u8>> {
        let mut h = Self::new(mdlen)?;
        h.update(data);
        Ok(h.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shake_rejects_bad_sizes() {
        assert!(Shake::new(16).is_ok());
        assert!(Shake::new(32).is_ok());
        assert!(Shake::new(24).is_err());
        assert!(Shake::new(0).is_err());
    }

    #[test]
    fn absorb_split_is_equivalent() {
        let msg = b"the quick brown fox jumps over the lazy dog";
        let mut a = match Shake::new(16) {
            Ok(s) => s,
            Err(_) => unreachable!(),
        };
        a.absorb(msg);
        a.finalize();
        let mut one = [0u8; 64];
        a.squeeze(&mut one);

        let mut b = match Shake::new(16) {
            Ok(s) => s,
            Err(_) => unreachable!(),
        };
        b.absorb(&msg[..7]);
        b.absorb(&msg[7..30]);
        b.absorb(&msg[30..]);
        b.finalize();
        let mut two = [0u8; 64];
        b.squeeze(&mut two);

        assert_eq!(one, two);
    }

    #[test]
    fn forked_squeeze_diverges_from_shared_prefix() {
        let mut x = match Shake::new(32) {
            Ok(s) => s,
            Err(_) => unreachable!(),
        };
        x.absorb(b"seed");
        x.finalize();
        let mut prefix = [0u8; 16];
        x.squeeze(&mut prefix);

        let mut y = x.get_copy();
        let mut ox = [0u8; 32];
        let mut oy = [0u8; 32];
        x.squeeze(&mut ox);
        y.squeeze(&mut oy);
        assert_eq!(ox, oy);
    }

    #[test]
    fn incremental_squeeze_is_equivalent() {
        let mut a = match Shake::new(32) {
            Ok(s) => s,
            Err(_) => unreachable!(),
        };
        a.absorb(b"stream");
        a.finalize();
        let mut whole = [0u8; 96];
        a.squeeze(&mut whole);

        let mut b = match Shake::new(32) {
            Ok(s) => s,
            Err(_) => unreachable!(),
        };
        b.absorb(b"stream");
        b.finalize();
        let mut parts = [0u8; 96];
        b.squeeze(&mut parts[..1]);
        b.squeeze(&mut parts[1..67]);
        b.squeeze(&mut parts[67..]);

        assert_eq!(whole, parts);
    }
}
