//! Cryptographically secure random number generation.
//!
//! An AES-256 CTR-DRBG (SP 800-90A shape: counter-mode generate with a K/V
//! update function, no derivation function) seeded and periodically reseeded
//! from a caller-supplied entropy callback. Output is buffered in a pool of
//! 32-bit words; `get_bits` tracks leftover bits so odd-width requests waste
//! nothing.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes256Enc;

use crate::error::{Error, Result};

/// Entropy callback: fills the provided buffer with entropy bytes. Failure
/// is signalled by filling zeros, which the constructor rejects.
pub type EntropyCallback = fn(&mut [u8]);

/// Seed material length for the AES-256 CTR-DRBG (key + counter).
const SEED_LEN: usize = 48;

/// Number of 32-bit words kept in the output pool.
const POOL_WORDS: usize = 32;

// =============================================================================
// CTR-DRBG
// =============================================================================

#[derive(Debug)]
struct CtrDrbg {
    cipher: Aes256Enc,
    v: u128,
    cb: EntropyCallback,
    reseed_period: u64,
    generated: u64,
}

impl CtrDrbg {
    fn new(reseed_period: u64, cb: EntropyCallback) -> Result<Self> {
        let mut seed = [0u8; SEED_LEN];
        cb(&mut seed);
        if seed.iter().all(|&b| b == 0) {
            return Err(Error::ResourceExhausted);
        }

        let mut drbg = Self {
            cipher: Aes256Enc::new(GenericArray::from_slice(&[0u8; 32])),
            v: 0,
            cb,
            reseed_period: if reseed_period == 0 {
                u64::MAX
            } else {
                reseed_period
            },
            generated: 0,
        };
        drbg.update(&seed);
        Ok(drbg)
    }

    /// K/V update with the provided data (SP 800-90A CTR_DRBG_Update).
    fn update(&mut self, provided: &[u8; SEED_LEN]) {
        let mut temp = [0u8; SEED_LEN];
        for i in 0..3 {
            self.v = self.v.wrapping_add(1);
            let mut block = GenericArray::clone_from_slice(&self.v.to_be_bytes());
            self.cipher.encrypt_block(&mut block);
            temp[i * 16..(i + 1) * 16].copy_from_slice(&block);
        }
        for (t, p) in temp.iter_mut().zip(provided.iter()) {
            *t ^= p;
        }
        self.cipher = Aes256Enc::new(GenericArray::from_slice(&temp[..32]));
        let mut vb = [0u8; 16];
        vb.copy_from_slice(&temp[32..]);
        self.v = u128::from_be_bytes(vb);
    }

    fn reseed(&mut self) {
        let mut seed = [0u8; SEED_LEN];
        (self.cb)(&mut seed);
        self.update(&seed);
        self.generated = 0;
        tracing::debug!("csprng reseeded from entropy callback");
    }

    fn generate(&mut self, out: &mut [u8]) {
        for chunk in out.chunks_mut(16) {
            if self.generated >= self.reseed_period {
                self.reseed();
            }
            self.v = self.v.wrapping_add(1);
            let mut block = GenericArray::clone_from_slice(&self.v.to_be_bytes());
            self.cipher.encrypt_block(&mut block);
            chunk.copy_from_slice(&block[..chunk.len()]);
            self.generated += chunk.len() as u64;
        }
        // Backtracking resistance between generate calls.
        self.update(&[0u8; SEED_LEN]);
    }
}

// =============================================================================
// CSPRNG
// =============================================================================

/// Pooled CSPRNG over the AES-CTR-DRBG.
#[derive(Debug)]
pub struct Csprng {
    drbg: CtrDrbg,
    pool: [u32; POOL_WORDS],
    pool_idx: usize,
    bit_buf: u64,
    bit_cnt: u32,
}

impl Csprng {
    /// Create a CSPRNG. The entropy callback is consumed during
    /// construction and again after every `seed_period` bytes of DRBG
    /// output (0 selects the implementation maximum).
    pub fn new(seed_period: u64, cb: EntropyCallback) -> Result<Self> {
        Ok(Self {
            drbg: CtrDrbg::new(seed_period, cb)?,
            pool: [0u32; POOL_WORDS],
            pool_idx: POOL_WORDS,
            bit_buf: 0,
            bit_cnt: 0,
        })
    }

    fn next_word(&mut self) -> u32 {
        if self.pool_idx == POOL_WORDS {
            let mut bytes = [0u8; POOL_WORDS * 4];
            self.drbg.generate(&mut bytes);
            for (i, w) in self.pool.iter_mut().enumerate() {
                *w = u32::from_le_bytes([
                    bytes[4 * i],
                    bytes[4 * i + 1],
                    bytes[4 * i + 2],
                    bytes[4 * i + 3],
                ]);
            }
            self.pool_idx = 0;
        }
        let w = self.pool[self.pool_idx];
        self.pool_idx += 1;
        w
    }

    /// Draw `n` random bits, `n` in 0..=32. Leftover bits from wide draws
    /// feed subsequent narrow requests.
    pub fn get_bits(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32);
        if n == 0 {
            return 0;
        }
        while self.bit_cnt < n {
            self.bit_buf |= (self.next_word() as u64) << self.bit_cnt;
            self.bit_cnt += 32;
        }
        let r = (self.bit_buf & ((1u64 << n) - 1)) as u32;
        self.bit_buf >>= n;
        self.bit_cnt -= n;
        r
    }

    /// Fill a byte buffer with random data.
    pub fn get_mem(&mut self, out: &mut [u8]) {
        for b in out.iter_mut() {
            *b = self.get_bits(8) as u8;
        }
    }

    /// Draw a random value of the requested type.
    pub fn get<T: RandomSample>(&mut self) -> T {
        T::sample(self)
    }
}

/// Types the CSPRNG can produce directly.
pub trait RandomSample {
    /// Draw one value.
    fn sample(rng: &mut Csprng) -> Self;
}

impl RandomSample for bool {
    fn sample(rng: &mut Csprng) -> Self {
        rng.get_bits(1) != 0
    }
}

impl RandomSample for u8 {
    fn sample(rng: &mut Csprng) -> Self {
        rng.get_bits(8) as u8
    }
}

impl RandomSample for u16 {
    fn sample(rng: &mut Csprng) -> Self {
        rng.get_bits(16) as u16
    }
}

impl RandomSample for u32 {
    fn sample(rng: &mut Csprng) -> Self {
        rng.get_bits(32)
    }
}

impl RandomSample for u64 {
    fn sample(rng: &mut Csprng) -> Self {
        let lo = rng.get_bits(32) as u64;
        let hi = rng.get_bits(32) as u64;
        lo | (hi << 32)
    }
}

impl RandomSample for f32 {
    /// Uniform in [0, 1): 23 mantissa bits into [1, 2), minus 1.
    fn sample(rng: &mut Csprng) -> Self {
        f32::from_bits(0x3F80_0000 | rng.get_bits(23)) - 1.0
    }
}

impl RandomSample for f64 {
    /// Uniform in [0, 1): 52 mantissa bits into [1, 2), minus 1.
    fn sample(rng: &mut Csprng) -> Self {
        let m: u64 = rng.get::<u64>() >> 12;
        f64::from_bits(0x3FF0_0000_0000_0000 | m) - 1.0
    }
}

impl rand_core::RngCore for Csprng {
    fn next_u32(&mut self) -> u32 {
        self.get_bits(32)
    }

    fn next_u64(&mut self) -> u64 {
        self.get()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.get_mem(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand_core::Error> {
        self.get_mem(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn counter_cb(buf: &mut [u8]) {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (i + 1) as u8;
        }
    }

    fn zero_cb(buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = 0;
        }
    }

    #[test]
    fn rejects_zero_entropy() {
        assert_eq!(Csprng::new(0, zero_cb).unwrap_err(), Error::ResourceExhausted);
    }

    #[test]
    fn bit_draws_are_masked() {
        let mut rng = Csprng::new(0, counter_cb).unwrap();
        assert_eq!(rng.get_bits(0), 0);
        for n in 1..32 {
            let bits = rng.get_bits(n);
            assert_eq!(bits & (u32::MAX << n), 0, "n = {n}");
        }
    }

    #[test]
    fn get_mem_fills_only_requested() {
        let mut rng = Csprng::new(0, counter_cb).unwrap();
        for len in 1..=16usize {
            let mut mem = [0u8; 16];
            rng.get_mem(&mut mem[..len]);
            for &b in &mem[len..] {
                assert_eq!(b, 0);
            }
        }
    }

    #[test]
    fn floats_land_in_unit_interval() {
        let mut rng = Csprng::new(0, counter_cb).unwrap();
        for _ in 0..1000 {
            let x: f64 = rng.get();
            assert!((0.0..1.0).contains(&x));
            let y: f32 = rng.get();
            assert!((0.0..1.0).contains(&y));
        }
    }

    #[test]
    fn boolean_draws_mix() {
        let mut rng = Csprng::new(0, counter_cb).unwrap();
        let ones = (0..1000).filter(|_| rng.get::<bool>()).count();
        assert!(ones > 0 && ones < 1000);
    }
}
