//! The NTRU lattice trapdoor scheme: keygen over the equation solver,
//! preimage-sampling signatures and identity key extraction over the
//! master tree.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bits;
use crate::csprng::{Csprng, EntropyCallback};
use crate::error::{Error, Result};
use crate::ntru::{gram_schmidt_norm, MasterTree, NtruSolver};
use crate::ntt::NttContext;
use crate::packing::{Packer, Unpacker};
use crate::reduce::{MontgomeryReducer, Reducer};
use crate::sampling::{Gaussian, GaussianCdf};
use crate::sha3::Shake;

use super::{Scheme, SignatureScheme, UserCtx};

/// Trapdoor parameter set.
#[derive(Clone, Copy, Debug)]
pub struct TrapdoorParams {
    /// Parameter set name.
    pub name: &'static str,
    /// log2 of the ring degree.
    pub logn: usize,
    /// Ring modulus.
    pub q: u32,
}

const PARAM_SETS: [TrapdoorParams; 2] = [
    TrapdoorParams {
        name: "trapdoor-512",
        logn: 9,
        q: 12289,
    },
    TrapdoorParams {
        name: "trapdoor-1024",
        logn: 10,
        q: 12289,
    },
];

/// Per-coefficient magnitude limit on sampled f, g, indexed by logn.
const MAX_FG_BITS: [u32; 11] = [0, 8, 8, 8, 8, 8, 7, 7, 6, 6, 5];

/// Candidate cap before keygen reports exhaustion.
const MAX_KEYGEN_ATTEMPTS: u32 = 10_000;

/// Salt bytes mixed into the signature hash.
const SALT_LEN: usize = 40;

/// Domain-separation scheme tag absorbed ahead of every hash.
const SCHEME_TAG: u8 = 0x4E;
const PURPOSE_SIGN: u8 = 0x53;
const PURPOSE_EXTRACT: u8 = 0x49;

/// Lattice trapdoor user context.
pub struct TrapdoorCtx {
    set: usize,
    params: TrapdoorParams,
    reduction: MontgomeryReducer,
    ntt: NttContext<MontgomeryReducer>,
    rng: Csprng,
    sampler: GaussianCdf,
    cancel: Arc<AtomicBool>,

    f: Vec<i32>,
    g: Vec<i32>,
    big_f: Vec<i32>,
    big_g: Vec<i32>,
    h: Vec<i32>,
    h_ntt: Vec<u32>,
    master: Option<MasterTree>,
    have_public: bool,
}

impl UserCtx for TrapdoorCtx {
    fn scheme(&self) -> Scheme {
        Scheme::LatticeTrapdoor
    }

    fn set(&self) -> usize {
        self.set
    }

    fn set_name(&self) -> &'static str {
        self.params.name
    }

    fn as_any(&self) -> &dyn core::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }
}

impl TrapdoorCtx {
    /// Create a context for the given parameter set.
    pub fn new(set: usize, seed_period: u64, entropy: EntropyCallback) -> Result<Self> {
        let params = *PARAM_SETS
            .get(set)
            .ok_or(Error::InvalidArgument("unknown parameter set"))?;
        let n = 1usize << params.logn;

        let reduction = MontgomeryReducer::new(params.q, 32);
        let ntt = NttContext::new(reduction.clone(), n)?;
        let rng = Csprng::new(seed_period, entropy)?;
        let sigma = 1.17 * (params.q as f64 / (2 * n) as f64).sqrt();
        let sampler = GaussianCdf::new(sigma, 10.0);

        Ok(Self {
            set,
            params,
            reduction,
            ntt,
            rng,
            sampler,
            cancel: Arc::new(AtomicBool::new(false)),
            f: vec![0; n],
            g: vec![0; n],
            big_f: vec![0; n],
            big_g: vec![0; n],
            h: vec![0; n],
            h_ntt: vec![0; n],
            master: None,
            have_public: false,
        })
    }

    /// The cancel flag checked between keygen candidates.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Sample (f, g) until the trapdoor conditions hold, then solve the
    /// NTRU equation and derive the public key. Returns the number of
    /// rejected candidates.
    pub fn keygen(&mut self) -> Result<u32> {
        let logn = self.params.logn;
        let n = 1usize << logn;
        let q = self.params.q;

        let bd = 1.17 * (q as f64).sqrt();
        let thresh = bd * bd;
        let lim = 1i32 << (MAX_FG_BITS[logn] - 1);

        let mut attempts = 0u32;
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }
            if attempts >= MAX_KEYGEN_ATTEMPTS {
                return Err(Error::ResourceExhausted);
            }

            for i in 0..n {
                self.f[i] = self.sampler.sample_signed(&mut self.rng);
            }
            for i in 0..n {
                self.g[i] = self.sampler.sample_signed(&mut self.rng);
            }

            if self
                .f
                .iter()
                .chain(self.g.iter())
                .any(|&v| v >= lim || v <= -lim)
            {
                attempts += 1;
                continue;
            }

            let gs_norm = gram_schmidt_norm(&self.f, &self.g, q, logn, bd, thresh);
            if gs_norm.is_nan() || gs_norm > thresh {
                attempts += 1;
                tracing::trace!(attempts, gs_norm, "candidate rejected on norm");
                continue;
            }

            let solver = NtruSolver::new(logn, q, &self.reduction, &self.ntt);
            if !solver.solve(&self.f, &self.g, &mut self.big_f, &mut self.big_g) {
                attempts += 1;
                tracing::trace!(attempts, "NTRU equation unsolvable for candidate");
                continue;
            }

            if !solver.gen_public(&mut self.h, &mut self.h_ntt, &self.f, &self.g) {
                attempts += 1;
                tracing::trace!(attempts, "candidate f not invertible");
                continue;
            }

            break;
        }

        self.master = Some(MasterTree::build(
            q, logn, &self.f, &self.g, &self.big_f, &self.big_g,
        ));
        self.have_public = true;
        tracing::debug!(attempts, set = self.params.name, "trapdoor keygen complete");
        Ok(attempts)
    }

    fn private_field_bits(&self) -> (u32, u32) {
        let n = 1usize << self.params.logn;
        let t = (6.0 * 1.17 * (self.params.q as f64 / (2 * n) as f64).sqrt()) as u64;
        let q_bits_1 = 1 + bits::ilog2_ceil(t);
        (q_bits_1, q_bits_1 + 5)
    }

    /// Serialize f, g, F, G as two's-complement fields.
    pub fn get_private_key(&self) -> Result<Vec<u8>> {
        if self.master.is_none() {
            return Err(Error::InvalidArgument("no private key loaded"));
        }
        let n = 1usize << self.params.logn;
        let (b1, b2) = self.private_field_bits();
        let mut pack = Packer::new(2 * n * (b1 + b2) as usize);
        for &v in &self.f {
            pack.write_signed(v, b1);
        }
        for &v in &self.g {
            pack.write_signed(v, b1);
        }
        for &v in &self.big_f {
            pack.write_signed(v, b2);
        }
        for &v in &self.big_g {
            pack.write_signed(v, b2);
        }
        Ok(pack.into_bytes())
    }

    /// Load a private key and rebuild the master tree and public key.
    pub fn set_private_key(&mut self, key: &[u8]) -> Result<()> {
        let logn = self.params.logn;
        let n = 1usize << logn;
        let (b1, b2) = self.private_field_bits();
        let mut up = Unpacker::new(key);
        for i in 0..n {
            self.f[i] = up.read_signed(b1)?;
        }
        for i in 0..n {
            self.g[i] = up.read_signed(b1)?;
        }
        for i in 0..n {
            self.big_f[i] = up.read_signed(b2)?;
        }
        for i in 0..n {
            self.big_g[i] = up.read_signed(b2)?;
        }

        let solver = NtruSolver::new(logn, self.params.q, &self.reduction, &self.ntt);
        if !solver.gen_public(&mut self.h, &mut self.h_ntt, &self.f, &self.g) {
            return Err(Error::DecodeError);
        }
        self.master = Some(MasterTree::build(
            self.params.q,
            logn,
            &self.f,
            &self.g,
            &self.big_f,
            &self.big_g,
        ));
        self.have_public = true;
        Ok(())
    }

    /// Serialize h as big-endian fixed-width fields.
    pub fn get_public_key(&self) -> Result<Vec<u8>> {
        if !self.have_public {
            return Err(Error::InvalidArgument("no public key loaded"));
        }
        let n = 1usize << self.params.logn;
        let q_bits = bits::ilog2_ceil(self.params.q as u64);
        let mut pack = Packer::new(n * q_bits as usize);
        for &v in &self.h {
            pack.write_unsigned_be(v as u32, q_bits);
        }
        Ok(pack.into_bytes())
    }

    /// Load an encoded public key and derive its NTT form.
    pub fn set_public_key(&mut self, key: &[u8]) -> Result<()> {
        let logn = self.params.logn;
        let n = 1usize << logn;
        let q_bits = bits::ilog2_ceil(self.params.q as u64);
        let mut up = Unpacker::new(key);
        for i in 0..n {
            let v = up.read_unsigned_be(q_bits)?;
            if v >= self.params.q {
                return Err(Error::DecodeError);
            }
            self.h[i] = v as i32;
        }

        for i in 0..n {
            self.h_ntt[i] = self.reduction.convert_to(self.h[i] as u32);
        }
        self.ntt.fwd(&mut self.h_ntt, logn, 1);
        self.have_public = true;
        Ok(())
    }

    /// Hash a message to a ring element, with domain separation.
    fn hash_to_ring(&self, purpose: u8, salt: &[u8], msg: &[u8]) -> Result<Vec<i32>> {
        let n = 1usize << self.params.logn;
        let q = self.params.q;

        let mut xof = Shake::new(32)?;
        xof.absorb(&[SCHEME_TAG, self.set as u8, purpose]);
        xof.absorb(salt);
        xof.absorb(msg);
        xof.finalize();

        let over = 65536 - 65536 % q;
        let mut c = vec![0i32; n];
        for slot in c.iter_mut() {
            loop {
                let mut b = [0u8; 2];
                xof.squeeze(&mut b);
                let v = u16::from_be_bytes(b) as u32;
                if v < over {
                    *slot = (v % q) as i32;
                    break;
                }
            }
        }
        Ok(c)
    }

    fn norm_bound(&self) -> u64 {
        let n = 1usize << self.params.logn;
        (3.46 * self.params.q as f64 * (2 * n) as f64) as u64
    }

    /// Sign: hash to a ring target and sample a short preimage.
    pub fn sign(&mut self, msg: &[u8]) -> Result<Vec<u8>> {
        if self.master.is_none() {
            return Err(Error::InvalidArgument("no private key loaded"));
        }
        let n = 1usize << self.params.logn;
        let q = self.params.q;
        let bound = self.norm_bound();

        let mut salt = [0u8; SALT_LEN];
        self.rng.get_mem(&mut salt);
        let c = self.hash_to_ring(PURPOSE_SIGN, &salt, msg)?;

        let mut s1 = vec![0i32; n];
        let mut s2 = vec![0i32; n];
        for _ in 0..64 {
            let master = match self.master.as_ref() {
                Some(m) => m,
                None => unreachable!(),
            };
            master.sample_preimage(&mut self.rng, q, &c, Some(&mut s1), &mut s2);
            let norm: u64 = s1
                .iter()
                .chain(s2.iter())
                .map(|&v| (v as i64 * v as i64) as u64)
                .sum();
            if norm <= bound {
                let mut pack = Packer::new(8 * SALT_LEN + 16 * n);
                for &b in &salt {
                    pack.write_unsigned(b as u32, 8);
                }
                for &v in &s2 {
                    pack.write_signed(v, 16);
                }
                return Ok(pack.into_bytes());
            }
        }
        Err(Error::ResourceExhausted)
    }

    /// Verify: recompute the target, reconstruct s1 = c - s2*h and check
    /// the norm.
    pub fn verify(&mut self, msg: &[u8], sig: &[u8]) -> Result<bool> {
        if !self.have_public {
            return Err(Error::InvalidArgument("no public key loaded"));
        }
        let logn = self.params.logn;
        let n = 1usize << logn;
        let q = self.params.q;

        if sig.len() != SALT_LEN + 2 * n {
            return Err(Error::DecodeError);
        }
        let salt = &sig[..SALT_LEN];
        let mut up = Unpacker::new(&sig[SALT_LEN..]);
        let mut s2 = vec![0i32; n];
        for v in s2.iter_mut() {
            *v = up.read_signed(16)?;
        }

        let c = self.hash_to_ring(PURPOSE_SIGN, salt, msg)?;

        // s2 * h via the NTT.
        let mut s2q: Vec<u32> = s2
            .iter()
            .map(|&v| {
                self.reduction
                    .convert_to((v as u32).wrapping_add(q & ((v >> 31) as u32)))
            })
            .collect();
        self.ntt.fwd(&mut s2q, logn, 1);
        for i in 0..n {
            s2q[i] = self.reduction.mul(s2q[i], self.h_ntt[i]);
        }
        self.ntt.inv(&mut s2q, logn, 1);

        let half = (q / 2) as i64;
        let mut norm = 0u64;
        for i in 0..n {
            let s2h = self.reduction.convert_from(s2q[i]) as i64;
            let mut s1 = (c[i] as i64 - s2h).rem_euclid(q as i64);
            if s1 > half {
                s1 -= q as i64;
            }
            norm = norm.wrapping_add((s1 * s1) as u64);
            norm = norm.wrapping_add((s2[i] as i64 * s2[i] as i64) as u64);
        }

        Ok(norm <= self.norm_bound())
    }

    /// Extract the identity user key: a short preimage of H(id), packed
    /// as (s1, s2).
    pub fn extract_user_key(&mut self, id: &[u8]) -> Result<Vec<u8>> {
        if self.master.is_none() {
            return Err(Error::InvalidArgument("no private key loaded"));
        }
        let n = 1usize << self.params.logn;
        let q = self.params.q;

        let c = self.hash_to_ring(PURPOSE_EXTRACT, &[], id)?;
        let mut s1 = vec![0i32; n];
        let mut s2 = vec![0i32; n];
        let master = match self.master.as_ref() {
            Some(m) => m,
            None => unreachable!(),
        };
        master.sample_preimage(&mut self.rng, q, &c, Some(&mut s1), &mut s2);

        let mut pack = Packer::new(32 * n);
        for &v in &s1 {
            pack.write_signed(v, 16);
        }
        for &v in &s2 {
            pack.write_signed(v, 16);
        }
        Ok(pack.into_bytes())
    }
}

impl SignatureScheme for TrapdoorCtx {
    fn sign(&mut self, msg: &[u8]) -> Result<Vec<u8>> {
        TrapdoorCtx::sign(self, msg)
    }

    fn verify(&mut self, msg: &[u8], sig: &[u8]) -> Result<bool> {
        TrapdoorCtx::verify(self, msg, sig)
    }
}
