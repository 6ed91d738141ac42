//! Multi-precision signed integers.
//!
//! Sign-magnitude representation over 32-bit limbs, least significant
//! first, canonically normalized (no trailing zero limbs, non-negative
//! zero). Arithmetic either mutates in place or produces fresh values;
//! limb storage is never shared.

use core::cmp::Ordering;

use crate::error::{Error, Result};

mod modular;

pub use modular::{ModCtx, Reduction};

/// A multiple-precision signed integer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mpz {
    limbs: Vec<u32>,
    neg: bool,
}

// =============================================================================
// UNSIGNED LIMB KERNELS
// =============================================================================

fn norm(v: &mut Vec<u32>) {
    while v.last() == Some(&0) {
        v.pop();
    }
}

fn ucmp(a: &[u32], b: &[u32]) -> Ordering {
    if a.len() != b.len() {
        return a.len().cmp(&b.len());
    }
    for i in (0..a.len()).rev() {
        if a[i] != b[i] {
            return a[i].cmp(&b[i]);
        }
    }
    Ordering::Equal
}

fn uadd(a: &[u32], b: &[u32]) -> Vec<u32> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut out = Vec::with_capacity(long.len() + 1);
    let mut carry = 0u64;
    for i in 0..long.len() {
        let s = long[i] as u64 + *short.get(i).unwrap_or(&0) as u64 + carry;
        out.push(s as u32);
        carry = s >> 32;
    }
    if carry != 0 {
        out.push(carry as u32);
    }
    out
}

/// a - b for a >= b.
fn usub(a: &[u32], b: &[u32]) -> Vec<u32> {
    debug_assert!(ucmp(a, b) != Ordering::Less);
    let mut out = Vec::with_capacity(a.len());
    let mut borrow = 0i64;
    for i in 0..a.len() {
        let d = a[i] as i64 - *b.get(i).unwrap_or(&0) as i64 - borrow;
        out.push((d & 0xFFFF_FFFF) as u32);
        borrow = (d < 0) as i64;
    }
    norm(&mut out);
    out
}

fn umul(a: &[u32], b: &[u32]) -> Vec<u32> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0u32; a.len() + b.len()];
    for (i, &ai) in a.iter().enumerate() {
        let mut carry = 0u64;
        for (j, &bj) in b.iter().enumerate() {
            let s = out[i + j] as u64 + ai as u64 * bj as u64 + carry;
            out[i + j] = s as u32;
            carry = s >> 32;
        }
        out[i + b.len()] = carry as u32;
    }
    norm(&mut out);
    out
}

fn umul_u32(a: &[u32], w: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len() + 1);
    let mut carry = 0u64;
    for &ai in a {
        let s = ai as u64 * w as u64 + carry;
        out.push(s as u32);
        carry = s >> 32;
    }
    if carry != 0 {
        out.push(carry as u32);
    }
    norm(&mut out);
    out
}

fn ushl(a: &[u32], bits: usize) -> Vec<u32> {
    if a.is_empty() {
        return Vec::new();
    }
    let words = bits / 32;
    let sh = (bits % 32) as u32;
    let mut out = vec![0u32; words];
    if sh == 0 {
        out.extend_from_slice(a);
    } else {
        let mut carry = 0u32;
        for &ai in a {
            out.push((ai << sh) | carry);
            carry = ai >> (32 - sh);
        }
        if carry != 0 {
            out.push(carry);
        }
    }
    norm(&mut out);
    out
}

fn ushr(a: &[u32], bits: usize) -> Vec<u32> {
    let words = bits / 32;
    if words >= a.len() {
        return Vec::new();
    }
    let sh = (bits % 32) as u32;
    let mut out = a[words..].to_vec();
    if sh != 0 {
        for i in 0..out.len() {
            let hi = if i + 1 < out.len() { out[i + 1] } else { 0 };
            out[i] = (out[i] >> sh) | (hi.checked_shl(32 - sh).unwrap_or(0));
        }
    }
    norm(&mut out);
    out
}

fn udivrem_u32(a: &[u32], d: u32) -> (Vec<u32>, u32) {
    debug_assert!(d != 0);
    let mut q = vec![0u32; a.len()];
    let mut rem = 0u64;
    for i in (0..a.len()).rev() {
        let cur = (rem << 32) | a[i] as u64;
        q[i] = (cur / d as u64) as u32;
        rem = cur % d as u64;
    }
    norm(&mut q);
    (q, rem as u32)
}

/// Knuth Algorithm D long division on normalized operands.
fn udivrem(a: &[u32], b: &[u32]) -> (Vec<u32>, Vec<u32>) {
    debug_assert!(!b.is_empty());
    if ucmp(a, b) == Ordering::Less {
        return (Vec::new(), a.to_vec());
    }
    if b.len() == 1 {
        let (q, r) = udivrem_u32(a, b[0]);
        return (q, if r == 0 { Vec::new() } else { vec![r] });
    }

    // Normalize so the top divisor limb has its high bit set.
    let sh = b[b.len() - 1].leading_zeros() as usize;
    let bn = ushl(b, sh);
    let mut an = ushl(a, sh);
    an.push(0);

    let n = bn.len();
    let m = an.len() - n - 1;
    let mut q = vec![0u32; m + 1];
    let btop = bn[n - 1] as u64;
    let bnext = bn[n - 2] as u64;

    for j in (0..=m).rev() {
        // Estimate the quotient digit from the top three dividend limbs.
        let num = ((an[j + n] as u64) << 32) | an[j + n - 1] as u64;
        let mut qhat = num / btop;
        let mut rhat = num % btop;
        while qhat >> 32 != 0
            || qhat as u128 * bnext as u128 > ((rhat as u128) << 32) + an[j + n - 2] as u128
        {
            qhat -= 1;
            rhat += btop;
            if rhat >> 32 != 0 {
                break;
            }
        }

        // Multiply and subtract; fix up on the rare overshoot.
        let mut borrow = 0i64;
        let mut carry = 0u64;
        for i in 0..n {
            let p = qhat * bn[i] as u64 + carry;
            carry = p >> 32;
            let d = an[j + i] as i64 - (p & 0xFFFF_FFFF) as i64 - borrow;
            an[j + i] = (d & 0xFFFF_FFFF) as u32;
            borrow = (d < 0) as i64;
        }
        let d = an[j + n] as i64 - carry as i64 - borrow;
        an[j + n] = (d & 0xFFFF_FFFF) as u32;

        if d < 0 {
            // qhat was one too large: add the divisor back.
            qhat -= 1;
            let mut carry = 0u64;
            for i in 0..n {
                let s = an[j + i] as u64 + bn[i] as u64 + carry;
                an[j + i] = s as u32;
                carry = s >> 32;
            }
            an[j + n] = an[j + n].wrapping_add(carry as u32);
        }
        q[j] = qhat as u32;
    }

    norm(&mut q);
    let mut r = an[..n].to_vec();
    norm(&mut r);
    if sh != 0 {
        r = ushr(&r, sh);
    }
    (q, r)
}

// =============================================================================
// CONSTRUCTION AND ACCESS
// =============================================================================

impl Mpz {
    /// Zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the value is zero.
    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    /// True when the value is negative; zero is never negative.
    pub fn is_negative(&self) -> bool {
        self.neg
    }

    /// Number of limbs in use.
    pub fn limb_len(&self) -> usize {
        self.limbs.len()
    }

    /// The limbs, least significant first.
    pub fn limbs(&self) -> &[u32] {
        &self.limbs
    }

    /// Limb i, 0 beyond the used length.
    pub fn limb(&self, i: usize) -> u32 {
        *self.limbs.get(i).unwrap_or(&0)
    }

    fn from_parts(mut limbs: Vec<u32>, neg: bool) -> Self {
        norm(&mut limbs);
        let neg = neg && !limbs.is_empty();
        Self { limbs, neg }
    }

    /// Copy the value of `other` into self.
    pub fn set(&mut self, other: &Mpz) -> &mut Self {
        self.limbs.clear();
        self.limbs.extend_from_slice(&other.limbs);
        self.neg = other.neg;
        self
    }

    /// Exchange two values.
    pub fn swap(&mut self, other: &mut Mpz) {
        core::mem::swap(&mut self.limbs, &mut other.limbs);
        core::mem::swap(&mut self.neg, &mut other.neg);
    }

    /// Bit length of the magnitude (0 for zero).
    pub fn bit_len(&self) -> usize {
        match self.limbs.last() {
            None => 0,
            Some(&top) => 32 * self.limbs.len() - top.leading_zeros() as usize,
        }
    }

    /// Number of digits in the given base (1 for zero), exact.
    pub fn sizeinbase(&self, base: u32) -> usize {
        if self.is_zero() {
            return 1;
        }
        if base == 2 {
            return self.bit_len();
        }
        let mut mag = self.limbs.clone();
        let mut digits = 0;
        while !mag.is_empty() {
            let (q, _) = udivrem_u32(&mag, base);
            mag = q;
            digits += 1;
        }
        digits
    }

    /// Read bit i of the magnitude.
    pub fn get_bit(&self, i: usize) -> bool {
        let w = i / 32;
        w < self.limbs.len() && (self.limbs[w] >> (i % 32)) & 1 == 1
    }

    /// Set bit i of the magnitude.
    pub fn set_bit(&mut self, i: usize) {
        let w = i / 32;
        if w >= self.limbs.len() {
            self.limbs.resize(w + 1, 0);
        }
        self.limbs[w] |= 1 << (i % 32);
    }

    /// Magnitude as u32; truncating.
    pub fn to_u32(&self) -> u32 {
        self.limb(0)
    }

    /// Value as u64; truncating on the magnitude, ignoring sign.
    pub fn to_u64(&self) -> u64 {
        self.limb(0) as u64 | (self.limb(1) as u64) << 32
    }
}

impl From<u32> for Mpz {
    fn from(v: u32) -> Self {
        Self::from_parts(vec![v], false)
    }
}

impl From<u64> for Mpz {
    fn from(v: u64) -> Self {
        Self::from_parts(vec![v as u32, (v >> 32) as u32], false)
    }
}

impl From<i32> for Mpz {
    fn from(v: i32) -> Self {
        Self::from_parts(vec![v.unsigned_abs()], v < 0)
    }
}

impl From<i64> for Mpz {
    fn from(v: i64) -> Self {
        let m = v.unsigned_abs();
        Self::from_parts(vec![m as u32, (m >> 32) as u32], v < 0)
    }
}

// =============================================================================
// COMPARISON
// =============================================================================

impl PartialOrd for Mpz {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mpz {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.neg, other.neg) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => ucmp(&self.limbs, &other.limbs),
            (true, true) => ucmp(&other.limbs, &self.limbs),
        }
    }
}

impl Mpz {
    /// Compare the magnitude against another value's magnitude.
    pub fn cmp_abs(&self, other: &Mpz) -> Ordering {
        ucmp(&self.limbs, &other.limbs)
    }
}

// =============================================================================
// ARITHMETIC
// =============================================================================

impl Mpz {
    fn add_signed(a: &Mpz, b: &Mpz) -> Mpz {
        if a.neg == b.neg {
            Mpz::from_parts(uadd(&a.limbs, &b.limbs), a.neg)
        } else {
            match ucmp(&a.limbs, &b.limbs) {
                Ordering::Equal => Mpz::new(),
                Ordering::Greater => Mpz::from_parts(usub(&a.limbs, &b.limbs), a.neg),
                Ordering::Less => Mpz::from_parts(usub(&b.limbs, &a.limbs), b.neg),
            }
        }
    }

    /// Negate in place; zero stays non-negative.
    pub fn negate(&mut self) -> &mut Self {
        if !self.limbs.is_empty() {
            self.neg = !self.neg;
        }
        self
    }

    /// self * self.
    pub fn square(&self) -> Mpz {
        Mpz::from_parts(umul(&self.limbs, &self.limbs), false)
    }

    /// self ^ e.
    pub fn pow(&self, e: u32) -> Mpz {
        let mut acc = Mpz::from(1u32);
        let mut base = self.clone();
        let mut e = e;
        while e > 0 {
            if e & 1 == 1 {
                acc = &acc * &base;
            }
            base = &base * &base;
            e >>= 1;
        }
        acc
    }

    /// Truncated division: quotient toward zero, remainder with the sign
    /// of the dividend. Division by zero is an error.
    pub fn divrem(&self, d: &Mpz) -> Result<(Mpz, Mpz)> {
        if d.is_zero() {
            return Err(Error::InvalidArgument("division by zero"));
        }
        let (q, r) = udivrem(&self.limbs, &d.limbs);
        Ok((
            Mpz::from_parts(q, self.neg != d.neg),
            Mpz::from_parts(r, self.neg),
        ))
    }

    /// Floored division: quotient toward negative infinity, remainder
    /// with the sign of the divisor.
    pub fn fdivrem(&self, d: &Mpz) -> Result<(Mpz, Mpz)> {
        let (mut q, mut r) = self.divrem(d)?;
        if !r.is_zero() && (self.neg != d.neg) {
            q = &q - &Mpz::from(1u32);
            r = &r + d;
        }
        Ok((q, r))
    }

    /// Floored division by a machine word: returns the quotient and the
    /// non-negative remainder.
    pub fn fdiv_qr_ui(&self, d: u32) -> Result<(Mpz, u32)> {
        if d == 0 {
            return Err(Error::InvalidArgument("division by zero"));
        }
        let (q, r) = udivrem_u32(&self.limbs, d);
        if self.neg && r != 0 {
            // Round the magnitude quotient away from zero and flip the
            // remainder so it lands in [0, d).
            let q1 = uadd(&q, &[1]);
            Ok((Mpz::from_parts(q1, true), d - r))
        } else {
            Ok((Mpz::from_parts(q, self.neg), r))
        }
    }

    /// Left shift by `bits`.
    pub fn shl(&self, bits: usize) -> Mpz {
        Mpz::from_parts(ushl(&self.limbs, bits), self.neg)
    }

    /// Arithmetic right shift by `bits` (floor semantics for negative
    /// values).
    pub fn shr(&self, bits: usize) -> Mpz {
        if !self.neg {
            return Mpz::from_parts(ushr(&self.limbs, bits), false);
        }
        // Floor: if any dropped bit was set, round away from zero.
        let dropped_nonzero = (0..bits.min(self.bit_len())).any(|i| self.get_bit(i));
        let mut mag = ushr(&self.limbs, bits);
        if dropped_nonzero {
            mag = uadd(&mag, &[1]);
        }
        Mpz::from_parts(mag, true)
    }

    /// Multiply by 2^bits (the original's `mul_2exp`).
    pub fn mul_2exp(&self, bits: usize) -> Mpz {
        self.shl(bits)
    }

    /// Integer square root of a non-negative value.
    pub fn sqrt(&self) -> Result<Mpz> {
        if self.neg {
            return Err(Error::InvalidArgument("square root of a negative value"));
        }
        if self.is_zero() {
            return Ok(Mpz::new());
        }
        // Newton iteration from a power-of-two overestimate.
        let mut x = Mpz::new();
        x.set_bit(self.bit_len().div_ceil(2));
        loop {
            let (q, _) = self.divrem(&x)?;
            let next = (&x + &q).shr(1);
            if next.cmp_abs(&x) != Ordering::Less {
                return Ok(x);
            }
            x = next;
        }
    }
}

impl core::ops::Add for &Mpz {
    type Output = Mpz;
    fn add(self, rhs: &Mpz) -> Mpz {
        Mpz::add_signed(self, rhs)
    }
}

impl core::ops::Sub for &Mpz {
    type Output = Mpz;
    fn sub(self, rhs: &Mpz) -> Mpz {
        let mut flipped = rhs.clone();
        flipped.negate();
        Mpz::add_signed(self, &flipped)
    }
}

impl core::ops::Mul for &Mpz {
    type Output = Mpz;
    fn mul(self, rhs: &Mpz) -> Mpz {
        Mpz::from_parts(umul(&self.limbs, &rhs.limbs), self.neg != rhs.neg)
    }
}

// =============================================================================
// NUMBER THEORY
// =============================================================================

impl Mpz {
    /// Greatest common divisor of the magnitudes.
    pub fn gcd(&self, other: &Mpz) -> Mpz {
        let mut a = Mpz::from_parts(self.limbs.clone(), false);
        let mut b = Mpz::from_parts(other.limbs.clone(), false);
        while !b.is_zero() {
            let r = match a.divrem(&b) {
                Ok((_, r)) => r,
                Err(_) => unreachable!(),
            };
            a = b;
            b = r;
        }
        a
    }

    /// Extended GCD: returns (g, u, v) with u*self + v*other = g.
    pub fn gcdext(&self, other: &Mpz) -> (Mpz, Mpz, Mpz) {
        let mut r0 = self.clone();
        let mut r1 = other.clone();
        let mut s0 = Mpz::from(1u32);
        let mut s1 = Mpz::new();
        let mut t0 = Mpz::new();
        let mut t1 = Mpz::from(1u32);
        while !r1.is_zero() {
            let (q, r) = match r0.divrem(&r1) {
                Ok(x) => x,
                Err(_) => unreachable!(),
            };
            r0 = r1;
            r1 = r;
            let s = &s0 - &(&q * &s1);
            s0 = s1;
            s1 = s;
            let t = &t0 - &(&q * &t1);
            t0 = t1;
            t1 = t;
        }
        if r0.is_negative() {
            r0.negate();
            s0.negate();
            t0.negate();
        }
        (r0, s0, t0)
    }

    /// Modular inverse: Some(self^-1 mod m) when gcd(self, m) = 1.
    pub fn invert(&self, m: &Mpz) -> Option<Mpz> {
        if m.is_zero() {
            return None;
        }
        let a = self.rem_positive(m);
        let (g, u, _) = a.gcdext(m);
        if g != Mpz::from(1u32) {
            return None;
        }
        Some(u.rem_positive(m))
    }

    /// self mod m, result in [0, m).
    pub fn rem_positive(&self, m: &Mpz) -> Mpz {
        let r = match self.divrem(m) {
            Ok((_, r)) => r,
            Err(_) => return Mpz::new(),
        };
        if r.is_negative() {
            &r + &Mpz::from_parts(m.limbs.clone(), false)
        } else {
            r
        }
    }

    /// self^e mod m (e non-negative).
    pub fn pow_mod(&self, e: &Mpz, m: &Mpz) -> Result<Mpz> {
        if m.is_zero() {
            return Err(Error::InvalidArgument("zero modulus"));
        }
        let mut acc = Mpz::from(1u32).rem_positive(m);
        let base = self.rem_positive(m);
        let bits = e.bit_len();
        for i in (0..bits).rev() {
            acc = (&acc * &acc).rem_positive(m);
            if e.get_bit(i) {
                acc = (&acc * &base).rem_positive(m);
            }
        }
        Ok(acc)
    }

    /// Miller–Rabin probable-prime test with fixed small bases.
    pub fn is_prime(&self) -> bool {
        if self.neg || self.is_zero() {
            return false;
        }
        let small: [u32; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
        if self.limb_len() == 1 {
            let v = self.limb(0);
            if v < 2 {
                return false;
            }
            if small.contains(&v) {
                return true;
            }
        }
        for &p in &small {
            let (_, r) = udivrem_u32(&self.limbs, p);
            if r == 0 {
                return false;
            }
        }

        // n - 1 = d * 2^s
        let one = Mpz::from(1u32);
        let n1 = self - &one;
        let s = n1.limbs.iter().enumerate().find_map(|(i, &w)| {
            (w != 0).then(|| 32 * i + w.trailing_zeros() as usize)
        });
        let s = match s {
            Some(s) => s,
            None => return false,
        };
        let d = n1.shr(s);

        'witness: for &a in &small {
            let mut x = match Mpz::from(a).pow_mod(&d, self) {
                Ok(x) => x,
                Err(_) => return false,
            };
            if x == one || x == n1 {
                continue;
            }
            for _ in 1..s {
                x = (&x * &x).rem_positive(self);
                if x == n1 {
                    continue 'witness;
                }
            }
            return false;
        }
        true
    }
}

// =============================================================================
// I/O
// =============================================================================

impl Mpz {
    /// Parse a string in base 2, 8, 10 or 16 with an optional sign.
    pub fn from_str_radix(s: &str, base: u32) -> Result<Mpz> {
        if !matches!(base, 2 | 8 | 10 | 16) {
            return Err(Error::InvalidArgument("unsupported base"));
        }
        let (neg, digits) = match s.as_bytes() {
            [b'-', rest @ ..] => (true, rest),
            [b'+', rest @ ..] => (false, rest),
            rest => (false, rest),
        };
        if digits.is_empty() {
            return Err(Error::InvalidArgument("empty numeral"));
        }
        let mut v = Mpz::new();
        for &c in digits {
            let d = (c as char)
                .to_digit(base)
                .ok_or(Error::InvalidArgument("bad digit"))?;
            v = Mpz::from_parts(
                uadd(&umul_u32(&v.limbs, base), &[d]),
                false,
            );
        }
        v.neg = neg && !v.is_zero();
        Ok(v)
    }

    /// Render in base 2, 8, 10 or 16 (magnitude prefixed with '-' when
    /// negative).
    pub fn get_str(&self, base: u32, uppercase: bool) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let digits = if uppercase {
            b"0123456789ABCDEF"
        } else {
            b"0123456789abcdef"
        };
        let mut mag = self.limbs.clone();
        let mut out = Vec::new();
        while !mag.is_empty() {
            let (q, r) = udivrem_u32(&mag, base);
            out.push(digits[r as usize]);
            mag = q;
        }
        if self.neg {
            out.push(b'-');
        }
        out.reverse();
        String::from_utf8(out).unwrap_or_default()
    }

    /// Construct from the magnitude bytes in the given byte order.
    pub fn set_bytes(&mut self, bytes: &[u8], big_endian: bool) -> &mut Self {
        self.limbs.clear();
        self.neg = false;
        let mut push_le = |iter: &mut dyn Iterator<Item = u8>| {
            let mut word = 0u32;
            let mut sh = 0;
            for b in iter {
                word |= (b as u32) << sh;
                sh += 8;
                if sh == 32 {
                    self.limbs.push(word);
                    word = 0;
                    sh = 0;
                }
            }
            if sh != 0 {
                self.limbs.push(word);
            }
        };
        if big_endian {
            push_le(&mut bytes.iter().rev().copied());
        } else {
            push_le(&mut bytes.iter().copied());
        }
        norm(&mut self.limbs);
        self
    }

    /// Magnitude bytes, canonical (no leading zeros; empty for zero).
    pub fn get_bytes(&self, big_endian: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.limbs.len() * 4);
        for &w in &self.limbs {
            out.extend_from_slice(&w.to_le_bytes());
        }
        while out.last() == Some(&0) {
            out.pop();
        }
        if big_endian {
            out.reverse();
        }
        out
    }

    /// Accumulate big-endian digits in the given radix.
    pub fn from_radix_array(&mut self, digits: &[u32], radix: u32) -> &mut Self {
        self.limbs.clear();
        self.neg = false;
        for &d in digits {
            debug_assert!(d < radix);
            self.limbs = uadd(&umul_u32(&self.limbs, radix), &[d]);
        }
        norm(&mut self.limbs);
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn mpz(s: &str) -> Mpz {
        Mpz::from_str_radix(s, 10).unwrap()
    }

    #[test]
    fn add_sub_signs() {
        let a = mpz("123456789012345678901234567890");
        let b = mpz("-98765432109876543210");
        let s = &a + &b;
        assert_eq!(s.get_str(10, false), "123456788913580246791358024680");
        let back = &s - &b;
        assert_eq!(back, a);
        let zero = &a - &a;
        assert!(zero.is_zero());
        assert!(!zero.is_negative());
    }

    #[test]
    fn mul_div_round_trip() {
        let a = mpz("340282366920938463463374607431768211456");
        let b = mpz("18446744073709551629");
        let p = &a * &b;
        let (q, r) = p.divrem(&b).unwrap();
        assert_eq!(q, a);
        assert!(r.is_zero());

        let p1 = &p + &mpz("12345");
        let (q1, r1) = p1.divrem(&b).unwrap();
        assert_eq!(q1, a);
        assert_eq!(r1, mpz("12345"));
    }

    #[test]
    fn truncated_vs_floored_division() {
        let a = mpz("-7");
        let d = mpz("2");
        let (q, r) = a.divrem(&d).unwrap();
        assert_eq!(q, mpz("-3"));
        assert_eq!(r, mpz("-1"));
        let (fq, fr) = a.fdivrem(&d).unwrap();
        assert_eq!(fq, mpz("-4"));
        assert_eq!(fr, mpz("1"));
    }

    #[test]
    fn fdiv_qr_ui_on_negatives() {
        let a = mpz("-1234567");
        let (q, r) = a.fdiv_qr_ui(10).unwrap();
        // -1234567 = -123457 * 10 + 3
        assert_eq!(q, mpz("-123457"));
        assert_eq!(r, 3);
    }

    #[test]
    fn division_by_zero_is_error() {
        assert!(mpz("5").divrem(&Mpz::new()).is_err());
        assert!(mpz("5").fdiv_qr_ui(0).is_err());
    }

    #[test]
    fn bytes_round_trip() {
        let cases = ["0", "1", "255", "256", "123456789012345678901234567890"];
        for c in cases {
            let v = mpz(c);
            let be = v.get_bytes(true);
            let le = v.get_bytes(false);
            let mut b = Mpz::new();
            b.set_bytes(&be, true);
            assert_eq!(b, v, "{c} big-endian");
            let mut l = Mpz::new();
            l.set_bytes(&le, false);
            assert_eq!(l, v, "{c} little-endian");
        }
    }

    #[test]
    fn string_round_trip_bases() {
        for base in [2u32, 8, 10, 16] {
            let v = mpz("987654321987654321987654321");
            let s = v.get_str(base, false);
            let back = Mpz::from_str_radix(&s, base).unwrap();
            assert_eq!(back, v, "base {base}");
        }
        assert_eq!(Mpz::from_str_radix("ff", 16).unwrap(), mpz("255"));
        assert_eq!(mpz("-255").get_str(16, true), "-FF");
    }

    #[test]
    fn radix_array_matches_horner() {
        let mut v = Mpz::new();
        v.from_radix_array(&[1, 2, 3, 4], 10);
        assert_eq!(v, mpz("1234"));
        let mut w = Mpz::new();
        w.from_radix_array(&[61, 0, 59], 62);
        assert_eq!(w.to_u64(), 61 * 62 * 62 + 59);
    }

    #[test]
    fn shifts() {
        let v = mpz("12345678901234567890");
        assert_eq!(v.shl(64).shr(64), v);
        assert_eq!(mpz("-5").shr(1), mpz("-3"));
        assert_eq!(mpz("-4").shr(1), mpz("-2"));
    }

    #[test]
    fn gcd_and_bezout() {
        let a = mpz("123456789012345678901234567890");
        let b = mpz("987654321098765432109876543210");
        let g = a.gcd(&b);
        let (g2, u, v) = a.gcdext(&b);
        assert_eq!(g, g2);
        assert_eq!(&(&u * &a) + &(&v * &b), g);
    }

    #[test]
    fn modular_inverse() {
        let m = mpz("1000000007");
        let a = mpz("123456789");
        let inv = a.invert(&m).unwrap();
        assert_eq!((&a * &inv).rem_positive(&m), mpz("1"));
        // Non-coprime values have no inverse.
        assert!(mpz("6").invert(&mpz("24")).is_none());
    }

    #[test]
    fn pow_mod_small_fermat() {
        let p = mpz("1000003");
        let a = mpz("987654");
        let e = &p - &mpz("1");
        assert_eq!(a.pow_mod(&e, &p).unwrap(), mpz("1"));
    }

    #[test]
    fn primality() {
        assert!(mpz("2").is_prime());
        assert!(mpz("12289").is_prime());
        assert!(mpz("2147473409").is_prime());
        assert!(mpz("170141183460469231731687303715884105727").is_prime());
        assert!(!mpz("1").is_prime());
        assert!(!mpz("12287").is_prime());
        assert!(!mpz("340282366920938463463374607431768211455").is_prime());
    }

    #[test]
    fn integer_sqrt() {
        let v = mpz("15241578753238836750495351562536198787501905199875019052100");
        assert_eq!(v.sqrt().unwrap(), mpz("123456789012345678901234567890"));
        let w = &v + &mpz("12345");
        assert_eq!(w.sqrt().unwrap(), mpz("123456789012345678901234567890"));
    }

    #[test]
    fn bit_access() {
        let mut v = Mpz::new();
        v.set_bit(100);
        v.set_bit(3);
        assert!(v.get_bit(100));
        assert!(v.get_bit(3));
        assert!(!v.get_bit(50));
        assert_eq!(v.bit_len(), 101);
        assert_eq!(v.sizeinbase(2), 101);
    }
}
