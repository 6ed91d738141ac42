//! Parsing and recoding of secret scalars.
//!
//! The parser recodes the scalar once and then yields a lazy MSB-first
//! symbol stream via `peek`/`pull`. Supported codings: plain binary,
//! Montgomery ladder (same bit stream), window-w precomputation symbols,
//! width-w non-adjacent form with a subtract flag, and the binary-dual
//! pairing of the scalar's MSB and LSB halves into 2-bit symbols.

use crate::error::{Error, Result};
use crate::mpz::Mpz;

/// Symbol marker: the pulled window/digit is zero.
pub const SCALAR_IS_LOW: u32 = 256;
/// Symbol value: an asserted binary bit.
pub const SCALAR_IS_HIGH: u32 = 1;
/// Flag mixed into NAF symbols whose digit is negative.
pub const SCALAR_IS_SUBTRACT: u32 = 512;

/// Scalar recoding selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarCoding {
    /// MSB-first binary.
    Binary,
    /// MSB-first binary consumed by a Montgomery ladder.
    MontLadder,
    /// Window-w precomputation symbols, w in 2..=8.
    Window(u32),
    /// Width-w non-adjacent form, w in 2..=7.
    Naf(u32),
    /// Paired MSB-half / LSB-half 2-bit symbols.
    BinaryDual,
}

/// Recoded secret scalar with a lazy symbol stream.
pub struct ScalarParser {
    recoded: Vec<u8>,
    coding: ScalarCoding,
    max: usize,
    index: isize,
    shift: u32,
}

impl ScalarParser {
    /// Recode a little-endian secret byte string.
    pub fn new(coding: ScalarCoding, secret: &[u8]) -> Result<Self> {
        match coding {
            ScalarCoding::Window(w) if !(2..=8).contains(&w) => {
                return Err(Error::InvalidArgument("window width must be 2..=8"));
            }
            ScalarCoding::Naf(w) if !(2..=7).contains(&w) => {
                return Err(Error::InvalidArgument("NAF width must be 2..=7"));
            }
            _ => {}
        }

        // Trim trailing zero bytes so the top byte is non-zero.
        let mut n = secret.len();
        while n > 0 && secret[n - 1] == 0 {
            n -= 1;
        }
        if n == 0 {
            return Ok(Self {
                recoded: Vec::new(),
                coding,
                max: 0,
                index: -1,
                shift: 0,
            });
        }
        let secret = &secret[..n];

        let mut e = Mpz::new();
        e.set_bytes(secret, false);

        let (recoded, max) = match coding {
            ScalarCoding::Naf(w) => {
                let r = naf(&e, w);
                let m = e.sizeinbase(2) + w as usize - 1;
                (r, m)
            }
            ScalarCoding::Window(w) => window(secret, w),
            ScalarCoding::BinaryDual => binary_dual(secret),
            ScalarCoding::Binary | ScalarCoding::MontLadder => {
                let top = secret[n - 1];
                let max = 8 * (n - 1) + 8 - top.leading_zeros() as usize;
                (secret.to_vec(), max)
            }
        };

        // Per-symbol codings use one byte per symbol; binary packs eight.
        let per_byte = matches!(coding, ScalarCoding::Binary | ScalarCoding::MontLadder);
        let index = if per_byte {
            ((max - 1) >> 3) as isize
        } else {
            max as isize - 1
        };
        let shift = if per_byte { ((max - 1) & 7) as u32 } else { 0 };

        let mut parser = Self {
            recoded,
            coding,
            max,
            index,
            shift,
        };

        // Skim leading zero symbols so the first pulled symbol is
        // non-zero.
        while parser.max > 0 && parser.index >= 0 && parser.peek() == SCALAR_IS_LOW {
            parser.max -= 1;
            parser.pull();
        }

        Ok(parser)
    }

    /// Number of symbols remaining in the stream.
    pub fn num_symbols(&self) -> usize {
        self.max
    }

    /// The current symbol index (window position).
    pub fn get_window(&self) -> usize {
        (self.index + 1) as usize
    }

    /// Look at the next symbol without consuming it.
    pub fn peek(&self) -> u32 {
        match self.coding {
            ScalarCoding::Binary | ScalarCoding::MontLadder => {
                let word = self.recoded[self.index as usize] as u32;
                (word >> self.shift) & 0x1
            }
            ScalarCoding::Window(_) | ScalarCoding::BinaryDual => {
                let word = self.recoded[self.index as usize] as u32;
                if word == 0 {
                    SCALAR_IS_LOW
                } else {
                    word
                }
            }
            ScalarCoding::Naf(w) => {
                let bits = self.recoded[self.index as usize] as u32;
                let sub = bits & (1 << (w - 1));
                if bits == 0 {
                    SCALAR_IS_LOW
                } else {
                    (bits & ((1 << (w - 1)) - 1)) | if sub != 0 { SCALAR_IS_SUBTRACT } else { 0 }
                }
            }
        }
    }

    /// Pull the next symbol.
    pub fn pull(&mut self) -> u32 {
        if self.max == 0 || self.index < 0 {
            return 0;
        }
        match self.coding {
            ScalarCoding::Binary | ScalarCoding::MontLadder => self.pull_binary(),
            ScalarCoding::Window(_) | ScalarCoding::BinaryDual => self.pull_symbol(),
            ScalarCoding::Naf(_) => self.pull_naf(),
        }
    }

    fn pull_binary(&mut self) -> u32 {
        let word = self.recoded[self.index as usize] as u32;
        let bit = (word >> self.shift) & 0x1;
        if self.shift == 0 {
            self.index -= 1;
        }
        self.shift = self.shift.wrapping_sub(1) & 0x7;
        if bit != 0 {
            SCALAR_IS_HIGH
        } else {
            SCALAR_IS_LOW
        }
    }

    fn pull_symbol(&mut self) -> u32 {
        let bits = self.recoded[self.index as usize] as u32;
        self.index -= 1;
        if bits == 0 {
            SCALAR_IS_LOW
        } else {
            bits
        }
    }

    fn pull_naf(&mut self) -> u32 {
        let w = match self.coding {
            ScalarCoding::Naf(w) => w,
            _ => unreachable!(),
        };
        let bits = self.recoded[self.index as usize] as u32;
        self.index -= 1;
        let sub = bits & (1 << (w - 1));
        if bits == 0 {
            SCALAR_IS_LOW
        } else {
            (bits & ((1 << (w - 1)) - 1)) | if sub != 0 { SCALAR_IS_SUBTRACT } else { 0 }
        }
    }
}

/// Pack successive groups of w bits, LSB-first, into window symbols.
fn window(secret: &[u8], w: u32) -> (Vec<u8>, usize) {
    let nbits = secret.len() * 8;
    let num_windows = nbits.div_ceil(w as usize);
    let mut recoded = vec![0u8; num_windows];

    let mut j = 0u32;
    let mut k = 0usize;
    for i in 0..nbits {
        recoded[k] += (((secret[i >> 3] >> (i & 0x7)) & 1) as u8) << j;
        j += 1;
        if j == w {
            j = 0;
            k += 1;
        }
    }

    (recoded, num_windows)
}

/// Pair the MSB half and LSB half of the scalar into 2-bit symbols: bit 0
/// of symbol i is scalar bit i, bit 1 is scalar bit (nbits - codes + i).
fn binary_dual(secret: &[u8]) -> (Vec<u8>, usize) {
    let num_codes = ((secret.len() + 1) >> 1) << 3;
    let nbits = secret.len() * 8;
    let mut recoded = vec![0u8; num_codes];

    for i in 0..nbits - num_codes {
        recoded[i] = (secret[i >> 3] >> (i & 0x7)) & 1;
    }
    for (j, i) in (nbits - num_codes..nbits).enumerate() {
        recoded[j] += ((secret[i >> 3] >> (i & 0x7)) & 1) << 1;
    }

    (recoded, num_codes)
}

/// Width-w non-adjacent form: digits in {-(2^(w-1) - 1) .. 2^(w-1) - 1}
/// with the top coded bit flagging subtraction.
fn naf(secret: &Mpz, w: u32) -> Vec<u8> {
    let max = secret.sizeinbase(2);
    let wmask = (1u32 << w) - 1;
    let wmax = wmask >> 1;

    let mut recoded = vec![0u8; max + w as usize - 1];
    let mut e = secret.clone();

    let mut code = 0usize;
    loop {
        let limb = e.limb(0) & wmask;
        let bits_high = limb & wmax;
        if bits_high != 0 {
            let sub = (limb >> (w - 1)) & 1 != 0;
            let zi = if sub { (!bits_high & wmax) + 1 } else { bits_high };
            // w=2: '11' -> -1, '01' -> +1
            // w=3: '111' -> -1, '110' -> -2, '101' -> -3,
            //      '011' -> +3, '010' -> +2, '001' -> +1
            let delta = Mpz::from(zi);
            if sub {
                e = &e + &delta;
            } else {
                e = &e - &delta;
            }
            recoded[code] = if sub { (zi | (1 << (w - 1))) as u8 } else { zi as u8 };
        }
        e = e.shr(1);
        if e.is_zero() {
            break;
        }
        code += 1;
    }

    recoded
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn to_value(secret: &[u8]) -> u128 {
        secret
            .iter()
            .enumerate()
            .fold(0u128, |acc, (i, &b)| acc | (b as u128) << (8 * i))
    }

    #[test]
    fn binary_reconstructs() {
        let secret = [0x9Du8, 0x1B, 0x00, 0xF2, 0x05];
        let mut p = ScalarParser::new(ScalarCoding::Binary, &secret).unwrap();
        let mut acc = 0u128;
        for _ in 0..p.num_symbols() {
            let bit = (p.pull() == SCALAR_IS_HIGH) as u128;
            acc = (acc << 1) | bit;
        }
        assert_eq!(acc, to_value(&secret));
    }

    #[test]
    fn binary_leading_symbol_is_high() {
        let secret = [0x01u8, 0x00, 0x10];
        let p = ScalarParser::new(ScalarCoding::Binary, &secret).unwrap();
        assert_eq!(p.num_symbols(), 21);
        assert_eq!(p.peek(), SCALAR_IS_HIGH);
    }

    #[test]
    fn window_reconstructs_for_all_widths() {
        let secret = [0x37u8, 0xA4, 0x00, 0x5C, 0xE9, 0x01];
        for w in 2..=8u32 {
            let mut p = ScalarParser::new(ScalarCoding::Window(w), &secret).unwrap();
            let mut acc = 0u128;
            for _ in 0..p.num_symbols() {
                let sym = p.pull();
                let digit = if sym == SCALAR_IS_LOW { 0 } else { sym };
                acc = (acc << w) | digit as u128;
            }
            assert_eq!(acc, to_value(&secret), "w = {w}");
        }
    }

    #[test]
    fn naf_reconstructs_for_all_widths() {
        let secret = [0xEFu8, 0xBE, 0xAD, 0xDE, 0x3D];
        for w in 2..=7u32 {
            let mut p = ScalarParser::new(ScalarCoding::Naf(w), &secret).unwrap();
            let mut acc = 0i128;
            for _ in 0..p.num_symbols() {
                acc <<= 1;
                let sym = p.pull();
                if sym != SCALAR_IS_LOW {
                    let mag = (sym & 0xFF) as i128;
                    if sym & SCALAR_IS_SUBTRACT != 0 {
                        acc -= mag;
                    } else {
                        acc += mag;
                    }
                }
            }
            assert_eq!(acc as u128, to_value(&secret), "w = {w}");
        }
    }

    #[test]
    fn naf_digits_are_odd_and_bounded() {
        let secret = [0x55u8, 0xAA, 0x0F, 0xF0];
        for w in 2..=7u32 {
            let mut p = ScalarParser::new(ScalarCoding::Naf(w), &secret).unwrap();
            for _ in 0..p.num_symbols() {
                let sym = p.pull();
                if sym != SCALAR_IS_LOW {
                    let mag = sym & 0xFF;
                    assert!(mag & 1 == 1, "w = {w}: NAF digit {mag} is even");
                    assert!(mag < (1 << (w - 1)), "w = {w}: digit {mag} out of range");
                }
            }
        }
    }

    #[test]
    fn binary_dual_recombines_halves() {
        let secret = [0x12u8, 0x34, 0x56, 0x78];
        let nbits = secret.len() * 8;
        let num_codes = ((secret.len() + 1) >> 1) << 3;
        let num_low = nbits - num_codes;

        let mut p = ScalarParser::new(ScalarCoding::BinaryDual, &secret).unwrap();
        // Collect symbols back into index order.
        let mut symbols = vec![0u32; num_codes];
        let mut idx = p.get_window();
        for _ in 0..p.num_symbols() {
            let sym = p.pull();
            idx -= 1;
            symbols[idx] = if sym == SCALAR_IS_LOW { 0 } else { sym };
        }

        let mut acc = 0u128;
        for (i, &sym) in symbols.iter().enumerate() {
            acc |= ((sym & 1) as u128) << i;
            acc |= (((sym >> 1) & 1) as u128) << (num_low + i);
        }
        assert_eq!(acc, to_value(&secret));
    }

    #[test]
    fn zero_scalar_has_no_symbols() {
        let p = ScalarParser::new(ScalarCoding::Binary, &[0u8, 0, 0]).unwrap();
        assert_eq!(p.num_symbols(), 0);
        let p = ScalarParser::new(ScalarCoding::Naf(4), &[]).unwrap();
        assert_eq!(p.num_symbols(), 0);
    }

    #[test]
    fn invalid_widths_rejected() {
        assert!(ScalarParser::new(ScalarCoding::Window(1), &[1]).is_err());
        assert!(ScalarParser::new(ScalarCoding::Window(9), &[1]).is_err());
        assert!(ScalarParser::new(ScalarCoding::Naf(8), &[1]).is_err());
    }
}
