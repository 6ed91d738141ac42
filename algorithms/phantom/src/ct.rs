//! Conditional primitives in two flavours.
//!
//! With the `const-time` feature (the default) every operation is realized
//! with masked arithmetic and `subtle` selection: no branch and no memory
//! index depends on a secret input. With the feature disabled the same
//! operations compile to direct branches, for differential testing only.

#[cfg(feature = "const-time")]
use subtle::{ConditionallySelectable, ConstantTimeGreater};

/// Word types usable with the conditional primitives.
pub trait CtWord:
    Copy
    + Eq
    + core::ops::BitXor<Output = Self>
    + core::ops::BitOr<Output = Self>
    + core::ops::Shr<u32, Output = Self>
{
    /// Zero value.
    const ZERO: Self;
    /// One value.
    const ONE: Self;
    /// Bit width.
    const BITS: u32;

    /// Wrapping negation.
    fn wrapping_neg(self) -> Self;
    /// Select `a` when `c` is 1, `b` when `c` is 0; `c` must be 0 or 1.
    fn ct_select(c: Self, a: Self, b: Self) -> Self;
    /// 1 when `a < b`, 0 otherwise, without branching on the values.
    fn ct_lessthan(a: Self, b: Self) -> Self;
}

macro_rules! impl_ct_word {
    ($($t:ty),*) => {$(
        impl CtWord for $t {
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const BITS: u32 = <$t>::BITS;

            #[inline]
            fn wrapping_neg(self) -> Self {
                <$t>::wrapping_neg(self)
            }

            #[cfg(feature = "const-time")]
            #[inline]
            fn ct_select(c: Self, a: Self, b: Self) -> Self {
                <$t>::conditional_select(&b, &a, subtle::Choice::from(c as u8))
            }

            #[cfg(not(feature = "const-time"))]
            #[inline]
            fn ct_select(c: Self, a: Self, b: Self) -> Self {
                if c == 1 { a } else { b }
            }

            #[cfg(feature = "const-time")]
            #[inline]
            fn ct_lessthan(a: Self, b: Self) -> Self {
                b.ct_gt(&a).unwrap_u8() as $t
            }

            #[cfg(not(feature = "const-time"))]
            #[inline]
            fn ct_lessthan(a: Self, b: Self) -> Self {
                if a < b { 1 } else { 0 }
            }
        }
    )*};
}

impl_ct_word!(u8, u16, u32, u64);

/// Returns 1 if `a` is less than `b`, 0 otherwise.
#[inline]
pub fn cmp_lessthan<T: CtWord>(a: T, b: T) -> T {
    T::ct_lessthan(a, b)
}

/// Compare two arrays: 0 if equal, 1 otherwise.
pub fn cmp_array_not_equal<T: CtWord>(a: &[T], b: &[T]) -> T {
    debug_assert_eq!(a.len(), b.len());
    let mut acc = T::ZERO;
    for (&x, &y) in a.iter().zip(b.iter()) {
        acc = acc | (x ^ y);
    }
    // Fold the accumulated difference to a single 0/1 word.
    cmp_lessthan(T::ZERO, acc)
}

/// Return `a` if `c` is 1, 0 if `c` is 0.
#[inline]
pub fn if_true<T: CtWord>(c: T, a: T) -> T {
    T::ct_select(c, a, T::ZERO)
}

/// Return `a` if `c` is 0, 0 if `c` is 1.
#[inline]
pub fn if_false<T: CtWord>(c: T, a: T) -> T {
    T::ct_select(c, T::ZERO, a)
}

/// Return `a` if `c` is negative when read as a signed word, 0 otherwise.
#[inline]
pub fn if_negative<T: CtWord>(c: T, a: T) -> T {
    if_true(c >> (T::BITS - 1), a)
}

/// Return `a` if `x >= y`, 0 otherwise.
#[inline]
pub fn if_gte<T: CtWord>(x: T, y: T, a: T) -> T {
    if_false(cmp_lessthan(x, y), a)
}

/// Return `a` if `x <= y`, 0 otherwise.
#[inline]
pub fn if_lte<T: CtWord>(x: T, y: T, a: T) -> T {
    if_false(cmp_lessthan(y, x), a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lessthan_boundaries() {
        assert_eq!(cmp_lessthan(0u32, 1u32), 1);
        assert_eq!(cmp_lessthan(1u32, 0u32), 0);
        assert_eq!(cmp_lessthan(5u32, 5u32), 0);
        assert_eq!(cmp_lessthan(u64::MAX - 1, u64::MAX), 1);
        assert_eq!(cmp_lessthan(0u8, u8::MAX), 1);
    }

    #[test]
    fn array_compare() {
        assert_eq!(cmp_array_not_equal(&[1u32, 2, 3], &[1, 2, 3]), 0);
        assert_eq!(cmp_array_not_equal(&[1u32, 2, 3], &[1, 2, 4]), 1);
        assert_eq!(cmp_array_not_equal::<u32>(&[], &[]), 0);
    }

    #[test]
    fn conditional_selects() {
        assert_eq!(if_true(1u32, 77), 77);
        assert_eq!(if_true(0u32, 77), 0);
        assert_eq!(if_false(1u32, 77), 0);
        assert_eq!(if_false(0u32, 77), 77);
    }

    #[test]
    fn signed_and_range_conditions() {
        assert_eq!(if_negative(0x8000_0000u32, 9), 9);
        assert_eq!(if_negative(0x7FFF_FFFFu32, 9), 0);
        assert_eq!(if_gte(4u32, 4, 5), 5);
        assert_eq!(if_gte(3u32, 4, 5), 0);
        assert_eq!(if_lte(4u32, 4, 5), 5);
        assert_eq!(if_lte(5u32, 4, 5), 0);
    }
}
