//! Total functions over 256-bit words. Arithmetic wraps modulo 2^256 and signed variants treat
//! words as two's complement.

use alloy::primitives::{Address, B256, U256};
use cinder_common::utils::strings::sign_uint;

/// Converts a boolean into `1` or `0`.
#[inline]
pub fn from_bool(condition: bool) -> U256 {
    if condition {
        U256::from(1u8)
    } else {
        U256::ZERO
    }
}

/// Left-pads an address into a word.
#[inline]
pub fn from_address(address: Address) -> U256 {
    U256::from_be_slice(address.as_slice())
}

/// Takes the low 20 bytes of a word as an address.
#[inline]
pub fn to_address(value: U256) -> Address {
    Address::from_word(B256::from(value.to_be_bytes::<32>()))
}

/// Converts a word to a `usize`, saturating at `usize::MAX`.
#[inline]
pub fn as_usize_saturated(value: U256) -> usize {
    value.saturating_to::<usize>()
}

/// Converts a word to a `u64`, saturating at `u64::MAX`.
#[inline]
pub fn as_u64_saturated(value: U256) -> u64 {
    value.saturating_to::<u64>()
}

#[inline]
fn is_negative(value: U256) -> bool {
    value.bit(255)
}

#[inline]
fn magnitude(value: U256) -> U256 {
    if is_negative(value) {
        value.wrapping_neg()
    } else {
        value
    }
}

/// ADD
pub fn add(a: U256, b: U256) -> U256 {
    a.wrapping_add(b)
}

/// SUB
pub fn sub(a: U256, b: U256) -> U256 {
    a.wrapping_sub(b)
}

/// MUL
pub fn mul(a: U256, b: U256) -> U256 {
    a.wrapping_mul(b)
}

/// DIV, where division by zero is zero.
pub fn div(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::ZERO
    } else {
        a / b
    }
}

/// SDIV. The quotient truncates toward zero, so `sdiv(MIN, -1)` wraps to `MIN`.
///
/// ```
/// use alloy::primitives::U256;
/// use cinder_vm::core::word::sdiv;
///
/// let min = U256::from(1u8) << 255;
/// assert_eq!(sdiv(min, U256::MAX), min);
/// ```
pub fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::ZERO;
    }

    let quotient = magnitude(a) / magnitude(b);
    if is_negative(a) != is_negative(b) {
        quotient.wrapping_neg()
    } else {
        quotient
    }
}

/// MOD, where modulo zero is zero.
pub fn rem(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::ZERO
    } else {
        a % b
    }
}

/// SMOD. The result takes the sign of the dividend.
pub fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::ZERO;
    }

    let remainder = magnitude(a) % magnitude(b);
    if is_negative(a) {
        remainder.wrapping_neg()
    } else {
        remainder
    }
}

/// ADDMOD, computed without truncating the intermediate sum.
pub fn addmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        U256::ZERO
    } else {
        a.add_mod(b, n)
    }
}

/// MULMOD, computed without truncating the intermediate product.
pub fn mulmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        U256::ZERO
    } else {
        a.mul_mod(b, n)
    }
}

/// EXP, modulo 2^256.
pub fn exp(base: U256, exponent: U256) -> U256 {
    base.wrapping_pow(exponent)
}

/// The number of significant bytes in an exponent, which prices `EXP`.
///
/// ```
/// use alloy::primitives::U256;
/// use cinder_vm::core::word::exp_byte_len;
///
/// assert_eq!(exp_byte_len(U256::ZERO), 0);
/// assert_eq!(exp_byte_len(U256::from(255)), 1);
/// assert_eq!(exp_byte_len(U256::from(256)), 2);
/// ```
pub fn exp_byte_len(exponent: U256) -> u64 {
    exponent.bit_len().div_ceil(8) as u64
}

/// SIGNEXTEND: extends the sign bit of the low `b + 1` bytes of `x`.
pub fn signextend(b: U256, x: U256) -> U256 {
    if b >= U256::from(31) {
        return x;
    }

    let sign_bit = as_usize_saturated(b) * 8 + 7;
    let mask = (U256::from(1u8) << (sign_bit + 1)) - U256::from(1u8);
    if x.bit(sign_bit) {
        x | !mask
    } else {
        x & mask
    }
}

/// LT
pub fn lt(a: U256, b: U256) -> U256 {
    from_bool(a < b)
}

/// GT
pub fn gt(a: U256, b: U256) -> U256 {
    from_bool(a > b)
}

/// SLT
pub fn slt(a: U256, b: U256) -> U256 {
    from_bool(sign_uint(a) < sign_uint(b))
}

/// SGT
pub fn sgt(a: U256, b: U256) -> U256 {
    from_bool(sign_uint(a) > sign_uint(b))
}

/// EQ
pub fn eq(a: U256, b: U256) -> U256 {
    from_bool(a == b)
}

/// ISZERO
pub fn iszero(a: U256) -> U256 {
    from_bool(a.is_zero())
}

/// AND
pub fn and(a: U256, b: U256) -> U256 {
    a & b
}

/// OR
pub fn or(a: U256, b: U256) -> U256 {
    a | b
}

/// XOR
pub fn xor(a: U256, b: U256) -> U256 {
    a ^ b
}

/// NOT
pub fn not(a: U256) -> U256 {
    !a
}

/// BYTE: the `i`-th most significant byte of `x`, or zero when `i >= 32`.
pub fn byte(i: U256, x: U256) -> U256 {
    if i >= U256::from(32) {
        return U256::ZERO;
    }
    U256::from(x.byte(31 - as_usize_saturated(i)))
}

/// SHL
pub fn shl(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::ZERO
    } else {
        value << as_usize_saturated(shift)
    }
}

/// SHR
pub fn shr(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::ZERO
    } else {
        value >> as_usize_saturated(shift)
    }
}

/// SAR: arithmetic right shift, filling with the sign bit.
pub fn sar(shift: U256, value: U256) -> U256 {
    let negative = is_negative(value);
    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::ZERO };
    }

    let shift = as_usize_saturated(shift);
    if negative {
        !((!value) >> shift)
    } else {
        value >> shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn min() -> U256 {
        U256::from(1u8) << 255
    }

    fn neg(value: u64) -> U256 {
        U256::from(value).wrapping_neg()
    }

    #[test]
    fn test_add_wraps() {
        assert_eq!(add(U256::MAX, U256::from(1)), U256::ZERO);
        assert_eq!(sub(U256::ZERO, U256::from(1)), U256::MAX);
        assert_eq!(mul(U256::MAX, U256::from(2)), U256::MAX - U256::from(1));
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        assert_eq!(div(U256::from(10), U256::ZERO), U256::ZERO);
        assert_eq!(rem(U256::from(10), U256::ZERO), U256::ZERO);
        assert_eq!(sdiv(U256::from(10), U256::ZERO), U256::ZERO);
        assert_eq!(smod(U256::from(10), U256::ZERO), U256::ZERO);
        assert_eq!(addmod(U256::from(1), U256::from(2), U256::ZERO), U256::ZERO);
        assert_eq!(mulmod(U256::from(1), U256::from(2), U256::ZERO), U256::ZERO);
    }

    #[test]
    fn test_signed_division() {
        assert_eq!(sdiv(min(), U256::MAX), min());
        assert_eq!(sdiv(neg(10), U256::from(3)), neg(3));
        assert_eq!(sdiv(neg(10), neg(3)), U256::from(3));
        assert_eq!(sdiv(U256::from(10), neg(3)), neg(3));
    }

    #[test]
    fn test_signed_modulo_follows_dividend() {
        assert_eq!(smod(neg(10), U256::from(3)), neg(1));
        assert_eq!(smod(U256::from(10), neg(3)), U256::from(1));
        assert_eq!(smod(neg(8), neg(3)), neg(2));
    }

    #[test]
    fn test_modular_arithmetic_uses_full_width() {
        // (MAX + MAX) overflows 256 bits before the reduction
        assert_eq!(addmod(U256::MAX, U256::MAX, U256::from(7)), U256::from(2));
        assert_eq!(mulmod(U256::MAX, U256::MAX, U256::from(12)), U256::from(9));
    }

    #[test]
    fn test_exp() {
        assert_eq!(exp(U256::from(2), U256::from(10)), U256::from(1024));
        assert_eq!(exp(U256::from(2), U256::from(256)), U256::ZERO);
        assert_eq!(exp(U256::ZERO, U256::ZERO), U256::from(1));
        assert_eq!(exp_byte_len(U256::MAX), 32);
    }

    #[test]
    fn test_signextend() {
        assert_eq!(signextend(U256::ZERO, U256::from(0xff)), U256::MAX);
        assert_eq!(signextend(U256::ZERO, U256::from(0x7f)), U256::from(0x7f));
        assert_eq!(signextend(U256::from(1), U256::from(0x1_80ff)), U256::from(0x80ff) | !U256::from(0xffff));
        assert_eq!(signextend(U256::from(31), U256::from(0xff)), U256::from(0xff));
        assert_eq!(signextend(U256::MAX, U256::from(0xff)), U256::from(0xff));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(lt(U256::from(1), U256::from(2)), U256::from(1));
        assert_eq!(gt(U256::from(1), U256::from(2)), U256::ZERO);
        assert_eq!(slt(U256::MAX, U256::ZERO), U256::from(1));
        assert_eq!(sgt(U256::MAX, U256::ZERO), U256::ZERO);
        assert_eq!(eq(U256::MAX, U256::MAX), U256::from(1));
        assert_eq!(iszero(U256::ZERO), U256::from(1));
    }

    #[test]
    fn test_byte() {
        let value = U256::from(0x1122u64);
        assert_eq!(byte(U256::from(31), value), U256::from(0x22));
        assert_eq!(byte(U256::from(30), value), U256::from(0x11));
        assert_eq!(byte(U256::ZERO, U256::MAX), U256::from(0xff));
        assert_eq!(byte(U256::from(32), U256::MAX), U256::ZERO);
    }

    #[test]
    fn test_shifts() {
        assert_eq!(shl(U256::from(4), U256::from(1)), U256::from(16));
        assert_eq!(shl(U256::from(256), U256::from(1)), U256::ZERO);
        assert_eq!(shr(U256::from(4), U256::from(16)), U256::from(1));
        assert_eq!(shr(U256::MAX, U256::MAX), U256::ZERO);
        assert_eq!(sar(U256::from(4), neg(16)), neg(1));
        assert_eq!(sar(U256::from(1), U256::from(16)), U256::from(8));
        assert_eq!(sar(U256::from(300), neg(1)), U256::MAX);
        assert_eq!(sar(U256::from(300), U256::from(1)), U256::ZERO);
    }

    #[test]
    fn test_address_conversion() {
        let address = Address::repeat_byte(0xaa);
        let word = from_address(address);
        assert_eq!(word >> 160, U256::ZERO);
        assert_eq!(to_address(word | (U256::MAX << 160)), address);
    }
}
