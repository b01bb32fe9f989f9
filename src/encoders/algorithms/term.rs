//! Self-terminating encoding for integers without an upper bound.
//!
//! A magnitude is written least-significant first as base-[`TERM_BASE`]
//! digits shifted up by one, each in radix `TERM_BASE + 1`, followed by a
//! `0` terminator. Zero is therefore the terminator alone.

use crate::encoders::algorithms::errors::{CodecError, Result};
use crate::encoders::algorithms::radix::{DigitSink, DigitSource};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

/// Base of the magnitude digits. Small bases waste less on short numbers;
/// 3 gives the lowest expected length over typical magnitudes.
pub const TERM_BASE: u64 = 3;

const TERM_RADIX: u64 = TERM_BASE + 1;

/// Writes an arbitrary-precision magnitude.
pub fn compose_term<S: DigitSink + ?Sized>(sink: &mut S, value: &BigUint) -> Result<()> {
    let base = BigUint::from(TERM_BASE);
    let mut rest = value.clone();

    while !rest.is_zero() {
        let (quotient, remainder) = rest.div_rem(&base);
        let digit = remainder.iter_u64_digits().next().unwrap_or(0);
        sink.compose(digit + 1, TERM_RADIX)?;
        rest = quotient;
    }
    sink.compose(0, TERM_RADIX)
}

/// Writes a machine-sized magnitude.
pub fn compose_term_u64<S: DigitSink + ?Sized>(sink: &mut S, mut value: u64) -> Result<()> {
    while value != 0 {
        sink.compose(value % TERM_BASE + 1, TERM_RADIX)?;
        value /= TERM_BASE;
    }
    sink.compose(0, TERM_RADIX)
}

/// Reads a magnitude written by [`compose_term`] or [`compose_term_u64`].
pub fn parse_term<S: DigitSource + ?Sized>(source: &mut S) -> Result<BigUint> {
    let mut value = BigUint::zero();
    let mut weight = BigUint::from(1u8);

    loop {
        let digit = source.parse(TERM_RADIX)?;
        if digit == 0 {
            return Ok(value);
        }
        value += &weight * (digit - 1);
        weight *= TERM_BASE;
    }
}

/// Reads a magnitude that must fit in a `u64`.
pub fn parse_term_u64<S: DigitSource + ?Sized>(source: &mut S) -> Result<u64> {
    let value = parse_term(source)?;
    value
        .to_u64()
        .ok_or_else(|| CodecError::InvalidValue(format!("term {} exceeds 64 bits", value)))
}

/// Number of digits [`compose_term`] emits for `value`, terminator included.
pub fn term_len(value: &BigUint) -> usize {
    if value.is_zero() {
        return 1;
    }
    let base = BigUint::from(TERM_BASE);
    let mut rest = value.clone();
    let mut len = 1;
    while !rest.is_zero() {
        rest /= &base;
        len += 1;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::charset::Charset;
    use crate::encoders::algorithms::radix::{DigitStream, Unpacker, pack};

    fn roundtrip(value: &BigUint) -> BigUint {
        let mut stream = DigitStream::new();
        compose_term(&mut stream, value).unwrap();
        let cs = Charset::default();
        let text = pack(&stream, &cs).unwrap();
        parse_term(&mut Unpacker::new(&text, cs)).unwrap()
    }

    #[test]
    fn test_zero_is_terminator_only() {
        let mut stream = DigitStream::new();
        compose_term_u64(&mut stream, 0).unwrap();
        let digits: Vec<_> = stream.iter().map(|d| (d.value(), d.radix())).collect();
        assert_eq!(digits, vec![(0, 4)]);
    }

    #[test]
    fn test_digits_are_shifted_base_three() {
        // 5 = 2 + 1*3
        let mut stream = DigitStream::new();
        compose_term_u64(&mut stream, 5).unwrap();
        let values: Vec<_> = stream.iter().map(|d| d.value()).collect();
        assert_eq!(values, vec![3, 2, 0]);
    }

    #[test]
    fn test_bigint_and_u64_paths_agree() {
        for n in [0u64, 1, 2, 3, 26, 27, 1_000_000, u64::MAX] {
            let mut a = DigitStream::new();
            let mut b = DigitStream::new();
            compose_term_u64(&mut a, n).unwrap();
            compose_term(&mut b, &BigUint::from(n)).unwrap();
            assert_eq!(a, b, "n = {n}");
        }
    }

    #[test]
    fn test_roundtrip_beyond_u64() {
        let big = BigUint::from(u64::MAX) * BigUint::from(u64::MAX) + 7u32;
        assert_eq!(roundtrip(&big), big);
    }

    #[test]
    fn test_parse_term_u64_overflow() {
        let mut stream = DigitStream::new();
        compose_term(&mut stream, &(BigUint::from(u64::MAX) + 1u32)).unwrap();
        let cs = Charset::default();
        let text = pack(&stream, &cs).unwrap();
        let err = parse_term_u64(&mut Unpacker::new(&text, cs)).unwrap_err();
        assert!(matches!(err, CodecError::InvalidValue(_)));
    }

    #[test]
    fn test_term_len_matches_stream() {
        for n in [0u64, 1, 8, 9, 80, 81, 12_345] {
            let mut stream = DigitStream::new();
            compose_term_u64(&mut stream, n).unwrap();
            assert_eq!(term_len(&BigUint::from(n)), stream.len());
        }
    }
}
