//! Mixed-radix digit packing.
//!
//! Type modules describe every value as a sequence of digits, each with its
//! own radix. The packer folds those digits into symbols of a fixed-size
//! charset without first building one big integer: digits are multiplied
//! into the symbol being assembled while they fit, and a digit that does not
//! fit into the capacity left in the current symbol is split into a coarse
//! part (finishing the current symbol) and a fine part (starting the next).
//!
//! The unpacker replays the same arithmetic in reverse. It has to be asked
//! for exactly the radices that were packed, in the same order, which is
//! what the type modules guarantee by mirroring their encode paths.

use crate::core::charset::Charset;
use crate::encoders::algorithms::errors::{CodecError, Result, SymbolFault};
use num_integer::Integer;
use tracing::trace;

/// A single `(value, radix)` unit with `value < radix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digit {
    value: u64,
    radix: u64,
}

impl Digit {
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn radix(&self) -> u64 {
        self.radix
    }
}

/// Anything digits can be appended to.
pub trait DigitSink {
    /// Appends `value` in base `radix`.
    fn compose(&mut self, value: u64, radix: u64) -> Result<()>;
}

/// Anything digits can be read back from.
pub trait DigitSource {
    /// Reads the next digit, which must have been packed with `radix`.
    fn parse(&mut self, radix: u64) -> Result<u64>;
}

fn check_digit(value: u64, radix: u64) -> Result<()> {
    if radix == 0 {
        return Err(CodecError::InvalidOptions("digit radix must be at least 1".into()));
    }
    if value >= radix {
        return Err(CodecError::InvalidOptions(format!(
            "digit {} does not fit radix {}",
            value, radix
        )));
    }
    Ok(())
}

/// Append-only sequence of digits awaiting packing.
///
/// Radix-1 digits hold no information and are dropped on push; the
/// unpacker answers them with `0` without touching its input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigitStream {
    digits: Vec<Digit>,
}

impl DigitStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a digit, rejecting radix 0 and out-of-range values.
    pub fn push(&mut self, value: u64, radix: u64) -> Result<()> {
        check_digit(value, radix)?;
        if radix > 1 {
            self.digits.push(Digit { value, radix });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Digit> {
        self.digits.iter()
    }

    /// Radices in push order, the request sequence an unpacker needs.
    pub fn radices(&self) -> Vec<u64> {
        self.digits.iter().map(Digit::radix).collect()
    }

    /// Drops everything pushed after the first `len` digits.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.digits.truncate(len);
    }
}

impl DigitSink for DigitStream {
    fn compose(&mut self, value: u64, radix: u64) -> Result<()> {
        self.push(value, radix)
    }
}

impl<'a> IntoIterator for &'a DigitStream {
    type Item = &'a Digit;
    type IntoIter = std::slice::Iter<'a, Digit>;

    fn into_iter(self) -> Self::IntoIter {
        self.digits.iter()
    }
}

/// Online packer folding digits into charset symbols.
///
/// `current` is the value of the symbol under construction and `committed`
/// the product of the radices already folded into it, so
/// `current < committed <= size` holds between calls.
pub struct Packer<'a> {
    charset: &'a Charset,
    size: u64,
    current: u64,
    committed: u64,
    out: String,
}

impl<'a> Packer<'a> {
    pub fn new(charset: &'a Charset) -> Self {
        Self {
            charset,
            size: charset.size(),
            current: 0,
            committed: 1,
            out: String::new(),
        }
    }

    /// Folds one digit into the output, splitting it across a symbol
    /// boundary when it does not fit the capacity left.
    pub fn push(&mut self, value: u64, radix: u64) -> Result<()> {
        check_digit(value, radix)?;

        let (mut value, mut radix) = (value, radix);
        while radix > 1 {
            let mut room = self.size / self.committed;
            if room < 2 {
                self.flush()?;
                room = self.size;
            }

            if room >= radix {
                self.current += self.committed * value;
                self.committed *= radix;
                return Ok(());
            }

            let factor = radix.div_ceil(room);
            let (coarse, fine) = value.div_rem(&factor);
            trace!(radix, room, factor, "splitting digit across symbol boundary");

            self.current += self.committed * coarse;
            self.committed *= room;
            value = fine;
            radix = factor;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let symbol = self.charset.symbol(self.current).ok_or_else(|| {
            CodecError::InvalidAlphabet(format!("no symbol for value {}", self.current))
        })?;
        self.out.push(symbol);
        self.current = 0;
        self.committed = 1;
        Ok(())
    }

    /// Emits the last, possibly partial, symbol and returns the text.
    pub fn finish(mut self) -> Result<String> {
        if self.committed > 1 {
            self.flush()?;
        }
        Ok(self.out)
    }
}

/// Read position of an [`Unpacker`].
///
/// `position` counts symbols loaded so far; `current` and `committed` mirror
/// the packer's state for the symbol being taken apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    position: usize,
    current: u64,
    committed: u64,
    loaded: bool,
}

impl Cursor {
    /// Number of symbols consumed from the input.
    pub fn position(&self) -> usize {
        self.position
    }

    /// True when the loaded symbol still holds bits no digit claimed.
    pub fn has_unclaimed(&self) -> bool {
        self.loaded && self.current != 0
    }
}

/// Forward-only reader recovering digits from packed text.
#[derive(Debug, Clone)]
pub struct Unpacker {
    symbols: Vec<char>,
    charset: Charset,
    size: u64,
    cursor: Cursor,
}

impl Unpacker {
    pub fn new(text: &str, charset: Charset) -> Self {
        Self {
            symbols: text.chars().collect(),
            size: charset.size(),
            charset,
            cursor: Cursor::default(),
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Symbols not yet loaded.
    pub fn remaining(&self) -> usize {
        self.symbols.len() - self.cursor.position
    }

    /// Capacity left in the loaded symbol, loading the next one when the
    /// current symbol is spent.
    fn room(&mut self) -> Result<u64> {
        if self.cursor.loaded {
            let room = self.size / self.cursor.committed;
            if room > 1 {
                return Ok(room);
            }
            if self.cursor.current != 0 {
                return Err(CodecError::DecodeSymbol {
                    position: self.cursor.position - 1,
                    fault: SymbolFault::Oversaturated,
                });
            }
        }

        let position = self.cursor.position;
        let symbol = *self
            .symbols
            .get(position)
            .ok_or(CodecError::UnexpectedEndOfInput { position })?;
        let value = self
            .charset
            .lookup(symbol)
            .map_err(|fault| CodecError::DecodeSymbol { position, fault })?;

        self.cursor = Cursor {
            position: position + 1,
            current: value,
            committed: 1,
            loaded: true,
        };
        Ok(self.size)
    }

    fn next_digit(&mut self, radix: u64) -> Result<u64> {
        let room = self.room()?;

        if room >= radix {
            let (rest, value) = self.cursor.current.div_rem(&radix);
            self.cursor.current = rest;
            self.cursor.committed *= radix;
            return Ok(value);
        }

        let factor = radix.div_ceil(room);
        let coarse = self.cursor.current;
        let position = self.cursor.position - 1;
        self.cursor.current = coarse / room;
        self.cursor.committed *= room;

        let fine = self.next_digit(factor)?;
        coarse
            .checked_mul(factor)
            .and_then(|v| v.checked_add(fine))
            .filter(|v| *v < radix)
            .ok_or(CodecError::DecodeSymbol {
                position,
                fault: SymbolFault::Oversaturated,
            })
    }
}

impl DigitSource for Unpacker {
    fn parse(&mut self, radix: u64) -> Result<u64> {
        match radix {
            0 => Err(CodecError::InvalidOptions("digit radix must be at least 1".into())),
            1 => Ok(0),
            _ => self.next_digit(radix),
        }
    }
}

/// Packs a whole digit stream into text.
pub fn pack(stream: &DigitStream, charset: &Charset) -> Result<String> {
    let mut packer = Packer::new(charset);
    for digit in stream {
        packer.push(digit.value, digit.radix)?;
    }
    let text = packer.finish()?;
    tracing::debug!(
        digits = stream.len(),
        symbols = text.chars().count(),
        "packed digit stream"
    );
    Ok(text)
}

/// Recovers digit values from `text`, one per requested radix.
pub fn unpack<I>(text: &str, charset: &Charset, radices: I) -> Result<Vec<u64>>
where
    I: IntoIterator<Item = u64>,
{
    let mut unpacker = Unpacker::new(text, charset.clone());
    radices
        .into_iter()
        .map(|radix| unpacker.parse(radix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits() -> Charset {
        Charset::from_symbols("0123456789").unwrap()
    }

    fn stream(pairs: &[(u64, u64)]) -> DigitStream {
        let mut s = DigitStream::new();
        for &(v, r) in pairs {
            s.push(v, r).unwrap();
        }
        s
    }

    #[test]
    fn test_small_digits_share_a_symbol() {
        // 3 + 4*1 = 7 fills radix 8 of the first symbol; 5 starts the next
        let s = stream(&[(3, 4), (1, 2), (5, 7)]);
        assert_eq!(pack(&s, &digits()).unwrap(), "75");
        assert_eq!(
            unpack("75", &digits(), s.radices()).unwrap(),
            vec![3, 1, 5]
        );
    }

    #[test]
    fn test_digit_split_across_symbols() {
        // 17 in radix 20 with room 3 left: factor 7, coarse 2, fine 3
        let s = stream(&[(2, 3), (17, 20), (3, 7)]);
        let text = pack(&s, &digits()).unwrap();
        assert_eq!(text, "833");
        assert_eq!(unpack(&text, &digits(), s.radices()).unwrap(), vec![2, 17, 3]);
    }

    #[test]
    fn test_radix_larger_than_charset() {
        let s = stream(&[(987_654_321, 1_000_000_007), (1, 2)]);
        let cs = Charset::from_symbols("ab").unwrap();
        let text = pack(&s, &cs).unwrap();
        assert_eq!(
            unpack(&text, &cs, s.radices()).unwrap(),
            vec![987_654_321, 1]
        );
    }

    #[test]
    fn test_full_u64_radix() {
        let s = stream(&[(u64::MAX - 1, u64::MAX), (0, u64::MAX), (12, 13)]);
        let cs = Charset::default();
        let text = pack(&s, &cs).unwrap();
        assert_eq!(
            unpack(&text, &cs, s.radices()).unwrap(),
            vec![u64::MAX - 1, 0, 12]
        );
    }

    #[test]
    fn test_empty_stream_packs_to_empty_text() {
        assert_eq!(pack(&DigitStream::new(), &digits()).unwrap(), "");
    }

    #[test]
    fn test_radix_one_is_free() {
        let mut s = DigitStream::new();
        s.push(0, 1).unwrap();
        assert!(s.is_empty());

        let mut u = Unpacker::new("", digits());
        assert_eq!(u.parse(1).unwrap(), 0);
        assert_eq!(u.cursor().position(), 0);
    }

    #[test]
    fn test_push_rejects_bad_digits() {
        let mut s = DigitStream::new();
        assert!(s.push(0, 0).is_err());
        assert!(s.push(5, 5).is_err());
        assert!(s.is_empty());
    }

    #[test]
    fn test_unexpected_end_of_input() {
        let err = unpack("7", &digits(), [4, 2, 7]).unwrap_err();
        assert_eq!(err, CodecError::UnexpectedEndOfInput { position: 1 });
    }

    #[test]
    fn test_symbol_not_in_charset() {
        let err = unpack("x", &digits(), [4]).unwrap_err();
        assert_eq!(
            err,
            CodecError::DecodeSymbol {
                position: 0,
                fault: SymbolFault::NotInCharset('x'),
            }
        );
    }

    #[test]
    fn test_oversaturated_symbol() {
        // three radix-2 digits claim 8 of '9', leaving 1 behind
        let err = unpack("90", &digits(), [2, 2, 2, 2]).unwrap_err();
        assert_eq!(
            err,
            CodecError::DecodeSymbol {
                position: 0,
                fault: SymbolFault::Oversaturated,
            }
        );
    }

    #[test]
    fn test_range_charset_roundtrip() {
        let cs = Charset::range(0x2800, 0x28FF).unwrap();
        let s = stream(&[(200, 256), (99, 100), (1, 3), (65_000, 65_536)]);
        let text = pack(&s, &cs).unwrap();
        assert!(text.chars().all(|c| ('\u{2800}'..='\u{28FF}').contains(&c)));
        assert_eq!(
            unpack(&text, &cs, s.radices()).unwrap(),
            vec![200, 99, 1, 65_000]
        );
    }

    #[test]
    fn test_every_small_charset_and_radix() {
        for size in 2..=12u32 {
            let cs = Charset::binary(size).unwrap();
            for radix in 2..=40u64 {
                let pairs: Vec<(u64, u64)> = (0..radix).map(|v| (v, radix)).collect();
                let s = stream(&pairs);
                let text = pack(&s, &cs).unwrap();
                let back = unpack(&text, &cs, s.radices()).unwrap();
                assert_eq!(back, (0..radix).collect::<Vec<_>>(), "size {size} radix {radix}");
            }
        }
    }
}
