use crate::core::charset::{Charset, PRINTABLE};
use crate::encoders::algorithms::errors::{CodecError, Result};
use crate::encoders::algorithms::radix::{DigitSink, DigitSource};
use crate::encoders::session::{Decoder, Encoder};
use crate::types::TypeModule;
use crate::value::Value;
use std::borrow::Cow;

/// Text restricted to a character set, optionally capped in length.
///
/// The length comes first, as one digit over `max + 1` or as an unbounded
/// term, followed by one digit per character.
#[derive(Debug, Clone, PartialEq)]
pub struct StringOptions {
    pub max: Option<u64>,
    pub charset: Charset,
}

impl Default for StringOptions {
    fn default() -> Self {
        Self {
            max: None,
            charset: printable(),
        }
    }
}

fn printable() -> Charset {
    // PRINTABLE is a fixed list of unique ASCII symbols
    Charset::from_symbols(PRINTABLE).unwrap_or_default()
}

impl StringOptions {
    pub fn new(max: Option<u64>, charset: Charset) -> Self {
        Self { max, charset }
    }

    fn encode_one(&self, item: &Value, enc: &mut Encoder) -> Result<()> {
        let text: Cow<'_, str> = match item {
            Value::Text(s) => Cow::Borrowed(s),
            other => Cow::Owned(enc.coerce(CodecError::type_mismatch("string", other), || {
                other.to_string()
            })?),
        };
        let mut chars: Vec<char> = text.chars().collect();

        match self.max {
            Some(max) => {
                if chars.len() as u64 > max {
                    enc.coerce(
                        CodecError::RangeOrStepViolation(format!(
                            "string of length {} exceeds max length {}",
                            chars.len(),
                            max
                        )),
                        || (),
                    )?;
                    chars.truncate(max as usize);
                }
                enc.compose(chars.len() as u64, max + 1)?;
            }
            None => enc.compose_term_u64(chars.len() as u64)?,
        }

        let size = self.charset.size();
        for (position, &ch) in chars.iter().enumerate() {
            let index = self
                .charset
                .index_of(ch)
                .ok_or(CodecError::CharsetViolation { ch, position })?;
            enc.compose(index, size)?;
        }
        Ok(())
    }

    fn decode_one(&self, dec: &mut Decoder) -> Result<String> {
        let len = match self.max {
            Some(max) => dec.parse(max + 1)?,
            None => dec.parse_term_u64()?,
        };

        let size = self.charset.size();
        let mut text = String::new();
        for _ in 0..len {
            let index = dec.parse(size)?;
            let ch = self.charset.symbol(index).ok_or_else(|| {
                CodecError::InvalidValue(format!("no character for index {}", index))
            })?;
            text.push(ch);
        }
        Ok(text)
    }
}

impl TypeModule for StringOptions {
    fn name(&self) -> &str {
        "string"
    }

    fn validate(&mut self) -> Result<()> {
        if self.max == Some(u64::MAX) {
            self.max = None;
        }
        Ok(())
    }

    fn encode(&self, items: &[Value], enc: &mut Encoder) -> Result<()> {
        items.iter().try_for_each(|item| self.encode_one(item, enc))
    }

    fn decode(&self, count: usize, dec: &mut Decoder) -> Result<Vec<Value>> {
        (0..count)
            .map(|_| self.decode_one(dec).map(Value::Text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(opts: &StringOptions, text: &str) -> String {
        let mut enc = Encoder::new(true);
        opts.encode(&[Value::from(text)], &mut enc).unwrap();
        let packed = enc.pack(&Charset::default()).unwrap();
        let mut dec = Decoder::new(&packed, Charset::default(), true);
        let out = opts.decode(1, &mut dec).unwrap();
        dec.finish().unwrap();
        out[0].as_str().unwrap().to_string()
    }

    #[test]
    fn test_default_roundtrip() {
        let opts = StringOptions::default();
        assert_eq!(roundtrip(&opts, "Hello, World!"), "Hello, World!");
        assert_eq!(roundtrip(&opts, ""), "");
    }

    #[test]
    fn test_bounded_length_roundtrip() {
        let opts = StringOptions::new(Some(8), Charset::from_symbols("abc").unwrap());
        assert_eq!(roundtrip(&opts, "abcabc"), "abcabc");
    }

    #[test]
    fn test_range_charset() {
        let opts = StringOptions::new(None, Charset::range(0x3B1, 0x3C9).unwrap());
        assert_eq!(roundtrip(&opts, "αβγω"), "αβγω");
    }

    #[test]
    fn test_charset_violation_is_fatal_in_both_modes() {
        let opts = StringOptions::new(None, Charset::from_symbols("0123456789").unwrap());
        for strict in [true, false] {
            let mut enc = Encoder::new(strict);
            let err = opts.encode(&[Value::from("é")], &mut enc).unwrap_err();
            assert_eq!(
                err,
                CodecError::CharsetViolation {
                    ch: 'é',
                    position: 0
                }
            );
        }
    }

    #[test]
    fn test_overlong_string() {
        let opts = StringOptions::new(Some(3), printable());

        let mut strict = Encoder::new(true);
        let err = opts.encode(&[Value::from("abcdef")], &mut strict).unwrap_err();
        assert!(matches!(err, CodecError::RangeOrStepViolation(_)));

        let mut lenient = Encoder::new(false);
        opts.encode(&[Value::from("abcdef")], &mut lenient).unwrap();
        let packed = lenient.pack(&Charset::default()).unwrap();
        let mut dec = Decoder::new(&packed, Charset::default(), false);
        assert_eq!(opts.decode(1, &mut dec).unwrap(), vec![Value::from("abc")]);
    }

    #[test]
    fn test_lenient_renders_non_text() {
        let opts = StringOptions::default();
        let mut enc = Encoder::new(false);
        opts.encode(&[Value::Number(12.5)], &mut enc).unwrap();
        let packed = enc.pack(&Charset::default()).unwrap();
        let mut dec = Decoder::new(&packed, Charset::default(), false);
        assert_eq!(opts.decode(1, &mut dec).unwrap(), vec![Value::from("12.5")]);
    }
}
