//! Encoder and decoder sessions, the surface type modules are written against.
//!
//! A session is single-owner mutable state: the encoder grows a digit
//! stream, the decoder walks a cursor forward through packed text. Neither
//! is meant to be shared between threads without outside locking.

use crate::core::charset::Charset;
use crate::encoders::algorithms::errors::{CodecError, Result};
use crate::encoders::algorithms::radix::{
    Cursor, DigitSink, DigitSource, DigitStream, Unpacker, pack,
};
use crate::encoders::algorithms::term;
use crate::types::Options;
use crate::value::Value;
use num_bigint::BigUint;
use std::borrow::Cow;
use tracing::debug;

/// Collects digits for one or more `write` calls and packs them on demand.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    digits: DigitStream,
    strict: bool,
}

impl Encoder {
    /// Creates an encoder. Strict sessions reject values a lenient session
    /// would coerce, clamp or substitute.
    pub fn new(strict: bool) -> Self {
        Self {
            digits: DigitStream::new(),
            strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// The digits written so far.
    pub fn digits(&self) -> &DigitStream {
        &self.digits
    }

    /// Encodes a sequence of items with `options`.
    ///
    /// Either every item is encoded or, on error, the digit stream is left
    /// exactly as it was before the call.
    pub fn write(&mut self, values: &[Value], options: &Options) -> Result<()> {
        let mark = self.digits.len();
        let result = self.write_items(values, options);
        if result.is_err() {
            self.digits.truncate(mark);
        }
        result
    }

    /// Encodes a single item.
    pub fn write_value(&mut self, value: impl Into<Value>, options: &Options) -> Result<()> {
        self.write(&[value.into()], options)
    }

    fn write_items(&mut self, values: &[Value], options: &Options) -> Result<()> {
        let items: Cow<'_, [Value]> = match options.pre_proc() {
            Some(hook) => Cow::Owned(values.iter().cloned().map(|v| hook(v)).collect()),
            None => Cow::Borrowed(values),
        };

        if let Some(limit) = options.limit() {
            if items.len() as u64 > limit {
                return Err(CodecError::ItemCountExceeded {
                    count: items.len(),
                    limit,
                });
            }
            self.compose(items.len() as u64, limit + 1)?;
        }

        options.kind().module().encode(&items, self)
    }

    /// Writes an unbounded non-negative integer.
    pub fn compose_term(&mut self, value: &BigUint) -> Result<()> {
        term::compose_term(&mut self.digits, value)
    }

    /// Writes an unbounded non-negative integer that fits a `u64`.
    pub fn compose_term_u64(&mut self, value: u64) -> Result<()> {
        term::compose_term_u64(&mut self.digits, value)
    }

    /// Resolves a value the target module cannot take as-is.
    ///
    /// Strict sessions fail with `err`; lenient ones log it and use
    /// `fallback` instead.
    pub(crate) fn coerce<T>(&self, err: CodecError, fallback: impl FnOnce() -> T) -> Result<T> {
        debug_assert!(err.is_coercible());
        if self.strict {
            return Err(err);
        }
        debug!(%err, "lenient session coerced value");
        Ok(fallback())
    }

    /// Packs everything written so far into `charset` symbols.
    pub fn pack(&self, charset: &Charset) -> Result<String> {
        pack(&self.digits, charset)
    }
}

impl DigitSink for Encoder {
    fn compose(&mut self, value: u64, radix: u64) -> Result<()> {
        self.digits.push(value, radix)
    }
}

/// Reads values back out of packed text.
///
/// Decoding is forward-only: after an error the cursor is left where the
/// failure happened and the session should be dropped.
#[derive(Debug, Clone)]
pub struct Decoder {
    unpacker: Unpacker,
    strict: bool,
}

impl Decoder {
    pub fn new(text: &str, charset: Charset, strict: bool) -> Self {
        Self {
            unpacker: Unpacker::new(text, charset),
            strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Reads `count` items, or as many as the stream says when `options`
    /// carries a `limit`.
    pub fn read(&mut self, options: &Options, count: usize) -> Result<Vec<Value>> {
        let count = match options.limit() {
            Some(limit) => {
                let stored = self.parse(limit + 1)?;
                usize::try_from(stored).map_err(|_| {
                    CodecError::InvalidValue(format!("item count {} does not fit memory", stored))
                })?
            }
            None => count,
        };

        let items = options.kind().module().decode(count, self)?;
        Ok(match options.post_proc() {
            Some(hook) => items.into_iter().map(|v| hook(v)).collect(),
            None => items,
        })
    }

    /// Reads one item. With a `limit` the first stored item is returned, or
    /// `Value::Absent` when the stream holds none.
    pub fn read_value(&mut self, options: &Options) -> Result<Value> {
        Ok(self
            .read(options, 1)?
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    /// Reads an unbounded non-negative integer.
    pub fn parse_term(&mut self) -> Result<BigUint> {
        term::parse_term(&mut self.unpacker)
    }

    /// Reads an unbounded non-negative integer that must fit a `u64`.
    pub fn parse_term_u64(&mut self) -> Result<u64> {
        term::parse_term_u64(&mut self.unpacker)
    }

    pub fn cursor(&self) -> Cursor {
        self.unpacker.cursor()
    }

    /// Symbols consumed so far.
    pub fn position(&self) -> usize {
        self.unpacker.cursor().position()
    }

    /// Ends the session. Strict sessions fail when input was left unread
    /// or the last symbol holds bits no digit claimed.
    pub fn finish(self) -> Result<()> {
        let cursor = self.unpacker.cursor();
        let remaining = self.unpacker.remaining();
        debug!(
            position = cursor.position(),
            remaining, "finished decoding"
        );

        if self.strict && (remaining > 0 || cursor.has_unclaimed()) {
            return Err(CodecError::TrailingInput {
                position: cursor.position(),
            });
        }
        Ok(())
    }
}

impl DigitSource for Decoder {
    fn parse(&mut self, radix: u64) -> Result<u64> {
        self.unpacker.parse(radix)
    }
}
