//! Schema-driven packing of typed values into text over any alphabet.
//!
//! Values are turned into digits of whatever radix their schema allows
//! (a number in `0..=100` is one digit of radix 101, a flag one of radix 2)
//! and the resulting mixed-radix stream is repacked into symbols of the
//! chosen output [`Charset`] without rounding each value up to whole bits
//! or bytes.
//!
//! # Example
//!
//! ```
//! use radixpack::{Charset, Decoder, Encoder, NumberOptions, Options, Value};
//!
//! let percent = Options::number(NumberOptions::bounded(0.0, 100.0)).unwrap();
//! let flag = Options::boolean();
//!
//! let mut enc = Encoder::new(true);
//! enc.write_value(42, &percent).unwrap();
//! enc.write_value(true, &flag).unwrap();
//! let text = enc.pack(&Charset::default()).unwrap();
//!
//! let mut dec = Decoder::new(&text, Charset::default(), true);
//! assert_eq!(dec.read_value(&percent).unwrap(), Value::from(42));
//! assert_eq!(dec.read_value(&flag).unwrap(), Value::from(true));
//! dec.finish().unwrap();
//! ```

mod core;
mod encoders;
pub mod prelude;
pub mod types;
mod value;

pub use crate::core::charset::{BASE64, Charset, PRINTABLE};
pub use crate::core::config::{CharsetConfig, CharsetRegistry, Settings};
pub use encoders::algorithms::radix::{
    Cursor, Digit, DigitSink, DigitSource, DigitStream, Packer, Unpacker, pack, unpack,
};
pub use encoders::algorithms::term::{
    TERM_BASE, compose_term, compose_term_u64, parse_term, parse_term_u64, term_len,
};
pub use encoders::algorithms::{
    CharsetNotFoundError, CodecError, SymbolFault, errors::Result, find_closest_charset,
};
pub use encoders::session::{Decoder, Encoder};
pub use types::date::{INTERVALS, named_interval};
pub use types::fraction::{DEFAULT_PRECISION, MAX_EXPANSION_TERMS, approximate};
pub use types::number::STEP_EPSILON;
pub use types::{
    AnyOptions, BooleanOptions, DateOptions, Field, FieldNode, FractionOptions, Hook,
    ItemOptions, Kind, MAX_LIMIT, NumberOptions, ObjectBase, ObjectOptions, Options,
    StringOptions, Template, TypeModule,
};
pub use value::{Record, Value, epoch_millis, from_epoch_millis};

/// Encodes `values` with `options` and packs them into `charset` symbols.
pub fn encode(values: &[Value], options: &Options, charset: &Charset, strict: bool) -> Result<String> {
    let mut enc = Encoder::new(strict);
    enc.write(values, options)?;
    enc.pack(charset)
}

/// Decodes `count` values (or the stored count when `options` has a
/// `limit`) from `text`.
///
/// Strict decoding also requires that the values use up all of `text`.
pub fn decode(
    text: &str,
    options: &Options,
    charset: &Charset,
    count: usize,
    strict: bool,
) -> Result<Vec<Value>> {
    let mut dec = Decoder::new(text, charset.clone(), strict);
    let values = dec.read(options, count)?;
    dec.finish()?;
    Ok(values)
}
