use crate::encoders::algorithms::errors::{CodecError, Result};
use crate::encoders::algorithms::radix::{DigitSink, DigitSource};
use crate::encoders::session::{Decoder, Encoder};
use crate::types::{
    BooleanOptions, DateOptions, FractionOptions, ObjectOptions, StringOptions, TypeModule,
    decode_single,
};
use crate::value::Value;

/// Number of variant tags.
const TAG_RADIX: u64 = 6;

/// Values of any shape: a variant tag, then the payload through the
/// module matching that variant with default settings.
///
/// | tag | variant | module |
/// |-----|---------|--------|
/// | 0 | absent | none |
/// | 1 | number | fraction |
/// | 2 | text | string |
/// | 3 | flag | boolean |
/// | 4 | moment | date |
/// | 5 | record | self-describing object |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnyOptions;

impl TypeModule for AnyOptions {
    fn name(&self) -> &str {
        "any"
    }

    fn validate(&mut self) -> Result<()> {
        Ok(())
    }

    fn encode(&self, items: &[Value], enc: &mut Encoder) -> Result<()> {
        for item in items {
            enc.compose(item.tag(), TAG_RADIX)?;
            let payload = std::slice::from_ref(item);
            match item {
                Value::Absent => {}
                Value::Number(_) => FractionOptions::default().encode(payload, enc)?,
                Value::Text(_) => StringOptions::default().encode(payload, enc)?,
                Value::Flag(_) => BooleanOptions.encode(payload, enc)?,
                Value::Moment(_) => DateOptions::default().encode(payload, enc)?,
                Value::Record(_) => ObjectOptions::default().encode(payload, enc)?,
            }
        }
        Ok(())
    }

    fn decode(&self, count: usize, dec: &mut Decoder) -> Result<Vec<Value>> {
        (0..count)
            .map(|_| match dec.parse(TAG_RADIX)? {
                0 => Ok(Value::Absent),
                1 => decode_single(&FractionOptions::default(), dec),
                2 => decode_single(&StringOptions::default(), dec),
                3 => decode_single(&BooleanOptions, dec),
                4 => decode_single(&DateOptions::default(), dec),
                5 => decode_single(&ObjectOptions::default(), dec),
                tag => Err(CodecError::InvalidValue(format!("unknown value tag {}", tag))),
            })
            .collect()
    }
}
