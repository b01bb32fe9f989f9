use crate::encoders::algorithms::errors::{CodecError, Result};
use crate::encoders::algorithms::radix::{DigitSink, DigitSource};
use crate::encoders::session::{Decoder, Encoder};
use crate::types::TypeModule;
use crate::value::Value;

/// One bit per value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BooleanOptions;

impl TypeModule for BooleanOptions {
    fn name(&self) -> &str {
        "boolean"
    }

    fn validate(&mut self) -> Result<()> {
        Ok(())
    }

    fn encode(&self, items: &[Value], enc: &mut Encoder) -> Result<()> {
        for item in items {
            let flag = match item {
                Value::Flag(b) => *b,
                other => {
                    enc.coerce(CodecError::type_mismatch("boolean", other), || other.truthy())?
                }
            };
            enc.compose(u64::from(flag), 2)?;
        }
        Ok(())
    }

    fn decode(&self, count: usize, dec: &mut Decoder) -> Result<Vec<Value>> {
        (0..count)
            .map(|_| Ok(Value::Flag(dec.parse(2)? == 1)))
            .collect()
    }
}
