use crate::encoders::algorithms::errors::{CodecError, Result};
use crate::encoders::algorithms::radix::{DigitSink, DigitSource};
use crate::encoders::session::{Decoder, Encoder};
use crate::types::TypeModule;
use crate::value::Value;
use num_bigint::BigUint;
use num_traits::{FromPrimitive, ToPrimitive};
use tracing::trace;

pub const DEFAULT_PRECISION: f64 = 1e-15;

/// Upper bound on continued-fraction terms per value.
pub const MAX_EXPANSION_TERMS: usize = 64;

/// Real numbers as a sign bit and a rational `h / k`, with `h` and `k - 1`
/// written as unbounded terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionOptions {
    pub precision: f64,
}

impl Default for FractionOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

/// Best rational approximation of `value` by continued-fraction expansion.
///
/// Stops once the remainder is within `precision * k^2`, or after
/// [`MAX_EXPANSION_TERMS`] terms. Returns `(h, k)` with `k >= 1`.
pub fn approximate(value: f64, precision: f64) -> (f64, f64) {
    let mut x = value;
    let mut a = x.floor();
    let (mut h1, mut k1) = (1.0, 0.0);
    let (mut h, mut k) = (a, 1.0);

    for _ in 0..MAX_EXPANSION_TERMS {
        if x - a <= precision * k * k {
            break;
        }
        x = 1.0 / (x - a);
        a = x.floor();
        let (h2, k2) = (h1, k1);
        h1 = h;
        k1 = k;
        h = h2 + a * h1;
        k = k2 + a * k1;
        if !(h.is_finite() && k.is_finite()) {
            return (h1, k1);
        }
    }
    (h, k)
}

fn term(n: f64) -> Result<BigUint> {
    BigUint::from_f64(n)
        .ok_or_else(|| CodecError::InvalidValue(format!("{} is not a valid fraction term", n)))
}

impl TypeModule for FractionOptions {
    fn name(&self) -> &str {
        "fraction"
    }

    fn validate(&mut self) -> Result<()> {
        if !(self.precision.is_finite() && self.precision >= 0.0) {
            return Err(CodecError::InvalidOptions(format!(
                "precision must be a non-negative number, got {}",
                self.precision
            )));
        }
        Ok(())
    }

    fn encode(&self, items: &[Value], enc: &mut Encoder) -> Result<()> {
        for item in items {
            let x = match item {
                Value::Number(n) if n.is_finite() => *n,
                other => enc.coerce(CodecError::type_mismatch("number", other), || {
                    other.coerce_f64()
                })?,
            };
            let (h, k) = approximate(x.abs(), self.precision);
            trace!(value = x, numerator = h, denominator = k, "approximated fraction");

            enc.compose(u64::from(x < 0.0), 2)?;
            enc.compose_term(&term(h)?)?;
            enc.compose_term(&term(k - 1.0)?)?;
        }
        Ok(())
    }

    fn decode(&self, count: usize, dec: &mut Decoder) -> Result<Vec<Value>> {
        (0..count)
            .map(|_| {
                let negative = dec.parse(2)? == 1;
                let h = dec.parse_term()?.to_f64().unwrap_or(f64::INFINITY);
                let k = (dec.parse_term()? + 1u32).to_f64().unwrap_or(f64::INFINITY);
                let magnitude = h / k;
                Ok(Value::Number(if negative { -magnitude } else { magnitude }))
            })
            .collect()
    }
}
