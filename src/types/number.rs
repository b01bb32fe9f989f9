use crate::encoders::algorithms::errors::{CodecError, Result};
use crate::encoders::algorithms::radix::{DigitSink, DigitSource};
use crate::encoders::session::{Decoder, Encoder};
use crate::types::TypeModule;
use crate::value::Value;
use num_bigint::BigUint;
use num_traits::{FromPrimitive, ToPrimitive};

/// Distance within which a step quotient counts as a whole number of steps.
pub const STEP_EPSILON: f64 = 1.0 / (1u64 << 30) as f64;

/// Widest bounded span, in steps, that still fits one digit.
const MAX_SPAN: f64 = (1u64 << 63) as f64;

/// Numbers on a `step` grid, bounded on either side, both or neither.
///
/// A bounded number is one digit over `(max - min) / step + 1`. With a
/// bound missing the offset from the present bound is written as an
/// unbounded term; with both missing a sign bit comes first.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: f64,
}

impl Default for NumberOptions {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            step: 1.0,
        }
    }
}

impl NumberOptions {
    pub fn bounded(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            step: 1.0,
        }
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Digit radix of a fully bounded range.
    fn radix(&self, min: f64, max: f64) -> u64 {
        ((max - min) / self.step).round() as u64 + 1
    }

    /// Turns a quotient in steps into a whole step count.
    fn steps(&self, quotient: f64, value: f64, enc: &Encoder) -> Result<f64> {
        match snap(quotient) {
            Some(n) => Ok(n),
            None => enc.coerce(
                CodecError::RangeOrStepViolation(format!(
                    "{} is not aligned to step {}",
                    value, self.step
                )),
                || quotient.floor(),
            ),
        }
    }

    fn encode_one(&self, item: &Value, enc: &mut Encoder) -> Result<()> {
        let x = match item {
            Value::Number(n) if n.is_finite() => *n,
            other => enc.coerce(CodecError::type_mismatch("number", other), || {
                other.coerce_f64()
            })?,
        };

        match (self.min, self.max) {
            (Some(min), Some(max)) => {
                let x = if x < min || x > max {
                    enc.coerce(
                        CodecError::RangeOrStepViolation(format!(
                            "{} exceeds range bounds [{}, {}]",
                            x, min, max
                        )),
                        || x.clamp(min, max),
                    )?
                } else {
                    x
                };
                let steps = self.steps((x - min) / self.step, x, enc)?;
                enc.compose(steps as u64, self.radix(min, max))
            }
            (None, None) => {
                let steps = self.steps(x.abs() / self.step, x, enc)?;
                enc.compose(u64::from(x < 0.0 && steps > 0.0), 2)?;
                enc.compose_term(&magnitude(steps)?)
            }
            (Some(min), None) => {
                let offset = self.below_bound(x - min, x, enc)?;
                let steps = self.steps(offset / self.step, x, enc)?;
                enc.compose_term(&magnitude(steps)?)
            }
            (None, Some(max)) => {
                let offset = self.below_bound(max - x, x, enc)?;
                let steps = self.steps(offset / self.step, x, enc)?;
                enc.compose_term(&magnitude(steps)?)
            }
        }
    }

    /// Clamps a negative offset from the single present bound to zero.
    fn below_bound(&self, offset: f64, value: f64, enc: &Encoder) -> Result<f64> {
        if offset >= 0.0 {
            return Ok(offset);
        }
        enc.coerce(
            CodecError::RangeOrStepViolation(format!(
                "{} exceeds range bounds [{}, {}]",
                value,
                self.min.map_or("-inf".to_string(), |m| m.to_string()),
                self.max.map_or("inf".to_string(), |m| m.to_string()),
            )),
            || 0.0,
        )
    }

    fn decode_one(&self, dec: &mut Decoder) -> Result<f64> {
        Ok(match (self.min, self.max) {
            (Some(min), Some(max)) => dec.parse(self.radix(min, max))? as f64 * self.step + min,
            (None, None) => {
                let negative = dec.parse(2)? == 1;
                let magnitude = to_f64(&dec.parse_term()?) * self.step;
                if negative { -magnitude } else { magnitude }
            }
            (Some(min), None) => to_f64(&dec.parse_term()?) * self.step + min,
            (None, Some(max)) => max - to_f64(&dec.parse_term()?) * self.step,
        })
    }
}

/// Rounds `q` to the nearest integer when it is within [`STEP_EPSILON`].
fn snap(q: f64) -> Option<f64> {
    let nearest = q.round();
    ((q - nearest).abs() <= STEP_EPSILON).then_some(nearest)
}

fn magnitude(steps: f64) -> Result<BigUint> {
    BigUint::from_f64(steps)
        .ok_or_else(|| CodecError::InvalidValue(format!("{} is not a valid magnitude", steps)))
}

fn to_f64(n: &BigUint) -> f64 {
    n.to_f64().unwrap_or(f64::INFINITY)
}

impl TypeModule for NumberOptions {
    fn name(&self) -> &str {
        "number"
    }

    fn validate(&mut self) -> Result<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(CodecError::InvalidOptions(format!(
                "step must be a positive number, got {}",
                self.step
            )));
        }
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(CodecError::InvalidOptions(format!(
                    "bound {} is not finite; leave it out for an open range",
                    bound
                )));
            }
        }

        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                self.min = Some(max);
                self.max = Some(min);
            }
            let (min, max) = (min.min(max), min.max(max));
            let span = (max - min) / self.step;
            if snap(span).is_none() {
                return Err(CodecError::InvalidOptions(format!(
                    "range [{}, {}] is not a whole number of {} steps",
                    min, max, self.step
                )));
            }
            if span > MAX_SPAN {
                return Err(CodecError::InvalidOptions(format!(
                    "range [{}, {}] is too wide for one digit; leave a bound open",
                    min, max
                )));
            }
        }
        Ok(())
    }

    fn encode(&self, items: &[Value], enc: &mut Encoder) -> Result<()> {
        items.iter().try_for_each(|item| self.encode_one(item, enc))
    }

    fn decode(&self, count: usize, dec: &mut Decoder) -> Result<Vec<Value>> {
        (0..count)
            .map(|_| self.decode_one(dec).map(Value::Number))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::charset::Charset;

    fn roundtrip(opts: &NumberOptions, values: &[f64]) -> Vec<f64> {
        let mut enc = Encoder::new(true);
        let items: Vec<Value> = values.iter().map(|&v| Value::Number(v)).collect();
        opts.encode(&items, &mut enc).unwrap();
        let text = enc.pack(&Charset::default()).unwrap();
        let mut dec = Decoder::new(&text, Charset::default(), true);
        let out = opts.decode(values.len(), &mut dec).unwrap();
        dec.finish().unwrap();
        out.iter().map(|v| v.as_f64().unwrap()).collect()
    }

    fn validated(mut opts: NumberOptions) -> NumberOptions {
        opts.validate().unwrap();
        opts
    }

    #[test]
    fn test_bounded_is_single_digit() {
        let opts = validated(NumberOptions::bounded(0.0, 100.0));
        let mut enc = Encoder::new(true);
        opts.encode(&[Value::Number(42.0)], &mut enc).unwrap();
        let digits: Vec<_> = enc.digits().iter().map(|d| (d.value(), d.radix())).collect();
        assert_eq!(digits, vec![(42, 101)]);
    }

    #[test]
    fn test_roundtrip_every_bound_shape() {
        let shapes = [
            NumberOptions::bounded(-5.0, 5.0),
            NumberOptions::default(),
            NumberOptions {
                min: Some(-3.0),
                max: None,
                step: 1.0,
            },
            NumberOptions {
                min: None,
                max: Some(7.0),
                step: 1.0,
            },
        ];
        for opts in shapes {
            let opts = validated(opts);
            assert_eq!(roundtrip(&opts, &[-3.0, 0.0, 5.0]), vec![-3.0, 0.0, 5.0], "{:?}", opts);
        }
    }

    #[test]
    fn test_fractional_step() {
        let opts = validated(NumberOptions::bounded(0.0, 1.0).with_step(0.25));
        assert_eq!(roundtrip(&opts, &[0.0, 0.75, 1.0]), vec![0.0, 0.75, 1.0]);

        let opts = validated(NumberOptions::bounded(0.0, 1.0).with_step(0.1));
        assert_eq!(opts.radix(0.0, 1.0), 11);
    }

    #[test]
    fn test_unbounded_extremes() {
        let opts = validated(NumberOptions::default());
        let values = [-1e300, 1e300, -1.0];
        assert_eq!(roundtrip(&opts, &values), values.to_vec());
    }

    #[test]
    fn test_strict_rejects_out_of_range_and_off_step() {
        let opts = validated(NumberOptions::bounded(0.0, 10.0));
        let mut enc = Encoder::new(true);
        let err = opts.encode(&[Value::Number(11.0)], &mut enc).unwrap_err();
        assert!(matches!(err, CodecError::RangeOrStepViolation(_)));
        let err = opts.encode(&[Value::Number(2.5)], &mut enc).unwrap_err();
        assert!(matches!(err, CodecError::RangeOrStepViolation(_)));
        let err = opts.encode(&[Value::from("3")], &mut enc).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn test_lenient_clamps_floors_and_coerces() {
        let opts = validated(NumberOptions::bounded(0.0, 10.0));
        let mut enc = Encoder::new(false);
        let items = [
            Value::Number(11.0),
            Value::Number(-4.0),
            Value::Number(2.5),
            Value::from("3"),
        ];
        opts.encode(&items, &mut enc).unwrap();
        let values: Vec<_> = enc.digits().iter().map(|d| d.value()).collect();
        assert_eq!(values, vec![10, 0, 2, 3]);
    }

    #[test]
    fn test_epsilon_boundary() {
        let opts = validated(NumberOptions::bounded(0.0, 10.0));
        let mut enc = Encoder::new(true);
        opts.encode(&[Value::Number(3.0 + STEP_EPSILON / 2.0)], &mut enc)
            .unwrap();
        assert_eq!(enc.digits().iter().next().map(|d| d.value()), Some(3));

        // Exactly at the tolerance still snaps
        opts.encode(&[Value::Number(5.0 - STEP_EPSILON)], &mut enc)
            .unwrap();
        assert_eq!(enc.digits().iter().nth(1).map(|d| d.value()), Some(5));

        let err = opts
            .encode(&[Value::Number(3.0 + STEP_EPSILON * 4.0)], &mut enc)
            .unwrap_err();
        assert!(matches!(err, CodecError::RangeOrStepViolation(_)));
    }

    #[test]
    fn test_single_open_bound_clamps_to_bound() {
        let opts = validated(NumberOptions {
            min: Some(10.0),
            max: None,
            step: 1.0,
        });
        let mut enc = Encoder::new(false);
        opts.encode(&[Value::Number(3.0)], &mut enc).unwrap();
        let values: Vec<_> = enc.digits().iter().map(|d| d.value()).collect();
        assert_eq!(values, vec![0]);
    }

    #[test]
    fn test_validate() {
        let mut swapped = NumberOptions::bounded(10.0, 0.0);
        swapped.validate().unwrap();
        assert_eq!((swapped.min, swapped.max), (Some(0.0), Some(10.0)));

        assert!(NumberOptions::bounded(0.0, 1.0).with_step(0.0).validate().is_err());
        assert!(NumberOptions::bounded(0.0, 1.0).with_step(0.3).validate().is_err());
        assert!(NumberOptions::bounded(0.0, f64::INFINITY).validate().is_err());
        assert!(NumberOptions::bounded(0.0, 1e300).validate().is_err());
    }

    #[test]
    fn test_equal_bounds_write_nothing() {
        let opts = validated(NumberOptions::bounded(4.0, 4.0));
        assert_eq!(roundtrip(&opts, &[4.0]), vec![4.0]);
        let mut enc = Encoder::new(true);
        opts.encode(&[Value::Number(4.0)], &mut enc).unwrap();
        assert!(enc.digits().is_empty());
    }
}
