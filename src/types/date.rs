use crate::encoders::algorithms::errors::{CodecError, Result};
use crate::encoders::session::{Decoder, Encoder};
use crate::types::{NumberOptions, TypeModule};
use crate::value::{Value, epoch_millis, from_epoch_millis};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Named intervals and their length in milliseconds.
pub const INTERVALS: [(&str, f64); 8] = [
    ("millisecond", 1.0),
    ("second", 1_000.0),
    ("minute", 60_000.0),
    ("hour", 3_600_000.0),
    ("day", 86_400_000.0),
    ("week", 604_800_000.0),
    ("month", 604_800_000.0 * 4.348214285714286),
    ("year", 604_800_000.0 * 4.348214285714286 * 12.0),
];

/// Looks up a named interval.
pub fn named_interval(name: &str) -> Option<f64> {
    INTERVALS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, ms)| ms)
}

/// Timestamps counted in whole `interval`s since the Unix epoch.
///
/// Bounds are epoch milliseconds and behave like number bounds once
/// scaled to interval units.
#[derive(Debug, Clone, PartialEq)]
pub struct DateOptions {
    pub interval: f64,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl Default for DateOptions {
    fn default() -> Self {
        Self {
            interval: 1.0,
            min: None,
            max: None,
        }
    }
}

impl DateOptions {
    pub fn with_interval(interval: f64) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn between(mut self, min: &OffsetDateTime, max: &OffsetDateTime) -> Self {
        self.min = Some(epoch_millis(min));
        self.max = Some(epoch_millis(max));
        self
    }

    fn units(&self) -> Result<NumberOptions> {
        let mut units = NumberOptions {
            min: self.min.map(|ms| (ms as f64 / self.interval).floor()),
            max: self.max.map(|ms| (ms as f64 / self.interval).floor()),
            step: 1.0,
        };
        units.validate()?;
        Ok(units)
    }

    fn millis(&self, item: &Value, enc: &Encoder) -> Result<f64> {
        Ok(match item {
            Value::Moment(t) => epoch_millis(t) as f64,
            Value::Text(s) => match OffsetDateTime::parse(s, &Rfc3339) {
                Ok(t) => epoch_millis(&t) as f64,
                Err(_) => enc.coerce(CodecError::type_mismatch("date", item), || 0.0)?,
            },
            other => enc.coerce(CodecError::type_mismatch("date", other), || {
                other.coerce_f64()
            })?,
        })
    }
}

impl TypeModule for DateOptions {
    fn name(&self) -> &str {
        "date"
    }

    fn validate(&mut self) -> Result<()> {
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return Err(CodecError::InvalidOptions(format!(
                "interval must be a positive number of milliseconds, got {}",
                self.interval
            )));
        }
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            self.min = Some(max);
            self.max = Some(min);
        }
        self.units().map(|_| ())
    }

    fn encode(&self, items: &[Value], enc: &mut Encoder) -> Result<()> {
        let units = self.units()?;
        for item in items {
            let count = (self.millis(item, enc)? / self.interval).floor();
            units.encode(&[Value::Number(count)], enc)?;
        }
        Ok(())
    }

    fn decode(&self, count: usize, dec: &mut Decoder) -> Result<Vec<Value>> {
        let units = self.units()?;
        units
            .decode(count, dec)?
            .into_iter()
            .map(|v| {
                let ms = (v.as_f64().unwrap_or_default() * self.interval).round();
                from_epoch_millis(ms as i64)
                    .map(Value::Moment)
                    .ok_or_else(|| {
                        CodecError::InvalidValue(format!("{} ms is outside the date range", ms))
                    })
            })
            .collect()
    }
}
