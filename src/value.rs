use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// Largest magnitude below which every integral f64 is exact.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Field name to value mapping used by the `object` module.
pub type Record = BTreeMap<String, Value>;

/// A dynamically shaped value, the unit type modules encode and decode.
///
/// The variant doubles as the runtime tag the `any` module writes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Absent,
    Number(f64),
    Text(String),
    Flag(bool),
    Moment(OffsetDateTime),
    Record(Record),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Flag(_) => "boolean",
            Value::Moment(_) => "date",
            Value::Record(_) => "object",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Best-effort numeric reading used by lenient sessions.
    ///
    /// Text is parsed as a float, flags become 0 or 1 and moments their
    /// epoch milliseconds. Anything else, and anything non-finite, is 0.
    pub fn coerce_f64(&self) -> f64 {
        let n = match self {
            Value::Number(n) => *n,
            Value::Text(s) => s.trim().parse().unwrap_or(0.0),
            Value::Flag(b) => f64::from(u8::from(*b)),
            Value::Moment(t) => epoch_millis(t) as f64,
            Value::Absent | Value::Record(_) => 0.0,
        };
        if n.is_finite() { n } else { 0.0 }
    }

    /// Truthiness used by lenient boolean encoding.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Absent => false,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Flag(b) => *b,
            Value::Moment(_) | Value::Record(_) => true,
        }
    }

    /// Variant discriminant, as written by the `any` module.
    pub(crate) fn tag(&self) -> u64 {
        match self {
            Value::Absent => 0,
            Value::Number(_) => 1,
            Value::Text(_) => 2,
            Value::Flag(_) => 3,
            Value::Moment(_) => 4,
            Value::Record(_) => 5,
        }
    }

    /// Total order over values: by variant, then by payload.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Flag(a), Value::Flag(b)) => a.cmp(b),
            (Value::Moment(a), Value::Moment(b)) => a.cmp(b),
            (Value::Record(a), Value::Record(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ord = ka.cmp(kb).then_with(|| va.total_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.tag().cmp(&other.tag()),
        }
    }

    /// Converts a JSON document into a value.
    ///
    /// Arrays become records keyed by their decimal indices.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Absent,
            serde_json::Value::Bool(b) => Value::Flag(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => Value::Record(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), Value::from_json(v)))
                    .collect(),
            ),
            serde_json::Value::Object(map) => Value::Record(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts a value into JSON. Moments render as RFC 3339 text and
    /// integral numbers as JSON integers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Absent => serde_json::Value::Null,
            Value::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT => {
                serde_json::Value::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Flag(b) => serde_json::Value::Bool(*b),
            Value::Moment(t) => t
                .format(&Rfc3339)
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null),
            Value::Record(r) => serde_json::Value::Object(
                r.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Milliseconds since the Unix epoch, truncated toward negative infinity.
pub fn epoch_millis(t: &OffsetDateTime) -> i64 {
    t.unix_timestamp_nanos().div_euclid(1_000_000) as i64
}

/// Builds a UTC moment from epoch milliseconds.
pub fn from_epoch_millis(ms: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "undefined"),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Flag(b) => write!(f, "{}", b),
            Value::Moment(t) => match t.format(&Rfc3339) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => write!(f, "{}", epoch_millis(t)),
            },
            Value::Record(_) => write!(f, "[object Object]"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Flag(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(t: OffsetDateTime) -> Self {
        Value::Moment(t)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion() {
        let v = Value::from_json(&json!({"a": 1.5, "b": [true, null], "c": "x"}));
        let Value::Record(r) = &v else {
            panic!("expected record");
        };
        assert_eq!(r["a"], Value::Number(1.5));
        assert_eq!(r["c"], Value::Text("x".into()));
        let b = r["b"].as_record().unwrap();
        assert_eq!(b["0"], Value::Flag(true));
        assert_eq!(b["1"], Value::Absent);
        assert_eq!(v.to_json()["a"], json!(1.5));
        assert_eq!(Value::Number(42.0).to_json().to_string(), "42");
        assert_eq!(Value::Number(1e300).to_json(), json!(1e300));
    }

    #[test]
    fn test_coerce_f64() {
        assert_eq!(Value::from("42.5").coerce_f64(), 42.5);
        assert_eq!(Value::from("nope").coerce_f64(), 0.0);
        assert_eq!(Value::Flag(true).coerce_f64(), 1.0);
        assert_eq!(Value::Number(f64::NAN).coerce_f64(), 0.0);
        assert_eq!(Value::Absent.coerce_f64(), 0.0);
    }

    #[test]
    fn test_truthy() {
        assert!(!Value::Absent.truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(Value::Number(-2.0).truthy());
        assert!(!Value::from("").truthy());
        assert!(Value::Record(Record::new()).truthy());
    }

    #[test]
    fn test_total_order() {
        let mut values = vec![
            Value::from("b"),
            Value::Number(3.0),
            Value::Absent,
            Value::from("a"),
            Value::Number(-1.0),
        ];
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(
            values,
            vec![
                Value::Absent,
                Value::Number(-1.0),
                Value::Number(3.0),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn test_epoch_millis_roundtrip() {
        let t = from_epoch_millis(1_700_000_000_123).unwrap();
        assert_eq!(epoch_millis(&t), 1_700_000_000_123);
        let before = from_epoch_millis(-1).unwrap();
        assert_eq!(epoch_millis(&before), -1);
    }
}
