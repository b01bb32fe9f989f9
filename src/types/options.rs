//! Validated encoding options and their JSON form.
//!
//! An [`Options`] value can only be built through constructors that run
//! the target module's validation, so sessions never re-check settings.
//!
//! JSON documents name the module with `type` and carry that module's
//! fields next to it:
//!
//! ```json
//! {
//!   "type": "object",
//!   "limit": 10,
//!   "template": {
//!     "id":   { "type": "number", "min": 0, "max": 9999 },
//!     "name": { "type": "string", "max": 32, "optional": true },
//!     "pos":  { "x": { "type": "fraction" }, "y": { "type": "fraction" } }
//!   }
//! }
//! ```
//!
//! Template entries with a `type` key are leaves; entries without one are
//! nested records. `optional` on a leaf marks that field as optional.

use crate::core::charset::Charset;
use crate::encoders::algorithms::errors::{CodecError, Result};
use crate::types::date::named_interval;
use crate::types::{
    AnyOptions, BooleanOptions, DateOptions, FieldNode, FractionOptions, ItemOptions, Kind,
    NumberOptions, ObjectBase, ObjectOptions, StringOptions, Template,
};
use crate::value::{Record, Value, epoch_millis};
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Largest accepted `limit`. A stored count is trusted as the decode loop
/// bound, so it has to stay small enough to materialise.
pub const MAX_LIMIT: u64 = 1 << 20;

/// Per-item transform applied before encoding or after decoding.
pub type Hook = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A type module with its settings, plus the options every module shares.
#[derive(Clone)]
pub struct Options {
    kind: Kind,
    limit: Option<u64>,
    pre_proc: Option<Hook>,
    post_proc: Option<Hook>,
}

impl Options {
    /// Validates `kind` and wraps it.
    pub fn new(mut kind: Kind) -> Result<Self> {
        kind.validate()?;
        Ok(Self {
            kind,
            limit: None,
            pre_proc: None,
            post_proc: None,
        })
    }

    pub fn number(options: NumberOptions) -> Result<Self> {
        Self::new(Kind::Number(options))
    }

    pub fn string(options: StringOptions) -> Result<Self> {
        Self::new(Kind::Text(options))
    }

    pub fn item(options: ItemOptions) -> Result<Self> {
        Self::new(Kind::Item(options))
    }

    pub fn boolean() -> Self {
        Self::unchecked(Kind::Boolean(BooleanOptions))
    }

    pub fn fraction(options: FractionOptions) -> Result<Self> {
        Self::new(Kind::Fraction(options))
    }

    pub fn date(options: DateOptions) -> Result<Self> {
        Self::new(Kind::Date(options))
    }

    pub fn object(options: ObjectOptions) -> Result<Self> {
        Self::new(Kind::Object(options))
    }

    pub fn any() -> Self {
        Self::unchecked(Kind::Any(AnyOptions))
    }

    /// For kinds without settings to validate.
    fn unchecked(kind: Kind) -> Self {
        Self {
            kind,
            limit: None,
            pre_proc: None,
            post_proc: None,
        }
    }

    /// Prefixes every `write` with the item count, capped at `limit`.
    ///
    /// `limit` may not exceed [`MAX_LIMIT`].
    pub fn with_limit(mut self, limit: u64) -> Result<Self> {
        if limit > MAX_LIMIT {
            return Err(CodecError::InvalidOptions(format!(
                "limit {} exceeds maximum {}",
                limit, MAX_LIMIT
            )));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    pub fn with_pre_proc(mut self, hook: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.pre_proc = Some(Arc::new(hook));
        self
    }

    pub fn with_post_proc(mut self, hook: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.post_proc = Some(Arc::new(hook));
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn pre_proc(&self) -> Option<&Hook> {
        self.pre_proc.as_ref()
    }

    pub fn post_proc(&self) -> Option<&Hook> {
        self.post_proc.as_ref()
    }

    /// Parses and validates a JSON options document.
    pub fn from_json(text: &str) -> Result<Self> {
        let spec: OptionsSpec = serde_json::from_str(text).map_err(invalid)?;
        spec.into_options()
    }

    /// Like [`Options::from_json`] for an already parsed document.
    pub fn from_json_value(json: &Json) -> Result<Self> {
        let spec = OptionsSpec::deserialize(json).map_err(invalid)?;
        spec.into_options()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("kind", &self.kind)
            .field("limit", &self.limit)
            .field("pre_proc", &self.pre_proc.as_ref().map(|_| "<fn>"))
            .field("post_proc", &self.post_proc.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

fn invalid(err: serde_json::Error) -> CodecError {
    CodecError::InvalidOptions(err.to_string())
}

/// Charset as written in JSON: symbols, a code-point pair, or a size.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CharsetSpec {
    Symbols(String),
    Range([u32; 2]),
    Size(u32),
}

impl CharsetSpec {
    fn build(self) -> Result<Charset> {
        match self {
            CharsetSpec::Symbols(s) => Charset::from_symbols(&s),
            CharsetSpec::Range([lo, hi]) => Charset::range(lo, hi),
            CharsetSpec::Size(n) => Charset::binary(n),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IntervalSpec {
    Millis(f64),
    Named(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionsSpec {
    #[serde(rename = "type")]
    kind: String,
    limit: Option<u64>,
    min: Option<Json>,
    max: Option<Json>,
    step: Option<f64>,
    charset: Option<CharsetSpec>,
    list: Option<Vec<Json>>,
    sort: Option<bool>,
    precision: Option<f64>,
    interval: Option<IntervalSpec>,
    template: Option<Map<String, Json>>,
    optional: Option<bool>,
    base: Option<Json>,
}

impl OptionsSpec {
    /// Rejects module fields the named type does not take.
    fn only(&self, allowed: &[&str]) -> Result<()> {
        let present = [
            ("min", self.min.is_some()),
            ("max", self.max.is_some()),
            ("step", self.step.is_some()),
            ("charset", self.charset.is_some()),
            ("list", self.list.is_some()),
            ("sort", self.sort.is_some()),
            ("precision", self.precision.is_some()),
            ("interval", self.interval.is_some()),
            ("template", self.template.is_some()),
            ("optional", self.optional.is_some()),
            ("base", self.base.is_some()),
        ];
        match present
            .iter()
            .find(|(name, set)| *set && !allowed.contains(name))
        {
            Some((name, _)) => Err(CodecError::InvalidOptions(format!(
                "field '{}' does not apply to type '{}'",
                name, self.kind
            ))),
            None => Ok(()),
        }
    }

    fn into_options(self) -> Result<Options> {
        let kind = match self.kind.as_str() {
            "number" => {
                self.only(&["min", "max", "step"])?;
                Kind::Number(NumberOptions {
                    min: number_bound(self.min.as_ref(), "min")?,
                    max: number_bound(self.max.as_ref(), "max")?,
                    step: self.step.unwrap_or(1.0),
                })
            }
            "string" => {
                self.only(&["max", "charset"])?;
                let max = match &self.max {
                    None => None,
                    Some(v) => Some(v.as_u64().ok_or_else(|| {
                        CodecError::InvalidOptions(format!(
                            "max length must be a non-negative integer, got {}",
                            v
                        ))
                    })?),
                };
                let charset = match self.charset {
                    Some(spec) => spec.build()?,
                    None => StringOptions::default().charset,
                };
                Kind::Text(StringOptions { max, charset })
            }
            "item" => {
                self.only(&["list", "sort"])?;
                let list = self.list.ok_or_else(|| {
                    CodecError::InvalidOptions("type 'item' needs a list".to_string())
                })?;
                Kind::Item(ItemOptions {
                    list: list.iter().map(Value::from_json).collect(),
                    sort: self.sort.unwrap_or(false),
                })
            }
            "boolean" => {
                self.only(&[])?;
                Kind::Boolean(BooleanOptions)
            }
            "fraction" => {
                self.only(&["precision"])?;
                Kind::Fraction(match self.precision {
                    Some(precision) => FractionOptions { precision },
                    None => FractionOptions::default(),
                })
            }
            "date" => {
                self.only(&["interval", "min", "max"])?;
                let interval = match self.interval {
                    None => 1.0,
                    Some(IntervalSpec::Millis(ms)) => ms,
                    Some(IntervalSpec::Named(name)) => named_interval(&name).ok_or_else(|| {
                        CodecError::InvalidOptions(format!("unknown interval '{}'", name))
                    })?,
                };
                Kind::Date(DateOptions {
                    interval,
                    min: date_bound(self.min.as_ref(), "min")?,
                    max: date_bound(self.max.as_ref(), "max")?,
                })
            }
            "object" => {
                self.only(&["template", "base", "sort", "optional"])?;
                Kind::Object(ObjectOptions {
                    template: self.template.as_ref().map(template_from_json).transpose()?,
                    base: object_base(self.base.as_ref())?,
                    sort: self.sort.unwrap_or(false),
                    optional: self.optional.unwrap_or(false),
                })
            }
            "any" => {
                self.only(&[])?;
                Kind::Any(AnyOptions)
            }
            other => {
                return Err(CodecError::InvalidOptions(format!(
                    "unknown type '{}'",
                    other
                )));
            }
        };

        let options = Options::new(kind)?;
        match self.limit {
            Some(limit) => options.with_limit(limit),
            None => Ok(options),
        }
    }
}

fn number_bound(json: Option<&Json>, field: &str) -> Result<Option<f64>> {
    json.map(|v| {
        v.as_f64().ok_or_else(|| {
            CodecError::InvalidOptions(format!("{} must be a number, got {}", field, v))
        })
    })
    .transpose()
}

/// Date bounds are epoch milliseconds or RFC 3339 text.
fn date_bound(json: Option<&Json>, field: &str) -> Result<Option<i64>> {
    let Some(v) = json else {
        return Ok(None);
    };
    match v {
        Json::Number(n) => n.as_f64().map(|ms| Some(ms.floor() as i64)).ok_or_else(|| {
            CodecError::InvalidOptions(format!("{} is not a valid timestamp", field))
        }),
        Json::String(s) => OffsetDateTime::parse(s, &Rfc3339)
            .map(|t| Some(epoch_millis(&t)))
            .map_err(|e| {
                CodecError::InvalidOptions(format!("{} '{}' is not an RFC 3339 date: {}", field, s, e))
            }),
        other => Err(CodecError::InvalidOptions(format!(
            "{} must be epoch milliseconds or an RFC 3339 date, got {}",
            field, other
        ))),
    }
}

fn object_base(json: Option<&Json>) -> Result<ObjectBase> {
    let record = |v: &Json| match Value::from_json(v) {
        Value::Record(r) if v.is_object() => Ok(r),
        _ => Err(CodecError::InvalidOptions(format!(
            "base must be an object or an array of objects, got {}",
            v
        ))),
    };
    match json {
        None => Ok(ObjectBase::Fresh),
        Some(Json::Array(items)) => Ok(ObjectBase::PerItem(
            items.iter().map(record).collect::<Result<Vec<Record>>>()?,
        )),
        Some(v) => record(v).map(ObjectBase::Shared),
    }
}

fn template_from_json(map: &Map<String, Json>) -> Result<Template> {
    let mut template = Template::new();
    for (name, node) in map {
        let within = |err: CodecError| match err {
            CodecError::InvalidOptions(msg) => {
                CodecError::InvalidOptions(format!("field '{}': {}", name, msg))
            }
            other => other,
        };
        let Some(entries) = node.as_object() else {
            return Err(within(CodecError::InvalidOptions(format!(
                "expected options or a nested template, got {}",
                node
            ))));
        };

        template = if entries.contains_key("type") {
            let mut spec = OptionsSpec::deserialize(node)
                .map_err(invalid)
                .map_err(within)?;
            let optional = spec.optional.take();
            let options = spec.into_options().map_err(within)?;
            template.push(name.as_str(), optional, FieldNode::Leaf(Box::new(options)))
        } else {
            template.nested(name.as_str(), template_from_json(entries).map_err(within)?)
        };
    }
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invalid_message(json: Json) -> String {
        match Options::from_json_value(&json) {
            Err(CodecError::InvalidOptions(msg)) => msg,
            other => panic!("expected InvalidOptions, got {:?}", other),
        }
    }

    #[test]
    fn test_number_from_json() {
        let options =
            Options::from_json(r#"{"type": "number", "min": 0, "max": 100, "step": 1}"#).unwrap();
        let Kind::Number(n) = options.kind() else {
            panic!("expected number");
        };
        assert_eq!(n, &NumberOptions::bounded(0.0, 100.0));
        assert_eq!(options.limit(), None);
    }

    #[test]
    fn test_string_charset_forms() {
        for (charset, size) in [(json!("abc"), 3), (json!([48, 57]), 10), (json!(256), 256)] {
            let options =
                Options::from_json_value(&json!({"type": "string", "charset": charset})).unwrap();
            let Kind::Text(s) = options.kind() else {
                panic!("expected string");
            };
            assert_eq!(s.charset.size(), size);
        }
    }

    #[test]
    fn test_template_structure() {
        let options = Options::from_json_value(&json!({
            "type": "object",
            "template": {
                "b": {"type": "number", "min": 0, "max": 10, "optional": true},
                "a": {"type": "boolean"},
                "pos": {"x": {"type": "fraction"}}
            }
        }))
        .unwrap();
        let Kind::Object(obj) = options.kind() else {
            panic!("expected object");
        };
        let template = obj.template.as_ref().unwrap();
        let names: Vec<_> = template.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "pos"]);
        assert_eq!(template.fields()[0].optional, Some(true));
        assert!(matches!(template.fields()[2].node, FieldNode::Nested(_)));
    }

    #[test]
    fn test_date_interval_and_bounds() {
        let options = Options::from_json_value(&json!({
            "type": "date",
            "interval": "day",
            "min": "2020-01-01T00:00:00Z",
            "max": 1893456000000i64
        }))
        .unwrap();
        let Kind::Date(d) = options.kind() else {
            panic!("expected date");
        };
        assert_eq!(d.interval, 86_400_000.0);
        assert_eq!(d.min, Some(1_577_836_800_000));
        assert_eq!(d.max, Some(1_893_456_000_000));
    }

    #[test]
    fn test_rejections() {
        assert!(invalid_message(json!({"type": "number", "colour": 1})).contains("colour"));
        assert!(invalid_message(json!({"type": "number", "list": []})).contains("'list'"));
        assert!(invalid_message(json!({"type": "tuple"})).contains("unknown type"));
        assert!(invalid_message(json!({"type": "item"})).contains("needs a list"));
        assert!(invalid_message(json!({"type": "item", "list": []})).contains("empty"));
        assert!(invalid_message(json!({"type": "date", "interval": "eon"})).contains("eon"));
        assert!(
            invalid_message(json!({"type": "object", "template": {"a": 1}})).contains("field 'a'")
        );
        assert!(
            invalid_message(json!({"type": "number", "min": "zero"})).contains("must be a number")
        );
    }

    #[test]
    fn test_bad_charset_is_alphabet_error() {
        let err = Options::from_json_value(&json!({"type": "string", "charset": "aa"})).unwrap_err();
        assert!(matches!(err, CodecError::InvalidAlphabet(_)));
    }

    #[test]
    fn test_limit_and_hooks() {
        let options = Options::from_json(r#"{"type": "boolean", "limit": 4}"#)
            .unwrap()
            .with_pre_proc(|v| v)
            .with_post_proc(|v| v);
        assert_eq!(options.limit(), Some(4));
        assert!(options.pre_proc().is_some());
        assert!(format!("{:?}", options).contains("<fn>"));
        assert!(Options::boolean().with_limit(u64::MAX).is_err());
    }

    #[test]
    fn test_limit_ceiling() {
        assert!(Options::boolean().with_limit(MAX_LIMIT).is_ok());
        let err = Options::boolean().with_limit(MAX_LIMIT + 1).unwrap_err();
        assert!(matches!(err, CodecError::InvalidOptions(_)));

        let json = format!(r#"{{"type": "boolean", "limit": {}}}"#, MAX_LIMIT + 1);
        assert!(Options::from_json(&json).is_err());
    }

    #[test]
    fn test_object_base_forms() {
        let options = Options::from_json_value(&json!({"type": "object", "base": [{"a": 1}]}))
            .unwrap();
        let Kind::Object(obj) = options.kind() else {
            panic!("expected object");
        };
        assert!(matches!(&obj.base, ObjectBase::PerItem(rs) if rs.len() == 1));
        assert!(Options::from_json_value(&json!({"type": "object", "base": 3})).is_err());
    }
}
