use crate::encoders::algorithms::errors::{CodecError, Result};
use crate::encoders::algorithms::radix::{DigitSink, DigitSource};
use crate::encoders::session::{Decoder, Encoder};
use crate::types::{AnyOptions, Options, StringOptions, TypeModule, decode_single};
use crate::value::{Record, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Ordered field descriptors for a templated record.
#[derive(Debug, Clone, Default)]
pub struct Template {
    fields: Vec<Field>,
}

/// One named entry of a [`Template`].
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    /// Overrides the record-wide default when set.
    pub optional: Option<bool>,
    pub node: FieldNode,
}

#[derive(Debug, Clone)]
pub enum FieldNode {
    /// Value encoded with its own options.
    Leaf(Box<Options>),
    /// Inner record encoded in place, without options of its own.
    Nested(Template),
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(self, name: impl Into<String>, options: Options) -> Self {
        self.push(name, None, FieldNode::Leaf(Box::new(options)))
    }

    pub fn optional_field(self, name: impl Into<String>, options: Options) -> Self {
        self.push(name, Some(true), FieldNode::Leaf(Box::new(options)))
    }

    pub fn nested(self, name: impl Into<String>, template: Template) -> Self {
        self.push(name, None, FieldNode::Nested(template))
    }

    pub fn push(mut self, name: impl Into<String>, optional: Option<bool>, node: FieldNode) -> Self {
        self.fields.push(Field {
            name: name.into(),
            optional,
            node,
        });
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn check_names(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(CodecError::InvalidOptions(format!(
                    "template field '{}' appears twice",
                    field.name
                )));
            }
            if let FieldNode::Nested(inner) = &field.node {
                inner.check_names()?;
            }
        }
        Ok(())
    }
}

/// Where decoded records start from.
#[derive(Clone, Default)]
pub enum ObjectBase {
    /// An empty record per item.
    #[default]
    Fresh,
    /// A copy of the same record for every item.
    Shared(Record),
    /// One record per item; the count must match.
    PerItem(Vec<Record>),
    /// A record produced by a callback per item.
    Factory(Arc<dyn Fn() -> Record + Send + Sync>),
}

impl fmt::Debug for ObjectBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectBase::Fresh => write!(f, "Fresh"),
            ObjectBase::Shared(r) => f.debug_tuple("Shared").field(r).finish(),
            ObjectBase::PerItem(rs) => f.debug_tuple("PerItem").field(&rs.len()).finish(),
            ObjectBase::Factory(_) => write!(f, "Factory(<fn>)"),
        }
    }
}

/// Records, either against a [`Template`] or self-describing.
///
/// A self-describing record writes its field count, then each key as a
/// string and each value through the `any` module.
#[derive(Debug, Clone, Default)]
pub struct ObjectOptions {
    pub template: Option<Template>,
    pub base: ObjectBase,
    /// Walk template fields by name instead of declaration order.
    pub sort: bool,
    /// Default presence mode for fields that do not set their own.
    pub optional: bool,
}

impl ObjectOptions {
    pub fn templated(template: Template) -> Self {
        Self {
            template: Some(template),
            ..Self::default()
        }
    }

    pub fn with_base(mut self, base: ObjectBase) -> Self {
        self.base = base;
        self
    }

    fn ordered<'t>(&self, template: &'t Template) -> Vec<&'t Field> {
        let mut fields: Vec<&Field> = template.fields.iter().collect();
        if self.sort {
            fields.sort_by(|a, b| a.name.cmp(&b.name));
        }
        fields
    }

    fn encode_template(&self, record: &Record, template: &Template, enc: &mut Encoder) -> Result<()> {
        for field in self.ordered(template) {
            let value = record.get(&field.name).filter(|v| !v.is_absent());

            if field.optional.unwrap_or(self.optional) {
                enc.compose(u64::from(value.is_some()), 2)?;
                if value.is_none() {
                    continue;
                }
            }
            let value = value.ok_or_else(|| CodecError::MissingField(field.name.clone()))?;

            match &field.node {
                FieldNode::Leaf(options) => enc.write(std::slice::from_ref(value), options)?,
                FieldNode::Nested(inner) => {
                    let empty = Record::new();
                    let inner_record = match value {
                        Value::Record(r) => r,
                        other => enc.coerce(
                            CodecError::type_mismatch("object", other),
                            || &empty,
                        )?,
                    };
                    self.encode_template(inner_record, inner, enc)?;
                }
            }
        }
        Ok(())
    }

    fn decode_template(
        &self,
        record: &mut Record,
        template: &Template,
        dec: &mut Decoder,
    ) -> Result<()> {
        for field in self.ordered(template) {
            if field.optional.unwrap_or(self.optional) && dec.parse(2)? == 0 {
                continue;
            }

            match &field.node {
                FieldNode::Leaf(options) => {
                    let value = dec.read_value(options)?;
                    record.insert(field.name.clone(), value);
                }
                FieldNode::Nested(inner) => {
                    let child = record
                        .entry(field.name.clone())
                        .or_insert_with(|| Value::Record(Record::new()));
                    if !matches!(child, Value::Record(_)) {
                        *child = Value::Record(Record::new());
                    }
                    if let Value::Record(child) = child {
                        self.decode_template(child, inner, dec)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn base_record(&self, index: usize) -> Record {
        match &self.base {
            ObjectBase::Fresh => Record::new(),
            ObjectBase::Shared(r) => r.clone(),
            ObjectBase::PerItem(rs) => rs.get(index).cloned().unwrap_or_default(),
            ObjectBase::Factory(make) => make(),
        }
    }
}

fn encode_self_describing(record: &Record, enc: &mut Encoder) -> Result<()> {
    enc.compose_term_u64(record.len() as u64)?;
    for (key, value) in record {
        StringOptions::default().encode(&[Value::Text(key.clone())], enc)?;
        AnyOptions.encode(std::slice::from_ref(value), enc)?;
    }
    Ok(())
}

fn decode_self_describing(record: &mut Record, dec: &mut Decoder) -> Result<()> {
    let count = dec.parse_term_u64()?;
    let keys = StringOptions::default();
    for _ in 0..count {
        let key = match decode_single(&keys, dec)? {
            Value::Text(s) => s,
            other => other.to_string(),
        };
        let value = decode_single(&AnyOptions, dec)?;
        record.insert(key, value);
    }
    Ok(())
}

impl TypeModule for ObjectOptions {
    fn name(&self) -> &str {
        "object"
    }

    fn validate(&mut self) -> Result<()> {
        match &self.template {
            Some(template) => template.check_names(),
            None => Ok(()),
        }
    }

    fn encode(&self, items: &[Value], enc: &mut Encoder) -> Result<()> {
        let empty = Record::new();
        for item in items {
            let record = match item {
                Value::Record(r) => r,
                other => enc.coerce(CodecError::type_mismatch("object", other), || &empty)?,
            };
            match &self.template {
                Some(template) => self.encode_template(record, template, enc)?,
                None => encode_self_describing(record, enc)?,
            }
        }
        Ok(())
    }

    fn decode(&self, count: usize, dec: &mut Decoder) -> Result<Vec<Value>> {
        if let ObjectBase::PerItem(records) = &self.base
            && records.len() != count
        {
            return Err(CodecError::MissingField(format!(
                "{} base records for {} items",
                records.len(),
                count
            )));
        }

        (0..count)
            .map(|i| {
                let mut record = self.base_record(i);
                match &self.template {
                    Some(template) => self.decode_template(&mut record, template, dec)?,
                    None => decode_self_describing(&mut record, dec)?,
                }
                Ok(Value::Record(record))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::charset::Charset;
    use crate::types::NumberOptions;

    fn number(min: f64, max: f64) -> Options {
        Options::number(NumberOptions::bounded(min, max)).unwrap()
    }

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn roundtrip(opts: &ObjectOptions, items: &[Value]) -> Vec<Value> {
        let mut enc = Encoder::new(true);
        opts.encode(items, &mut enc).unwrap();
        let text = enc.pack(&Charset::default()).unwrap();
        let mut dec = Decoder::new(&text, Charset::default(), true);
        let out = opts.decode(items.len(), &mut dec).unwrap();
        dec.finish().unwrap();
        out
    }

    #[test]
    fn test_optional_field_left_unset() {
        let opts = ObjectOptions::templated(
            Template::new()
                .field("a", number(0.0, 10.0))
                .optional_field("b", number(0.0, 10.0)),
        );
        let source = Value::Record(record(&[("a", 5.into())]));
        assert_eq!(roundtrip(&opts, &[source.clone()]), vec![source]);
    }

    #[test]
    fn test_missing_required_field_is_fatal() {
        let opts = ObjectOptions::templated(Template::new().field("a", number(0.0, 10.0)));
        for strict in [true, false] {
            let err = opts
                .encode(&[Value::Record(Record::new())], &mut Encoder::new(strict))
                .unwrap_err();
            assert_eq!(err, CodecError::MissingField("a".into()));
        }
    }

    #[test]
    fn test_nested_template() {
        let opts = ObjectOptions::templated(
            Template::new().field("id", number(0.0, 999.0)).nested(
                "pos",
                Template::new()
                    .field("x", number(-50.0, 50.0))
                    .field("y", number(-50.0, 50.0)),
            ),
        );
        let item = Value::Record(record(&[
            ("id", 17.into()),
            (
                "pos",
                Value::Record(record(&[("x", (-3).into()), ("y", 44.into())])),
            ),
        ]));
        assert_eq!(roundtrip(&opts, &[item.clone()]), vec![item]);
    }

    #[test]
    fn test_sorted_fields_change_order_not_content() {
        let template = Template::new()
            .field("z", number(0.0, 1.0))
            .field("a", number(0.0, 7.0));
        let item = Value::Record(record(&[("z", 1.into()), ("a", 6.into())]));

        let mut plain = Encoder::new(true);
        ObjectOptions::templated(template.clone())
            .encode(&[item.clone()], &mut plain)
            .unwrap();
        let mut sorted_opts = ObjectOptions::templated(template);
        sorted_opts.sort = true;
        let mut sorted = Encoder::new(true);
        sorted_opts.encode(&[item.clone()], &mut sorted).unwrap();

        let radices = |e: &Encoder| e.digits().radices();
        assert_eq!(radices(&plain), vec![2, 8]);
        assert_eq!(radices(&sorted), vec![8, 2]);
        assert_eq!(roundtrip(&sorted_opts, &[item.clone()]), vec![item]);
    }

    #[test]
    fn test_self_describing() {
        let item = Value::Record(record(&[
            ("name", "widget".into()),
            ("count", 3.into()),
            ("ratio", 0.25.into()),
            ("ok", true.into()),
            ("gone", Value::Absent),
            ("inner", Value::Record(record(&[("k", "v".into())]))),
        ]));
        assert_eq!(roundtrip(&ObjectOptions::default(), &[item.clone()]), vec![item]);
    }

    #[test]
    fn test_bases() {
        let opts = ObjectOptions::templated(Template::new().field("a", number(0.0, 9.0)));
        let items = [
            Value::Record(record(&[("a", 1.into())])),
            Value::Record(record(&[("a", 2.into())])),
        ];
        let mut enc = Encoder::new(true);
        opts.encode(&items, &mut enc).unwrap();
        let text = enc.pack(&Charset::default()).unwrap();
        let decode = |opts: &ObjectOptions| {
            opts.decode(2, &mut Decoder::new(&text, Charset::default(), true))
        };

        let shared = opts
            .clone()
            .with_base(ObjectBase::Shared(record(&[("tag", "x".into())])));
        let out = decode(&shared).unwrap();
        assert_eq!(out[1], Value::Record(record(&[("a", 2.into()), ("tag", "x".into())])));

        let factory = opts
            .clone()
            .with_base(ObjectBase::Factory(Arc::new(|| record(&[("f", true.into())]))));
        let out = decode(&factory).unwrap();
        assert_eq!(out[0], Value::Record(record(&[("a", 1.into()), ("f", true.into())])));

        let per_item = opts
            .clone()
            .with_base(ObjectBase::PerItem(vec![record(&[("n", 0.into())])]));
        assert!(matches!(decode(&per_item), Err(CodecError::MissingField(_))));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut opts = ObjectOptions::templated(
            Template::new()
                .field("a", number(0.0, 1.0))
                .field("a", number(0.0, 1.0)),
        );
        assert!(matches!(opts.validate(), Err(CodecError::InvalidOptions(_))));
    }
}
