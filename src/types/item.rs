use crate::encoders::algorithms::errors::{CodecError, Result};
use crate::encoders::algorithms::radix::{DigitSink, DigitSource};
use crate::encoders::session::{Decoder, Encoder};
use crate::types::TypeModule;
use crate::value::Value;

/// One value out of a fixed list, written as its index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemOptions {
    pub list: Vec<Value>,
    pub sort: bool,
}

impl ItemOptions {
    pub fn new(list: Vec<Value>) -> Self {
        Self { list, sort: false }
    }

    pub fn sorted(mut self) -> Self {
        self.sort = true;
        self
    }
}

impl TypeModule for ItemOptions {
    fn name(&self) -> &str {
        "item"
    }

    fn validate(&mut self) -> Result<()> {
        if self.list.is_empty() {
            return Err(CodecError::InvalidOptions(
                "item list must not be empty".to_string(),
            ));
        }
        if self.sort {
            self.list.sort_by(|a, b| a.total_cmp(b));
        }
        Ok(())
    }

    fn encode(&self, items: &[Value], enc: &mut Encoder) -> Result<()> {
        let radix = self.list.len() as u64;
        for item in items {
            let index = match self.list.iter().position(|v| v == item) {
                Some(i) => i,
                None => enc.coerce(
                    CodecError::RangeOrStepViolation(format!("{} is not in the item list", item)),
                    || 0,
                )?,
            };
            enc.compose(index as u64, radix)?;
        }
        Ok(())
    }

    fn decode(&self, count: usize, dec: &mut Decoder) -> Result<Vec<Value>> {
        let radix = self.list.len() as u64;
        (0..count)
            .map(|_| {
                let index = dec.parse(radix)?;
                self.list.get(index as usize).cloned().ok_or_else(|| {
                    CodecError::InvalidValue(format!("item index {} out of list", index))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::charset::Charset;

    fn colors() -> ItemOptions {
        let mut opts = ItemOptions::new(vec!["red".into(), "green".into(), "blue".into()]);
        opts.validate().unwrap();
        opts
    }

    #[test]
    fn test_roundtrip() {
        let opts = colors();
        let items = vec![Value::from("blue"), Value::from("red")];
        let mut enc = Encoder::new(true);
        opts.encode(&items, &mut enc).unwrap();
        let text = enc.pack(&Charset::default()).unwrap();
        let mut dec = Decoder::new(&text, Charset::default(), true);
        assert_eq!(opts.decode(2, &mut dec).unwrap(), items);
    }

    #[test]
    fn test_unknown_item() {
        let opts = colors();
        let err = opts
            .encode(&[Value::from("mauve")], &mut Encoder::new(true))
            .unwrap_err();
        assert!(matches!(err, CodecError::RangeOrStepViolation(_)));

        let mut lenient = Encoder::new(false);
        opts.encode(&[Value::from("mauve")], &mut lenient).unwrap();
        assert_eq!(lenient.digits().iter().next().map(|d| d.value()), Some(0));
    }

    #[test]
    fn test_sort_orders_list() {
        let mut opts = ItemOptions::new(vec![3.into(), "a".into(), 1.into()]).sorted();
        opts.validate().unwrap();
        assert_eq!(
            opts.list,
            vec![Value::from(1), Value::from(3), Value::from("a")]
        );
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(ItemOptions::default().validate().is_err());
    }

    #[test]
    fn test_single_item_writes_nothing() {
        let mut opts = ItemOptions::new(vec![true.into()]);
        opts.validate().unwrap();
        let mut enc = Encoder::new(true);
        opts.encode(&[Value::Flag(true)], &mut enc).unwrap();
        assert!(enc.digits().is_empty());
    }
}
