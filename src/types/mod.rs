//! Type modules: one per kind of value the codec understands.
//!
//! Every module turns a slice of [`Value`]s into digits on an [`Encoder`]
//! and reads the same number of values back from a [`Decoder`]. Modules
//! never see packed text or the output charset.

pub mod any;
pub mod boolean;
pub mod date;
pub mod fraction;
pub mod item;
pub mod number;
pub mod object;
pub mod options;
pub mod string;

pub use any::AnyOptions;
pub use boolean::BooleanOptions;
pub use date::DateOptions;
pub use fraction::FractionOptions;
pub use item::ItemOptions;
pub use number::NumberOptions;
pub use object::{Field, FieldNode, ObjectBase, ObjectOptions, Template};
pub use options::{Hook, MAX_LIMIT, Options};
pub use string::StringOptions;

use crate::encoders::algorithms::errors::Result;
use crate::encoders::session::{Decoder, Encoder};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Encoding and decoding behaviour for one kind of value.
///
/// Implement this to plug a custom kind into [`Kind::custom`]. `validate`
/// runs once, before the module is first used, and may normalise the
/// module's own settings.
pub trait TypeModule: fmt::Debug + Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    fn validate(&mut self) -> Result<()>;

    fn encode(&self, items: &[Value], enc: &mut Encoder) -> Result<()>;

    fn decode(&self, count: usize, dec: &mut Decoder) -> Result<Vec<Value>>;
}

/// The type module an [`Options`] value dispatches to, with its settings.
#[derive(Debug, Clone)]
pub enum Kind {
    Number(NumberOptions),
    Text(StringOptions),
    Item(ItemOptions),
    Boolean(BooleanOptions),
    Fraction(FractionOptions),
    Date(DateOptions),
    Object(ObjectOptions),
    Any(AnyOptions),
    Custom(Arc<dyn TypeModule>),
}

impl Kind {
    /// Wraps a user module, validating it first.
    pub fn custom<M: TypeModule + 'static>(mut module: M) -> Result<Self> {
        module.validate()?;
        Ok(Kind::Custom(Arc::new(module)))
    }

    pub fn module(&self) -> &dyn TypeModule {
        match self {
            Kind::Number(m) => m,
            Kind::Text(m) => m,
            Kind::Item(m) => m,
            Kind::Boolean(m) => m,
            Kind::Fraction(m) => m,
            Kind::Date(m) => m,
            Kind::Object(m) => m,
            Kind::Any(m) => m,
            Kind::Custom(m) => m.as_ref(),
        }
    }

    /// Validates built-in settings in place. Custom modules were validated
    /// when wrapped.
    pub(crate) fn validate(&mut self) -> Result<()> {
        match self {
            Kind::Number(m) => m.validate(),
            Kind::Text(m) => m.validate(),
            Kind::Item(m) => m.validate(),
            Kind::Boolean(m) => m.validate(),
            Kind::Fraction(m) => m.validate(),
            Kind::Date(m) => m.validate(),
            Kind::Object(m) => m.validate(),
            Kind::Any(m) => m.validate(),
            Kind::Custom(_) => Ok(()),
        }
    }
}

/// Decodes exactly one value with `module`.
pub(crate) fn decode_single(module: &dyn TypeModule, dec: &mut Decoder) -> Result<Value> {
    Ok(module.decode(1, dec)?.into_iter().next().unwrap_or_default())
}
