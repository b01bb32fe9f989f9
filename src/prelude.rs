//! Convenient re-exports for common usage.
//!
//! This module provides a single import for the most commonly used types
//! and functions in radixpack.
//!
//! # Example
//!
//! ```
//! use radixpack::prelude::*;
//!
//! let registry = CharsetRegistry::load_default().unwrap();
//! let digits = registry.get_charset("digit").unwrap().build().unwrap();
//! let options = Options::from_json(r#"{"type": "number", "min": 0, "max": 999}"#).unwrap();
//! let text = encode(&[Value::from(123)], &options, &digits, true).unwrap();
//! assert_eq!(text, "123");
//! ```

pub use crate::{
    // Alphabets
    Charset,
    CharsetRegistry,
    // Errors
    CodecError,
    // Sessions
    Decoder,
    Encoder,
    // Schema
    Kind,
    Options,
    Template,
    TypeModule,
    // Values
    Record,
    Value,
    decode,
    encode,
};
