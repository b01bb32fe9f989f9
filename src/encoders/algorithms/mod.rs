pub mod errors;
pub mod radix;
pub mod term;

// Re-export error types for public API
pub use errors::{CharsetNotFoundError, CodecError, SymbolFault, find_closest_charset};
