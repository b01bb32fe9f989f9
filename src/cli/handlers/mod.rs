pub mod charsets;
pub mod decode;
pub mod encode;
