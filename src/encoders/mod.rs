pub mod algorithms;
pub mod session;
