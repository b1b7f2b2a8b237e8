//! Error types

mod source;
mod store;

pub use source::*;
pub use store::*;
