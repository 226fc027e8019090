//! Error types

mod export;
mod preferences;

pub use export::*;
pub use preferences::*;
