//! Row and value model shared by every engine.

mod row;
mod value;

pub use row::*;
pub use value::*;
