//! The prelude exports the structs needed to represent 803 machine
//! state.  Providing this prelude is the main purpose of the base
//! crate.
pub use super::instruction::*;
pub use super::word::*;
