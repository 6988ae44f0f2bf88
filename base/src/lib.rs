//! The `base` crate defines the Elliott 803 things which are useful
//! in both an emulator and other associated tools.  The idea is that
//! if you want to write, say, a cross-assembler, it would depend on
//! the base crate but would not need to depend on the emulator
//! library itself.

pub mod instruction;
pub mod ops;
pub mod prelude;
mod word;

pub use crate::word::*;
