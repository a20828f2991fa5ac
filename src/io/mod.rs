//! Input/output helpers.
//!
//! - call JSON read/write (`call`)
//! - result exports (JSON/CSV) (`export`)

pub mod call;
pub mod export;

pub use call::*;
pub use export::*;
