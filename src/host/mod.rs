//! Host-side value model.
//!
//! - dynamically typed arrays (`array`)
//! - typed call descriptions lowered to positional arguments (`call`)

pub mod array;
pub mod call;

pub use array::*;
pub use call::*;
