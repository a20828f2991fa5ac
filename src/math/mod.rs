//! Mathematical utilities: the damped linear solve behind each LM step.

pub mod solve;

pub use solve::*;
