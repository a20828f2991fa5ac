//! Model functions for the reference routine.
//!
//! Models are implemented as small, pure functions so that the fitter can stay
//! generic over the model id.

pub mod model;

pub use model::*;
