//! Reference fitting routine.
//!
//! Responsibilities:
//!
//! - score parameters under LSE / MLE (`estimator`)
//! - run Levenberg–Marquardt for one fit (`lm`)
//! - validate requests and fan fits out across threads (`reference`)

pub mod estimator;
pub mod lm;
pub mod reference;

pub use estimator::*;
pub use lm::*;
pub use reference::*;
