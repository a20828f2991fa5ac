//! `cpufit-binding` library crate.
//!
//! `FitBinding` adapts a nonlinear fitting routine with the Cpufit call
//! contract to a host environment of dynamically typed arrays: it checks
//! arity, decodes the 13 positional inputs into typed buffers, invokes the
//! routine once and hands back the 5 outputs as host arrays.
//!
//! The binary (`cpufit`) is a thin wrapper around this library so that:
//!
//! - the binding is testable without spawning processes
//! - routines (native library, pure-Rust reference) plug in behind one trait

pub mod app;
pub mod binding;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod fit;
pub mod host;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod routine;

pub use binding::{FitBinding, FitError};
pub use config::BindingConfig;
pub use host::HostArray;
pub use routine::FitRoutine;
