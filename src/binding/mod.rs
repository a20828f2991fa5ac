//! `FitBinding`: the host-facing entry point.
//!
//! One call runs three phases, in order, on the calling thread:
//!
//! - arity gate: exactly 13 inputs and 5 requested outputs (`gate`)
//! - argument decode into typed, borrowed buffers (`marshal`)
//! - output allocation, one routine invocation, and conversion of the five
//!   outputs back to host arrays (`results`)
//!
//! Failures at any phase abort the call with a `FitError`; partial results are
//! never returned.

pub mod error;
pub mod gate;
pub mod marshal;
pub mod results;

pub use error::*;
pub use gate::*;
pub use marshal::*;
pub use results::*;

use tracing::{debug, warn};

use crate::config::BindingConfig;
use crate::host::HostArray;
use crate::routine::FitRoutine;

#[derive(Debug, Clone)]
pub struct FitBinding<R> {
    routine: R,
    config: BindingConfig,
}

impl<R: FitRoutine> FitBinding<R> {
    pub fn new(routine: R) -> Self {
        Self::with_config(routine, BindingConfig::default())
    }

    pub fn with_config(routine: R, config: BindingConfig) -> Self {
        Self { routine, config }
    }

    pub fn routine(&self) -> &R {
        &self.routine
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Run one call the way the host does: positional inputs in, five
    /// positional outputs back.
    pub fn call(&self, n_outputs: usize, inputs: &[HostArray]) -> Result<Vec<HostArray>, FitError> {
        check_arity(inputs.len(), n_outputs)?;
        let arguments = CallArguments::decode(inputs, &self.config)?;
        let results = self.fit(&arguments)?;
        Ok(results.into_host_arrays())
    }

    /// Allocate outputs for already decoded arguments and invoke the routine once.
    pub fn fit(&self, arguments: &CallArguments<'_>) -> Result<CallResults, FitError> {
        let mut results = CallResults::allocate(
            arguments.n_fits,
            arguments.n_parameters,
            self.config.diagnostic_capacity,
        )?;

        debug!(
            n_fits = arguments.n_fits,
            diagnostic_capacity = self.config.diagnostic_capacity,
            "invoking fit routine"
        );
        if let Err(err) = self.routine.fit(&arguments.request(), &mut results.outputs()) {
            let err = FitError::from(err);
            warn!(identifier = err.identifier(), "fit routine failed: {err}");
            return Err(err);
        }

        debug!(n_fits = results.n_fits(), "fit routine returned OK");
        Ok(results)
    }
}
