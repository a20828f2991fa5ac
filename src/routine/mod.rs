//! The fitting routine as seen from the binding.
//!
//! The binding consumes one synchronous entry point: all inputs as borrowed,
//! strongly typed buffers, all outputs as caller-allocated mutable buffers.
//! A failing call returns its status together with the library's message, so
//! nothing has to be fetched from global state afterwards.

use thiserror::Error;

pub mod ids;
#[cfg(feature = "native")]
pub mod native;

pub use ids::*;
#[cfg(feature = "native")]
pub use native::NativeCpufit;

/// Borrowed, decoded inputs for one call.
#[derive(Debug, Clone, Copy)]
pub struct FitRequest<'a> {
    pub n_fits: usize,
    pub n_points: usize,
    /// `n_fits * n_points` samples, one fit after another.
    pub data: &'a [f64],
    /// Same layout as `data`; `None` means unweighted.
    pub weights: Option<&'a [f64]>,
    pub model_id: i32,
    /// `n_fits * n_parameters` initial guesses, one fit after another.
    pub initial_parameters: &'a [f64],
    pub tolerance: f64,
    pub max_n_iterations: i32,
    /// One flag per model parameter; non-zero means "fit", zero means "hold".
    pub parameters_to_fit: &'a [i32],
    pub estimator_id: i32,
    pub user_info_size: usize,
    pub user_info: &'a [u8],
}

/// Caller-allocated output buffers, filled in place by the routine.
#[derive(Debug)]
pub struct FitOutputs<'a> {
    pub parameters: &'a mut [f64],
    pub states: &'a mut [i32],
    pub chi_squares: &'a mut [f64],
    pub n_iterations: &'a mut [i32],
    /// Per-fit diagnostic trace, `n_fits * capacity` values.
    pub lambda_info: &'a mut [f64],
}

/// A non-OK return from the routine, carrying the library's error text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RoutineError {
    pub state: ReturnState,
    pub message: String,
}

impl RoutineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            state: ReturnState::Error,
            message: message.into(),
        }
    }
}

/// A nonlinear fitting routine with the library's call contract.
///
/// Implementations must either fill every output buffer and return `Ok`, or
/// return an error; callers treat output contents as undefined on error.
pub trait FitRoutine {
    fn fit(&self, request: &FitRequest<'_>, outputs: &mut FitOutputs<'_>)
    -> Result<(), RoutineError>;
}

impl<R: FitRoutine + ?Sized> FitRoutine for &R {
    fn fit(
        &self,
        request: &FitRequest<'_>,
        outputs: &mut FitOutputs<'_>,
    ) -> Result<(), RoutineError> {
        (**self).fit(request, outputs)
    }
}

impl<R: FitRoutine + ?Sized> FitRoutine for Box<R> {
    fn fit(
        &self,
        request: &FitRequest<'_>,
        outputs: &mut FitOutputs<'_>,
    ) -> Result<(), RoutineError> {
        (**self).fit(request, outputs)
    }
}
