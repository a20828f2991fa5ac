//! Bindings to the C Cpufit library (`libCpufit`).
//!
//! The C entry point trusts every pointer it is given, so the safe wrapper
//! checks buffer lengths against the sizes the library will touch before the
//! call. The library reports failures through a process-wide "last error"
//! string; it is read once, right after a failing call, and moved into the
//! returned `RoutineError`.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

use tracing::debug;

use crate::routine::{FitOutputs, FitRequest, FitRoutine, ModelId, ReturnState, RoutineError};

/// Per-fit diagnostic slots the native library writes unconditionally.
pub const NATIVE_LAMBDA_CAPACITY: usize = 10_000;

#[link(name = "Cpufit")]
unsafe extern "C" {
    fn cpufit(
        n_fits: usize,
        n_points: usize,
        data: *const f64,
        weights: *const f64,
        model_id: c_int,
        initial_parameters: *const f64,
        tolerance: f64,
        max_n_iterations: c_int,
        parameters_to_fit: *const c_int,
        estimator_id: c_int,
        user_info_size: usize,
        user_info: *const c_char,
        output_parameters: *mut f64,
        output_states: *mut c_int,
        output_chi_squares: *mut f64,
        output_n_iterations: *mut c_int,
        lambda_info: *mut f64,
    ) -> c_int;

    fn cpufit_get_last_error() -> *const c_char;
}

/// The native library as a `FitRoutine`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCpufit;

impl NativeCpufit {
    pub fn new() -> Self {
        Self
    }
}

impl FitRoutine for NativeCpufit {
    fn fit(
        &self,
        request: &FitRequest<'_>,
        outputs: &mut FitOutputs<'_>,
    ) -> Result<(), RoutineError> {
        check_extents(request, outputs)?;

        let weights = request.weights.map_or(std::ptr::null(), <[f64]>::as_ptr);
        let user_info = if request.user_info_size == 0 {
            std::ptr::null()
        } else {
            request.user_info.as_ptr().cast::<c_char>()
        };

        // SAFETY: `check_extents` guarantees every buffer covers the region the
        // library reads or writes for this (n_fits, n_points, model) triple.
        let status = unsafe {
            cpufit(
                request.n_fits,
                request.n_points,
                request.data.as_ptr(),
                weights,
                request.model_id,
                request.initial_parameters.as_ptr(),
                request.tolerance,
                request.max_n_iterations,
                request.parameters_to_fit.as_ptr(),
                request.estimator_id,
                request.user_info_size,
                user_info,
                outputs.parameters.as_mut_ptr(),
                outputs.states.as_mut_ptr(),
                outputs.chi_squares.as_mut_ptr(),
                outputs.n_iterations.as_mut_ptr(),
                outputs.lambda_info.as_mut_ptr(),
            )
        };

        match ReturnState::from_raw(status) {
            ReturnState::Ok => Ok(()),
            ReturnState::Error => {
                let message = last_error();
                debug!(status, %message, "cpufit returned an error");
                Err(RoutineError {
                    state: ReturnState::Error,
                    message,
                })
            }
        }
    }
}

fn last_error() -> String {
    // SAFETY: the library returns either null or a NUL-terminated string it
    // owns, valid until the next call into the library on this process.
    unsafe {
        let ptr = cpufit_get_last_error();
        if ptr.is_null() {
            String::new()
        } else {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }
}

fn check_extents(request: &FitRequest<'_>, outputs: &FitOutputs<'_>) -> Result<(), RoutineError> {
    let model = ModelId::from_raw(request.model_id)
        .ok_or_else(|| RoutineError::new(format!("invalid model ID: {}", request.model_id)))?;
    let n_parameters = model.n_parameters();

    let samples = extent(request.n_fits, request.n_points)?;
    let parameters = extent(request.n_fits, n_parameters)?;
    let lambda = extent(request.n_fits, NATIVE_LAMBDA_CAPACITY)?;

    let checks: [(&str, usize, usize); 10] = [
        ("data", request.data.len(), samples),
        (
            "weights",
            request.weights.map_or(samples, <[f64]>::len),
            samples,
        ),
        ("initial_parameters", request.initial_parameters.len(), parameters),
        ("parameters_to_fit", request.parameters_to_fit.len(), n_parameters),
        ("user_info", request.user_info.len(), request.user_info_size),
        ("output_parameters", outputs.parameters.len(), parameters),
        ("output_states", outputs.states.len(), request.n_fits),
        ("output_chi_squares", outputs.chi_squares.len(), request.n_fits),
        ("output_n_iterations", outputs.n_iterations.len(), request.n_fits),
        ("lambda_info", outputs.lambda_info.len(), lambda),
    ];
    for (name, actual, required) in checks {
        if actual < required {
            return Err(RoutineError::new(format!(
                "{name} holds {actual} elements, the native routine needs {required}"
            )));
        }
    }
    Ok(())
}

fn extent(a: usize, b: usize) -> Result<usize, RoutineError> {
    a.checked_mul(b)
        .ok_or_else(|| RoutineError::new("buffer size overflows usize"))
}
