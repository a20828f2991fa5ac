//! Reporting utilities: per-call statistics and formatted terminal output.

pub mod format;

pub use format::*;

use crate::binding::CallResults;
use crate::routine::FitState;

/// Aggregate view over the fits of one call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSummary {
    pub n_fits: usize,
    /// Fits per state, in `FitState::ALL` order.
    pub state_counts: [usize; 4],
    /// States the routine wrote that are not part of the known set.
    pub unknown_states: usize,
    pub mean_iterations: f64,
    pub max_iterations: i32,
    /// Mean chi-square over converged fits, `None` if none converged.
    pub mean_chi_square: Option<f64>,
}

pub fn summarize(results: &CallResults) -> CallSummary {
    let mut state_counts = [0usize; 4];
    let mut unknown_states = 0;
    let mut chi_sum = 0.0;

    for (state, chi) in results.fit_states().zip(&results.chi_squares) {
        match state {
            Some(state) => {
                let slot = FitState::ALL.iter().position(|s| *s == state).unwrap_or_default();
                state_counts[slot] += 1;
                if state == FitState::Converged {
                    chi_sum += chi;
                }
            }
            None => unknown_states += 1,
        }
    }

    let n_fits = results.n_fits();
    let converged = state_counts[0];
    let mean_iterations = if n_fits == 0 {
        0.0
    } else {
        results.n_iterations.iter().map(|&n| n as f64).sum::<f64>() / n_fits as f64
    };

    CallSummary {
        n_fits,
        state_counts,
        unknown_states,
        mean_iterations,
        max_iterations: results.n_iterations.iter().copied().max().unwrap_or(0),
        mean_chi_square: (converged > 0).then(|| chi_sum / converged as f64),
    }
}

/// Mean absolute deviation of each fitted parameter from a known truth.
///
/// Returns `None` when the truth does not line up with the results.
pub fn parameter_errors(results: &CallResults, truth: &[f64]) -> Option<Vec<f64>> {
    let n_fits = results.n_fits();
    if n_fits == 0 || truth.len() != results.parameters.len() {
        return None;
    }
    let p = truth.len() / n_fits;

    let mut errors = vec![0.0; p];
    for (i, (fitted, actual)) in results.parameters.iter().zip(truth).enumerate() {
        errors[i % p] += (fitted - actual).abs();
    }
    errors.iter_mut().for_each(|e| *e /= n_fits as f64);
    Some(errors)
}
