//! Levenberg–Marquardt loop for a single fit.
//!
//! Given an objective and initial parameters we iterate:
//!
//! - solve the damped system `(H + λ·diag(H)) δ = g`
//! - score the trial parameters `p + δ`
//! - accept (λ /= 10) if χ² did not increase, otherwise reject (λ *= 10)
//!
//! and stop when an accepted step changes χ² by less than
//! `tolerance · max(1, χ²)`, when the damped system becomes singular, or when
//! the iteration budget runs out.

use crate::fit::estimator::{NonPositiveModel, Objective};
use crate::math::solve_damped;
use crate::routine::FitState;

/// Damping factor at the start of every fit.
pub const INITIAL_LAMBDA: f64 = 1e-3;

const LAMBDA_UP: f64 = 10.0;
const LAMBDA_DOWN: f64 = 0.1;

/// Stopping rules for one fit.
#[derive(Debug, Clone, Copy)]
pub struct LmSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Number of per-iteration λ values to keep in `FitOutcome::lambda_trace`.
    pub trace_capacity: usize,
}

/// Result of one fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub parameters: Vec<f64>,
    pub state: FitState,
    pub chi_square: f64,
    pub iterations: usize,
    /// λ at the start of each iteration, truncated to the trace capacity.
    pub lambda_trace: Vec<f64>,
}

/// Run LM from `initial` and return the final parameters and diagnostics.
pub fn fit_single(objective: &Objective<'_>, initial: &[f64], settings: &LmSettings) -> FitOutcome {
    let mut params = initial.to_vec();
    let mut lambda_trace = Vec::with_capacity(settings.trace_capacity.min(settings.max_iterations));

    let mut current = match objective.evaluate(&params) {
        Ok(acc) => acc,
        Err(NonPositiveModel) => {
            return FitOutcome {
                parameters: params,
                state: FitState::NegCurvatureMle,
                chi_square: f64::NAN,
                iterations: 0,
                lambda_trace,
            };
        }
    };

    let mut lambda = INITIAL_LAMBDA;
    let mut state = FitState::MaxIteration;
    let mut iterations = 0;

    for iteration in 0..settings.max_iterations {
        iterations = iteration + 1;
        if lambda_trace.len() < settings.trace_capacity {
            lambda_trace.push(lambda);
        }

        let Some(delta) = solve_damped(&current.hessian, &current.gradient, lambda) else {
            state = FitState::SingularHessian;
            break;
        };

        let mut trial = params.clone();
        for (&j, step) in objective.fitted.iter().zip(delta.iter()) {
            trial[j] += step;
        }

        // A trial that drives the Poisson rate non-positive is just a bad step.
        let Ok(candidate) = objective.evaluate(&trial) else {
            lambda *= LAMBDA_UP;
            continue;
        };
        if !candidate.chi_square.is_finite() {
            lambda *= LAMBDA_UP;
            continue;
        }

        if candidate.chi_square > current.chi_square {
            lambda *= LAMBDA_UP;
            continue;
        }

        let change = current.chi_square - candidate.chi_square;
        let converged = change < settings.tolerance * candidate.chi_square.max(1.0);
        params = trial;
        current = candidate;
        lambda *= LAMBDA_DOWN;

        if converged {
            state = FitState::Converged;
            break;
        }
    }

    FitOutcome {
        parameters: params,
        state,
        chi_square: current.chi_square,
        iterations,
        lambda_trace,
    }
}
