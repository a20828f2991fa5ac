//! Damped normal-equation solver.
//!
//! Each Levenberg–Marquardt iteration solves
//!
//! ```text
//! (H + λ·diag(H)) δ = g
//! ```
//!
//! where `H` is the (approximate) hessian of the objective over the fitted
//! parameters and `g` the matching gradient term. Systems are tiny (at most
//! seven unknowns), so we factor densely with nalgebra.

use nalgebra::{DMatrix, DVector};

/// Solve the damped system, returning `None` if it is singular.
///
/// Scaling the diagonal (rather than adding `λI`) keeps the step invariant to
/// parameter units; a zero diagonal entry therefore stays zero and makes the
/// system singular, which is reported to the caller.
pub fn solve_damped(hessian: &DMatrix<f64>, gradient: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let n = gradient.len();
    if n == 0 || hessian.nrows() != n || hessian.ncols() != n {
        return None;
    }

    let mut damped = hessian.clone();
    for j in 0..n {
        damped[(j, j)] *= 1.0 + lambda;
    }

    // The damped hessian is symmetric positive definite in the well-posed case;
    // fall back to LU for the semi-definite corner cases Cholesky rejects.
    let delta = match damped.clone().cholesky() {
        Some(chol) => chol.solve(gradient),
        None => damped.lu().solve(gradient)?,
    };

    if delta.iter().all(|v| v.is_finite()) {
        Some(delta)
    } else {
        None
    }
}
