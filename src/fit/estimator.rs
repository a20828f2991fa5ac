//! Objective functions (estimators) for a single fit.
//!
//! Given model values `f_i`, data `d_i` and weights `w_i`, each estimator
//! produces a goodness-of-fit value χ² together with the gradient term `g` and
//! the Gauss–Newton hessian `H` used by the LM step `H δ = g`:
//!
//! - LSE: `χ² = Σ w_i (d_i − f_i)²`, `g_j = Σ w_i (d_i − f_i) ∂f_i/∂p_j`,
//!   `H_jk = Σ w_i ∂f_i/∂p_j ∂f_i/∂p_k`
//! - MLE (Poisson): `χ² = 2 Σ (f_i − d_i) − 2 Σ_{d_i>0} d_i ln(f_i/d_i)`,
//!   `g_j = Σ (d_i/f_i − 1) ∂f_i/∂p_j`, `H_jk = Σ d_i/f_i² ∂f_i/∂p_j ∂f_i/∂p_k`
//!
//! Both `g` and `H` are half the true derivatives of χ², which cancels in the
//! step. Only fitted parameters get rows/columns.

use nalgebra::{DMatrix, DVector};

use crate::models::{Point, evaluate};
use crate::routine::{EstimatorId, ModelId};

/// Largest parameter count across all models.
pub const MAX_PARAMETERS: usize = 7;

/// χ², gradient and hessian at one parameter vector.
#[derive(Debug, Clone)]
pub struct Accumulation {
    pub chi_square: f64,
    pub gradient: DVector<f64>,
    pub hessian: DMatrix<f64>,
}

/// The model produced a non-positive value where the Poisson likelihood
/// needs a positive rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonPositiveModel;

/// Everything needed to score one fit's parameters.
#[derive(Debug, Clone, Copy)]
pub struct Objective<'a> {
    pub model: ModelId,
    pub estimator: EstimatorId,
    pub points: &'a [Point],
    pub data: &'a [f64],
    /// Ignored by MLE.
    pub weights: Option<&'a [f64]>,
    /// Indices of the parameters being fitted.
    pub fitted: &'a [usize],
}

impl Objective<'_> {
    pub fn evaluate(&self, params: &[f64]) -> Result<Accumulation, NonPositiveModel> {
        let m = self.fitted.len();
        let mut chi_square = 0.0;
        let mut gradient = DVector::<f64>::zeros(m);
        let mut hessian = DMatrix::<f64>::zeros(m, m);
        let mut derivatives = [0.0; MAX_PARAMETERS];

        for (i, (&point, &d)) in self.points.iter().zip(self.data).enumerate() {
            let f = evaluate(self.model, params, point, &mut derivatives);

            // (contribution to χ², gradient scale, hessian scale)
            let (chi, g_scale, h_scale) = match self.estimator {
                EstimatorId::Lse => {
                    let w = self.weights.map_or(1.0, |w| w[i]);
                    let r = d - f;
                    (w * r * r, w * r, w)
                }
                EstimatorId::Mle => {
                    if !(f > 0.0) {
                        return Err(NonPositiveModel);
                    }
                    let log_term = if d > 0.0 { 2.0 * d * (f / d).ln() } else { 0.0 };
                    (2.0 * (f - d) - log_term, d / f - 1.0, d / (f * f))
                }
            };

            chi_square += chi;
            for (a, &ja) in self.fitted.iter().enumerate() {
                let da = derivatives[ja];
                gradient[a] += g_scale * da;
                for (b, &jb) in self.fitted.iter().enumerate().take(a + 1) {
                    hessian[(a, b)] += h_scale * da * derivatives[jb];
                }
            }
        }

        for a in 0..m {
            for b in 0..a {
                hessian[(b, a)] = hessian[(a, b)];
            }
        }

        Ok(Accumulation {
            chi_square,
            gradient,
            hessian,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_points(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point { x: i as f64, y: 0.0 }).collect()
    }

    #[test]
    fn lse_chi_square_is_weighted_sum_of_squares() {
        let points = line_points(3);
        let data = [1.0, 2.0, 4.0];
        let weights = [1.0, 2.0, 0.5];
        let objective = Objective {
            model: ModelId::Linear1d,
            estimator: EstimatorId::Lse,
            points: &points,
            data: &data,
            weights: Some(&weights),
            fitted: &[0, 1],
        };
        // f = 1 + x -> residuals [0, 0, 1]
        let acc = objective.evaluate(&[1.0, 1.0]).unwrap();
        assert!((acc.chi_square - 0.5).abs() < 1e-12);
        // g = Σ w r ∂f: offset column -> 0.5, slope column -> 0.5 * 2
        assert!((acc.gradient[0] - 0.5).abs() < 1e-12);
        assert!((acc.gradient[1] - 1.0).abs() < 1e-12);
        assert_eq!(acc.hessian[(0, 1)], acc.hessian[(1, 0)]);
    }

    #[test]
    fn mle_is_zero_at_a_perfect_positive_fit() {
        let points = line_points(4);
        let data = [2.0, 3.0, 4.0, 5.0];
        let objective = Objective {
            model: ModelId::Linear1d,
            estimator: EstimatorId::Mle,
            points: &points,
            data: &data,
            weights: None,
            fitted: &[0, 1],
        };
        let acc = objective.evaluate(&[2.0, 1.0]).unwrap();
        assert!(acc.chi_square.abs() < 1e-12);
        assert!(acc.gradient.iter().all(|g| g.abs() < 1e-12));
    }

    #[test]
    fn mle_rejects_non_positive_model_values() {
        let points = line_points(2);
        let data = [1.0, 1.0];
        let objective = Objective {
            model: ModelId::Linear1d,
            estimator: EstimatorId::Mle,
            points: &points,
            data: &data,
            weights: None,
            fitted: &[0],
        };
        assert_eq!(objective.evaluate(&[0.0, 0.0]).unwrap_err(), NonPositiveModel);
    }

    #[test]
    fn held_parameters_have_no_rows() {
        let points = line_points(3);
        let data = [0.0; 3];
        let objective = Objective {
            model: ModelId::Linear1d,
            estimator: EstimatorId::Lse,
            points: &points,
            data: &data,
            weights: None,
            fitted: &[1],
        };
        let acc = objective.evaluate(&[0.0, 0.0]).unwrap();
        assert_eq!(acc.gradient.len(), 1);
        assert_eq!(acc.hessian.shape(), (1, 1));
    }
}
