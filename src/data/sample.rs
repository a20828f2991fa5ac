//! Synthetic fit problems with known ground truth.
//!
//! Each fit draws its true parameters around a model-specific baseline that
//! depends on the point layout, evaluates the model, then adds noise:
//! Gaussian for LSE, Poisson counts for MLE. Initial guesses are the truth
//! perturbed by a few percent, so a healthy routine converges.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Normal, Poisson};

use crate::error::AppError;
use crate::host::HostCall;
use crate::models::{Point, predict};
use crate::routine::{EstimatorId, ModelId};

/// Relative spread of the true parameters around the baseline.
const TRUTH_JITTER: f64 = 0.05;
/// Relative offset of the initial guess from the truth.
const GUESS_JITTER: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub model: ModelId,
    pub estimator: EstimatorId,
    pub n_fits: usize,
    pub n_points: usize,
    pub seed: u64,
    /// Standard deviation of the Gaussian noise (LSE only).
    pub noise: f64,
    pub tolerance: f64,
    pub max_n_iterations: i32,
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub call: HostCall,
    /// `n_fits * n_parameters` true parameters, one fit after another.
    pub truth: Vec<f64>,
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.n_fits == 0 {
        return Err(AppError::usage("Number of fits must be > 0."));
    }
    let p = config.model.n_parameters();
    if config.n_points < p {
        return Err(AppError::usage(format!(
            "{} needs at least {p} points per fit.",
            config.model.display_name()
        )));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::usage("Noise level must be finite and >= 0."));
    }

    let points = layout(config.model, config.n_points)?;
    let baseline = baseline_parameters(config.model, config.estimator, &points);

    let mut rng = StdRng::seed_from_u64(sample_seed(config));
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::usage(format!("Noise distribution error: {e}")))?;

    let mut data = Vec::with_capacity(config.n_fits * config.n_points);
    let mut truth = Vec::with_capacity(config.n_fits * p);
    let mut initial = Vec::with_capacity(config.n_fits * p);

    for _ in 0..config.n_fits {
        let fit_truth: Vec<f64> = baseline
            .iter()
            .map(|&b| b * (1.0 + TRUTH_JITTER * normal.sample(&mut rng)))
            .collect();
        for &value in &fit_truth {
            let sign = if rng.r#gen::<bool>() { 1.0 } else { -1.0 };
            initial.push(value * (1.0 + sign * GUESS_JITTER));
        }

        for &point in &points {
            let clean = predict(config.model, &fit_truth, point);
            let observed = match config.estimator {
                EstimatorId::Lse => clean + config.noise * normal.sample(&mut rng),
                EstimatorId::Mle => poisson_count(&mut rng, clean)?,
            };
            data.push(observed);
        }
        truth.extend(fit_truth);
    }

    let call = HostCall {
        data,
        weights: None,
        n_fits: config.n_fits,
        n_points: config.n_points,
        tolerance: config.tolerance,
        max_n_iterations: config.max_n_iterations,
        estimator_id: config.estimator.raw(),
        initial_parameters: initial,
        parameters_to_fit: vec![1; p],
        model_id: config.model.raw(),
        n_parameters: p as i32,
        user_info: Vec::new(),
    };

    Ok(SampleData { call, truth })
}

/// Coordinates the routine will use for each point: the index for 1D models,
/// a row-major square grid for 2D models.
pub fn layout(model: ModelId, n_points: usize) -> Result<Vec<Point>, AppError> {
    if model.dimensions() == 1 {
        return Ok((0..n_points)
            .map(|i| Point { x: i as f64, y: 0.0 })
            .collect());
    }

    let size = (n_points as f64).sqrt().round() as usize;
    if size * size != n_points {
        return Err(AppError::usage(format!(
            "{} needs a square number of points, got {n_points}.",
            model.display_name()
        )));
    }
    Ok((0..n_points)
        .map(|i| Point {
            x: (i % size) as f64,
            y: (i / size) as f64,
        })
        .collect())
}

/// A well-conditioned parameter set for the given layout.
fn baseline_parameters(model: ModelId, estimator: EstimatorId, points: &[Point]) -> Vec<f64> {
    let max_x = points.iter().map(|p| p.x).fold(0.0, f64::max);
    let max_y = points.iter().map(|p| p.y).fold(0.0, f64::max);
    let (cx, cy) = (max_x / 2.0, max_y / 2.0);
    let width = (max_x.max(max_y) / 8.0).max(1.0);

    // Counting data needs enough signal for the Poisson likelihood to be informative.
    let (amplitude, offset) = match estimator {
        EstimatorId::Lse => (10.0, 2.0),
        EstimatorId::Mle => (200.0, 20.0),
    };

    match model {
        ModelId::Gauss1d => vec![amplitude, cx, width, offset],
        ModelId::Gauss2d => vec![amplitude, cx, cy, width, offset],
        ModelId::Gauss2dElliptic | ModelId::Cauchy2dElliptic => {
            vec![amplitude, cx, cy, width, width * 1.4, offset]
        }
        ModelId::Gauss2dRotated => vec![amplitude, cx, cy, width, width * 1.4, offset, 0.3],
        ModelId::Linear1d => vec![offset, amplitude / max_x.max(1.0)],
    }
}

fn poisson_count(rng: &mut StdRng, mean: f64) -> Result<f64, AppError> {
    if mean <= 0.0 {
        return Ok(0.0);
    }
    let poisson = Poisson::new(mean)
        .map_err(|e| AppError::usage(format!("Poisson distribution error: {e}")))?;
    Ok(poisson.sample(rng))
}

fn sample_seed(config: &SampleConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    config.model.hash(&mut hasher);
    config.estimator.hash(&mut hasher);
    config.n_fits.hash(&mut hasher);
    config.n_points.hash(&mut hasher);
    config.noise.to_bits().hash(&mut hasher);
    hasher.finish()
}
