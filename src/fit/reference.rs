//! Pure-Rust implementation of the fitting routine contract.
//!
//! Responsibilities:
//!
//! - validate the request the way the native library does (ids, counts,
//!   buffer extents) and fail with a descriptive message
//! - derive per-point coordinates (index grid or `user_info` x values)
//! - run the LM loop for every fit (parallel) and scatter the results into the
//!   caller's output buffers

use rayon::prelude::*;
use tracing::debug;

use crate::fit::estimator::Objective;
use crate::fit::lm::{FitOutcome, LmSettings, fit_single};
use crate::models::Point;
use crate::routine::{EstimatorId, FitOutputs, FitRequest, FitRoutine, ModelId, RoutineError};

const F64_BYTES: usize = std::mem::size_of::<f64>();

/// CPU Levenberg–Marquardt routine, parallel across fits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceCpufit;

impl ReferenceCpufit {
    pub fn new() -> Self {
        Self
    }
}

impl FitRoutine for ReferenceCpufit {
    fn fit(
        &self,
        request: &FitRequest<'_>,
        outputs: &mut FitOutputs<'_>,
    ) -> Result<(), RoutineError> {
        let plan = Plan::validate(request, outputs)?;
        debug!(
            model = plan.model.display_name(),
            estimator = plan.estimator.display_name(),
            n_fits = request.n_fits,
            n_points = request.n_points,
            fitted = plan.fitted.len(),
            "reference routine starting"
        );

        let outcomes: Vec<FitOutcome> = (0..request.n_fits)
            .into_par_iter()
            .map(|fit| plan.run(request, fit))
            .collect();

        let p = plan.model.n_parameters();
        let capacity = plan.settings.trace_capacity;
        for (fit, outcome) in outcomes.into_iter().enumerate() {
            outputs.parameters[fit * p..(fit + 1) * p].copy_from_slice(&outcome.parameters);
            outputs.states[fit] = outcome.state.raw();
            outputs.chi_squares[fit] = outcome.chi_square;
            outputs.n_iterations[fit] = outcome.iterations as i32;

            let trace = &mut outputs.lambda_info[fit * capacity..(fit + 1) * capacity];
            trace.fill(0.0);
            trace[..outcome.lambda_trace.len()].copy_from_slice(&outcome.lambda_trace);
        }

        Ok(())
    }
}

/// A validated request, ready to run.
struct Plan {
    model: ModelId,
    estimator: EstimatorId,
    fitted: Vec<usize>,
    settings: LmSettings,
    x_source: XSource,
    /// Side length of the square pixel grid for 2D models.
    grid_size: usize,
}

/// Where 1D models get their x coordinates from.
#[derive(Debug, Clone)]
enum XSource {
    Index,
    Shared(Vec<f64>),
    PerFit(Vec<f64>),
}

impl Plan {
    fn validate(request: &FitRequest<'_>, outputs: &FitOutputs<'_>) -> Result<Self, RoutineError> {
        let model = ModelId::from_raw(request.model_id)
            .ok_or_else(|| RoutineError::new(format!("invalid model ID: {}", request.model_id)))?;
        let estimator = EstimatorId::from_raw(request.estimator_id).ok_or_else(|| {
            RoutineError::new(format!("invalid estimator ID: {}", request.estimator_id))
        })?;

        let n_fits = request.n_fits;
        let n_points = request.n_points;
        let p = model.n_parameters();

        if n_fits == 0 {
            return Err(RoutineError::new("number of fits must be greater than zero"));
        }
        if n_points == 0 {
            return Err(RoutineError::new("number of points must be greater than zero"));
        }
        if !(request.tolerance.is_finite() && request.tolerance > 0.0) {
            return Err(RoutineError::new(format!(
                "tolerance must be a positive number, got {}",
                request.tolerance
            )));
        }
        if request.max_n_iterations <= 0 {
            return Err(RoutineError::new(format!(
                "maximum number of iterations must be positive, got {}",
                request.max_n_iterations
            )));
        }
        if request.parameters_to_fit.len() < p {
            return Err(RoutineError::new(format!(
                "parameters_to_fit holds {} flags, model {} has {p} parameters",
                request.parameters_to_fit.len(),
                model.display_name()
            )));
        }

        let fitted: Vec<usize> = (0..p).filter(|&j| request.parameters_to_fit[j] != 0).collect();
        if fitted.is_empty() {
            return Err(RoutineError::new("no parameters selected for fitting"));
        }
        if n_points < fitted.len() {
            return Err(RoutineError::new(format!(
                "number of points ({n_points}) is smaller than the number of fitted parameters ({})",
                fitted.len()
            )));
        }

        let samples = checked(n_fits, n_points)?;
        let parameters = checked(n_fits, p)?;
        at_least("data", request.data.len(), samples)?;
        if let Some(weights) = request.weights {
            at_least("weights", weights.len(), samples)?;
            if estimator == EstimatorId::Lse
                && weights[..samples].iter().any(|w| !(w.is_finite() && *w >= 0.0))
            {
                return Err(RoutineError::new("weights must be finite and non-negative"));
            }
        }
        at_least("initial_parameters", request.initial_parameters.len(), parameters)?;
        if request.user_info_size > request.user_info.len() {
            return Err(RoutineError::new(format!(
                "user_info_size ({}) exceeds the user_info buffer ({} bytes)",
                request.user_info_size,
                request.user_info.len()
            )));
        }

        // The output extents encode the caller's parameter count; a mismatch
        // with the model is how a wrong `n_parameters` surfaces here.
        if outputs.parameters.len() != parameters {
            return Err(RoutineError::new(format!(
                "output parameter buffer holds {} values, model {} needs {parameters} for {n_fits} fits",
                outputs.parameters.len(),
                model.display_name()
            )));
        }
        at_least("output_states", outputs.states.len(), n_fits)?;
        at_least("output_chi_squares", outputs.chi_squares.len(), n_fits)?;
        at_least("output_n_iterations", outputs.n_iterations.len(), n_fits)?;

        let grid_size = if model.dimensions() == 2 {
            let size = (n_points as f64).sqrt().round() as usize;
            if size * size != n_points {
                return Err(RoutineError::new(format!(
                    "n_points ({n_points}) must be a square number for {}",
                    model.display_name()
                )));
            }
            size
        } else {
            0
        };

        let user_info = &request.user_info[..request.user_info_size];
        let x_source = if model.dimensions() == 1 {
            if request.user_info_size == n_points * F64_BYTES {
                XSource::Shared(decode_f64(user_info))
            } else if request.user_info_size == samples * F64_BYTES {
                XSource::PerFit(decode_f64(user_info))
            } else {
                XSource::Index
            }
        } else {
            XSource::Index
        };

        let settings = LmSettings {
            tolerance: request.tolerance,
            max_iterations: request.max_n_iterations as usize,
            trace_capacity: outputs.lambda_info.len() / n_fits,
        };

        Ok(Self {
            model,
            estimator,
            fitted,
            settings,
            x_source,
            grid_size,
        })
    }

    fn run(&self, request: &FitRequest<'_>, fit: usize) -> FitOutcome {
        let n_points = request.n_points;
        let p = self.model.n_parameters();
        let samples = fit * n_points..(fit + 1) * n_points;

        let points = self.points(fit, n_points);
        let objective = Objective {
            model: self.model,
            estimator: self.estimator,
            points: &points,
            data: &request.data[samples.clone()],
            weights: request.weights.map(|w| &w[samples]),
            fitted: &self.fitted,
        };

        fit_single(
            &objective,
            &request.initial_parameters[fit * p..(fit + 1) * p],
            &self.settings,
        )
    }

    fn points(&self, fit: usize, n_points: usize) -> Vec<Point> {
        if self.model.dimensions() == 2 {
            return (0..n_points)
                .map(|i| Point {
                    x: (i % self.grid_size) as f64,
                    y: (i / self.grid_size) as f64,
                })
                .collect();
        }

        let x_at = |i: usize| match &self.x_source {
            XSource::Index => i as f64,
            XSource::Shared(xs) => xs[i],
            XSource::PerFit(xs) => xs[fit * n_points + i],
        };
        (0..n_points).map(|i| Point { x: x_at(i), y: 0.0 }).collect()
    }
}

fn checked(a: usize, b: usize) -> Result<usize, RoutineError> {
    a.checked_mul(b)
        .ok_or_else(|| RoutineError::new("buffer size overflows usize"))
}

fn at_least(name: &str, actual: usize, required: usize) -> Result<(), RoutineError> {
    if actual < required {
        return Err(RoutineError::new(format!(
            "{name} holds {actual} values, expected {required}"
        )));
    }
    Ok(())
}

fn decode_f64(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(F64_BYTES)
        .map(|chunk| {
            let mut raw = [0u8; F64_BYTES];
            raw.copy_from_slice(chunk);
            f64::from_ne_bytes(raw)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::FitState;

    struct Buffers {
        parameters: Vec<f64>,
        states: Vec<i32>,
        chi_squares: Vec<f64>,
        n_iterations: Vec<i32>,
        lambda_info: Vec<f64>,
    }

    impl Buffers {
        fn new(n_fits: usize, n_parameters: usize, capacity: usize) -> Self {
            Self {
                parameters: vec![0.0; n_fits * n_parameters],
                states: vec![-1; n_fits],
                chi_squares: vec![0.0; n_fits],
                n_iterations: vec![0; n_fits],
                lambda_info: vec![f64::NAN; n_fits * capacity],
            }
        }

        fn outputs(&mut self) -> FitOutputs<'_> {
            FitOutputs {
                parameters: &mut self.parameters,
                states: &mut self.states,
                chi_squares: &mut self.chi_squares,
                n_iterations: &mut self.n_iterations,
                lambda_info: &mut self.lambda_info,
            }
        }
    }

    fn linear_request<'a>(data: &'a [f64], initial: &'a [f64], user_info: &'a [u8]) -> FitRequest<'a> {
        FitRequest {
            n_fits: data.len() / 5,
            n_points: 5,
            data,
            weights: None,
            model_id: ModelId::Linear1d.raw(),
            initial_parameters: initial,
            tolerance: 1e-9,
            max_n_iterations: 50,
            parameters_to_fit: &[1, 1],
            estimator_id: EstimatorId::Lse.raw(),
            user_info_size: user_info.len(),
            user_info,
        }
    }

    #[test]
    fn fits_every_problem_and_fills_outputs() {
        // fit 0: y = 1 + 2x, fit 1: y = -3 + 0.5x on x = 0..5
        let data: Vec<f64> = (0..5)
            .map(|i| 1.0 + 2.0 * i as f64)
            .chain((0..5).map(|i| -3.0 + 0.5 * i as f64))
            .collect();
        let initial = [0.0, 0.0, 0.0, 0.0];
        let request = linear_request(&data, &initial, &[]);
        let mut buffers = Buffers::new(2, 2, 8);

        ReferenceCpufit.fit(&request, &mut buffers.outputs()).unwrap();

        assert_eq!(buffers.states, vec![FitState::Converged.raw(); 2]);
        let want = [1.0, 2.0, -3.0, 0.5];
        for (got, want) in buffers.parameters.iter().zip(want) {
            assert!((got - want).abs() < 1e-6, "{got} vs {want}");
        }
        for fit in 0..2 {
            let iters = buffers.n_iterations[fit] as usize;
            let trace = &buffers.lambda_info[fit * 8..(fit + 1) * 8];
            assert!(trace[..iters.min(8)].iter().all(|l| *l > 0.0));
            assert!(trace[iters.min(8)..].iter().all(|l| *l == 0.0));
        }
    }

    #[test]
    fn shared_user_info_supplies_x_coordinates() {
        let xs = [0.0, 0.5, 1.0, 1.5, 2.0];
        let data: Vec<f64> = xs.iter().map(|x| 4.0 - x).collect();
        let user_info: Vec<u8> = xs.iter().flat_map(|x| x.to_ne_bytes()).collect();
        let initial = [0.0, 0.0];
        let request = linear_request(&data, &initial, &user_info);
        let mut buffers = Buffers::new(1, 2, 0);

        ReferenceCpufit.fit(&request, &mut buffers.outputs()).unwrap();

        assert!((buffers.parameters[0] - 4.0).abs() < 1e-6);
        assert!((buffers.parameters[1] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_unknown_ids_with_a_message() {
        let data = [0.0; 5];
        let initial = [0.0, 0.0];
        let mut request = linear_request(&data, &initial, &[]);
        request.model_id = 99;
        let mut buffers = Buffers::new(1, 2, 1);

        let err = ReferenceCpufit.fit(&request, &mut buffers.outputs()).unwrap_err();
        assert_eq!(err.message, "invalid model ID: 99");

        request.model_id = ModelId::Linear1d.raw();
        request.estimator_id = 7;
        let err = ReferenceCpufit.fit(&request, &mut buffers.outputs()).unwrap_err();
        assert_eq!(err.message, "invalid estimator ID: 7");
    }

    #[test]
    fn parameter_count_mismatch_fails_late() {
        let data = [0.0; 5];
        let initial = [0.0, 0.0];
        let request = linear_request(&data, &initial, &[]);
        let mut buffers = Buffers::new(1, 3, 1);

        let err = ReferenceCpufit.fit(&request, &mut buffers.outputs()).unwrap_err();
        assert!(err.message.contains("LINEAR_1D"), "{}", err.message);
    }

    #[test]
    fn short_data_buffer_is_reported() {
        let data = [0.0; 4];
        let initial = [0.0, 0.0];
        let mut request = linear_request(&data, &initial, &[]);
        request.n_fits = 1;
        let mut buffers = Buffers::new(1, 2, 1);

        let err = ReferenceCpufit.fit(&request, &mut buffers.outputs()).unwrap_err();
        assert_eq!(err.message, "data holds 4 values, expected 5");
    }

    #[test]
    fn two_dimensional_models_need_square_point_counts() {
        let data = [1.0; 5];
        let initial = [1.0; 5];
        let mut request = linear_request(&data, &initial, &[]);
        request.model_id = ModelId::Gauss2d.raw();
        request.parameters_to_fit = &[1, 1, 1, 1, 1];
        let mut buffers = Buffers::new(1, 5, 1);

        let err = ReferenceCpufit.fit(&request, &mut buffers.outputs()).unwrap_err();
        assert!(err.message.contains("square"), "{}", err.message);
    }
}
