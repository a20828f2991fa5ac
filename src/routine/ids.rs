//! Numeric identifiers shared with the fitting library.
//!
//! The raw values match the library's public header; they travel across the
//! boundary as plain `i32`s and are only turned into enums by code that needs
//! to interpret them.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Overall outcome of one call into the fitting routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnState {
    Ok,
    Error,
}

impl ReturnState {
    pub fn raw(self) -> i32 {
        match self {
            ReturnState::Ok => 0,
            ReturnState::Error => -1,
        }
    }

    /// Any value other than `0` is a failure.
    pub fn from_raw(raw: i32) -> Self {
        if raw == 0 { ReturnState::Ok } else { ReturnState::Error }
    }
}

/// Per-fit termination state written to `output_states`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitState {
    Converged,
    MaxIteration,
    SingularHessian,
    NegCurvatureMle,
}

impl FitState {
    pub const ALL: [FitState; 4] = [
        FitState::Converged,
        FitState::MaxIteration,
        FitState::SingularHessian,
        FitState::NegCurvatureMle,
    ];

    pub fn raw(self) -> i32 {
        match self {
            FitState::Converged => 0,
            FitState::MaxIteration => 1,
            FitState::SingularHessian => 2,
            FitState::NegCurvatureMle => 3,
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        FitState::ALL.into_iter().find(|s| s.raw() == raw)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FitState::Converged => "converged",
            FitState::MaxIteration => "max iterations",
            FitState::SingularHessian => "singular hessian",
            FitState::NegCurvatureMle => "neg. curvature (MLE)",
        }
    }
}

/// Objective used to judge fit quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorId {
    /// Weighted least squares (Gaussian noise).
    Lse,
    /// Poisson maximum likelihood (counting data).
    Mle,
}

impl EstimatorId {
    pub const ALL: [EstimatorId; 2] = [EstimatorId::Lse, EstimatorId::Mle];

    pub fn raw(self) -> i32 {
        match self {
            EstimatorId::Lse => 0,
            EstimatorId::Mle => 1,
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        EstimatorId::ALL.into_iter().find(|e| e.raw() == raw)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            EstimatorId::Lse => "LSE",
            EstimatorId::Mle => "MLE",
        }
    }
}

/// Model function selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    Gauss1d,
    Gauss2d,
    Gauss2dElliptic,
    Gauss2dRotated,
    Cauchy2dElliptic,
    Linear1d,
}

impl ModelId {
    pub const ALL: [ModelId; 6] = [
        ModelId::Gauss1d,
        ModelId::Gauss2d,
        ModelId::Gauss2dElliptic,
        ModelId::Gauss2dRotated,
        ModelId::Cauchy2dElliptic,
        ModelId::Linear1d,
    ];

    pub fn raw(self) -> i32 {
        match self {
            ModelId::Gauss1d => 0,
            ModelId::Gauss2d => 1,
            ModelId::Gauss2dElliptic => 2,
            ModelId::Gauss2dRotated => 3,
            ModelId::Cauchy2dElliptic => 4,
            ModelId::Linear1d => 5,
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        ModelId::ALL.into_iter().find(|m| m.raw() == raw)
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelId::Gauss1d => "GAUSS_1D",
            ModelId::Gauss2d => "GAUSS_2D",
            ModelId::Gauss2dElliptic => "GAUSS_2D_ELLIPTIC",
            ModelId::Gauss2dRotated => "GAUSS_2D_ROTATED",
            ModelId::Cauchy2dElliptic => "CAUCHY_2D_ELLIPTIC",
            ModelId::Linear1d => "LINEAR_1D",
        }
    }

    /// Number of model parameters per fit.
    pub fn n_parameters(self) -> usize {
        match self {
            ModelId::Gauss1d => 4,
            ModelId::Gauss2d => 5,
            ModelId::Gauss2dElliptic => 6,
            ModelId::Gauss2dRotated => 7,
            ModelId::Cauchy2dElliptic => 6,
            ModelId::Linear1d => 2,
        }
    }

    /// Spatial dimensionality of the model's independent variable.
    pub fn dimensions(self) -> usize {
        match self {
            ModelId::Gauss1d | ModelId::Linear1d => 1,
            _ => 2,
        }
    }

    /// Parameter names in storage order.
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            ModelId::Gauss1d => &["amplitude", "center_x", "width", "offset"],
            ModelId::Gauss2d => &["amplitude", "center_x", "center_y", "width", "offset"],
            ModelId::Gauss2dElliptic | ModelId::Cauchy2dElliptic => {
                &["amplitude", "center_x", "center_y", "width_x", "width_y", "offset"]
            }
            ModelId::Gauss2dRotated => &[
                "amplitude",
                "center_x",
                "center_y",
                "width_x",
                "width_y",
                "offset",
                "rotation",
            ],
            ModelId::Linear1d => &["offset", "slope"],
        }
    }
}
