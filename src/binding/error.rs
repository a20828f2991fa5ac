//! The binding's error taxonomy.
//!
//! Every failure surfaces to the host under one identifier; the variant (and
//! the message text) tells the three causes apart.

use std::fmt;

use thiserror::Error;

use crate::routine::{ReturnState, RoutineError};

/// Identifier attached to every error raised by the binding.
pub const ERROR_IDENTIFIER: &str = "Cpufit:Mex";

/// Positional arguments of a call, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Argument {
    Data,
    Weights,
    NFits,
    NPoints,
    Tolerance,
    MaxNIterations,
    EstimatorId,
    InitialParameters,
    ParametersToFit,
    ModelId,
    NParameters,
    UserInfo,
    UserInfoSize,
}

impl Argument {
    pub const ORDER: [Argument; 13] = [
        Argument::Data,
        Argument::Weights,
        Argument::NFits,
        Argument::NPoints,
        Argument::Tolerance,
        Argument::MaxNIterations,
        Argument::EstimatorId,
        Argument::InitialParameters,
        Argument::ParametersToFit,
        Argument::ModelId,
        Argument::NParameters,
        Argument::UserInfo,
        Argument::UserInfoSize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Argument::Data => "data",
            Argument::Weights => "weights",
            Argument::NFits => "n_fits",
            Argument::NPoints => "n_points",
            Argument::Tolerance => "tolerance",
            Argument::MaxNIterations => "max_n_iterations",
            Argument::EstimatorId => "estimator_id",
            Argument::InitialParameters => "initial_parameters",
            Argument::ParametersToFit => "parameters_to_fit",
            Argument::ModelId => "model_id",
            Argument::NParameters => "n_parameters",
            Argument::UserInfo => "user_info",
            Argument::UserInfoSize => "user_info_size",
        }
    }

    /// Zero-based position in the input list.
    pub fn index(self) -> usize {
        match self {
            Argument::Data => 0,
            Argument::Weights => 1,
            Argument::NFits => 2,
            Argument::NPoints => 3,
            Argument::Tolerance => 4,
            Argument::MaxNIterations => 5,
            Argument::EstimatorId => 6,
            Argument::InitialParameters => 7,
            Argument::ParametersToFit => 8,
            Argument::ModelId => 9,
            Argument::NParameters => 10,
            Argument::UserInfo => 11,
            Argument::UserInfoSize => 12,
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which side of the call an arity error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Input,
    Output,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Input => f.write_str("input"),
            Side::Output => f.write_str("output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Wrong number of inputs or requested outputs.
    #[error("{required} {side} arguments required.")]
    ContractViolation {
        side: Side,
        required: usize,
        supplied: usize,
    },

    /// An argument could not be decoded as its declared class and shape.
    #[error("{argument} {reason}")]
    ArgumentTypeMismatch { argument: Argument, reason: String },

    /// The fitting routine returned a non-OK status.
    #[error("{message}")]
    NativeFailure { state: ReturnState, message: String },
}

impl FitError {
    pub fn identifier(&self) -> &'static str {
        ERROR_IDENTIFIER
    }

    pub(crate) fn mismatch(argument: Argument, reason: impl Into<String>) -> Self {
        FitError::ArgumentTypeMismatch {
            argument,
            reason: reason.into(),
        }
    }
}

impl From<RoutineError> for FitError {
    fn from(err: RoutineError) -> Self {
        let message = if err.message.trim().is_empty() {
            format!("cpufit failed with status {}", err.state.raw())
        } else {
            err.message
        };
        FitError::NativeFailure {
            state: err.state,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_messages_state_the_required_count() {
        let err = FitError::ContractViolation {
            side: Side::Input,
            required: 13,
            supplied: 12,
        };
        assert_eq!(err.to_string(), "13 input arguments required.");
        assert_eq!(err.identifier(), "Cpufit:Mex");
    }

    #[test]
    fn argument_positions_follow_call_order() {
        assert_eq!(Argument::Data.index(), 0);
        assert_eq!(Argument::Tolerance.index(), 4);
        assert_eq!(Argument::UserInfoSize.index(), 12);
        for (position, argument) in Argument::ORDER.iter().enumerate() {
            assert_eq!(argument.index(), position, "{argument}");
        }
    }

    #[test]
    fn native_message_passes_through_verbatim() {
        let err = FitError::from(RoutineError::new("invalid model ID: 9"));
        assert_eq!(err.to_string(), "invalid model ID: 9");
    }

    #[test]
    fn empty_native_message_is_replaced() {
        let err = FitError::from(RoutineError::new(""));
        assert_eq!(err.to_string(), "cpufit failed with status -1");
    }
}
