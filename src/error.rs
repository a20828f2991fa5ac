use crate::binding::FitError;
use crate::config::ConfigError;

/// Exit code for usage, configuration, file and JSON problems.
pub const EXIT_USAGE: u8 = 2;
/// Exit code for a call the binding rejected before invoking the routine.
pub const EXIT_REJECTED: u8 = 3;
/// Exit code for a routine that returned a non-OK status.
pub const EXIT_ROUTINE: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::ContractViolation { .. } | FitError::ArgumentTypeMismatch { .. } => {
                EXIT_REJECTED
            }
            FitError::NativeFailure { .. } => EXIT_ROUTINE,
        };
        Self::new(exit_code, format!("{}: {err}", err.identifier()))
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        Self::usage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::RoutineError;

    #[test]
    fn fit_errors_map_to_distinct_exit_codes() {
        let rejected = AppError::from(FitError::ContractViolation {
            side: crate::binding::Side::Output,
            required: 5,
            supplied: 1,
        });
        assert_eq!(rejected.exit_code(), EXIT_REJECTED);
        assert_eq!(rejected.to_string(), "Cpufit:Mex: 5 output arguments required.");

        let failed = AppError::from(FitError::from(RoutineError::new("singular")));
        assert_eq!(failed.exit_code(), EXIT_ROUTINE);
    }
}
