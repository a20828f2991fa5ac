//! Arity gate: the first thing a call goes through.

use crate::binding::error::{FitError, Side};

/// Positional inputs every call must supply.
pub const REQUIRED_INPUTS: usize = 13;
/// Outputs every call must request.
pub const REQUIRED_OUTPUTS: usize = 5;

/// Fail unless exactly 13 inputs and 5 outputs are present.
///
/// Only the counts are looked at, so this is safe to run before any argument
/// is touched.
pub fn check_arity(n_inputs: usize, n_outputs: usize) -> Result<(), FitError> {
    if n_inputs != REQUIRED_INPUTS {
        return Err(FitError::ContractViolation {
            side: Side::Input,
            required: REQUIRED_INPUTS,
            supplied: n_inputs,
        });
    }
    if n_outputs != REQUIRED_OUTPUTS {
        return Err(FitError::ContractViolation {
            side: Side::Output,
            required: REQUIRED_OUTPUTS,
            supplied: n_outputs,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_counts_pass() {
        assert!(check_arity(13, 5).is_ok());
    }

    #[test]
    fn inputs_are_checked_before_outputs() {
        let err = check_arity(12, 4).unwrap_err();
        assert_eq!(err.to_string(), "13 input arguments required.");

        let err = check_arity(13, 4).unwrap_err();
        assert_eq!(err.to_string(), "5 output arguments required.");

        let err = check_arity(13, 6).unwrap_err();
        assert!(matches!(err, FitError::ContractViolation { supplied: 6, .. }));
    }
}
