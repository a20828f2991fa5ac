//! Decode the positional host arguments into typed, borrowed buffers.
//!
//! Each argument is decoded against exactly one expected (class, shape) pair;
//! anything else is an `ArgumentTypeMismatch` naming the argument. Nothing is
//! coerced.

use std::borrow::Cow;

use tracing::debug;

use crate::binding::error::{Argument, FitError};
use crate::config::BindingConfig;
use crate::host::{ArrayData, ClassId, HostArray};
use crate::routine::FitRequest;

/// The 13 inputs of one call, decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArguments<'a> {
    pub data: &'a [f64],
    pub weights: Option<&'a [f64]>,
    pub n_fits: usize,
    pub n_points: usize,
    pub tolerance: f64,
    pub max_n_iterations: i32,
    pub estimator_id: i32,
    pub initial_parameters: &'a [f64],
    pub parameters_to_fit: &'a [i32],
    pub model_id: i32,
    pub n_parameters: usize,
    pub user_info: Cow<'a, [u8]>,
    pub user_info_size: usize,
}

impl<'a> CallArguments<'a> {
    /// Decode all 13 inputs in order, stopping at the first one that fails.
    ///
    /// Arity is the gate's job; a short list still fails cleanly here, with
    /// the first missing argument named.
    pub fn decode(inputs: &'a [HostArray], config: &BindingConfig) -> Result<Self, FitError> {
        let arg = move |which: Argument| -> Result<&'a HostArray, FitError> {
            inputs
                .get(which.index())
                .ok_or_else(|| FitError::mismatch(which, "is missing"))
        };

        let data = buffer_f64(Argument::Data, arg(Argument::Data)?)?;
        let weights = weights(arg(Argument::Weights)?)?;
        let n_fits = count(Argument::NFits, arg(Argument::NFits)?)?;
        let n_points = count(Argument::NPoints, arg(Argument::NPoints)?)?;
        let tolerance = scalar_f64(Argument::Tolerance, arg(Argument::Tolerance)?)?;
        let max_n_iterations =
            scalar_i32(Argument::MaxNIterations, arg(Argument::MaxNIterations)?)?;
        let estimator_id = scalar_i32(Argument::EstimatorId, arg(Argument::EstimatorId)?)?;
        let initial_parameters =
            buffer_f64(Argument::InitialParameters, arg(Argument::InitialParameters)?)?;
        let parameters_to_fit =
            buffer_i32(Argument::ParametersToFit, arg(Argument::ParametersToFit)?)?;
        let model_id = scalar_i32(Argument::ModelId, arg(Argument::ModelId)?)?;
        let n_parameters = scalar_i32(Argument::NParameters, arg(Argument::NParameters)?)?;
        let n_parameters = usize::try_from(n_parameters)
            .map_err(|_| FitError::mismatch(Argument::NParameters, "must not be negative"))?;
        let user_info = user_info(arg(Argument::UserInfo)?)?;
        let user_info_size = count(Argument::UserInfoSize, arg(Argument::UserInfoSize)?)?;

        let decoded = Self {
            data,
            weights,
            n_fits,
            n_points,
            tolerance,
            max_n_iterations,
            estimator_id,
            initial_parameters,
            parameters_to_fit,
            model_id,
            n_parameters,
            user_info,
            user_info_size,
        };
        if config.strict_lengths {
            decoded.check_lengths()?;
        }

        debug!(
            n_fits,
            n_points,
            n_parameters,
            model_id,
            estimator_id,
            weighted = decoded.weights.is_some(),
            user_info_size,
            "arguments decoded"
        );
        Ok(decoded)
    }

    /// Check every buffer against the extents implied by the counts.
    pub fn check_lengths(&self) -> Result<(), FitError> {
        let samples = product(Argument::NPoints, self.n_fits, self.n_points)?;
        let parameters = product(Argument::NParameters, self.n_fits, self.n_parameters)?;

        expect_len(Argument::Data, self.data.len(), samples)?;
        if let Some(weights) = self.weights {
            expect_len(Argument::Weights, weights.len(), samples)?;
        }
        expect_len(Argument::InitialParameters, self.initial_parameters.len(), parameters)?;
        expect_len(Argument::ParametersToFit, self.parameters_to_fit.len(), self.n_parameters)?;
        if self.user_info_size > self.user_info.len() {
            return Err(FitError::mismatch(
                Argument::UserInfoSize,
                format!(
                    "is {} bytes but user_info holds {}",
                    self.user_info_size,
                    self.user_info.len()
                ),
            ));
        }
        Ok(())
    }

    /// Borrow as the routine's request.
    pub fn request(&self) -> FitRequest<'_> {
        FitRequest {
            n_fits: self.n_fits,
            n_points: self.n_points,
            data: self.data,
            weights: self.weights,
            model_id: self.model_id,
            initial_parameters: self.initial_parameters,
            tolerance: self.tolerance,
            max_n_iterations: self.max_n_iterations,
            parameters_to_fit: self.parameters_to_fit,
            estimator_id: self.estimator_id,
            user_info_size: self.user_info_size,
            user_info: &self.user_info,
        }
    }
}

fn is_real_numeric(array: &HostArray) -> bool {
    array.is_numeric() && !array.is_complex()
}

fn scalar_of(array: &HostArray, class: ClassId) -> bool {
    is_real_numeric(array) && array.numel() == 1 && array.class_id() == class
}

fn scalar_f64(argument: Argument, array: &HostArray) -> Result<f64, FitError> {
    match array.as_f64() {
        Some([value]) if scalar_of(array, ClassId::Double) => Ok(*value),
        _ => Err(FitError::mismatch(argument, "is not a real double scalar")),
    }
}

fn scalar_i32(argument: Argument, array: &HostArray) -> Result<i32, FitError> {
    match array.as_i32() {
        Some([value]) if scalar_of(array, ClassId::Int32) => Ok(*value),
        _ => Err(FitError::mismatch(argument, "is not a real int32 scalar")),
    }
}

/// A double scalar holding a non-negative whole number.
fn count(argument: Argument, array: &HostArray) -> Result<usize, FitError> {
    let reject = || FitError::mismatch(argument, "is not a non-negative integral double scalar");
    let value = scalar_f64(argument, array).map_err(|_| reject())?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= usize::MAX as f64 {
        return Err(reject());
    }
    Ok(value as usize)
}

fn buffer_f64<'a>(argument: Argument, array: &'a HostArray) -> Result<&'a [f64], FitError> {
    match array.as_f64() {
        Some(values) if !array.is_complex() => Ok(values),
        _ => Err(FitError::mismatch(argument, "is not a real double array")),
    }
}

fn buffer_i32<'a>(argument: Argument, array: &'a HostArray) -> Result<&'a [i32], FitError> {
    match array.as_i32() {
        Some(values) if !array.is_complex() => Ok(values),
        _ => Err(FitError::mismatch(argument, "is not a real int32 array")),
    }
}

/// An empty real numeric array of any class means "unweighted".
fn weights(array: &HostArray) -> Result<Option<&[f64]>, FitError> {
    if array.is_empty() && is_real_numeric(array) {
        return Ok(None);
    }
    match array.as_f64() {
        Some(values) if !array.is_complex() => Ok(Some(values)),
        _ => Err(FitError::mismatch(
            Argument::Weights,
            "is neither a real double array nor empty",
        )),
    }
}

/// Raw native-endian bytes of any real numeric array. `uint8` is borrowed.
fn user_info(array: &HostArray) -> Result<Cow<'_, [u8]>, FitError> {
    let reject = || FitError::mismatch(Argument::UserInfo, "is not a real numeric array");
    if !is_real_numeric(array) {
        return Err(reject());
    }
    match array.real() {
        ArrayData::Uint8(bytes) => Ok(Cow::Borrowed(bytes)),
        other => other.to_ne_bytes().map(Cow::Owned).ok_or_else(reject),
    }
}

fn product(argument: Argument, a: usize, b: usize) -> Result<usize, FitError> {
    a.checked_mul(b)
        .ok_or_else(|| FitError::mismatch(argument, "makes the buffer size overflow"))
}

fn expect_len(argument: Argument, actual: usize, expected: usize) -> Result<(), FitError> {
    if actual != expected {
        return Err(FitError::mismatch(
            argument,
            format!("holds {actual} elements, expected {expected}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostCall;

    fn call() -> HostCall {
        HostCall {
            data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            weights: None,
            n_fits: 2,
            n_points: 3,
            tolerance: 1e-4,
            max_n_iterations: 25,
            estimator_id: 0,
            initial_parameters: vec![0.5, 1.5, 2.5, 3.5],
            parameters_to_fit: vec![1, 0],
            model_id: 5,
            n_parameters: 2,
            user_info: vec![],
        }
    }

    fn decode(inputs: &[HostArray]) -> Result<CallArguments<'_>, FitError> {
        CallArguments::decode(inputs, &BindingConfig::default())
    }

    #[test]
    fn decodes_every_argument() {
        let inputs = call().to_host_arrays();
        let args = decode(&inputs).unwrap();

        assert_eq!(args.data, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(args.weights, None);
        assert_eq!((args.n_fits, args.n_points), (2, 3));
        assert_eq!(args.tolerance, 1e-4);
        assert_eq!(args.max_n_iterations, 25);
        assert_eq!(args.initial_parameters.len(), 4);
        assert_eq!(args.parameters_to_fit, &[1, 0]);
        assert_eq!((args.model_id, args.n_parameters), (5, 2));
        assert!(args.user_info.is_empty());
        assert_eq!(args.user_info_size, 0);

        let request = args.request();
        assert_eq!(request.n_fits, 2);
        assert_eq!(request.data.as_ptr(), args.data.as_ptr());
    }

    #[test]
    fn tolerance_must_be_double() {
        let mut inputs = call().to_host_arrays();
        inputs[Argument::Tolerance.index()] = HostArray::int32_scalar(1);

        let err = decode(&inputs).unwrap_err();
        assert_eq!(err.to_string(), "tolerance is not a real double scalar");
    }

    #[test]
    fn integer_scalars_must_be_int32() {
        let mut inputs = call().to_host_arrays();
        inputs[Argument::MaxNIterations.index()] = HostArray::double_scalar(25.0);

        let err = decode(&inputs).unwrap_err();
        assert_eq!(err.to_string(), "max_n_iterations is not a real int32 scalar");
    }

    #[test]
    fn scalars_must_hold_exactly_one_real_element() {
        let mut inputs = call().to_host_arrays();
        inputs[Argument::Tolerance.index()] = HostArray::from(vec![1e-4, 1e-5]);
        assert!(matches!(
            decode(&inputs),
            Err(FitError::ArgumentTypeMismatch { argument: Argument::Tolerance, .. })
        ));

        let complex = HostArray::new(
            vec![1, 1],
            ArrayData::Double(vec![1e-4]),
            Some(ArrayData::Double(vec![1.0])),
        )
        .unwrap();
        inputs[Argument::Tolerance.index()] = complex;
        assert!(matches!(
            decode(&inputs),
            Err(FitError::ArgumentTypeMismatch { argument: Argument::Tolerance, .. })
        ));
    }

    #[test]
    fn counts_must_be_whole_and_non_negative() {
        for bad in [-1.0, 2.5, f64::NAN, f64::INFINITY] {
            let mut inputs = call().to_host_arrays();
            inputs[Argument::NFits.index()] = HostArray::double_scalar(bad);
            let err = decode(&inputs).unwrap_err();
            assert_eq!(
                err.to_string(),
                "n_fits is not a non-negative integral double scalar"
            );
        }
    }

    #[test]
    fn negative_parameter_count_is_rejected() {
        let mut inputs = call().to_host_arrays();
        inputs[Argument::NParameters.index()] = HostArray::int32_scalar(-2);

        let err = decode(&inputs).unwrap_err();
        assert_eq!(err.to_string(), "n_parameters must not be negative");
    }

    #[test]
    fn empty_weights_of_any_numeric_class_mean_unweighted() {
        let mut inputs = call().to_host_arrays();
        inputs[Argument::Weights.index()] = HostArray::empty_of(ClassId::Int32);
        assert_eq!(decode(&inputs).unwrap().weights, None);

        inputs[Argument::Weights.index()] = HostArray::empty_of(ClassId::Char);
        assert!(decode(&inputs).is_err());
    }

    #[test]
    fn user_info_bytes_follow_the_host_class() {
        let mut inputs = call().to_host_arrays();
        inputs[Argument::UserInfo.index()] = HostArray::row(ArrayData::Uint8(vec![1, 2, 3]));
        let args = decode(&inputs).unwrap();
        assert!(matches!(args.user_info, Cow::Borrowed(_)));
        assert_eq!(&*args.user_info, &[1, 2, 3]);

        inputs[Argument::UserInfo.index()] = HostArray::from(vec![1.5f64]);
        let args = decode(&inputs).unwrap();
        assert_eq!(&*args.user_info, &1.5f64.to_ne_bytes());
    }

    #[test]
    fn lengths_are_trusted_unless_strict() {
        let mut inputs = call().to_host_arrays();
        inputs[Argument::Data.index()] = HostArray::from(vec![1.0; 5]);
        assert!(decode(&inputs).is_ok());

        let strict = BindingConfig::default().with_strict_lengths(true);
        let err = CallArguments::decode(&inputs, &strict).unwrap_err();
        assert_eq!(err.to_string(), "data holds 5 elements, expected 6");
    }

    #[test]
    fn strict_mode_checks_every_buffer() {
        let strict = BindingConfig::default().with_strict_lengths(true);
        let cases = [
            (
                Argument::Weights,
                HostArray::from(vec![1.0; 5]),
                "weights holds 5 elements, expected 6",
            ),
            (
                Argument::InitialParameters,
                HostArray::from(vec![0.0; 3]),
                "initial_parameters holds 3 elements, expected 4",
            ),
            (
                Argument::ParametersToFit,
                HostArray::row(ArrayData::Int32(vec![1])),
                "parameters_to_fit holds 1 elements, expected 2",
            ),
        ];
        for (argument, replacement, message) in cases {
            let mut inputs = call().to_host_arrays();
            inputs[argument.index()] = replacement;
            assert!(decode(&inputs).is_ok(), "{argument}");

            let err = CallArguments::decode(&inputs, &strict).unwrap_err();
            let named = match &err {
                FitError::ArgumentTypeMismatch { argument, .. } => Some(*argument),
                _ => None,
            };
            assert_eq!(named, Some(argument), "{err:?}");
            assert_eq!(err.to_string(), message);
        }

        let inputs = call().to_host_arrays();
        assert!(CallArguments::decode(&inputs, &strict).is_ok());
    }

    #[test]
    fn strict_mode_bounds_user_info_size() {
        let strict = BindingConfig::default().with_strict_lengths(true);
        let mut inputs = call().to_host_arrays();
        inputs[Argument::UserInfo.index()] = HostArray::row(ArrayData::Uint8(vec![1, 2]));
        inputs[Argument::UserInfoSize.index()] = HostArray::double_scalar(3.0);

        let err = CallArguments::decode(&inputs, &strict).unwrap_err();
        assert!(matches!(
            err,
            FitError::ArgumentTypeMismatch { argument: Argument::UserInfoSize, .. }
        ));
        assert_eq!(err.to_string(), "user_info_size is 3 bytes but user_info holds 2");

        inputs[Argument::UserInfoSize.index()] = HostArray::double_scalar(2.0);
        assert!(CallArguments::decode(&inputs, &strict).is_ok());
    }

    #[test]
    fn strict_mode_rejects_overflowing_extents() {
        let strict = BindingConfig::default().with_strict_lengths(true);

        let mut inputs = call().to_host_arrays();
        inputs[Argument::NFits.index()] = HostArray::double_scalar(2f64.powi(53));
        inputs[Argument::NPoints.index()] = HostArray::double_scalar(2f64.powi(53));
        let err = CallArguments::decode(&inputs, &strict).unwrap_err();
        assert!(matches!(
            err,
            FitError::ArgumentTypeMismatch { argument: Argument::NPoints, .. }
        ));
        assert_eq!(err.to_string(), "n_points makes the buffer size overflow");

        let mut inputs = call().to_host_arrays();
        inputs[Argument::NFits.index()] = HostArray::double_scalar(2f64.powi(62));
        inputs[Argument::NPoints.index()] = HostArray::double_scalar(0.0);
        inputs[Argument::NParameters.index()] = HostArray::int32_scalar(i32::MAX);
        let err = CallArguments::decode(&inputs, &strict).unwrap_err();
        assert!(matches!(
            err,
            FitError::ArgumentTypeMismatch { argument: Argument::NParameters, .. }
        ));
    }

    #[test]
    fn counts_at_the_top_of_the_range_are_rejected() {
        let mut inputs = call().to_host_arrays();
        inputs[Argument::NFits.index()] = HostArray::double_scalar(18446744073709551616.0);
        let err = decode(&inputs).unwrap_err();
        assert!(matches!(
            err,
            FitError::ArgumentTypeMismatch { argument: Argument::NFits, .. }
        ));

        inputs[Argument::NFits.index()] = HostArray::double_scalar(2f64.powi(63));
        assert_eq!(decode(&inputs).unwrap().n_fits, 1usize << 63);
    }

    #[test]
    fn missing_arguments_are_named() {
        let inputs = call().to_host_arrays();
        let err = decode(&inputs[..4]).unwrap_err();
        assert_eq!(err.to_string(), "tolerance is missing");
    }
}
