//! Output buffers for one call, and their conversion back to host arrays.

use crate::binding::error::{Argument, FitError};
use crate::host::{ArrayData, HostArray};
use crate::routine::{FitOutputs, FitState};

/// The five outputs of one call, owned by the caller once returned.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResults {
    pub parameters: Vec<f64>,
    pub states: Vec<i32>,
    pub chi_squares: Vec<f64>,
    pub n_iterations: Vec<i32>,
    pub lambda_info: Vec<f64>,
}

impl CallResults {
    /// Zero-filled buffers sized for `n_fits` fits.
    pub fn allocate(
        n_fits: usize,
        n_parameters: usize,
        diagnostic_capacity: usize,
    ) -> Result<Self, FitError> {
        let overflow = |argument| FitError::mismatch(argument, "makes an output size overflow");
        let parameters = n_fits
            .checked_mul(n_parameters)
            .ok_or_else(|| overflow(Argument::NParameters))?;
        let diagnostics = n_fits
            .checked_mul(diagnostic_capacity)
            .ok_or_else(|| overflow(Argument::NFits))?;

        Ok(Self {
            parameters: zeroed(parameters, Argument::NParameters)?,
            states: zeroed(n_fits, Argument::NFits)?,
            chi_squares: zeroed(n_fits, Argument::NFits)?,
            n_iterations: zeroed(n_fits, Argument::NFits)?,
            lambda_info: zeroed(diagnostics, Argument::NFits)?,
        })
    }

    pub fn n_fits(&self) -> usize {
        self.states.len()
    }

    /// Mutable view handed to the routine.
    pub fn outputs(&mut self) -> FitOutputs<'_> {
        FitOutputs {
            parameters: &mut self.parameters,
            states: &mut self.states,
            chi_squares: &mut self.chi_squares,
            n_iterations: &mut self.n_iterations,
            lambda_info: &mut self.lambda_info,
        }
    }

    /// Parameters of one fit.
    pub fn fit_parameters(&self, fit: usize) -> &[f64] {
        let p = self.parameters.len() / self.n_fits().max(1);
        &self.parameters[fit * p..(fit + 1) * p]
    }

    /// Per-fit states, `None` where the routine wrote an unknown code.
    pub fn fit_states(&self) -> impl Iterator<Item = Option<FitState>> + '_ {
        self.states.iter().map(|&raw| FitState::from_raw(raw))
    }

    /// The five `1 x N` row vectors, in output order.
    pub fn into_host_arrays(self) -> Vec<HostArray> {
        vec![
            HostArray::row(ArrayData::Double(self.parameters)),
            HostArray::row(ArrayData::Int32(self.states)),
            HostArray::row(ArrayData::Double(self.chi_squares)),
            HostArray::row(ArrayData::Int32(self.n_iterations)),
            HostArray::row(ArrayData::Double(self.lambda_info)),
        ]
    }

    /// Inverse of `into_host_arrays`; `None` unless the five classes line up.
    pub fn from_host_arrays(outputs: Vec<HostArray>) -> Option<Self> {
        let [parameters, states, chi_squares, n_iterations, lambda_info]: [HostArray; 5] =
            outputs.try_into().ok()?;
        Some(Self {
            parameters: parameters.into_f64()?,
            states: states.into_i32()?,
            chi_squares: chi_squares.into_f64()?,
            n_iterations: n_iterations.into_i32()?,
            lambda_info: lambda_info.into_f64()?,
        })
    }
}

/// A zero-filled buffer, or a named error when the allocator refuses it.
fn zeroed<T: Clone + Default>(len: usize, argument: Argument) -> Result<Vec<T>, FitError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| FitError::mismatch(argument, "makes the outputs too large to allocate"))?;
    buffer.resize(len, T::default());
    Ok(buffer)
}
