//! Typed description of one fit call, lowered to the 13 host arguments.
//!
//! This is the host side of the boundary: it builds the positional argument
//! list exactly the way a host script would before handing it to the binding.

use serde::{Deserialize, Serialize};

use crate::host::{ArrayData, HostArray};

/// Owned inputs for one call, in host-friendly Rust types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostCall {
    pub data: Vec<f64>,
    /// `None` lowers to the empty sentinel (unweighted fit).
    pub weights: Option<Vec<f64>>,
    pub n_fits: usize,
    pub n_points: usize,
    pub tolerance: f64,
    pub max_n_iterations: i32,
    pub estimator_id: i32,
    pub initial_parameters: Vec<f64>,
    pub parameters_to_fit: Vec<i32>,
    pub model_id: i32,
    pub n_parameters: i32,
    /// Passed through as a double array; its bytes reach the model untouched.
    pub user_info: Vec<f64>,
}

impl HostCall {
    /// Size in bytes of `user_info` as the routine sees it.
    pub fn user_info_size(&self) -> usize {
        self.user_info.len() * std::mem::size_of::<f64>()
    }

    /// Lower to the positional host argument list.
    pub fn to_host_arrays(&self) -> Vec<HostArray> {
        let weights = match &self.weights {
            Some(w) => column_major(w.clone(), self.n_points, self.n_fits),
            None => HostArray::empty(),
        };
        let user_info = if self.user_info.is_empty() {
            HostArray::empty()
        } else {
            HostArray::from(self.user_info.clone())
        };

        vec![
            column_major(self.data.clone(), self.n_points, self.n_fits),
            weights,
            HostArray::double_scalar(self.n_fits as f64),
            HostArray::double_scalar(self.n_points as f64),
            HostArray::double_scalar(self.tolerance),
            HostArray::int32_scalar(self.max_n_iterations),
            HostArray::int32_scalar(self.estimator_id),
            HostArray::from(self.initial_parameters.clone()),
            HostArray::from(self.parameters_to_fit.clone()),
            HostArray::int32_scalar(self.model_id),
            HostArray::int32_scalar(self.n_parameters),
            user_info,
            HostArray::double_scalar(self.user_info_size() as f64),
        ]
    }
}

/// One fit per column, the layout host scripts use for `data` and `weights`.
fn column_major(values: Vec<f64>, rows: usize, cols: usize) -> HostArray {
    let real = ArrayData::Double(values);
    HostArray::new(vec![rows, cols], real.clone(), None).unwrap_or_else(|_| HostArray::row(real))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ClassId;

    fn call() -> HostCall {
        HostCall {
            data: vec![1.0; 6],
            weights: None,
            n_fits: 2,
            n_points: 3,
            tolerance: 1e-6,
            max_n_iterations: 10,
            estimator_id: 0,
            initial_parameters: vec![0.0, 1.0, 0.0, 1.0],
            parameters_to_fit: vec![1, 1],
            model_id: 5,
            n_parameters: 2,
            user_info: vec![0.0, 1.0, 2.0],
        }
    }

    #[test]
    fn lowers_to_thirteen_positional_arguments() {
        let args = call().to_host_arrays();
        assert_eq!(args.len(), 13);
        assert_eq!(args[0].dims(), &[3, 2]);
        assert!(args[1].is_empty());
        assert_eq!(args[5].class_id(), ClassId::Int32);
        assert_eq!(args[12].as_f64(), Some(&[24.0][..]));
    }

    #[test]
    fn ragged_data_falls_back_to_a_row_vector() {
        let mut c = call();
        c.data.pop();
        let args = c.to_host_arrays();
        assert_eq!(args[0].dims(), &[1, 5]);
    }
}
