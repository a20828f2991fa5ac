//! Read/write call JSON files.
//!
//! A call file is a serialized host invocation: the number of requested
//! outputs and the positional inputs as host arrays, e.g.
//!
//! ```json
//! { "n_outputs": 5, "inputs": [ { "dims": [1, 1], "real": { "class": "double", "values": [3.0] } }, ... ] }
//! ```
//!
//! Inputs are stored exactly as given, so malformed calls (wrong arity or
//! classes) can be replayed against the binding.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::binding::REQUIRED_OUTPUTS;
use crate::error::AppError;
use crate::host::{HostArray, HostCall};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallFile {
    #[serde(default = "default_outputs")]
    pub n_outputs: usize,
    pub inputs: Vec<HostArray>,
}

fn default_outputs() -> usize {
    REQUIRED_OUTPUTS
}

impl From<&HostCall> for CallFile {
    fn from(call: &HostCall) -> Self {
        Self {
            n_outputs: REQUIRED_OUTPUTS,
            inputs: call.to_host_arrays(),
        }
    }
}

pub fn read_call_json(path: &Path) -> Result<CallFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open call JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::usage(format!("Invalid call JSON '{}': {e}", path.display())))
}

pub fn write_call_json(path: &Path, call: &CallFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create call JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, call)
        .map_err(|e| AppError::usage(format!("Failed to write call JSON: {e}")))
}
