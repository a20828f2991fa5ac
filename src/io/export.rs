//! Export call results to JSON and CSV.
//!
//! The JSON export keeps the five outputs in host-array form so it can be fed
//! straight back into host tooling; the CSV has one row per fit and is meant
//! for spreadsheets.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::binding::{CallArguments, CallResults};
use crate::error::AppError;
use crate::host::HostArray;
use crate::routine::{EstimatorId, FitState, ModelId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub model_id: i32,
    pub estimator_id: i32,
    pub n_fits: usize,
    pub n_parameters: usize,
    /// `parameters, states, chi_squares, n_iterations, lambda_info`.
    pub outputs: Vec<HostArray>,
}

impl ResultsFile {
    pub fn new(args: &CallArguments<'_>, results: &CallResults) -> Self {
        Self {
            tool: "cpufit".to_string(),
            generated_at: Utc::now(),
            model_id: args.model_id,
            estimator_id: args.estimator_id,
            n_fits: args.n_fits,
            n_parameters: args.n_parameters,
            outputs: results.clone().into_host_arrays(),
        }
    }
}

pub fn write_results_json(path: &Path, results: &ResultsFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create results JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), results)
        .map_err(|e| AppError::usage(format!("Failed to write results JSON: {e}")))
}

/// Write one row per fit: id, state, iterations, chi-square and parameters.
pub fn write_results_csv(
    path: &Path,
    args: &CallArguments<'_>,
    results: &CallResults,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut file = BufWriter::new(file);

    let names: Vec<String> = match ModelId::from_raw(args.model_id) {
        Some(model) if model.n_parameters() == args.n_parameters => {
            model.parameter_names().iter().map(|s| s.to_string()).collect()
        }
        _ => (0..args.n_parameters).map(|j| format!("p{j}")).collect(),
    };
    let estimator = EstimatorId::from_raw(args.estimator_id)
        .map(|e| e.display_name())
        .unwrap_or("");

    writeln!(file, "fit,state,state_name,n_iterations,chi_square,estimator,{}", names.join(","))
        .map_err(|e| AppError::usage(format!("Failed to write export CSV header: {e}")))?;

    for fit in 0..results.n_fits() {
        let raw = results.states[fit];
        let params: Vec<String> = results
            .fit_parameters(fit)
            .iter()
            .map(|v| format!("{v:.10}"))
            .collect();
        writeln!(
            file,
            "{},{},{},{},{:.10e},{},{}",
            fit,
            raw,
            FitState::from_raw(raw).map(|s| s.display_name()).unwrap_or(""),
            results.n_iterations[fit],
            results.chi_squares[fit],
            estimator,
            params.join(","),
        )
        .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
    }

    file.flush()
        .map_err(|e| AppError::usage(format!("Failed to flush export CSV: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BindingConfig;
    use crate::host::HostCall;

    fn call() -> HostCall {
        HostCall {
            data: vec![0.0; 6],
            weights: None,
            n_fits: 2,
            n_points: 3,
            tolerance: 1e-6,
            max_n_iterations: 10,
            estimator_id: 0,
            initial_parameters: vec![0.0; 4],
            parameters_to_fit: vec![1, 1],
            model_id: ModelId::Linear1d.raw(),
            n_parameters: 2,
            user_info: vec![],
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("cpufit-{name}-{}", std::process::id()))
    }

    #[test]
    fn csv_has_a_row_per_fit_with_named_parameters() {
        let inputs = call().to_host_arrays();
        let args = CallArguments::decode(&inputs, &BindingConfig::default()).unwrap();
        let mut results = CallResults::allocate(2, 2, 0).unwrap();
        results.parameters.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        results.states[1] = 1;

        let path = temp_path("results.csv");
        write_results_csv(&path, &args, &results).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("offset,slope"));
        assert!(lines[2].starts_with("1,1,MAX_ITERATION,"));
    }

    #[test]
    fn json_keeps_outputs_as_host_arrays() {
        let inputs = call().to_host_arrays();
        let args = CallArguments::decode(&inputs, &BindingConfig::default()).unwrap();
        let results = CallResults::allocate(2, 2, 3).unwrap();

        let path = temp_path("results.json");
        write_results_json(&path, &ResultsFile::new(&args, &results)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let back: ResultsFile = serde_json::from_str(&text).unwrap();
        assert_eq!(back.tool, "cpufit");
        assert_eq!(back.outputs.len(), 5);
        assert_eq!(CallResults::from_host_arrays(back.outputs), Some(results));
    }
}
