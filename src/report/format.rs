//! Formatted terminal output.
//!
//! Formatting lives here so the binding and the routines stay free of
//! presentation code.

use crate::binding::{CallArguments, CallResults};
use crate::report::CallSummary;
use crate::routine::{EstimatorId, FitState, ModelId};

/// Header plus state breakdown for one call.
pub fn format_call_summary(args: &CallArguments<'_>, summary: &CallSummary) -> String {
    let mut out = String::new();

    out.push_str("=== cpufit - call summary ===\n");
    out.push_str(&format!(
        "Model: {} | Estimator: {}\n",
        model_label(args.model_id),
        estimator_label(args.estimator_id)
    ));
    out.push_str(&format!(
        "Fits: {} | Points/fit: {} | Parameters/fit: {} | Weighted: {}\n",
        args.n_fits,
        args.n_points,
        args.n_parameters,
        if args.weights.is_some() { "yes" } else { "no" },
    ));
    out.push_str(&format!(
        "Tolerance: {:e} | Max iterations: {}\n",
        args.tolerance, args.max_n_iterations
    ));

    out.push_str("\nStates:\n");
    for (state, count) in FitState::ALL.iter().zip(summary.state_counts) {
        out.push_str(&format!("  {:<20} {count}\n", state.display_name()));
    }
    if summary.unknown_states > 0 {
        out.push_str(&format!("  {:<20} {}\n", "(unknown)", summary.unknown_states));
    }

    out.push_str(&format!(
        "\nIterations: mean={:.2} max={}\n",
        summary.mean_iterations, summary.max_iterations
    ));
    match summary.mean_chi_square {
        Some(chi) => out.push_str(&format!("Chi-square (converged): mean={chi:.6e}\n")),
        None => out.push_str("Chi-square (converged): n/a\n"),
    }

    out
}

/// Per-fit table, first `limit` fits.
pub fn format_fit_table(args: &CallArguments<'_>, results: &CallResults, limit: usize) -> String {
    let names = parameter_labels(args.model_id, args.n_parameters);
    let mut out = String::new();

    let mut header = format!("{:>6} {:<18} {:>6} {:>14}", "fit", "state", "iters", "chi_square");
    for name in &names {
        header.push_str(&format!(" {:>12}", truncate(name, 12)));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&"-".repeat(header.trim_end().len()));
    out.push('\n');

    let shown = limit.min(results.n_fits());
    for fit in 0..shown {
        let state = FitState::from_raw(results.states[fit])
            .map(|s| s.display_name().to_string())
            .unwrap_or_else(|| format!("state {}", results.states[fit]));
        let mut row = format!(
            "{:>6} {:<18} {:>6} {:>14.6e}",
            fit, state, results.n_iterations[fit], results.chi_squares[fit]
        );
        for value in results.fit_parameters(fit) {
            row.push_str(&format!(" {value:>12.5}"));
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }
    if shown < results.n_fits() {
        out.push_str(&format!("... {} more fits\n", results.n_fits() - shown));
    }

    out
}

/// Mean absolute error per parameter against known truth.
pub fn format_parameter_errors(model: ModelId, errors: &[f64]) -> String {
    let mut out = String::from("Mean |fitted - truth|:\n");
    for (name, error) in model.parameter_names().iter().zip(errors) {
        out.push_str(&format!("  {name:<12} {error:.6}\n"));
    }
    out
}

/// Supported models with their ids and parameter layouts.
pub fn format_model_table() -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>3} {:<20} {:>4} {:>3}  parameters\n", "id", "model", "dim", "n"));
    for model in ModelId::ALL {
        out.push_str(&format!(
            "{:>3} {:<20} {:>4} {:>3}  {}\n",
            model.raw(),
            model.display_name(),
            format!("{}D", model.dimensions()),
            model.n_parameters(),
            model.parameter_names().join(", ")
        ));
    }
    out.push('\n');
    for estimator in EstimatorId::ALL {
        out.push_str(&format!("{:>3} {}\n", estimator.raw(), estimator.display_name()));
    }
    out
}

fn model_label(raw: i32) -> String {
    ModelId::from_raw(raw)
        .map(|m| m.display_name().to_string())
        .unwrap_or_else(|| format!("unknown ({raw})"))
}

fn estimator_label(raw: i32) -> String {
    EstimatorId::from_raw(raw)
        .map(|e| e.display_name().to_string())
        .unwrap_or_else(|| format!("unknown ({raw})"))
}

/// Model parameter names, or `p0..pN` when the id or count does not match a model.
fn parameter_labels(model_id: i32, n_parameters: usize) -> Vec<String> {
    match ModelId::from_raw(model_id) {
        Some(model) if model.n_parameters() == n_parameters => model
            .parameter_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        _ => (0..n_parameters).map(|j| format!("p{j}")).collect(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BindingConfig;
    use crate::host::HostCall;
    use crate::report::summarize;

    fn call() -> HostCall {
        HostCall {
            data: vec![0.0; 8],
            weights: None,
            n_fits: 2,
            n_points: 4,
            tolerance: 1e-6,
            max_n_iterations: 20,
            estimator_id: 1,
            initial_parameters: vec![0.0; 4],
            parameters_to_fit: vec![1, 1],
            model_id: ModelId::Linear1d.raw(),
            n_parameters: 2,
            user_info: vec![],
        }
    }

    #[test]
    fn summary_names_model_and_states() {
        let inputs = call().to_host_arrays();
        let args = CallArguments::decode(&inputs, &BindingConfig::default()).unwrap();
        let mut results = CallResults::allocate(2, 2, 0).unwrap();
        results.states.copy_from_slice(&[0, 2]);

        let text = format_call_summary(&args, &summarize(&results));
        assert!(text.contains("Model: LINEAR_1D | Estimator: MLE"));
        assert!(text.contains("CONVERGED"));
        assert!(text.contains("SINGULAR_HESSIAN"));
    }

    #[test]
    fn fit_table_uses_parameter_names_and_truncates() {
        let inputs = call().to_host_arrays();
        let args = CallArguments::decode(&inputs, &BindingConfig::default()).unwrap();
        let results = CallResults::allocate(2, 2, 0).unwrap();

        let text = format_fit_table(&args, &results, 1);
        assert!(text.lines().next().unwrap().contains("slope"));
        assert!(text.contains("... 1 more fits"));
    }

    #[test]
    fn unknown_models_fall_back_to_positional_labels() {
        assert_eq!(parameter_labels(42, 3), vec!["p0", "p1", "p2"]);
        assert_eq!(parameter_labels(ModelId::Linear1d.raw(), 2), vec!["offset", "slope"]);
    }

    #[test]
    fn model_table_lists_every_model() {
        let text = format_model_table();
        for model in ModelId::ALL {
            assert!(text.contains(model.display_name()));
        }
    }
}
