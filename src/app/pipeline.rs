//! Shared run logic used by the `fit` and `demo` commands.
//!
//! resolve config -> pick routine -> call the binding -> summarize -> export

use tracing::info;

use crate::binding::{CallArguments, CallResults, FitBinding};
use crate::cli::{Backend, BindingArgs};
use crate::config::BindingConfig;
use crate::error::{AppError, EXIT_ROUTINE};
use crate::fit::ReferenceCpufit;
use crate::host::HostArray;
use crate::io::{ResultsFile, write_results_csv, write_results_json};
use crate::report::{CallSummary, summarize};
use crate::routine::FitRoutine;

pub type DynRoutine = Box<dyn FitRoutine + Send + Sync>;

/// All computed outputs of one run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub results: CallResults,
    pub summary: CallSummary,
}

/// Environment config with command-line overrides applied.
pub fn resolve_config(args: &BindingArgs) -> Result<BindingConfig, AppError> {
    Ok(apply_overrides(BindingConfig::from_env()?, args))
}

fn apply_overrides(mut config: BindingConfig, args: &BindingArgs) -> BindingConfig {
    if let Some(capacity) = args.diagnostic_capacity {
        config = config.with_diagnostic_capacity(capacity);
    }
    if args.strict_lengths {
        config = config.with_strict_lengths(true);
    }
    config
}

pub fn routine(backend: Backend) -> Result<DynRoutine, AppError> {
    match backend {
        Backend::Reference => Ok(Box::new(ReferenceCpufit::new())),
        #[cfg(feature = "native")]
        Backend::Native => Ok(Box::new(crate::routine::NativeCpufit::new())),
        #[cfg(not(feature = "native"))]
        Backend::Native => Err(AppError::usage(
            "The native backend needs a build with `--features native`.",
        )),
    }
}

/// Run one call through the binding exactly as the host would.
pub fn run_call(
    binding: &FitBinding<DynRoutine>,
    n_outputs: usize,
    inputs: &[HostArray],
) -> Result<RunOutput, AppError> {
    let outputs = binding.call(n_outputs, inputs)?;
    let results = CallResults::from_host_arrays(outputs)
        .ok_or_else(|| {
            AppError::new(EXIT_ROUTINE, "Binding returned outputs of unexpected classes.")
        })?;
    let summary = summarize(&results);

    info!(
        n_fits = summary.n_fits,
        converged = summary.state_counts[0],
        "call finished"
    );
    Ok(RunOutput { results, summary })
}

/// Write whichever exports were requested.
pub fn export(
    args: &BindingArgs,
    call: &CallArguments<'_>,
    results: &CallResults,
) -> Result<(), AppError> {
    if let Some(path) = &args.export {
        write_results_json(path, &ResultsFile::new(call, results))?;
    }
    if let Some(path) = &args.export_csv {
        write_results_csv(path, call, results)?;
    }
    Ok(())
}
