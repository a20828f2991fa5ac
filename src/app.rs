//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - installs logging
//! - parses CLI arguments
//! - builds the binding over the selected routine
//! - runs calls, prints reports and writes optional exports

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::binding::{CallArguments, FitBinding};
use crate::cli::{Command, DemoArgs, FitArgs};
use crate::data::{SampleConfig, generate_sample};
use crate::error::AppError;
use crate::io::{CallFile, read_call_json, write_call_json};
use crate::report::{
    format_call_summary, format_fit_table, format_model_table, format_parameter_errors,
    parameter_errors,
};

pub mod pipeline;

/// Entry point for the `cpufit` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Demo(args) => handle_demo(args),
        Command::Models => {
            print!("{}", format_model_table());
            Ok(())
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second install (e.g. from an embedding program) is not an error here.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = pipeline::resolve_config(&args.binding)?;
    let binding = FitBinding::with_config(pipeline::routine(args.binding.backend)?, config);

    let call = read_call_json(&args.call)?;
    debug!(path = %args.call.display(), inputs = call.inputs.len(), "call file loaded");
    let run = pipeline::run_call(&binding, call.n_outputs, &call.inputs)?;

    // The call succeeded, so the inputs decode.
    let decoded = CallArguments::decode(&call.inputs, binding.config())?;
    println!("{}", format_call_summary(&decoded, &run.summary));
    if args.binding.show > 0 {
        println!("{}", format_fit_table(&decoded, &run.results, args.binding.show));
    }

    pipeline::export(&args.binding, &decoded, &run.results)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let sample = generate_sample(&SampleConfig {
        model: args.model,
        estimator: args.estimator,
        n_fits: args.n_fits,
        n_points: args.n_points,
        seed: args.seed,
        noise: args.noise,
        tolerance: args.tolerance,
        max_n_iterations: args.max_iterations,
    })?;
    let call = CallFile::from(&sample.call);
    if let Some(path) = &args.write_call {
        write_call_json(path, &call)?;
    }

    let config = pipeline::resolve_config(&args.binding)?;
    let binding = FitBinding::with_config(pipeline::routine(args.binding.backend)?, config);
    let run = pipeline::run_call(&binding, call.n_outputs, &call.inputs)?;

    let decoded = CallArguments::decode(&call.inputs, binding.config())?;
    println!("{}", format_call_summary(&decoded, &run.summary));
    if let Some(errors) = parameter_errors(&run.results, &sample.truth) {
        println!("{}", format_parameter_errors(args.model, &errors));
    }
    if args.binding.show > 0 {
        println!("{}", format_fit_table(&decoded, &run.results, args.binding.show));
    }

    pipeline::export(&args.binding, &decoded, &run.results)
}
