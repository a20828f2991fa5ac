//! Command-line parsing for the `cpufit` runner.
//!
//! Argument parsing and dispatch stay separate from the binding and the
//! fitting routines.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::routine::{EstimatorId, ModelId};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cpufit", version, about = "Drive the Cpufit binding from JSON call files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a call file through the binding and report the outputs.
    Fit(FitArgs),
    /// Generate a synthetic problem with known truth and fit it.
    Demo(DemoArgs),
    /// List model and estimator ids.
    Models,
}

/// Which routine sits behind the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Pure-Rust Levenberg-Marquardt.
    Reference,
    /// The C library (needs the `native` feature).
    Native,
}

/// Options shared by every command that runs the binding.
#[derive(Debug, Parser, Clone)]
pub struct BindingArgs {
    /// Routine implementation.
    #[arg(long, value_enum, default_value_t = Backend::Reference)]
    pub backend: Backend,

    /// Diagnostic values per fit in the fifth output (overrides CPUFIT_DIAGNOSTIC_CAPACITY).
    #[arg(long)]
    pub diagnostic_capacity: Option<usize>,

    /// Check buffer lengths before invoking the routine (overrides CPUFIT_STRICT_LENGTHS).
    #[arg(long)]
    pub strict_lengths: bool,

    /// Fits to list in the per-fit table.
    #[arg(long, default_value_t = 10)]
    pub show: usize,

    /// Export the five outputs to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export one row per fit to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Call JSON file (`{"n_outputs": 5, "inputs": [...]}`).
    #[arg(long, value_name = "JSON")]
    pub call: PathBuf,

    #[command(flatten)]
    pub binding: BindingArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    #[arg(long, value_enum, default_value_t = ModelId::Gauss1d)]
    pub model: ModelId,

    #[arg(long, value_enum, default_value_t = EstimatorId::Lse)]
    pub estimator: EstimatorId,

    #[arg(short = 'n', long, default_value_t = 100)]
    pub n_fits: usize,

    /// Points per fit (a square number for 2D models).
    #[arg(long, default_value_t = 25)]
    pub n_points: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Gaussian noise standard deviation (LSE only).
    #[arg(long, default_value_t = 0.1)]
    pub noise: f64,

    #[arg(long, default_value_t = 1e-4)]
    pub tolerance: f64,

    #[arg(long, default_value_t = 20)]
    pub max_iterations: i32,

    /// Save the generated call to JSON for replay with `cpufit fit`.
    #[arg(long, value_name = "JSON")]
    pub write_call: Option<PathBuf>,

    #[command(flatten)]
    pub binding: BindingArgs,
}
