//! Command-line parsing for the PAH spectrum fitter.
//!
//! Argument parsing and command dispatch stay separate from the fitting code;
//! `app` turns these structs into `FitConfig` / `PlotOptions`.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::AbscissaUnit;
use crate::fitted::DEFAULT_SIZE_BINS;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pahfit", version, about = "Decompose PAH emission spectra into a reference basis")]
pub struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace). `RUST_LOG` wins when set and
    /// no -v is given.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit an observation against a basis set and print the decomposition.
    Fit(FitArgs),
    /// Fit a synthetic observation built from a synthetic basis set.
    Demo(DemoArgs),
    /// Summarize and plot a previously saved fit record.
    Show(ShowArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Basis set JSON (`{grid, entries}`).
    #[arg(long, value_name = "JSON")]
    pub basis: PathBuf,

    /// Observation CSV (`abscissa,flux[,uncertainty]`).
    #[arg(long, value_name = "CSV")]
    pub observation: PathBuf,

    /// Unit of the observation abscissa.
    #[arg(long, value_enum, default_value_t = AbscissaUnit::Wavenumber)]
    pub unit: AbscissaUnit,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Seed for the synthetic basis and noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Grid samples.
    #[arg(long, default_value_t = 500)]
    pub points: usize,

    /// Noise level as a fraction of the peak flux.
    #[arg(long, default_value_t = 0.01)]
    pub noise: f64,

    /// Also write `basis.json` and `observation.csv` into this directory.
    #[arg(long, value_name = "DIR")]
    pub write_inputs: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Record JSON written by `pahfit fit --record`.
    #[arg(long, value_name = "JSON")]
    pub record: PathBuf,

    /// Show the top-N entries.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Rank by flux contribution instead of weight.
    #[arg(long)]
    pub flux: bool,

    #[command(flatten)]
    pub plot: PlotArgs,
}

/// Reporting and export options shared by `fit` and `demo`.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Size distribution bins.
    #[arg(long, default_value_t = DEFAULT_SIZE_BINS)]
    pub bins: usize,

    /// Cap on solver iterations (default: three times the basis size).
    #[arg(long)]
    pub max_iter: Option<usize>,

    /// Write the per-entry summary table.
    #[arg(long, value_name = "FILE")]
    pub table: Option<PathBuf>,

    /// Write the full fit record as JSON.
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Show the top-N entries.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Rank by flux contribution instead of weight.
    #[arg(long)]
    pub flux: bool,

    #[command(flatten)]
    pub plot: PlotArgs,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Print an ASCII plot to the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot against wavelength (micron).
    #[arg(long)]
    pub wavelength: bool,

    /// Add a residual panel.
    #[arg(long)]
    pub residual: bool,

    /// Plot component spectra by size class.
    #[arg(long)]
    pub size: bool,

    /// Plot component spectra by charge.
    #[arg(long)]
    pub charge: bool,

    /// Plot component spectra by composition.
    #[arg(long)]
    pub composition: bool,

    /// Plot the carbon-count histogram.
    #[arg(long)]
    pub sizedistribution: bool,

    /// Show the observation uncertainty.
    #[arg(long)]
    pub sigma: bool,

    /// Save the figure as `{output}_{kind}.{ftype}` instead of printing it.
    #[arg(long)]
    pub save: bool,

    /// Path stem for saved figures.
    #[arg(long, default_value = "fitted")]
    pub output: PathBuf,

    /// Saved figure type: txt or svg.
    #[arg(long, default_value = "svg")]
    pub ftype: String,

    /// Figure width (pixels; text plots use one column per 10 px).
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Figure height (pixels; text plots use one row per 30 px).
    #[arg(long, default_value_t = 600)]
    pub height: u32,
}

impl PlotArgs {
    /// Whether any figure was requested.
    pub fn wanted(&self) -> bool {
        self.plot || self.save
    }
}
