//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - parses CLI arguments and installs logging
//! - loads or synthesizes inputs
//! - runs the fit pipeline
//! - prints reports/plots and writes optional exports

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, DemoArgs, FitArgs, OutputArgs, PlotArgs, ShowArgs};
use crate::data::{DEMO_MIX, DEMO_UIDS, SyntheticConfig, synthetic_basis, synthetic_observation};
use crate::domain::{AbscissaUnit, Contribution, FitConfig};
use crate::error::FitError;
use crate::fitted::Fitted;
use crate::io::{write_basis, write_observation};
use crate::plot::{PlotOptions, Rendered, render};
use crate::report::{format_fit_summary, format_ranking};

pub mod pipeline;

/// Entry point for the `pahfit` binary.
pub fn run() -> Result<(), FitError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Demo(args) => handle_demo(args),
        Command::Show(args) => handle_show(args),
    }
}

/// Log to stderr. Without `-v` the filter comes from `RUST_LOG`, defaulting to `warn`.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), FitError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;
    print_run(&run, &config, &args.output.plot)
}

fn handle_demo(args: DemoArgs) -> Result<(), FitError> {
    let synthetic = SyntheticConfig {
        points: args.points,
        seed: args.seed,
        noise: args.noise,
        ..SyntheticConfig::default()
    };
    let basis = synthetic_basis(&DEMO_UIDS, &synthetic)?;
    let observation = synthetic_observation(&basis, &DEMO_MIX, &synthetic)?;

    let (basis_path, observation_path) = match &args.write_inputs {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| FitError::io(dir, e))?;
            let basis_path = dir.join("basis.json");
            let observation_path = dir.join("observation.csv");
            write_basis(&basis_path, &basis)?;
            write_observation(&observation_path, &observation)?;
            info!(dir = %dir.display(), "wrote synthetic inputs");
            (basis_path, observation_path)
        }
        None => (PathBuf::from("<synthetic>"), PathBuf::from("<synthetic>")),
    };

    let config = config_from_output(basis_path, observation_path, AbscissaUnit::Wavenumber, &args.output);
    let run = pipeline::run_fit_with_inputs(basis, observation, &config)?;

    println!("True mix: {}", format_mix(&DEMO_MIX));
    print_run(&run, &config, &args.output.plot)
}

fn handle_show(args: ShowArgs) -> Result<(), FitError> {
    let fitted = Fitted::read_record(&args.record)?;
    let by = if args.flux { Contribution::Flux } else { Contribution::Weight };

    println!("{}", format_fit_summary(&fitted, &fitted.size_distribution()));
    println!("{}", format_ranking(&fitted, &fitted.sort(by), args.top, by));
    show_plot(&fitted, &args.plot)
}

fn print_run(run: &pipeline::RunOutput, config: &FitConfig, plot: &PlotArgs) -> Result<(), FitError> {
    println!("{}", format_fit_summary(&run.fitted, &run.distribution));
    println!(
        "{}",
        format_ranking(&run.fitted, &run.ranked, config.top_n, config.contribution())
    );
    show_plot(&run.fitted, plot)
}

fn show_plot(fitted: &Fitted, args: &PlotArgs) -> Result<(), FitError> {
    if !args.wanted() {
        return Ok(());
    }
    match render(fitted, &plot_options_from_args(args))? {
        Rendered::Text(text) => println!("{text}"),
        Rendered::Saved(path) => println!("Saved figure: {}", path.display()),
    }
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    config_from_output(args.basis.clone(), args.observation.clone(), args.unit, &args.output)
}

fn config_from_output(
    basis_path: PathBuf,
    observation_path: PathBuf,
    unit: AbscissaUnit,
    output: &OutputArgs,
) -> FitConfig {
    FitConfig {
        basis_path,
        observation_path,
        unit,
        size_bins: output.bins,
        rank_by_flux: output.flux,
        top_n: output.top,
        max_iter: output.max_iter,
        export_table: output.table.clone(),
        export_record: output.record.clone(),
    }
}

pub fn plot_options_from_args(args: &PlotArgs) -> PlotOptions {
    PlotOptions {
        wavelength: args.wavelength,
        residual: args.residual,
        size: args.size,
        charge: args.charge,
        composition: args.composition,
        sizedistribution: args.sizedistribution,
        sigma: args.sigma,
        save: args.save,
        output: args.output.clone(),
        ftype: args.ftype.clone(),
        width: args.width,
        height: args.height,
    }
}

fn format_mix(mix: &[(u32, f64)]) -> String {
    let parts: Vec<String> = mix.iter().map(|(uid, w)| format!("{uid}={w}")).collect();
    parts.join(" ")
}
