//! Shared fit pipeline used by the `fit` and `demo` commands.
//!
//! load inputs -> solve -> size histogram -> ranking -> optional exports
//!
//! The handlers in `app` only deal with presentation.

use tracing::info;

use crate::domain::{BasisSet, FitConfig, Observation};
use crate::error::FitError;
use crate::fit::{Solver, SolverOptions};
use crate::fitted::{Fitted, RankedEntry, SizeDistribution};
use crate::io::{load_basis, load_observation, write_record, write_table};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub fitted: Fitted,
    pub distribution: SizeDistribution,
    pub ranked: Vec<RankedEntry>,
}

/// Load the configured inputs and run the pipeline.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, FitError> {
    let basis = load_basis(&config.basis_path)?;
    let observation = load_observation(&config.observation_path, config.unit)?;
    run_fit_with_inputs(basis, observation, config)
}

/// Run the pipeline on inputs that are already in memory.
pub fn run_fit_with_inputs(
    basis: BasisSet,
    observation: Observation,
    config: &FitConfig,
) -> Result<RunOutput, FitError> {
    let solver = Solver::new(SolverOptions {
        max_iter: config.max_iter,
        ..SolverOptions::default()
    });
    let fitted = solver.fit(basis, observation)?;

    let distribution = fitted.size_distribution_with(config.size_bins)?;
    let ranked = fitted.sort(config.contribution());

    if let Some(path) = &config.export_table {
        write_table(path, &fitted)?;
        info!(path = %path.display(), "wrote summary table");
    }
    if let Some(path) = &config.export_record {
        write_record(path, &fitted)?;
        info!(path = %path.display(), "wrote fit record");
    }

    Ok(RunOutput {
        fitted,
        distribution,
        ranked,
    })
}
