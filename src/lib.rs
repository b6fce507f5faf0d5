//! `pah-fit` library crate.
//!
//! Decomposes an observed PAH emission spectrum into a non-negative
//! combination of reference spectra and summarizes the result by molecular
//! category. The binary (`pahfit`) is a thin wrapper around this library so
//! the core logic is testable without spawning processes.
//!
//! ```no_run
//! use pah_fit::domain::Contribution;
//! use pah_fit::fit::Solver;
//! use pah_fit::io::{load_basis, load_observation};
//! use pah_fit::domain::AbscissaUnit;
//!
//! # fn main() -> Result<(), pah_fit::error::FitError> {
//! let basis = load_basis("basis.json".as_ref())?;
//! let observation = load_observation("observation.csv".as_ref(), AbscissaUnit::Wavenumber)?;
//! let fitted = Solver::default().fit(basis, observation)?;
//!
//! println!("{:?}", fitted.breakdown());
//! println!("{:?}", fitted.error());
//! for entry in fitted.sort(Contribution::Flux).iter().take(5) {
//!     println!("{} {:.3e}", entry.uid, entry.weight);
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod fitted;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
