//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - per-molecule metadata enums (`Charge`, `SizeClass`, `Structure`, `Composition`)
//! - the basis set and the observation (`BasisSet`, `Observation`)
//! - run configuration (`FitConfig`)

pub mod types;

pub use types::*;
