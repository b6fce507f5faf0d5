//! Spectrum decomposition.
//!
//! Responsibilities:
//!
//! - build the design matrix from a basis set
//! - solve the non-negative least-squares problem
//! - package weights, fitted spectrum, and residual as a `Fitted`

pub mod solver;

pub use solver::*;
