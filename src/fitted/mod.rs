//! The fit result and everything derived from it.
//!
//! A `Fitted` owns the weight vector plus the fitted and residual spectra, and
//! shares the basis set and observation it was computed from. Breakdown,
//! errors, rankings, and the size histogram are recomputed from that state on
//! every call, so a `set()` can never leave a stale summary behind.
//!
//! - category aggregation (`breakdown`)
//! - per-band residual diagnostics (`bands`)
//! - rankings, size histogram, component spectra (`query`)
//! - record export/import (`record`)

pub mod bands;
pub mod breakdown;
pub mod query;
pub mod record;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{BasisSet, Contribution, Observation, Uid};
use crate::error::FitError;
use crate::math::trapezoid;

pub use bands::*;
pub use breakdown::*;
pub use query::*;
pub use record::*;

/// Algorithm that produced the weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitMethod {
    /// Non-negative linear combination.
    #[serde(rename = "NNLC")]
    Nnlc,
}

impl FitMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            FitMethod::Nnlc => "NNLC",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "NNLC" => Some(FitMethod::Nnlc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fitted {
    basis: Arc<BasisSet>,
    observation: Arc<Observation>,
    /// Dense, in basis order.
    weights: Vec<f64>,
    fitted: Vec<f64>,
    residual: Vec<f64>,
    method: FitMethod,
}

impl Fitted {
    /// Assemble a result from already validated parts.
    pub(crate) fn from_parts(
        basis: Arc<BasisSet>,
        observation: Arc<Observation>,
        weights: Vec<f64>,
        fitted: Vec<f64>,
        residual: Vec<f64>,
        method: FitMethod,
    ) -> Self {
        debug_assert_eq!(weights.len(), basis.len());
        debug_assert_eq!(fitted.len(), observation.len());
        debug_assert_eq!(residual.len(), observation.len());
        Self {
            basis,
            observation,
            weights,
            fitted,
            residual,
            method,
        }
    }

    pub fn basis(&self) -> &BasisSet {
        &self.basis
    }

    pub fn observation(&self) -> &Observation {
        &self.observation
    }

    /// Method tag, e.g. `"NNLC"`.
    pub fn method(&self) -> &'static str {
        self.method.as_str()
    }

    pub fn fit_method(&self) -> FitMethod {
        self.method
    }

    /// `(uid, weight)` pairs in basis order, zero weights included.
    pub fn weights(&self) -> impl Iterator<Item = (Uid, f64)> + '_ {
        self.basis.uids().zip(self.weights.iter().copied())
    }

    /// Weight of `uid`; uids outside the basis read as zero.
    pub fn weight(&self, uid: Uid) -> f64 {
        self.basis
            .position(uid)
            .map(|pos| self.weights[pos])
            .unwrap_or(0.0)
    }

    pub fn weight_vector(&self) -> &[f64] {
        &self.weights
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// `A · w` on the observation grid.
    pub fn fitted_spectrum(&self) -> &[f64] {
        &self.fitted
    }

    /// `flux - fitted`.
    pub fn residual(&self) -> &[f64] {
        &self.residual
    }

    /// Per-entry contribution in basis order.
    ///
    /// `Flux` scales each weight by the entry's integrated intensity over the
    /// grid, i.e. the entry's share of the total fitted flux.
    pub fn contributions(&self, by: Contribution) -> Vec<f64> {
        match by {
            Contribution::Weight => self.weights.clone(),
            Contribution::Flux => {
                let grid = self.basis.grid();
                self.basis
                    .entries()
                    .iter()
                    .zip(&self.weights)
                    .map(|(entry, &w)| w * trapezoid(grid, &entry.intensity).abs())
                    .collect()
            }
        }
    }

    /// Write the per-entry summary table to `path`.
    pub fn write(&self, path: &Path) -> Result<(), FitError> {
        crate::io::write_table(path, self)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Small hand-built fits for unit tests.

    use std::sync::Arc;

    use crate::domain::{
        AbscissaUnit, BasisEntry, BasisSet, Charge, Metadata, Observation, SizeClass, Structure, Uid,
    };
    use crate::fitted::{FitMethod, Fitted};

    pub const GRID: [f64; 4] = [1.0, 2.0, 3.0, 4.0];

    /// Flat spectrum of height `scale` on `GRID`.
    pub fn entry(
        uid: Uid,
        charge: Charge,
        structure: Structure,
        n_c: u32,
        nitrogen: bool,
        pure: bool,
        scale: f64,
    ) -> BasisEntry {
        BasisEntry {
            uid,
            metadata: Metadata {
                charge,
                size: SizeClass::from_carbons(n_c),
                structure,
                nitrogen,
                pure,
                n_c,
                formula: None,
            },
            intensity: vec![scale; GRID.len()],
        }
    }

    /// A fit whose weights are given rather than solved for; the observation
    /// is the exact combination, so the residual is zero.
    pub fn fitted_with_weights(entries: Vec<BasisEntry>, weights: &[f64]) -> Fitted {
        let basis = BasisSet::new(GRID.to_vec(), entries).unwrap();
        let fitted: Vec<f64> = (0..GRID.len())
            .map(|i| {
                basis
                    .entries()
                    .iter()
                    .zip(weights)
                    .map(|(e, w)| w * e.intensity[i])
                    .sum()
            })
            .collect();
        let observation = Observation::new(
            AbscissaUnit::Wavelength,
            GRID.to_vec(),
            fitted.clone(),
            vec![0.1; GRID.len()],
        )
        .unwrap();
        Fitted::from_parts(
            Arc::new(basis),
            Arc::new(observation),
            weights.to_vec(),
            fitted,
            vec![0.0; GRID.len()],
            FitMethod::Nnlc,
        )
    }
}
