//! Non-negative decomposition of an observation over a basis set.
//!
//! Given basis spectra `A` (one column per entry, rows on the shared grid) and
//! an observed flux `y`, we solve
//!
//! ```text
//! minimize ||A w - y||_2   subject to   w >= 0
//! ```
//!
//! and keep `A w` and `y - A w` alongside the weights.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info};

use crate::domain::{BasisSet, Observation, ensure_same_grid};
use crate::error::FitError;
use crate::fitted::{FitMethod, Fitted};
use crate::math::{NnlsOptions, solve_nnls};

/// Options that affect how the decomposition is computed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolverOptions {
    /// Cap on active-set iterations; defaults to three times the basis size.
    pub max_iter: Option<usize>,
    /// Optimality tolerance on the unit-normalized problem; defaults to a
    /// value scaled by `||A||_1`.
    pub tolerance: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Solver {
    options: SolverOptions,
}

impl Solver {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> SolverOptions {
        self.options
    }

    /// Fit `observation` as a non-negative combination of `basis`.
    ///
    /// The observation abscissa must match the basis grid sample for sample.
    pub fn fit(
        &self,
        basis: impl Into<Arc<BasisSet>>,
        observation: impl Into<Arc<Observation>>,
    ) -> Result<Fitted, FitError> {
        let basis = basis.into();
        let observation = observation.into();

        if basis.is_empty() {
            return Err(FitError::EmptyBasis);
        }
        ensure_same_grid("abscissa", basis.grid(), observation.abscissa())?;

        let n = observation.len();
        let m = basis.len();
        let entries = basis.entries();
        let a = DMatrix::<f64>::from_fn(n, m, |i, j| entries[j].intensity[i]);
        let y = DVector::<f64>::from_column_slice(observation.flux());

        debug!(samples = n, entries = m, "solving non-negative decomposition");
        let solution = solve_nnls(
            &a,
            &y,
            &NnlsOptions {
                max_iter: self.options.max_iter,
                tolerance: self.options.tolerance,
            },
        )?;

        let fitted_col = &a * &solution.x;
        let fitted: Vec<f64> = fitted_col.iter().copied().collect();
        let residual: Vec<f64> = observation
            .flux()
            .iter()
            .zip(&fitted)
            .map(|(y, f)| y - f)
            .collect();
        let weights: Vec<f64> = solution.x.iter().copied().collect();

        let active = weights.iter().filter(|&&w| w > 0.0).count();
        info!(
            entries = m,
            active,
            iterations = solution.iterations,
            "fit complete"
        );

        Ok(Fitted::from_parts(
            basis,
            observation,
            weights,
            fitted,
            residual,
            FitMethod::Nnlc,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AbscissaUnit, BasisEntry, Charge, Metadata, SizeClass, Structure};

    fn entry(uid: u32, intensity: Vec<f64>) -> BasisEntry {
        BasisEntry {
            uid,
            metadata: Metadata {
                charge: Charge::Neutral,
                size: SizeClass::Small,
                structure: Structure::Solo,
                nitrogen: false,
                pure: true,
                n_c: 24,
                formula: None,
            },
            intensity,
        }
    }

    fn two_entry_basis() -> BasisSet {
        BasisSet::new(
            vec![1.0, 2.0, 3.0, 4.0],
            vec![
                entry(1, vec![1.0, 0.5, 0.0, 0.0]),
                entry(2, vec![0.0, 0.0, 0.5, 1.0]),
            ],
        )
        .unwrap()
    }

    /// Entries 1 and 2 plus an unused entry 3, all scaled by `scale`.
    fn three_entry_basis(scale: f64) -> BasisSet {
        let scaled = |v: [f64; 4]| -> Vec<f64> { v.iter().map(|x| x * scale).collect() };
        BasisSet::new(
            vec![1.0, 2.0, 3.0, 4.0],
            vec![
                entry(1, scaled([1.0, 0.5, 0.0, 0.0])),
                entry(2, scaled([0.0, 0.0, 0.5, 1.0])),
                entry(3, scaled([0.0, 1.0, 1.0, 0.0])),
            ],
        )
        .unwrap()
    }

    fn exact_mix(scale: f64) -> Observation {
        let flux: Vec<f64> = [2.0, 1.0, 1.5, 3.0].iter().map(|y| y * scale).collect();
        Observation::new(AbscissaUnit::Wavelength, vec![1.0, 2.0, 3.0, 4.0], flux, vec![0.1 * scale; 4]).unwrap()
    }

    #[test]
    fn recovers_exact_combination() {
        let fit = Solver::default().fit(three_entry_basis(1.0), exact_mix(1.0)).unwrap();
        assert_eq!(fit.method(), "NNLC");
        assert!((fit.weight(1) - 2.0).abs() < 1e-9);
        assert!((fit.weight(2) - 3.0).abs() < 1e-9);
        assert_eq!(fit.weight(3), 0.0);
        assert!(fit.global_error() < 1e-9);
        assert!(fit.residual().iter().all(|r| r.abs() < 1e-9));
    }

    #[test]
    fn recovers_weights_at_physical_flux_scale() {
        for scale in [1e-8, 1e-12, 1e-20] {
            let fit = Solver::default()
                .fit(three_entry_basis(scale), exact_mix(scale))
                .unwrap();
            assert!((fit.weight(1) - 2.0).abs() < 1e-9, "scale {scale}: {:?}", fit.weight_vector());
            assert!((fit.weight(2) - 3.0).abs() < 1e-9, "scale {scale}: {:?}", fit.weight_vector());
            assert_eq!(fit.weight(3), 0.0);
            assert!(fit.global_error() < 1e-9, "scale {scale}");
        }
    }

    #[test]
    fn weights_never_go_negative() {
        // Best unconstrained fit would use a negative weight on entry 2.
        let flux = vec![2.0, 1.0, -0.5, -1.0];
        let obs = Observation::new(AbscissaUnit::Wavelength, vec![1.0, 2.0, 3.0, 4.0], flux, vec![0.0; 4]).unwrap();

        let fit = Solver::default().fit(two_entry_basis(), obs).unwrap();
        assert!(fit.weight_vector().iter().all(|&w| w >= 0.0));
        assert_eq!(fit.weight(2), 0.0);
        assert!((fit.weight(1) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_grid_is_rejected() {
        let short = Observation::new(AbscissaUnit::Wavelength, vec![1.0, 2.0, 3.0], vec![1.0; 3], vec![0.0; 3]).unwrap();
        let err = Solver::default().fit(two_entry_basis(), short).unwrap_err();
        assert!(matches!(err, FitError::DimensionMismatch { .. }));

        let shifted =
            Observation::new(AbscissaUnit::Wavelength, vec![1.0, 2.0, 3.0, 4.5], vec![1.0; 4], vec![0.0; 4]).unwrap();
        let err = Solver::default().fit(two_entry_basis(), shifted).unwrap_err();
        assert!(matches!(err, FitError::DimensionMismatch { .. }));
    }

    #[test]
    fn fit_shares_inputs_without_copying() {
        let basis = Arc::new(two_entry_basis());
        let obs = Arc::new(
            Observation::new(AbscissaUnit::Wavelength, vec![1.0, 2.0, 3.0, 4.0], vec![1.0; 4], vec![0.0; 4]).unwrap(),
        );
        let fit = Solver::default().fit(Arc::clone(&basis), Arc::clone(&obs)).unwrap();
        assert_eq!(fit.basis(), basis.as_ref());
        assert_eq!(Arc::strong_count(&basis), 2);
    }
}
