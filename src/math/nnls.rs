//! Non-negative least squares (Lawson-Hanson active set).
//!
//! ```text
//! minimize ||A x - b||_2   subject to   x >= 0
//! ```
//!
//! Variables move between an active set (pinned at zero) and a passive set
//! (free). Each inner step solves the unconstrained problem on the passive
//! columns and, if that leaves the feasible region, walks back along the
//! segment to the first blocking bound.
//!
//! The loop runs on a normalized copy of the problem: every non-zero column
//! and `b` are scaled to unit 2-norm, so the tolerances below are relative and
//! the solve behaves the same at any flux scale.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::FitError;
use crate::math::solve_least_squares;

/// Solver knobs. `None` picks the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NnlsOptions {
    /// Cap on inner iterations; defaults to `3 * ncols`.
    pub max_iter: Option<usize>,
    /// Dual feasibility tolerance on the normalized problem; defaults to
    /// `10 * eps * ||A||_1 * max(m, n)`.
    pub tolerance: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NnlsSolution {
    /// Solution with every component `>= 0`.
    pub x: DVector<f64>,
    pub iterations: usize,
}

pub fn solve_nnls(a: &DMatrix<f64>, b: &DVector<f64>, opts: &NnlsOptions) -> Result<NnlsSolution, FitError> {
    let (m, n) = a.shape();
    if n == 0 {
        return Err(FitError::EmptyBasis);
    }
    if b.len() != m {
        return Err(FitError::dimension("right-hand side", m, b.len()));
    }

    let b_norm = b.norm();
    if b_norm == 0.0 {
        return Ok(NnlsSolution {
            x: DVector::zeros(n),
            iterations: 0,
        });
    }
    if !b_norm.is_finite() {
        return Err(FitError::singular("NNLS right-hand side is not finite"));
    }

    let col_norms: Vec<f64> = a
        .column_iter()
        .map(|c| {
            let norm = c.norm();
            if norm > 0.0 { norm } else { 1.0 }
        })
        .collect();
    let mut a_unit = a.clone();
    for (mut col, &norm) in a_unit.column_iter_mut().zip(&col_norms) {
        col.scale_mut(1.0 / norm);
    }
    let b_unit = b / b_norm;

    let mut solution = active_set(&a_unit, &b_unit, opts)?;
    for (v, &norm) in solution.x.iter_mut().zip(&col_norms) {
        *v *= b_norm / norm;
    }
    if solution.x.iter().any(|v| !v.is_finite()) {
        return Err(FitError::singular("NNLS produced non-finite weights"));
    }
    Ok(solution)
}

fn active_set(a: &DMatrix<f64>, b: &DVector<f64>, opts: &NnlsOptions) -> Result<NnlsSolution, FitError> {
    let (m, n) = a.shape();
    let max_iter = opts.max_iter.unwrap_or(3 * n).max(1);
    let tol = opts.tolerance.unwrap_or_else(|| default_tolerance(a));

    let mut x = DVector::<f64>::zeros(n);
    let mut passive = vec![false; n];
    // Entering variables whose own subproblem came back non-positive. In exact
    // arithmetic this cannot happen; numerically it would cycle forever.
    let mut rejected = vec![false; n];
    let mut iterations = 0usize;

    let mut w = a.transpose() * (b - a * &x);

    loop {
        let entering = (0..n)
            .filter(|&j| !passive[j] && !rejected[j] && w[j] > tol)
            .max_by(|&i, &j| w[i].total_cmp(&w[j]));
        let Some(j) = entering else {
            break;
        };
        passive[j] = true;
        let mut first_step = true;

        loop {
            iterations += 1;
            if iterations > max_iter {
                return Err(FitError::singular(format!(
                    "NNLS did not converge within {max_iter} iterations"
                )));
            }

            let cols: Vec<usize> = (0..n).filter(|&k| passive[k]).collect();
            let z_sub = solve_least_squares(&a.select_columns(&cols), b).ok_or_else(|| {
                FitError::singular(format!(
                    "least-squares subproblem on {} columns has no finite solution",
                    cols.len()
                ))
            })?;

            let mut z = DVector::<f64>::zeros(n);
            for (&k, &v) in cols.iter().zip(z_sub.iter()) {
                z[k] = v;
            }

            if cols.iter().all(|&k| z[k] > 0.0) {
                x = z;
                rejected.iter_mut().for_each(|r| *r = false);
                break;
            }

            if first_step && z[j] <= 0.0 {
                passive[j] = false;
                rejected[j] = true;
                break;
            }
            first_step = false;

            // Largest step toward z that keeps every passive variable >= 0.
            let mut alpha = 1.0_f64;
            for &k in &cols {
                if z[k] <= 0.0 {
                    let denom = x[k] - z[k];
                    let step = if denom > 0.0 { x[k] / denom } else { 0.0 };
                    alpha = alpha.min(step);
                }
            }
            let step = (&z - &x) * alpha;
            x += step;

            for &k in &cols {
                if x[k] <= tol {
                    x[k] = 0.0;
                    passive[k] = false;
                }
            }
            if !passive.iter().any(|&p| p) {
                break;
            }
        }

        w = a.transpose() * (b - a * &x);
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(FitError::singular("NNLS produced non-finite weights"));
    }
    // Round-off can leave tiny negatives behind; the contract is exact.
    x.iter_mut().for_each(|v| *v = v.max(0.0));

    debug!(rows = m, cols = n, iterations, tolerance = tol, "nnls converged");
    Ok(NnlsSolution { x, iterations })
}

fn default_tolerance(a: &DMatrix<f64>) -> f64 {
    let norm_1 = a
        .column_iter()
        .map(|c| c.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0_f64, f64::max);
    10.0 * f64::EPSILON * norm_1 * a.nrows().max(a.ncols()) as f64
}
