//! Unconstrained least squares.
//!
//! The NNLS active-set loop repeatedly solves
//!
//! ```text
//! minimize ||A_P z - b||
//! ```
//!
//! where `A_P` holds the columns of the currently passive (free) variables.
//! `A_P` is tall in practice (many spectral samples, few species), but may be
//! rank deficient when two reference spectra are nearly collinear, so we solve
//! through the SVD rather than the normal equations.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no tolerance yields a finite solution.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if a.ncols() == 0 || a.nrows() != b.len() {
        return None;
    }

    let svd = a.clone().svd(true, true);
    let scale = svd.singular_values.max();

    // Relax the singular value cutoff step by step; nearly collinear reference
    // spectra otherwise blow up the minimum-norm solution.
    for &rel in &[1e-12, 1e-10, 1e-8] {
        if let Ok(z) = svd.solve(b, rel * scale) {
            if z.iter().all(|v| v.is_finite()) {
                return Some(z);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let z = solve_least_squares(&a, &b).unwrap();
        assert!((z[0] - 2.0).abs() < 1e-10);
        assert!((z[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_cutoff_is_relative() {
        let a = DMatrix::from_row_slice(3, 2, &[1e-20, 0.0, 0.0, 1e-20, 1e-20, 1e-20]);
        let b = DVector::from_row_slice(&[2e-20, 3e-20, 5e-20]);

        let z = solve_least_squares(&a, &b).unwrap();
        assert!((z[0] - 2.0).abs() < 1e-10, "{z}");
        assert!((z[1] - 3.0).abs() < 1e-10, "{z}");
    }

    #[test]
    fn least_squares_rejects_shape_mismatch() {
        let a = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&a, &b).is_none());
    }
}
