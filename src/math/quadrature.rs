//! Integration and norms over sampled spectra.

/// Trapezoidal integral of `y` over `x`.
///
/// The sign follows the grid direction; callers that want an intensity take
/// the absolute value.
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]))
        .sum()
}

/// Euclidean norm.
pub fn norm2(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trapezoid_integrates_linear_exactly() {
        let x = [0.0, 1.0, 2.0, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        // ∫_0^4 (2x + 1) dx = 20
        assert!((trapezoid(&x, &y) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn trapezoid_sign_follows_grid_direction() {
        let x = [3.0, 2.0, 1.0];
        let y = [1.0, 1.0, 1.0];
        assert!((trapezoid(&x, &y) + 2.0).abs() < 1e-12);
        assert_eq!(trapezoid(&[1.0], &[5.0]), 0.0);
    }

    #[test]
    fn norm2_basic() {
        assert!((norm2(&[3.0, 4.0]) - 5.0).abs() < 1e-12);
    }
}
