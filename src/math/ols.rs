//! Least squares solver.
//!
//! The stability scan repeatedly solves tiny regression problems of the form:
//!
//! ```text
//! minimize Σ (y_i - a - b x_i)^2
//! ```
//!
//! over a sliding window of rows. We only need the slope `b`.
//!
//! Implementation choices:
//! - SVD solve, which handles tall design matrices (more rows than columns)
//!   and near-collinear columns without panicking.
//! - Thresholds are centred before solving so the intercept column is not
//!   nearly parallel to the threshold column for large threshold levels.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Slope of the least-squares line `y ≈ a + b x`.
///
/// Returns `None` for mismatched/short inputs, non-finite data, or when all
/// `x` are identical (slope undefined).
pub fn linear_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return None;
    }

    let x_mean = x.iter().sum::<f64>() / n as f64;
    let spread = x.iter().map(|v| (v - x_mean).abs()).fold(0.0_f64, f64::max);
    if spread <= 0.0 {
        return None;
    }

    let mut design = DMatrix::<f64>::zeros(n, 2);
    for (i, &xi) in x.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = xi - x_mean;
    }
    let rhs = DVector::from_row_slice(y);

    solve_least_squares(&design, &rhs).map(|beta| beta[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn slope_recovers_line_at_high_levels() {
        let x: Vec<f64> = (0..8).map(|i| 1_000.0 + 0.25 * i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 4.0 - 0.5 * v).collect();
        let slope = linear_slope(&x, &y).unwrap();
        assert!((slope + 0.5).abs() < 1e-9, "slope={slope}");
    }

    #[test]
    fn slope_of_flat_series_is_zero() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [0.7; 5];
        assert!(linear_slope(&x, &y).unwrap().abs() < 1e-12);
    }

    #[test]
    fn slope_undefined_for_constant_x() {
        assert_eq!(linear_slope(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(linear_slope(&[1.0], &[1.0]), None);
    }
}
