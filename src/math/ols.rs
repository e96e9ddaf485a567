//! Least-squares line fit.
//!
//! Used by the forecast projection to estimate a recent sales pace:
//!
//! ```text
//! minimize Σ (y_i - (a + b x_i))^2
//! ```
//!
//! We solve via SVD so a near-degenerate design (e.g. two points on almost the
//! same day) degrades to `None` instead of panicking.

use nalgebra::{DMatrix, DVector};

/// Fitted `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
}

impl LineFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }
    None
}

/// Fit a straight line through `(x, y)` pairs.
///
/// Needs at least two distinct `x` values.
pub fn fit_line(points: &[(f64, f64)]) -> Option<LineFit> {
    let n = points.len();
    if n < 2 || !points.iter().all(|(x, y)| x.is_finite() && y.is_finite()) {
        return None;
    }
    let first_x = points[0].0;
    if points.iter().all(|(x, _)| (x - first_x).abs() < 1e-12) {
        return None;
    }

    let x = DMatrix::from_fn(n, 2, |r, c| if c == 0 { 1.0 } else { points[r].0 });
    let y = DVector::from_iterator(n, points.iter().map(|&(_, y)| y));
    let beta = solve_least_squares(&x, &y)?;
    Some(LineFit {
        intercept: beta[0],
        slope: beta[1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_an_exact_line() {
        let fit = fit_line(&[(0.0, 2.0), (1.0, 5.0), (2.0, 8.0)]).unwrap();
        assert!((fit.intercept - 2.0).abs() < 1e-10);
        assert!((fit.slope - 3.0).abs() < 1e-10);
        assert!((fit.at(4.0) - 14.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_degenerate_inputs() {
        assert_eq!(fit_line(&[(1.0, 2.0)]), None);
        assert_eq!(fit_line(&[(3.0, 2.0), (3.0, 9.0)]), None);
        assert_eq!(fit_line(&[(0.0, f64::NAN), (1.0, 2.0)]), None);
    }
}
