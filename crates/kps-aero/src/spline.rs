//! Natural cubic spline interpolation.

use crate::error::{AeroError, AeroResult};

/// Interpolating cubic spline with zero curvature at both ends.
///
/// Passes exactly through every knot and is twice continuously differentiable
/// between the first and the last knot.
#[derive(Clone, Debug)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivative at each knot
    m: Vec<f64>,
}

impl CubicSpline {
    /// Build the spline through `(x[i], y[i])`; `x` must be strictly increasing.
    pub fn new(table: &'static str, x: &[f64], y: &[f64]) -> AeroResult<Self> {
        if x.len() != y.len() {
            return Err(AeroError::InvalidTable {
                table,
                what: format!("{} angles but {} coefficients", x.len(), y.len()),
            });
        }
        if x.len() < 2 {
            return Err(AeroError::InvalidTable {
                table,
                what: "at least two knots required".to_string(),
            });
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(AeroError::InvalidTable {
                table,
                what: "non-finite entry".to_string(),
            });
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AeroError::InvalidTable {
                table,
                what: format!("angles not strictly increasing at index {}", i + 1),
            });
        }

        let m = second_derivatives(x, y);
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    /// Evaluate at `xv`; outside the knot range the end polynomial is continued.
    pub fn eval(&self, xv: f64) -> f64 {
        let n = self.x.len();
        // interval i spans x[i]..x[i+1]
        let i = self
            .x
            .partition_point(|&xk| xk <= xv)
            .saturating_sub(1)
            .min(n - 2);

        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - xv) / h;
        let b = (xv - self.x[i]) / h;
        a * self.y[i]
            + b * self.y[i + 1]
            + ((a * a * a - a) * self.m[i] + (b * b * b - b) * self.m[i + 1]) * h * h / 6.0
    }
}

/// Solve the tridiagonal system for the knot curvatures (Thomas algorithm).
fn second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    // interior equations i = 1..n-2
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];
    for i in 1..n - 1 {
        let h0 = x[i] - x[i - 1];
        let h1 = x[i + 1] - x[i];
        let sub = h0 / 6.0;
        let diag = (h0 + h1) / 3.0;
        let sup = h1 / 6.0;
        let rhs = (y[i + 1] - y[i]) / h1 - (y[i] - y[i - 1]) / h0;

        let denom = diag - sub * c_prime[i - 1];
        c_prime[i] = sup / denom;
        d_prime[i] = (rhs - sub * d_prime[i - 1]) / denom;
    }

    for i in (1..n - 1).rev() {
        m[i] = d_prime[i] - c_prime[i] * m[i + 1];
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_knots() {
        let x = [-2.0, -0.5, 0.0, 1.0, 3.0];
        let y = [4.0, 0.25, 0.0, 1.0, 9.0];
        let s = CubicSpline::new("t", &x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert!((s.eval(*xi) - yi).abs() < 1e-12);
        }
    }

    #[test]
    fn reproduces_straight_line() {
        let x = [0.0, 1.0, 2.5, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v - 1.0).collect();
        let s = CubicSpline::new("t", &x, &y).unwrap();
        for v in [0.3, 1.7, 3.9] {
            assert!((s.eval(v) - (2.0 * v - 1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn two_knots_is_linear() {
        let s = CubicSpline::new("t", &[0.0, 10.0], &[1.0, 3.0]).unwrap();
        assert!((s.eval(5.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn continuous_first_derivative_at_knot() {
        let s = CubicSpline::new("t", &[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 0.0, 1.0]).unwrap();
        let eps = 1e-6;
        let left = (s.eval(1.0) - s.eval(1.0 - eps)) / eps;
        let right = (s.eval(1.0 + eps) - s.eval(1.0)) / eps;
        assert!((left - right).abs() < 1e-4);
    }

    #[test]
    fn rejects_unsorted_angles() {
        let err = CubicSpline::new("cl", &[0.0, 2.0, 1.0], &[0.0, 0.0, 0.0]).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn rejects_length_mismatch() {
        assert!(CubicSpline::new("cd", &[0.0, 1.0], &[0.0]).is_err());
    }
}
