//! Finite difference Jacobian computation.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use tracing::trace;

/// Compute Jacobian using forward finite differences.
///
/// For each column j, perturbs x[j] by `epsilon * max(|x[j]|, 1)` and
/// computes (f(x+e) - f(x))/e. `f_x` is the already known value at `x`.
///
/// When the forward point diverges (or is non-finite) the column falls back
/// to the backward difference (f(x) - f(x-e))/e. Only a divergence on both
/// sides is returned.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    f: &mut F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: FnMut(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let m = f_x.len();
    let mut jac = DMatrix::zeros(m, n);
    let mut x_perturbed = x.clone();

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);
        x_perturbed[j] = x[j] + dx;
        let df = match f(&x_perturbed) {
            Ok(f_plus) if all_finite(&f_plus) => (f_plus - f_x) / dx,
            Err(e) if !e.is_divergence() => return Err(e),
            _ => {
                trace!(column = j, "forward difference diverged, using backward");
                x_perturbed[j] = x[j] - dx;
                let f_minus = f(&x_perturbed)?;
                if !all_finite(&f_minus) {
                    return Err(SolverError::Numeric {
                        what: format!("non-finite residual on both sides of column {j}"),
                    });
                }
                (f_x - f_minus) / dx
            }
        };
        x_perturbed[j] = x[j];
        jac.set_column(j, &df);
    }

    Ok(jac)
}

fn all_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}
