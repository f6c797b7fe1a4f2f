//! Levenberg-Marquardt least squares solver.
//!
//! Damping follows Nielsen's gain-ratio update: accepted steps shrink `mu`
//! by `max(1/3, 1 - (2 rho - 1)^3)`, rejected steps grow it geometrically.

use crate::error::{SolverError, SolverResult};
use crate::jacobian::finite_difference_jacobian;
use crate::newton::NewtonResult;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

/// Levenberg-Marquardt configuration.
#[derive(Clone, Debug)]
pub struct LmConfig {
    /// Maximum outer iterations (accepted or rejected steps)
    pub max_iterations: usize,
    /// Tolerance on the max-norm of the residual
    pub abs_tol: f64,
    /// Relative finite difference step for the Jacobian
    pub fd_epsilon: f64,
    /// Initial damping, relative to the largest diagonal entry of J^T J
    pub initial_damping: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            abs_tol: 1e-6,
            fd_epsilon: 1e-7,
            initial_damping: 1e-3,
        }
    }
}

struct Linearization {
    jtj: DMatrix<f64>,
    gradient: DVector<f64>,
}

impl Linearization {
    fn new(jac: &DMatrix<f64>, r: &DVector<f64>) -> Self {
        let jt = jac.transpose();
        Self {
            jtj: &jt * jac,
            gradient: jt * r,
        }
    }

    /// Solve (J^T J + mu I) h = -g.
    fn step(&self, mu: f64) -> Option<DVector<f64>> {
        let mut a = self.jtj.clone();
        for i in 0..a.nrows() {
            a[(i, i)] += mu;
        }
        let rhs = -&self.gradient;
        match a.clone().cholesky() {
            Some(chol) => Some(chol.solve(&rhs)),
            None => a.lu().solve(&rhs),
        }
    }
}

/// Minimize |f(x)|^2 until the residual max-norm drops below `abs_tol`.
///
/// Trial points where `residual_fn` reports divergence are rejected like a
/// step that increases the residual. Jacobian columns whose forward point
/// diverges are differenced backwards instead. A failure at `x0` itself, or
/// on both sides of a column, is returned.
pub fn levenberg_marquardt<F>(
    x0: DVector<f64>,
    mut residual_fn: F,
    config: &LmConfig,
) -> SolverResult<NewtonResult>
where
    F: FnMut(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    if x0.is_empty() {
        return Err(SolverError::ProblemSetup {
            what: "no unknowns".to_string(),
        });
    }

    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.amax();
    if !r_norm.is_finite() {
        return Err(SolverError::Numeric {
            what: "non-finite residual at the initial guess".to_string(),
        });
    }
    if r_norm <= config.abs_tol {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: 0,
            converged: true,
        });
    }

    let jac = finite_difference_jacobian(&x, &r, &mut residual_fn, config.fd_epsilon)?;
    let mut lin = Linearization::new(&jac, &r);
    let max_diag = lin.jtj.diagonal().amax();
    let mut mu = config.initial_damping * if max_diag > 0.0 { max_diag } else { 1.0 };
    let mut nu = 2.0;

    for iter in 1..=config.max_iterations {
        let Some(h) = lin.step(mu) else {
            mu *= nu;
            nu *= 2.0;
            continue;
        };
        if h.norm() <= 1e-15 * (x.norm() + 1e-15) {
            return Err(SolverError::ConvergenceFailed {
                what: format!("step vanished at iteration {iter}, residual = {r_norm}"),
            });
        }

        let x_new = &x + &h;
        let r_new = match residual_fn(&x_new) {
            Ok(r_new) if r_new.iter().all(|v| v.is_finite()) => Some(r_new),
            Ok(_) => None,
            Err(e) if e.is_divergence() => None,
            Err(e) => return Err(e),
        };

        let gain = r_new.as_ref().map(|r_new| {
            let actual = 0.5 * (r.norm_squared() - r_new.norm_squared());
            let predicted = 0.5 * h.dot(&(mu * &h - &lin.gradient));
            if predicted > 0.0 { actual / predicted } else { -1.0 }
        });

        match (r_new, gain) {
            (Some(r_new), Some(rho)) if rho > 0.0 => {
                x = x_new;
                r = r_new;
                r_norm = r.amax();
                trace!(iter, residual = r_norm, mu, rho, "lm step accepted");
                if r_norm <= config.abs_tol {
                    debug!(iterations = iter, residual = r_norm, "levenberg-marquardt converged");
                    return Ok(NewtonResult {
                        x,
                        residual_norm: r_norm,
                        iterations: iter,
                        converged: true,
                    });
                }
                let jac = finite_difference_jacobian(&x, &r, &mut residual_fn, config.fd_epsilon)?;
                lin = Linearization::new(&jac, &r);
                mu *= (1.0 - (2.0 * rho - 1.0).powi(3)).max(1.0 / 3.0);
                nu = 2.0;
            }
            _ => {
                trace!(iter, mu, "lm step rejected");
                mu *= nu;
                nu *= 2.0;
            }
        }

        if !mu.is_finite() {
            return Err(SolverError::ConvergenceFailed {
                what: format!("damping overflow at iteration {iter}, residual = {r_norm}"),
            });
        }
    }

    Err(SolverError::ConvergenceFailed {
        what: format!(
            "Maximum iterations {} reached, residual = {}",
            config.max_iterations, r_norm
        ),
    })
}
