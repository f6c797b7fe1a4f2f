//! Damped Newton solver with backtracking line search.

use crate::error::{SolverError, SolverResult};
use crate::jacobian::finite_difference_jacobian;
use nalgebra::DVector;
use tracing::trace;

/// Newton solver configuration.
#[derive(Clone, Debug)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance on the max-norm of the residual
    pub abs_tol: f64,
    /// Relative tolerance against the initial residual
    pub rel_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
    /// Relative finite difference step for the Jacobian
    pub fd_epsilon: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-6,
            rel_tol: 0.0,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
            fd_epsilon: 1e-7,
        }
    }
}

/// Iteration result shared by the Newton and Levenberg-Marquardt solvers.
#[derive(Clone, Debug)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Final residual max-norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
    /// Converged flag
    pub converged: bool,
}

/// Newton solver for square systems with a finite difference Jacobian.
///
/// A trial point where `residual_fn` reports divergence is handled like a
/// trial point that does not reduce the residual: the step is halved.
pub fn newton_solve<F>(
    x0: DVector<f64>,
    mut residual_fn: F,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: FnMut(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    if r.len() != x.len() {
        return Err(SolverError::ProblemSetup {
            what: format!(
                "Newton needs a square system, got {} equations for {} unknowns",
                r.len(),
                x.len()
            ),
        });
    }
    let mut r_norm = r.amax();
    let r0_norm = r_norm;

    for iter in 0..config.max_iterations {
        if !r_norm.is_finite() {
            return Err(SolverError::Numeric {
                what: format!("non-finite residual at iteration {iter}"),
            });
        }
        if r_norm <= config.abs_tol || r_norm <= config.rel_tol * r0_norm {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
                converged: true,
            });
        }

        let jac = finite_difference_jacobian(&x, &r, &mut residual_fn, config.fd_epsilon)?;

        // Solve J * dx = -r
        let dx = jac
            .lu()
            .solve(&(-&r))
            .ok_or_else(|| SolverError::Numeric {
                what: "Jacobian solve failed".to_string(),
            })?;

        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..=config.max_line_search_iters {
            let x_new = &x + alpha * &dx;
            match residual_fn(&x_new) {
                Ok(r_new) => {
                    let r_new_norm = r_new.amax();
                    if r_new_norm < r_norm {
                        accepted = Some((x_new, r_new, r_new_norm));
                        break;
                    }
                }
                Err(e) if e.is_divergence() => {}
                Err(e) => return Err(e),
            }
            alpha *= config.line_search_beta;
        }

        let Some((x_new, r_new, r_new_norm)) = accepted else {
            return Err(SolverError::ConvergenceFailed {
                what: format!("Line search stagnated at iteration {iter}, residual = {r_norm}"),
            });
        };
        trace!(iter, alpha, residual = r_new_norm, "newton step");

        x = x_new;
        r = r_new;
        r_norm = r_new_norm;
    }

    if r_norm <= config.abs_tol {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: config.max_iterations,
            converged: true,
        });
    }

    Err(SolverError::ConvergenceFailed {
        what: format!(
            "Maximum iterations {} reached, residual = {}",
            config.max_iterations, r_norm
        ),
    })
}
