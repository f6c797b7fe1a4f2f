//! Steady-state initialization of a kite model.

use crate::error::{SolverError, SolverResult};
use crate::levenberg::{LmConfig, levenberg_marquardt};
use kps_config::SolverDef;
use kps_model::KiteModel;
use nalgebra::DVector;
use tracing::{info, warn};

/// Steady-state solver settings.
#[derive(Clone, Debug)]
pub struct SteadyConfig {
    /// Max-norm tolerance on the acceleration residual (m/s²)
    pub tol: f64,
    pub max_iter: usize,
    pub fd_epsilon: f64,
    pub lm_damping: f64,
}

impl Default for SteadyConfig {
    fn default() -> Self {
        Self::from(&SolverDef::default())
    }
}

impl From<&SolverDef> for SteadyConfig {
    fn from(def: &SolverDef) -> Self {
        Self {
            tol: def.steady_tol,
            max_iter: def.max_iter,
            fd_epsilon: def.fd_epsilon,
            lm_damping: def.lm_damping,
        }
    }
}

/// Converged steady state.
#[derive(Clone, Debug)]
pub struct SteadySolution {
    /// Steady-state parameters (node offsets, connection deflections)
    pub params: DVector<f64>,
    /// Consistent initial state vector
    pub y0: Vec<f64>,
    /// Matching state derivative
    pub yd0: Vec<f64>,
    /// Residual max-norm at convergence
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Find an equilibrium of `model` at time 0 for its configured elevation,
/// tether length and reel-out speed.
///
/// The search starts from straight lines (all parameters zero). On success
/// the model holds the forces and positions of the returned state.
pub fn find_steady_state<M>(model: &mut M, config: &SteadyConfig) -> SolverResult<SteadySolution>
where
    M: KiteModel + ?Sized,
{
    if !(config.tol > 0.0) || config.max_iter == 0 {
        return Err(SolverError::ProblemSetup {
            what: format!(
                "steady tolerance {} and iteration cap {} must be positive",
                config.tol, config.max_iter
            ),
        });
    }

    let n = model.steady_param_count();
    let mut res = vec![0.0; model.layout().len()];
    let lm = LmConfig {
        max_iterations: config.max_iter,
        abs_tol: config.tol,
        fd_epsilon: config.fd_epsilon,
        initial_damping: config.lm_damping,
    };

    let outcome = {
        let model = &mut *model;
        let res = &mut res;
        let equations = move |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            let (y, yd) = model.steady_state(x.as_slice())?;
            model.residual(&y, &yd, 0.0, res.as_mut_slice())?;
            Ok(DVector::from_vec(model.steady_equations(res.as_slice())))
        };
        levenberg_marquardt(DVector::zeros(n), equations, &lm)
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            warn!(unknowns = n, error = %e, "steady state not found");
            return Err(e);
        }
    };

    let (y0, yd0) = model.steady_state(result.x.as_slice())?;
    model.residual(&y0, &yd0, 0.0, &mut res)?;

    let (lift, drag) = model.lift_drag();
    info!(
        iterations = result.iterations,
        residual = result.residual_norm,
        winch_force = ?model.winch_forces(),
        lift,
        drag,
        "steady state found"
    );

    Ok(SteadySolution {
        params: result.x,
        y0,
        yd0,
        residual_norm: result.residual_norm,
        iterations: result.iterations,
    })
}
