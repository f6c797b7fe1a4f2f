//! Simulation runner and result recording.

use crate::error::{SimError, SimResult};
use crate::integrator::{ImplicitEuler, Integrator};
use crate::model::DaeModel;
use kps_solver::NewtonConfig;
use tracing::{debug, info, warn};

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Nominal time step (seconds)
    pub dt: f64,
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of accepted steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
    /// Smallest step the cutback may reach (seconds)
    pub min_dt: f64,
    /// Cutbacks allowed for a single step
    pub max_retries: usize,
    /// Step multiplier after a failed attempt
    pub cutback_factor: f64,
    /// Step multiplier after an accepted step, capped at `dt`
    pub grow_factor: f64,
    /// Max-norm tolerance of the implicit solve
    pub newton_tol: f64,
    /// Newton iterations per step attempt
    pub newton_max_iter: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 0.05,
            t_end: 1.0,
            max_steps: 100_000,
            record_every: 1,
            min_dt: 1e-5,
            max_retries: 8,
            cutback_factor: 0.5,
            grow_factor: 2.0,
            newton_tol: 1e-6,
            newton_max_iter: 20,
        }
    }
}

/// Record of simulation results.
#[derive(Clone, Debug)]
pub struct SimRecord<O> {
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// State snapshots
    pub y: Vec<Vec<f64>>,
    /// Model outputs at each recorded time
    pub outputs: Vec<O>,
}

impl<O> SimRecord<O> {
    fn push(&mut self, t: f64, y: &[f64], output: O) {
        self.t.push(t);
        self.y.push(y.to_vec());
        self.outputs.push(output);
    }
}

fn check_options(opts: &SimOptions) -> SimResult<()> {
    if !(opts.dt > 0.0) {
        return Err(SimError::InvalidArg {
            what: "dt must be positive",
        });
    }
    if !(opts.t_end >= 0.0) {
        return Err(SimError::InvalidArg {
            what: "t_end must be non-negative",
        });
    }
    if opts.max_steps == 0 {
        return Err(SimError::InvalidArg {
            what: "max_steps must be positive",
        });
    }
    if opts.record_every == 0 {
        return Err(SimError::InvalidArg {
            what: "record_every must be positive",
        });
    }
    if !(opts.min_dt > 0.0) || opts.min_dt > opts.dt {
        return Err(SimError::InvalidArg {
            what: "min_dt must be positive and not above dt",
        });
    }
    if !(opts.cutback_factor > 0.0 && opts.cutback_factor < 1.0) {
        return Err(SimError::InvalidArg {
            what: "cutback_factor must be in (0, 1)",
        });
    }
    if !(opts.grow_factor >= 1.0) {
        return Err(SimError::InvalidArg {
            what: "grow_factor must be at least 1",
        });
    }
    Ok(())
}

/// Integrate `model` from `(y0, yd0)` at t = 0 to `opts.t_end` with the
/// backward Euler method.
///
/// A step whose implicit solve fails is retried with a smaller step; model
/// divergence aborts the run.
pub fn run_sim<M: DaeModel>(
    model: &mut M,
    y0: &[f64],
    yd0: &[f64],
    opts: &SimOptions,
) -> SimResult<SimRecord<M::Output>> {
    check_options(opts)?;
    let n = model.dimension();
    if y0.len() != n || yd0.len() != n {
        return Err(SimError::InvalidArg {
            what: "initial state length does not match the model dimension",
        });
    }

    let integrator = ImplicitEuler {
        newton: NewtonConfig {
            max_iterations: opts.newton_max_iter,
            abs_tol: opts.newton_tol,
            ..NewtonConfig::default()
        },
    };

    let mut t = 0.0;
    let mut y = y0.to_vec();
    let mut yd = yd0.to_vec();

    let mut res = vec![0.0; n];
    model.residual(t, &y, &yd, &mut res)?;
    let mut record = SimRecord {
        t: Vec::new(),
        y: Vec::new(),
        outputs: Vec::new(),
    };
    record.push(t, &y, model.output());

    let t_eps = 1e-9 * opts.dt;
    let mut h = opts.dt;
    let mut step = 0;
    let mut cutbacks = 0;
    while opts.t_end - t > t_eps && step < opts.max_steps {
        let mut h_try = h.min(opts.t_end - t);
        let mut retries = 0;
        let (y1, yd1) = loop {
            match integrator.step(model, t, &y, &yd, h_try) {
                Ok(next) => break next,
                Err(SimError::Retryable { message }) => {
                    retries += 1;
                    let h_next = h_try * opts.cutback_factor;
                    if retries > opts.max_retries || h_next < opts.min_dt {
                        warn!(t, dt = h_try, retries, %message, "time step cutback exhausted");
                        return Err(SimError::ConvergenceFailed {
                            what: "time step cutback exhausted",
                        });
                    }
                    debug!(t, dt = h_next, %message, "cutting back time step");
                    h_try = h_next;
                    cutbacks += 1;
                }
                Err(e) => return Err(e),
            }
        };

        t += h_try;
        y = y1;
        yd = yd1;
        step += 1;
        model.step_accepted(t);

        if step % opts.record_every == 0 {
            record.push(t, &y, model.output());
        }

        h = (h_try * opts.grow_factor).min(opts.dt);
    }

    // Always record final state
    if step % opts.record_every != 0 {
        record.push(t, &y, model.output());
    }

    info!(steps = step, cutbacks, t, "simulation finished");
    Ok(record)
}
