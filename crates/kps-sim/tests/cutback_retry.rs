//! Cutback retry tests for the transient runner.

use kps_model::{ModelError, ModelResult};
use kps_sim::{DaeModel, SimError, SimOptions, run_sim};

/// y' = -y², y(0) = 1, exact solution 1 / (1 + t).
struct QuadraticDecay;

impl DaeModel for QuadraticDecay {
    type Output = f64;

    fn dimension(&self) -> usize {
        1
    }

    fn residual(&mut self, _t: f64, y: &[f64], yd: &[f64], res: &mut [f64]) -> ModelResult<()> {
        res[0] = yd[0] + y[0] * y[0];
        Ok(())
    }

    fn output(&self) -> f64 {
        0.0
    }
}

/// A single Newton iteration only reaches the tolerance for small steps.
fn one_iteration_options() -> SimOptions {
    SimOptions {
        dt: 0.1,
        t_end: 0.2,
        max_steps: 100,
        record_every: 1,
        min_dt: 1e-3,
        max_retries: 5,
        cutback_factor: 0.5,
        grow_factor: 2.0,
        newton_tol: 1e-6,
        newton_max_iter: 1,
    }
}

#[test]
fn transient_cutback_retries_step() {
    let opts = one_iteration_options();
    let record = run_sim(&mut QuadraticDecay, &[1.0], &[-1.0], &opts)
        .expect("cutback retry should succeed");

    assert!(record.t.len() >= 2, "Expected at least one step recorded");
    assert!(record.t[1] < opts.dt, "First step should be cut back");

    let t_last = *record.t.last().unwrap();
    let y_last = record.y.last().unwrap()[0];
    assert!((t_last - opts.t_end).abs() < 1e-9);
    assert!((y_last - 1.0 / (1.0 + t_last)).abs() < 1e-2);
}

#[test]
fn cutback_stops_at_min_dt() {
    let opts = SimOptions {
        min_dt: 0.04,
        ..one_iteration_options()
    };
    let err = run_sim(&mut QuadraticDecay, &[1.0], &[-1.0], &opts).unwrap_err();
    assert!(matches!(err, SimError::ConvergenceFailed { .. }));
}

/// Fine until t = 0.15, then every evaluation reports divergence.
struct BlowsUp {
    calls_after_blowup: usize,
}

impl DaeModel for BlowsUp {
    type Output = ();

    fn dimension(&self) -> usize {
        1
    }

    fn residual(&mut self, t: f64, y: &[f64], yd: &[f64], res: &mut [f64]) -> ModelResult<()> {
        if t > 0.15 {
            self.calls_after_blowup += 1;
            return Err(ModelError::Diverged {
                what: "test blowup",
                value: t,
            });
        }
        res[0] = yd[0] - y[0];
        Ok(())
    }

    fn output(&self) {}
}

#[test]
fn divergence_aborts_without_cutback() {
    let mut model = BlowsUp {
        calls_after_blowup: 0,
    };
    let opts = SimOptions {
        dt: 0.1,
        t_end: 1.0,
        ..SimOptions::default()
    };
    let err = run_sim(&mut model, &[1.0], &[1.0], &opts).unwrap_err();
    assert!(matches!(err, SimError::Diverged { .. }));
    assert_eq!(model.calls_after_blowup, 1);
}

#[test]
fn records_are_decimated() {
    let opts = SimOptions {
        dt: 0.01,
        t_end: 0.1,
        record_every: 3,
        ..SimOptions::default()
    };
    let record = run_sim(&mut QuadraticDecay, &[1.0], &[-1.0], &opts).unwrap();
    // t = 0, three decimated steps and the final state
    assert_eq!(record.t.len(), 5);
    assert_eq!(record.t.len(), record.outputs.len());
    assert!((record.t[4] - 0.1).abs() < 1e-9);
}
