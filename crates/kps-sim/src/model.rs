//! DaeModel trait for fully implicit dynamic systems.

use kps_model::{KiteModel, KiteSystem, ModelResult};

/// A system written as `F(t, y, yd) = 0`.
pub trait DaeModel {
    /// Values reported alongside each recorded state.
    type Output: Clone;

    /// Length of `y`, `yd` and the residual.
    fn dimension(&self) -> usize;

    /// Evaluate the residual. Called many times per step, never concurrently.
    fn residual(&mut self, t: f64, y: &[f64], yd: &[f64], res: &mut [f64]) -> ModelResult<()>;

    /// Notification that the step ending at `t` was accepted.
    fn step_accepted(&mut self, _t: f64) {}

    /// Outputs of the last residual evaluation.
    fn output(&self) -> Self::Output;
}

/// Recorded kite quantities.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KiteOutput {
    /// Tension per winch line (N)
    pub winch_forces: Vec<f64>,
    /// Unstretched length per line (m)
    pub tether_lengths: Vec<f64>,
    pub lift: f64,
    pub drag: f64,
}

impl DaeModel for KiteSystem {
    type Output = KiteOutput;

    fn dimension(&self) -> usize {
        self.layout().len()
    }

    fn residual(&mut self, t: f64, y: &[f64], yd: &[f64], res: &mut [f64]) -> ModelResult<()> {
        KiteModel::residual(self, y, yd, t, res)
    }

    fn step_accepted(&mut self, t: f64) {
        // Single-tether lengths live in the session; commit them so the next
        // step integrates from the accepted time.
        if !matches!(self, KiteSystem::ThreeLine(_)) {
            let v = self.session().v_reel_out;
            self.set_v_reel_out(v, t);
        }
    }

    fn output(&self) -> KiteOutput {
        let (lift, drag) = self.lift_drag();
        KiteOutput {
            winch_forces: self.winch_forces().to_vec(),
            tether_lengths: self.tether_lengths().to_vec(),
            lift,
            drag,
        }
    }
}
