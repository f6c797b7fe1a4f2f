//! Mutable per-model simulation state.

use crate::winch::WinchSetpoint;
use kps_core::Vec3;

/// Everything a model remembers between residual calls.
///
/// Physics never reads `last_positions`; it exists for reporting only.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub v_wind_gnd: Vec3,
    pub v_wind_kite: Vec3,
    /// Wind at the mean tether height (m/s)
    pub v_wind_tether: Vec3,
    pub v_apparent: Vec3,
    /// Air density at the kite (kg/m³)
    pub rho: f64,
    /// Relative steering input, -1..1
    pub steering: f64,
    /// Depower angle (rad)
    pub depower: f64,
    /// Angle of attack used for the last coefficient lookup (deg)
    pub alpha_deg: f64,
    /// Committed tether length of the one-point model (m)
    pub l_tether: f64,
    pub v_reel_out: f64,
    pub last_v_reel_out: f64,
    /// Start of the current reel-out sub-step (s)
    pub t0: f64,
    /// Current unstretched line lengths, one per winch
    pub lengths: Vec<f64>,
    pub reel_speeds: Vec<f64>,
    pub setpoints: Vec<WinchSetpoint>,
    /// Trailing edge deflections of the left and right kite halves (m)
    pub deflections: [f64; 2],
    pub winch_forces: Vec<f64>,
    pub lift: Vec3,
    pub drag: Vec3,
    pub iterations: u64,
    pub last_positions: Vec<Vec3>,
}

impl SessionState {
    pub fn new(particles: usize, lines: usize) -> Self {
        Self {
            v_wind_gnd: Vec3::zeros(),
            v_wind_kite: Vec3::zeros(),
            v_wind_tether: Vec3::zeros(),
            v_apparent: Vec3::zeros(),
            rho: 0.0,
            steering: 0.0,
            depower: 0.0,
            alpha_deg: 0.0,
            l_tether: 0.0,
            v_reel_out: 0.0,
            last_v_reel_out: 0.0,
            t0: 0.0,
            lengths: vec![0.0; lines],
            reel_speeds: vec![0.0; lines],
            setpoints: vec![WinchSetpoint::default(); lines],
            deflections: [0.0; 2],
            winch_forces: vec![0.0; lines],
            lift: Vec3::zeros(),
            drag: Vec3::zeros(),
            iterations: 0,
            last_positions: vec![Vec3::zeros(); particles],
        }
    }

    /// Tether length at `time`, the reel-out speed ramping linearly from the
    /// previous to the current value over the sub-step started at `t0`.
    pub fn tether_length_at(&self, time: f64) -> f64 {
        let dt = time - self.t0;
        self.l_tether
            + self.last_v_reel_out * dt
            + 0.5 * (self.v_reel_out - self.last_v_reel_out) * dt
    }

    /// Commit the tether length reached at `t0` and continue at `v_reel_out`.
    pub fn commit_reel_out(&mut self, v_reel_out: f64, t0: f64) {
        let length = self.tether_length_at(t0);
        self.l_tether = length;
        self.lengths[0] = length;
        self.last_v_reel_out = self.v_reel_out;
        self.v_reel_out = v_reel_out;
        self.reel_speeds[0] = v_reel_out;
        self.t0 = t0;
    }

    /// Back to the quiescent configuration: ground wind everywhere, no motion,
    /// nominal lengths, no forces.
    pub fn reset(&mut self, v_wind_gnd: Vec3, rho: f64, lengths: &[f64], v_reel_out: f64) {
        self.v_wind_gnd = v_wind_gnd;
        self.v_wind_kite = v_wind_gnd;
        self.v_wind_tether = v_wind_gnd;
        self.v_apparent = v_wind_gnd;
        self.rho = rho;
        self.alpha_deg = 0.0;
        // the main tether is listed last
        self.l_tether = lengths.last().copied().unwrap_or(0.0);
        self.v_reel_out = v_reel_out;
        self.last_v_reel_out = v_reel_out;
        self.t0 = 0.0;
        self.lengths = lengths.to_vec();
        self.reel_speeds = vec![v_reel_out; lengths.len()];
        self.setpoints = vec![WinchSetpoint::Speed(v_reel_out); lengths.len()];
        self.deflections = [0.0; 2];
        self.winch_forces.iter_mut().for_each(|f| *f = 0.0);
        self.lift = Vec3::zeros();
        self.drag = Vec3::zeros();
        self.iterations = 0;
        self.last_positions.iter_mut().for_each(|p| *p = Vec3::zeros());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_quiescent_state() {
        let mut s = SessionState::new(4, 3);
        s.iterations = 17;
        s.lift = Vec3::new(1.0, 2.0, 3.0);
        s.winch_forces[1] = 400.0;
        s.reset(Vec3::new(9.51, 0.0, 0.0), 1.225, &[50.2, 50.2, 50.0], 0.5);

        assert_eq!(s.iterations, 0);
        assert_eq!(s.lift, Vec3::zeros());
        assert_eq!(s.winch_forces, vec![0.0; 3]);
        assert_eq!(s.v_wind_kite, s.v_wind_gnd);
        assert_eq!(s.l_tether, 50.0);
        assert_eq!(s.reel_speeds, vec![0.5; 3]);
        assert_eq!(s.setpoints[2], WinchSetpoint::Speed(0.5));
    }

    #[test]
    fn reel_out_ramps_between_commits() {
        let mut s = SessionState::new(2, 1);
        s.reset(Vec3::zeros(), 1.225, &[100.0], 0.0);
        s.commit_reel_out(2.0, 0.0);
        // ramp from 0 to 2 m/s over the first second
        assert!((s.tether_length_at(1.0) - 101.0).abs() < 1e-12);
        s.commit_reel_out(2.0, 1.0);
        assert!((s.lengths[0] - 101.0).abs() < 1e-12);
        assert!((s.tether_length_at(3.0) - 105.0).abs() < 1e-12);
    }
}
