//! The kite model family.

use crate::error::{ModelError, ModelResult};
use crate::four_point::FourPointModel;
use crate::frame::KiteFrame;
use crate::layout::StateLayout;
use crate::one_point::OnePointModel;
use crate::session::SessionState;
use crate::three_line::ThreeLineModel;
use kps_config::{EnvironmentDef, ModelKind, Settings};
use kps_core::{Vec3, deg, ensure_finite, radians};
use kps_env::{StandardEnvironment, WindProfile};

/// Below this apparent wind speed (m/s) the kite carries no aerodynamic load.
pub(crate) const MIN_APPARENT_WIND: f64 = 1e-9;

/// Residual norm below which the state counts as accepted for reporting.
pub(crate) const ACCEPT_NORM: f64 = 10.0;

/// Capability set shared by all kite models.
///
/// A model owns its particles and session state. The integrator owns the
/// state vector and calls [`KiteModel::residual`] strictly sequentially.
pub trait KiteModel {
    fn layout(&self) -> &StateLayout;

    /// Reset to the quiescent initial configuration.
    fn clear(&mut self) -> ModelResult<()>;

    /// Fill `res` so that it vanishes exactly when `(y, yd)` is a physically
    /// consistent state at `time`.
    fn residual(&mut self, y: &[f64], yd: &[f64], time: f64, res: &mut [f64])
    -> ModelResult<()>;

    /// Number of free parameters of the steady-state parametrization.
    fn steady_param_count(&self) -> usize;

    /// Build `(y, yd)` from steady-state parameters: straight lines at the
    /// configured elevation, perturbed by `x`, moving at the reel-out speed.
    fn steady_state(&self, x: &[f64]) -> ModelResult<(Vec<f64>, Vec<f64>)>;

    /// Pick the acceleration equations matching the steady-state parameters.
    fn steady_equations(&self, res: &[f64]) -> Vec<f64>;

    fn session(&self) -> &SessionState;

    /// Particle positions of the last residual evaluation.
    fn positions(&self) -> &[Vec3];

    fn kite_frame(&self) -> Option<KiteFrame>;

    /// Commit the tether length reached at `t0` and continue at `v_reel_out`.
    fn set_v_reel_out(&mut self, v_reel_out: f64, t0: f64);

    /// Relative steering input, -1..1.
    fn set_steering(&mut self, steering: f64);

    /// Measured tension per winch line (N).
    fn winch_forces(&self) -> &[f64] {
        &self.session().winch_forces
    }

    /// Magnitudes of total lift and drag (N).
    fn lift_drag(&self) -> (f64, f64) {
        let s = self.session();
        (s.lift.norm(), s.drag.norm())
    }

    /// Unstretched length per line (m).
    fn tether_lengths(&self) -> &[f64] {
        &self.session().lengths
    }
}

/// Model selected from settings.
pub enum KiteSystem {
    OnePoint(OnePointModel),
    FourPoint(FourPointModel),
    ThreeLine(ThreeLineModel),
}

impl KiteSystem {
    pub fn from_settings(settings: &Settings) -> ModelResult<Self> {
        let system = match settings.system.model {
            ModelKind::OnePoint => KiteSystem::OnePoint(OnePointModel::new(settings)?),
            ModelKind::FourPoint => KiteSystem::FourPoint(FourPointModel::new(settings)?),
            ModelKind::ThreeLine => KiteSystem::ThreeLine(ThreeLineModel::new(settings)?),
        };
        tracing::debug!(
            model = ?settings.system.model,
            segments = settings.system.segments,
            dimension = system.layout().len(),
            "kite model built"
        );
        Ok(system)
    }

    fn inner(&self) -> &dyn KiteModel {
        match self {
            KiteSystem::OnePoint(m) => m,
            KiteSystem::FourPoint(m) => m,
            KiteSystem::ThreeLine(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn KiteModel {
        match self {
            KiteSystem::OnePoint(m) => m,
            KiteSystem::FourPoint(m) => m,
            KiteSystem::ThreeLine(m) => m,
        }
    }
}

impl KiteModel for KiteSystem {
    fn layout(&self) -> &StateLayout {
        self.inner().layout()
    }

    fn clear(&mut self) -> ModelResult<()> {
        self.inner_mut().clear()
    }

    fn residual(
        &mut self,
        y: &[f64],
        yd: &[f64],
        time: f64,
        res: &mut [f64],
    ) -> ModelResult<()> {
        self.inner_mut().residual(y, yd, time, res)
    }

    fn steady_param_count(&self) -> usize {
        self.inner().steady_param_count()
    }

    fn steady_state(&self, x: &[f64]) -> ModelResult<(Vec<f64>, Vec<f64>)> {
        self.inner().steady_state(x)
    }

    fn steady_equations(&self, res: &[f64]) -> Vec<f64> {
        self.inner().steady_equations(res)
    }

    fn session(&self) -> &SessionState {
        self.inner().session()
    }

    fn positions(&self) -> &[Vec3] {
        self.inner().positions()
    }

    fn kite_frame(&self) -> Option<KiteFrame> {
        self.inner().kite_frame()
    }

    fn set_v_reel_out(&mut self, v_reel_out: f64, t0: f64) {
        self.inner_mut().set_v_reel_out(v_reel_out, t0)
    }

    fn set_steering(&mut self, steering: f64) {
        self.inner_mut().set_steering(steering)
    }
}

pub(crate) fn environment_from_settings(env: &EnvironmentDef) -> StandardEnvironment {
    let profile = WindProfile {
        law: env.profile_law,
        alpha: env.alpha,
        z0: env.z0,
        h_ref: env.h_ref,
        h_min: env.h_min,
    };
    StandardEnvironment::new(
        profile,
        env.rho_0,
        env.v_wind,
        radians(deg(env.wind_direction_deg)),
    )
}

pub(crate) fn require(ok: bool, what: &str) -> ModelResult<()> {
    if ok {
        Ok(())
    } else {
        Err(ModelError::Config {
            what: what.to_string(),
        })
    }
}

/// Every entry of `res` must be finite.
pub(crate) fn ensure_finite_residual(res: &[f64]) -> ModelResult<()> {
    for &r in res {
        ensure_finite(r, "residual")?;
    }
    Ok(())
}

pub(crate) fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
