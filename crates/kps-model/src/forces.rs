//! Spring-damper and tether drag forces of a single segment.

use crate::error::{ModelError, ModelResult};
use crate::particles::{Spring, TetherParams};
use kps_core::Vec3;
use kps_env::Environment;

/// Force contributions of one segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentForce {
    /// Force on `p2` from the spring; `p1` receives its negation
    pub spring: Vec3,
    /// Half the segment's aerodynamic drag, applied to each end
    pub half_drag: Vec3,
    /// Signed axial force (positive in tension)
    pub tension: f64,
}

impl SegmentForce {
    /// Add this segment's contributions to the per-particle force table.
    pub fn apply(&self, spring: &Spring, forces: &mut [Vec3]) {
        forces[spring.p1.index()] += self.half_drag - self.spring;
        forces[spring.p2.index()] += self.half_drag + self.spring;
    }
}

/// Spring, damping and drag force of `spring` for the given end states.
///
/// Tension uses full stiffness; a compressed segment carries the same
/// expression scaled by the compression multiplier of its kind. Drag acts on
/// the apparent wind component perpendicular to the segment, evaluated at the
/// segment's mean height.
pub fn segment_force<E: Environment + ?Sized>(
    env: &E,
    params: &TetherParams,
    spring: &Spring,
    pos1: &Vec3,
    pos2: &Vec3,
    vel1: &Vec3,
    vel2: &Vec3,
) -> ModelResult<SegmentForce> {
    let height = 0.5 * (pos1.z + pos2.z);
    if !(height > 0.0) {
        return Err(ModelError::Diverged {
            what: "segment height",
            value: height,
        });
    }

    let segment = pos1 - pos2;
    let len = segment.norm();
    if !(len > 0.0) || !len.is_finite() {
        return Err(ModelError::Diverged {
            what: "segment length",
            value: len,
        });
    }
    let unit = segment / len;

    let spring_vel = unit.dot(&(vel1 - vel2));
    let damping = spring.damping * params.damping_factor(spring.kind);
    let extension = len - spring.length;
    let mut tension = spring.stiffness * extension + damping * spring_vel;
    if extension < 0.0 {
        tension *= params.compression(spring.kind);
    }

    let mut half_drag = Vec3::zeros();
    if spring.diameter > 0.0 {
        let v_app = env.wind_at(height) - 0.5 * (vel1 + vel2);
        let v_perp = v_app - v_app.dot(&unit) * unit;
        let area = len * spring.diameter;
        half_drag = 0.25 * env.air_density(height) * params.cd * v_perp.norm() * area * v_perp;
    }

    Ok(SegmentForce {
        spring: tension * unit,
        half_drag,
        tension,
    })
}
