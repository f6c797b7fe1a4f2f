//! Point masses and the springs between them.

use kps_core::{ParticleId, Vec3, meters, mm};
use std::f64::consts::PI;

/// Particle table, stored column-wise.
#[derive(Clone, Debug, Default)]
pub struct Particles {
    pub pos: Vec<Vec3>,
    pub vel: Vec<Vec3>,
    pub mass: Vec<f64>,
}

impl Particles {
    /// `count` particles at rest at the origin, massless until the model sets them.
    pub fn new(count: usize) -> Self {
        Self {
            pos: vec![Vec3::zeros(); count],
            vel: vec![Vec3::zeros(); count],
            mass: vec![0.0; count],
        }
    }

    pub fn len(&self) -> usize {
        self.pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpringKind {
    Tether,
    /// Part of the kite frame: stiffer damping, softer in compression
    Kite,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Spring {
    pub p1: ParticleId,
    pub p2: ParticleId,
    pub kind: SpringKind,
    /// Unstressed length (m)
    pub length: f64,
    /// Spring constant (N/m)
    pub stiffness: f64,
    /// Damping coefficient (Ns/m)
    pub damping: f64,
    /// Diameter exposed to the flow (m); zero for kite-frame springs
    pub diameter: f64,
}

impl Spring {
    pub fn new(p1: ParticleId, p2: ParticleId, kind: SpringKind, diameter: f64) -> Self {
        Self {
            p1,
            p2,
            kind,
            length: 0.0,
            stiffness: 0.0,
            damping: 0.0,
            diameter,
        }
    }

    /// Set the unstressed length and derive stiffness and damping from the
    /// unit coefficients. Both scale with `1 / length`.
    pub fn set_length(&mut self, length: f64, unit_stiffness: f64, unit_damping: f64) {
        self.length = length;
        self.stiffness = unit_stiffness / length;
        self.damping = unit_damping / length;
    }
}

/// Material and stiffness parameters shared by all springs of a model.
#[derive(Clone, Debug, PartialEq)]
pub struct TetherParams {
    /// Main tether diameter (m)
    pub diameter: f64,
    /// Material density (kg/m³)
    pub density: f64,
    /// Unit spring constant (N)
    pub unit_stiffness: f64,
    /// Unit damping (Ns)
    pub unit_damping: f64,
    pub cd: f64,
    pub compression_tether: f64,
    pub compression_kite: f64,
    /// Damping multiplier applied to kite-frame springs
    pub rel_damping: f64,
}

impl TetherParams {
    pub fn from_settings(tether: &kps_config::TetherDef) -> Self {
        Self {
            diameter: meters(mm(tether.d_tether_mm)),
            density: tether.rho_tether,
            unit_stiffness: tether.c_spring,
            unit_damping: tether.damping,
            cd: tether.cd_tether,
            compression_tether: tether.compression_tether,
            compression_kite: tether.compression_kite,
            rel_damping: tether.rel_damping,
        }
    }

    /// Mass of a tether piece of the given length and diameter.
    pub fn segment_mass(&self, length: f64, diameter: f64) -> f64 {
        self.density * PI * diameter * diameter / 4.0 * length
    }

    pub fn compression(&self, kind: SpringKind) -> f64 {
        match kind {
            SpringKind::Tether => self.compression_tether,
            SpringKind::Kite => self.compression_kite,
        }
    }

    /// Multiplier on the spring's own damping coefficient.
    pub fn damping_factor(&self, kind: SpringKind) -> f64 {
        match kind {
            SpringKind::Tether => 1.0,
            SpringKind::Kite => self.rel_damping,
        }
    }
}
