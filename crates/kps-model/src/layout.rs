//! Flat state-vector index arithmetic.
//!
//! The integrator sees one `f64` vector per model. All offsets into it live
//! here so that the models never compute an index by hand.
//!
//! One-point layout (`N` segments, free particles `1..=N`):
//!
//! ```text
//! [ pos_1 .. pos_N | vel_1 .. vel_N ]                       6N
//! ```
//!
//! Four-point layout (tether nodes `1..=N`, the last being the kite control
//! unit, then the four kite particles):
//!
//! ```text
//! [ pos_1 .. pos_N+4 | vel_1 .. vel_N+4 ]                   6(N+4)
//! ```
//!
//! Three-line layout (`F = 3N` free particles):
//!
//! ```text
//! [ pos (3F) | vel (3F) | ζ_L ζ_R | ζ̇_L ζ̇_R | l_L l_R l_M | v_L v_R v_M ]   6F + 10
//! ```
//!
//! The residual uses the same slots: `res1` in the position block, `res2` in
//! the velocity block, and one equation per auxiliary variable.

use kps_core::Vec3;

/// Line indices of the three-line model; also the ground particle indices.
pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;
pub const MIDDLE: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    OnePoint,
    FourPoint,
    ThreeLine,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateLayout {
    topology: Topology,
    segments: usize,
    free: usize,
    connections: usize,
    winches: usize,
}

impl StateLayout {
    pub fn one_point(segments: usize) -> Self {
        Self {
            topology: Topology::OnePoint,
            segments,
            free: segments,
            connections: 0,
            winches: 0,
        }
    }

    pub fn four_point(segments: usize) -> Self {
        Self {
            topology: Topology::FourPoint,
            segments,
            free: segments + 4,
            connections: 0,
            winches: 0,
        }
    }

    pub fn three_line(segments: usize) -> Self {
        Self {
            topology: Topology::ThreeLine,
            segments,
            free: 3 * segments,
            connections: 2,
            winches: 3,
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn free_particles(&self) -> usize {
        self.free
    }

    pub fn connections(&self) -> usize {
        self.connections
    }

    pub fn winches(&self) -> usize {
        self.winches
    }

    /// Total particle count, pinned ground particles and connections included.
    pub fn particle_count(&self) -> usize {
        match self.topology {
            Topology::OnePoint => self.segments + 1,
            Topology::FourPoint => self.segments + 5,
            Topology::ThreeLine => 3 * self.segments + 5,
        }
    }

    /// Length of `y`, `yd` and `res`.
    pub fn len(&self) -> usize {
        6 * self.free + 2 * self.connections + 2 * self.winches
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset of the position triple of free particle `f`.
    pub fn pos(&self, f: usize) -> usize {
        debug_assert!(f < self.free);
        3 * f
    }

    /// Offset of the velocity triple of free particle `f`.
    pub fn vel(&self, f: usize) -> usize {
        debug_assert!(f < self.free);
        3 * self.free + 3 * f
    }

    /// Offset of the connection deflection of `side` (0 left, 1 right).
    pub fn zeta(&self, side: usize) -> usize {
        debug_assert!(side < self.connections);
        6 * self.free + side
    }

    pub fn zeta_dot(&self, side: usize) -> usize {
        debug_assert!(side < self.connections);
        6 * self.free + self.connections + side
    }

    /// Offset of the unstretched length of `line`.
    pub fn length(&self, line: usize) -> usize {
        debug_assert!(line < self.winches);
        6 * self.free + 2 * self.connections + line
    }

    /// Offset of the reel-out speed of `line`.
    pub fn speed(&self, line: usize) -> usize {
        debug_assert!(line < self.winches);
        6 * self.free + 2 * self.connections + self.winches + line
    }

    /// Particle index of free particle `f`.
    pub fn particle_of(&self, f: usize) -> usize {
        match self.topology {
            Topology::OnePoint | Topology::FourPoint => f + 1,
            Topology::ThreeLine => {
                let tether_nodes = 3 * self.segments - 3;
                if f < tether_nodes { f + 3 } else { f + 5 }
            }
        }
    }

    /// Free index of particle `p`; `None` for ground and connection particles.
    pub fn free_index_of(&self, p: usize) -> Option<usize> {
        match self.topology {
            Topology::OnePoint | Topology::FourPoint => {
                (1..=self.free).contains(&p).then(|| p - 1)
            }
            Topology::ThreeLine => {
                let n3 = 3 * self.segments;
                if (3..n3).contains(&p) {
                    Some(p - 3)
                } else if (n3 + 2..n3 + 5).contains(&p) {
                    Some(p - 5)
                } else {
                    None
                }
            }
        }
    }

    /// Apex particle of the kite; the kite particle itself for the one-point
    /// model.
    pub fn apex(&self) -> usize {
        match self.topology {
            Topology::OnePoint => self.segments,
            Topology::FourPoint => self.segments + 1,
            Topology::ThreeLine => 3 * self.segments + 2,
        }
    }

    /// Wing tip particle of `side` (left or right).
    pub fn tip(&self, side: usize) -> usize {
        debug_assert!(self.topology != Topology::OnePoint);
        match self.topology {
            Topology::ThreeLine => 3 * self.segments + 3 + side,
            _ => self.segments + 3 + side,
        }
    }

    /// Trailing edge particle of the four-point kite.
    pub fn trailing_edge(&self) -> usize {
        debug_assert!(self.topology == Topology::FourPoint);
        self.segments + 2
    }

    /// Top of the main tether: the kite control unit of the four-point model.
    pub fn bridle_point(&self) -> usize {
        match self.topology {
            Topology::ThreeLine => 3 * self.segments + MIDDLE,
            _ => self.segments,
        }
    }

    /// Steering line attachment particle of `side`.
    pub fn connection(&self, side: usize) -> usize {
        3 * self.segments + side
    }
}

pub fn read_vec3(v: &[f64], at: usize) -> Vec3 {
    Vec3::new(v[at], v[at + 1], v[at + 2])
}

pub fn write_vec3(v: &mut [f64], at: usize, x: &Vec3) {
    v[at] = x.x;
    v[at + 1] = x.y;
    v[at + 2] = x.z;
}
