//! kps-aero: aerodynamic coefficient lookup.
//!
//! Lift and drag coefficients are given as piecewise tables over the angle of
//! attack (degrees, -180..180) and interpolated with a natural cubic spline so
//! that the residual stays smooth for the implicit solver.

pub mod error;
pub mod polar;
pub mod spline;

pub use error::{AeroError, AeroResult};
pub use polar::{wrap_degrees, AeroPolar};
pub use spline::CubicSpline;
