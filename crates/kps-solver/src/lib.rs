//! Nonlinear root finding for kite models.
//!
//! Provides a damped Newton solver for square systems, a Levenberg-Marquardt
//! solver for the steady-state problem, and the forward finite-difference
//! Jacobian both rely on. Model residuals are treated as black boxes.

pub mod error;
pub mod jacobian;
pub mod levenberg;
pub mod newton;
pub mod steady;

pub use error::{SolverError, SolverResult};
pub use jacobian::finite_difference_jacobian;
pub use levenberg::{LmConfig, levenberg_marquardt};
pub use newton::{NewtonConfig, NewtonResult, newton_solve};
pub use steady::{SteadyConfig, SteadySolution, find_steady_state};
