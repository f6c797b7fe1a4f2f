//! Transient simulation of kite models.
//!
//! Provides:
//! - the `DaeModel` seam, implemented for every kite model
//! - a backward Euler integrator with a Newton inner solve
//! - a runner with time step cutback and output recording

pub mod error;
pub mod integrator;
pub mod model;
pub mod sim;

pub use error::{SimError, SimResult};
pub use integrator::{ImplicitEuler, Integrator};
pub use model::{DaeModel, KiteOutput};
pub use sim::{SimOptions, SimRecord, run_sim};
