//! kps-model: lumped-mass tether and kite models.
//!
//! Each model turns a flat state vector and its time derivative into a DAE
//! residual for an external implicit integrator:
//! - [`OnePointModel`]: single tether, kite lumped into the top particle
//! - [`FourPointModel`]: single tether, kite resolved into four particles on
//!   a bridle
//! - [`ThreeLineModel`]: middle tether plus two steering lines, arc kite with
//!   sliding steering line attachments and one winch per line
//!
//! All implement [`KiteModel`]; [`KiteSystem`] picks one from settings.

pub mod error;
pub mod forces;
pub mod four_point;
pub mod frame;
pub mod layout;
pub mod model;
pub mod one_point;
pub mod particles;
pub mod session;
pub mod three_line;
pub mod winch;

pub use error::{ModelError, ModelResult};
pub use forces::{SegmentForce, segment_force};
pub use four_point::{FourPointModel, KiteBody};
pub use frame::KiteFrame;
pub use layout::{LEFT, MIDDLE, RIGHT, StateLayout, Topology};
pub use model::{KiteModel, KiteSystem};
pub use one_point::{KiteParams, OnePointModel};
pub use particles::{Particles, Spring, SpringKind, TetherParams};
pub use session::SessionState;
pub use three_line::{KiteGeometry, ThreeLineModel};
pub use winch::{AsyncMachine, WinchModel, WinchSetpoint};
