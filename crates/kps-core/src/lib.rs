//! kps-core: shared foundation for the kite power system model.
//!
//! Contains:
//! - units (uom angle/length constructors, gravity default)
//! - numeric (Vec3, finiteness checks)
//! - ids (compact particle identifiers)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::KpsError;
pub use ids::*;
pub use numeric::*;
pub use units::*;
