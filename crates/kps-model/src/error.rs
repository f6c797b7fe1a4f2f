//! Error types for the kite models.

use kps_aero::AeroError;
use kps_core::KpsError;
use thiserror::Error;

/// Errors raised while building or evaluating a kite model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Numerical blow-up inside a residual evaluation: a non-finite value, a
    /// segment at or below ground level, or a degenerate kite frame. Never
    /// recoverable at this layer.
    #[error("Diverged: {what} ({value})")]
    Diverged { what: &'static str, value: f64 },

    #[error("Configuration error: {what}")]
    Config { what: String },

    #[error("Dimension mismatch for {what}: expected {expected}, got {got}")]
    Dimension {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Aero table error: {0}")]
    Aero(#[from] AeroError),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl From<KpsError> for ModelError {
    fn from(e: KpsError) -> Self {
        match e {
            KpsError::NonFinite { what, value } => ModelError::Diverged { what, value },
            KpsError::Degenerate { what } => ModelError::Diverged {
                what,
                value: f64::NAN,
            },
        }
    }
}

pub(crate) fn check_dimension(what: &'static str, expected: usize, got: usize) -> ModelResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(ModelError::Dimension {
            what,
            expected,
            got,
        })
    }
}
