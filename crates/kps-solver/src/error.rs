//! Error types for solver operations.

use kps_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    /// A trial point the model cannot evaluate; the caller may step back.
    pub fn is_divergence(&self) -> bool {
        matches!(self, SolverError::Model(ModelError::Diverged { .. }))
    }
}
