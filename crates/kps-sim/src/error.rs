//! Error types for simulation operations.

use kps_model::ModelError;
use kps_solver::SolverError;
use thiserror::Error;

/// Errors encountered during transient simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Model diverged: {what} = {value}")]
    Diverged { what: &'static str, value: f64 },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: &'static str },

    /// The step failed but may succeed with a smaller time step.
    #[error("Retryable step failure: {message}")]
    Retryable { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<ModelError> for SimError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Diverged { what, value } => SimError::Diverged { what, value },
            other => SimError::Backend {
                message: other.to_string(),
            },
        }
    }
}

impl From<SolverError> for SimError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Model(model) => model.into(),
            SolverError::ConvergenceFailed { what } | SolverError::Numeric { what } => {
                SimError::Retryable { message: what }
            }
            SolverError::ProblemSetup { what } => SimError::Backend { message: what },
        }
    }
}
