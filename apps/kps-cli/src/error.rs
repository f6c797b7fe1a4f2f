//! Error type of the command line front end.

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Settings error: {0}")]
    Config(#[from] kps_config::ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] kps_model::ModelError),

    #[error("Steady-state solver error: {0}")]
    Solver(#[from] kps_solver::SolverError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] kps_sim::SimError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;
