//! Error types for the bp-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates
/// behind one interface for front ends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Plant file error: {0}")]
    Project(String),

    #[error("Failed to read plant file: {path}")]
    PlantFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Plant validation failed: {0}")]
    Validation(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Engine configuration failed: {0}")]
    Compile(String),

    #[error("Simulation error: {0}")]
    Simulation(#[from] bp_asm1::EngineError),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bp-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<bp_project::ProjectError> for AppError {
    fn from(err: bp_project::ProjectError) -> Self {
        match err {
            bp_project::ProjectError::Validation(v) => AppError::Validation(v.to_string()),
            bp_project::ProjectError::UnknownScenario { id } => AppError::ScenarioNotFound(id),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<bp_results::ResultsError> for AppError {
    fn from(err: bp_results::ResultsError) -> Self {
        match err {
            bp_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            bp_results::ResultsError::InvalidRunId { run_id } => {
                AppError::InvalidInput(format!("not a run id: {run_id:?}"))
            }
            other => AppError::Results(other.to_string()),
        }
    }
}
