//! bp-results: persisted scenario runs.
//!
//! A run is identified by a content hash of everything that determines its
//! trajectory, so re-running an unchanged scenario can load the stored result.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::{compute_run_id, is_run_id};
pub use store::RunStore;
pub use types::{RunManifest, RunParameters, TrajectoryRecord};

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Run {run_id} has an unreadable trajectory record on line {line}: {source}")]
    Corrupt {
        run_id: String,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Not a run id: {run_id:?}")]
    InvalidRunId { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}
