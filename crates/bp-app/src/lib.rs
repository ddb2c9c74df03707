//! Shared application service layer for the Bardenpho simulator.
//!
//! Sits between the engine and any front end: compiles plant files into
//! engine configuration, runs and caches scenarios, checks discharge
//! compliance and sweeps SRT in parallel.

pub mod compliance;
pub mod error;
pub mod memo;
pub mod plant_compile;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod run_service;
pub mod sweep;

// Re-export key types for convenience
pub use compliance::{ComplianceReport, DischargeLimit, EffluentSample, assess};
pub use error::{AppError, AppResult};
pub use memo::SimulationCache;
pub use plant_compile::{compile_engine_config, engine_for_plant, scenario_request};
pub use progress::{RecordingProgress, RunProgressEvent, RunStage};
pub use project_service::{
    ScenarioSummary, get_scenario, list_scenarios, load_plant, save_plant, validate_plant,
};
pub use query::{RunSummary, SeriesVariable, extract_series, get_run_summary, to_csv};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run, ensure_run_with_progress,
    list_runs, load_run, trajectory_records,
};
pub use sweep::{SweepPoint, minimum_compliant_srt, srt_range, srt_sweep};
