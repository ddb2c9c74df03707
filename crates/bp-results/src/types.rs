//! Result data types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub plant_name: String,
    pub scenario_id: String,
    /// RFC 3339
    pub timestamp: String,
    pub parameters: RunParameters,
    pub solver_version: String,
}

/// Inputs that produced a run, repeated here so a manifest reads on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunParameters {
    pub srt_days: f64,
    pub influent_ammonium: f64,
    pub influent_substrate: f64,
    pub step_feed_fraction: f64,
    pub integrator: String,
    pub dt_days: f64,
    pub warmup_days: f64,
    pub duration_days: f64,
    pub record_stride: usize,
}

/// One effluent sample, one line of `trajectory.jsonl`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrajectoryRecord {
    pub day: f64,
    pub temperature_c: f64,
    pub ammonium_mg_l: f64,
    pub nitrate_mg_l: f64,
    pub total_nitrogen_mg_l: f64,
}
