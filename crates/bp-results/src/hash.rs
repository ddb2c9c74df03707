//! Content-based hashing for run IDs.

use bp_project::schema::{PlantFile, ScenarioDef};
use sha2::{Digest, Sha256};

use crate::ResultsResult;

/// SHA-256 over everything that influences the trajectory of `scenario`.
///
/// The plant and scenario names and the other scenarios in the file are left
/// out, so renaming or adding scenarios keeps existing runs cached.
pub fn compute_run_id(
    plant: &PlantFile,
    scenario: &ScenarioDef,
    solver_version: &str,
) -> ResultsResult<String> {
    let mut hasher = Sha256::new();

    hasher.update(serde_json::to_string(&plant.kinetics)?.as_bytes());
    hasher.update(serde_json::to_string(&plant.plant)?.as_bytes());
    hasher.update(serde_json::to_string(&plant.numerics)?.as_bytes());
    hasher.update(serde_json::to_string(&plant.temperature)?.as_bytes());

    let inputs = (
        scenario.srt_days,
        scenario.influent_ammonium,
        scenario.influent_substrate,
        scenario.step_feed_fraction,
    );
    hasher.update(serde_json::to_string(&inputs)?.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}

/// True for ids in the form [`compute_run_id`] produces: 64 lowercase hex digits.
pub fn is_run_id(candidate: &str) -> bool {
    candidate.len() == 64
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
