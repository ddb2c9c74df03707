//! Plant file loading, saving and introspection.

use std::path::Path;

use bp_project::schema::{PlantFile, ScenarioDef};

use crate::error::{AppError, AppResult};

/// Summary of a scenario for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSummary {
    pub id: String,
    pub name: String,
    pub srt_days: f64,
    pub influent_ammonium: f64,
}

/// Load and validate a plant file; `.json` files are read as JSON, anything else as YAML.
pub fn load_plant(path: &Path) -> AppResult<PlantFile> {
    if !path.exists() {
        return Err(AppError::PlantFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    Ok(bp_project::load_plant_file(path)?)
}

pub fn save_plant(path: &Path, plant: &PlantFile) -> AppResult<()> {
    Ok(bp_project::save_plant_file(path, plant)?)
}

/// Schema validation plus a full engine build, so anything the engine would
/// reject is reported here too.
pub fn validate_plant(plant: &PlantFile) -> AppResult<()> {
    bp_project::validate_plant_file(plant).map_err(|e| AppError::Validation(e.to_string()))?;
    crate::plant_compile::engine_for_plant(plant)?;
    for scenario in &plant.scenarios {
        crate::plant_compile::scenario_request(scenario)
            .validate()
            .map_err(|e| AppError::Validation(format!("scenario '{}': {e}", scenario.id)))?;
    }
    Ok(())
}

pub fn list_scenarios(plant: &PlantFile) -> Vec<ScenarioSummary> {
    plant
        .scenarios
        .iter()
        .map(|s| ScenarioSummary {
            id: s.id.clone(),
            name: s.name.clone(),
            srt_days: s.srt_days,
            influent_ammonium: s.influent_ammonium,
        })
        .collect()
}

pub fn get_scenario<'a>(plant: &'a PlantFile, scenario_id: &str) -> AppResult<&'a ScenarioDef> {
    plant
        .scenario(scenario_id)
        .ok_or_else(|| AppError::ScenarioNotFound(scenario_id.to_string()))
}
