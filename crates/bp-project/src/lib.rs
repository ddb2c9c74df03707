//! bp-project: plant file format and validation.
//!
//! Plant files are YAML by default; a `.json` extension selects JSON. Both
//! directions validate, so a file that loads is always one that runs.

use std::path::Path;

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_plant_file};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unknown scenario: {id}")]
    UnknownScenario { id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encoding of a plant file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantFormat {
    Yaml,
    Json,
}

impl PlantFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => PlantFormat::Json,
            _ => PlantFormat::Yaml,
        }
    }

    fn parse(self, text: &str) -> ProjectResult<PlantFile> {
        Ok(match self {
            PlantFormat::Yaml => serde_yaml::from_str(text)?,
            PlantFormat::Json => serde_json::from_str(text)?,
        })
    }

    fn render(self, plant: &PlantFile) -> ProjectResult<String> {
        Ok(match self {
            PlantFormat::Yaml => serde_yaml::to_string(plant)?,
            PlantFormat::Json => serde_json::to_string_pretty(plant)?,
        })
    }
}

/// Load and validate, choosing the format from the extension.
pub fn load_plant_file(path: &Path) -> ProjectResult<PlantFile> {
    load_as(path, PlantFormat::from_path(path))
}

/// Validate and save, choosing the format from the extension.
pub fn save_plant_file(path: &Path, plant: &PlantFile) -> ProjectResult<()> {
    save_as(path, plant, PlantFormat::from_path(path))
}

pub fn load_yaml(path: &Path) -> ProjectResult<PlantFile> {
    load_as(path, PlantFormat::Yaml)
}

pub fn save_yaml(path: &Path, plant: &PlantFile) -> ProjectResult<()> {
    save_as(path, plant, PlantFormat::Yaml)
}

pub fn load_json(path: &Path) -> ProjectResult<PlantFile> {
    load_as(path, PlantFormat::Json)
}

pub fn save_json(path: &Path, plant: &PlantFile) -> ProjectResult<()> {
    save_as(path, plant, PlantFormat::Json)
}

fn load_as(path: &Path, format: PlantFormat) -> ProjectResult<PlantFile> {
    let plant = format.parse(&std::fs::read_to_string(path)?)?;
    validate_plant_file(&plant)?;
    Ok(plant)
}

fn save_as(path: &Path, plant: &PlantFile, format: PlantFormat) -> ProjectResult<()> {
    validate_plant_file(plant)?;
    std::fs::write(path, format.render(plant)?)?;
    Ok(())
}
