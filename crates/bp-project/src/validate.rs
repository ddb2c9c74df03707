//! Plant file validation.

use crate::schema::{KineticsDef, NumericsDef, PlantDef, PlantFile, ScenarioDef, TemperatureDef};
use std::collections::HashSet;

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_plant_file(plant: &PlantFile) -> Result<(), ValidationError> {
    if plant.version == 0 || plant.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: plant.version,
        });
    }

    validate_kinetics(&plant.kinetics)?;
    validate_plant(&plant.plant)?;
    validate_numerics(&plant.numerics)?;
    if let Some(temperature) = &plant.temperature {
        validate_temperature(temperature)?;
    }

    let mut scenario_ids = HashSet::new();
    for scenario in &plant.scenarios {
        if !scenario_ids.insert(&scenario.id) {
            return Err(ValidationError::DuplicateId {
                id: scenario.id.clone(),
                context: "scenarios".to_string(),
            });
        }
        validate_scenario(scenario)?;
    }

    Ok(())
}

fn invalid(field: impl Into<String>, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, value, "must be positive and finite"));
    }
    Ok(())
}

fn non_negative(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, value, "must be non-negative and finite"));
    }
    Ok(())
}

fn fraction(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..1.0).contains(&value) {
        return Err(invalid(field, value, "must be in [0, 1)"));
    }
    Ok(())
}

fn validate_kinetics(kinetics: &KineticsDef) -> Result<(), ValidationError> {
    const MAY_BE_ZERO: [&str; 8] = [
        "mu_max_a",
        "mu_max_h",
        "b_a",
        "b_h",
        "eta_g",
        "do_aerobic",
        "do_anoxic",
        "nitrate_per_denitrification",
    ];
    for (name, value) in kinetics.overrides() {
        let field = format!("kinetics {name}");
        if MAY_BE_ZERO.contains(&name) {
            non_negative(field, value)?;
        } else {
            positive(field, value)?;
        }
    }
    Ok(())
}

fn validate_plant(plant: &PlantDef) -> Result<(), ValidationError> {
    if let Some(volumes) = plant.volumes_m3 {
        for (i, v) in volumes.iter().enumerate() {
            positive(format!("plant volumes_m3[R{}]", i + 1), *v)?;
        }
    }
    if let Some(q) = plant.influent_flow_m3_d {
        positive("plant influent_flow_m3_d", q)?;
    }
    if let Some(ir) = plant.internal_recycle_ratio {
        non_negative("plant internal_recycle_ratio", ir)?;
    }
    if let Some(r) = plant.return_sludge_ratio {
        positive("plant return_sludge_ratio", r)?;
    }
    if let Some(f) = plant.step_feed_fraction {
        fraction("plant step_feed_fraction", f)?;
    }
    if let Some(s) = plant.influent_substrate {
        non_negative("plant influent_substrate", s)?;
    }
    Ok(())
}

fn validate_numerics(numerics: &NumericsDef) -> Result<(), ValidationError> {
    if let Some(dt) = numerics.dt_days {
        positive("numerics dt_days", dt)?;
    }
    if let Some(w) = numerics.warmup_days {
        non_negative("numerics warmup_days", w)?;
    }
    if let Some(d) = numerics.duration_days {
        positive("numerics duration_days", d)?;
    }
    if numerics.record_stride == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: "numerics record_stride".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if let Some(floor) = numerics.floor {
        positive("numerics floor", floor)?;
    }
    if let Some(name) = &numerics.integrator {
        let known = matches!(name.to_ascii_lowercase().as_str(), "rk4" | "euler");
        if !known {
            return Err(ValidationError::Unsupported {
                feature: format!("integrator '{name}'"),
                reason: "supported integrators are rk4 and euler".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_temperature(temperature: &TemperatureDef) -> Result<(), ValidationError> {
    let values: Vec<(&str, f64)> = match temperature {
        TemperatureDef::Constant { celsius } => vec![("celsius", *celsius)],
        TemperatureDef::Sigmoid {
            start_c,
            end_c,
            midpoint_day,
            steepness,
        } => vec![
            ("start_c", *start_c),
            ("end_c", *end_c),
            ("midpoint_day", *midpoint_day),
            ("steepness", *steepness),
        ],
    };
    for (name, value) in values {
        if !value.is_finite() {
            return Err(invalid(format!("temperature {name}"), value, "must be finite"));
        }
    }
    Ok(())
}

fn validate_scenario(scenario: &ScenarioDef) -> Result<(), ValidationError> {
    let context = |field: &str| format!("scenario '{}' {field}", scenario.id);
    positive(context("srt_days"), scenario.srt_days)?;
    non_negative(context("influent_ammonium"), scenario.influent_ammonium)?;
    if let Some(s) = scenario.influent_substrate {
        non_negative(context("influent_substrate"), s)?;
    }
    if let Some(f) = scenario.step_feed_fraction {
        fraction(context("step_feed_fraction"), f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(id: &str, srt: f64) -> ScenarioDef {
        ScenarioDef {
            id: id.to_string(),
            name: id.to_string(),
            srt_days: srt,
            influent_ammonium: 50.0,
            influent_substrate: None,
            step_feed_fraction: None,
        }
    }

    #[test]
    fn reference_file_is_valid() {
        let mut plant = PlantFile::reference("ref");
        plant.scenarios.push(scenario("a", 10.0));
        validate_plant_file(&plant).unwrap();
    }

    #[test]
    fn duplicate_scenarios_rejected() {
        let mut plant = PlantFile::reference("dup");
        plant.scenarios.push(scenario("a", 10.0));
        plant.scenarios.push(scenario("a", 20.0));
        assert!(matches!(
            validate_plant_file(&plant),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn non_positive_srt_rejected() {
        let mut plant = PlantFile::reference("srt");
        plant.scenarios.push(scenario("zero", 0.0));
        let err = validate_plant_file(&plant).unwrap_err();
        assert!(err.to_string().contains("srt_days"));
    }

    #[test]
    fn future_version_rejected() {
        let mut plant = PlantFile::reference("v");
        plant.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_plant_file(&plant),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn bad_plant_values_rejected() {
        let mut plant = PlantFile::reference("p");
        plant.plant.volumes_m3 = Some([400.0, -1.0, 600.0, 200.0]);
        assert!(validate_plant_file(&plant).is_err());

        let mut plant = PlantFile::reference("p");
        plant.plant.step_feed_fraction = Some(1.0);
        assert!(validate_plant_file(&plant).is_err());

        let mut plant = PlantFile::reference("p");
        plant.kinetics.k_s = Some(0.0);
        assert!(validate_plant_file(&plant).is_err());

        let mut plant = PlantFile::reference("p");
        plant.kinetics.mu_max_a = Some(0.0);
        assert!(validate_plant_file(&plant).is_ok());
    }

    #[test]
    fn unknown_integrator_rejected() {
        let mut plant = PlantFile::reference("i");
        plant.numerics.integrator = Some("midpoint".to_string());
        assert!(matches!(
            validate_plant_file(&plant),
            Err(ValidationError::Unsupported { .. })
        ));
    }
}
