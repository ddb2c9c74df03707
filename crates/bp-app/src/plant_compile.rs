//! Plant file to engine configuration.

use bp_asm1::{
    Engine, EngineConfig, KineticParams, NumericsConfig, PlantGeometry, SecondStageFlow,
    SimulationRequest, TemperatureSchedule,
};
use bp_project::schema::{
    KineticsDef, NumericsDef, PlantDef, PlantFile, ScenarioDef, SecondStageFlowDef,
    TemperatureDef,
};
use bp_sim::IntegratorType;

use crate::error::{AppError, AppResult};

/// Reference configuration with the file's overrides applied.
pub fn compile_engine_config(plant: &PlantFile) -> AppResult<EngineConfig> {
    let defaults = EngineConfig::default();
    Ok(EngineConfig {
        params: compile_kinetics(&plant.kinetics, defaults.params),
        geometry: compile_geometry(&plant.plant, defaults.geometry),
        numerics: compile_numerics(&plant.numerics, defaults.numerics)?,
        schedule: plant
            .temperature
            .as_ref()
            .map(compile_temperature)
            .unwrap_or(defaults.schedule),
        seed: defaults.seed,
        default_substrate: plant
            .plant
            .influent_substrate
            .unwrap_or(defaults.default_substrate),
    })
}

/// Compile and validate in one go.
pub fn engine_for_plant(plant: &PlantFile) -> AppResult<Engine> {
    let config = compile_engine_config(plant)?;
    Engine::new(config).map_err(|e| AppError::Compile(e.to_string()))
}

pub fn scenario_request(scenario: &ScenarioDef) -> SimulationRequest {
    SimulationRequest {
        srt_days: scenario.srt_days,
        influent_ammonium: scenario.influent_ammonium,
        influent_substrate: scenario.influent_substrate,
        step_feed_fraction: scenario.step_feed_fraction,
    }
}

fn compile_kinetics(def: &KineticsDef, params: KineticParams) -> KineticParams {
    let pick = |value: Option<f64>, default: f64| value.unwrap_or(default);
    KineticParams {
        mu_max_a: pick(def.mu_max_a, params.mu_max_a),
        mu_max_h: pick(def.mu_max_h, params.mu_max_h),
        b_a: pick(def.b_a, params.b_a),
        b_h: pick(def.b_h, params.b_h),
        k_nh: pick(def.k_nh, params.k_nh),
        k_s: pick(def.k_s, params.k_s),
        k_oh: pick(def.k_oh, params.k_oh),
        k_oa: pick(def.k_oa, params.k_oa),
        k_no: pick(def.k_no, params.k_no),
        y_a: pick(def.y_a, params.y_a),
        y_h: pick(def.y_h, params.y_h),
        theta_a: pick(def.theta_a, params.theta_a),
        theta_h: pick(def.theta_h, params.theta_h),
        eta_g: pick(def.eta_g, params.eta_g),
        do_aerobic: pick(def.do_aerobic, params.do_aerobic),
        do_anoxic: pick(def.do_anoxic, params.do_anoxic),
        nitrate_per_denitrification: pick(
            def.nitrate_per_denitrification,
            params.nitrate_per_denitrification,
        ),
    }
}

fn compile_geometry(def: &PlantDef, defaults: PlantGeometry) -> PlantGeometry {
    PlantGeometry {
        volumes_m3: def.volumes_m3.unwrap_or(defaults.volumes_m3),
        influent_flow_m3_d: def
            .influent_flow_m3_d
            .unwrap_or(defaults.influent_flow_m3_d),
        internal_recycle_ratio: def
            .internal_recycle_ratio
            .unwrap_or(defaults.internal_recycle_ratio),
        return_sludge_ratio: def
            .return_sludge_ratio
            .unwrap_or(defaults.return_sludge_ratio),
        step_feed_fraction: def
            .step_feed_fraction
            .unwrap_or(defaults.step_feed_fraction),
        second_stage_flow: match def.second_stage_flow {
            Some(SecondStageFlowDef::Total) => SecondStageFlow::Total,
            Some(SecondStageFlowDef::NetOfRecycle) => SecondStageFlow::NetOfRecycle,
            None => defaults.second_stage_flow,
        },
    }
}

fn compile_numerics(def: &NumericsDef, defaults: NumericsConfig) -> AppResult<NumericsConfig> {
    let integrator = match &def.integrator {
        Some(name) => name
            .parse::<IntegratorType>()
            .map_err(|e| AppError::Compile(e.to_string()))?,
        None => defaults.integrator,
    };
    Ok(NumericsConfig {
        dt: def.dt_days.unwrap_or(defaults.dt),
        warmup_days: def.warmup_days.unwrap_or(defaults.warmup_days),
        duration_days: def.duration_days.unwrap_or(defaults.duration_days),
        record_stride: def.record_stride.unwrap_or(defaults.record_stride),
        integrator,
        floor: def.floor.unwrap_or(defaults.floor),
        ..defaults
    })
}

fn compile_temperature(def: &TemperatureDef) -> TemperatureSchedule {
    match *def {
        TemperatureDef::Constant { celsius } => TemperatureSchedule::Constant { celsius },
        TemperatureDef::Sigmoid {
            start_c,
            end_c,
            midpoint_day,
            steepness,
        } => TemperatureSchedule::Sigmoid {
            start_c,
            end_c,
            midpoint_day,
            steepness,
        },
    }
}
