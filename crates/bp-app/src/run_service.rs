//! Run execution and caching service.

use std::path::Path;
use std::time::Instant;

use bp_asm1::{Engine, Phase, SimulationRequest, Trajectory};
use bp_project::schema::{PlantFile, ScenarioDef};
use bp_results::{RunManifest, RunParameters, RunStore, TrajectoryRecord};
use bp_sim::SimProgress;
use tracing::info;

use crate::error::AppResult;
use crate::plant_compile;
use crate::progress::{RecordingProgress, RunProgressEvent, RunStage};
use crate::project_service;

/// Options for running scenarios.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
    /// Integration steps between simulation progress events
    pub progress_every_steps: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: env!("CARGO_PKG_VERSION").to_string(),
            progress_every_steps: 1000,
        }
    }
}

/// Request to execute one scenario of a plant file.
pub struct RunRequest<'a> {
    pub plant_path: &'a Path,
    pub scenario_id: &'a str,
    pub options: RunOptions,
}

/// Wall-clock timing of a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub load_plant_time_s: f64,
    pub simulate_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
    pub record_count: usize,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub records: Vec<TrajectoryRecord>,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    simulation: Option<RecordingProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            simulation,
        });
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingPlant,
        started,
        Some("Loading plant".to_string()),
        None,
    );

    let plant = project_service::load_plant(request.plant_path)?;
    let scenario = project_service::get_scenario(&plant, request.scenario_id)?;
    timing.load_plant_time_s = started.elapsed().as_secs_f64();

    emit_progress(
        &mut progress_cb,
        RunStage::CheckingCache,
        started,
        Some("Checking run cache".to_string()),
        None,
    );

    let run_id = bp_results::compute_run_id(&plant, scenario, &request.options.solver_version)?;
    let store = RunStore::for_plant(request.plant_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        emit_progress(
            &mut progress_cb,
            RunStage::LoadingCachedResult,
            started,
            Some("Loading cached run".to_string()),
            None,
        );

        let load_started = Instant::now();
        let manifest = store.load_manifest(&run_id)?;
        let records = store.load_timeseries(&run_id)?;
        timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
        timing.record_count = records.len();
        timing.total_time_s = started.elapsed().as_secs_f64();

        emit_progress(
            &mut progress_cb,
            RunStage::Completed,
            started,
            Some("Loaded cached run".to_string()),
            None,
        );
        info!(run_id = %run_id, "loaded cached run");

        return Ok(RunResponse {
            run_id,
            manifest,
            records,
            loaded_from_cache: true,
            timing,
        });
    }

    let engine = plant_compile::engine_for_plant(&plant)?;
    let sim_request = plant_compile::scenario_request(scenario);

    let sim_started = Instant::now();
    let trajectory = execute_scenario(
        &engine,
        &sim_request,
        request.options.progress_every_steps,
        &mut progress_cb,
        started,
    )?;
    timing.simulate_time_s = sim_started.elapsed().as_secs_f64();

    emit_progress(
        &mut progress_cb,
        RunStage::SavingResults,
        started,
        Some("Saving results".to_string()),
        None,
    );

    let save_started = Instant::now();
    let manifest = build_manifest(
        &plant,
        scenario,
        &engine,
        &sim_request,
        &run_id,
        &request.options.solver_version,
    );
    let records = trajectory_records(&trajectory);
    store.save_run(&manifest, &records)?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();
    timing.record_count = records.len();
    timing.total_time_s = started.elapsed().as_secs_f64();

    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some("Run completed".to_string()),
        None,
    );
    info!(
        run_id = %run_id,
        scenario = scenario.id.as_str(),
        simulate_time_s = timing.simulate_time_s,
        "run completed"
    );

    Ok(RunResponse {
        run_id,
        manifest,
        records,
        loaded_from_cache: false,
        timing,
    })
}

fn execute_scenario(
    engine: &Engine,
    request: &SimulationRequest,
    every: usize,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    started: Instant,
) -> AppResult<Trajectory> {
    let every = every.max(1);
    let mut current: Option<Phase> = None;
    let mut forward = |phase: Phase, p: &SimProgress| {
        let entered = current != Some(phase);
        if !(entered || p.step % every == 0 || p.step == p.total_steps) {
            return;
        }
        current = Some(phase);
        let stage = match phase {
            Phase::WarmingUp => RunStage::WarmingUp,
            Phase::Recording => RunStage::Recording,
        };
        emit_progress(
            progress_cb,
            stage,
            started,
            entered.then(|| format!("{} ({} steps)", stage.label(), p.total_steps)),
            Some(RecordingProgress {
                sim_day: p.t,
                end_day: p.t_end,
                fraction_complete: p.fraction_complete(),
                step: p.step,
            }),
        );
    };
    Ok(engine.run_with_progress(request, Some(&mut forward))?)
}

fn build_manifest(
    plant: &PlantFile,
    scenario: &ScenarioDef,
    engine: &Engine,
    request: &SimulationRequest,
    run_id: &str,
    solver_version: &str,
) -> RunManifest {
    let config = engine.config();
    RunManifest {
        run_id: run_id.to_string(),
        plant_name: plant.name.clone(),
        scenario_id: scenario.id.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        parameters: RunParameters {
            srt_days: request.srt_days,
            influent_ammonium: request.influent_ammonium,
            influent_substrate: request
                .influent_substrate
                .unwrap_or(config.default_substrate),
            step_feed_fraction: request
                .step_feed_fraction
                .unwrap_or(config.geometry.step_feed_fraction),
            integrator: config.numerics.integrator.as_str().to_string(),
            dt_days: config.numerics.dt,
            warmup_days: config.numerics.warmup_days,
            duration_days: config.numerics.duration_days,
            record_stride: config.numerics.record_stride,
        },
        solver_version: solver_version.to_string(),
    }
}

/// Storage form of an engine trajectory.
pub fn trajectory_records(trajectory: &Trajectory) -> Vec<TrajectoryRecord> {
    trajectory
        .iter()
        .map(|r| TrajectoryRecord {
            day: r.day,
            temperature_c: r.temperature_c,
            ammonium_mg_l: r.ammonium,
            nitrate_mg_l: r.nitrate,
            total_nitrogen_mg_l: r.total_nitrogen,
        })
        .collect()
}

/// Runs stored beside a plant file, most recent first.
pub fn list_runs(plant_path: &Path, scenario_id: Option<&str>) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_plant(plant_path)?;

    let mut runs = store.list_runs(scenario_id)?;
    runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(runs)
}

pub fn load_run(
    plant_path: &Path,
    run_id: &str,
) -> AppResult<(RunManifest, Vec<TrajectoryRecord>)> {
    let store = RunStore::for_plant(plant_path)?;

    let manifest = store.load_manifest(run_id)?;
    let records = store.load_timeseries(run_id)?;

    Ok((manifest, records))
}
