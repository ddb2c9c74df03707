//! Two-phase simulation engine.
//!
//! A run first relaxes the seeded plant for a few days at the reference
//! temperature without recording anything, then integrates the recorded
//! phase under the configured temperature schedule and samples the last
//! reactor every `record_stride` steps.

use std::fmt;

use bp_core::{ensure_finite, ensure_fraction, ensure_non_negative, ensure_positive};
use bp_sim::{IntegratorType, SimOptions, SimProgress, run_sim_with_progress, settle};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::kinetics::{KineticParams, REFERENCE_TEMPERATURE_C};
use crate::plant::{BardenphoModel, DEFAULT_CEILING, DEFAULT_FLOOR, Influent};
use crate::schedule::TemperatureSchedule;
use crate::state::{PlantState, ReactorState};
use crate::topology::{PlantGeometry, Topology};
use crate::trajectory::{OutputRecord, Trajectory};

/// Stage of a run, reported with progress and divergence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    WarmingUp,
    Recording,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::WarmingUp => write!(f, "warming up"),
            Phase::Recording => write!(f, "recording"),
        }
    }
}

/// Step size, phase lengths and output cadence.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericsConfig {
    /// Fixed step (d)
    pub dt: f64,
    pub warmup_days: f64,
    pub duration_days: f64,
    /// Integration steps between output records
    pub record_stride: usize,
    pub integrator: IntegratorType,
    /// Lower bound applied to every concentration after each step (mg/L)
    pub floor: f64,
    /// Any concentration above this counts as numerical divergence (mg/L)
    pub divergence_limit: f64,
    /// Temperature held during warm-up (°C)
    pub warmup_temperature_c: f64,
}

impl Default for NumericsConfig {
    fn default() -> Self {
        Self {
            dt: 0.001,
            warmup_days: 5.0,
            duration_days: 40.0,
            record_stride: 100,
            integrator: IntegratorType::RK4,
            floor: DEFAULT_FLOOR,
            divergence_limit: DEFAULT_CEILING,
            warmup_temperature_c: REFERENCE_TEMPERATURE_C,
        }
    }
}

impl NumericsConfig {
    pub fn validate(&self) -> EngineResult<()> {
        ensure_positive(self.dt, "dt")?;
        ensure_non_negative(self.warmup_days, "warmup_days")?;
        ensure_positive(self.duration_days, "duration_days")?;
        ensure_positive(self.floor, "floor")?;
        ensure_positive(self.divergence_limit, "divergence_limit")?;
        if self.divergence_limit <= self.floor {
            return Err(EngineError::InvalidConfig {
                what: "divergence_limit must exceed floor",
            });
        }
        ensure_finite(self.warmup_temperature_c, "warmup_temperature_c")?;
        if self.record_stride == 0 {
            return Err(EngineError::InvalidConfig {
                what: "record_stride must be at least 1",
            });
        }
        Ok(())
    }

    fn options(&self, t_end: f64) -> SimOptions {
        SimOptions {
            dt: self.dt,
            t_end,
            record_every: self.record_stride,
            integrator: self.integrator,
            ..SimOptions::default()
        }
    }

    /// Records produced by one recorded phase, including day 0.
    pub fn expected_records(&self) -> usize {
        let steps = (self.duration_days / self.dt).round() as usize;
        steps / self.record_stride + 1 + usize::from(steps % self.record_stride != 0)
    }
}

/// Concentrations every reactor starts from before warm-up.
///
/// Ammonium is not part of the seed: it starts at the influent value.
#[derive(Clone, Debug, PartialEq)]
pub struct SeedState {
    pub autotrophs: f64,
    pub heterotrophs: f64,
    pub nitrate: f64,
    pub substrate: f64,
}

impl Default for SeedState {
    fn default() -> Self {
        Self {
            autotrophs: 120.0,
            heterotrophs: 2500.0,
            nitrate: 2.0,
            substrate: 50.0,
        }
    }
}

impl SeedState {
    pub fn plant(&self, influent_ammonium: f64) -> PlantState {
        PlantState::uniform(ReactorState::new(
            self.autotrophs,
            self.heterotrophs,
            influent_ammonium,
            self.nitrate,
            self.substrate,
        ))
    }

    fn validate(&self) -> EngineResult<()> {
        ensure_non_negative(self.autotrophs, "seed autotrophs")?;
        ensure_non_negative(self.heterotrophs, "seed heterotrophs")?;
        ensure_non_negative(self.nitrate, "seed nitrate")?;
        ensure_non_negative(self.substrate, "seed substrate")?;
        Ok(())
    }
}

/// What a caller asks the engine for.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationRequest {
    /// Sludge retention time (d)
    pub srt_days: f64,
    /// Influent NH4-N (mg/L)
    pub influent_ammonium: f64,
    /// Influent readily biodegradable COD (mg/L); engine default when `None`
    pub influent_substrate: Option<f64>,
    /// Share of influent routed to R3; plant geometry when `None`
    pub step_feed_fraction: Option<f64>,
}

impl SimulationRequest {
    pub fn new(srt_days: f64, influent_ammonium: f64) -> Self {
        Self {
            srt_days,
            influent_ammonium,
            influent_substrate: None,
            step_feed_fraction: None,
        }
    }

    pub fn with_substrate(mut self, substrate: f64) -> Self {
        self.influent_substrate = Some(substrate);
        self
    }

    pub fn with_step_feed_fraction(mut self, fraction: f64) -> Self {
        self.step_feed_fraction = Some(fraction);
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        ensure_positive(self.srt_days, "srt_days")?;
        ensure_non_negative(self.influent_ammonium, "influent_ammonium")?;
        if let Some(substrate) = self.influent_substrate {
            ensure_non_negative(substrate, "influent_substrate")?;
        }
        if let Some(fraction) = self.step_feed_fraction {
            ensure_fraction(fraction, "step_feed_fraction")?;
        }
        Ok(())
    }
}

/// Everything fixed across runs of one engine.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub params: KineticParams,
    pub geometry: PlantGeometry,
    pub numerics: NumericsConfig,
    /// Temperature over the recorded phase
    pub schedule: TemperatureSchedule,
    pub seed: SeedState,
    /// Influent substrate used when a request leaves it unset (mg COD/L)
    pub default_substrate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            params: KineticParams::default(),
            geometry: PlantGeometry::default(),
            numerics: NumericsConfig::default(),
            schedule: TemperatureSchedule::winter_shock(),
            seed: SeedState::default(),
            default_substrate: 300.0,
        }
    }
}

/// Validated configuration plus the compiled plant topology.
///
/// An `Engine` holds no per-run state; every `run` starts from the seed.
#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
    topology: Topology,
}

impl Engine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.params.validate()?;
        config.numerics.validate()?;
        config.seed.validate()?;
        ensure_non_negative(config.default_substrate, "default_substrate")?;
        if !config.schedule.is_finite() {
            return Err(EngineError::InvalidConfig {
                what: "temperature schedule must be finite",
            });
        }
        let topology = Topology::bardenpho(&config.geometry)?;
        Ok(Self { config, topology })
    }

    pub fn with_defaults() -> EngineResult<Self> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn run(&self, request: &SimulationRequest) -> EngineResult<Trajectory> {
        self.run_with_progress(request, None)
    }

    /// Warm up, then record. `progress` sees every step of both phases.
    pub fn run_with_progress(
        &self,
        request: &SimulationRequest,
        mut progress: Option<&mut dyn FnMut(Phase, &SimProgress)>,
    ) -> EngineResult<Trajectory> {
        request.validate()?;
        info!(
            srt_days = request.srt_days,
            influent_ammonium = request.influent_ammonium,
            integrator = self.config.numerics.integrator.as_str(),
            "starting Bardenpho run"
        );

        let topology = self.topology_for(request)?;
        let influent = self.influent_for(request);
        let numerics = &self.config.numerics;

        let warmed = self.settle_plant(
            &topology,
            influent,
            request,
            self.config.numerics.warmup_days,
            &mut progress,
        )?;
        debug!(
            effluent_ammonium = warmed.last().s_nh(),
            effluent_nitrate = warmed.last().s_no(),
            "warm-up finished"
        );

        let mut model = BardenphoModel::new(
            &self.config.params,
            &topology,
            influent,
            request.srt_days,
            self.config.schedule,
            warmed,
        )
        .with_bounds(numerics.floor, numerics.divergence_limit);
        let opts = numerics.options(numerics.duration_days);
        let record = {
            let mut forward = |p: &SimProgress| {
                if let Some(cb) = progress.as_deref_mut() {
                    cb(Phase::Recording, p);
                }
            };
            run_sim_with_progress(&mut model, &opts, Some(&mut forward))
                .map_err(|e| EngineError::from_sim(Phase::Recording, e))?
        };

        let final_state = record
            .x
            .last()
            .copied()
            .ok_or(EngineError::InvalidConfig {
                what: "recorded phase produced no samples",
            })?;
        let records: Vec<OutputRecord> = record
            .t
            .iter()
            .zip(record.x.iter())
            .map(|(&day, x)| OutputRecord::from_reactor(day, model.temperature_at(day), x.last()))
            .collect();

        if let Some(last) = records.last() {
            info!(
                records = records.len(),
                rhs_evals = model.rhs_evals(),
                final_ammonium = last.ammonium,
                final_total_nitrogen = last.total_nitrogen,
                "run finished"
            );
        }

        Ok(Trajectory {
            records,
            warmed_state: warmed,
            final_state,
        })
    }

    /// Plant state after the configured warm-up.
    pub fn warm_up(&self, request: &SimulationRequest) -> EngineResult<PlantState> {
        self.warm_up_for(request, self.config.numerics.warmup_days)
    }

    /// Plant state after `days` at the warm-up temperature.
    pub fn warm_up_for(&self, request: &SimulationRequest, days: f64) -> EngineResult<PlantState> {
        request.validate()?;
        ensure_non_negative(days, "warm-up days")?;
        let topology = self.topology_for(request)?;
        let influent = self.influent_for(request);
        self.settle_plant(&topology, influent, request, days, &mut None)
    }

    fn settle_plant(
        &self,
        topology: &Topology,
        influent: Influent,
        request: &SimulationRequest,
        days: f64,
        progress: &mut Option<&mut dyn FnMut(Phase, &SimProgress)>,
    ) -> EngineResult<PlantState> {
        let numerics = &self.config.numerics;
        let mut model = BardenphoModel::new(
            &self.config.params,
            topology,
            influent,
            request.srt_days,
            TemperatureSchedule::constant(numerics.warmup_temperature_c),
            self.config.seed.plant(influent.ammonium),
        )
        .with_bounds(numerics.floor, numerics.divergence_limit);
        let opts = numerics.options(days);
        let mut forward = |p: &SimProgress| {
            if let Some(cb) = progress.as_deref_mut() {
                cb(Phase::WarmingUp, p);
            }
        };
        settle(&mut model, &opts, Some(&mut forward))
            .map_err(|e| EngineError::from_sim(Phase::WarmingUp, e))
    }

    fn topology_for(&self, request: &SimulationRequest) -> EngineResult<Topology> {
        match request.step_feed_fraction {
            Some(fraction) => self.topology.with_step_feed_fraction(fraction),
            None => Ok(self.topology.clone()),
        }
    }

    fn influent_for(&self, request: &SimulationRequest) -> Influent {
        Influent {
            ammonium: request.influent_ammonium,
            substrate: request
                .influent_substrate
                .unwrap_or(self.config.default_substrate),
        }
    }
}

/// Run the reference plant with default configuration.
pub fn run_simulation(srt_days: f64, influent_ammonium: f64) -> EngineResult<Trajectory> {
    Engine::with_defaults()?.run(&SimulationRequest::new(srt_days, influent_ammonium))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display_is_lowercase() {
        assert_eq!(Phase::WarmingUp.to_string(), "warming up");
        assert_eq!(Phase::Recording.to_string(), "recording");
    }

    #[test]
    fn default_cadence_is_one_record_per_tenth_day() {
        let n = NumericsConfig::default();
        assert_eq!(n.expected_records(), 401);
        let off_stride = NumericsConfig {
            duration_days: 40.05,
            ..NumericsConfig::default()
        };
        assert_eq!(off_stride.expected_records(), 402);
    }

    #[test]
    fn seed_uses_influent_ammonium() {
        let plant = SeedState::default().plant(35.0);
        for r in plant.iter() {
            assert_eq!(*r, ReactorState::new(120.0, 2500.0, 35.0, 2.0, 50.0));
        }
    }

    #[test]
    fn request_validation() {
        assert!(SimulationRequest::new(10.0, 50.0).validate().is_ok());
        assert!(SimulationRequest::new(0.0, 50.0).validate().is_err());
        assert!(SimulationRequest::new(-3.0, 50.0).validate().is_err());
        assert!(SimulationRequest::new(f64::NAN, 50.0).validate().is_err());
        assert!(SimulationRequest::new(10.0, -1.0).validate().is_err());
        assert!(SimulationRequest::new(10.0, f64::INFINITY).validate().is_err());
        assert!(
            SimulationRequest::new(10.0, 50.0)
                .with_step_feed_fraction(1.0)
                .validate()
                .is_err()
        );
        assert!(
            SimulationRequest::new(10.0, 50.0)
                .with_substrate(-5.0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn engine_rejects_bad_config() {
        let zero_stride = EngineConfig {
            numerics: NumericsConfig {
                record_stride: 0,
                ..NumericsConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(Engine::new(zero_stride).is_err());

        let bad_params = EngineConfig {
            params: KineticParams {
                y_a: 0.0,
                ..KineticParams::default()
            },
            ..EngineConfig::default()
        };
        assert!(Engine::new(bad_params).is_err());
    }

    #[test]
    fn request_override_changes_only_the_split() {
        let engine = Engine::with_defaults().unwrap();
        let request = SimulationRequest::new(10.0, 50.0).with_step_feed_fraction(0.3);
        let t = engine.topology_for(&request).unwrap();
        assert_eq!(t.step_feed().fraction, 0.3);
        assert_eq!(t.reactors(), engine.topology().reactors());
    }
}
