//! ASM1 dynamic model of a 4-stage Bardenpho plant under a temperature shock.
//!
//! Provides:
//! - Reactor state vectors (autotrophs, heterotrophs, NH4-N, NO3-N, readily
//!   biodegradable substrate)
//! - The ASM1 kinetics function with Arrhenius temperature correction
//! - Fixed plant topology with internal recycle, return sludge and step feed
//! - A `TransientModel` for the coupled four-reactor mass balance
//! - A two-phase engine (warm-up, recorded winter shock) producing a
//!   downsampled effluent nitrogen trajectory

pub mod engine;
pub mod error;
pub mod kinetics;
pub mod plant;
pub mod schedule;
pub mod state;
pub mod topology;
pub mod trajectory;

pub use engine::{
    Engine, EngineConfig, NumericsConfig, Phase, SeedState, SimulationRequest, run_simulation,
};
pub use error::{EngineError, EngineResult};
pub use kinetics::{Aeration, KineticParams, ReactionRates, TemperatureCorrected, reaction_rates};
pub use plant::{BardenphoModel, Influent};
pub use schedule::TemperatureSchedule;
pub use state::{Component, PlantState, ReactorState};
pub use topology::{
    FlowPlan, PlantGeometry, Reactor, RecycleEdge, SecondStageFlow, StepFeed, Topology,
};
pub use trajectory::{OutputRecord, Trajectory};
