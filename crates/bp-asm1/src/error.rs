//! Error types for the simulation engine.

use bp_sim::SimError;
use thiserror::Error;

use crate::engine::Phase;

/// Errors surfaced by the engine entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid input: {what} = {value}")]
    InvalidInput { what: &'static str, value: f64 },

    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Simulation diverged during {phase} at day {day:.3}")]
    Diverged { phase: Phase, day: f64 },

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<bp_core::BpError> for EngineError {
    fn from(e: bp_core::BpError) -> Self {
        match e {
            bp_core::BpError::NonFinite { what, value } => EngineError::InvalidInput { what, value },
            bp_core::BpError::InvalidArg { what, value } => EngineError::InvalidInput { what, value },
        }
    }
}

impl EngineError {
    /// Attach the phase to a divergence reported by the run loop.
    pub(crate) fn from_sim(phase: Phase, e: SimError) -> Self {
        match e {
            SimError::Diverged { t, .. } => EngineError::Diverged { phase, day: t },
            other => EngineError::Sim(other),
        }
    }
}
