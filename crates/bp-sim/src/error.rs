//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered during transient simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("Simulation diverged at t = {t}: {what}")]
    Diverged { t: f64, what: &'static str },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<bp_core::BpError> for SimError {
    fn from(e: bp_core::BpError) -> Self {
        match e {
            bp_core::BpError::NonFinite { what, .. } => SimError::NonPhysical { what },
            bp_core::BpError::InvalidArg { what, .. } => SimError::InvalidArg { what },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SimError::Diverged {
            t: 1.5,
            what: "reactor state",
        };
        let msg = err.to_string();
        assert!(msg.contains("diverged"));
        assert!(msg.contains("reactor state"));
    }

    #[test]
    fn core_error_conversion() {
        let core = bp_core::BpError::NonFinite {
            what: "x",
            value: f64::NAN,
        };
        let sim: SimError = core.into();
        assert!(matches!(sim, SimError::NonPhysical { what: "x" }));
    }
}
