//! Fixed-step transient simulation framework.
//!
//! Provides:
//! - `TransientModel` trait for pluggable dynamic systems
//! - Fixed-step integrators (classical RK4, forward Euler) behind one trait
//! - Recorded runs with decimation and unrecorded settling runs
//! - Per-step guards for floor clamping and divergence detection

pub mod error;
pub mod guards;
pub mod integrator;
pub mod model;
pub mod sim;

// Re-exports for public API
pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, RK4};
pub use model::TransientModel;
pub use sim::{
    IntegratorType, SimOptions, SimProgress, SimRecord, run_sim, run_sim_with_progress, settle,
};
