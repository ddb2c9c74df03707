//! bp-core: stable foundation for the Bardenpho simulator.
//!
//! Contains:
//! - units (uom SI types + constructors for plant geometry)
//! - numeric (Real + tolerances + float guards)
//! - ids (compact reactor stage identifiers)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{BpError, BpResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
