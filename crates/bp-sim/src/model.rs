//! The dynamic-system seam between models and integrators.

use crate::error::SimResult;

/// An ODE system `dx/dt = f(t, x)` that the fixed-step integrators can advance.
///
/// The state only needs one vector-space operation, [`add_scaled`], which
/// every explicit scheme here is written in terms of.
///
/// [`add_scaled`]: TransientModel::add_scaled
pub trait TransientModel {
    type State: Clone;

    /// State at the start of the run.
    fn initial_state(&self) -> Self::State;

    /// Derivative at `(t, x)`.
    ///
    /// Must be computed from the single snapshot `x`; stages of a multi-stage
    /// scheme each pass their own snapshot.
    fn rhs(&mut self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// `x + h * k`.
    fn add_scaled(&self, x: &Self::State, k: &Self::State, h: f64) -> Self::State;

    /// Hook on each accepted step, given the time at the end of the step.
    ///
    /// Models clamp, or reject runaway states, here.
    fn finalize(&self, _t: f64, x: Self::State) -> SimResult<Self::State> {
        Ok(x)
    }
}
