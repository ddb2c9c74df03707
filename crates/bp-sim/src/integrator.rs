//! Fixed-step time integrators.

use crate::error::SimResult;
use crate::model::TransientModel;

/// One explicit fixed-step scheme.
pub trait Integrator {
    /// State at `t + dt` from state `x` at `t`.
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Classical fourth-order Runge-Kutta: four derivative evaluations per step.
#[derive(Clone, Copy, Debug, Default)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let half = 0.5 * dt;

        let k1 = model.rhs(t, x)?;
        let k2 = model.rhs(t + half, &model.add_scaled(x, &k1, half))?;
        let k3 = model.rhs(t + half, &model.add_scaled(x, &k2, half))?;
        let k4 = model.rhs(t + dt, &model.add_scaled(x, &k3, dt))?;

        // x + dt/6 (k1 + 2 k2 + 2 k3 + k4)
        let sixth = dt / 6.0;
        let mut next = model.add_scaled(x, &k1, sixth);
        next = model.add_scaled(&next, &k2, 2.0 * sixth);
        next = model.add_scaled(&next, &k3, 2.0 * sixth);
        Ok(model.add_scaled(&next, &k4, sixth))
    }
}

/// Explicit Euler: one derivative evaluation per step.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let slope = model.rhs(t, x)?;
        Ok(model.add_scaled(x, &slope, dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// dx/dt = -k x, exact solution x0 * exp(-k t).
    struct Decay {
        k: f64,
        rhs_calls: usize,
    }

    impl TransientModel for Decay {
        type State = f64;

        fn initial_state(&self) -> f64 {
            1.0
        }

        fn rhs(&mut self, _t: f64, x: &f64) -> SimResult<f64> {
            self.rhs_calls += 1;
            Ok(-self.k * x)
        }

        fn add_scaled(&self, x: &f64, k: &f64, h: f64) -> f64 {
            x + h * k
        }
    }

    fn integrate<I: Integrator>(integrator: &I, model: &mut Decay, dt: f64, steps: usize) -> f64 {
        let mut x = model.initial_state();
        for n in 0..steps {
            x = integrator.step(model, n as f64 * dt, &x, dt).unwrap();
        }
        x
    }

    #[test]
    fn rk4_uses_four_evaluations_per_step() {
        let mut model = Decay { k: 1.0, rhs_calls: 0 };
        integrate(&RK4, &mut model, 0.1, 10);
        assert_eq!(model.rhs_calls, 40);
    }

    #[test]
    fn euler_uses_one_evaluation_per_step() {
        let mut model = Decay { k: 1.0, rhs_calls: 0 };
        integrate(&ForwardEuler, &mut model, 0.1, 10);
        assert_eq!(model.rhs_calls, 10);
    }

    #[test]
    fn rk4_is_far_more_accurate_than_euler() {
        let exact = (-1.0_f64).exp();

        let mut model = Decay { k: 1.0, rhs_calls: 0 };
        let rk4 = integrate(&RK4, &mut model, 0.1, 10);

        let mut model = Decay { k: 1.0, rhs_calls: 0 };
        let euler = integrate(&ForwardEuler, &mut model, 0.1, 10);

        let rk4_err = (rk4 - exact).abs();
        let euler_err = (euler - exact).abs();
        assert!(rk4_err < 1e-6, "rk4 error {rk4_err}");
        assert!(euler_err > 1e-2, "euler error {euler_err}");
    }

    #[test]
    fn rk4_error_shrinks_fourth_order() {
        let exact = (-1.0_f64).exp();

        let mut model = Decay { k: 1.0, rhs_calls: 0 };
        let coarse = (integrate(&RK4, &mut model, 0.1, 10) - exact).abs();

        let mut model = Decay { k: 1.0, rhs_calls: 0 };
        let fine = (integrate(&RK4, &mut model, 0.05, 20) - exact).abs();

        // Halving dt should cut the error by ~16x.
        let ratio = coarse / fine;
        assert!(ratio > 12.0 && ratio < 20.0, "ratio {ratio}");
    }
}
