//! Recording cadence and final-state handling of the run loop.

use bp_sim::{
    IntegratorType, SimOptions, SimProgress, SimResult, TransientModel, run_sim, settle,
};

/// dx/dt = 1, so x(t) = t exactly under any explicit scheme.
struct Ramp;

impl TransientModel for Ramp {
    type State = f64;

    fn initial_state(&self) -> Self::State {
        0.0
    }

    fn rhs(&mut self, _t: f64, _x: &Self::State) -> SimResult<Self::State> {
        Ok(1.0)
    }

    fn add_scaled(&self, x: &Self::State, k: &Self::State, h: f64) -> Self::State {
        x + h * k
    }
}

#[test]
fn records_initial_and_every_stride() {
    let opts = SimOptions {
        dt: 0.1,
        t_end: 40.0,
        max_steps: 10_000,
        record_every: 2,
        integrator: IntegratorType::RK4,
    };
    let record = run_sim(&mut Ramp, &opts).unwrap();

    // 400 steps / stride 2 = 200 samples, plus t = 0.
    assert_eq!(record.len(), 201);
    assert_eq!(record.t[0], 0.0);
    let (t_last, x_last) = record.last().unwrap();
    assert!((t_last - 40.0).abs() < 1e-9);
    assert!((x_last - 40.0).abs() < 1e-9);
}

#[test]
fn off_stride_final_state_is_still_recorded() {
    let opts = SimOptions {
        dt: 0.1,
        t_end: 1.1,
        max_steps: 100,
        record_every: 4,
        integrator: IntegratorType::ForwardEuler,
    };
    // 11 steps; recorded at 0, 4, 8 and the final 11.
    let record = run_sim(&mut Ramp, &opts).unwrap();
    assert_eq!(record.len(), 4);
    assert!((record.t[3] - 1.1).abs() < 1e-12);
}

#[test]
fn settle_returns_final_state_without_recording() {
    let opts = SimOptions {
        dt: 0.01,
        t_end: 2.0,
        max_steps: 1_000,
        record_every: 1,
        integrator: IntegratorType::RK4,
    };
    let mut seen = 0usize;
    let x = settle(&mut Ramp, &opts, Some(&mut |_p: &SimProgress| seen += 1)).unwrap();
    assert!((x - 2.0).abs() < 1e-9);
    assert_eq!(seen, 200);
}
