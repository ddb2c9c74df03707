//! Simulation runner and result recording.

use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::integrator::{ForwardEuler, Integrator, RK4};
use crate::model::TransientModel;

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IntegratorType {
    /// 4th-order Runge-Kutta (default, most accurate, 4 rhs calls per step).
    #[default]
    RK4,
    /// Forward Euler (1st-order, faster, 1 rhs call per step).
    ForwardEuler,
}

impl IntegratorType {
    pub fn as_str(self) -> &'static str {
        match self {
            IntegratorType::RK4 => "rk4",
            IntegratorType::ForwardEuler => "euler",
        }
    }

    fn step<M: TransientModel>(
        self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        match self {
            IntegratorType::RK4 => RK4.step(model, t, x, dt),
            IntegratorType::ForwardEuler => ForwardEuler.step(model, t, x, dt),
        }
    }
}

impl std::str::FromStr for IntegratorType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rk4" | "runge-kutta" => Ok(IntegratorType::RK4),
            "euler" | "forward-euler" => Ok(IntegratorType::ForwardEuler),
            _ => Err(SimError::InvalidArg {
                what: "unknown integrator (expected rk4 or euler)",
            }),
        }
    }
}

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Fixed time step
    pub dt: f64,
    /// Final simulation time
    pub t_end: f64,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
    /// Integrator type (default: RK4)
    pub integrator: IntegratorType,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1e-3,
            t_end: 1.0,
            max_steps: 1_000_000,
            record_every: 10,
            integrator: IntegratorType::default(),
        }
    }
}

impl SimOptions {
    /// Number of fixed steps needed to reach `t_end`.
    pub fn step_count(&self) -> usize {
        (self.t_end / self.dt).round() as usize
    }

    fn validate(&self) -> SimResult<usize> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !self.t_end.is_finite() || self.t_end < 0.0 {
            return Err(SimError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        let steps = self.step_count();
        if steps > self.max_steps {
            return Err(SimError::InvalidArg {
                what: "t_end / dt exceeds max_steps",
            });
        }
        Ok(steps)
    }
}

/// Progress snapshot handed to callbacks once per step.
#[derive(Clone, Copy, Debug)]
pub struct SimProgress {
    pub t: f64,
    pub t_end: f64,
    pub step: usize,
    pub total_steps: usize,
}

impl SimProgress {
    pub fn fraction_complete(&self) -> f64 {
        if self.total_steps == 0 {
            1.0
        } else {
            self.step as f64 / self.total_steps as f64
        }
    }
}

/// Record of simulation results.
#[derive(Clone, Debug)]
pub struct SimRecord<S> {
    /// Time points
    pub t: Vec<f64>,
    /// State snapshots
    pub x: Vec<S>,
}

impl<S> SimRecord<S> {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn last(&self) -> Option<(f64, &S)> {
        Some((*self.t.last()?, self.x.last()?))
    }
}

/// Core fixed-step loop. Calls `on_step(step, t, x)` after every accepted step.
fn integrate<M, F>(
    model: &mut M,
    x0: M::State,
    opts: &SimOptions,
    steps: usize,
    mut on_step: F,
) -> SimResult<M::State>
where
    M: TransientModel,
    F: FnMut(usize, f64, &M::State),
{
    let mut x = x0;
    for step in 1..=steps {
        let t_prev = (step - 1) as f64 * opts.dt;
        let t = step as f64 * opts.dt;
        let stepped = opts.integrator.step(model, t_prev, &x, opts.dt)?;
        x = model.finalize(t, stepped)?;
        on_step(step, t, &x);
    }
    Ok(x)
}

/// Run a transient simulation from the model's initial state.
pub fn run_sim<M: TransientModel>(
    model: &mut M,
    opts: &SimOptions,
) -> SimResult<SimRecord<M::State>> {
    run_sim_with_progress(model, opts, None)
}

/// Run a transient simulation, reporting progress once per step.
pub fn run_sim_with_progress<M: TransientModel>(
    model: &mut M,
    opts: &SimOptions,
    mut progress: Option<&mut dyn FnMut(&SimProgress)>,
) -> SimResult<SimRecord<M::State>> {
    let steps = opts.validate()?;
    debug!(
        steps,
        dt = opts.dt,
        integrator = opts.integrator.as_str(),
        "starting recorded run"
    );

    let x0 = model.initial_state();
    let capacity = steps / opts.record_every + 2;
    let mut t_record = Vec::with_capacity(capacity);
    let mut x_record = Vec::with_capacity(capacity);
    t_record.push(0.0);
    x_record.push(x0.clone());

    let final_state = integrate(model, x0, opts, steps, |step, t, x| {
        // Record if decimation matches
        if step % opts.record_every == 0 {
            t_record.push(t);
            x_record.push(x.clone());
        }
        if let Some(cb) = progress.as_deref_mut() {
            cb(&SimProgress {
                t,
                t_end: opts.t_end,
                step,
                total_steps: steps,
            });
        }
    })?;

    // Always record final state
    if steps % opts.record_every != 0 {
        t_record.push(steps as f64 * opts.dt);
        x_record.push(final_state);
    }

    debug!(records = t_record.len(), "recorded run finished");
    Ok(SimRecord {
        t: t_record,
        x: x_record,
    })
}

/// Advance the model without recording and return the final state.
pub fn settle<M: TransientModel>(
    model: &mut M,
    opts: &SimOptions,
    mut progress: Option<&mut dyn FnMut(&SimProgress)>,
) -> SimResult<M::State> {
    let steps = opts.validate()?;
    debug!(steps, dt = opts.dt, "starting unrecorded run");
    let x0 = model.initial_state();
    integrate(model, x0, opts, steps, |step, t, _| {
        if let Some(cb) = progress.as_deref_mut() {
            cb(&SimProgress {
                t,
                t_end: opts.t_end,
                step,
                total_steps: steps,
            });
        }
    })
}
