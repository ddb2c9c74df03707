//! Coupled mass balance of the four reactors.

use bp_sim::guards::check_bounded;
use bp_sim::{SimResult, TransientModel};
use tracing::trace;

use crate::kinetics::{Aeration, KineticParams, TemperatureCorrected};
use crate::schedule::TemperatureSchedule;
use crate::state::{Component, PlantState, REACTOR_COUNT, ReactorState};
use crate::topology::{FlowPlan, Topology};

/// Raw wastewater entering the plant. Biomass and nitrate are absent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Influent {
    /// NH4-N (mg/L)
    pub ammonium: f64,
    /// Readily biodegradable COD (mg/L)
    pub substrate: f64,
}

impl Influent {
    pub fn as_state(&self) -> ReactorState {
        ReactorState::new(0.0, 0.0, self.ammonium, 0.0, self.substrate)
    }
}

/// ASM1 Bardenpho plant as a `TransientModel`.
///
/// Every derivative is computed from a single frozen snapshot of all four
/// reactors, so recycle streams always read pre-step concentrations.
pub struct BardenphoModel<'a> {
    params: &'a KineticParams,
    plan: FlowPlan,
    aeration: [Aeration; REACTOR_COUNT],
    influent: ReactorState,
    wasting_rate: f64,
    schedule: TemperatureSchedule,
    floor: f64,
    ceiling: f64,
    initial: PlantState,
    rhs_evals: usize,
}

/// Default lower clamp for every concentration (mg/L).
pub const DEFAULT_FLOOR: f64 = 1e-4;

/// Default magnitude beyond which a state counts as diverged (mg/L).
pub const DEFAULT_CEILING: f64 = 1e9;

impl<'a> BardenphoModel<'a> {
    /// `srt_days` must already be validated as positive.
    pub fn new(
        params: &'a KineticParams,
        topology: &Topology,
        influent: Influent,
        srt_days: f64,
        schedule: TemperatureSchedule,
        initial: PlantState,
    ) -> Self {
        Self {
            params,
            plan: topology.flow_plan(),
            aeration: std::array::from_fn(|i| topology.reactors()[i].aeration),
            influent: influent.as_state(),
            wasting_rate: 1.0 / srt_days,
            schedule,
            floor: DEFAULT_FLOOR,
            ceiling: DEFAULT_CEILING,
            initial,
            rhs_evals: 0,
        }
    }

    /// Clamp to `floor` after each step and fail once any value exceeds `ceiling`.
    pub fn with_bounds(mut self, floor: f64, ceiling: f64) -> Self {
        self.floor = floor;
        self.ceiling = ceiling;
        self
    }

    pub fn temperature_at(&self, day: f64) -> f64 {
        self.schedule.at(day)
    }

    pub fn flow_plan(&self) -> &FlowPlan {
        &self.plan
    }

    /// Number of derivative evaluations so far.
    pub fn rhs_evals(&self) -> usize {
        self.rhs_evals
    }

    /// dC/dt for every reactor: transport, ASM1 reactions and sludge wasting.
    pub fn derivative(&self, day: f64, x: &PlantState) -> PlantState {
        let corrected = TemperatureCorrected::at(self.params, self.temperature_at(day));
        let reactors = &x.reactors;

        PlantState {
            reactors: std::array::from_fn(|i| {
                let c = &reactors[i];
                let inflow = self.plan.inflow_mixture(i, reactors, &self.influent);
                let transport = (inflow - *c) * self.plan.dilution_rate[i];
                let reaction = corrected
                    .rates(self.params, c, self.aeration[i])
                    .reaction_term(c, self.params);
                let mut wasting = ReactorState::zeros();
                for component in Component::ALL.into_iter().filter(|comp| comp.is_biomass()) {
                    wasting.set(component, -self.wasting_rate * c.get(component));
                }
                transport + reaction + wasting
            }),
        }
    }

    /// Mass of `component` held in the reactors (g).
    pub fn inventory(&self, x: &PlantState, component: Component) -> f64 {
        x.iter()
            .zip(self.plan.volume_m3.iter())
            .map(|(c, v)| c.get(component) * v)
            .sum()
    }

    /// Net flux of `component` across the plant boundary (g/d).
    ///
    /// Influent in, minus clarified effluent for solubles or sludge wasting
    /// for biomass, which the clarifier retains completely.
    pub fn boundary_flux(&self, x: &PlantState, component: Component) -> f64 {
        let q = self.plan.effluent_flow_m3_d;
        let inflow = q * self.influent.get(component);
        if component.is_biomass() {
            inflow - self.wasting_rate * self.inventory(x, component)
        } else {
            inflow - q * x.last().get(component)
        }
    }
}

impl TransientModel for BardenphoModel<'_> {
    type State = PlantState;

    fn initial_state(&self) -> PlantState {
        self.initial
    }

    fn rhs(&mut self, t: f64, x: &PlantState) -> SimResult<PlantState> {
        self.rhs_evals += 1;
        Ok(self.derivative(t, x))
    }

    fn add_scaled(&self, x: &PlantState, k: &PlantState, h: f64) -> PlantState {
        x.zip_with(k, |a, b| *a + *b * h)
    }

    fn finalize(&self, t: f64, x: PlantState) -> SimResult<PlantState> {
        for reactor in x.iter() {
            check_bounded(reactor.as_slice(), self.ceiling, t, "plant state")?;
        }
        let clamped = x.clamp_floor(self.floor);
        trace!(day = t, min = x.min_component(), "step accepted");
        Ok(clamped)
    }
}
