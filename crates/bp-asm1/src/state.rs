//! Reactor and plant state vectors.

use std::ops::{Add, Mul, Sub};

use bp_core::ReactorId;
use bp_sim::guards::clamp_floor;
use nalgebra::SVector;

/// Number of tracked species per reactor.
pub const COMPONENT_COUNT: usize = 5;

/// Number of reactors in the Bardenpho train.
pub const REACTOR_COUNT: usize = 4;

/// Tracked species, in state-vector order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    /// X_BA, autotrophic (nitrifying) biomass, mg COD/L
    AutotrophBiomass,
    /// X_H, heterotrophic biomass, mg COD/L
    HeterotrophBiomass,
    /// S_NH, ammonium nitrogen, mg N/L
    Ammonium,
    /// S_NO, nitrate nitrogen, mg N/L
    Nitrate,
    /// S_S, readily biodegradable substrate, mg COD/L
    Substrate,
}

impl Component {
    pub const ALL: [Component; COMPONENT_COUNT] = [
        Component::AutotrophBiomass,
        Component::HeterotrophBiomass,
        Component::Ammonium,
        Component::Nitrate,
        Component::Substrate,
    ];

    pub fn index(self) -> usize {
        match self {
            Component::AutotrophBiomass => 0,
            Component::HeterotrophBiomass => 1,
            Component::Ammonium => 2,
            Component::Nitrate => 3,
            Component::Substrate => 4,
        }
    }

    /// Particulate species are retained by the clarifier and wasted with sludge.
    pub fn is_biomass(self) -> bool {
        matches!(
            self,
            Component::AutotrophBiomass | Component::HeterotrophBiomass
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Component::AutotrophBiomass => "X_BA",
            Component::HeterotrophBiomass => "X_H",
            Component::Ammonium => "S_NH",
            Component::Nitrate => "S_NO",
            Component::Substrate => "S_S",
        }
    }
}

/// Concentrations in one completely mixed reactor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReactorState(SVector<f64, COMPONENT_COUNT>);

impl ReactorState {
    pub fn new(x_ba: f64, x_h: f64, s_nh: f64, s_no: f64, s_s: f64) -> Self {
        Self(SVector::from([x_ba, x_h, s_nh, s_no, s_s]))
    }

    pub fn zeros() -> Self {
        Self(SVector::zeros())
    }

    pub fn from_vector(v: SVector<f64, COMPONENT_COUNT>) -> Self {
        Self(v)
    }

    pub fn as_vector(&self) -> &SVector<f64, COMPONENT_COUNT> {
        &self.0
    }

    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }

    pub fn get(&self, c: Component) -> f64 {
        self.0[c.index()]
    }

    pub fn set(&mut self, c: Component, value: f64) {
        self.0[c.index()] = value;
    }

    pub fn x_ba(&self) -> f64 {
        self.0[0]
    }

    pub fn x_h(&self) -> f64 {
        self.0[1]
    }

    pub fn s_nh(&self) -> f64 {
        self.0[2]
    }

    pub fn s_no(&self) -> f64 {
        self.0[3]
    }

    pub fn s_s(&self) -> f64 {
        self.0[4]
    }

    /// NH4-N + NO3-N, the nitrogen the discharge limit is written against.
    pub fn total_nitrogen(&self) -> f64 {
        self.s_nh() + self.s_no()
    }

    /// Biomass species multiplied by `factor`, soluble species unchanged.
    pub fn thickened(&self, factor: f64) -> Self {
        let mut out = *self;
        out.0[0] *= factor;
        out.0[1] *= factor;
        out
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    pub fn clamp_floor(&self, floor: f64) -> Self {
        Self(self.0.map(|v| clamp_floor(v, floor)))
    }

    pub fn min_component(&self) -> f64 {
        self.0.min()
    }
}

impl Add for ReactorState {
    type Output = ReactorState;

    fn add(self, rhs: ReactorState) -> ReactorState {
        ReactorState(self.0 + rhs.0)
    }
}

impl Sub for ReactorState {
    type Output = ReactorState;

    fn sub(self, rhs: ReactorState) -> ReactorState {
        ReactorState(self.0 - rhs.0)
    }
}

impl Mul<f64> for ReactorState {
    type Output = ReactorState;

    fn mul(self, rhs: f64) -> ReactorState {
        ReactorState(self.0 * rhs)
    }
}

/// Snapshot of all four reactors at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlantState {
    pub reactors: [ReactorState; REACTOR_COUNT],
}

impl PlantState {
    /// Every reactor starts from the same concentrations.
    pub fn uniform(state: ReactorState) -> Self {
        Self {
            reactors: [state; REACTOR_COUNT],
        }
    }

    pub fn reactor(&self, id: ReactorId) -> &ReactorState {
        &self.reactors[id.index()]
    }

    /// The final, most treated stage.
    pub fn last(&self) -> &ReactorState {
        &self.reactors[REACTOR_COUNT - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReactorState> {
        self.reactors.iter()
    }

    pub fn zip_with(
        &self,
        other: &PlantState,
        f: impl Fn(&ReactorState, &ReactorState) -> ReactorState,
    ) -> PlantState {
        PlantState {
            reactors: std::array::from_fn(|i| f(&self.reactors[i], &other.reactors[i])),
        }
    }

    pub fn map(&self, f: impl Fn(&ReactorState) -> ReactorState) -> PlantState {
        PlantState {
            reactors: std::array::from_fn(|i| f(&self.reactors[i])),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.reactors.iter().all(ReactorState::is_finite)
    }

    pub fn clamp_floor(&self, floor: f64) -> PlantState {
        self.map(|r| r.clamp_floor(floor))
    }

    pub fn min_component(&self) -> f64 {
        self.reactors
            .iter()
            .map(ReactorState::min_component)
            .fold(f64::INFINITY, f64::min)
    }

    /// Largest absolute difference between two snapshots over every component.
    pub fn max_abs_diff(&self, other: &PlantState) -> f64 {
        self.reactors
            .iter()
            .zip(other.reactors.iter())
            .map(|(a, b)| (a.0 - b.0).amax())
            .fold(0.0, f64::max)
    }

    /// Largest absolute component, e.g. of a derivative.
    pub fn max_abs(&self) -> f64 {
        self.reactors
            .iter()
            .map(|r| r.0.amax())
            .fold(0.0, f64::max)
    }
}
