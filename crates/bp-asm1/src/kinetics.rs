//! ASM1 process rates for nitrification and heterotrophic growth.
//!
//! The oxygen balance is not modelled: each reactor is assigned a fixed
//! dissolved-oxygen level from its aeration status. Rates are otherwise the
//! standard ASM1 Monod expressions with Arrhenius temperature correction
//! about 20 °C.

use crate::error::{EngineError, EngineResult};
use crate::state::ReactorState;

/// Temperature at which the base rate constants are quoted.
pub const REFERENCE_TEMPERATURE_C: f64 = 20.0;

/// Aeration status of a reactor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Aeration {
    Aerobic,
    Anoxic,
}

impl Aeration {
    pub fn is_aerobic(self) -> bool {
        matches!(self, Aeration::Aerobic)
    }

    pub fn label(self) -> &'static str {
        match self {
            Aeration::Aerobic => "aerobic",
            Aeration::Anoxic => "anoxic",
        }
    }
}

/// Biokinetic constants. Built once and shared by reference for a whole run.
#[derive(Clone, Debug, PartialEq)]
pub struct KineticParams {
    /// Autotroph maximum specific growth rate at 20 °C (1/d)
    pub mu_max_a: f64,
    /// Heterotroph maximum specific growth rate at 20 °C (1/d)
    pub mu_max_h: f64,
    /// Autotroph decay rate at 20 °C (1/d)
    pub b_a: f64,
    /// Heterotroph decay rate at 20 °C (1/d)
    pub b_h: f64,
    /// Ammonium half-saturation for autotrophs (mg N/L)
    pub k_nh: f64,
    /// Substrate half-saturation for heterotrophs (mg COD/L)
    pub k_s: f64,
    /// Oxygen half-saturation for heterotrophs (mg O2/L)
    pub k_oh: f64,
    /// Oxygen half-saturation for autotrophs (mg O2/L)
    pub k_oa: f64,
    /// Nitrate half-saturation for denitrifiers (mg N/L)
    pub k_no: f64,
    /// Autotroph yield (g COD / g N)
    pub y_a: f64,
    /// Heterotroph yield (g COD / g COD)
    pub y_h: f64,
    /// Arrhenius coefficient for autotroph rates
    pub theta_a: f64,
    /// Arrhenius coefficient for heterotroph rates
    pub theta_h: f64,
    /// Anoxic growth correction factor
    pub eta_g: f64,
    /// Dissolved oxygen assumed in aerated reactors (mg O2/L)
    pub do_aerobic: f64,
    /// Dissolved oxygen assumed in unaerated reactors (mg O2/L)
    pub do_anoxic: f64,
    /// Nitrate nitrogen removed per unit of denitrification rate
    pub nitrate_per_denitrification: f64,
}

impl Default for KineticParams {
    fn default() -> Self {
        Self {
            mu_max_a: 0.75,
            mu_max_h: 4.0,
            b_a: 0.05,
            b_h: 0.4,
            k_nh: 1.0,
            k_s: 10.0,
            k_oh: 0.2,
            k_oa: 0.5,
            k_no: 0.5,
            y_a: 0.24,
            y_h: 0.45,
            theta_a: 1.072,
            theta_h: 1.04,
            eta_g: 0.8,
            do_aerobic: 2.0,
            do_anoxic: 0.1,
            nitrate_per_denitrification: 1.2,
        }
    }
}

impl KineticParams {
    /// Check constants that appear as divisors or exponent bases.
    pub fn validate(&self) -> EngineResult<()> {
        let strictly_positive = [
            (self.k_nh, "k_nh must be positive"),
            (self.k_s, "k_s must be positive"),
            (self.k_oh, "k_oh must be positive"),
            (self.k_oa, "k_oa must be positive"),
            (self.k_no, "k_no must be positive"),
            (self.y_a, "y_a must be positive"),
            (self.y_h, "y_h must be positive"),
            (self.theta_a, "theta_a must be positive"),
            (self.theta_h, "theta_h must be positive"),
        ];
        for (value, what) in strictly_positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::InvalidConfig { what });
            }
        }

        let non_negative = [
            (self.mu_max_a, "mu_max_a must be non-negative"),
            (self.mu_max_h, "mu_max_h must be non-negative"),
            (self.b_a, "b_a must be non-negative"),
            (self.b_h, "b_h must be non-negative"),
            (self.eta_g, "eta_g must be non-negative"),
            (self.do_aerobic, "do_aerobic must be non-negative"),
            (self.do_anoxic, "do_anoxic must be non-negative"),
            (
                self.nitrate_per_denitrification,
                "nitrate_per_denitrification must be non-negative",
            ),
        ];
        for (value, what) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidConfig { what });
            }
        }
        Ok(())
    }

    /// Same constants with both growth rates set to zero.
    ///
    /// Leaves only transport, decay and wasting, which makes nitrogen a
    /// conserved quantity of the flow network.
    pub fn without_growth(&self) -> Self {
        Self {
            mu_max_a: 0.0,
            mu_max_h: 0.0,
            ..self.clone()
        }
    }

    pub fn dissolved_oxygen(&self, aeration: Aeration) -> f64 {
        match aeration {
            Aeration::Aerobic => self.do_aerobic,
            Aeration::Anoxic => self.do_anoxic,
        }
    }
}

/// `base * theta^(T - 20)`.
#[inline]
pub fn arrhenius(base: f64, theta: f64, temperature_c: f64) -> f64 {
    base * theta.powf(temperature_c - REFERENCE_TEMPERATURE_C)
}

/// `c / (k + c)`, bounded in [0, 1) for c >= 0 and k > 0.
#[inline]
pub fn monod(c: f64, k: f64) -> f64 {
    c / (k + c)
}

/// Rate constants corrected to one temperature.
///
/// All reactors see the same temperature at a given instant, so the plant
/// model evaluates this once per derivative instead of once per reactor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemperatureCorrected {
    pub mu_a: f64,
    pub mu_h: f64,
    pub b_a: f64,
    pub b_h: f64,
}

impl TemperatureCorrected {
    pub fn at(params: &KineticParams, temperature_c: f64) -> Self {
        Self {
            mu_a: arrhenius(params.mu_max_a, params.theta_a, temperature_c),
            mu_h: arrhenius(params.mu_max_h, params.theta_h, temperature_c),
            b_a: arrhenius(params.b_a, params.theta_a, temperature_c),
            b_h: arrhenius(params.b_h, params.theta_h, temperature_c),
        }
    }

    /// Process rates for one reactor at this temperature.
    pub fn rates(
        &self,
        params: &KineticParams,
        state: &ReactorState,
        aeration: Aeration,
    ) -> ReactionRates {
        let dissolved_oxygen = params.dissolved_oxygen(aeration);
        let substrate_term = monod(state.s_s(), params.k_s);

        // Nitrifiers are obligate aerobes.
        let nitrification = if aeration.is_aerobic() {
            self.mu_a
                * monod(state.s_nh(), params.k_nh)
                * monod(dissolved_oxygen, params.k_oa)
                * state.x_ba()
        } else {
            0.0
        };

        let oxygen_inhibition = params.k_oh / (params.k_oh + dissolved_oxygen);
        let denitrification = params.eta_g
            * self.mu_h
            * substrate_term
            * oxygen_inhibition
            * monod(state.s_no(), params.k_no)
            * state.x_h();

        let aerobic_oxidation =
            self.mu_h * substrate_term * monod(dissolved_oxygen, params.k_oh) * state.x_h();

        ReactionRates {
            nitrification,
            denitrification,
            aerobic_oxidation,
            autotroph_decay: self.b_a,
            heterotroph_decay: self.b_h,
        }
    }
}

/// Instantaneous process rates in one reactor.
///
/// The first three are volumetric rates (mg COD/L/d of biomass growth); the
/// decay entries are temperature-corrected first-order coefficients (1/d).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ReactionRates {
    pub nitrification: f64,
    pub denitrification: f64,
    pub aerobic_oxidation: f64,
    pub autotroph_decay: f64,
    pub heterotroph_decay: f64,
}

impl ReactionRates {
    /// Biochemical contribution to dC/dt with ASM1 stoichiometry.
    pub fn reaction_term(&self, state: &ReactorState, params: &KineticParams) -> ReactorState {
        let heterotroph_growth = self.aerobic_oxidation + self.denitrification;
        ReactorState::new(
            self.nitrification - self.autotroph_decay * state.x_ba(),
            heterotroph_growth - self.heterotroph_decay * state.x_h(),
            -self.nitrification / params.y_a,
            self.nitrification / params.y_a
                - params.nitrate_per_denitrification * self.denitrification,
            -heterotroph_growth / params.y_h,
        )
    }
}

/// ASM1 rates for one reactor at one instant.
pub fn reaction_rates(
    params: &KineticParams,
    state: &ReactorState,
    temperature_c: f64,
    aeration: Aeration,
) -> ReactionRates {
    TemperatureCorrected::at(params, temperature_c).rates(params, state, aeration)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn rates_are_finite_and_non_negative(
            x_ba in 1e-4_f64..500.0,
            x_h in 1e-4_f64..5000.0,
            s_nh in 1e-4_f64..200.0,
            s_no in 1e-4_f64..100.0,
            s_s in 1e-4_f64..1000.0,
            temperature in 0.0_f64..35.0,
            aerobic in any::<bool>(),
        ) {
            let p = KineticParams::default();
            let s = ReactorState::new(x_ba, x_h, s_nh, s_no, s_s);
            let aeration = if aerobic { Aeration::Aerobic } else { Aeration::Anoxic };
            let r = reaction_rates(&p, &s, temperature, aeration);
            for v in [
                r.nitrification,
                r.denitrification,
                r.aerobic_oxidation,
                r.autotroph_decay,
                r.heterotroph_decay,
            ] {
                prop_assert!(v.is_finite());
                prop_assert!(v >= 0.0);
            }
        }

        #[test]
        fn monod_is_bounded(c in 0.0_f64..1e6, k in 1e-6_f64..1e3) {
            let m = monod(c, k);
            prop_assert!((0.0..1.0).contains(&m));
        }

        #[test]
        fn warmer_is_faster(t in 0.0_f64..34.0) {
            let p = KineticParams::default();
            let cold = TemperatureCorrected::at(&p, t);
            let warm = TemperatureCorrected::at(&p, t + 1.0);
            prop_assert!(warm.mu_a > cold.mu_a);
            prop_assert!(warm.mu_h > cold.mu_h);
        }
    }
}
