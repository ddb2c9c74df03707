//! Fixed 4-stage Bardenpho flow sheet.
//!
//! ```text
//!            ┌──────────── internal recycle (IR·Q) ───────────┐
//!            v                                                │
//! Q(1-f) ─> [R1 anoxic] ─> [R2 aerobic] ─┬─> [R3 anoxic] ─> [R4 aerobic] ─> clarifier ─> effluent Q
//!            ^                           │        ^                             │
//!            │                           └────────┼──── step feed f·Q ──────────┼── (influent)
//!            └───────────── return sludge (R·Q, biomass thickened) ─────────────┘
//! ```
//!
//! The clarifier is ideal: all biomass leaving R4 returns with the sludge
//! stream, so particulates leave the plant only through wasting.

use bp_core::units::{Volume, VolumeRate, as_m3, as_m3_per_day, m3, m3_per_day};
use bp_core::{ReactorId, ensure_fraction, ensure_positive};

use crate::error::{EngineError, EngineResult};
use crate::kinetics::Aeration;
use crate::state::{REACTOR_COUNT, ReactorState};

/// One completely mixed tank.
#[derive(Clone, Debug, PartialEq)]
pub struct Reactor {
    pub id: ReactorId,
    pub name: String,
    pub volume: Volume,
    pub aeration: Aeration,
}

impl Reactor {
    pub fn volume_m3(&self) -> f64 {
        as_m3(self.volume)
    }
}

/// A recycle stream, expressed as a multiple of the influent flow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecycleEdge {
    pub from: ReactorId,
    pub to: ReactorId,
    pub ratio: f64,
}

/// Fraction of fresh influent bypassing the head of the train.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepFeed {
    pub to: ReactorId,
    pub fraction: f64,
}

/// Flow through the reactor the internal recycle is drawn from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SecondStageFlow {
    /// Everything R1 discharges passes through R2; the recycle leaves at
    /// R2's outlet. Water is conserved at every junction.
    #[default]
    Total,
    /// R2 carries only R1's discharge minus the recycle, while the recycle
    /// still returns R2 liquor. This is the accounting of the legacy
    /// spreadsheet model; it does not conserve flow at the R1/R2 junction.
    NetOfRecycle,
}

/// Plain numbers from which the Bardenpho topology is built.
#[derive(Clone, Debug, PartialEq)]
pub struct PlantGeometry {
    pub volumes_m3: [f64; REACTOR_COUNT],
    pub influent_flow_m3_d: f64,
    pub internal_recycle_ratio: f64,
    pub return_sludge_ratio: f64,
    pub step_feed_fraction: f64,
    pub second_stage_flow: SecondStageFlow,
}

impl Default for PlantGeometry {
    fn default() -> Self {
        Self {
            volumes_m3: [400.0, 800.0, 600.0, 200.0],
            influent_flow_m3_d: 1000.0,
            internal_recycle_ratio: 3.0,
            return_sludge_ratio: 1.0,
            step_feed_fraction: 0.15,
            second_stage_flow: SecondStageFlow::Total,
        }
    }
}

/// Immutable plant layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Topology {
    reactors: [Reactor; REACTOR_COUNT],
    influent_flow: VolumeRate,
    internal_recycle: RecycleEdge,
    return_sludge: RecycleEdge,
    step_feed: StepFeed,
    second_stage_flow: SecondStageFlow,
}

fn stage(index: usize) -> EngineResult<ReactorId> {
    ReactorId::from_index(index).ok_or(EngineError::InvalidConfig {
        what: "reactor index out of range",
    })
}

impl Topology {
    /// Anoxic / aerobic / anoxic / aerobic train with internal recycle
    /// R2 -> R1, return sludge R4 -> R1 and step feed to R3.
    pub fn bardenpho(geometry: &PlantGeometry) -> EngineResult<Self> {
        const LAYOUT: [(&str, Aeration); REACTOR_COUNT] = [
            ("primary anoxic", Aeration::Anoxic),
            ("primary aerobic", Aeration::Aerobic),
            ("secondary anoxic", Aeration::Anoxic),
            ("reaeration", Aeration::Aerobic),
        ];

        let mut reactors = Vec::with_capacity(REACTOR_COUNT);
        for (i, (name, aeration)) in LAYOUT.iter().enumerate() {
            let volume = ensure_positive(geometry.volumes_m3[i], "reactor volume")?;
            reactors.push(Reactor {
                id: stage(i)?,
                name: (*name).to_string(),
                volume: m3(volume),
                aeration: *aeration,
            });
        }
        let reactors: [Reactor; REACTOR_COUNT] =
            reactors
                .try_into()
                .map_err(|_| EngineError::InvalidConfig {
                    what: "expected four reactors",
                })?;

        let topology = Self {
            reactors,
            influent_flow: m3_per_day(geometry.influent_flow_m3_d),
            internal_recycle: RecycleEdge {
                from: stage(1)?,
                to: stage(0)?,
                ratio: geometry.internal_recycle_ratio,
            },
            return_sludge: RecycleEdge {
                from: stage(REACTOR_COUNT - 1)?,
                to: stage(0)?,
                ratio: geometry.return_sludge_ratio,
            },
            step_feed: StepFeed {
                to: stage(2)?,
                fraction: geometry.step_feed_fraction,
            },
            second_stage_flow: geometry.second_stage_flow,
        };
        topology.validate()?;
        Ok(topology)
    }

    /// Same layout with a different step-feed split.
    pub fn with_step_feed_fraction(&self, fraction: f64) -> EngineResult<Self> {
        let mut out = self.clone();
        out.step_feed.fraction = fraction;
        out.validate()?;
        Ok(out)
    }

    fn validate(&self) -> EngineResult<()> {
        ensure_positive(self.influent_flow_m3_d(), "influent flow")?;
        if !self.internal_recycle.ratio.is_finite() || self.internal_recycle.ratio < 0.0 {
            return Err(EngineError::InvalidConfig {
                what: "internal recycle ratio must be non-negative",
            });
        }
        // The thickening factor (1+R)/R needs a sludge return.
        ensure_positive(self.return_sludge.ratio, "return sludge ratio")?;
        ensure_fraction(self.step_feed.fraction, "step feed fraction")?;

        let last = REACTOR_COUNT - 1;
        if self.internal_recycle.from.index() >= last
            || self.internal_recycle.to.index() >= self.internal_recycle.from.index()
        {
            return Err(EngineError::InvalidConfig {
                what: "internal recycle must run backwards from an inner reactor",
            });
        }
        if self.return_sludge.from.index() != last {
            return Err(EngineError::InvalidConfig {
                what: "return sludge must come from the last reactor",
            });
        }
        if self.step_feed.to.index() == 0 || self.step_feed.to.index() > last {
            return Err(EngineError::InvalidConfig {
                what: "step feed must enter a downstream reactor",
            });
        }
        Ok(())
    }

    pub fn reactors(&self) -> &[Reactor; REACTOR_COUNT] {
        &self.reactors
    }

    pub fn reactor(&self, id: ReactorId) -> &Reactor {
        &self.reactors[id.index()]
    }

    pub fn influent_flow(&self) -> VolumeRate {
        self.influent_flow
    }

    pub fn influent_flow_m3_d(&self) -> f64 {
        as_m3_per_day(self.influent_flow)
    }

    /// With an ideal clarifier the treated effluent equals the influent flow.
    pub fn effluent_flow_m3_d(&self) -> f64 {
        self.influent_flow_m3_d()
    }

    pub fn internal_recycle(&self) -> RecycleEdge {
        self.internal_recycle
    }

    pub fn return_sludge(&self) -> RecycleEdge {
        self.return_sludge
    }

    pub fn step_feed(&self) -> StepFeed {
        self.step_feed
    }

    pub fn second_stage_flow(&self) -> SecondStageFlow {
        self.second_stage_flow
    }

    pub fn total_volume_m3(&self) -> f64 {
        self.reactors.iter().map(Reactor::volume_m3).sum()
    }

    /// Precompute flows and mixing weights for the derivative.
    pub fn flow_plan(&self) -> FlowPlan {
        FlowPlan::new(self)
    }
}

/// Where a stream entering a reactor comes from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Source {
    /// Fresh influent.
    Influent,
    /// Mixed liquor leaving another reactor (plug flow or internal recycle).
    Reactor(ReactorId),
    /// Clarifier underflow: last reactor with biomass thickened.
    ReturnSludge,
}

/// One inflow, weighted by its share of the receiving reactor's through-flow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Inlet {
    pub source: Source,
    pub flow_m3_d: f64,
    pub weight: f64,
}

/// Flow bookkeeping for the fixed topology, in plain m³/d.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowPlan {
    pub through_flow_m3_d: [f64; REACTOR_COUNT],
    pub volume_m3: [f64; REACTOR_COUNT],
    /// through-flow / volume (1/d)
    pub dilution_rate: [f64; REACTOR_COUNT],
    pub inlets: [Vec<Inlet>; REACTOR_COUNT],
    /// Biomass concentration factor of the return sludge, (1+R)/R.
    pub thickening_factor: f64,
    pub effluent_flow_m3_d: f64,
}

impl FlowPlan {
    fn new(topology: &Topology) -> Self {
        let q = topology.influent_flow_m3_d();
        let ir = topology.internal_recycle;
        let ras = topology.return_sludge;
        let step = topology.step_feed;
        let last = REACTOR_COUNT - 1;

        let mut inlets: [Vec<Inlet>; REACTOR_COUNT] = Default::default();
        inlets[0].push(Inlet {
            source: Source::Influent,
            flow_m3_d: q * (1.0 - step.fraction),
            weight: 0.0,
        });
        inlets[step.to.index()].push(Inlet {
            source: Source::Influent,
            flow_m3_d: q * step.fraction,
            weight: 0.0,
        });
        inlets[ir.to.index()].push(Inlet {
            source: Source::Reactor(ir.from),
            flow_m3_d: q * ir.ratio,
            weight: 0.0,
        });
        inlets[ras.to.index()].push(Inlet {
            source: Source::ReturnSludge,
            flow_m3_d: q * ras.ratio,
            weight: 0.0,
        });

        // Walk down the train: each reactor passes on what it received minus
        // the recycle, deducted at the recycle source's outlet or, for net
        // accounting, one stage earlier.
        let deducted_at = match topology.second_stage_flow {
            SecondStageFlow::Total => ir.from.index(),
            SecondStageFlow::NetOfRecycle => ir.from.index() - 1,
        };
        let mut through_flow = [0.0; REACTOR_COUNT];
        for i in 0..REACTOR_COUNT {
            through_flow[i] = inlets[i].iter().map(|inlet| inlet.flow_m3_d).sum();
            if i < last {
                let withdrawn = if i == deducted_at { q * ir.ratio } else { 0.0 };
                let plug = through_flow[i] - withdrawn;
                if let Some(from) = ReactorId::from_index(i) {
                    inlets[i + 1].push(Inlet {
                        source: Source::Reactor(from),
                        flow_m3_d: plug,
                        weight: 0.0,
                    });
                }
            }
        }

        for (i, list) in inlets.iter_mut().enumerate() {
            list.retain(|inlet| inlet.flow_m3_d > 0.0);
            for inlet in list.iter_mut() {
                inlet.weight = inlet.flow_m3_d / through_flow[i];
            }
        }

        let volume_m3: [f64; REACTOR_COUNT] =
            std::array::from_fn(|i| topology.reactors[i].volume_m3());
        let dilution_rate = std::array::from_fn(|i| through_flow[i] / volume_m3[i]);

        Self {
            through_flow_m3_d: through_flow,
            volume_m3,
            dilution_rate,
            inlets,
            thickening_factor: through_flow[last] / (q * ras.ratio),
            effluent_flow_m3_d: q,
        }
    }

    /// Flow-weighted inflow concentration of reactor `index`, read from one
    /// frozen snapshot of every reactor.
    pub fn inflow_mixture(
        &self,
        index: usize,
        reactors: &[ReactorState; REACTOR_COUNT],
        influent: &ReactorState,
    ) -> ReactorState {
        let return_sludge = reactors[REACTOR_COUNT - 1].thickened(self.thickening_factor);
        self.inlets[index]
            .iter()
            .fold(ReactorState::zeros(), |acc, inlet| {
                let c = match inlet.source {
                    Source::Influent => *influent,
                    Source::Reactor(id) => reactors[id.index()],
                    Source::ReturnSludge => return_sludge,
                };
                acc + c * inlet.weight
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_core::{Tolerances, nearly_equal};

    fn close(a: f64, b: f64) -> bool {
        nearly_equal(a, b, Tolerances::default())
    }

    fn default_plan() -> FlowPlan {
        Topology::bardenpho(&PlantGeometry::default())
            .unwrap()
            .flow_plan()
    }

    #[test]
    fn default_layout_alternates_aeration() {
        let t = Topology::bardenpho(&PlantGeometry::default()).unwrap();
        let pattern: Vec<Aeration> = t.reactors().iter().map(|r| r.aeration).collect();
        assert_eq!(
            pattern,
            vec![
                Aeration::Anoxic,
                Aeration::Aerobic,
                Aeration::Anoxic,
                Aeration::Aerobic
            ]
        );
        assert!(close(t.total_volume_m3(), 2000.0));
        assert_eq!(t.internal_recycle().from.to_string(), "R2");
        assert_eq!(t.return_sludge().from.to_string(), "R4");
        assert_eq!(t.step_feed().to.to_string(), "R3");
    }

    #[test]
    fn through_flows_follow_the_train() {
        let plan = default_plan();
        // R1: 0.85Q + 3Q + 1Q; R2 passes all of it; R3 gets R2 minus IR plus 0.15Q.
        assert!(close(plan.through_flow_m3_d[0], 4850.0));
        assert!(close(plan.through_flow_m3_d[1], 4850.0));
        assert!(close(plan.through_flow_m3_d[2], 2000.0));
        assert!(close(plan.through_flow_m3_d[3], 2000.0));
        assert!(close(plan.thickening_factor, 2.0));
        assert!(close(plan.dilution_rate[0], 4850.0 / 400.0));
    }

    #[test]
    fn net_accounting_thins_only_the_second_stage() {
        let geometry = PlantGeometry {
            second_stage_flow: SecondStageFlow::NetOfRecycle,
            ..PlantGeometry::default()
        };
        let plan = Topology::bardenpho(&geometry).unwrap().flow_plan();
        assert!(close(plan.through_flow_m3_d[0], 4850.0));
        assert!(close(plan.through_flow_m3_d[1], 1850.0));
        assert!(close(plan.through_flow_m3_d[2], 2000.0));
        assert!(close(plan.through_flow_m3_d[3], 2000.0));
        assert!(close(plan.dilution_rate[1], 1850.0 / 800.0));
        assert!(close(plan.thickening_factor, 2.0));
        // R3 blends R2 liquor and step feed in the same proportions either way.
        assert!(close(plan.inlets[2].iter().map(|i| i.weight).sum::<f64>(), 1.0));
        assert_eq!(plan.inlets[1].len(), 1);
    }

    #[test]
    fn inlet_weights_sum_to_one() {
        let plan = default_plan();
        for list in &plan.inlets {
            let total: f64 = list.iter().map(|inlet| inlet.weight).sum();
            assert!(close(total, 1.0));
        }
    }

    #[test]
    fn no_step_feed_drops_the_bypass_inlet() {
        let t = Topology::bardenpho(&PlantGeometry::default())
            .unwrap()
            .with_step_feed_fraction(0.0)
            .unwrap();
        let plan = t.flow_plan();
        assert_eq!(plan.inlets[2].len(), 1);
        assert_eq!(plan.inlets[2][0].source, Source::Reactor(t.reactors()[1].id));
    }

    #[test]
    fn return_sludge_is_thickened_solubles_are_not() {
        let plan = default_plan();
        let liquor = ReactorState::new(50.0, 300.0, 1.0, 5.0, 2.0);
        let reactors = [liquor; REACTOR_COUNT];
        let influent = ReactorState::new(0.0, 0.0, 50.0, 0.0, 300.0);
        let mix = plan.inflow_mixture(0, &reactors, &influent);

        let w_inf = 850.0 / 4850.0;
        let w_ir = 3000.0 / 4850.0;
        let w_ras = 1000.0 / 4850.0;
        assert!(close(mix.x_ba(), 50.0 * w_ir + 100.0 * w_ras));
        assert!(close(mix.s_nh(), 50.0 * w_inf + 1.0 * (w_ir + w_ras)));
        assert!(close(mix.s_no(), 5.0 * (w_ir + w_ras)));
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let zero_volume = PlantGeometry {
            volumes_m3: [400.0, 0.0, 600.0, 200.0],
            ..PlantGeometry::default()
        };
        assert!(Topology::bardenpho(&zero_volume).is_err());

        let no_ras = PlantGeometry {
            return_sludge_ratio: 0.0,
            ..PlantGeometry::default()
        };
        assert!(Topology::bardenpho(&no_ras).is_err());

        let full_bypass = PlantGeometry {
            step_feed_fraction: 1.0,
            ..PlantGeometry::default()
        };
        assert!(Topology::bardenpho(&full_bypass).is_err());
    }
}
