//! Plant file schema.
//!
//! Every section except `name` and `scenarios` is optional; omitted fields
//! fall back to the reference Bardenpho plant when the file is compiled.
//!
//! ```yaml
//! version: 1
//! name: Winter shock
//! plant:
//!   influent_flow_m3_d: 1000.0
//!   step_feed_fraction: 0.15
//! temperature:
//!   type: Sigmoid
//!   start_c: 20.0
//!   end_c: 10.0
//!   midpoint_day: 15.5
//!   steepness: 10.0
//! scenarios:
//!   - id: srt-10
//!     name: Ten day SRT
//!     srt_days: 10.0
//!     influent_ammonium: 50.0
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantFile {
    pub version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "KineticsDef::is_empty")]
    pub kinetics: KineticsDef,
    #[serde(default, skip_serializing_if = "PlantDef::is_empty")]
    pub plant: PlantDef,
    #[serde(default, skip_serializing_if = "NumericsDef::is_empty")]
    pub numerics: NumericsDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<TemperatureDef>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDef>,
}

impl PlantFile {
    /// Reference plant with no overrides.
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            version: crate::validate::LATEST_VERSION,
            name: name.into(),
            kinetics: KineticsDef::default(),
            plant: PlantDef::default(),
            numerics: NumericsDef::default(),
            temperature: None,
            scenarios: Vec::new(),
        }
    }

    pub fn scenario(&self, id: &str) -> Option<&ScenarioDef> {
        self.scenarios.iter().find(|s| s.id == id)
    }
}

/// Overrides of ASM1 constants. Unset fields keep the reference values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KineticsDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mu_max_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mu_max_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_nh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_oh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_oa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_no: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_aerobic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_anoxic: Option<f64>,
    /// Nitrate consumed per unit of denitrification rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nitrate_per_denitrification: Option<f64>,
}

impl KineticsDef {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// `(field name, value)` for every override that is set.
    pub fn overrides(&self) -> Vec<(&'static str, f64)> {
        [
            ("mu_max_a", self.mu_max_a),
            ("mu_max_h", self.mu_max_h),
            ("b_a", self.b_a),
            ("b_h", self.b_h),
            ("k_nh", self.k_nh),
            ("k_s", self.k_s),
            ("k_oh", self.k_oh),
            ("k_oa", self.k_oa),
            ("k_no", self.k_no),
            ("y_a", self.y_a),
            ("y_h", self.y_h),
            ("theta_a", self.theta_a),
            ("theta_h", self.theta_h),
            ("eta_g", self.eta_g),
            ("do_aerobic", self.do_aerobic),
            ("do_anoxic", self.do_anoxic),
            ("nitrate_per_denitrification", self.nitrate_per_denitrification),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

/// Flow sheet and influent overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlantDef {
    /// R1..R4 volumes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes_m3: Option<[f64; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influent_flow_m3_d: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_recycle_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_sludge_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_feed_fraction: Option<f64>,
    /// Default influent readily biodegradable COD for scenarios (mg/L)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influent_substrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_stage_flow: Option<SecondStageFlowDef>,
}

/// Flow carried by the first aerobic stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SecondStageFlowDef {
    /// Everything leaving R1, recycle included
    Total,
    /// R1 outflow less the internal recycle, as in the legacy spreadsheet
    NetOfRecycle,
}

impl PlantDef {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NumericsDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_stride: Option<usize>,
    /// "rk4" or "euler"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<f64>,
}

impl NumericsDef {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Temperature over the recorded phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TemperatureDef {
    Constant {
        celsius: f64,
    },
    Sigmoid {
        start_c: f64,
        end_c: f64,
        midpoint_day: f64,
        steepness: f64,
    },
}

/// One (SRT, influent) operating point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDef {
    pub id: String,
    pub name: String,
    pub srt_days: f64,
    pub influent_ammonium: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influent_substrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_feed_fraction: Option<f64>,
}
