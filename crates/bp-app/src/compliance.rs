//! Discharge-limit assessment of an effluent trajectory.
//!
//! Only the last record is compared against the limit. Peak and pre-shock
//! values are reported for context.

use bp_asm1::OutputRecord;
use bp_results::TrajectoryRecord;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// One effluent sample, fresh from the engine or loaded from the run store.
pub trait EffluentSample {
    fn day(&self) -> f64;
    fn ammonium(&self) -> f64;
    fn nitrate(&self) -> f64;
    fn total_nitrogen(&self) -> f64;
}

impl EffluentSample for OutputRecord {
    fn day(&self) -> f64 {
        self.day
    }
    fn ammonium(&self) -> f64 {
        self.ammonium
    }
    fn nitrate(&self) -> f64 {
        self.nitrate
    }
    fn total_nitrogen(&self) -> f64 {
        self.total_nitrogen
    }
}

impl EffluentSample for TrajectoryRecord {
    fn day(&self) -> f64 {
        self.day
    }
    fn ammonium(&self) -> f64 {
        self.ammonium_mg_l
    }
    fn nitrate(&self) -> f64 {
        self.nitrate_mg_l
    }
    fn total_nitrogen(&self) -> f64 {
        self.total_nitrogen_mg_l
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DischargeLimit {
    /// Total nitrogen permitted in the effluent (mg N/L)
    pub total_nitrogen_mg_l: f64,
    /// Records before this day count as pre-shock
    pub shock_onset_day: f64,
}

impl Default for DischargeLimit {
    fn default() -> Self {
        Self {
            total_nitrogen_mg_l: 8.0,
            shock_onset_day: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceReport {
    pub limit_mg_l: f64,
    pub final_day: f64,
    pub final_ammonium: f64,
    pub final_nitrate: f64,
    pub final_total_nitrogen: f64,
    pub compliant: bool,
    /// Final TN minus the limit; positive when exceeded
    pub margin_mg_l: f64,
    pub peak_ammonium: f64,
    pub peak_ammonium_day: f64,
    /// Highest ammonium before the shock onset, if any record falls there
    pub pre_shock_peak_ammonium: Option<f64>,
    /// Ammonium dominates the effluent: nitrification has collapsed
    pub washout: bool,
    pub recommendation: Option<String>,
}

pub fn assess<R: EffluentSample>(records: &[R], limit: &DischargeLimit) -> AppResult<ComplianceReport> {
    let last = records
        .last()
        .ok_or_else(|| AppError::InvalidInput("No records to assess".to_string()))?;

    let (peak_ammonium, peak_ammonium_day) = records
        .iter()
        .fold((f64::NEG_INFINITY, 0.0), |(best, day), r| {
            if r.ammonium() > best {
                (r.ammonium(), r.day())
            } else {
                (best, day)
            }
        });

    let pre_shock_peak_ammonium = records
        .iter()
        .filter(|r| r.day() < limit.shock_onset_day)
        .map(EffluentSample::ammonium)
        .reduce(f64::max);

    let margin = last.total_nitrogen() - limit.total_nitrogen_mg_l;
    let compliant = margin <= 0.0;
    let washout = last.ammonium() > last.nitrate();

    let recommendation = if compliant {
        None
    } else if washout {
        Some(
            "Nitrifier washout: increase SRT so autotrophs outgrow wasting at winter temperature"
                .to_string(),
        )
    } else {
        Some("Limit exceeded: increase SRT or reduce influent ammonium load".to_string())
    };

    if !compliant {
        warn!(
            final_total_nitrogen = last.total_nitrogen(),
            limit = limit.total_nitrogen_mg_l,
            washout,
            "discharge limit exceeded"
        );
    }

    Ok(ComplianceReport {
        limit_mg_l: limit.total_nitrogen_mg_l,
        final_day: last.day(),
        final_ammonium: last.ammonium(),
        final_nitrate: last.nitrate(),
        final_total_nitrogen: last.total_nitrogen(),
        compliant,
        margin_mg_l: margin,
        peak_ammonium,
        peak_ammonium_day,
        pre_shock_peak_ammonium,
        washout,
        recommendation,
    })
}
