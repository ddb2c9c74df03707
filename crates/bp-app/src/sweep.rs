//! SRT sweeps: independent runs over a range of retention times.

use bp_asm1::{Engine, EngineError, SimulationRequest};
use rayon::prelude::*;
use tracing::info;

use crate::compliance::{ComplianceReport, DischargeLimit, assess};
use crate::error::AppResult;

/// Outcome of one SRT in a sweep.
#[derive(Debug, Clone)]
pub struct SweepPoint {
    pub srt_days: f64,
    pub report: Result<ComplianceReport, EngineError>,
}

impl SweepPoint {
    pub fn is_compliant(&self) -> bool {
        self.report.as_ref().is_ok_and(|r| r.compliant)
    }
}

/// Upper bound on the number of SRTs one sweep may request.
pub const MAX_SWEEP_POINTS: usize = 10_000;

/// Inclusive range `from..=to` in steps of `step`, without accumulating
/// rounding error.
pub fn srt_range(from: f64, to: f64, step: f64) -> AppResult<Vec<f64>> {
    let valid = from.is_finite() && to.is_finite() && step.is_finite() && step > 0.0 && to >= from;
    if !valid {
        return Err(crate::AppError::InvalidInput(format!(
            "invalid SRT range {from}..={to} step {step}"
        )));
    }
    let span = ((to - from) / step + 1e-9).floor();
    if span >= MAX_SWEEP_POINTS as f64 {
        return Err(crate::AppError::InvalidInput(format!(
            "SRT range {from}..={to} step {step} exceeds {MAX_SWEEP_POINTS} points"
        )));
    }
    let n = span as usize;
    Ok((0..=n).map(|i| from + i as f64 * step).collect())
}

/// Run every SRT in parallel. Results come back in input order.
///
/// A failing SRT does not abort the sweep; its error is kept in its point.
pub fn srt_sweep(
    engine: &Engine,
    base: &SimulationRequest,
    srts: &[f64],
    limit: &DischargeLimit,
) -> Vec<SweepPoint> {
    info!(points = srts.len(), "starting SRT sweep");
    srts.par_iter()
        .map(|&srt_days| {
            let request = SimulationRequest {
                srt_days,
                ..base.clone()
            };
            let report = engine.run(&request).and_then(|trajectory| {
                assess(&trajectory.records, limit).map_err(|_| EngineError::InvalidConfig {
                    what: "run produced no records",
                })
            });
            SweepPoint { srt_days, report }
        })
        .collect()
}

/// Shortest SRT whose run meets the limit, provided every longer SRT in the
/// sweep does too.
pub fn minimum_compliant_srt(points: &[SweepPoint]) -> Option<f64> {
    let mut sorted: Vec<&SweepPoint> = points.iter().collect();
    sorted.sort_by(|a, b| a.srt_days.total_cmp(&b.srt_days));

    let mut answer = None;
    for point in sorted.iter().rev() {
        if point.is_compliant() {
            answer = Some(point.srt_days);
        } else {
            break;
        }
    }
    answer
}
