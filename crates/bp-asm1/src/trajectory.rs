//! Downsampled effluent record returned to callers.

use crate::state::{PlantState, ReactorState};

/// One sample of the last reactor during the recorded phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputRecord {
    /// Days since the start of the recorded phase
    pub day: f64,
    pub temperature_c: f64,
    /// NH4-N (mg/L)
    pub ammonium: f64,
    /// NO3-N (mg/L)
    pub nitrate: f64,
    /// ammonium + nitrate (mg/L)
    pub total_nitrogen: f64,
}

impl OutputRecord {
    pub fn from_reactor(day: f64, temperature_c: f64, effluent: &ReactorState) -> Self {
        Self {
            day,
            temperature_c,
            ammonium: effluent.s_nh(),
            nitrate: effluent.s_no(),
            total_nitrogen: effluent.total_nitrogen(),
        }
    }
}

/// Result of one engine run.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    /// Ordered by strictly increasing `day`.
    pub records: Vec<OutputRecord>,
    /// Plant state at the end of warm-up, i.e. at recorded day 0.
    pub warmed_state: PlantState,
    /// Plant state at the end of the recorded phase.
    pub final_state: PlantState,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&OutputRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&OutputRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputRecord> {
        self.records.iter()
    }

    /// Record with the highest effluent ammonium. First one wins on ties.
    pub fn peak_ammonium(&self) -> Option<&OutputRecord> {
        self.records
            .iter()
            .fold(None, |best: Option<&OutputRecord>, r| match best {
                Some(b) if b.ammonium >= r.ammonium => Some(b),
                _ => Some(r),
            })
    }

    /// Record with the highest total nitrogen. First one wins on ties.
    pub fn peak_total_nitrogen(&self) -> Option<&OutputRecord> {
        self.records
            .iter()
            .fold(None, |best: Option<&OutputRecord>, r| match best {
                Some(b) if b.total_nitrogen >= r.total_nitrogen => Some(b),
                _ => Some(r),
            })
    }

    /// Records with `day` strictly before `day`.
    pub fn before(&self, day: f64) -> impl Iterator<Item = &OutputRecord> {
        self.records.iter().take_while(move |r| r.day < day)
    }

    pub fn is_non_negative(&self) -> bool {
        self.records
            .iter()
            .all(|r| r.ammonium >= 0.0 && r.nitrate >= 0.0 && r.total_nitrogen >= 0.0)
    }
}
