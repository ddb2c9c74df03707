//! Query helpers for extracting data from loaded runs.

use std::fmt::Write as _;
use std::str::FromStr;

use bp_results::TrajectoryRecord;

use crate::error::{AppError, AppResult};

/// Summary of a run's time range and data.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub day_range: (f64, f64),
    pub record_count: usize,
    pub temperature_range_c: (f64, f64),
    pub final_total_nitrogen: f64,
}

/// Get run summary from trajectory records.
pub fn get_run_summary(records: &[TrajectoryRecord]) -> AppResult<RunSummary> {
    let (first, last) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(AppError::InvalidInput("No records in run".to_string())),
    };

    let (t_min, t_max) = records
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r.temperature_c), hi.max(r.temperature_c))
        });

    Ok(RunSummary {
        day_range: (first.day, last.day),
        record_count: records.len(),
        temperature_range_c: (t_min, t_max),
        final_total_nitrogen: last.total_nitrogen_mg_l,
    })
}

/// Column of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesVariable {
    Temperature,
    Ammonium,
    Nitrate,
    TotalNitrogen,
}

impl SeriesVariable {
    pub const ALL: [SeriesVariable; 4] = [
        SeriesVariable::Temperature,
        SeriesVariable::Ammonium,
        SeriesVariable::Nitrate,
        SeriesVariable::TotalNitrogen,
    ];

    pub fn column(self) -> &'static str {
        match self {
            SeriesVariable::Temperature => "temperature_c",
            SeriesVariable::Ammonium => "ammonium_mg_l",
            SeriesVariable::Nitrate => "nitrate_mg_l",
            SeriesVariable::TotalNitrogen => "total_nitrogen_mg_l",
        }
    }

    fn value(self, record: &TrajectoryRecord) -> f64 {
        match self {
            SeriesVariable::Temperature => record.temperature_c,
            SeriesVariable::Ammonium => record.ammonium_mg_l,
            SeriesVariable::Nitrate => record.nitrate_mg_l,
            SeriesVariable::TotalNitrogen => record.total_nitrogen_mg_l,
        }
    }
}

impl FromStr for SeriesVariable {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" | "temperature_c" | "t" => Ok(SeriesVariable::Temperature),
            "ammonium" | "nh4" | "ammonium_mg_l" => Ok(SeriesVariable::Ammonium),
            "nitrate" | "no3" | "nitrate_mg_l" => Ok(SeriesVariable::Nitrate),
            "tn" | "total_nitrogen" | "total_nitrogen_mg_l" => Ok(SeriesVariable::TotalNitrogen),
            _ => Err(AppError::InvalidInput(format!("Unknown variable: {}", s))),
        }
    }
}

/// `(day, value)` pairs for one variable.
pub fn extract_series(records: &[TrajectoryRecord], variable: SeriesVariable) -> Vec<(f64, f64)> {
    records
        .iter()
        .map(|r| (r.day, variable.value(r)))
        .collect()
}

/// Records as CSV with a header row.
pub fn to_csv(records: &[TrajectoryRecord]) -> String {
    let mut out = String::from("day");
    for variable in SeriesVariable::ALL {
        out.push(',');
        out.push_str(variable.column());
    }
    out.push('\n');
    for r in records {
        // Writing to a String cannot fail.
        let _ = write!(out, "{}", r.day);
        for variable in SeriesVariable::ALL {
            let _ = write!(out, ",{}", variable.value(r));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<TrajectoryRecord> {
        vec![
            TrajectoryRecord {
                day: 0.0,
                temperature_c: 20.0,
                ammonium_mg_l: 0.5,
                nitrate_mg_l: 5.0,
                total_nitrogen_mg_l: 5.5,
            },
            TrajectoryRecord {
                day: 0.1,
                temperature_c: 19.5,
                ammonium_mg_l: 0.75,
                nitrate_mg_l: 4.5,
                total_nitrogen_mg_l: 5.25,
            },
        ]
    }

    #[test]
    fn summary_reports_ranges() {
        let summary = get_run_summary(&records()).unwrap();
        assert_eq!(summary.day_range, (0.0, 0.1));
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.temperature_range_c, (19.5, 20.0));
        assert_eq!(summary.final_total_nitrogen, 5.25);
        assert!(get_run_summary(&[]).is_err());
    }

    #[test]
    fn series_by_name() {
        let v: SeriesVariable = "nh4".parse().unwrap();
        assert_eq!(extract_series(&records(), v), vec![(0.0, 0.5), (0.1, 0.75)]);
        assert!("oxygen".parse::<SeriesVariable>().is_err());
    }

    #[test]
    fn csv_has_header_and_rows() {
        let csv = to_csv(&records());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "day,temperature_c,ammonium_mg_l,nitrate_mg_l,total_nitrogen_mg_l"
        );
        assert_eq!(lines[1], "0,20,0.5,5,5.5");
        assert_eq!(lines.len(), 3);
    }
}
