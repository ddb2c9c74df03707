//! Temperature as a function of elapsed time.

use crate::kinetics::REFERENCE_TEMPERATURE_C;

/// Uniform plant temperature over time (°C, time in days).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TemperatureSchedule {
    Constant {
        celsius: f64,
    },
    /// Logistic transition from `start_c` to `end_c`, half way at `midpoint_day`.
    Sigmoid {
        start_c: f64,
        end_c: f64,
        midpoint_day: f64,
        steepness: f64,
    },
}

impl Default for TemperatureSchedule {
    fn default() -> Self {
        Self::winter_shock()
    }
}

impl TemperatureSchedule {
    /// 20 °C falling to 10 °C around day 15.5.
    pub fn winter_shock() -> Self {
        TemperatureSchedule::Sigmoid {
            start_c: REFERENCE_TEMPERATURE_C,
            end_c: 10.0,
            midpoint_day: 15.5,
            steepness: 10.0,
        }
    }

    pub fn constant(celsius: f64) -> Self {
        TemperatureSchedule::Constant { celsius }
    }

    pub fn at(&self, day: f64) -> f64 {
        match *self {
            TemperatureSchedule::Constant { celsius } => celsius,
            TemperatureSchedule::Sigmoid {
                start_c,
                end_c,
                midpoint_day,
                steepness,
            } => start_c - (start_c - end_c) / (1.0 + (-steepness * (day - midpoint_day)).exp()),
        }
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            TemperatureSchedule::Constant { celsius } => celsius.is_finite(),
            TemperatureSchedule::Sigmoid {
                start_c,
                end_c,
                midpoint_day,
                steepness,
            } => {
                start_c.is_finite()
                    && end_c.is_finite()
                    && midpoint_day.is_finite()
                    && steepness.is_finite()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_is_exact() {
        let s = TemperatureSchedule::winter_shock();
        assert_eq!(s.at(15.5), 15.0);
    }

    #[test]
    fn endpoints_settle() {
        let s = TemperatureSchedule::winter_shock();
        assert!((s.at(0.0) - 20.0).abs() < 1e-6);
        assert!((s.at(40.0) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn constant_ignores_time() {
        let s = TemperatureSchedule::constant(12.0);
        assert_eq!(s.at(0.0), 12.0);
        assert_eq!(s.at(1e6), 12.0);
    }

    #[test]
    fn large_arguments_do_not_overflow() {
        let s = TemperatureSchedule::winter_shock();
        // exp(+large) saturates to inf, which still gives start_c.
        assert_eq!(s.at(-1e6), 20.0);
        assert_eq!(s.at(1e6), 10.0);
    }
}
