//! Per-step guards shared by models.

use crate::error::{SimError, SimResult};

/// Raise a value to a strictly positive floor.
///
/// NaN is passed through unchanged so that divergence checks still see it.
#[inline]
pub fn clamp_floor(value: f64, floor: f64) -> f64 {
    if value < floor { floor } else { value }
}

/// Fail with `Diverged` when any value is NaN or infinite.
pub fn check_finite(values: &[f64], t: f64, what: &'static str) -> SimResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SimError::Diverged { t, what })
    }
}

/// Fail with `Diverged` when any value is non-finite or larger in magnitude
/// than `limit`.
pub fn check_bounded(values: &[f64], limit: f64, t: f64, what: &'static str) -> SimResult<()> {
    if values.iter().all(|v| v.is_finite() && v.abs() <= limit) {
        Ok(())
    } else {
        Err(SimError::Diverged { t, what })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_floor_raises_small_and_negative() {
        assert_eq!(clamp_floor(-3.0, 1e-4), 1e-4);
        assert_eq!(clamp_floor(0.0, 1e-4), 1e-4);
        assert_eq!(clamp_floor(5.0, 1e-4), 5.0);
    }

    #[test]
    fn clamp_floor_keeps_nan_visible() {
        assert!(clamp_floor(f64::NAN, 1e-4).is_nan());
    }

    #[test]
    fn check_finite_flags_nan_and_inf() {
        assert!(check_finite(&[1.0, 2.0], 0.0, "x").is_ok());
        assert!(check_finite(&[1.0, f64::NAN], 0.0, "x").is_err());
        assert!(check_finite(&[f64::INFINITY], 0.0, "x").is_err());
    }

    #[test]
    fn check_bounded_flags_runaway_values() {
        assert!(check_bounded(&[1.0, -5.0], 10.0, 0.0, "x").is_ok());
        assert!(check_bounded(&[1.0, 11.0], 10.0, 0.0, "x").is_err());
        assert!(check_bounded(&[f64::NAN], 10.0, 0.0, "x").is_err());
    }
}
