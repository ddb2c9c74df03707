use crate::BpError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, BpError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(BpError::NonFinite { what, value: v })
    }
}

/// Finite and strictly greater than zero.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, BpError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(BpError::InvalidArg { what, value: v })
    }
}

/// Finite and not below zero.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, BpError> {
    let v = ensure_finite(v, what)?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err(BpError::InvalidArg { what, value: v })
    }
}

/// Finite and inside the half-open interval `[0, 1)`.
pub fn ensure_fraction(v: Real, what: &'static str) -> Result<Real, BpError> {
    let v = ensure_finite(v, what)?;
    if (0.0..1.0).contains(&v) {
        Ok(v)
    } else {
        Err(BpError::InvalidArg { what, value: v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(ensure_positive(0.0, "srt").is_err());
        assert!(ensure_positive(-5.0, "srt").is_err());
        assert!(ensure_positive(Real::INFINITY, "srt").is_err());
        assert_eq!(ensure_positive(20.0, "srt").unwrap(), 20.0);
    }

    #[test]
    fn ensure_non_negative_allows_zero() {
        assert_eq!(ensure_non_negative(0.0, "nh4").unwrap(), 0.0);
        assert!(ensure_non_negative(-1e-9, "nh4").is_err());
    }

    #[test]
    fn ensure_fraction_is_half_open() {
        assert!(ensure_fraction(0.0, "f").is_ok());
        assert!(ensure_fraction(0.99, "f").is_ok());
        assert!(ensure_fraction(1.0, "f").is_err());
        assert!(ensure_fraction(-0.1, "f").is_err());
    }
}
