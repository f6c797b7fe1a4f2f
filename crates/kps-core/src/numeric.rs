use crate::KpsError;
use nalgebra::Vector3;

/// Cartesian 3-vector (x downwind, y left, z up)
pub type Vec3 = Vector3<f64>;

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, KpsError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(KpsError::NonFinite { what, value: v })
    }
}

/// Normalize, failing on zero or non-finite length instead of producing NaN.
pub fn try_normalize(v: &Vec3, what: &'static str) -> Result<Vec3, KpsError> {
    let n = v.norm();
    if n > 0.0 && n.is_finite() {
        Ok(v / n)
    } else {
        Err(KpsError::Degenerate { what })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(f64::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
        assert_eq!(ensure_finite(2.5, "test"), Ok(2.5));
    }

    #[test]
    fn ensure_finite_reports_value() {
        assert_eq!(
            ensure_finite(f64::INFINITY, "force"),
            Err(KpsError::NonFinite {
                what: "force",
                value: f64::INFINITY
            })
        );
    }

    #[test]
    fn try_normalize_rejects_zero() {
        assert!(try_normalize(&Vec3::zeros(), "segment").is_err());
        assert!(try_normalize(&Vec3::new(f64::NAN, 0.0, 1.0), "segment").is_err());
        let n = try_normalize(&Vec3::new(0.0, 3.0, 4.0), "segment").unwrap();
        assert!((n.norm() - 1.0).abs() < 1e-15);
    }
}
