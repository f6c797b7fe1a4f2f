//! Lift and drag polar of the kite.

use crate::error::{AeroError, AeroResult};
use crate::spline::CubicSpline;

/// Wrap an angle in degrees into [-180, 180).
pub fn wrap_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Lift and drag coefficients as functions of the angle of attack (degrees).
///
/// The two tables are independent: each has its own angle knots.
#[derive(Clone, Debug)]
pub struct AeroPolar {
    cl: CubicSpline,
    cd: CubicSpline,
}

impl AeroPolar {
    pub fn new(alpha_cl: &[f64], cl: &[f64], alpha_cd: &[f64], cd: &[f64]) -> AeroResult<Self> {
        check_coverage("cl", alpha_cl)?;
        check_coverage("cd", alpha_cd)?;
        Ok(Self {
            cl: CubicSpline::new("cl", alpha_cl, cl)?,
            cd: CubicSpline::new("cd", alpha_cd, cd)?,
        })
    }

    /// Lift coefficient at `alpha_deg` (wrapped first).
    pub fn cl(&self, alpha_deg: f64) -> f64 {
        self.cl.eval(wrap_degrees(alpha_deg))
    }

    /// Drag coefficient at `alpha_deg` (wrapped first).
    pub fn cd(&self, alpha_deg: f64) -> f64 {
        self.cd.eval(wrap_degrees(alpha_deg))
    }

    /// `(cl, cd)` at `alpha_deg`.
    pub fn coefficients(&self, alpha_deg: f64) -> (f64, f64) {
        let a = wrap_degrees(alpha_deg);
        (self.cl.eval(a), self.cd.eval(a))
    }
}

/// Tables must span the whole circle so that wrapped angles never extrapolate.
fn check_coverage(table: &'static str, alpha: &[f64]) -> AeroResult<()> {
    match (alpha.first(), alpha.last()) {
        (Some(&lo), Some(&hi)) if lo <= -180.0 && hi >= 180.0 => Ok(()),
        _ => Err(AeroError::InvalidTable {
            table,
            what: "angles must cover -180..180 degrees".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polar() -> AeroPolar {
        AeroPolar::new(
            &[-180.0, -90.0, 0.0, 20.0, 90.0, 180.0],
            &[0.0, 0.0, 0.2, 1.0, 0.0, 0.0],
            &[-180.0, 0.0, 180.0],
            &[0.5, 0.1, 0.5],
        )
        .unwrap()
    }

    #[test]
    fn wrap_examples() {
        assert_eq!(wrap_degrees(200.0), -160.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(180.0), -180.0);
        assert_eq!(wrap_degrees(45.0), 45.0);
        assert_eq!(wrap_degrees(720.0 + 10.0), 10.0);
    }

    #[test]
    fn knots_are_exact() {
        let p = polar();
        assert!((p.cl(20.0) - 1.0).abs() < 1e-12);
        assert!((p.cl(0.0) - 0.2).abs() < 1e-12);
        assert!((p.cd(0.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn wrapped_angle_matches() {
        let p = polar();
        assert_eq!(p.cl(200.0), p.cl(-160.0));
        assert_eq!(p.cd(200.0), p.cd(-160.0));
    }

    #[test]
    fn coefficients_pair() {
        let p = polar();
        let (cl, cd) = p.coefficients(20.0);
        assert_eq!(cl, p.cl(20.0));
        assert_eq!(cd, p.cd(20.0));
    }

    #[test]
    fn rejects_partial_coverage() {
        let err = AeroPolar::new(&[-90.0, 90.0], &[0.0, 0.0], &[-180.0, 180.0], &[0.1, 0.1])
            .unwrap_err();
        assert!(err.to_string().contains("cover"));
    }
}
