//! Settings validation.

use crate::schema::{ModelKind, Settings};
use kps_aero::AeroPolar;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid aero table: {0}")]
    AeroTable(#[from] kps_aero::AeroError),

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, value, "must be positive and finite"));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, value, "must be non-negative and finite"));
    }
    Ok(())
}

fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(invalid(field, value, "must be finite"));
    }
    Ok(())
}

fn fraction(field: &str, value: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, value, "must lie in [0, 1]"));
    }
    Ok(())
}

pub fn validate_settings(settings: &Settings) -> Result<(), ValidationError> {
    let system = &settings.system;
    if system.segments == 0 {
        return Err(invalid("system.segments", system.segments, "need at least one segment"));
    }
    positive("system.g_earth", system.g_earth)?;

    let initial = &settings.initial;
    if !(0.0..=90.0).contains(&initial.elevation_deg) || initial.elevation_deg == 0.0 {
        return Err(invalid(
            "initial.elevation_deg",
            initial.elevation_deg,
            "must lie in (0, 90]",
        ));
    }
    finite("initial.v_reel_out", initial.v_reel_out)?;
    finite("initial.depower_deg", initial.depower_deg)?;
    if !(-1.0..=1.0).contains(&initial.steering) {
        return Err(invalid("initial.steering", initial.steering, "must lie in [-1, 1]"));
    }

    let solver = &settings.solver;
    positive("solver.steady_tol", solver.steady_tol)?;
    positive("solver.fd_epsilon", solver.fd_epsilon)?;
    positive("solver.lm_damping", solver.lm_damping)?;
    if solver.max_iter == 0 {
        return Err(invalid("solver.max_iter", solver.max_iter, "must be at least 1"));
    }

    let tether = &settings.tether;
    positive("tether.l_tether", tether.l_tether)?;
    positive("tether.d_tether_mm", tether.d_tether_mm)?;
    positive("tether.rho_tether", tether.rho_tether)?;
    positive("tether.c_spring", tether.c_spring)?;
    non_negative("tether.damping", tether.damping)?;
    non_negative("tether.cd_tether", tether.cd_tether)?;
    fraction("tether.compression_tether", tether.compression_tether)?;
    fraction("tether.compression_kite", tether.compression_kite)?;
    non_negative("tether.rel_damping", tether.rel_damping)?;

    let kite = &settings.kite;
    positive("kite.area", kite.area)?;
    positive("kite.mass", kite.mass)?;
    non_negative("kite.kcu_mass", kite.kcu_mass)?;
    non_negative("kite.rel_side_area", kite.rel_side_area)?;
    finite("kite.c_s", kite.c_s)?;
    finite("kite.c2_cor", kite.c2_cor)?;
    positive("kite.bridle_drag", kite.bridle_drag)?;
    non_negative("kite.steering_drag", kite.steering_drag)?;

    let aero = &settings.aero;
    finite("aero.alpha_zero", aero.alpha_zero)?;
    AeroPolar::new(&aero.alpha_cl, &aero.cl_list, &aero.alpha_cd, &aero.cd_list)?;

    let env = &settings.environment;
    non_negative("environment.v_wind", env.v_wind)?;
    positive("environment.h_ref", env.h_ref)?;
    positive("environment.z0", env.z0)?;
    positive("environment.rho_0", env.rho_0)?;
    positive("environment.h_min", env.h_min)?;
    finite("environment.alpha", env.alpha)?;
    finite("environment.wind_direction_deg", env.wind_direction_deg)?;
    if env.z0 >= env.h_min {
        return Err(invalid(
            "environment.z0",
            env.z0,
            "roughness length must be below the minimum profile height",
        ));
    }

    match system.model {
        ModelKind::OnePoint => {}
        ModelKind::FourPoint => validate_four_point(settings)?,
        ModelKind::ThreeLine => validate_three_line(settings)?,
    }

    let winch = &settings.winch;
    positive("winch.drum_radius", winch.drum_radius)?;
    positive("winch.gear_ratio", winch.gear_ratio)?;
    positive("winch.inertia_total", winch.inertia_total)?;
    positive("winch.breakdown_torque", winch.breakdown_torque)?;
    positive("winch.breakdown_slip", winch.breakdown_slip)?;
    positive("winch.omega_sn", winch.omega_sn)?;
    non_negative("winch.f_coulomb", winch.f_coulomb)?;
    non_negative("winch.c_vf", winch.c_vf)?;
    positive("winch.brake_speed", winch.brake_speed)?;

    Ok(())
}

fn validate_four_point(settings: &Settings) -> Result<(), ValidationError> {
    let fp = &settings.four_point;
    positive("four_point.h_bridle", fp.h_bridle)?;
    positive("four_point.height", fp.height)?;
    positive("four_point.width", fp.width)?;
    positive("four_point.depth", fp.depth)?;
    Ok(())
}

fn validate_three_line(settings: &Settings) -> Result<(), ValidationError> {
    let tl = &settings.three_line;
    positive("three_line.width", tl.width)?;
    positive("three_line.radius", tl.radius)?;
    positive("three_line.middle_length", tl.middle_length)?;
    positive("three_line.tip_length", tl.tip_length)?;
    positive("three_line.d_steering_mm", tl.d_steering_mm)?;
    non_negative("three_line.connection_mass", tl.connection_mass)?;
    non_negative("three_line.min_steering_line_distance", tl.min_steering_line_distance)?;
    fraction("three_line.steering_fraction", tl.steering_fraction)?;
    fraction("three_line.apex_share", tl.apex_share)?;
    if tl.aero_surfaces == 0 {
        return Err(invalid(
            "three_line.aero_surfaces",
            tl.aero_surfaces,
            "need at least one surface per kite half",
        ));
    }
    // Half the arc angle must stay below a right angle for the tips to sit below the apex
    if tl.width / (2.0 * tl.radius) >= std::f64::consts::FRAC_PI_2 {
        return Err(invalid(
            "three_line.width",
            tl.width,
            "kite arc spans more than a half circle",
        ));
    }
    if tl.min_steering_line_distance >= tl.width {
        return Err(invalid(
            "three_line.min_steering_line_distance",
            tl.min_steering_line_distance,
            "dead zone is wider than the kite",
        ));
    }
    if settings.system.segments < 2 {
        return Err(ValidationError::Unsupported {
            feature: "three-line model with a single segment".to_string(),
            reason: "the steering lines need at least one free particle below the kite"
                .to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        validate_settings(&Settings::default()).unwrap();
    }

    #[test]
    fn three_line_defaults_are_valid() {
        let mut s = Settings::default();
        s.system.model = ModelKind::ThreeLine;
        validate_settings(&s).unwrap();
    }

    #[test]
    fn four_point_defaults_are_valid() {
        let mut s = Settings::default();
        s.system.model = ModelKind::FourPoint;
        validate_settings(&s).unwrap();
    }

    #[test]
    fn rejects_flat_four_point_kite() {
        let mut s = Settings::default();
        s.system.model = ModelKind::FourPoint;
        s.four_point.height = 0.0;
        let err = validate_settings(&s).unwrap_err();
        assert!(err.to_string().contains("four_point.height"));
    }

    #[test]
    fn rejects_zero_segments() {
        let mut s = Settings::default();
        s.system.segments = 0;
        let err = validate_settings(&s).unwrap_err();
        assert!(err.to_string().contains("system.segments"));
    }

    #[test]
    fn rejects_negative_area() {
        let mut s = Settings::default();
        s.kite.area = -1.0;
        assert!(matches!(
            validate_settings(&s),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_short_polar() {
        let mut s = Settings::default();
        s.aero.alpha_cl = vec![-10.0, 10.0];
        s.aero.cl_list = vec![0.1, 0.9];
        assert!(matches!(
            validate_settings(&s),
            Err(ValidationError::AeroTable(_))
        ));
    }

    #[test]
    fn rejects_oversized_arc() {
        let mut s = Settings::default();
        s.system.model = ModelKind::ThreeLine;
        s.three_line.width = 20.0;
        assert!(validate_settings(&s).is_err());
    }

    #[test]
    fn three_line_geometry_ignored_for_one_point() {
        let mut s = Settings::default();
        s.three_line.width = 20.0;
        validate_settings(&s).unwrap();
    }
}
