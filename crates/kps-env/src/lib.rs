//! kps-env: environment model for the tethered kite.
//!
//! Pure functions of height:
//! - wind profile laws (power law, logarithmic, blended)
//! - exponential air density
//!
//! Models consume both through the [`Environment`] trait so that a different
//! atmosphere can be plugged in without touching force assembly.

pub mod density;
pub mod wind;

pub use density::{air_density, SCALE_HEIGHT};
pub use wind::{ProfileLaw, WindProfile};

use kps_core::Vec3;

/// Environment capability consumed by the kite models.
pub trait Environment: Send + Sync {
    /// Ratio of wind speed at `height` to wind speed at the reference height.
    fn wind_factor(&self, height: f64) -> f64;

    /// Air density at `height` (kg/m³).
    fn air_density(&self, height: f64) -> f64;

    /// Wind vector at the reference height.
    fn ground_wind(&self) -> Vec3;

    /// Wind vector at `height`.
    fn wind_at(&self, height: f64) -> Vec3 {
        self.ground_wind() * self.wind_factor(height)
    }
}

/// Wind profile plus exponential atmosphere, configured from settings.
#[derive(Clone, Debug)]
pub struct StandardEnvironment {
    pub profile: WindProfile,
    /// Air density at sea level (kg/m³)
    pub rho_0: f64,
    /// Wind speed at the profile reference height (m/s)
    pub v_wind: f64,
    /// Downwind direction, measured from the x axis (rad)
    pub wind_direction: f64,
}

impl StandardEnvironment {
    pub fn new(profile: WindProfile, rho_0: f64, v_wind: f64, wind_direction: f64) -> Self {
        Self {
            profile,
            rho_0,
            v_wind,
            wind_direction,
        }
    }

    /// Quiet atmosphere (zero wind) with the given profile.
    pub fn calm(profile: WindProfile, rho_0: f64) -> Self {
        Self::new(profile, rho_0, 0.0, 0.0)
    }
}

impl Environment for StandardEnvironment {
    fn wind_factor(&self, height: f64) -> f64 {
        self.profile.factor(height)
    }

    fn air_density(&self, height: f64) -> f64 {
        air_density(self.rho_0, height)
    }

    fn ground_wind(&self) -> Vec3 {
        Vec3::new(
            self.v_wind * self.wind_direction.cos(),
            self.v_wind * self.wind_direction.sin(),
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> StandardEnvironment {
        StandardEnvironment::new(WindProfile::default(), 1.225, 9.51, 0.0)
    }

    #[test]
    fn ground_wind_points_downwind() {
        let w = env().ground_wind();
        assert!((w.x - 9.51).abs() < 1e-12);
        assert!(w.y.abs() < 1e-12);
        assert_eq!(w.z, 0.0);
    }

    #[test]
    fn wind_at_reference_height_is_ground_wind() {
        let e = env();
        let w = e.wind_at(e.profile.h_ref);
        assert!((w - e.ground_wind()).norm() < 1e-12);
    }

    #[test]
    fn calm_environment_has_no_wind() {
        let e = StandardEnvironment::calm(WindProfile::default(), 1.225);
        assert_eq!(e.wind_at(300.0).norm(), 0.0);
    }
}
