//! Wind profile laws.

/// Height dependence of the wind speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ProfileLaw {
    /// Power law `(h / h_ref)^alpha`
    Exp,
    /// Logarithmic law `ln(h / z0) / ln(h_ref / z0)`
    Log,
    /// Blend `log + (log - exp)`, fitted to measured profiles above ~100 m
    #[default]
    ExpLog,
}

/// Wind profile parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindProfile {
    pub law: ProfileLaw,
    /// Power-law exponent
    pub alpha: f64,
    /// Surface roughness length (m)
    pub z0: f64,
    /// Reference height of the measured ground wind (m)
    pub h_ref: f64,
    /// Heights below this are clamped before evaluation (m)
    pub h_min: f64,
}

impl Default for WindProfile {
    fn default() -> Self {
        Self {
            law: ProfileLaw::ExpLog,
            alpha: 0.08163,
            z0: 0.0002,
            h_ref: 6.0,
            h_min: 6.0,
        }
    }
}

impl WindProfile {
    /// Wind speed at `height` relative to the speed at `h_ref`.
    pub fn factor(&self, height: f64) -> f64 {
        let h = height.max(self.h_min);
        match self.law {
            ProfileLaw::Exp => self.exp_law(h),
            ProfileLaw::Log => self.log_law(h),
            ProfileLaw::ExpLog => {
                let log = self.log_law(h);
                log + (log - self.exp_law(h))
            }
        }
    }

    fn exp_law(&self, h: f64) -> f64 {
        (h / self.h_ref).powf(self.alpha)
    }

    fn log_law(&self, h: f64) -> f64 {
        (h / self.z0).ln() / (self.h_ref / self.z0).ln()
    }
}
