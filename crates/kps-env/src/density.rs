//! Exponential atmosphere.

/// Density scale height (m).
pub const SCALE_HEIGHT: f64 = 8550.0;

/// Air density at `height` for sea-level density `rho_0`: `rho_0 * exp(-height / 8550)`.
pub fn air_density(rho_0: f64, height: f64) -> f64 {
    rho_0 * (-height / SCALE_HEIGHT).exp()
}
