// kps-core/src/units.rs

use uom::si::f64::{Angle as UomAngle, Length as UomLength};

// Public canonical unit types (SI, f64)
pub type Angle = UomAngle;
pub type Length = UomLength;

#[inline]
pub fn deg(v: f64) -> Angle {
    use uom::si::angle::degree;
    Angle::new::<degree>(v)
}

/// Tether diameters are configured in millimetres.
#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

/// Angle value in radians.
#[inline]
pub fn radians(a: Angle) -> f64 {
    use uom::si::angle::radian;
    a.get::<radian>()
}

/// Length value in metres.
#[inline]
pub fn meters(l: Length) -> f64 {
    use uom::si::length::meter;
    l.get::<meter>()
}

pub mod constants {
    /// Default gravitational acceleration. Models take gravity from their settings;
    /// this is only the value those settings default to.
    pub const G_EARTH_MPS2: f64 = 9.81;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_radian_conversion() {
        assert!((radians(deg(180.0)) - std::f64::consts::PI).abs() < 1e-12);
        assert!((radians(deg(-90.0)) + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn millimetre_diameter() {
        assert!((meters(mm(4.0)) - 0.004).abs() < 1e-15);
    }
}
