//! Environment model checks against reference values.

use kps_env::{Environment, ProfileLaw, StandardEnvironment, WindProfile};
use proptest::prelude::*;

#[test]
fn reference_kite_height_wind() {
    // Kite of the reference scenario flies at roughly 370 m.
    let env = StandardEnvironment::new(WindProfile::default(), 1.225, 9.51, 0.0);
    let v = env.wind_at(370.0).norm();
    assert!(v > 12.0 && v < 15.0, "wind at kite height: {v}");
}

#[test]
fn density_at_kite_height() {
    let env = StandardEnvironment::new(WindProfile::default(), 1.225, 9.51, 0.0);
    let rho = env.air_density(370.0);
    assert!((rho - 1.225 * (-370.0_f64 / 8550.0).exp()).abs() < 1e-12);
}

proptest! {
    #[test]
    fn factors_stay_bounded(h in 0.0_f64..1000.0) {
        for law in [ProfileLaw::Exp, ProfileLaw::Log, ProfileLaw::ExpLog] {
            let p = WindProfile { law, ..WindProfile::default() };
            let f = p.factor(h);
            prop_assert!(f.is_finite());
            prop_assert!(f >= 1.0 - 1e-12);
            prop_assert!(f < 2.0);
        }
    }
}
