//! Lookup against the reference kite polar.

use kps_aero::AeroPolar;
use proptest::prelude::*;

const ALPHA_CL: [f64; 12] = [
    -180.0, -160.0, -90.0, -20.0, -10.0, -5.0, 0.0, 20.0, 40.0, 90.0, 160.0, 180.0,
];
const CL_LIST: [f64; 12] = [0.0, 0.5, 0.0, 0.08, 0.125, 0.15, 0.2, 1.0, 1.0, 0.0, -0.5, 0.0];
const ALPHA_CD: [f64; 11] = [
    -180.0, -170.0, -140.0, -90.0, -20.0, 0.0, 20.0, 90.0, 140.0, 170.0, 180.0,
];
const CD_LIST: [f64; 11] = [0.5, 0.5, 0.5, 1.0, 0.2, 0.1, 0.2, 1.0, 0.5, 0.5, 0.5];

fn reference() -> AeroPolar {
    AeroPolar::new(&ALPHA_CL, &CL_LIST, &ALPHA_CD, &CD_LIST).unwrap()
}

#[test]
fn matches_every_knot() {
    let p = reference();
    for (a, c) in ALPHA_CL.iter().zip(CL_LIST) {
        assert!((p.cl(*a) - c).abs() < 1e-10, "cl({a})");
    }
    for (a, c) in ALPHA_CD.iter().zip(CD_LIST) {
        // +180 wraps to -180, which carries the same value in these tables
        assert!((p.cd(*a) - c).abs() < 1e-10, "cd({a})");
    }
}

#[test]
fn flight_range_is_plausible() {
    let p = reference();
    for a in [5.0, 10.0, 15.0] {
        let (cl, cd) = p.coefficients(a);
        assert!(cl > 0.2 && cl < 1.2, "cl({a}) = {cl}");
        assert!(cd > 0.05 && cd < 0.3, "cd({a}) = {cd}");
    }
}

proptest! {
    #[test]
    fn lookup_is_periodic(a in -180.0_f64..180.0, turns in -3_i32..3) {
        let p = reference();
        let shifted = a + 360.0 * f64::from(turns);
        prop_assert!((p.cl(shifted) - p.cl(a)).abs() < 1e-9);
        prop_assert!((p.cd(shifted) - p.cd(a)).abs() < 1e-9);
    }
}
