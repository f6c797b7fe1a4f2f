//! Properties every kite model's residual has to satisfy.

use kps_config::{ModelKind, Settings};
use kps_model::{KiteModel, KiteSystem, ModelError};
use proptest::prelude::*;

fn one_point() -> KiteSystem {
    let mut s = Settings::default();
    s.tether.l_tether = 392.0;
    KiteSystem::from_settings(&s).unwrap()
}

fn three_line() -> KiteSystem {
    let mut s = Settings::default();
    s.system.model = ModelKind::ThreeLine;
    s.tether.l_tether = 50.0;
    KiteSystem::from_settings(&s).unwrap()
}

fn evaluate(model: &mut KiteSystem, y: &[f64], yd: &[f64]) -> Vec<f64> {
    let mut res = vec![0.0; model.layout().len()];
    model.residual(y, yd, 0.0, &mut res).unwrap();
    res
}

#[test]
fn dimensions_match_layout() {
    assert_eq!(one_point().layout().len(), 6 * 6);
    assert_eq!(three_line().layout().len(), 6 * 18 + 4 + 6);
}

#[test]
fn clear_resets_session() {
    let mut m = one_point();
    let x = vec![0.5; m.steady_param_count()];
    let (y, yd) = m.steady_state(&x).unwrap();
    evaluate(&mut m, &y, &yd);
    assert!(m.session().iterations > 0);
    assert!(m.winch_forces()[0] > 0.0);

    m.clear().unwrap();
    assert_eq!(m.session().iterations, 0);
    assert_eq!(m.winch_forces()[0], 0.0);
    assert_eq!(m.tether_lengths(), &[392.0]);
}

#[test]
fn non_finite_state_diverges() {
    for mut m in [one_point(), three_line()] {
        let x = vec![0.0; m.steady_param_count()];
        let (mut y, yd) = m.steady_state(&x).unwrap();
        y[1] = f64::NAN;
        let mut res = vec![0.0; m.layout().len()];
        let err = m.residual(&y, &yd, 0.0, &mut res).unwrap_err();
        assert!(matches!(err, ModelError::Diverged { .. }), "{err}");
    }
}

#[test]
fn velocity_equations_compare_velocity_and_position_derivative() {
    let mut m = three_line();
    let x = vec![0.0; m.steady_param_count()];
    let (y, mut yd) = m.steady_state(&x).unwrap();
    yd[4] = 0.25;
    let res = evaluate(&mut m, &y, &yd);
    assert_eq!(res[4], -0.25);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn residual_is_deterministic(
        offsets in prop::collection::vec(-0.5f64..0.5, 12),
        speed in -1.0f64..1.0,
    ) {
        let mut m = one_point();
        let (y, mut yd) = m.steady_state(&offsets).unwrap();
        yd.iter_mut().for_each(|v| *v += speed);
        let first = evaluate(&mut m, &y, &yd);
        let second = evaluate(&mut m, &y, &yd);
        let fresh = evaluate(&mut one_point(), &y, &yd);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &fresh);
    }

    #[test]
    fn three_line_residual_is_deterministic(
        offsets in prop::collection::vec(-0.05f64..0.05, 56),
    ) {
        let mut m = three_line();
        let (y, yd) = m.steady_state(&offsets).unwrap();
        let first = evaluate(&mut m, &y, &yd);
        let second = evaluate(&mut m, &y, &yd);
        prop_assert_eq!(first, second);
    }
}
