//! Transient runs of the kite models started from their steady state.

use kps_config::load_yaml;
use kps_model::{KiteModel, KiteSystem, MIDDLE};
use kps_sim::{SimOptions, run_sim};
use kps_solver::{SteadyConfig, find_steady_state};
use std::path::PathBuf;

fn data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../data")
        .join(name)
}

#[test]
fn steady_state_is_kept_by_the_integrator() {
    let settings = load_yaml(&data_file("settings.yaml")).unwrap();
    let mut model = KiteSystem::from_settings(&settings).unwrap();
    let steady = find_steady_state(&mut model, &SteadyConfig::from(&settings.solver)).unwrap();
    let tension = model.winch_forces()[0];

    let opts = SimOptions {
        dt: 0.05,
        t_end: 0.5,
        ..SimOptions::default()
    };
    let record = run_sim(&mut model, &steady.y0, &steady.yd0, &opts).unwrap();

    assert_eq!(record.t.len(), 11);
    for out in &record.outputs {
        let drift = (out.winch_forces[0] - tension).abs() / tension;
        assert!(drift < 1e-3, "tension {} vs {}", out.winch_forces[0], tension);
    }
}

#[test]
fn reeling_out_slackens_the_tether() {
    let settings = load_yaml(&data_file("settings.yaml")).unwrap();
    let mut model = KiteSystem::from_settings(&settings).unwrap();
    let steady = find_steady_state(&mut model, &SteadyConfig::from(&settings.solver)).unwrap();
    let tension = model.winch_forces()[0];
    let length = model.tether_lengths()[0];

    model.set_v_reel_out(0.5, 0.0);
    let opts = SimOptions {
        dt: 0.02,
        t_end: 0.2,
        ..SimOptions::default()
    };
    let record = run_sim(&mut model, &steady.y0, &steady.yd0, &opts).unwrap();

    let last = record.outputs.last().unwrap();
    assert!(last.tether_lengths[0] > length);
    assert!(last.tether_lengths[0] < length + 0.2);
    assert!(last.winch_forces[0] < tension);
    assert!(record.t.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn three_line_kite_holds_with_braked_winches() {
    let settings = load_yaml(&data_file("settings_3l.yaml")).unwrap();
    let mut model = KiteSystem::from_settings(&settings).unwrap();
    let config = SteadyConfig::from(&settings.solver);
    let steady = find_steady_state(&mut model, &config).unwrap();
    let lengths = model.tether_lengths().to_vec();
    let middle = model.winch_forces()[MIDDLE];

    let opts = SimOptions {
        dt: 0.05,
        t_end: 0.2,
        newton_tol: 1e-5,
        ..SimOptions::default()
    };
    let record = run_sim(&mut model, &steady.y0, &steady.yd0, &opts).unwrap();

    let last = record.outputs.last().unwrap();
    for (now, before) in last.tether_lengths.iter().zip(&lengths) {
        assert!((now - before).abs() < 1e-6);
    }
    assert!((last.winch_forces[MIDDLE] - middle).abs() / middle < 1e-2);
}
