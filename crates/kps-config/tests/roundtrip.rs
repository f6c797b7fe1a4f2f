use kps_config::{
    ConfigError, ModelKind, Settings, from_yaml_str, load_json, load_yaml, save_json, save_yaml,
};

#[test]
fn roundtrip_yaml_defaults() {
    let settings = Settings::default();
    let path = std::env::temp_dir().join("kps_config_roundtrip_defaults.yaml");

    save_yaml(&path, &settings).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(settings, loaded);
}

#[test]
fn roundtrip_json_three_line() {
    let mut settings = Settings::default();
    settings.system.model = ModelKind::ThreeLine;
    settings.tether.l_tether = 50.0;
    settings.initial.steering = 0.3;
    let path = std::env::temp_dir().join("kps_config_roundtrip_3l.json");

    save_json(&path, &settings).unwrap();
    let loaded = load_json(&path).unwrap();

    assert_eq!(settings, loaded);
}

#[test]
fn empty_document_yields_defaults() {
    let settings = from_yaml_str("{}").unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn partial_section_keeps_other_defaults() {
    let settings = from_yaml_str("tether:\n  l_tether: 250.0\n").unwrap();
    assert_eq!(settings.tether.l_tether, 250.0);
    assert_eq!(settings.tether.d_tether_mm, 4.0);
    assert_eq!(settings.kite, Settings::default().kite);
}

#[test]
fn invalid_value_is_rejected_on_load() {
    let err = from_yaml_str("kite:\n  mass: 0.0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn unknown_model_is_a_yaml_error() {
    let err = from_yaml_str("system:\n  model: four_line\n").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
}

#[test]
fn save_refuses_invalid_settings() {
    let mut settings = Settings::default();
    settings.system.segments = 0;
    let path = std::env::temp_dir().join("kps_config_invalid.yaml");
    assert!(save_yaml(&path, &settings).is_err());
}
