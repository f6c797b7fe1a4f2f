//! kps-config: settings file format and validation.
//!
//! Settings are plain serde structs with defaults for every field. Loading
//! always validates, so downstream crates can assume positive lengths, masses
//! and a well-formed polar.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_settings};

use std::path::Path;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn from_yaml_str(content: &str) -> ConfigResult<Settings> {
    let settings: Settings = serde_yaml::from_str(content)?;
    validate_settings(&settings)?;
    Ok(settings)
}

pub fn load_yaml(path: &Path) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &Path, settings: &Settings) -> ConfigResult<()> {
    validate_settings(settings)?;
    let content = serde_yaml::to_string(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    validate_settings(&settings)?;
    Ok(settings)
}

pub fn save_json(path: &Path, settings: &Settings) -> ConfigResult<()> {
    validate_settings(settings)?;
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a settings file, picking the format from the extension.
pub fn load(path: &Path) -> ConfigResult<Settings> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}
