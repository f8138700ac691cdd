// src/config/loader.rs
//! Configuration loading with environment overrides
//!
//! File values are merged over the serialized defaults, then `EEG_`
//! environment variables are applied on top: `EEG_DEVICE_LINE_FREQ_HZ=60`
//! sets `device.line_freq_hz`. The merged document is validated before it
//! is handed back.

use std::env;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::config::SessionConfig;

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "EEG_";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested configuration file does not exist.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The document is not valid TOML or does not match the schema.
    #[error("configuration parse error: {0}")]
    Parse(String),

    /// The merged configuration is inconsistent.
    #[error("configuration validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Reading the file failed.
    #[error("configuration I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Load the default configuration with environment overrides applied.
pub fn load_config() -> Result<SessionConfig, ConfigError> {
    finish(default_value()?)
}

/// Load a configuration file, merge it over the defaults and apply
/// environment overrides.
pub fn load_config_from<P: AsRef<Path>>(path: P) -> Result<SessionConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    let file_value: toml::Value = toml::from_str(&content)?;

    let mut merged = default_value()?;
    merge_toml_values(&mut merged, file_value);
    finish(merged)
}

fn default_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SessionConfig::default()).map_err(|e| ConfigError::Parse(e.to_string()))
}

fn finish(mut value: toml::Value) -> Result<SessionConfig, ConfigError> {
    apply_environment_overrides(&mut value);
    let config: SessionConfig = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;
    config
        .validate_consistency()
        .map_err(ConfigError::Validation)?;
    Ok(config)
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

/// Apply `EEG_SECTION_FIELD=value` overrides. The first path segment is the
/// section, the rest is the field name (fields themselves contain
/// underscores, sections do not).
fn apply_environment_overrides(value: &mut toml::Value) {
    for (key, raw) in env::vars() {
        let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let Some((section, field)) = stripped.split_once('_') else {
            continue;
        };
        let section = section.to_lowercase();
        let field = field.to_lowercase();
        debug!(section = %section, field = %field, "environment override");
        set_nested_value(value, &section, &field, parse_env_value(&raw));
    }
}

fn parse_env_value(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else {
        toml::Value::String(value.to_string())
    }
}

fn set_nested_value(config: &mut toml::Value, section: &str, field: &str, value: toml::Value) {
    if let toml::Value::Table(table) = config {
        let entry = table
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
        if let toml::Value::Table(section_table) = entry {
            section_table.insert(field.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_load_default_config() {
        let config = load_config().unwrap();
        assert_eq!(config.device.line_freq_hz, 50);
    }

    #[test]
    fn test_missing_file_reported() {
        let err = load_config_from("/nonexistent/config.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    #[serial]
    fn test_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[device]
line_freq_hz = 60

[viewer]
window_rows = 2000
            "#
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.device.line_freq_hz, 60);
        assert_eq!(config.viewer.window_rows, 2000);
        // Untouched fields keep their defaults.
        assert_eq!(config.device.motion_ratio, 5);
    }

    #[test]
    #[serial]
    fn test_invalid_file_fails_validation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[device]
line_freq_hz = 55
            "#
        )
        .unwrap();

        let err = load_config_from(file.path()).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.contains("line_freq_hz")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        env::set_var("EEG_DEVICE_LINE_FREQ_HZ", "60");
        let config = load_config().unwrap();
        env::remove_var("EEG_DEVICE_LINE_FREQ_HZ");

        assert_eq!(config.device.line_freq_hz, 60);
    }

    #[test]
    #[serial]
    fn test_environment_override_beats_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[viewer]\nrefresh_ms = 500").unwrap();

        env::set_var("EEG_VIEWER_REFRESH_MS", "1000");
        let config = load_config_from(file.path()).unwrap();
        env::remove_var("EEG_VIEWER_REFRESH_MS");

        assert_eq!(config.viewer.refresh_ms, 1000);
    }
}
