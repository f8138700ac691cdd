// src/config/mod.rs
//! Session configuration
//!
//! One TOML document describes the device, the dataset root and the live
//! viewer. Every field has a default; file values override defaults and
//! `EEG_`-prefixed environment variables override both.

pub mod loader;

pub use loader::{load_config, load_config_from, ConfigError};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::stream::SensorKind;

/// Complete session configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct SessionConfig {
    /// Headband device parameters.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Dataset export parameters.
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// Live viewer parameters.
    #[serde(default)]
    pub viewer: ViewerConfig,
}

/// Headband device parameters.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DeviceConfig {
    /// EEG channel labels in capture order.
    #[serde(default = "defaults::eeg_channels")]
    pub eeg_channels: Vec<String>,

    /// EEG sample rate in Hz.
    #[serde(default = "defaults::sample_rate_hz")]
    pub sample_rate_hz: f64,

    /// Power-line frequency of the recording region.
    #[serde(default = "defaults::line_freq_hz")]
    pub line_freq_hz: u32,

    /// EEG rows per motion record.
    #[serde(default = "defaults::motion_ratio")]
    pub motion_ratio: usize,

    /// EEG rows per rotation record.
    #[serde(default = "defaults::rotation_ratio")]
    pub rotation_ratio: usize,

    /// EEG rows per optical pulse record.
    #[serde(default = "defaults::optical_ratio")]
    pub optical_ratio: usize,
}

/// Dataset export parameters.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Dataset root directory.
    #[serde(default = "defaults::dataset_root")]
    pub root: PathBuf,

    /// Replace existing recordings on export.
    #[serde(default)]
    pub overwrite: bool,
}

/// Live viewer parameters.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Rows of recent data shown per channel.
    #[serde(default = "defaults::window_rows")]
    pub window_rows: usize,

    /// Refresh interval in milliseconds.
    #[serde(default = "defaults::refresh_ms")]
    pub refresh_ms: u64,

    /// Rows added or removed per zoom step.
    #[serde(default = "defaults::zoom_step_rows")]
    pub zoom_step_rows: usize,
}

/// Default value providers.
mod defaults {
    use std::path::PathBuf;

    use crate::stream::{EEG_CAPTURE_ORDER, EEG_SAMPLE_RATE_HZ};

    pub fn eeg_channels() -> Vec<String> {
        EEG_CAPTURE_ORDER.iter().map(|s| s.to_string()).collect()
    }
    pub fn sample_rate_hz() -> f64 {
        EEG_SAMPLE_RATE_HZ
    }
    pub fn line_freq_hz() -> u32 {
        50
    }
    pub fn motion_ratio() -> usize {
        crate::stream::SensorKind::Accelerometer.rate_ratio()
    }
    pub fn rotation_ratio() -> usize {
        crate::stream::SensorKind::Gyroscope.rate_ratio()
    }
    pub fn optical_ratio() -> usize {
        crate::stream::SensorKind::Ppg.rate_ratio()
    }
    pub fn dataset_root() -> PathBuf {
        PathBuf::from("dataset")
    }
    pub fn window_rows() -> usize {
        1400
    }
    pub fn refresh_ms() -> u64 {
        200
    }
    pub fn zoom_step_rows() -> usize {
        200
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            eeg_channels: defaults::eeg_channels(),
            sample_rate_hz: defaults::sample_rate_hz(),
            line_freq_hz: defaults::line_freq_hz(),
            motion_ratio: defaults::motion_ratio(),
            rotation_ratio: defaults::rotation_ratio(),
            optical_ratio: defaults::optical_ratio(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: defaults::dataset_root(),
            overwrite: false,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_rows: defaults::window_rows(),
            refresh_ms: defaults::refresh_ms(),
            zoom_step_rows: defaults::zoom_step_rows(),
        }
    }
}

impl SessionConfig {
    /// The configured rate ratio for `kind`.
    pub fn rate_ratio(&self, kind: SensorKind) -> usize {
        match kind {
            SensorKind::Accelerometer => self.device.motion_ratio,
            SensorKind::Gyroscope => self.device.rotation_ratio,
            SensorKind::Ppg => self.device.optical_ratio,
        }
    }

    /// Validate configuration consistency, collecting every violation.
    pub fn validate_consistency(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.device.eeg_channels.is_empty() {
            errors.push("device.eeg_channels must not be empty".to_string());
        }
        if self.device.sample_rate_hz <= 0.0 {
            errors.push(format!(
                "device.sample_rate_hz must be positive, got {}",
                self.device.sample_rate_hz
            ));
        }
        if !matches!(self.device.line_freq_hz, 50 | 60) {
            errors.push(format!(
                "device.line_freq_hz must be 50 or 60, got {}",
                self.device.line_freq_hz
            ));
        }
        for (name, ratio) in [
            ("device.motion_ratio", self.device.motion_ratio),
            ("device.rotation_ratio", self.device.rotation_ratio),
            ("device.optical_ratio", self.device.optical_ratio),
        ] {
            if ratio == 0 {
                errors.push(format!("{} must be at least 1", name));
            }
        }
        if self.viewer.zoom_step_rows == 0 {
            errors.push("viewer.zoom_step_rows must be at least 1".to_string());
        }
        if self.viewer.window_rows < self.viewer.zoom_step_rows {
            errors.push(format!(
                "viewer.window_rows ({}) must be at least viewer.zoom_step_rows ({})",
                self.viewer.window_rows, self.viewer.zoom_step_rows
            ));
        }
        if self.viewer.refresh_ms < 50 {
            errors.push(format!(
                "viewer.refresh_ms must be at least 50, got {}",
                self.viewer.refresh_ms
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_consistent() {
        let config = SessionConfig::default();
        assert!(config.validate_consistency().is_ok());
        assert_eq!(config.device.sample_rate_hz, 256.0);
        assert_eq!(config.rate_ratio(SensorKind::Ppg), 4);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SessionConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: SessionConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: SessionConfig = toml::from_str(
            r#"
            [device]
            line_freq_hz = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.device.line_freq_hz, 60);
        assert_eq!(config.device.motion_ratio, 5);
        assert_eq!(config.viewer.window_rows, 1400);
    }

    #[test]
    fn test_validation_collects_every_violation() {
        let mut config = SessionConfig::default();
        config.device.line_freq_hz = 55;
        config.device.motion_ratio = 0;
        config.viewer.refresh_ms = 10;

        let errors = config.validate_consistency().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("line_freq_hz")));
        assert!(errors.iter().any(|e| e.contains("motion_ratio")));
        assert!(errors.iter().any(|e| e.contains("refresh_ms")));
    }
}
