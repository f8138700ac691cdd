// src/capture/synthetic.rs
//! Synthetic capture sessions
//!
//! Deterministic, seedable stand-in for a real headband capture: band-mixed
//! sine EEG with noise, gentle motion/rotation traces and a pulsing optical
//! channel, all at the device's nominal rates. Used by demos and tests that
//! need a session without binary fixtures.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::stream::{
    AuxStream, CaptureSet, EegStream, SensorKind, EEG_CAPTURE_ORDER, EEG_SAMPLE_RATE_HZ,
};

/// Parameters of a generated session.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Recording length in seconds.
    pub seconds: f64,
    /// Number of simulated headbands.
    pub devices: usize,
    /// RNG seed; equal seeds produce equal sessions.
    pub seed: u64,
    /// Wall-clock start, epoch seconds.
    pub start_time: f64,
    /// Attach a motion stream per device.
    pub motion: bool,
    /// Attach a rotation stream per device.
    pub rotation: bool,
    /// Attach an optical pulse stream per device.
    pub optical: bool,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        SyntheticConfig {
            seconds: 2.0,
            devices: 1,
            seed: 42,
            start_time: 1_700_000_000.0,
            motion: true,
            rotation: true,
            optical: true,
        }
    }
}

/// Generate a synthetic capture session.
pub fn generate_session(config: &SyntheticConfig) -> CaptureSet {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut set = CaptureSet::default();
    let eeg_rows = (config.seconds * EEG_SAMPLE_RATE_HZ) as usize;

    for device_index in 0..config.devices {
        let device = format!("Muse-SIM{}", device_index);

        set.eeg.push(eeg_stream(&device, eeg_rows, config, &mut rng));
        set.filenames.push("synthetic.xdf".to_string());

        if config.motion {
            set.accelerometer
                .push(aux_stream(SensorKind::Accelerometer, &device, eeg_rows, &mut rng));
        }
        if config.rotation {
            set.gyroscope
                .push(aux_stream(SensorKind::Gyroscope, &device, eeg_rows, &mut rng));
        }
        if config.optical {
            set.ppg
                .push(aux_stream(SensorKind::Ppg, &device, eeg_rows, &mut rng));
        }
    }
    set
}

fn eeg_stream(device: &str, rows: usize, config: &SyntheticConfig, rng: &mut StdRng) -> EegStream {
    let channels: Vec<String> = EEG_CAPTURE_ORDER.iter().map(|s| s.to_string()).collect();
    let n_channels = channels.len();

    let mut samples = Array2::zeros((rows, n_channels));
    for row in 0..rows {
        let t = row as f64 / EEG_SAMPLE_RATE_HZ;
        for ch in 0..n_channels {
            // Alpha, beta and delta components in microvolts, phase-shifted
            // per channel, plus broadband noise.
            let phase = ch as f64 * 0.1;
            let alpha = 20.0 * (2.0 * std::f64::consts::PI * 10.0 * t + phase).sin();
            let beta = 5.0 * (2.0 * std::f64::consts::PI * 20.0 * t + phase).sin();
            let delta = 10.0 * (2.0 * std::f64::consts::PI * 2.0 * t).sin();
            let noise = rng.gen_range(-4.0..4.0);
            samples[(row, ch)] = (alpha + beta + delta + noise) as f32;
        }
    }

    let timestamps = (0..rows)
        .map(|row| config.start_time + row as f64 / EEG_SAMPLE_RATE_HZ)
        .collect();

    EegStream {
        name: format!("{} EEG", device),
        device: device.to_string(),
        nominal_srate: EEG_SAMPLE_RATE_HZ,
        channels,
        timestamps,
        samples,
    }
}

fn aux_stream(kind: SensorKind, device: &str, eeg_rows: usize, rng: &mut StdRng) -> AuxStream {
    let rows = eeg_rows / kind.rate_ratio();
    let channels: Vec<String> = kind.labels().iter().map(|s| s.to_string()).collect();

    let mut samples = Array2::zeros((rows, channels.len()));
    for row in 0..rows {
        let t = row as f64 * kind.rate_ratio() as f64 / EEG_SAMPLE_RATE_HZ;
        for ch in 0..channels.len() {
            let value = match kind {
                // Resting head: gravity on one axis plus small wobble.
                SensorKind::Accelerometer => {
                    let gravity = if ch == 2 { 1.0 } else { 0.0 };
                    gravity + 0.02 * (0.5 * t).sin() + rng.gen_range(-0.005..0.005)
                }
                SensorKind::Gyroscope => 2.0 * (0.3 * t).sin() + rng.gen_range(-0.5..0.5),
                // Cardiac pulse around 1.2 Hz on a large DC level.
                SensorKind::Ppg => {
                    1000.0 + 40.0 * (2.0 * std::f64::consts::PI * 1.2 * t).sin()
                        + rng.gen_range(-5.0..5.0)
                }
            };
            samples[(row, ch)] = value as f32;
        }
    }

    AuxStream {
        kind,
        device: device.to_string(),
        channels,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_equal_seeds() {
        let config = SyntheticConfig::default();
        let a = generate_session(&config);
        let b = generate_session(&config);
        assert_eq!(a.eeg[0].samples, b.eeg[0].samples);
        assert_eq!(a.ppg[0].samples, b.ppg[0].samples);
    }

    #[test]
    fn test_rates_follow_ratios() {
        let config = SyntheticConfig {
            seconds: 5.0,
            ..Default::default()
        };
        let set = generate_session(&config);
        let eeg_rows = set.eeg[0].len();
        assert_eq!(eeg_rows, 5 * 256);
        assert_eq!(set.accelerometer[0].len(), eeg_rows / 5);
        assert_eq!(set.gyroscope[0].len(), eeg_rows / 5);
        assert_eq!(set.ppg[0].len(), eeg_rows / 4);
    }

    #[test]
    fn test_multi_device_session() {
        let config = SyntheticConfig {
            devices: 2,
            ..Default::default()
        };
        let set = generate_session(&config);
        assert_eq!(set.eeg.len(), 2);
        assert_eq!(set.filenames.len(), 2);
        assert_ne!(set.eeg[0].device, set.eeg[1].device);
    }

    #[test]
    fn test_timestamps_strictly_increasing() {
        let set = generate_session(&SyntheticConfig::default());
        let ts = &set.eeg[0].timestamps;
        assert!(ts.windows(2).all(|w| w[0] < w[1]));
    }
}
