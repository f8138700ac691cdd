// src/stream/types.rs
//! Core types for captured sensor streams
//!
//! The headband multiplexes one EEG stream per device with up to three
//! auxiliary streams (accelerometer, gyroscope, PPG), each at its own native
//! sample rate. The EEG stream is the primary sequence: its row position
//! defines the dense index everything else is aligned onto.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// EEG channel labels in capture order, as emitted by the device.
pub const EEG_CAPTURE_ORDER: [&str; 4] = ["TP9", "AF7", "AF8", "TP10"];

/// EEG channel labels in the declared output order used by merged tables
/// and analysis objects.
pub const EEG_OUTPUT_ORDER: [&str; 4] = ["AF7", "AF8", "TP9", "TP10"];

/// Nominal EEG sample rate of the device in Hz.
pub const EEG_SAMPLE_RATE_HZ: f64 = 256.0;

/// Number of leading stream-name characters identifying a device
/// (e.g. `Muse-C3F1`).
pub const DEVICE_NAME_LEN: usize = 9;

/// Auxiliary sensor kinds, in their fixed merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Motion (3-axis accelerometer, nominally 52 Hz).
    Accelerometer,
    /// Rotation (3-axis gyroscope, nominally 52 Hz).
    Gyroscope,
    /// Optical pulse (3 PPG photodiodes, nominally 64 Hz).
    Ppg,
}

impl SensorKind {
    /// All kinds in merge order: motion, rotation, optical.
    pub const MERGE_ORDER: [SensorKind; 3] = [
        SensorKind::Accelerometer,
        SensorKind::Gyroscope,
        SensorKind::Ppg,
    ];

    /// Canonical output column labels for this kind.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            SensorKind::Accelerometer => &["X_acc", "Y_acc", "Z_acc"],
            SensorKind::Gyroscope => &["X_gyr", "Y_gyr", "Z_gyr"],
            SensorKind::Ppg => &["PPG1", "PPG2", "PPG3"],
        }
    }

    /// Nominal rate ratio: primary EEG rows per one record of this kind.
    ///
    /// These are constants derived from the nominal hardware rates
    /// (256 Hz EEG against 52 Hz motion/rotation and 64 Hz optical), not
    /// measured from captured timestamps. If a capture's actual rates drift
    /// from nominal, alignment accumulates skew silently.
    pub fn rate_ratio(self) -> usize {
        match self {
            SensorKind::Accelerometer => 5,
            SensorKind::Gyroscope => 5,
            SensorKind::Ppg => 4,
        }
    }

    /// The `type` field value this kind carries in capture stream headers.
    pub fn stream_type(self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "Accelerometer",
            SensorKind::Gyroscope => "Gyroscope",
            SensorKind::Ppg => "PPG",
        }
    }
}

/// One captured EEG stream: the primary sample sequence.
///
/// `samples` is row-major `(records, channels)` in microvolts; `timestamps`
/// holds one wall-clock instant (epoch seconds) per record and is strictly
/// non-decreasing as produced by the capture reader.
#[derive(Debug, Clone, PartialEq)]
pub struct EegStream {
    /// Full stream name from the capture header (e.g. `Muse-C3F1 EEG`).
    pub name: String,
    /// Device identifier: the leading [`DEVICE_NAME_LEN`] name characters.
    pub device: String,
    /// Nominal sample rate from the stream header.
    pub nominal_srate: f64,
    /// Channel labels in capture order.
    pub channels: Vec<String>,
    /// Per-record wall-clock timestamps, epoch seconds.
    pub timestamps: Vec<f64>,
    /// Sample matrix, `(records, channels)`, microvolts.
    pub samples: Array2<f32>,
}

impl EegStream {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.samples.nrows()
    }

    /// Whether the stream has no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One captured auxiliary stream: a secondary sample sequence.
///
/// No per-record timestamp is carried; alignment onto the primary sequence
/// uses the kind's nominal rate ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxStream {
    /// Which sensor produced this stream.
    pub kind: SensorKind,
    /// Device identifier, matching the EEG stream it accompanies.
    pub device: String,
    /// Channel labels in capture order.
    pub channels: Vec<String>,
    /// Sample matrix, `(records, channels)`.
    pub samples: Array2<f32>,
}

impl AuxStream {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.samples.nrows()
    }

    /// Whether the stream has no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything imported from one capture file or directory: EEG streams with
/// their source file names, plus per-kind auxiliary streams, all ordered by
/// device first appearance.
#[derive(Debug, Clone, Default)]
pub struct CaptureSet {
    /// Primary EEG streams, one per device per file.
    pub eeg: Vec<EegStream>,
    /// Motion streams.
    pub accelerometer: Vec<AuxStream>,
    /// Rotation streams.
    pub gyroscope: Vec<AuxStream>,
    /// Optical pulse streams.
    pub ppg: Vec<AuxStream>,
    /// Source capture file name for each EEG stream.
    pub filenames: Vec<String>,
}

impl CaptureSet {
    /// Auxiliary streams of `kind`.
    pub fn aux(&self, kind: SensorKind) -> &[AuxStream] {
        match kind {
            SensorKind::Accelerometer => &self.accelerometer,
            SensorKind::Gyroscope => &self.gyroscope,
            SensorKind::Ppg => &self.ppg,
        }
    }

    /// Mutable auxiliary streams of `kind`.
    pub fn aux_mut(&mut self, kind: SensorKind) -> &mut Vec<AuxStream> {
        match kind {
            SensorKind::Accelerometer => &mut self.accelerometer,
            SensorKind::Gyroscope => &mut self.gyroscope,
            SensorKind::Ppg => &mut self.ppg,
        }
    }

    /// Merge another set's streams into this one, preserving order.
    pub fn extend(&mut self, other: CaptureSet) {
        self.eeg.extend(other.eeg);
        self.accelerometer.extend(other.accelerometer);
        self.gyroscope.extend(other.gyroscope);
        self.ppg.extend(other.ppg);
        self.filenames.extend(other.filenames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_merge_order_is_motion_rotation_optical() {
        assert_eq!(
            SensorKind::MERGE_ORDER,
            [
                SensorKind::Accelerometer,
                SensorKind::Gyroscope,
                SensorKind::Ppg
            ]
        );
    }

    #[test]
    fn test_rate_ratios_match_nominal_hardware_rates() {
        assert_eq!(SensorKind::Accelerometer.rate_ratio(), 5);
        assert_eq!(SensorKind::Gyroscope.rate_ratio(), 5);
        assert_eq!(SensorKind::Ppg.rate_ratio(), 4);
    }

    #[test]
    fn test_labels_have_three_axes() {
        for kind in SensorKind::MERGE_ORDER {
            assert_eq!(kind.labels().len(), 3);
        }
    }

    #[test]
    fn test_stream_len() {
        let stream = EegStream {
            name: "Muse-C3F1 EEG".to_string(),
            device: "Muse-C3F1".to_string(),
            nominal_srate: EEG_SAMPLE_RATE_HZ,
            channels: EEG_CAPTURE_ORDER.iter().map(|s| s.to_string()).collect(),
            timestamps: vec![0.0, 1.0],
            samples: arr2(&[[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]]),
        };
        assert_eq!(stream.len(), 2);
        assert!(!stream.is_empty());
    }

    #[test]
    fn test_capture_set_aux_accessors() {
        let mut set = CaptureSet::default();
        set.aux_mut(SensorKind::Ppg).push(AuxStream {
            kind: SensorKind::Ppg,
            device: "Muse-C3F1".to_string(),
            channels: SensorKind::Ppg.labels().iter().map(|s| s.to_string()).collect(),
            samples: Array2::zeros((0, 3)),
        });
        assert_eq!(set.aux(SensorKind::Ppg).len(), 1);
        assert!(set.aux(SensorKind::Accelerometer).is_empty());
    }
}
