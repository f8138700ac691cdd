// src/convert/mod.rs
//! Conversion from captured streams to analysis objects and merged tables

pub mod montage;

pub use montage::{Fiducials, Montage, ELECTRODE_POSITIONS};

use ndarray::Array2;
use tracing::info;

use crate::align::{align_with_order, Attachment, MergedTable, Primary};
use crate::align::merge::selection;
use crate::error::{InputError, Result};
use crate::stream::{CaptureSet, EegStream, SensorKind, EEG_OUTPUT_ORDER};

/// Conversion factor from the device's microvolt samples to volts.
const MICROVOLT_TO_VOLT: f64 = 1e-6;

/// One annotation attached to a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Onset in seconds from recording start.
    pub onset: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Free-text description.
    pub description: String,
}

/// An EEG recording as an analysis object: channel-major data in volts,
/// channel metadata, montage, power-line frequency and annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEeg {
    /// Channel labels in declared output order.
    pub channels: Vec<String>,
    /// Sampling frequency in Hz.
    pub sfreq: f64,
    /// Power-line frequency of the recording region (50 or 60).
    pub line_freq: u32,
    /// Sample data, `(channels, times)`, volts.
    pub data: Array2<f64>,
    /// Electrode montage.
    pub montage: Montage,
    /// Recording annotations.
    pub annotations: Vec<Annotation>,
    /// Per-sample wall-clock timestamps from the source stream.
    pub timestamps: Vec<f64>,
    /// Source device identifier.
    pub device: String,
}

impl RawEeg {
    /// Number of channels.
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples per channel.
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Recording length in seconds at the nominal rate.
    pub fn duration_secs(&self) -> f64 {
        if self.sfreq > 0.0 {
            self.n_times() as f64 / self.sfreq
        } else {
            0.0
        }
    }
}

/// Convert captured EEG streams into analysis objects.
///
/// Channels are reordered from capture order into the declared output order
/// by label, samples are scaled from microvolts to volts, the built-in
/// montage is attached, and one annotation records the device and source
/// file. `filenames` and `fiducials`, when given, must be parallel to
/// `streams`.
pub fn to_raw_eeg(
    streams: &[EegStream],
    line_freq: u32,
    filenames: Option<&[String]>,
    fiducials: Option<&[Fiducials]>,
) -> Result<Vec<RawEeg>> {
    if streams.is_empty() {
        return Err(InputError::EmptyPrimary.into());
    }
    if !matches!(line_freq, 50 | 60) {
        return Err(InputError::InvalidLineFreq { value: line_freq }.into());
    }
    if let Some(names) = filenames {
        if names.len() != streams.len() {
            return Err(InputError::LengthMismatch {
                field: "filenames",
                expected: streams.len(),
                actual: names.len(),
            }
            .into());
        }
    }
    if let Some(fids) = fiducials {
        if fids.len() != streams.len() {
            return Err(InputError::LengthMismatch {
                field: "fiducials",
                expected: streams.len(),
                actual: fids.len(),
            }
            .into());
        }
    }

    let mut raws = Vec::with_capacity(streams.len());
    for (index, stream) in streams.iter().enumerate() {
        if stream.samples.ncols() != stream.channels.len() {
            return Err(InputError::ChannelCountMismatch {
                expected: stream.channels.len(),
                actual: stream.samples.ncols(),
            }
            .into());
        }

        let order = selection(&stream.channels, &EEG_OUTPUT_ORDER)?;
        let n_times = stream.len();
        let mut data = Array2::zeros((EEG_OUTPUT_ORDER.len(), n_times));
        for (row, &src) in order.iter().enumerate() {
            for t in 0..n_times {
                data[(row, t)] = f64::from(stream.samples[(t, src)]) * MICROVOLT_TO_VOLT;
            }
        }

        let channels: Vec<String> = EEG_OUTPUT_ORDER.iter().map(|s| s.to_string()).collect();
        let description = match filenames {
            Some(names) => format!("{} {}", stream.device, names[index]),
            None => format!("{} ", stream.device),
        };
        info!(recording = index, info = %description, "converted recording");

        raws.push(RawEeg {
            montage: Montage::builtin(
                &channels,
                fiducials.map(|f| f[index]).unwrap_or_default(),
            ),
            channels,
            sfreq: stream.nominal_srate,
            line_freq,
            data,
            annotations: vec![Annotation {
                onset: 0.0,
                duration: 0.0,
                description,
            }],
            timestamps: stream.timestamps.clone(),
            device: stream.device.clone(),
        });
    }
    Ok(raws)
}

/// Build one merged table per recording, attaching the auxiliary streams of
/// each requested kind.
///
/// `raws` must be parallel to the capture set's EEG streams, and the set
/// must hold one stream of every requested kind per recording. Values in
/// the tables are volts for EEG columns and raw sensor units for auxiliary
/// columns.
pub fn to_tables(
    raws: &[RawEeg],
    set: &CaptureSet,
    kinds: &[SensorKind],
) -> Result<Vec<MergedTable>> {
    if raws.is_empty() {
        return Err(InputError::EmptyPrimary.into());
    }
    for kind in kinds {
        let available = set.aux(*kind).len();
        if available < raws.len() {
            return Err(InputError::LengthMismatch {
                field: kind.stream_type(),
                expected: raws.len(),
                actual: available,
            }
            .into());
        }
    }

    let mut tables = Vec::with_capacity(raws.len());
    for (index, raw) in raws.iter().enumerate() {
        if raw.timestamps.len() != raw.n_times() {
            return Err(InputError::LengthMismatch {
                field: "timestamps",
                expected: raw.n_times(),
                actual: raw.timestamps.len(),
            }
            .into());
        }

        let primary = Primary {
            timestamps: raw.timestamps.clone(),
            labels: raw.channels.clone(),
            data: raw.data.t().to_owned(),
        };
        let attachments: Vec<Attachment<'_>> = kinds
            .iter()
            .map(|kind| Attachment::nominal(&set.aux(*kind)[index]))
            .collect();

        let order: Vec<&str> = raw.channels.iter().map(String::as_str).collect();
        tables.push(align_with_order(&primary, &order, &attachments)?);
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{generate_session, SyntheticConfig};
    use crate::error::EegError;

    fn session() -> CaptureSet {
        generate_session(&SyntheticConfig {
            seconds: 1.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_to_raw_eeg_reorders_and_scales() {
        let set = session();
        let raws = to_raw_eeg(&set.eeg, 50, Some(&set.filenames), None).unwrap();
        let raw = &raws[0];

        assert_eq!(raw.channels, vec!["AF7", "AF8", "TP9", "TP10"]);
        assert_eq!(raw.n_channels(), 4);
        assert_eq!(raw.n_times(), set.eeg[0].len());

        // AF7 is capture column 1; output row 0.
        let expected = f64::from(set.eeg[0].samples[(0, 1)]) * 1e-6;
        assert!((raw.data[(0, 0)] - expected).abs() < 1e-15);
    }

    #[test]
    fn test_invalid_line_freq_rejected() {
        let set = session();
        let err = to_raw_eeg(&set.eeg, 55, None, None).unwrap_err();
        assert!(matches!(
            err,
            EegError::Input(InputError::InvalidLineFreq { value: 55 })
        ));
    }

    #[test]
    fn test_empty_stream_list_rejected() {
        let err = to_raw_eeg(&[], 50, None, None).unwrap_err();
        assert!(matches!(err, EegError::Input(InputError::EmptyPrimary)));
    }

    #[test]
    fn test_filenames_length_checked() {
        let set = session();
        let err = to_raw_eeg(&set.eeg, 50, Some(&[]), None).unwrap_err();
        assert!(matches!(
            err,
            EegError::Input(InputError::LengthMismatch { field: "filenames", .. })
        ));
    }

    #[test]
    fn test_annotation_names_device_and_file() {
        let set = session();
        let raws = to_raw_eeg(&set.eeg, 60, Some(&set.filenames), None).unwrap();
        let description = &raws[0].annotations[0].description;
        assert!(description.contains("Muse-SIM0"));
        assert!(description.contains("synthetic.xdf"));
    }

    #[test]
    fn test_to_tables_attaches_requested_kinds() {
        let set = session();
        let raws = to_raw_eeg(&set.eeg, 50, None, None).unwrap();
        let tables = to_tables(
            &raws,
            &set,
            &[SensorKind::Accelerometer, SensorKind::Ppg],
        )
        .unwrap();

        let table = &tables[0];
        assert_eq!(table.n_rows(), raws[0].n_times());
        assert_eq!(
            table.column_names(),
            vec![
                "timestamp", "AF7", "AF8", "TP9", "TP10", "X_acc", "Y_acc", "Z_acc", "PPG1",
                "PPG2", "PPG3"
            ]
        );
    }

    #[test]
    fn test_to_tables_primary_only() {
        let set = session();
        let raws = to_raw_eeg(&set.eeg, 50, None, None).unwrap();
        let tables = to_tables(&raws, &set, &[]).unwrap();
        assert_eq!(
            tables[0].column_names(),
            vec!["timestamp", "AF7", "AF8", "TP9", "TP10"]
        );
        assert!(!tables[0].has_aux());
    }

    #[test]
    fn test_to_tables_missing_aux_stream_rejected() {
        let set = generate_session(&SyntheticConfig {
            seconds: 1.0,
            optical: false,
            ..Default::default()
        });
        let raws = to_raw_eeg(&set.eeg, 50, None, None).unwrap();
        let err = to_tables(&raws, &set, &[SensorKind::Ppg]).unwrap_err();
        assert!(matches!(
            err,
            EegError::Input(InputError::LengthMismatch { field: "PPG", .. })
        ));
    }

    #[test]
    fn test_hold_pattern_from_session() {
        let set = session();
        let raws = to_raw_eeg(&set.eeg, 50, None, None).unwrap();
        let tables = to_tables(&raws, &set, &[SensorKind::Accelerometer]).unwrap();
        let x = tables[0].aux_column("X_acc").unwrap();

        // Ratio 5: rows 0..5 hold record 0, rows 5..10 hold record 1.
        let first = f64::from(set.accelerometer[0].samples[(0, 0)]);
        let second = f64::from(set.accelerometer[0].samples[(1, 0)]);
        assert!(x[..5].iter().all(|v| *v == Some(first)));
        assert!(x[5..10].iter().all(|v| *v == Some(second)));
    }
}
