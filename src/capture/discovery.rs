// src/capture/discovery.rs
//! Capture file discovery and stream classification
//!
//! A capture file multiplexes one stream per sensor per device. Streams are
//! classified by their header `type` field and grouped by device (the
//! leading characters of the stream name), preserving device order of first
//! appearance so a multi-headband session imports deterministically.

use std::path::Path;

use glob::glob;
use ndarray::Array2;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::capture::xdf::{read_xdf, ParsedStream};
use crate::error::{EegError, Result};
use crate::stream::{
    AuxStream, CaptureSet, EegStream, SensorKind, DEVICE_NAME_LEN, EEG_CAPTURE_ORDER,
};

/// Import a single `.xdf` capture file.
///
/// Fails when the path does not carry the `.xdf` extension or the file does
/// not exist; container-level failures surface as capture errors.
pub fn read_capture<P: AsRef<Path>>(path: P) -> Result<CaptureSet> {
    let path = path.as_ref();
    let display_path = path.display().to_string();

    let is_xdf = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("xdf"))
        .unwrap_or(false);
    if !is_xdf {
        return Err(EegError::capture(display_path, "file type must be XDF"));
    }
    if !path.exists() {
        return Err(EegError::capture(display_path, "XDF file not found"));
    }

    let streams = read_xdf(path).map_err(|reason| EegError::capture(&display_path, reason))?;
    let set = classify(streams, &basename(path));
    info!(
        file = %display_path,
        eeg = set.eeg.len(),
        motion = set.accelerometer.len(),
        rotation = set.gyroscope.len(),
        optical = set.ppg.len(),
        "imported capture"
    );
    Ok(set)
}

/// Import every `.xdf` capture file in a directory, sorted by file name.
///
/// Files are decoded in parallel; stream order within the result follows
/// the sorted file order. Fails when the directory holds no capture files.
pub fn read_capture_dir<P: AsRef<Path>>(dir: P) -> Result<CaptureSet> {
    let dir = dir.as_ref();
    let pattern = dir.join("*.xdf");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| EegError::capture(dir.display().to_string(), "non-UTF-8 directory path"))?;

    let mut files: Vec<_> = glob(pattern)
        .map_err(|e| EegError::capture(pattern, e.to_string()))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "unreadable directory entry skipped");
                None
            }
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(EegError::capture(
            dir.display().to_string(),
            "no XDF files found in directory",
        ));
    }

    let sets: Vec<Result<CaptureSet>> = files.par_iter().map(read_capture).collect();

    let mut merged = CaptureSet::default();
    for set in sets {
        merged.extend(set?);
    }
    Ok(merged)
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Group parsed streams by device and sort them into a [`CaptureSet`].
pub(crate) fn classify(streams: Vec<ParsedStream>, filename: &str) -> CaptureSet {
    let mut devices: Vec<String> = Vec::new();
    for stream in &streams {
        let device = device_of(&stream.name);
        if !devices.contains(&device) {
            devices.push(device);
        }
    }

    let mut set = CaptureSet::default();
    for device in &devices {
        for stream in streams.iter().filter(|s| device_of(&s.name) == *device) {
            if stream.stream_type.contains("EEG") {
                set.eeg.push(to_eeg_stream(stream, device));
                set.filenames.push(filename.to_string());
            } else if let Some(kind) = aux_kind(&stream.stream_type) {
                set.aux_mut(kind).push(to_aux_stream(stream, kind, device));
            } else {
                warn!(
                    stream = %stream.name,
                    kind = %stream.stream_type,
                    "stream of unrecognized type ignored"
                );
            }
        }
    }
    set
}

fn aux_kind(stream_type: &str) -> Option<SensorKind> {
    SensorKind::MERGE_ORDER
        .into_iter()
        .find(|kind| stream_type.contains(kind.stream_type()))
}

fn device_of(name: &str) -> String {
    name.chars().take(DEVICE_NAME_LEN).collect()
}

fn to_eeg_stream(stream: &ParsedStream, device: &str) -> EegStream {
    let channels = if stream.labels.len() == stream.channel_count {
        stream.labels.clone()
    } else if stream.channel_count == EEG_CAPTURE_ORDER.len() {
        warn!(stream = %stream.name, "header labels unusable, assuming device capture order");
        EEG_CAPTURE_ORDER.iter().map(|s| s.to_string()).collect()
    } else {
        (0..stream.channel_count).map(|i| format!("ch{}", i)).collect()
    };

    EegStream {
        name: stream.name.clone(),
        device: device.to_string(),
        nominal_srate: stream.nominal_srate,
        channels,
        timestamps: monotone(&stream.timestamps, &stream.name),
        samples: to_matrix(stream),
    }
}

fn to_aux_stream(stream: &ParsedStream, kind: SensorKind, device: &str) -> AuxStream {
    let canonical = kind.labels();
    let channels = if stream.channel_count == canonical.len() {
        canonical.iter().map(|s| s.to_string()).collect()
    } else if stream.labels.len() == stream.channel_count {
        stream.labels.clone()
    } else {
        (0..stream.channel_count).map(|i| format!("ch{}", i)).collect()
    };

    AuxStream {
        kind,
        device: device.to_string(),
        channels,
        samples: to_matrix(stream),
    }
}

fn to_matrix(stream: &ParsedStream) -> Array2<f32> {
    let rows = stream.n_records();
    Array2::from_shape_vec((rows, stream.channel_count), stream.samples.clone())
        .unwrap_or_else(|_| Array2::zeros((0, stream.channel_count)))
}

/// Clamp any backwards timestamp to its predecessor so downstream code can
/// rely on a non-decreasing index.
fn monotone(timestamps: &[f64], name: &str) -> Vec<f64> {
    let mut out = Vec::with_capacity(timestamps.len());
    let mut clamped = 0usize;
    for &ts in timestamps {
        let ts = match out.last() {
            Some(&prev) if ts < prev => {
                clamped += 1;
                prev
            }
            _ => ts,
        };
        out.push(ts);
    }
    if clamped > 0 {
        warn!(stream = %name, clamped, "non-monotone timestamps clamped");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::xdf::parse_xdf;
    use crate::capture::xdf::tests::XdfBuilder;

    fn two_device_buffer() -> Vec<u8> {
        XdfBuilder::new()
            .file_header()
            .stream_header(1, "Muse-C3F1 EEG", "EEG", &["TP9", "AF7", "AF8", "TP10"], 256.0)
            .stream_header(2, "Muse-C3F1 Accelerometer", "Accelerometer", &["X", "Y", "Z"], 52.0)
            .stream_header(3, "Muse-77A2 EEG", "EEG", &["TP9", "AF7", "AF8", "TP10"], 256.0)
            .samples(1, &[(Some(10.0), vec![1.0, 2.0, 3.0, 4.0])])
            .samples(3, &[(Some(10.0), vec![5.0, 6.0, 7.0, 8.0])])
            .samples(2, &[(Some(10.0), vec![0.1, 0.2, 0.3])])
            .build()
    }

    #[test]
    fn test_classify_groups_by_device() {
        let streams = parse_xdf(&two_device_buffer()).unwrap();
        let set = classify(streams, "session.xdf");

        assert_eq!(set.eeg.len(), 2);
        assert_eq!(set.eeg[0].device, "Muse-C3F1");
        assert_eq!(set.eeg[1].device, "Muse-77A2");
        assert_eq!(set.filenames, vec!["session.xdf", "session.xdf"]);

        assert_eq!(set.accelerometer.len(), 1);
        assert_eq!(set.accelerometer[0].channels, vec!["X_acc", "Y_acc", "Z_acc"]);
        assert!(set.gyroscope.is_empty());
        assert!(set.ppg.is_empty());
    }

    #[test]
    fn test_read_capture_rejects_wrong_extension() {
        let err = read_capture("recording.csv").unwrap_err();
        assert!(format!("{}", err).contains("XDF"));
    }

    #[test]
    fn test_read_capture_rejects_missing_file() {
        let err = read_capture("/nonexistent/recording.xdf").unwrap_err();
        assert!(format!("{}", err).contains("not found"));
    }

    #[test]
    fn test_monotone_clamps_backwards_jumps() {
        let out = monotone(&[1.0, 2.0, 1.5, 3.0], "s");
        assert_eq!(out, vec![1.0, 2.0, 2.0, 3.0]);
    }
}
