// src/dataset/import.rs
//! Dataset import
//!
//! Reads a recording back from the dataset tree. The data file is EDF+, a
//! fixed-width ASCII header followed by 16-bit little-endian sample
//! records; the reader here decodes exactly that layout, including the
//! annotations signal, and restores an analysis object.

use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use tracing::warn;

use crate::convert::{Annotation, Fiducials, Montage, RawEeg};
use crate::dataset::path::DatasetPath;
use crate::error::{EegError, Result};

const MICROVOLT_TO_VOLT: f64 = 1e-6;
const ANNOTATION_LABEL: &str = "EDF Annotations";

/// Import one recording from the dataset tree.
///
/// Restores channel names, sampling rate, sample data, annotations and the
/// built-in montage. The power-line frequency comes from the EEG sidecar
/// when present, defaulting to 50 Hz with a warning otherwise.
pub fn import_dataset(path: &DatasetPath) -> Result<RawEeg> {
    let data_path = path.data_path()?;
    let display = data_path.display().to_string();
    if !data_path.exists() {
        return Err(EegError::dataset("import", display, "recording not found"));
    }

    let edf = read_edf(&data_path)?;
    let line_freq = sidecar_line_freq(path).unwrap_or_else(|| {
        warn!("EEG sidecar missing or unreadable, assuming 50 Hz mains");
        50
    });

    let sfreq = if edf.record_duration > 0.0 {
        edf.samples_per_record as f64 / edf.record_duration
    } else {
        edf.samples_per_record as f64
    };

    let channels: Vec<String> = edf
        .labels
        .iter()
        .map(|l| l.strip_prefix("EEG ").unwrap_or(l).to_string())
        .collect();

    let n_times = edf.data.first().map(Vec::len).unwrap_or(0);
    let mut data = ndarray::Array2::zeros((channels.len(), n_times));
    for (ch, samples) in edf.data.iter().enumerate() {
        for (t, &value) in samples.iter().enumerate() {
            data[(ch, t)] = value * MICROVOLT_TO_VOLT;
        }
    }

    let timestamps = (0..n_times)
        .map(|t| edf.start_epoch + t as f64 / sfreq)
        .collect();

    let device = edf
        .annotations
        .first()
        .map(|a| {
            a.description
                .chars()
                .take(crate::stream::DEVICE_NAME_LEN)
                .collect()
        })
        .unwrap_or_default();

    Ok(RawEeg {
        montage: Montage::builtin(&channels, Fiducials::default()),
        channels,
        sfreq,
        line_freq,
        data,
        annotations: edf.annotations,
        timestamps,
        device,
    })
}

fn sidecar_line_freq(path: &DatasetPath) -> Option<u32> {
    let sidecar_path = path.sibling("eeg", "json").ok()?;
    let text = fs::read_to_string(sidecar_path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&text).ok()?;
    value["PowerLineFrequency"].as_u64().map(|v| v as u32)
}

/// Decoded contents of one EDF+ file, physical values in the file's units.
struct EdfFile {
    start_epoch: f64,
    record_duration: f64,
    samples_per_record: usize,
    labels: Vec<String>,
    data: Vec<Vec<f64>>,
    annotations: Vec<Annotation>,
}

struct SignalHeader {
    label: String,
    physical_min: f64,
    physical_max: f64,
    digital_min: f64,
    digital_max: f64,
    samples_per_record: usize,
}

impl SignalHeader {
    fn is_annotation(&self) -> bool {
        self.label == ANNOTATION_LABEL
    }

    fn to_physical(&self, digital: i16) -> f64 {
        let digital_span = self.digital_max - self.digital_min;
        if digital_span == 0.0 {
            return 0.0;
        }
        let gain = (self.physical_max - self.physical_min) / digital_span;
        (f64::from(digital) - self.digital_min) * gain + self.physical_min
    }
}

fn read_edf(path: &Path) -> Result<EdfFile> {
    let display = path.display().to_string();
    let bytes = fs::read(path)?;
    parse_edf(&bytes).map_err(|reason| EegError::dataset("import", display, reason))
}

fn parse_edf(bytes: &[u8]) -> std::result::Result<EdfFile, String> {
    if bytes.len() < 256 {
        return Err("file shorter than the EDF header".to_string());
    }

    let field = |start: usize, len: usize| -> std::result::Result<&str, String> {
        bytes
            .get(start..start + len)
            .and_then(|b| std::str::from_utf8(b).ok())
            .map(str::trim)
            .ok_or_else(|| "non-ASCII header field".to_string())
    };

    let start_date = field(168, 8)?.to_string();
    let start_time = field(176, 8)?.to_string();
    let n_records: i64 = field(236, 8)?
        .parse()
        .map_err(|_| "unparsable record count".to_string())?;
    let record_duration: f64 = field(244, 8)?
        .parse()
        .map_err(|_| "unparsable record duration".to_string())?;
    let n_signals: usize = field(252, 4)?
        .parse()
        .map_err(|_| "unparsable signal count".to_string())?;

    let header_len = 256 + 256 * n_signals;
    if bytes.len() < header_len {
        return Err("file shorter than its signal headers".to_string());
    }

    let signal_field = |block: usize, signal: usize, width: usize| {
        let block_start = 256 + block * n_signals * width;
        field(block_start + signal * width, width)
    };

    let mut signals = Vec::with_capacity(n_signals);
    for s in 0..n_signals {
        // Header blocks in order: label(16), transducer(80), dimension(8),
        // physical min/max(8/8), digital min/max(8/8), prefilter(80),
        // samples per record(8).
        let label = signal_field(0, s, 16)?.to_string();
        let physical_min: f64 = parse_num(signal_field_at(bytes, n_signals, s, 16 + 80 + 8, 8)?)?;
        let physical_max: f64 =
            parse_num(signal_field_at(bytes, n_signals, s, 16 + 80 + 8 + 8, 8)?)?;
        let digital_min: f64 =
            parse_num(signal_field_at(bytes, n_signals, s, 16 + 80 + 8 + 16, 8)?)?;
        let digital_max: f64 =
            parse_num(signal_field_at(bytes, n_signals, s, 16 + 80 + 8 + 24, 8)?)?;
        let samples_per_record: usize =
            parse_num(signal_field_at(bytes, n_signals, s, 16 + 80 + 8 + 32 + 80, 8)?)?;
        signals.push(SignalHeader {
            label,
            physical_min,
            physical_max,
            digital_min,
            digital_max,
            samples_per_record,
        });
    }

    let record_width: usize = signals.iter().map(|s| s.samples_per_record * 2).sum();
    let available_records = if record_width == 0 {
        0
    } else {
        (bytes.len() - header_len) / record_width
    };
    let n_records = if n_records < 0 {
        available_records
    } else {
        (n_records as usize).min(available_records)
    };

    let data_signals: Vec<usize> = (0..n_signals)
        .filter(|&s| !signals[s].is_annotation())
        .collect();
    let mut data: Vec<Vec<f64>> = data_signals
        .iter()
        .map(|&s| Vec::with_capacity(n_records * signals[s].samples_per_record))
        .collect();
    let mut annotation_bytes: Vec<u8> = Vec::new();

    // Map signal index -> position among data (non-annotation) signals.
    let data_position: Vec<Option<usize>> = {
        let mut next = 0usize;
        signals
            .iter()
            .map(|signal| {
                if signal.is_annotation() {
                    None
                } else {
                    next += 1;
                    Some(next - 1)
                }
            })
            .collect()
    };

    let mut offset = header_len;
    for _ in 0..n_records {
        for (s, signal) in signals.iter().enumerate() {
            let byte_len = signal.samples_per_record * 2;
            let chunk = &bytes[offset..offset + byte_len];
            match data_position[s] {
                None => annotation_bytes.extend_from_slice(chunk),
                Some(position) => {
                    let out = &mut data[position];
                    for pair in chunk.chunks_exact(2) {
                        let digital = i16::from_le_bytes([pair[0], pair[1]]);
                        out.push(signal.to_physical(digital));
                    }
                }
            }
            offset += byte_len;
        }
    }

    let samples_per_record = data_signals
        .first()
        .map(|&s| signals[s].samples_per_record)
        .unwrap_or(0);

    Ok(EdfFile {
        start_epoch: start_epoch(&start_date, &start_time)?,
        record_duration,
        samples_per_record,
        labels: data_signals
            .iter()
            .map(|&s| signals[s].label.clone())
            .collect(),
        data,
        annotations: parse_annotations(&annotation_bytes),
    })
}

fn signal_field_at(
    bytes: &[u8],
    n_signals: usize,
    signal: usize,
    block_offset: usize,
    width: usize,
) -> std::result::Result<&str, String> {
    let start = 256 + block_offset * n_signals + signal * width;
    bytes
        .get(start..start + width)
        .and_then(|b| std::str::from_utf8(b).ok())
        .map(str::trim)
        .ok_or_else(|| "non-ASCII signal header field".to_string())
}

fn parse_num<T: std::str::FromStr>(text: &str) -> std::result::Result<T, String> {
    text.parse()
        .map_err(|_| format!("unparsable header number '{}'", text))
}

/// `dd.mm.yy` + `hh.mm.ss` to local epoch seconds. Two-digit years below 85
/// land in the 2000s per the format's convention.
fn start_epoch(date: &str, time: &str) -> std::result::Result<f64, String> {
    let date_parts: Vec<&str> = date.split('.').collect();
    let time_parts: Vec<&str> = time.split('.').collect();
    if date_parts.len() != 3 || time_parts.len() != 3 {
        return Err(format!("unparsable start date/time '{} {}'", date, time));
    }

    let day: u32 = parse_num(date_parts[0])?;
    let month: u32 = parse_num(date_parts[1])?;
    let yy: i32 = parse_num(date_parts[2])?;
    let year = if yy < 85 { 2000 + yy } else { 1900 + yy };

    let hour: u32 = parse_num(time_parts[0])?;
    let minute: u32 = parse_num(time_parts[1])?;
    let second: u32 = parse_num(time_parts[2])?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| {
            NaiveTime::from_hms_opt(hour, minute, second).map(|t| NaiveDateTime::new(d, t))
        })
        .ok_or_else(|| format!("invalid start date/time '{} {}'", date, time))?;

    let epoch = match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt.timestamp(),
        chrono::LocalResult::Ambiguous(dt, _) => dt.timestamp(),
        chrono::LocalResult::None => naive.and_utc().timestamp(),
    };
    Ok(epoch as f64)
}

/// Parse the annotations signal's time-stamped annotation lists. Each list
/// is `onset[\x15duration]\x14text\x14...\x00`; timekeeping entries with no
/// text are skipped.
fn parse_annotations(bytes: &[u8]) -> Vec<Annotation> {
    let mut annotations = Vec::new();
    for tal in bytes.split(|&b| b == 0x00) {
        if tal.is_empty() {
            continue;
        }
        let Ok(text) = std::str::from_utf8(tal) else {
            continue;
        };
        let mut fields = text.split('\u{14}');
        let Some(timing) = fields.next() else {
            continue;
        };
        let mut timing_parts = timing.split('\u{15}');
        let Some(onset) = timing_parts.next().and_then(|t| t.parse::<f64>().ok()) else {
            continue;
        };
        let duration = timing_parts
            .next()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        for description in fields.filter(|t| !t.is_empty()) {
            annotations.push(Annotation {
                onset,
                duration,
                description: description.to_string(),
            });
        }
    }
    annotations
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal single-signal EDF builder for reader tests.
    fn build_edf(label: &str, records: &[&[i16]], annotations: &[u8]) -> Vec<u8> {
        let has_annotations = !annotations.is_empty();
        let n_signals = if has_annotations { 2 } else { 1 };
        let spr = records.first().map(|r| r.len()).unwrap_or(0);
        let ann_spr = annotations.len() / 2 / records.len().max(1);

        let mut header = String::new();
        let pad = |text: &str, width: usize| format!("{:<width$}", text, width = width);
        header.push_str(&pad("0", 8));
        header.push_str(&pad("patient", 80));
        header.push_str(&pad("recording", 80));
        header.push_str(&pad("02.01.24", 8));
        header.push_str(&pad("10.30.00", 8));
        header.push_str(&pad(&(256 + 256 * n_signals).to_string(), 8));
        header.push_str(&pad("EDF+C", 44));
        header.push_str(&pad(&records.len().to_string(), 8));
        header.push_str(&pad("1", 8));
        header.push_str(&pad(&n_signals.to_string(), 4));

        let mut block = |texts: &[&str], width: usize| {
            for text in texts {
                header.push_str(&pad(text, width));
            }
        };
        let labels: Vec<&str> = if has_annotations {
            vec![label, ANNOTATION_LABEL]
        } else {
            vec![label]
        };
        block(&labels, 16);
        block(&vec!["transducer"; n_signals], 80);
        block(&vec!["uV"; n_signals], 8);
        let ann = |v: &str, a: &str| -> Vec<String> {
            if has_annotations {
                vec![v.to_string(), a.to_string()]
            } else {
                vec![v.to_string()]
            }
        };
        for (value, a) in [
            ("-1000", "-1"),
            ("1000", "1"),
            ("-32768", "-32768"),
            ("32767", "32767"),
        ] {
            let texts = ann(value, a);
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            block(&refs, 8);
        }
        block(&vec![""; n_signals], 80);
        let spr_texts = ann(&spr.to_string(), &ann_spr.to_string());
        let spr_refs: Vec<&str> = spr_texts.iter().map(String::as_str).collect();
        block(&spr_refs, 8);
        block(&vec![""; n_signals], 32);

        let mut bytes = header.into_bytes();
        let ann_chunk = annotations.len() / records.len().max(1);
        for (i, record) in records.iter().enumerate() {
            for &sample in *record {
                bytes.extend_from_slice(&sample.to_le_bytes());
            }
            if has_annotations {
                bytes.extend_from_slice(&annotations[i * ann_chunk..(i + 1) * ann_chunk]);
            }
        }
        bytes
    }

    #[test]
    fn test_physical_scaling() {
        let bytes = build_edf("AF7", &[&[0, 32767, -32768]], &[]);
        let edf = parse_edf(&bytes).unwrap();
        assert_eq!(edf.labels, vec!["AF7"]);
        let samples = &edf.data[0];
        // Digital 0 sits just above mid-range for an asymmetric span.
        assert!((samples[1] - 1000.0).abs() < 0.05);
        assert!((samples[2] + 1000.0).abs() < 0.05);
        assert!(samples[0].abs() < 0.05);
    }

    #[test]
    fn test_start_epoch_century_rule() {
        let recent = start_epoch("02.01.24", "10.30.00").unwrap();
        let old = start_epoch("02.01.99", "10.30.00").unwrap();
        assert!(recent > old);
    }

    #[test]
    fn test_annotations_parsed_and_timekeeping_skipped() {
        let mut tal = Vec::new();
        tal.extend_from_slice("+0\u{14}\u{14}\u{0}".as_bytes()); // timekeeping, no text
        tal.extend_from_slice("+1.5\u{15}0.5\u{14}eyes closed\u{14}\u{0}".as_bytes());
        if tal.len() % 2 == 1 {
            tal.push(0);
        }
        let bytes = build_edf("AF7", &[&[0, 0]], &tal);
        let edf = parse_edf(&bytes).unwrap();
        assert_eq!(edf.annotations.len(), 1);
        assert_eq!(edf.annotations[0].onset, 1.5);
        assert_eq!(edf.annotations[0].duration, 0.5);
        assert_eq!(edf.annotations[0].description, "eyes closed");
    }

    #[test]
    fn test_truncated_header_rejected() {
        assert!(parse_edf(&[0u8; 100]).is_err());
    }
}
