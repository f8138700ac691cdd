// src/dataset/export.rs
//! Dataset export
//!
//! Writes one recording into the dataset tree: the EDF+ data file, a
//! channels TSV, an EEG JSON sidecar, the dataset description on first use
//! of a root, and the participants table.

use std::fs;
use std::path::{Path, PathBuf};

use edfplus::{EdfWriter, SignalParam};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::convert::RawEeg;
use crate::dataset::path::DatasetPath;
use crate::error::{EegError, Result};

/// Conversion back from the analysis object's volts to the microvolts the
/// data file stores.
const VOLT_TO_MICROVOLT: f64 = 1e6;

/// Physical range of a stored EEG channel in microvolts.
const PHYSICAL_RANGE_UV: f64 = 1000.0;

/// One participant row of the dataset's participants table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant label, without the `sub-` prefix.
    pub id: String,
    /// Age in years.
    #[serde(default)]
    pub age: Option<u32>,
    /// Reported sex.
    #[serde(default)]
    pub sex: Option<String>,
    /// Handedness.
    #[serde(default)]
    pub hand: Option<String>,
}

#[derive(Serialize)]
struct DatasetDescription {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "BIDSVersion")]
    bids_version: String,
    #[serde(rename = "DatasetType")]
    dataset_type: String,
}

#[derive(Serialize)]
struct EegSidecar {
    #[serde(rename = "TaskName")]
    task_name: String,
    #[serde(rename = "SamplingFrequency")]
    sampling_frequency: f64,
    #[serde(rename = "PowerLineFrequency")]
    power_line_frequency: u32,
    #[serde(rename = "EEGChannelCount")]
    eeg_channel_count: usize,
    #[serde(rename = "EEGReference")]
    eeg_reference: String,
    #[serde(rename = "RecordingDuration")]
    recording_duration: f64,
    #[serde(rename = "RecordingType")]
    recording_type: String,
}

/// Export one recording into the dataset tree.
///
/// Returns the path of the written data file. Fails when the target file
/// already exists and `overwrite` is not set. A generic dataset
/// description is created on first use of a root, with a warning inviting
/// a real one.
pub fn export_dataset(
    raw: &RawEeg,
    path: &DatasetPath,
    participant: Option<&Participant>,
    overwrite: bool,
) -> Result<PathBuf> {
    let data_path = path.data_path()?;
    let display_path = data_path.display().to_string();

    if data_path.exists() && !overwrite {
        return Err(EegError::dataset(
            "export",
            display_path,
            "recording already exists; pass overwrite to replace it",
        ));
    }

    fs::create_dir_all(path.data_dir()?)?;
    ensure_description(&path.root)?;
    write_edf(raw, path, &data_path)?;
    write_channels_tsv(raw, path)?;
    write_sidecar(raw, path)?;
    if let Some(participant) = participant {
        update_participants(&path.root, participant)?;
    }

    info!(
        recording = %raw.annotations.first().map(|a| a.description.as_str()).unwrap_or(""),
        file = %display_path,
        "exported recording"
    );
    Ok(data_path)
}

fn ensure_description(root: &Path) -> Result<()> {
    let description_path = root.join("dataset_description.json");
    if description_path.exists() {
        return Ok(());
    }
    fs::create_dir_all(root)?;
    warn!(
        path = %description_path.display(),
        "first dataset in this folder; a generic description was created, replace it with a real one"
    );
    let description = DatasetDescription {
        name: "EEG headband recordings".to_string(),
        bids_version: "1.7.0".to_string(),
        dataset_type: "raw".to_string(),
    };
    let json = serde_json::to_string_pretty(&description)
        .map_err(|e| EegError::dataset("export", description_path.display().to_string(), e.to_string()))?;
    fs::write(&description_path, json)?;
    Ok(())
}

fn write_edf(raw: &RawEeg, path: &DatasetPath, data_path: &Path) -> Result<()> {
    let display = data_path.display().to_string();
    let to_dataset = |e| EegError::dataset("export", display.clone(), format!("{}", e));

    if data_path.exists() {
        fs::remove_file(data_path)?;
    }

    let samples_per_record = raw.sfreq.round().max(1.0) as usize;
    let mut writer = EdfWriter::create(data_path).map_err(to_dataset)?;

    let subject = path.subject.clone().unwrap_or_default();
    writer
        .set_patient_info(&subject, "X", "01-JAN-2000", &subject)
        .map_err(to_dataset)?;

    for label in &raw.channels {
        let signal = SignalParam {
            label: label.clone(),
            samples_in_file: 0,
            physical_max: PHYSICAL_RANGE_UV,
            physical_min: -PHYSICAL_RANGE_UV,
            digital_max: 32767,
            digital_min: -32768,
            samples_per_record: samples_per_record as _,
            physical_dimension: "uV".to_string(),
            prefilter: "n/a".to_string(),
            transducer: "Dry electrode".to_string(),
        };
        writer.add_signal(signal).map_err(to_dataset)?;
    }

    for annotation in &raw.annotations {
        let duration = (annotation.duration > 0.0).then_some(annotation.duration);
        writer
            .add_annotation(annotation.onset, duration, &annotation.description)
            .map_err(to_dataset)?;
    }

    let n_times = raw.n_times();
    let n_records = n_times.div_ceil(samples_per_record);
    for record in 0..n_records {
        let start = record * samples_per_record;
        let end = (start + samples_per_record).min(n_times);

        let mut record_samples = Vec::with_capacity(raw.n_channels());
        for ch in 0..raw.n_channels() {
            let mut channel_samples = Vec::with_capacity(samples_per_record);
            for t in start..end {
                channel_samples.push(raw.data[(ch, t)] * VOLT_TO_MICROVOLT);
            }
            // EDF records are fixed-width; the tail record pads with zeros.
            channel_samples.resize(samples_per_record, 0.0);
            record_samples.push(channel_samples);
        }
        writer.write_samples(&record_samples).map_err(to_dataset)?;
    }

    writer.finalize().map_err(to_dataset)?;
    Ok(())
}

fn write_channels_tsv(raw: &RawEeg, path: &DatasetPath) -> Result<()> {
    let tsv_path = path.sibling("channels", "tsv")?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&tsv_path)
        .map_err(|e| EegError::dataset("export", tsv_path.display().to_string(), e.to_string()))?;

    let to_dataset =
        |e: csv::Error| EegError::dataset("export", tsv_path.display().to_string(), e.to_string());

    writer
        .write_record(["name", "type", "units", "sampling_frequency", "status"])
        .map_err(to_dataset)?;
    for label in &raw.channels {
        writer
            .write_record([
                label.as_str(),
                "EEG",
                "uV",
                &raw.sfreq.to_string(),
                "good",
            ])
            .map_err(to_dataset)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_sidecar(raw: &RawEeg, path: &DatasetPath) -> Result<()> {
    let sidecar_path = path.sibling("eeg", "json")?;
    let sidecar = EegSidecar {
        task_name: path.task.clone().unwrap_or_default(),
        sampling_frequency: raw.sfreq,
        power_line_frequency: raw.line_freq,
        eeg_channel_count: raw.n_channels(),
        eeg_reference: "n/a".to_string(),
        recording_duration: raw.duration_secs(),
        recording_type: "continuous".to_string(),
    };
    let json = serde_json::to_string_pretty(&sidecar)
        .map_err(|e| EegError::dataset("export", sidecar_path.display().to_string(), e.to_string()))?;
    fs::write(&sidecar_path, json)?;
    Ok(())
}

/// Create or update the participants table, keyed by participant id.
fn update_participants(root: &Path, participant: &Participant) -> Result<()> {
    let table_path = root.join("participants.tsv");
    let display = table_path.display().to_string();
    let row_id = format!("sub-{}", participant.id);

    let mut rows: Vec<[String; 4]> = Vec::new();
    if table_path.exists() {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_path(&table_path)
            .map_err(|e| EegError::dataset("export", display.clone(), e.to_string()))?;
        let headers = reader
            .headers()
            .map_err(|e| EegError::dataset("export", display.clone(), e.to_string()))?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h == name);
        let (id_col, age_col, sex_col, hand_col) = (
            column("participant_id"),
            column("age"),
            column("sex"),
            column("hand"),
        );

        for record in reader.records() {
            let record =
                record.map_err(|e| EegError::dataset("export", display.clone(), e.to_string()))?;
            let field = |col: Option<usize>| {
                col.and_then(|c| record.get(c))
                    .unwrap_or("n/a")
                    .to_string()
            };
            let id = field(id_col);
            if id != row_id {
                rows.push([id, field(age_col), field(sex_col), field(hand_col)]);
            }
        }
    }

    let or_na = |value: Option<String>| value.unwrap_or_else(|| "n/a".to_string());
    rows.push([
        row_id,
        or_na(participant.age.map(|a| a.to_string())),
        or_na(participant.sex.clone()),
        or_na(participant.hand.clone()),
    ]);
    rows.sort();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&table_path)
        .map_err(|e| EegError::dataset("export", display.clone(), e.to_string()))?;
    writer
        .write_record(["participant_id", "age", "sex", "hand"])
        .map_err(|e| EegError::dataset("export", display.clone(), e.to_string()))?;
    for row in &rows {
        writer
            .write_record(row)
            .map_err(|e| EegError::dataset("export", display.clone(), e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{generate_session, SyntheticConfig};
    use crate::convert::to_raw_eeg;
    use tempfile::tempdir;

    fn sample_raw() -> RawEeg {
        let set = generate_session(&SyntheticConfig {
            seconds: 1.5,
            ..Default::default()
        });
        to_raw_eeg(&set.eeg, 50, Some(&set.filenames), None)
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_export_writes_data_and_metadata() {
        let dir = tempdir().unwrap();
        let raw = sample_raw();
        let path = DatasetPath::new(dir.path()).subject("001").task("rest");

        let written = export_dataset(&raw, &path, None, false).unwrap();
        assert!(written.ends_with("sub-001/eeg/sub-001_task-rest_eeg.edf"));
        assert!(written.exists());
        assert!(dir.path().join("dataset_description.json").exists());
        assert!(path.sibling("channels", "tsv").unwrap().exists());
        assert!(path.sibling("eeg", "json").unwrap().exists());
    }

    #[test]
    fn test_existing_target_needs_overwrite() {
        let dir = tempdir().unwrap();
        let raw = sample_raw();
        let path = DatasetPath::new(dir.path()).subject("001");

        export_dataset(&raw, &path, None, false).unwrap();
        let err = export_dataset(&raw, &path, None, false).unwrap_err();
        assert!(format!("{}", err).contains("overwrite"));
        export_dataset(&raw, &path, None, true).unwrap();
    }

    #[test]
    fn test_participants_table_updated_not_duplicated() {
        let dir = tempdir().unwrap();
        let raw = sample_raw();
        let path = DatasetPath::new(dir.path()).subject("001");
        let participant = Participant {
            id: "001".to_string(),
            age: Some(30),
            sex: Some("F".to_string()),
            hand: Some("R".to_string()),
        };

        export_dataset(&raw, &path, Some(&participant), false).unwrap();
        let updated = Participant {
            age: Some(31),
            ..participant
        };
        export_dataset(&raw, &path, Some(&updated), true).unwrap();

        let table = fs::read_to_string(dir.path().join("participants.tsv")).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "participant_id\tage\tsex\thand");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("sub-001\t31\tF\tR"));
    }

    #[test]
    fn test_sidecar_carries_line_freq() {
        let dir = tempdir().unwrap();
        let raw = sample_raw();
        let path = DatasetPath::new(dir.path()).subject("001");
        export_dataset(&raw, &path, None, false).unwrap();

        let sidecar = fs::read_to_string(path.sibling("eeg", "json").unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&sidecar).unwrap();
        assert_eq!(value["PowerLineFrequency"], 50);
        assert_eq!(value["SamplingFrequency"], 256.0);
        assert_eq!(value["EEGChannelCount"], 4);
    }
}
