// src/dataset/path.rs
//! Entity-based dataset paths
//!
//! A recording's place in the dataset tree is described by a fixed set of
//! optional entities. Every recognized field is enumerated here explicitly;
//! unset entities are simply omitted from the rendered name.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{EegError, Result};

/// Entity set locating one recording inside a dataset root.
///
/// Only `root` and `subject` are required to render a path. `suffix`
/// defaults to `eeg` and `extension` to `edf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DatasetPath {
    /// Dataset root directory.
    pub root: PathBuf,
    /// Subject label (`sub-<label>`), required for rendering.
    #[serde(default)]
    pub subject: Option<String>,
    /// Session label (`ses-<label>`).
    #[serde(default)]
    pub session: Option<String>,
    /// Task label (`task-<label>`).
    #[serde(default)]
    pub task: Option<String>,
    /// Acquisition label (`acq-<label>`).
    #[serde(default)]
    pub acquisition: Option<String>,
    /// Run index (`run-<label>`).
    #[serde(default)]
    pub run: Option<String>,
    /// Processing label (`proc-<label>`).
    #[serde(default)]
    pub processing: Option<String>,
    /// Recording label (`recording-<label>`).
    #[serde(default)]
    pub recording: Option<String>,
    /// Space label (`space-<label>`).
    #[serde(default)]
    pub space: Option<String>,
    /// Split index (`split-<label>`).
    #[serde(default)]
    pub split: Option<String>,
    /// Datatype suffix; defaults to `eeg`.
    #[serde(default)]
    pub suffix: Option<String>,
    /// Data file extension without the dot; defaults to `edf`.
    #[serde(default)]
    pub extension: Option<String>,
}

impl DatasetPath {
    /// Path rooted at `root` with no entities set.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DatasetPath {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Set the subject label.
    pub fn subject(mut self, label: impl Into<String>) -> Self {
        self.subject = Some(label.into());
        self
    }

    /// Set the session label.
    pub fn session(mut self, label: impl Into<String>) -> Self {
        self.session = Some(label.into());
        self
    }

    /// Set the task label.
    pub fn task(mut self, label: impl Into<String>) -> Self {
        self.task = Some(label.into());
        self
    }

    /// Set the acquisition label.
    pub fn acquisition(mut self, label: impl Into<String>) -> Self {
        self.acquisition = Some(label.into());
        self
    }

    /// Set the run index.
    pub fn run(mut self, label: impl Into<String>) -> Self {
        self.run = Some(label.into());
        self
    }

    /// Set the processing label.
    pub fn processing(mut self, label: impl Into<String>) -> Self {
        self.processing = Some(label.into());
        self
    }

    /// Set the recording label.
    pub fn recording(mut self, label: impl Into<String>) -> Self {
        self.recording = Some(label.into());
        self
    }

    /// Set the space label.
    pub fn space(mut self, label: impl Into<String>) -> Self {
        self.space = Some(label.into());
        self
    }

    /// Set the split index.
    pub fn split(mut self, label: impl Into<String>) -> Self {
        self.split = Some(label.into());
        self
    }

    /// Override the datatype suffix.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Override the data file extension (without the dot).
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// The recording's file name, e.g.
    /// `sub-001_ses-01_task-rest_eeg.edf`.
    pub fn filename(&self) -> Result<String> {
        let subject = self.require_subject()?;
        let mut name = format!("sub-{}", subject);

        let entities: [(&str, &Option<String>); 8] = [
            ("ses", &self.session),
            ("task", &self.task),
            ("acq", &self.acquisition),
            ("run", &self.run),
            ("proc", &self.processing),
            ("recording", &self.recording),
            ("space", &self.space),
            ("split", &self.split),
        ];
        for (key, value) in entities {
            if let Some(label) = value {
                self.check_label(key, label)?;
                name.push_str(&format!("_{}-{}", key, label));
            }
        }

        name.push('_');
        name.push_str(self.suffix.as_deref().unwrap_or("eeg"));
        name.push('.');
        name.push_str(self.extension.as_deref().unwrap_or("edf"));
        Ok(name)
    }

    /// Directory holding the recording's files:
    /// `root/sub-<..>[/ses-<..>]/eeg`.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let subject = self.require_subject()?;
        let mut dir = self.root.join(format!("sub-{}", subject));
        if let Some(session) = &self.session {
            self.check_label("ses", session)?;
            dir = dir.join(format!("ses-{}", session));
        }
        Ok(dir.join("eeg"))
    }

    /// Full path of the recording's data file.
    pub fn data_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(self.filename()?))
    }

    /// Full path of a sibling metadata file sharing the entity name, e.g.
    /// the `channels.tsv` or the `eeg.json` sidecar.
    pub fn sibling(&self, suffix: &str, extension: &str) -> Result<PathBuf> {
        let sibling = DatasetPath {
            suffix: Some(suffix.to_string()),
            extension: Some(extension.to_string()),
            ..self.clone()
        };
        Ok(self.data_dir()?.join(sibling.filename()?))
    }

    fn require_subject(&self) -> Result<&str> {
        match &self.subject {
            Some(subject) => {
                self.check_label("sub", subject)?;
                Ok(subject)
            }
            None => Err(EegError::dataset(
                "path",
                self.root.display().to_string(),
                "subject entity is required",
            )),
        }
    }

    fn check_label(&self, key: &str, label: &str) -> Result<()> {
        if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(EegError::dataset(
                "path",
                self.root.display().to_string(),
                format!("entity '{}' label '{}' must be alphanumeric", key, label),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_path() {
        let path = DatasetPath::new("/data/study").subject("001");
        assert_eq!(path.filename().unwrap(), "sub-001_eeg.edf");
        assert_eq!(
            path.data_path().unwrap(),
            PathBuf::from("/data/study/sub-001/eeg/sub-001_eeg.edf")
        );
    }

    #[test]
    fn test_full_entity_order() {
        let path = DatasetPath::new("/data/study")
            .subject("001")
            .session("01")
            .task("rest")
            .acquisition("muse")
            .run("2")
            .processing("raw")
            .recording("full")
            .space("head")
            .split("1");
        assert_eq!(
            path.filename().unwrap(),
            "sub-001_ses-01_task-rest_acq-muse_run-2_proc-raw_recording-full_space-head_split-1_eeg.edf"
        );
        assert_eq!(
            path.data_dir().unwrap(),
            PathBuf::from("/data/study/sub-001/ses-01/eeg")
        );
    }

    #[test]
    fn test_missing_subject_rejected() {
        let err = DatasetPath::new("/data").filename().unwrap_err();
        assert!(format!("{}", err).contains("subject"));
    }

    #[test]
    fn test_non_alphanumeric_label_rejected() {
        let err = DatasetPath::new("/data")
            .subject("00_1")
            .filename()
            .unwrap_err();
        assert!(format!("{}", err).contains("alphanumeric"));
    }

    #[test]
    fn test_sibling_shares_entities() {
        let path = DatasetPath::new("/data").subject("001").task("rest");
        assert_eq!(
            path.sibling("channels", "tsv").unwrap(),
            PathBuf::from("/data/sub-001/eeg/sub-001_task-rest_channels.tsv")
        );
    }
}
