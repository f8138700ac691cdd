// src/error.rs
//! Unified error handling for eeg-core
//!
//! Every fallible surface of the crate reports through [`EegError`]. Input
//! validation failures raised by the alignment and conversion layers use the
//! dedicated [`InputError`] type and convert into the crate error via `From`,
//! the same way capture, dataset and configuration failures feed in from
//! their own modules.

use thiserror::Error;

/// Invalid or malformed caller input.
///
/// Raised synchronously, never retried; no partial or degraded output is
/// returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// The primary EEG sequence has no records.
    #[error("primary EEG sequence is empty")]
    EmptyPrimary,

    /// A record is wider or narrower than the declared channel labels.
    #[error("record width {actual} does not match {expected} declared channel labels")]
    ChannelCountMismatch { expected: usize, actual: usize },

    /// A channel required by the declared column order is absent.
    #[error("declared channel '{label}' is missing from the stream")]
    MissingChannel { label: String },

    /// Parallel recording vectors disagree in length where an exact match
    /// is contractually required.
    #[error("'{field}' has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Power-line frequency outside the supported mains values.
    #[error("power-line frequency must be 50 or 60 Hz, got {value}")]
    InvalidLineFreq { value: u32 },

    /// A rate ratio that cannot map auxiliary records onto primary rows.
    #[error("rate ratio must be at least 1, got {value}")]
    InvalidRateRatio { value: usize },
}

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum EegError {
    /// Invalid caller input (empty primary, channel mismatches, ...).
    #[error(transparent)]
    Input(#[from] InputError),

    /// Capture file import failure (missing file, wrong extension,
    /// malformed container).
    #[error("capture import failed for '{path}': {reason}")]
    Capture { path: String, reason: String },

    /// Standardized dataset read/write failure.
    #[error("dataset {operation} failed at '{path}': {reason}")]
    Dataset {
        operation: &'static str,
        path: String,
        reason: String,
    },

    /// Configuration loading or validation failure.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Live stream discovery or subscription failure.
    #[cfg(feature = "streaming")]
    #[error("stream {operation} failed: {reason}")]
    Stream {
        operation: &'static str,
        reason: String,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EegError {
    /// Build a capture error for `path`.
    pub fn capture(path: impl Into<String>, reason: impl Into<String>) -> Self {
        EegError::Capture {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a dataset error for `operation` at `path`.
    pub fn dataset(
        operation: &'static str,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        EegError::Dataset {
            operation,
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for eeg-core operations.
pub type Result<T> = std::result::Result<T, EegError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display() {
        let err = InputError::ChannelCountMismatch {
            expected: 4,
            actual: 5,
        };
        let display = format!("{}", err);
        assert!(display.contains('4'));
        assert!(display.contains('5'));

        let err = InputError::MissingChannel {
            label: "AF7".to_string(),
        };
        assert!(format!("{}", err).contains("AF7"));
    }

    #[test]
    fn test_input_error_converts_into_crate_error() {
        let err: EegError = InputError::EmptyPrimary.into();
        match err {
            EegError::Input(InputError::EmptyPrimary) => {}
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EegError>();
        assert_send_sync::<InputError>();
    }
}
