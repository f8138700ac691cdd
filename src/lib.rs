//! eeg-core: consumer EEG headband recording toolkit
//!
//! This library imports EEG recordings captured from a 4-channel consumer
//! headband, aligns its multi-rate sensor streams, and moves recordings
//! between representations:
//!
//! - XDF capture files (native chunk reader, single files or directories)
//! - An analysis object ([`convert::RawEeg`]) with montage, annotations and
//!   power-line metadata
//! - A merged, timestamp-indexed table ([`align::MergedTable`]) holding the
//!   EEG channels plus motion/rotation/optical columns aligned by as-of
//!   join
//! - A standardized dataset directory layout (EDF+ data files, JSON
//!   sidecars, TSV metadata)
//! - A live streaming dashboard (optional `viewer`/`streaming` features)
//!
//! # Quick Start
//!
//! ```
//! use eeg_core::capture::{generate_session, SyntheticConfig};
//! use eeg_core::convert::{to_raw_eeg, to_tables};
//! use eeg_core::stream::SensorKind;
//!
//! # fn main() -> eeg_core::Result<()> {
//! // A synthetic session stands in for `read_capture("session.xdf")?`.
//! let session = generate_session(&SyntheticConfig::default());
//!
//! let raws = to_raw_eeg(&session.eeg, 50, Some(&session.filenames), None)?;
//! let tables = to_tables(&raws, &session, &[SensorKind::Accelerometer])?;
//!
//! assert_eq!(tables[0].n_rows(), session.eeg[0].len());
//! assert_eq!(tables[0].column_names()[0], "timestamp");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod align;
pub mod capture;
pub mod config;
pub mod convert;
pub mod dataset;
pub mod error;
pub mod stream;
pub mod utils;
pub mod view;

// Re-export the types most callers need.
pub use align::{align, Attachment, MergedTable, Primary};
pub use capture::{read_capture, read_capture_dir};
pub use config::SessionConfig;
pub use convert::{to_raw_eeg, to_tables, RawEeg};
pub use dataset::{export_dataset, import_dataset, DatasetPath};
pub use error::{EegError, InputError, Result};
pub use stream::{AuxStream, CaptureSet, EegStream, SensorKind};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "eeg-core");
    }
}
