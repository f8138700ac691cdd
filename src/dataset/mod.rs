// src/dataset/mod.rs
//! Standardized dataset directory layout
//!
//! Recordings are written into an entity-named directory tree (one folder
//! per subject, optional session level, `eeg` datatype folder) with EDF+
//! data files, JSON sidecars and TSV metadata, and can be read back from
//! the same layout.

pub mod export;
pub mod import;
pub mod path;

pub use export::{export_dataset, Participant};
pub use import::import_dataset;
pub use path::DatasetPath;
