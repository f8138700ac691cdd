// src/capture/mod.rs
//! Capture file import
//!
//! Reads XDF capture files produced by the recording software, classifies
//! the contained streams by sensor type and groups them by headband device.
//! A synthetic session generator stands in for real captures in demos and
//! tests.

pub mod discovery;
pub mod synthetic;
pub mod xdf;

pub use discovery::{read_capture, read_capture_dir};
pub use synthetic::{generate_session, SyntheticConfig};
