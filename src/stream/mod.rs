// src/stream/mod.rs
//! Stream data model: EEG and auxiliary sensor sequences

pub mod types;

pub use types::*;
