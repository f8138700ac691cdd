// src/align/table.rs
//! Merged, timestamp-indexed table

use chrono::{DateTime, Local};
use std::io;

/// A dense column sourced from the primary sequence.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// A column sourced from an auxiliary sequence. Cells with no record
/// available at or before their row are `None`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SparseColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// The aligner's output: one row per primary record, a leading local
/// date-time column, primary channels in declared order, then any attached
/// auxiliary channels in sensor-kind order.
///
/// Constructed once per recording by [`align`](crate::align::align) and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    pub(crate) timestamps: Vec<DateTime<Local>>,
    pub(crate) primary: Vec<Column>,
    pub(crate) secondary: Vec<SparseColumn>,
}

/// Name of the leading date-time column.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

impl MergedTable {
    /// Number of rows (equals the primary sequence length).
    pub fn n_rows(&self) -> usize {
        self.timestamps.len()
    }

    /// All column names in output order, timestamp first.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(1 + self.primary.len() + self.secondary.len());
        names.push(TIMESTAMP_COLUMN);
        names.extend(self.primary.iter().map(|c| c.name.as_str()));
        names.extend(self.secondary.iter().map(|c| c.name.as_str()));
        names
    }

    /// The local date-time index.
    pub fn timestamps(&self) -> &[DateTime<Local>] {
        &self.timestamps
    }

    /// A primary channel column by name.
    pub fn primary_column(&self, name: &str) -> Option<&[f64]> {
        self.primary
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// An auxiliary channel column by name.
    pub fn aux_column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.secondary
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Whether any auxiliary columns were merged in.
    pub fn has_aux(&self) -> bool {
        !self.secondary.is_empty()
    }

    /// Write the table as CSV. Auxiliary cells with no value render empty,
    /// not zero.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> io::Result<()> {
        let into_io = |e: csv::Error| io::Error::new(io::ErrorKind::Other, e);
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(self.column_names()).map_err(into_io)?;

        let mut record = Vec::with_capacity(1 + self.primary.len() + self.secondary.len());
        for row in 0..self.n_rows() {
            record.clear();
            record.push(
                self.timestamps[row]
                    .format("%Y-%m-%d %H:%M:%S%.6f")
                    .to_string(),
            );
            for col in &self.primary {
                record.push(col.values[row].to_string());
            }
            for col in &self.secondary {
                record.push(match col.values[row] {
                    Some(v) => v.to_string(),
                    None => String::new(),
                });
            }
            out.write_record(&record).map_err(into_io)?;
        }
        out.flush()
    }
}
