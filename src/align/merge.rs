// src/align/merge.rs
//! As-of join of auxiliary sequences onto the primary row index

use crate::align::table::{Column, MergedTable, SparseColumn};
use crate::error::InputError;
use crate::stream::{AuxStream, EegStream, SensorKind, EEG_OUTPUT_ORDER};
use crate::utils::time::to_local_datetime;
use ndarray::Array2;

/// The primary sample sequence handed to [`align`]: wall-clock timestamps
/// plus a labelled sample matrix. Labels may be in any order; [`align`]
/// selects and reorders them into the declared output order.
#[derive(Debug, Clone, PartialEq)]
pub struct Primary {
    /// Per-record timestamps, epoch seconds, non-decreasing.
    pub timestamps: Vec<f64>,
    /// Labels describing the columns of `data`.
    pub labels: Vec<String>,
    /// Sample matrix, `(records, labels.len())`.
    pub data: Array2<f64>,
}

impl Primary {
    /// Primary view of a capture stream, microvolt samples widened to f64.
    pub fn from_stream(stream: &EegStream) -> Self {
        Primary {
            timestamps: stream.timestamps.clone(),
            labels: stream.channels.clone(),
            data: stream.samples.mapv(f64::from),
        }
    }
}

/// One auxiliary sequence attached to an [`align`] call, with the rate
/// ratio mapping its record positions onto primary rows.
#[derive(Debug, Clone, Copy)]
pub struct Attachment<'a> {
    /// The auxiliary stream to merge.
    pub stream: &'a AuxStream,
    /// Primary rows per one auxiliary record.
    pub rate_ratio: usize,
}

impl<'a> Attachment<'a> {
    /// Attach with the sensor kind's nominal rate ratio.
    pub fn nominal(stream: &'a AuxStream) -> Self {
        Attachment {
            stream,
            rate_ratio: stream.kind.rate_ratio(),
        }
    }

    /// Attach with an explicit rate ratio.
    pub fn with_ratio(stream: &'a AuxStream, rate_ratio: usize) -> Self {
        Attachment { stream, rate_ratio }
    }
}

/// For each of `n_rows` primary rows, the index of the most recent entry of
/// `scaled` (sorted ascending) that is `<= row`, or `None` when no entry
/// has been reached yet.
///
/// This is the generic as-of join core: `scaled[j]` is the primary row
/// position record `j` is deemed to have occurred no later than. A leading
/// gap (first scaled index above 0) yields a `None` prefix rather than a
/// fabricated default.
pub fn asof_indices(n_rows: usize, scaled: &[usize]) -> Vec<Option<usize>> {
    let mut out = Vec::with_capacity(n_rows);
    let mut next = 0usize;
    let mut last = None;
    for row in 0..n_rows {
        while next < scaled.len() && scaled[next] <= row {
            last = Some(next);
            next += 1;
        }
        out.push(last);
    }
    out
}

/// Merge the primary sequence with zero or more auxiliary sequences into a
/// [`MergedTable`].
///
/// The output has one row per primary record. Columns are: the timestamp
/// column (primary timestamps converted to local date-time), the primary
/// channels in the declared output order, then each attachment's channels
/// in sensor-kind order (motion, rotation, optical). For primary row `i`
/// each auxiliary column holds the value of the record with the largest
/// `j * rate_ratio <= i`; rows before the first mapped record stay absent.
///
/// Rate ratios are nominal constants, not measured from timestamps; if a
/// capture's actual rates drift from nominal the table is still produced,
/// progressively misaligned.
pub fn align(primary: &Primary, attachments: &[Attachment<'_>]) -> Result<MergedTable, InputError> {
    align_with_order(primary, &EEG_OUTPUT_ORDER, attachments)
}

/// [`align`] with a caller-supplied declared column order.
pub fn align_with_order(
    primary: &Primary,
    output_order: &[&str],
    attachments: &[Attachment<'_>],
) -> Result<MergedTable, InputError> {
    if primary.timestamps.is_empty() || primary.data.nrows() == 0 {
        return Err(InputError::EmptyPrimary);
    }
    if primary.data.ncols() != primary.labels.len() {
        return Err(InputError::ChannelCountMismatch {
            expected: primary.labels.len(),
            actual: primary.data.ncols(),
        });
    }
    if primary.timestamps.len() != primary.data.nrows() {
        return Err(InputError::LengthMismatch {
            field: "timestamps",
            expected: primary.data.nrows(),
            actual: primary.timestamps.len(),
        });
    }

    let n_rows = primary.data.nrows();
    let selection = selection(&primary.labels, output_order)?;

    let timestamps = primary
        .timestamps
        .iter()
        .map(|&ts| to_local_datetime(ts))
        .collect();

    let primary_columns = selection
        .iter()
        .zip(output_order)
        .map(|(&src, &name)| Column {
            name: name.to_string(),
            values: primary.data.column(src).to_vec(),
        })
        .collect();

    let mut secondary = Vec::new();
    for kind in SensorKind::MERGE_ORDER {
        for attachment in attachments.iter().filter(|a| a.stream.kind == kind) {
            merge_attachment(attachment, n_rows, &mut secondary)?;
        }
    }

    Ok(MergedTable {
        timestamps,
        primary: primary_columns,
        secondary,
    })
}

/// Resolve each wanted label to its column index, failing on the first
/// label the stream does not carry.
pub(crate) fn selection(labels: &[String], wanted: &[&str]) -> Result<Vec<usize>, InputError> {
    wanted
        .iter()
        .map(|&name| {
            labels
                .iter()
                .position(|l| l == name)
                .ok_or_else(|| InputError::MissingChannel {
                    label: name.to_string(),
                })
        })
        .collect()
}

fn merge_attachment(
    attachment: &Attachment<'_>,
    n_rows: usize,
    out: &mut Vec<SparseColumn>,
) -> Result<(), InputError> {
    if attachment.rate_ratio == 0 {
        return Err(InputError::InvalidRateRatio { value: 0 });
    }

    let stream = attachment.stream;
    if stream.samples.ncols() != stream.channels.len() {
        return Err(InputError::ChannelCountMismatch {
            expected: stream.channels.len(),
            actual: stream.samples.ncols(),
        });
    }

    let scaled: Vec<usize> = (0..stream.len())
        .map(|j| j * attachment.rate_ratio)
        .collect();
    let row_map = asof_indices(n_rows, &scaled);

    for (col, name) in stream.channels.iter().enumerate() {
        let values = row_map
            .iter()
            .map(|&j| j.map(|j| f64::from(stream.samples[(j, col)])))
            .collect();
        out.push(SparseColumn {
            name: name.clone(),
            values,
        });
    }
    Ok(())
}
