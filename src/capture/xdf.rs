// src/capture/xdf.rs
//! Native XDF container reader
//!
//! XDF is a chunked binary container: a 4-byte `XDF:` magic followed by
//! chunks framed with a variable-length size field. Stream metadata lives
//! in small XML documents inside header chunks; sample chunks carry
//! optionally-timestamped numeric records. This reader decodes the chunk
//! layer directly and extracts the handful of header fields the crate
//! needs.
//!
//! Samples without an explicit timestamp are filled forward from the last
//! explicit one at the stream's nominal rate; each stream's mean clock
//! offset is applied afterwards.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

/// Chunk tags defined by the container format.
const TAG_FILE_HEADER: u16 = 1;
const TAG_STREAM_HEADER: u16 = 2;
const TAG_SAMPLES: u16 = 3;
const TAG_CLOCK_OFFSET: u16 = 4;
const TAG_BOUNDARY: u16 = 5;
const TAG_STREAM_FOOTER: u16 = 6;

/// Per-channel value encoding declared by a stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelFormat {
    Float32,
    Double64,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Variable-length string channels; carried by marker streams, which
    /// this device does not produce. Skipped with a warning.
    String,
}

impl ChannelFormat {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "float32" => Some(ChannelFormat::Float32),
            "double64" => Some(ChannelFormat::Double64),
            "int8" => Some(ChannelFormat::Int8),
            "int16" => Some(ChannelFormat::Int16),
            "int32" => Some(ChannelFormat::Int32),
            "int64" => Some(ChannelFormat::Int64),
            "string" => Some(ChannelFormat::String),
            _ => None,
        }
    }
}

/// One fully decoded stream from a capture file.
#[derive(Debug, Clone)]
pub(crate) struct ParsedStream {
    pub name: String,
    pub stream_type: String,
    pub channel_count: usize,
    pub nominal_srate: f64,
    pub labels: Vec<String>,
    /// Row-major samples, `records * channel_count` values.
    pub samples: Vec<f32>,
    /// One effective timestamp per record, clock-offset corrected.
    pub timestamps: Vec<f64>,
}

impl ParsedStream {
    pub fn n_records(&self) -> usize {
        if self.channel_count == 0 {
            0
        } else {
            self.samples.len() / self.channel_count
        }
    }
}

/// Stream state accumulated while walking chunks.
struct StreamAccumulator {
    id: u32,
    name: String,
    stream_type: String,
    channel_count: usize,
    nominal_srate: f64,
    format: ChannelFormat,
    labels: Vec<String>,
    samples: Vec<f32>,
    raw_timestamps: Vec<Option<f64>>,
    clock_offsets: Vec<f64>,
}

/// Read and decode every stream in an XDF file.
pub(crate) fn read_xdf(path: &Path) -> Result<Vec<ParsedStream>, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    parse_xdf(&bytes)
}

/// Decode an XDF byte buffer.
pub(crate) fn parse_xdf(bytes: &[u8]) -> Result<Vec<ParsedStream>, String> {
    let mut cursor = Cursor::new(bytes);
    let magic = cursor.take(4)?;
    if magic != b"XDF:" {
        return Err("missing XDF magic".to_string());
    }

    let mut streams: Vec<StreamAccumulator> = Vec::new();

    while !cursor.is_empty() {
        let chunk_len = cursor.read_varlen_uint()? as usize;
        if chunk_len < 2 {
            return Err(format!("chunk length {} too short for a tag", chunk_len));
        }
        let tag = cursor.read_u16_le()?;
        let content = cursor.take(chunk_len - 2)?;

        match tag {
            TAG_FILE_HEADER | TAG_BOUNDARY | TAG_STREAM_FOOTER => {}
            TAG_STREAM_HEADER => {
                let stream = parse_stream_header(content)?;
                debug!(
                    stream = %stream.name,
                    kind = %stream.stream_type,
                    channels = stream.channel_count,
                    "stream header"
                );
                streams.push(stream);
            }
            TAG_SAMPLES => parse_samples(content, &mut streams)?,
            TAG_CLOCK_OFFSET => parse_clock_offset(content, &mut streams)?,
            other => {
                warn!(tag = other, "skipping unknown chunk");
            }
        }
    }

    Ok(streams.into_iter().map(finalize_stream).collect())
}

fn parse_stream_header(content: &[u8]) -> Result<StreamAccumulator, String> {
    let mut cursor = Cursor::new(content);
    let id = cursor.read_u32_le()?;
    let xml = std::str::from_utf8(cursor.rest())
        .map_err(|_| "stream header is not valid UTF-8".to_string())?;

    let channel_count: usize = xml_text(xml, "channel_count")
        .ok_or("stream header missing channel_count")?
        .trim()
        .parse()
        .map_err(|_| "unparsable channel_count".to_string())?;
    let nominal_srate: f64 = xml_text(xml, "nominal_srate")
        .unwrap_or("0")
        .trim()
        .parse()
        .unwrap_or(0.0);
    let format_text = xml_text(xml, "channel_format").unwrap_or("float32").trim();
    let format = ChannelFormat::parse(format_text)
        .ok_or_else(|| format!("unknown channel_format '{}'", format_text))?;

    Ok(StreamAccumulator {
        id,
        name: xml_text(xml, "name").unwrap_or_default().trim().to_string(),
        stream_type: xml_text(xml, "type").unwrap_or_default().trim().to_string(),
        channel_count,
        nominal_srate,
        format,
        labels: xml_text_all(xml, "label")
            .into_iter()
            .map(|s| s.trim().to_string())
            .collect(),
        samples: Vec::new(),
        raw_timestamps: Vec::new(),
        clock_offsets: Vec::new(),
    })
}

fn parse_samples(content: &[u8], streams: &mut [StreamAccumulator]) -> Result<(), String> {
    let mut cursor = Cursor::new(content);
    let id = cursor.read_u32_le()?;
    let stream = match streams.iter_mut().find(|s| s.id == id) {
        Some(s) => s,
        None => {
            warn!(stream_id = id, "samples for undeclared stream, skipping");
            return Ok(());
        }
    };

    if stream.format == ChannelFormat::String {
        return Ok(());
    }

    let n_samples = cursor.read_varlen_uint()? as usize;
    // The declared count is untrusted; a truncated read errors out below.
    let reservation = n_samples.saturating_mul(stream.channel_count).min(1 << 20);
    stream.samples.reserve(reservation);
    stream.raw_timestamps.reserve(n_samples.min(1 << 20));

    for _ in 0..n_samples {
        let timestamp_bytes = cursor.read_u8()?;
        let timestamp = match timestamp_bytes {
            0 => None,
            8 => Some(cursor.read_f64_le()?),
            n => return Err(format!("invalid timestamp size {}", n)),
        };
        stream.raw_timestamps.push(timestamp);

        for _ in 0..stream.channel_count {
            let value = match stream.format {
                ChannelFormat::Float32 => cursor.read_f32_le()?,
                ChannelFormat::Double64 => cursor.read_f64_le()? as f32,
                ChannelFormat::Int8 => cursor.read_u8()? as i8 as f32,
                ChannelFormat::Int16 => cursor.read_i16_le()? as f32,
                ChannelFormat::Int32 => cursor.read_i32_le()? as f32,
                ChannelFormat::Int64 => cursor.read_i64_le()? as f32,
                ChannelFormat::String => unreachable!(),
            };
            stream.samples.push(value);
        }
    }
    Ok(())
}

fn parse_clock_offset(content: &[u8], streams: &mut [StreamAccumulator]) -> Result<(), String> {
    let mut cursor = Cursor::new(content);
    let id = cursor.read_u32_le()?;
    let _collection_time = cursor.read_f64_le()?;
    let offset = cursor.read_f64_le()?;
    if let Some(stream) = streams.iter_mut().find(|s| s.id == id) {
        stream.clock_offsets.push(offset);
    }
    Ok(())
}

/// Fill missing timestamps and apply the mean clock offset.
fn finalize_stream(acc: StreamAccumulator) -> ParsedStream {
    let delta = if acc.nominal_srate > 0.0 {
        1.0 / acc.nominal_srate
    } else {
        0.0
    };

    let mut timestamps = Vec::with_capacity(acc.raw_timestamps.len());
    let mut last: Option<f64> = None;
    for ts in &acc.raw_timestamps {
        let effective = match (ts, last) {
            (Some(t), _) => *t,
            (None, Some(prev)) => prev + delta,
            (None, None) => 0.0,
        };
        timestamps.push(effective);
        last = Some(effective);
    }

    // Back-fill a leading run that had no explicit timestamp yet.
    if let Some(first_explicit) = acc.raw_timestamps.iter().position(Option::is_some) {
        let base = timestamps[first_explicit];
        for i in 0..first_explicit {
            timestamps[i] = base - delta * (first_explicit - i) as f64;
        }
    } else if !timestamps.is_empty() {
        warn!(stream = %acc.name, "stream carries no explicit timestamps");
    }

    if !acc.clock_offsets.is_empty() {
        let mean = acc.clock_offsets.iter().sum::<f64>() / acc.clock_offsets.len() as f64;
        for ts in &mut timestamps {
            *ts += mean;
        }
    }

    ParsedStream {
        name: acc.name,
        stream_type: acc.stream_type,
        channel_count: acc.channel_count,
        nominal_srate: acc.nominal_srate,
        labels: acc.labels,
        samples: acc.samples,
        timestamps,
    }
}

/// Byte cursor over a chunk or file buffer.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], String> {
        if self.pos + n > self.buf.len() {
            return Err(format!(
                "truncated file: wanted {} bytes, {} left",
                n,
                self.buf.len() - self.pos
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, String> {
        Ok(self.take(1)?[0])
    }

    fn read_u16_le(&mut self) -> Result<u16, String> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32_le(&mut self) -> Result<u32, String> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64_le(&mut self) -> Result<u64, String> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_i16_le(&mut self) -> Result<i16, String> {
        Ok(self.read_u16_le()? as i16)
    }

    fn read_i32_le(&mut self) -> Result<i32, String> {
        Ok(self.read_u32_le()? as i32)
    }

    fn read_i64_le(&mut self) -> Result<i64, String> {
        Ok(self.read_u64_le()? as i64)
    }

    fn read_f32_le(&mut self) -> Result<f32, String> {
        Ok(f32::from_bits(self.read_u32_le()?))
    }

    fn read_f64_le(&mut self) -> Result<f64, String> {
        Ok(f64::from_bits(self.read_u64_le()?))
    }

    /// A size field: one byte giving the width (1, 4 or 8), then the
    /// little-endian value itself.
    fn read_varlen_uint(&mut self) -> Result<u64, String> {
        match self.read_u8()? {
            1 => Ok(u64::from(self.read_u8()?)),
            4 => Ok(u64::from(self.read_u32_le()?)),
            8 => self.read_u64_le(),
            n => Err(format!("invalid varlen size byte {}", n)),
        }
    }
}

/// Text of the first `<tag>..</tag>` occurrence. The capture headers use
/// plain tags without attributes, so no general XML machinery is needed.
fn xml_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(&xml[start..end])
}

/// Text of every `<tag>..</tag>` occurrence, in document order.
fn xml_text_all<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let mut out = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find(&open) {
        let body = &rest[start + open.len()..];
        match body.find(&close) {
            Some(end) => {
                out.push(&body[..end]);
                rest = &body[end + close.len()..];
            }
            None => break,
        }
    }
    out
}
