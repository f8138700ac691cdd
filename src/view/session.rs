// src/view/session.rs
//! Explicit viewer session state
//!
//! Play/pause, zoom level, channel selection and the retained samples all
//! live in one value passed into each update step. Commands mutate it
//! through [`ViewerSession::apply`]; chunk ingestion through
//! [`ViewerSession::push_chunk`].

use std::collections::VecDeque;

use crate::config::ViewerConfig;

/// Rows inspected by the signal quality check.
const QUALITY_WINDOW_ROWS: usize = 200;

/// Peak-to-peak threshold (microvolts) separating good from bad contact.
const QUALITY_P2P_THRESHOLD_UV: f32 = 300.0;

/// Retained rows per stream, as a multiple of the current window.
const RETENTION_FACTOR: usize = 4;

/// Per-channel contact quality verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelQuality {
    /// Signal swing within the expected range.
    Good,
    /// Excessive swing, typically a poor electrode contact.
    Bad,
    /// Not enough data yet.
    Unknown,
}

/// A batch of samples pulled from one live stream.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    /// Index of the stream within the session.
    pub stream: usize,
    /// Per-record wall-clock timestamps, epoch seconds.
    pub timestamps: Vec<f64>,
    /// One record per timestamp, values per channel.
    pub rows: Vec<Vec<f32>>,
}

/// Commands the dashboard controls emit.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    /// Show fewer rows.
    ZoomIn,
    /// Show more rows.
    ZoomOut,
    /// Back to the configured window.
    ResetZoom,
    /// Toggle between live updates and a frozen view.
    TogglePlay,
    /// Toggle the single-column expanded layout.
    ToggleExpand,
    /// Replace the channel selection.
    SelectChannels(Vec<String>),
    /// Change the refresh interval.
    SetRefreshMs(u64),
}

/// Retained samples of one live stream.
#[derive(Debug, Clone)]
pub struct StreamBuffer {
    /// Stream display name.
    pub name: String,
    /// Channel labels.
    pub channels: Vec<String>,
    rows: VecDeque<(f64, Vec<f32>)>,
}

impl StreamBuffer {
    /// `(timestamp, record)` pairs of the most recent `n` rows, oldest
    /// first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = (f64, &[f32])> + '_ {
        let skip = self.rows.len().saturating_sub(n);
        self.rows
            .iter()
            .skip(skip)
            .map(|(ts, row)| (*ts, row.as_slice()))
    }

    /// Retained row count.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing has been retained yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All state of one live viewing session.
#[derive(Debug, Clone)]
pub struct ViewerSession {
    streams: Vec<StreamBuffer>,
    window_rows: usize,
    default_window_rows: usize,
    zoom_step_rows: usize,
    playing: bool,
    expanded: bool,
    selected: Vec<String>,
    refresh_ms: u64,
}

impl ViewerSession {
    /// Session with the configured window and refresh, `selected` channels
    /// shown initially.
    pub fn new(config: &ViewerConfig, selected: Vec<String>) -> Self {
        ViewerSession {
            streams: Vec::new(),
            window_rows: config.window_rows,
            default_window_rows: config.window_rows,
            zoom_step_rows: config.zoom_step_rows,
            playing: true,
            expanded: false,
            selected,
            refresh_ms: config.refresh_ms,
        }
    }

    /// Register a stream; returns its index for [`StreamChunk::stream`].
    pub fn add_stream(&mut self, name: impl Into<String>, channels: Vec<String>) -> usize {
        self.streams.push(StreamBuffer {
            name: name.into(),
            channels,
            rows: VecDeque::new(),
        });
        self.streams.len() - 1
    }

    /// Ingest a chunk. Ignored while paused or when the stream index is
    /// unknown; rows are retained up to a multiple of the current window.
    pub fn push_chunk(&mut self, chunk: &StreamChunk) {
        if !self.playing {
            return;
        }
        let capacity = self.retention_rows();
        let Some(buffer) = self.streams.get_mut(chunk.stream) else {
            return;
        };
        for (ts, row) in chunk.timestamps.iter().zip(&chunk.rows) {
            buffer.rows.push_back((*ts, row.clone()));
        }
        while buffer.rows.len() > capacity {
            buffer.rows.pop_front();
        }
    }

    /// Apply one command.
    pub fn apply(&mut self, command: ViewerCommand) {
        match command {
            ViewerCommand::ZoomIn => {
                if self.window_rows > self.zoom_step_rows {
                    self.window_rows -= self.zoom_step_rows;
                }
            }
            ViewerCommand::ZoomOut => self.window_rows += self.zoom_step_rows,
            ViewerCommand::ResetZoom => self.window_rows = self.default_window_rows,
            ViewerCommand::TogglePlay => self.playing = !self.playing,
            ViewerCommand::ToggleExpand => self.expanded = !self.expanded,
            ViewerCommand::SelectChannels(channels) => self.selected = channels,
            ViewerCommand::SetRefreshMs(ms) => self.refresh_ms = ms,
        }
    }

    /// Contact quality of one channel, judged on the swing of its most
    /// recent rows.
    pub fn quality(&self, stream: usize, channel: &str) -> ChannelQuality {
        let Some(buffer) = self.streams.get(stream) else {
            return ChannelQuality::Unknown;
        };
        let Some(index) = buffer.channels.iter().position(|c| c == channel) else {
            return ChannelQuality::Unknown;
        };

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut seen = 0usize;
        for (_, row) in buffer.tail(QUALITY_WINDOW_ROWS) {
            if let Some(&value) = row.get(index) {
                min = min.min(value);
                max = max.max(value);
                seen += 1;
            }
        }
        if seen == 0 {
            return ChannelQuality::Unknown;
        }
        if (max - min).abs() < QUALITY_P2P_THRESHOLD_UV {
            ChannelQuality::Good
        } else {
            ChannelQuality::Bad
        }
    }

    /// Registered streams.
    pub fn streams(&self) -> &[StreamBuffer] {
        &self.streams
    }

    /// Rows currently shown per channel.
    pub fn window_rows(&self) -> usize {
        self.window_rows
    }

    /// Whether live updates are applied.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether the expanded single-column layout is active.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Channels currently selected for display.
    pub fn selected_channels(&self) -> &[String] {
        &self.selected
    }

    /// Refresh interval in milliseconds.
    pub fn refresh_ms(&self) -> u64 {
        self.refresh_ms
    }

    fn retention_rows(&self) -> usize {
        (self.window_rows.max(QUALITY_WINDOW_ROWS)) * RETENTION_FACTOR
    }
}
