// src/view/inlet.rs
//! Network stream discovery and subscription
//!
//! Resolves EEG-typed streams on the local network, opens one inlet per
//! stream and pulls chunks on a plain reader thread, forwarding them over a
//! channel to whatever consumes them (normally the dashboard).

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::Sender;
use lsl::StreamInlet;
use tracing::{info, warn};

use crate::error::Result;
use crate::view::session::StreamChunk;

/// Seconds to wait for stream resolution.
const RESOLVE_TIMEOUT_SECS: f64 = 5.0;

/// Samples pulled per chunk.
const CHUNK_SIZE: usize = 1024;

/// One resolved live stream with an open inlet.
pub struct DiscoveredStream {
    /// Stream name from the network announcement.
    pub name: String,
    /// Unique source identifier.
    pub source_id: String,
    /// Channel count announced by the stream.
    pub channel_count: usize,
    /// Channel labels (generated when the announcement carries none).
    pub channels: Vec<String>,
    inlet: StreamInlet,
}

/// Look for EEG streams on the network and open an inlet for each.
pub fn search_streams() -> Result<Vec<DiscoveredStream>> {
    info!("searching streams");
    let infos = lsl::resolve_bypred("type='EEG'", 0, RESOLVE_TIMEOUT_SECS);

    let mut streams = Vec::new();
    for stream_info in infos {
        let inlet = match StreamInlet::new(&stream_info, 360, CHUNK_SIZE, true) {
            Ok(inlet) => inlet,
            Err(e) => {
                warn!("inlet failed: {:?}", e);
                continue;
            }
        };
        let channel_count = stream_info.channel_count() as usize;
        let channels = (0..channel_count).map(|i| format!("ch{}", i)).collect();
        info!(stream = %stream_info.source_id(), "stream found");
        streams.push(DiscoveredStream {
            name: stream_info.name().to_string(),
            source_id: stream_info.source_id().to_string(),
            channel_count,
            channels,
            inlet,
        });
    }
    Ok(streams)
}

/// Pull chunks from `stream` on a dedicated thread and forward them as
/// [`StreamChunk`]s for session `index`. The thread ends when the receiving
/// side hangs up.
pub fn spawn_reader(
    stream: DiscoveredStream,
    index: usize,
    sender: Sender<StreamChunk>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let channel_count = stream.channel_count.max(1);
        let mut sample_buffer = vec![0.0f32; CHUNK_SIZE * channel_count];
        let mut timestamp_buffer = vec![0.0f64; CHUNK_SIZE];

        loop {
            let pulled = match stream
                .inlet
                .pull_chunk_f32(&mut sample_buffer, Some(&mut timestamp_buffer))
            {
                Ok(pulled) => pulled,
                Err(e) => {
                    warn!(stream = %stream.name, "pull failed: {:?}", e);
                    thread::sleep(Duration::from_millis(100));
                    continue;
                }
            };

            if pulled == 0 {
                thread::sleep(Duration::from_millis(1));
                continue;
            }

            let rows = (0..pulled)
                .map(|row| {
                    sample_buffer[row * channel_count..(row + 1) * channel_count].to_vec()
                })
                .collect();
            let chunk = StreamChunk {
                stream: index,
                timestamps: timestamp_buffer[..pulled].to_vec(),
                rows,
            };
            if sender.send(chunk).is_err() {
                return;
            }
        }
    })
}
