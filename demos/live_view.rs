//! Live dashboard fed by a replayed synthetic session.
//!
//! With the `streaming` feature enabled, pass `--network` to discover real
//! EEG streams on the local network instead.
//!
//! ```bash
//! cargo run --example live_view --features viewer
//! cargo run --example live_view --features streaming -- --network
//! ```

use std::thread;
use std::time::Duration;

use eeg_core::capture::{generate_session, SyntheticConfig};
use eeg_core::config::ViewerConfig;
use eeg_core::stream::EEG_SAMPLE_RATE_HZ;
use eeg_core::view::{run_dashboard, StreamChunk, ViewerSession};

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt::init();

    let network = std::env::args().any(|arg| arg == "--network");
    if network {
        #[cfg(feature = "streaming")]
        return run_network();
        #[cfg(not(feature = "streaming"))]
        eprintln!("built without the streaming feature, replaying a synthetic session");
    }
    run_replay()
}

/// Replay a synthetic session at its real rate.
fn run_replay() -> Result<(), eframe::Error> {
    let set = generate_session(&SyntheticConfig {
        seconds: 120.0,
        ..Default::default()
    });
    let eeg = set.eeg.into_iter().next().expect("synthetic EEG stream");

    let mut session = ViewerSession::new(&ViewerConfig::default(), eeg.channels.clone());
    let stream_index = session.add_stream(eeg.name.clone(), eeg.channels.clone());

    let (sender, receiver) = crossbeam::channel::unbounded();
    thread::spawn(move || {
        let chunk_rows = 32;
        let pace = Duration::from_secs_f64(chunk_rows as f64 / EEG_SAMPLE_RATE_HZ);
        for start in (0..eeg.len()).step_by(chunk_rows) {
            let end = (start + chunk_rows).min(eeg.len());
            let chunk = StreamChunk {
                stream: stream_index,
                timestamps: eeg.timestamps[start..end].to_vec(),
                rows: (start..end)
                    .map(|r| eeg.samples.row(r).to_vec())
                    .collect(),
            };
            if sender.send(chunk).is_err() {
                return;
            }
            thread::sleep(pace);
        }
    });

    run_dashboard(session, Some(receiver))
}

#[cfg(feature = "streaming")]
fn run_network() -> Result<(), eframe::Error> {
    use eeg_core::view::{search_streams, spawn_reader};

    let streams = search_streams().expect("stream discovery");
    if streams.is_empty() {
        eprintln!("no EEG streams found on the network");
        return Ok(());
    }

    let mut session = ViewerSession::new(
        &ViewerConfig::default(),
        streams
            .first()
            .map(|s| s.channels.clone())
            .unwrap_or_default(),
    );

    let (sender, receiver) = crossbeam::channel::unbounded();
    for stream in streams {
        let index = session.add_stream(stream.name.clone(), stream.channels.clone());
        spawn_reader(stream, index, sender.clone());
    }
    drop(sender);

    run_dashboard(session, Some(receiver))
}
