//! Import a capture file (or generate a synthetic session), convert it and
//! print the head of the merged table.
//!
//! ```bash
//! cargo run --example import_convert -- path/to/session.xdf
//! cargo run --example import_convert            # synthetic session
//! ```

use eeg_core::capture::{generate_session, read_capture, SyntheticConfig};
use eeg_core::convert::{to_raw_eeg, to_tables};
use eeg_core::stream::SensorKind;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let set = match std::env::args().nth(1) {
        Some(path) => read_capture(path)?,
        None => generate_session(&SyntheticConfig::default()),
    };

    println!(
        "Imported {} EEG stream(s), {} motion, {} rotation, {} optical",
        set.eeg.len(),
        set.accelerometer.len(),
        set.gyroscope.len(),
        set.ppg.len()
    );

    let raws = to_raw_eeg(&set.eeg, 50, Some(&set.filenames), None)?;
    for raw in &raws {
        println!(
            "Recording {}: {} channels, {:.1} s at {} Hz",
            raw.device,
            raw.n_channels(),
            raw.duration_secs(),
            raw.sfreq
        );
    }

    let kinds: Vec<SensorKind> = SensorKind::MERGE_ORDER
        .into_iter()
        .filter(|kind| set.aux(*kind).len() == raws.len())
        .collect();
    let tables = to_tables(&raws, &set, &kinds)?;

    let table = &tables[0];
    println!("\nMerged table: {} rows", table.n_rows());
    println!("{}", table.column_names().join("\t"));

    let mut csv = Vec::new();
    table.write_csv(&mut csv)?;
    for line in String::from_utf8(csv)?.lines().skip(1).take(10) {
        println!("{}", line);
    }
    Ok(())
}
