//! Export a synthetic recording into a standardized dataset tree and read
//! it back.
//!
//! ```bash
//! cargo run --example export_dataset -- /tmp/my-dataset
//! ```

use eeg_core::capture::{generate_session, SyntheticConfig};
use eeg_core::convert::to_raw_eeg;
use eeg_core::dataset::{export_dataset, import_dataset, DatasetPath, Participant};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let root = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dataset".to_string());

    let set = generate_session(&SyntheticConfig {
        seconds: 10.0,
        ..Default::default()
    });
    let raw = to_raw_eeg(&set.eeg, 50, Some(&set.filenames), None)?.remove(0);

    let path = DatasetPath::new(&root)
        .subject("001")
        .session("01")
        .task("rest");
    let participant = Participant {
        id: "001".to_string(),
        age: Some(30),
        sex: Some("F".to_string()),
        hand: Some("R".to_string()),
    };

    let written = export_dataset(&raw, &path, Some(&participant), true)?;
    println!("Exported: {}", written.display());

    let restored = import_dataset(&path)?;
    println!(
        "Imported back: {} channels, {:.1} s at {} Hz, {} annotation(s)",
        restored.n_channels(),
        restored.duration_secs(),
        restored.sfreq,
        restored.annotations.len()
    );
    Ok(())
}
