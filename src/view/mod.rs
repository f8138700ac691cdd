// src/view/mod.rs
//! Live stream viewing
//!
//! [`ViewerSession`] holds all dashboard state explicitly and applies
//! commands as plain function calls, so the session logic compiles and
//! tests without any GUI. The egui dashboard (`viewer` feature) renders a
//! session; the network inlet layer (`streaming` feature) feeds it.

pub mod session;

#[cfg(feature = "streaming")]
pub mod inlet;

#[cfg(feature = "viewer")]
pub mod dashboard;

pub use session::{ChannelQuality, StreamChunk, ViewerCommand, ViewerSession};

#[cfg(feature = "streaming")]
pub use inlet::{search_streams, spawn_reader, DiscoveredStream};

#[cfg(feature = "viewer")]
pub use dashboard::run_dashboard;
