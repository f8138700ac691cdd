// src/utils/time.rs
//! Capture timestamp conversion
//!
//! Capture files carry wall-clock timestamps as fractional epoch seconds.
//! Merged tables and the live viewer render them as local date-times.

use chrono::{DateTime, Local, TimeZone};

/// Convert fractional epoch seconds to a local date-time.
///
/// Sub-second precision is kept to the microsecond, matching the device's
/// timestamp resolution. Values outside chrono's representable range clamp
/// to the epoch rather than panicking.
pub fn to_local_datetime(epoch_secs: f64) -> DateTime<Local> {
    let mut secs = epoch_secs.floor() as i64;
    let mut micros = ((epoch_secs - epoch_secs.floor()) * 1_000_000.0).round() as u32;
    if micros >= 1_000_000 {
        secs += 1;
        micros = 0;
    }
    match Local.timestamp_opt(secs, micros * 1000) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(dt, _) => dt,
        chrono::LocalResult::None => DateTime::<Local>::from(std::time::UNIX_EPOCH),
    }
}

/// Format a capture timestamp as a full local date-time string.
pub fn format_timestamp(epoch_secs: f64) -> String {
    to_local_datetime(epoch_secs)
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

/// Format a capture timestamp as a local time-of-day string, as shown on
/// the live viewer's axis.
pub fn format_time_of_day(epoch_secs: f64) -> String {
    to_local_datetime(epoch_secs)
        .format("%H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsecond_precision_kept() {
        let formatted = format_timestamp(1_600_000_000.123456);
        assert!(formatted.ends_with("123456"), "got {}", formatted);
    }

    #[test]
    fn test_time_of_day_has_no_date() {
        let formatted = format_time_of_day(1_600_000_000.5);
        assert_eq!(formatted.matches(':').count(), 2);
        assert!(!formatted.contains('-'));
    }

    #[test]
    fn test_monotone_inputs_stay_ordered() {
        let a = to_local_datetime(1_600_000_000.0);
        let b = to_local_datetime(1_600_000_000.25);
        assert!(a < b);
    }

    #[test]
    fn test_out_of_range_clamps_to_epoch() {
        let dt = to_local_datetime(f64::MAX);
        assert_eq!(dt.timestamp(), 0);
    }
}
