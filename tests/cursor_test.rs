//! Log cursor tests
//!
//! The timestamp watermark driving the alert/event modules.

use chrono::{DateTime, Duration, Utc};
use unisphere_exporter::collectors::LogCursor;

fn at(rfc3339: &str) -> DateTime<Utc> {
    rfc3339.parse().expect("Failed to parse timestamp")
}

#[test]
fn test_cursor_seeded_one_hour_back() {
    let now = at("2024-05-01T10:00:00Z");

    let cursor = LogCursor::starting_at(now);

    assert_eq!(cursor.position(), now - Duration::hours(1));
}

#[test]
fn test_filter_predicate_format() {
    let cursor = LogCursor::starting_at(at("2024-05-01T10:00:00Z"));

    // Millisecond precision, zulu suffix, value quoted
    assert_eq!(
        cursor.filter("timestamp"),
        "timestamp gt \"2024-05-01T09:00:00.000Z\""
    );
    assert_eq!(
        cursor.filter("creationTime"),
        "creationTime gt \"2024-05-01T09:00:00.000Z\""
    );
}

#[test]
fn test_advance_moves_watermark() {
    let mut cursor = LogCursor::starting_at(at("2024-05-01T10:00:00Z"));
    let window_end = at("2024-05-01T10:01:00Z");

    cursor.advance(window_end);

    assert_eq!(cursor.position(), window_end);
}

#[test]
fn test_unadvanced_cursor_recovers_same_window() {
    // A failed fetch never calls advance, so the next cycle's filter covers
    // the same window again.
    let cursor = LogCursor::starting_at(at("2024-05-01T10:00:00Z"));
    let filter_before = cursor.filter("timestamp");

    // (fetch failed; no advance)

    assert_eq!(cursor.filter("timestamp"), filter_before);
}

#[test]
fn test_advance_is_independent_of_dropped_entries() {
    // Entries below the severity threshold are dropped, but the window still
    // closes: the cursor moves to the snapshot time and never reconsiders
    // them.
    let mut cursor = LogCursor::starting_at(at("2024-05-01T10:00:00Z"));
    let first_window_end = at("2024-05-01T10:01:00Z");

    // First cycle: one alert at T0+10s below threshold, dropped by the module
    cursor.advance(first_window_end);

    // Second cycle's window starts exactly at the advanced watermark
    assert_eq!(
        cursor.filter("timestamp"),
        "timestamp gt \"2024-05-01T10:01:00.000Z\""
    );
}

#[test]
fn test_filter_formats_sub_second_precision() {
    let cursor = LogCursor::starting_at(at("2024-05-01T10:00:00.456Z"));

    assert_eq!(
        cursor.filter("timestamp"),
        "timestamp gt \"2024-05-01T09:00:00.456Z\""
    );
}
