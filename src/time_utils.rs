// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time and distance formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format a completion timestamp for the activity summary screen.
pub fn format_date_time(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y at %H:%M").to_string()
}

/// Format elapsed seconds as `MM:SS`.
///
/// Minutes are not wrapped into hours, so an hour-long walk reads `60:00`.
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Format a distance: two decimals up to 9999, rounded integer above.
pub fn format_distance(distance: f64) -> String {
    if distance > 9999.0 {
        format!("{}", distance.round() as i64)
    } else {
        format!("{:.2}", distance)
    }
}
