// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp formatting for log records.

use chrono::{Local, TimeZone};

/// Format epoch microseconds as `YYYY-MM-DD HH:MM:SS.mmm` in local time.
pub fn format_log_timestamp(epoch_micros: u64) -> String {
    format_log_timestamp_in(epoch_micros, &Local)
}

/// Format epoch microseconds as `YYYY-MM-DD HH:MM:SS.mmm` in `tz`.
pub fn format_log_timestamp_in<Tz>(epoch_micros: u64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let secs = (epoch_micros / 1_000_000) as i64;
    let nanos = ((epoch_micros % 1_000_000) * 1_000) as u32;
    match tz.timestamp_opt(secs, nanos).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        None => format_epoch_seconds(epoch_micros),
    }
}

/// Format epoch microseconds as fractional seconds with six decimals.
///
/// Integer arithmetic keeps every microsecond digit exact.
pub fn format_epoch_seconds(epoch_micros: u64) -> String {
    format!("{}.{:06}", epoch_micros / 1_000_000, epoch_micros % 1_000_000)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
