// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! String escaping shared by both log formats.
//!
//! Every text field that reaches a log file goes through [`escape_into`].
//! Bytes below `0x20` become `\u00XX`, `"` and `\` are backslash-escaped,
//! and the raw-log variant additionally escapes `/`. The output is always
//! a valid JSON string body, so a JSON decoder recovers the original text.

use std::fmt::Write;

/// Which log format the escaped text is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeMode {
    /// JSON-lines records: `/` is left as-is.
    Json,
    /// Human-readable raw log: `/` is escaped as well.
    RawLog,
}

/// Append the escaped form of `input` to `out`.
pub fn escape_into(out: &mut String, input: &str, mode: EscapeMode) {
    out.reserve(input.len());
    for ch in input.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '/' if mode == EscapeMode::RawLog => out.push_str("\\/"),
            c if (c as u32) < 0x20 => {
                // Writing to a String cannot fail
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
}

/// Escape `input` into a freshly allocated string.
pub fn escape(input: &str, mode: EscapeMode) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    escape_into(&mut out, input, mode);
    out
}

#[cfg(test)]
#[path = "escape_tests.rs"]
mod tests;
