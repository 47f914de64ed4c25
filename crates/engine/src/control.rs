// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active-job extraction from control file contents.
//!
//! The control file looks like
//! `{"active_jobs": {"<key>": {...}, ...}, ...}`; only the member names of
//! `active_jobs` matter. Parsers never fail: unusable input yields fewer
//! (or no) keys.

use qp_core::JobKey;

/// Extracts active job keys from control file text.
pub trait ActiveJobParser: Send + Sync {
    fn active_job_keys(&self, contents: &str) -> Vec<JobKey>;
}

/// Best-effort key scanner.
///
/// Locates the `"active_jobs"` member and, when its value is an object,
/// collects every well-formed quoted member name inside it, skipping values
/// by brace depth. Any other value (`[]`, `null`) means no active jobs.
/// Anything it cannot make sense of is skipped, so a truncated or partially
/// written file still yields the keys that precede the damage. Keys are taken verbatim (escape
/// sequences are not decoded), empty or over-long keys are dropped, and
/// duplicates are kept once.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyScanner;

const ACTIVE_JOBS_MEMBER: &str = "\"active_jobs\"";

impl ActiveJobParser for KeyScanner {
    fn active_job_keys(&self, contents: &str) -> Vec<JobKey> {
        let mut keys: Vec<JobKey> = Vec::new();
        let Some(member) = contents.find(ACTIVE_JOBS_MEMBER) else {
            return keys;
        };
        let after_member = &contents[member + ACTIVE_JOBS_MEMBER.len()..];
        // Only an object value lists jobs; `[]` or `null` means none are active.
        let Some(body) = after_member
            .trim_start()
            .strip_prefix(':')
            .map(str::trim_start)
            .and_then(|value| value.strip_prefix('{'))
        else {
            return keys;
        };
        let bytes = body.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b' ' | b'\t' | b'\n' | b'\r' | b',' => i += 1,
                b'}' => break,
                b'"' => {
                    let start = i + 1;
                    let Some(end) = find_string_end(bytes, start) else {
                        break;
                    };
                    if let Some(key) = JobKey::parse(&body[start..end]) {
                        if !keys.contains(&key) {
                            keys.push(key);
                        }
                    }
                    i = skip_value(bytes, end + 1);
                }
                _ => i += 1,
            }
        }
        keys
    }
}

/// Index of the closing quote of a string whose body starts at `start`.
fn find_string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Skip `: value` up to the next top-level `,` or the closing `}`.
fn skip_value(bytes: &[u8], mut i: usize) -> usize {
    let mut depth = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'[' => depth += 1,
            b'}' | b']' if depth == 0 => return i,
            b'}' | b']' => depth -= 1,
            b',' if depth == 0 => return i,
            b'"' => match find_string_end(bytes, i + 1) {
                Some(end) => i = end,
                None => return bytes.len(),
            },
            _ => {}
        }
        i += 1;
    }
    i
}

/// Strict parser backed by `serde_json`.
///
/// Any syntax error yields no keys at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl ActiveJobParser for JsonParser {
    fn active_job_keys(&self, contents: &str) -> Vec<JobKey> {
        let value: serde_json::Value = match serde_json::from_str(contents) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "control file is not valid JSON");
                return Vec::new();
            }
        };
        value
            .get("active_jobs")
            .and_then(serde_json::Value::as_object)
            .map(|jobs| jobs.keys().filter_map(|k| JobKey::parse(k)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
