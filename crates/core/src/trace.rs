// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded call-stack capture.
//!
//! A [`StackWalker`] yields raw frames innermost first; [`capture_json`]
//! turns at most `depth` of them into a serialized JSON array that fits in
//! [`TRACE_BUFFER_SIZE`] bytes. Capture never fails the caller: a walker
//! that is unavailable or yields nothing usable produces no trace.

use std::backtrace::{Backtrace, BacktraceStatus};

use serde::{Deserialize, Serialize};

use crate::escape::{escape_into, EscapeMode};

/// Upper bound on the serialized trace array, in bytes.
pub const TRACE_BUFFER_SIZE: usize = 8192;

const UNKNOWN_CALL: &str = "(unknown)";

/// One captured call-stack entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFrame {
    pub call: String,
    pub file: String,
    pub line: u32,
}

/// A frame as reported by the stack-walking facility, before labeling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    /// Owning type of the called method, if any.
    pub owner: Option<String>,
    /// Method or free function name.
    pub function: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl RawFrame {
    pub fn function(name: impl Into<String>) -> Self {
        Self { function: Some(name.into()), ..Self::default() }
    }

    pub fn method(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: Some(owner.into()), function: Some(name.into()), ..Self::default() }
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// `Owner#method`, the bare function name, or `(unknown)`.
    pub fn call_label(&self) -> String {
        let owner = self.owner.as_deref().filter(|s| !s.is_empty());
        let function = self.function.as_deref().filter(|s| !s.is_empty());
        match (owner, function) {
            (Some(owner), Some(function)) => format!("{owner}#{function}"),
            (None, Some(function)) => function.to_string(),
            _ => UNKNOWN_CALL.to_string(),
        }
    }

    pub fn to_trace_frame(&self) -> TraceFrame {
        TraceFrame {
            call: self.call_label(),
            file: self.file.clone().unwrap_or_default(),
            line: self.line.unwrap_or(0),
        }
    }
}

/// Source of call-stack snapshots.
pub trait StackWalker: Send + Sync {
    /// Up to `max_frames` frames, innermost first, excluding the walker's
    /// own frames. `None` when the facility is unavailable.
    fn walk(&self, max_frames: usize) -> Option<Vec<RawFrame>>;
}

/// A walker for hosts that do not expose a call stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStackWalker;

impl StackWalker for NoStackWalker {
    fn walk(&self, _max_frames: usize) -> Option<Vec<RawFrame>> {
        None
    }
}

/// Walks the native Rust stack via [`std::backtrace::Backtrace`].
///
/// File and line are only present when the binary carries debug info.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceWalker;

impl StackWalker for BacktraceWalker {
    fn walk(&self, max_frames: usize) -> Option<Vec<RawFrame>> {
        let backtrace = Backtrace::force_capture();
        if backtrace.status() != BacktraceStatus::Captured {
            return None;
        }
        let frames = parse_backtrace(&backtrace.to_string(), max_frames);
        if frames.is_empty() {
            None
        } else {
            Some(frames)
        }
    }
}

/// Serialized trace array, as written to the `trace` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedTrace(String);

impl SerializedTrace {
    /// Wrap an already-serialized JSON array.
    pub fn from_json(json: impl Into<String>) -> Self {
        Self(json.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Re-parse the array for display. Malformed input yields no frames.
    pub fn frames(&self) -> Vec<TraceFrame> {
        match serde_json::from_str::<Vec<TraceFrame>>(&self.0) {
            Ok(frames) => frames,
            Err(e) => {
                tracing::debug!(error = %e, "unparseable trace array");
                Vec::new()
            }
        }
    }
}

/// Capture at most `depth` frames from `walker` as a serialized array.
///
/// `depth == 0` is the disabled state. Frames that would push the array
/// past [`TRACE_BUFFER_SIZE`] are dropped along with everything after them.
pub fn capture_json(walker: &dyn StackWalker, depth: usize) -> Option<SerializedTrace> {
    if depth == 0 {
        return None;
    }
    let mut frames = walker.walk(depth)?;
    frames.truncate(depth);
    serialize_frames(&frames)
}

/// Serialize frames into a bounded JSON array; `None` when nothing fits.
pub fn serialize_frames(frames: &[RawFrame]) -> Option<SerializedTrace> {
    let mut buf = String::with_capacity(256);
    buf.push('[');
    let mut written = 0;
    let mut entry = String::with_capacity(128);
    for frame in frames {
        entry.clear();
        if written > 0 {
            entry.push(',');
        }
        entry.push_str("{\"call\":\"");
        escape_into(&mut entry, &frame.call_label(), EscapeMode::Json);
        entry.push_str("\",\"file\":\"");
        escape_into(&mut entry, frame.file.as_deref().unwrap_or(""), EscapeMode::Json);
        entry.push_str("\",\"line\":");
        entry.push_str(&frame.line.unwrap_or(0).to_string());
        entry.push('}');

        // +1 for the closing bracket
        if buf.len() + entry.len() + 1 > TRACE_BUFFER_SIZE {
            break;
        }
        buf.push_str(&entry);
        written += 1;
    }
    if written == 0 {
        return None;
    }
    buf.push(']');
    Some(SerializedTrace(buf))
}

/// Parse the `Display` form of a captured backtrace.
///
/// Leading frames that belong to the capture machinery are skipped.
fn parse_backtrace(text: &str, max_frames: usize) -> Vec<RawFrame> {
    let mut frames: Vec<RawFrame> = Vec::new();
    let mut skipping = true;
    let mut current_skipped = false;

    for line in text.lines() {
        let line = line.trim();
        if let Some(location) = line.strip_prefix("at ") {
            if current_skipped {
                continue;
            }
            if let Some(frame) = frames.last_mut() {
                if frame.file.is_none() {
                    let (file, line_no) = split_location(location);
                    frame.file = Some(file);
                    frame.line = line_no;
                }
            }
            continue;
        }

        let Some((index, symbol)) = line.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }

        if skipping && is_capture_frame(symbol) {
            current_skipped = true;
            continue;
        }
        skipping = false;
        current_skipped = false;

        if frames.len() >= max_frames {
            break;
        }
        let (owner, function) = split_symbol(symbol);
        frames.push(RawFrame { owner, function, file: None, line: None });
    }
    frames
}

/// Frames belonging to the capture machinery or the profiler itself, up to
/// the first caller frame.
fn is_capture_frame(symbol: &str) -> bool {
    let symbol = symbol.trim_start_matches('<');
    symbol.starts_with("std::backtrace")
        || symbol.starts_with("backtrace::")
        || symbol.contains("qp_core::trace::")
        || symbol.starts_with("qp_core::record::")
        || symbol.starts_with("qp_engine::")
}

/// `path:line:col` (or `path:line`) into its parts.
fn split_location(location: &str) -> (String, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next().unwrap_or_default();
    let middle = parts.next();
    let rest = parts.next();
    match (rest, middle) {
        (Some(path), Some(line)) => match line.parse() {
            Ok(n) => (path.to_string(), Some(n)),
            Err(_) => (location.to_string(), None),
        },
        (None, Some(path)) => match last.parse() {
            Ok(n) => (path.to_string(), Some(n)),
            Err(_) => (location.to_string(), None),
        },
        _ => (location.to_string(), None),
    }
}

/// Split a demangled symbol into (owning type, function name).
fn split_symbol(symbol: &str) -> (Option<String>, Option<String>) {
    let symbol = strip_hash(symbol.trim());
    if symbol.is_empty() {
        return (None, None);
    }

    // <path::Type<T> as path::Trait>::method
    if symbol.starts_with('<') {
        if let Some(idx) = symbol.rfind(">::") {
            let inner = &symbol[1..idx];
            let function = &symbol[idx + 3..];
            let type_path = inner.split(" as ").next().unwrap_or(inner);
            let owner = last_segment(&strip_generics(type_path));
            return (non_empty(owner), non_empty(function.to_string()));
        }
    }

    let plain = strip_generics(symbol);
    let mut segments = plain.rsplit("::");
    let function = segments.next().unwrap_or_default().to_string();
    let owner = segments
        .next()
        .filter(|s| s.chars().next().is_some_and(|c| c.is_ascii_uppercase()))
        .map(str::to_string);
    (owner, non_empty(function))
}

fn strip_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) => {
            head
        }
        _ => symbol,
    }
}

fn strip_generics(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    for ch in path.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn last_segment(path: &str) -> String {
    path.rsplit("::").next().unwrap_or(path).to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStackWalker;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{RawFrame, StackWalker};

    /// Walker that replays a fixed set of frames.
    #[derive(Debug, Clone, Default)]
    pub struct FakeStackWalker {
        frames: Option<Vec<RawFrame>>,
    }

    impl FakeStackWalker {
        pub fn new(frames: Vec<RawFrame>) -> Self {
            Self { frames: Some(frames) }
        }

        /// A walker whose facility is unavailable.
        pub fn unavailable() -> Self {
            Self { frames: None }
        }
    }

    impl StackWalker for FakeStackWalker {
        fn walk(&self, max_frames: usize) -> Option<Vec<RawFrame>> {
            self.frames
                .as_ref()
                .map(|frames| frames.iter().take(max_frames).cloned().collect())
        }
    }
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
