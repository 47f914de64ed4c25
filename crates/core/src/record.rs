// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log record assembly.
//!
//! One [`LogRecord`] is built per query event and shared read-only by every
//! active job's writes; the job key is attached at write time.

use crate::query::QueryStatus;
use crate::tag::TagStack;
use crate::trace::{capture_json, SerializedTrace, StackWalker};

/// A query event as reported by the event source.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEvent<'a> {
    pub query: &'a str,
    pub status: Option<QueryStatus>,
    /// Measured duration; negative or non-finite means "not measured".
    pub duration_ms: Option<f64>,
    /// Pre-serialized JSON array of bound parameters.
    pub params: Option<&'a str>,
}

impl<'a> QueryEvent<'a> {
    pub fn new(query: &'a str) -> Self {
        Self { query, ..Self::default() }
    }

    pub fn status(mut self, status: QueryStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn params(mut self, params: &'a str) -> Self {
        self.params = Some(params);
        self
    }
}

/// The enriched, immutable record written for every active job.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub query: String,
    pub tag: Option<String>,
    pub trace: Option<SerializedTrace>,
    pub params: Option<String>,
    pub status: Option<QueryStatus>,
    pub duration_ms: Option<f64>,
    /// Capture time in microseconds since the Unix epoch.
    pub captured_at_micros: u64,
}

/// Captures tag and trace context once per event.
pub struct LogRecordBuilder<'a> {
    tags: &'a TagStack,
    walker: &'a dyn StackWalker,
    trace_depth: usize,
}

impl<'a> LogRecordBuilder<'a> {
    pub fn new(tags: &'a TagStack, walker: &'a dyn StackWalker, trace_depth: usize) -> Self {
        Self { tags, walker, trace_depth }
    }

    pub fn build(&self, event: &QueryEvent<'_>, captured_at_micros: u64) -> LogRecord {
        LogRecord {
            query: event.query.to_string(),
            tag: self.tags.current().map(str::to_string),
            trace: capture_json(self.walker, self.trace_depth),
            params: event
                .params
                .map(str::trim)
                .filter(|p| !p.is_empty() && *p != "[]")
                .map(str::to_string),
            status: event.status,
            duration_ms: event.duration_ms.filter(|d| d.is_finite() && *d >= 0.0),
            captured_at_micros,
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
