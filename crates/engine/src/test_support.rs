// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fakes shared by unit tests and the behavioral specs.

use std::path::Path;
use std::time::Duration;

use qp_core::FakeClock;

use crate::intercept::{CallKind, QueryCall, QueryExecutor};

/// Executor that records calls and simulates latency on a fake clock.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    clock: Option<FakeClock>,
    latency: Duration,
    fail: bool,
    calls: Vec<(CallKind, String)>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `clock` by `latency` on every call.
    pub fn with_latency(mut self, clock: FakeClock, latency: Duration) -> Self {
        self.clock = Some(clock);
        self.latency = latency;
        self
    }

    /// Fail every call.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> &[(CallKind, String)] {
        &self.calls
    }
}

impl QueryExecutor for ScriptedExecutor {
    type Output = usize;
    type Error = String;

    fn execute(&mut self, call: &QueryCall<'_>) -> Result<usize, String> {
        if let Some(clock) = &self.clock {
            clock.advance(self.latency);
        }
        self.calls.push((call.kind, call.sql.to_string()));
        if self.fail {
            Err(format!("{} failed", call.kind))
        } else {
            Ok(self.calls.len())
        }
    }
}

/// Write a control file listing `keys` as active.
pub fn write_control_file(log_dir: &Path, keys: &[&str]) -> std::io::Result<()> {
    let body: Vec<String> =
        keys.iter().map(|k| format!("\"{}\":{{\"started_at\":1700000000}}", k)).collect();
    let contents = format!("{{\"active_jobs\":{{{}}},\"completed_jobs\":{{}}}}", body.join(","));
    std::fs::create_dir_all(log_dir)?;
    std::fs::write(log_dir.join(qp_core::CONTROL_FILE_NAME), contents)
}
