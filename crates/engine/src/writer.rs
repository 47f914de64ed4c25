// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job log file writer.
//!
//! Each record is appended to `<job_key>.jsonl` and, when enabled, to
//! `<job_key>.raw.log` for every active job. Every append opens the file,
//! takes an exclusive lock, writes the whole line in one call, unlocks and
//! closes, so concurrent processes never interleave partial lines.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use qp_core::{
    escape_into, format_epoch_seconds, format_log_timestamp, EscapeMode, JobKey, LogRecord,
};
use thiserror::Error;

use crate::log_paths;

/// Per-job write failures. Reported via tracing, never propagated.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("job key {0:?} is not usable as a file name")]
    InvalidJobKey(String),
    #[error("failed to append {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of writing one record to every active job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Jobs whose enabled formats were all written.
    pub written: usize,
    /// Jobs with at least one failed write.
    pub failed: usize,
}

/// Appends log records to per-job files in `log_dir`.
#[derive(Debug, Clone)]
pub struct LogWriter {
    log_dir: PathBuf,
    raw_log: bool,
}

impl LogWriter {
    pub fn new(log_dir: PathBuf, raw_log: bool) -> Self {
        Self { log_dir, raw_log }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Write `record` for every job in `jobs`.
    ///
    /// A failure for one job or format does not stop the others.
    pub fn write_all(&self, jobs: &[JobKey], record: &LogRecord) -> FanOut {
        let mut fan_out = FanOut::default();
        if jobs.is_empty() {
            return fan_out;
        }
        let timestamp = self.raw_log.then(|| format_log_timestamp(record.captured_at_micros));
        for job in jobs {
            if self.write_job(job, record, timestamp.as_deref()) {
                fan_out.written += 1;
            } else {
                fan_out.failed += 1;
            }
        }
        fan_out
    }

    fn write_job(&self, job: &JobKey, record: &LogRecord, timestamp: Option<&str>) -> bool {
        if !job.is_path_safe() {
            let e = WriteError::InvalidJobKey(job.to_string());
            tracing::warn!(job_key = %job, error = %e, "skipping job log");
            return false;
        }

        let mut ok = true;
        let path = log_paths::jsonl_log_path(&self.log_dir, job.as_str());
        if let Err(e) = append_locked(&path, &format_jsonl(job, record)) {
            tracing::warn!(job_key = %job, error = %e, "failed to write jsonl log");
            ok = false;
        }

        if let Some(timestamp) = timestamp {
            let path = log_paths::raw_log_path(&self.log_dir, job.as_str());
            if let Err(e) = append_locked(&path, &format_raw(record, timestamp)) {
                tracing::warn!(job_key = %job, error = %e, "failed to write raw log");
                ok = false;
            }
        }
        ok
    }
}

/// Append `text` to `path` under an exclusive lock with a single write.
fn append_locked(path: &Path, text: &str) -> Result<(), WriteError> {
    let io_err = |source: io::Error| WriteError::Io { path: path.to_path_buf(), source };
    let mut file = OpenOptions::new().create(true).append(true).open(path).map_err(io_err)?;
    FileExt::lock_exclusive(&file).map_err(io_err)?;
    let result = file.write_all(text.as_bytes());
    let _ = FileExt::unlock(&file);
    result.map_err(io_err)
}

/// One JSON-lines record, newline included.
///
/// Key order is fixed: `k`, `q`, `tag`, `params`, `trace`, `s`,
/// `duration_ms`, `ts`. Optional keys are omitted when absent.
pub fn format_jsonl(job: &JobKey, record: &LogRecord) -> String {
    let mut line = String::with_capacity(64 + record.query.len());
    line.push_str("{\"k\":\"");
    escape_into(&mut line, job.as_str(), EscapeMode::Json);
    line.push_str("\",\"q\":\"");
    escape_into(&mut line, &record.query, EscapeMode::Json);
    line.push('"');
    if let Some(tag) = &record.tag {
        line.push_str(",\"tag\":\"");
        escape_into(&mut line, tag, EscapeMode::Json);
        line.push('"');
    }
    if let Some(params) = &record.params {
        line.push_str(",\"params\":");
        line.push_str(params);
    }
    if let Some(trace) = &record.trace {
        line.push_str(",\"trace\":");
        line.push_str(trace.as_str());
    }
    if let Some(status) = record.status {
        line.push_str(&format!(",\"s\":\"{}\"", status));
    }
    if let Some(ms) = record.duration_ms {
        line.push_str(&format!(",\"duration_ms\":{:.3}", ms));
    }
    line.push_str(",\"ts\":");
    line.push_str(&format_epoch_seconds(record.captured_at_micros));
    line.push_str("}\n");
    line
}

/// One human-readable entry, trailing newline included.
///
/// ```text
/// [2026-01-30 08:14:09.123] [ok] [1.500ms] [checkout] SELECT 1
///   params: ["42"]
///   <- OrderRepo#save() src\/repo.rs:88
/// ```
pub fn format_raw(record: &LogRecord, timestamp: &str) -> String {
    let mut out = String::with_capacity(64 + record.query.len());
    out.push('[');
    out.push_str(timestamp);
    out.push_str("] ");
    if let Some(status) = record.status {
        out.push_str(&format!("[{}] ", status));
    }
    if let Some(ms) = record.duration_ms {
        out.push_str(&format!("[{:.3}ms] ", ms));
    }
    if let Some(tag) = &record.tag {
        out.push('[');
        escape_into(&mut out, tag, EscapeMode::RawLog);
        out.push_str("] ");
    }
    escape_into(&mut out, &record.query, EscapeMode::RawLog);
    out.push('\n');
    if let Some(params) = &record.params {
        out.push_str("  params: ");
        out.push_str(params);
        out.push('\n');
    }
    if let Some(trace) = &record.trace {
        for frame in trace.frames() {
            out.push_str("  <- ");
            escape_into(&mut out, &frame.call, EscapeMode::RawLog);
            out.push_str("() ");
            escape_into(&mut out, &frame.file, EscapeMode::RawLog);
            out.push_str(&format!(":{}\n", frame.line));
        }
    }
    out
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
