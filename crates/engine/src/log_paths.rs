// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job log file path builders.
//!
//! The control file path comes from `ProfilerConfig::control_file_path`.
//!
//! Directory structure:
//! ```text
//! <log_dir>/
//!   jobs.json              # control file, written by the external tool
//!   <job_key>.jsonl        # structured log, one object per line
//!   <job_key>.raw.log      # human-readable log
//! ```

use std::path::{Path, PathBuf};

/// Build the path to a job's structured log.
pub fn jsonl_log_path(log_dir: &Path, job_key: &str) -> PathBuf {
    log_dir.join(format!("{}.jsonl", job_key))
}

/// Build the path to a job's human-readable log.
pub fn raw_log_path(log_dir: &Path, job_key: &str) -> PathBuf {
    log_dir.join(format!("{}.raw.log", job_key))
}

#[cfg(test)]
#[path = "log_paths_tests.rs"]
mod tests;
