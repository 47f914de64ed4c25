// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cached view of the active profiling jobs.
//!
//! The control file is re-read at most once per check interval. Every
//! failure (missing file, lock error, unreadable contents) degrades to
//! "no active jobs" and still counts as a refresh.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use qp_core::{Clock, JobKey};
use thiserror::Error;

use crate::control::{ActiveJobParser, KeyScanner};

/// Errors reading the control file. Never surfaced to callers.
#[derive(Debug, Error)]
pub enum ControlFileError {
    #[error("failed to read control file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to lock control file: {0}")]
    Lock(#[source] io::Error),
}

/// Time-bounded snapshot of the active job keys.
pub struct JobActivationCache<C: Clock> {
    control_path: PathBuf,
    interval: Duration,
    clock: C,
    parser: Arc<dyn ActiveJobParser>,
    keys: Vec<JobKey>,
    refreshed_at: Option<Instant>,
}

impl<C: Clock> JobActivationCache<C> {
    pub fn new(control_path: PathBuf, interval: Duration, clock: C) -> Self {
        Self::with_parser(control_path, interval, clock, Arc::new(KeyScanner))
    }

    pub fn with_parser(
        control_path: PathBuf,
        interval: Duration,
        clock: C,
        parser: Arc<dyn ActiveJobParser>,
    ) -> Self {
        Self { control_path, interval, clock, parser, keys: Vec::new(), refreshed_at: None }
    }

    pub fn control_path(&self) -> &Path {
        &self.control_path
    }

    /// Re-read the control file unconditionally.
    pub fn refresh(&mut self) {
        self.keys = match read_control_file(&self.control_path) {
            Ok(Some(contents)) => self.parser.active_job_keys(&contents),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.control_path.display(),
                    error = %e,
                    "treating control file as empty"
                );
                Vec::new()
            }
        };
        self.refreshed_at = Some(self.clock.now());
        tracing::trace!(active = self.keys.len(), "refreshed active jobs");
    }

    /// Whether any job is active, refreshing first if the snapshot is stale.
    pub fn is_any_active(&mut self) -> bool {
        if self.is_stale() {
            self.refresh();
        }
        !self.keys.is_empty()
    }

    /// Keys from the current snapshot; never triggers a refresh.
    pub fn active_job_keys(&self) -> &[JobKey] {
        &self.keys
    }

    /// Time since the last refresh, `None` if never refreshed.
    pub fn snapshot_age(&self) -> Option<Duration> {
        self.refreshed_at.map(|at| self.clock.now().saturating_duration_since(at))
    }

    /// Drop the snapshot so the next check re-reads the control file.
    pub fn invalidate(&mut self) {
        self.keys.clear();
        self.refreshed_at = None;
    }

    fn is_stale(&self) -> bool {
        self.snapshot_age().map_or(true, |age| age >= self.interval)
    }
}

/// Read the control file under a shared lock. `Ok(None)` if it does not exist.
fn read_control_file(path: &Path) -> Result<Option<String>, ControlFileError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    FileExt::lock_shared(&file).map_err(ControlFileError::Lock)?;
    let mut bytes = Vec::new();
    let result = file.read_to_end(&mut bytes);
    let _ = FileExt::unlock(&file);
    result?;
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
