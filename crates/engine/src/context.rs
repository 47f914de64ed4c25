// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Profiler entry point and per-context state.
//!
//! A [`Profiler`] holds the shared configuration and collaborators. Each
//! unit of work (a request, a job run, a worker iteration) opens its own
//! [`ExecutionContext`], which owns the tag stack, the job snapshot, and
//! the debugger-detection cache for that unit only.

use std::fs;
use std::sync::Arc;

use qp_core::{
    BacktraceWalker, Clock, JobKey, LogRecordBuilder, ProfilerConfig, QueryEvent, StackWalker,
    SystemClock, TagError, TagStack,
};

use crate::control::{ActiveJobParser, KeyScanner};
use crate::jobs::JobActivationCache;
use crate::slow_query::{DebugBreakTrigger, NoDebugger, SlowQueryGate, SlowQueryVerdict};
use crate::writer::{FanOut, LogWriter};

/// What happened to one query event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Profiling is switched off.
    Disabled,
    /// No job is active; nothing was captured.
    Inactive,
    Logged { fan_out: FanOut, slow_query: SlowQueryVerdict },
}

/// Shared profiler configuration and collaborators.
pub struct Profiler<C: Clock = SystemClock> {
    config: Arc<ProfilerConfig>,
    clock: C,
    walker: Arc<dyn StackWalker>,
    trigger: Arc<dyn DebugBreakTrigger>,
    parser: Arc<dyn ActiveJobParser>,
}

impl Profiler<SystemClock> {
    pub fn new(config: ProfilerConfig) -> Self {
        Self {
            config: Arc::new(config),
            clock: SystemClock,
            walker: Arc::new(BacktraceWalker),
            trigger: Arc::new(NoDebugger),
            parser: Arc::new(KeyScanner),
        }
    }
}

impl<C: Clock> Profiler<C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Profiler<C2> {
        Profiler {
            config: self.config,
            clock,
            walker: self.walker,
            trigger: self.trigger,
            parser: self.parser,
        }
    }

    pub fn with_stack_walker(mut self, walker: impl StackWalker + 'static) -> Self {
        self.walker = Arc::new(walker);
        self
    }

    pub fn with_debug_trigger(mut self, trigger: Arc<dyn DebugBreakTrigger>) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_job_parser(mut self, parser: impl ActiveJobParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Open a context: ensure the log directory and load the job snapshot.
    pub fn begin_context(&self) -> ExecutionContext<C> {
        let config = Arc::clone(&self.config);
        let mut jobs = JobActivationCache::with_parser(
            config.control_file_path(),
            config.job_check_interval(),
            self.clock.clone(),
            Arc::clone(&self.parser),
        );
        if config.enabled {
            if let Err(e) = fs::create_dir_all(&config.log_dir) {
                tracing::warn!(
                    log_dir = %config.log_dir.display(),
                    error = %e,
                    "failed to create log directory"
                );
            }
            jobs.refresh();
        }
        ExecutionContext {
            writer: LogWriter::new(config.log_dir.clone(), config.raw_log),
            slow_query: SlowQueryGate::new(
                config.slow_query_threshold_ms(),
                Arc::clone(&self.trigger),
            ),
            clock: self.clock.clone(),
            walker: Arc::clone(&self.walker),
            tags: TagStack::new(),
            jobs,
            config,
        }
    }
}

/// State owned by one unit of work.
pub struct ExecutionContext<C: Clock = SystemClock> {
    config: Arc<ProfilerConfig>,
    clock: C,
    walker: Arc<dyn StackWalker>,
    tags: TagStack,
    jobs: JobActivationCache<C>,
    writer: LogWriter,
    slow_query: SlowQueryGate,
}

impl<C: Clock> ExecutionContext<C> {
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether any job is active, re-reading the control file when stale.
    pub fn is_any_active(&mut self) -> bool {
        self.config.enabled && self.jobs.is_any_active()
    }

    /// Keys from the current snapshot.
    pub fn active_job_keys(&self) -> &[JobKey] {
        if self.config.enabled {
            self.jobs.active_job_keys()
        } else {
            &[]
        }
    }

    /// Log one query event to every active job.
    ///
    /// Tag and trace are captured once and the same record is written for
    /// each job. Never fails; write errors are only counted.
    pub fn record_query(&mut self, event: &QueryEvent<'_>) -> RecordOutcome {
        if !self.config.enabled {
            return RecordOutcome::Disabled;
        }
        if !self.jobs.is_any_active() {
            return RecordOutcome::Inactive;
        }
        self.record_active(event)
    }

    /// Log to the current snapshot's jobs without re-checking activation.
    ///
    /// Callers must already have seen [`Self::is_any_active`] return true.
    pub(crate) fn record_active(&mut self, event: &QueryEvent<'_>) -> RecordOutcome {
        let record =
            LogRecordBuilder::new(&self.tags, self.walker.as_ref(), self.config.trace_depth)
                .build(event, self.clock.epoch_micros());
        let fan_out = self.writer.write_all(self.jobs.active_job_keys(), &record);
        let slow_query = self.slow_query.check(record.duration_ms);

        RecordOutcome::Logged { fan_out, slow_query }
    }

    /// Push a context tag.
    pub fn tag(&mut self, tag: &str) -> Result<(), TagError> {
        if !self.config.enabled {
            return Err(TagError::Disabled);
        }
        self.tags.push(tag).inspect_err(|e| {
            tracing::warn!(tag, error = %e, "tag rejected");
        })
    }

    /// Pop the top tag, or everything down to and including `target`.
    ///
    /// An empty target pops the top tag. A missing target leaves the stack
    /// unchanged and returns `None`.
    pub fn untag(&mut self, target: Option<&str>) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        match target.filter(|t| !t.is_empty()) {
            None => self.tags.pop(),
            Some(target) => match self.tags.pop_until(target) {
                Ok(tag) => Some(tag),
                Err(e) => {
                    tracing::warn!(error = %e, "untag failed");
                    None
                }
            },
        }
    }

    pub fn current_tag(&self) -> Option<&str> {
        if self.config.enabled {
            self.tags.current()
        } else {
            None
        }
    }

    pub fn tags(&self) -> &TagStack {
        &self.tags
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }

    /// Return to the freshly-opened state for reuse by a later unit of work.
    ///
    /// Clears tags, drops the job snapshot, and forgets debugger detection.
    pub fn reset(&mut self) {
        self.tags.clear();
        self.jobs.invalidate();
        self.slow_query.reset();
    }

    /// Close the context.
    pub fn finish(mut self) {
        tracing::debug!(open_tags = self.tags.depth(), "execution context finished");
        self.reset();
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
