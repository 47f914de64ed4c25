// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slow-query debugger breakpoint.
//!
//! When a query's duration exceeds the configured threshold and a debugger
//! is attached, a break is requested so the developer lands at the slow
//! call site. Debugger detection runs at most once per execution context.

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DebuggerError {
    #[error("debugger detection failed: {0}")]
    Detection(String),
    #[error("debugger break failed: {0}")]
    Break(String),
}

/// Host debugger facility.
pub trait DebugBreakTrigger: Send + Sync {
    fn is_debugger_attached(&self) -> Result<bool, DebuggerError>;
    fn trigger_break(&self) -> Result<(), DebuggerError>;
}

/// No debugger facility available; never attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDebugger;

impl DebugBreakTrigger for NoDebugger {
    fn is_debugger_attached(&self) -> Result<bool, DebuggerError> {
        Ok(false)
    }

    fn trigger_break(&self) -> Result<(), DebuggerError> {
        Ok(())
    }
}

/// What the gate decided for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlowQueryVerdict {
    /// No threshold configured, or no duration measured.
    Disabled,
    BelowThreshold,
    /// Slow, but no debugger is attached.
    NoDebugger,
    BreakTriggered,
    /// Slow and attached, but the break request failed.
    BreakFailed,
}

qp_core::simple_display! {
    SlowQueryVerdict {
        Disabled => "disabled",
        BelowThreshold => "below_threshold",
        NoDebugger => "no_debugger",
        BreakTriggered => "break_triggered",
        BreakFailed => "break_failed",
    }
}

/// Per-context slow-query check with a cached attachment probe.
pub struct SlowQueryGate {
    threshold_ms: Option<f64>,
    trigger: Arc<dyn DebugBreakTrigger>,
    attached: Option<bool>,
}

impl SlowQueryGate {
    pub fn new(threshold_ms: Option<f64>, trigger: Arc<dyn DebugBreakTrigger>) -> Self {
        Self { threshold_ms, trigger, attached: None }
    }

    /// Evaluate one measured duration.
    pub fn check(&mut self, duration_ms: Option<f64>) -> SlowQueryVerdict {
        let (Some(threshold), Some(duration)) = (self.threshold_ms, duration_ms) else {
            return SlowQueryVerdict::Disabled;
        };
        if duration <= threshold {
            return SlowQueryVerdict::BelowThreshold;
        }
        if !self.debugger_attached() {
            return SlowQueryVerdict::NoDebugger;
        }
        match self.trigger.trigger_break() {
            Ok(()) => {
                tracing::info!(duration_ms = duration, threshold_ms = threshold, "slow query break");
                SlowQueryVerdict::BreakTriggered
            }
            Err(e) => {
                tracing::warn!(error = %e, "slow query break failed");
                SlowQueryVerdict::BreakFailed
            }
        }
    }

    /// Forget the cached attachment probe.
    pub fn reset(&mut self) {
        self.attached = None;
    }

    fn debugger_attached(&mut self) -> bool {
        if let Some(attached) = self.attached {
            return attached;
        }
        let attached = self.trigger.is_debugger_attached().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "debugger detection failed");
            false
        });
        self.attached = Some(attached);
        attached
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::RecordingTrigger;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::{DebugBreakTrigger, DebuggerError};

    /// Trigger that counts probes and breaks.
    #[derive(Debug, Default)]
    pub struct RecordingTrigger {
        attached: AtomicBool,
        fail_detection: AtomicBool,
        probes: AtomicUsize,
        breaks: AtomicUsize,
    }

    impl RecordingTrigger {
        pub fn attached() -> Self {
            let trigger = Self::default();
            trigger.attached.store(true, Ordering::SeqCst);
            trigger
        }

        pub fn detached() -> Self {
            Self::default()
        }

        /// A trigger whose detection always errors.
        pub fn failing() -> Self {
            let trigger = Self::default();
            trigger.fail_detection.store(true, Ordering::SeqCst);
            trigger
        }

        pub fn set_attached(&self, attached: bool) {
            self.attached.store(attached, Ordering::SeqCst);
        }

        pub fn probes(&self) -> usize {
            self.probes.load(Ordering::SeqCst)
        }

        pub fn breaks(&self) -> usize {
            self.breaks.load(Ordering::SeqCst)
        }
    }

    impl DebugBreakTrigger for RecordingTrigger {
        fn is_debugger_attached(&self) -> Result<bool, DebuggerError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.fail_detection.load(Ordering::SeqCst) {
                return Err(DebuggerError::Detection("probe unavailable".to_string()));
            }
            Ok(self.attached.load(Ordering::SeqCst))
        }

        fn trigger_break(&self) -> Result<(), DebuggerError> {
            self.breaks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "slow_query_tests.rs"]
mod tests;
