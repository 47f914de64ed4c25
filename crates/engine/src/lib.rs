// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! qp-engine: job activation, log fan-out, and query interception

pub mod context;
pub mod control;
pub mod intercept;
pub mod jobs;
pub mod log_paths;
pub mod slow_query;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod writer;

pub use context::{ExecutionContext, Profiler, RecordOutcome};
pub use control::{ActiveJobParser, JsonParser, KeyScanner};
pub use intercept::{CallKind, Profiled, QueryCall, QueryExecutor, QueryInterceptor};
pub use jobs::{ControlFileError, JobActivationCache};
#[cfg(any(test, feature = "test-support"))]
pub use slow_query::RecordingTrigger;
pub use slow_query::{
    DebugBreakTrigger, DebuggerError, NoDebugger, SlowQueryGate, SlowQueryVerdict,
};
pub use writer::{FanOut, LogWriter, WriteError};
