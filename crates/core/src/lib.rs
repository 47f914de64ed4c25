// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! qp-core: value types and per-context state for the query profiler

pub mod macros;

pub mod clock;
pub mod config;
pub mod escape;
pub mod job;
pub mod query;
pub mod record;
pub mod tag;
pub mod time_fmt;
pub mod trace;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, ProfilerConfig, CONTROL_FILE_NAME};
pub use escape::{escape, escape_into, EscapeMode};
pub use job::{JobKey, MAX_JOB_KEY_LEN};
pub use query::{serialize_params, ParamValue, QueryStatus};
pub use record::{LogRecord, LogRecordBuilder, QueryEvent};
pub use tag::{TagError, TagStack, MAX_TAG_DEPTH, MAX_TAG_LEN};
pub use time_fmt::{format_epoch_seconds, format_log_timestamp};
#[cfg(any(test, feature = "test-support"))]
pub use trace::FakeStackWalker;
pub use trace::{
    capture_json, BacktraceWalker, NoStackWalker, RawFrame, SerializedTrace, StackWalker,
    TraceFrame, TRACE_BUFFER_SIZE,
};
