// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Profiling job identity.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Maximum job key length in bytes.
pub const MAX_JOB_KEY_LEN: usize = 256;

/// Opaque key of a profiling job, 1..=256 bytes.
///
/// A job is active while its key appears in the control file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobKey(SmolStr);

impl JobKey {
    /// Validate and wrap a key; empty or over-long keys are rejected.
    pub fn parse(key: &str) -> Option<Self> {
        if key.is_empty() || key.len() > MAX_JOB_KEY_LEN {
            None
        } else {
            Some(Self(SmolStr::new(key)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key can be used as a file name inside the log directory.
    pub fn is_path_safe(&self) -> bool {
        let key = self.as_str();
        key != "."
            && key != ".."
            && !key.contains(['/', '\\', '\0'])
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for JobKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JobKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for JobKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
