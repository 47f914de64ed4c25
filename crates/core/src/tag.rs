// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context tag stack.
//!
//! Tags label the business operation that subsequent queries belong to.
//! The stack is owned by one execution context and cleared when that
//! context ends.

use thiserror::Error;

/// Maximum number of tags on one stack.
pub const MAX_TAG_DEPTH: usize = 64;

/// Maximum tag length in bytes; longer tags are truncated on push.
pub const MAX_TAG_LEN: usize = 256;

/// Errors reported by tag operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("tag stack overflow (max {max})")]
    StackFull { max: usize },
    #[error("tag '{0}' not found in stack")]
    NotFound(String),
    #[error("profiling is disabled")]
    Disabled,
}

/// Bounded stack of context tags.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagStack {
    tags: Vec<String>,
}

impl TagStack {
    pub fn new() -> Self {
        Self { tags: Vec::new() }
    }

    /// Push a tag, truncating it to [`MAX_TAG_LEN`] bytes.
    ///
    /// Rejected without mutation when the stack already holds
    /// [`MAX_TAG_DEPTH`] entries.
    pub fn push(&mut self, tag: &str) -> Result<(), TagError> {
        if self.tags.len() >= MAX_TAG_DEPTH {
            return Err(TagError::StackFull { max: MAX_TAG_DEPTH });
        }
        self.tags.push(truncate_to_boundary(tag, MAX_TAG_LEN).to_string());
        Ok(())
    }

    /// Remove and return the top tag.
    pub fn pop(&mut self) -> Option<String> {
        self.tags.pop()
    }

    /// Pop every tag down to and including the topmost entry equal to `target`.
    ///
    /// On a miss the stack is left untouched.
    pub fn pop_until(&mut self, target: &str) -> Result<String, TagError> {
        let Some(index) = self.tags.iter().rposition(|t| t == target) else {
            return Err(TagError::NotFound(target.to_string()));
        };
        self.tags.truncate(index + 1);
        Ok(self.tags.pop().unwrap_or_default())
    }

    /// The top tag, if any.
    pub fn current(&self) -> Option<&str> {
        self.tags.last().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn depth(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tags from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
pub(crate) fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
#[path = "tag_tests.rs"]
mod tests;
