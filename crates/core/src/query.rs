// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query outcome and bound parameter types.

use crate::escape::{escape_into, EscapeMode};

/// Outcome of a query as observed by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Ok,
    Err,
}

crate::simple_display! {
    QueryStatus {
        Ok => "ok",
        Err => "err",
    }
}

impl QueryStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            Self::Ok
        } else {
            Self::Err
        }
    }
}

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    /// Binary values are logged lossily as UTF-8.
    Bytes(Vec<u8>),
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Serialize parameters as a JSON array of strings, `null` for SQL NULL.
///
/// Returns `None` for an empty slice so the `params` field is omitted.
pub fn serialize_params(params: &[ParamValue]) -> Option<String> {
    if params.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(params.len() * 8 + 2);
    out.push('[');
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let text = match param {
            ParamValue::Null => {
                out.push_str("null");
                continue;
            }
            ParamValue::Int(n) => n.to_string(),
            ParamValue::Float(n) => n.to_string(),
            ParamValue::Text(s) => s.clone(),
            ParamValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        };
        out.push('"');
        escape_into(&mut out, &text, EscapeMode::Json);
        out.push('"');
    }
    out.push(']');
    Some(out)
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
