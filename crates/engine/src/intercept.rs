// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query interception middleware.
//!
//! A database client implements [`QueryExecutor`]; wrapping it in
//! [`Profiled`] times each call and hands the outcome to the execution
//! context without changing what the caller sees.

use qp_core::{serialize_params, Clock, ParamValue, QueryEvent, QueryStatus, SystemClock};

use crate::context::{ExecutionContext, RecordOutcome};

/// Kind of client call being intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// One-shot statement.
    Query,
    /// Statement preparation; never logged on its own.
    Prepare,
    /// Execution of a prepared statement with bound parameters.
    Execute,
}

qp_core::simple_display! {
    CallKind {
        Query => "query",
        Prepare => "prepare",
        Execute => "execute",
    }
}

/// One client call as seen by the middleware.
#[derive(Debug, Clone, Copy)]
pub struct QueryCall<'a> {
    pub kind: CallKind,
    pub sql: &'a str,
    pub params: &'a [ParamValue],
}

impl<'a> QueryCall<'a> {
    pub fn query(sql: &'a str) -> Self {
        Self { kind: CallKind::Query, sql, params: &[] }
    }

    pub fn prepare(sql: &'a str) -> Self {
        Self { kind: CallKind::Prepare, sql, params: &[] }
    }

    pub fn execute(sql: &'a str, params: &'a [ParamValue]) -> Self {
        Self { kind: CallKind::Execute, sql, params }
    }
}

/// The wrapped database operation.
pub trait QueryExecutor {
    type Output;
    type Error;

    fn execute(&mut self, call: &QueryCall<'_>) -> Result<Self::Output, Self::Error>;
}

/// Middleware around a [`QueryExecutor`].
///
/// Implementations must return the inner result unchanged.
pub trait QueryInterceptor {
    fn intercept<E: QueryExecutor>(
        &mut self,
        call: &QueryCall<'_>,
        inner: &mut E,
    ) -> Result<E::Output, E::Error>;
}

impl<C: Clock> QueryInterceptor for ExecutionContext<C> {
    fn intercept<E: QueryExecutor>(
        &mut self,
        call: &QueryCall<'_>,
        inner: &mut E,
    ) -> Result<E::Output, E::Error> {
        if call.kind == CallKind::Prepare || !self.is_any_active() {
            return inner.execute(call);
        }

        let started = self.clock().now();
        let result = inner.execute(call);
        let elapsed = self.clock().now().saturating_duration_since(started);

        let params = serialize_params(call.params);
        let mut event = QueryEvent::new(call.sql)
            .status(QueryStatus::from_success(result.is_ok()))
            .duration_ms(elapsed.as_secs_f64() * 1000.0);
        if let Some(params) = params.as_deref() {
            event = event.params(params);
        }
        if let RecordOutcome::Logged { fan_out, .. } = self.record_active(&event) {
            if fan_out.failed > 0 {
                tracing::debug!(kind = %call.kind, failed = fan_out.failed, "query partially logged");
            }
        }
        result
    }
}

/// An executor whose calls are profiled through an execution context.
pub struct Profiled<'c, E, C: Clock = SystemClock> {
    inner: E,
    ctx: &'c mut ExecutionContext<C>,
}

impl<'c, E, C: Clock> Profiled<'c, E, C> {
    pub fn new(inner: E, ctx: &'c mut ExecutionContext<C>) -> Self {
        Self { inner, ctx }
    }

    /// The context, for tagging between calls.
    pub fn context(&mut self) -> &mut ExecutionContext<C> {
        self.ctx
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: QueryExecutor, C: Clock> QueryExecutor for Profiled<'_, E, C> {
    type Output = E::Output;
    type Error = E::Error;

    fn execute(&mut self, call: &QueryCall<'_>) -> Result<Self::Output, Self::Error> {
        self.ctx.intercept(call, &mut self.inner)
    }
}

#[cfg(test)]
#[path = "intercept_tests.rs"]
mod tests;
