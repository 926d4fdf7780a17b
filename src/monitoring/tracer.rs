/*!
 * Structured Tracing
 * Tracing setup and spans for cross-thread invocations and checks
 *
 * Features:
 * - Trace IDs correlating a caller with the owner thread that served it
 * - JSON-formatted logs for structured parsing
 * - Thread names on every event, since every interesting event crosses one
 * - Slow-invocation warnings
 */

use crate::core::limits::SLOW_INVOCATION_THRESHOLD;
use std::time::Instant;
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - HARNESS_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("HARNESS_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        let installed = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init();
        if installed.is_ok() {
            info!("Structured tracing initialized with JSON output");
        }
    } else {
        let installed = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init();
        if installed.is_ok() {
            info!("Structured tracing initialized");
        }
    }
}

/// Generate a unique trace ID for invocation correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one bounded invocation, from post to resolution
pub struct InvocationSpan {
    span: Span,
    start: Instant,
    thread: String,
    trace_id: String,
}

impl InvocationSpan {
    pub fn new(thread: &str, timeout_ms: u64) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "invocation",
            trace_id = %trace_id,
            thread = thread,
            timeout_ms = timeout_ms,
            duration_us = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            thread: thread.to_string(),
            trace_id,
        }
    }

    /// Get the trace ID for this invocation
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Record how the invocation resolved ("completed", "timeout", ...)
    pub fn record_outcome(&self, outcome: &str) {
        self.span.record("outcome", outcome);
    }

    /// Span to attach to work running on the owner thread
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for InvocationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_INVOCATION_THRESHOLD {
            warn!(
                trace_id = %self.trace_id,
                thread = %self.thread,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow invocation detected"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                thread = %self.thread,
                duration_us = duration.as_micros() as u64,
                "invocation resolved"
            );
        }
    }
}

/// Span for one check of a batch
pub struct CheckSpan {
    span: Span,
    start: Instant,
    name: String,
}

impl CheckSpan {
    pub fn new(name: &str) -> Self {
        let span = span!(
            Level::INFO,
            "check",
            check = name,
            duration_ms = tracing::field::Empty,
            result = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    /// Record the check result
    pub fn record_result(&self, passed: bool) {
        self.span.record("result", if passed { "pass" } else { "fail" });
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for CheckSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_ms", duration.as_millis() as u64);
        debug!(check = %self.name, duration_ms = duration.as_millis() as u64, "check finished");
    }
}

/// Helper to create an invocation span
#[inline]
pub fn span_invocation(thread: &str, timeout_ms: u64) -> InvocationSpan {
    InvocationSpan::new(thread, timeout_ms)
}

/// Helper to create a check span
#[inline]
pub fn span_check(name: &str) -> CheckSpan {
    CheckSpan::new(name)
}
