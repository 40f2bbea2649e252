//! Per-call span attributes and metrics for gateway requests.

use crate::observability::metrics;
use std::time::{Duration, Instant};
use tracing::Span;

/// Helper struct for tracking one admin API call
#[derive(Debug)]
pub struct OperationTracker {
    operation: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTracker {
    pub fn new(operation: &'static str, span: Span) -> Self {
        Self {
            operation,
            start: Instant::now(),
            span,
        }
    }

    pub fn record_success(&self) {
        self.finish("success", true);
    }

    /// 404 is a normal lookup result, recorded apart from failures
    pub fn record_not_found(&self) {
        self.finish("not_found", true);
    }

    pub fn record_error(&self, error_kind: &str, error_message: &str) {
        self.span.record("error.message", error_message);
        self.finish(error_kind, false);
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn finish(&self, outcome: &str, success: bool) {
        let elapsed = self.elapsed();
        self.span.record("operation.success", success);
        self.span
            .record("operation.duration_ms", u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        metrics::record_gateway_request(self.operation, outcome, elapsed.as_secs_f64());
    }
}
