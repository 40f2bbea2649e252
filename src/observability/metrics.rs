//! # Metrics
//!
//! Prometheus metrics for monitoring the provisioning service.
//!
//! ## Metrics Exposed
//!
//! - `maas_gateway_requests_total` - Gateway admin API calls by operation and outcome
//! - `maas_gateway_request_duration_seconds` - Duration of gateway admin API calls
//! - `maas_provisioning_total` - Provisioning workflow results by operation and outcome
//! - `maas_http_requests_total` - Requests served by the REST API

use prometheus::{Encoder, HistogramVec, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static GATEWAY_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "maas_gateway_requests_total",
            "Total number of gateway admin API requests",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create GATEWAY_REQUESTS_TOTAL metric - this should never happen")
});

static GATEWAY_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "maas_gateway_request_duration_seconds",
            "Duration of gateway admin API requests in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["operation"],
    )
    .expect("Failed to create GATEWAY_REQUEST_DURATION metric - this should never happen")
});

static PROVISIONING_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "maas_provisioning_total",
            "Total number of provisioning operations by outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create PROVISIONING_TOTAL metric - this should never happen")
});

static HTTP_REQUESTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "maas_http_requests_total",
        "Total number of REST API requests served",
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric - this should never happen")
});

/// Register every metric with the shared registry
///
/// Safe to call more than once: collectors that are already registered are skipped.
///
/// # Errors
/// Returns an error if a collector conflicts with a different one of the same name
pub fn register_metrics() -> Result<(), prometheus::Error> {
    let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
        Box::new(GATEWAY_REQUESTS_TOTAL.clone()),
        Box::new(GATEWAY_REQUEST_DURATION.clone()),
        Box::new(PROVISIONING_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
    ];
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

pub fn record_gateway_request(operation: &str, outcome: &str, duration: f64) {
    GATEWAY_REQUESTS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    GATEWAY_REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn record_provisioning(operation: &str, outcome: &str) {
    PROVISIONING_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

pub fn increment_http_requests() {
    HTTP_REQUESTS_TOTAL.inc();
}

/// Render the registry in the Prometheus text exposition format
///
/// # Errors
/// Returns an error if encoding fails
pub fn render() -> Result<Vec<u8>, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}
