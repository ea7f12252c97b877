//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions. Recording goes
//! through the `metrics` facade; without an installed recorder every call is
//! a no-op, which is what tests rely on.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all LexRank metrics
pub const METRICS_PREFIX: &str = "lexrank";

/// SLO-aligned histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
];

/// Buckets for full PageRank runs (batch job, much slower)
pub const RUN_BUCKETS: &[f64] = &[
    0.1,
    0.5,
    1.0,
    5.0,
    15.0,
    30.0,
    60.0,
    120.0,
    300.0,
    900.0,
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // PageRank run metrics
    describe_counter!(
        format!("{}_pagerank_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Total PageRank runs by outcome"
    );

    describe_histogram!(
        format!("{}_pagerank_run_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "PageRank run duration in seconds"
    );

    describe_gauge!(
        format!("{}_pagerank_documents", METRICS_PREFIX),
        Unit::Count,
        "Documents scored by the last successful run"
    );

    describe_gauge!(
        format!("{}_pagerank_iterations", METRICS_PREFIX),
        Unit::Count,
        "Iterations used by the last successful run"
    );

    describe_gauge!(
        format!("{}_pagerank_converged", METRICS_PREFIX),
        Unit::Count,
        "1 if the last successful run converged, 0 otherwise"
    );

    // Citation validation metrics
    describe_counter!(
        format!("{}_citation_validations_total", METRICS_PREFIX),
        Unit::Count,
        "Citation validations by type and outcome"
    );

    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a finished PageRank run
pub fn record_pagerank_run(
    duration_secs: f64,
    success: bool,
    documents: usize,
    iterations: usize,
    converged: bool,
) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_pagerank_runs_total", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_pagerank_run_duration_seconds", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .record(duration_secs);

    if success {
        gauge!(format!("{}_pagerank_documents", METRICS_PREFIX)).set(documents as f64);
        gauge!(format!("{}_pagerank_iterations", METRICS_PREFIX)).set(iterations as f64);
        gauge!(format!("{}_pagerank_converged", METRICS_PREFIX))
            .set(if converged { 1.0 } else { 0.0 });
    }
}

/// Helper to record a citation validation outcome
pub fn record_citation_validation(citation_type: &str, valid: bool) {
    counter!(
        format!("{}_citation_validations_total", METRICS_PREFIX),
        "type" => citation_type.to_string(),
        "outcome" => if valid { "valid" } else { "invalid" }.to_string()
    )
    .increment(1);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_sorted() {
        for buckets in [LATENCY_BUCKETS, RUN_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }
    }

    #[test]
    fn test_recording_without_recorder() {
        let metrics = RequestMetrics::start("POST", "/v1/authority/calculate");
        metrics.finish(200);
        record_pagerank_run(1.5, true, 10, 12, true);
        record_citation_validation("law", false);
        record_cache(true, "citation_validity");
        // Just verify it runs without panic
    }
}
