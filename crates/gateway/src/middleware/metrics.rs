//! Per-request latency and status metrics

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use lexrank_common::metrics::RequestMetrics;

/// Record method, matched route and status of every request
pub async fn track_requests(request: Request, next: Next) -> Response {
    // Label by route template so ids do not explode cardinality
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let tracker = RequestMetrics::start(request.method().as_str(), &endpoint);
    let response = next.run(request).await;
    tracker.finish(response.status().as_u16());

    response
}
