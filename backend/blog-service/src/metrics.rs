//! Prometheus metrics for blog-service.
//!
//! Collectors are registered in the default registry on first use and served
//! by the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Query cache events (hit/miss/invalidate) per cache.
    pub static ref QUERY_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "blog_query_cache_events_total",
        "Query cache events segmented by cache and outcome",
        &["cache", "event"]
    )
    .expect("failed to register blog_query_cache_events_total");

    /// Mutations (comment/like/post/user writes) by kind and result.
    pub static ref MUTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_mutations_total",
        "Mutations segmented by kind and result",
        &["kind", "result"]
    )
    .expect("failed to register blog_mutations_total");

    /// Feed pages served by ordering.
    pub static ref FEED_PAGES_SERVED: IntCounterVec = register_int_counter_vec!(
        "blog_feed_pages_served_total",
        "Feed pages served segmented by ordering",
        &["ordering"]
    )
    .expect("failed to register blog_feed_pages_served_total");
}

/// Count one mutation outcome.
pub fn record_mutation<T, E>(kind: &str, result: &Result<T, E>) {
    let outcome = if result.is_ok() { "success" } else { "error" };
    MUTATIONS_TOTAL.with_label_values(&[kind, outcome]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
