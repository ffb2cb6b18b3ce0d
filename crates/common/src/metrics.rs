use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static PAGE_RESOLVES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "explore_page_resolves_total",
        "Total on-demand listing pages resolved against the store"
    )
    .expect("register page_resolves_total")
});

pub static PAGE_RESOLVE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "explore_page_resolve_duration_seconds",
        "Listing page resolve duration in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("register page_resolve_duration")
});

pub static SNAPSHOT_REBUILDS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "explore_snapshot_rebuilds_total",
        "Total successful snapshot regenerations"
    )
    .expect("register snapshot_rebuilds_total")
});

pub static SNAPSHOT_REBUILD_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "explore_snapshot_rebuild_failures_total",
        "Total failed snapshot regenerations (previous snapshot kept)"
    )
    .expect("register snapshot_rebuild_failures_total")
});

pub static SNAPSHOT_STALE_SERVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "explore_snapshot_stale_served_total",
        "Total snapshot responses served past the revalidation window"
    )
    .expect("register snapshot_stale_served_total")
});

pub static CLIENT_STALE_SERVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "explore_client_stale_served_total",
        "Total client re-fetch failures that kept the displayed page"
    )
    .expect("register client_stale_served_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
