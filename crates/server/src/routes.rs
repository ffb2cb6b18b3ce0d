use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::{metrics::encode_metrics, types::Health};
use configs::ExploreConfig;
use service::conversation::{Clock, ConversationStore, PageResolver, SnapshotBuilder, SnapshotCache, SystemClock};

use crate::openapi::ApiDoc;

pub mod conversations;
pub mod explore;

/// Shared handler state. Both sides read the same store with the same page size.
#[derive(Clone)]
pub struct AppState {
    pub snapshots: Arc<SnapshotCache<dyn ConversationStore>>,
    pub resolver: Arc<PageResolver<dyn ConversationStore>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ConversationStore>, explore: &ExploreConfig) -> Self {
        Self::with_clock(store, explore, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn ConversationStore>, explore: &ExploreConfig, clock: Arc<dyn Clock>) -> Self {
        let builder = SnapshotBuilder::new(Arc::clone(&store), explore.page_size);
        let snapshots = Arc::new(SnapshotCache::new(builder, clock, explore.revalidate_window()));
        let resolver = Arc::new(PageResolver::new(store, explore.page_size));
        Self { snapshots, resolver }
    }

    pub fn page_size(&self) -> u64 { self.resolver.page_size() }
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> impl IntoResponse {
    encode_metrics()
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Build the application router: listing API, snapshot routes and ops endpoints.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let ops = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json));

    let api = Router::new().route("/api/conversations", get(conversations::list));

    let explore = Router::new()
        .route("/explore", get(explore::top))
        .route("/explore/*route", get(explore::by_path));

    ops.merge(api)
        .merge(explore)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
