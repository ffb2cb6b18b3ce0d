use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::debug;

use service::conversation::{Freshness, Route, Served};

use crate::errors::JsonApiError;
use crate::routes::AppState;

pub const FRESHNESS_HEADER: &str = "x-snapshot-freshness";

fn freshness_label(f: Freshness) -> &'static str {
    match f {
        Freshness::Fresh => "fresh",
        Freshness::Stale => "stale",
        Freshness::Cold => "cold",
    }
}

async fn serve(state: &AppState, route: Route) -> Result<impl IntoResponse, JsonApiError> {
    let Served { page, freshness, age } = state.snapshots.get(route).await?;
    debug!(route = %route, freshness = freshness_label(freshness), age_secs = age.as_secs(), "snapshot served");
    let cache_control = format!("public, s-maxage={}, stale-while-revalidate", state.snapshots.window().as_secs());
    Ok((
        [
            (header::CACHE_CONTROL, cache_control),
            (header::AGE, age.as_secs().to_string()),
            (header::HeaderName::from_static(FRESHNESS_HEADER), freshness_label(freshness).to_string()),
        ],
        Json(page.as_ref().clone()),
    ))
}

/// First page of the root listing, most viewed first.
#[utoipa::path(
    get,
    path = "/explore",
    tag = "explore",
    responses(
        (status = 200, description = "Snapshot page", body = crate::openapi::PageDoc),
        (status = 503, description = "No snapshot yet and the store is unavailable")
    )
)]
pub async fn top(State(state): State<AppState>) -> Result<impl IntoResponse, JsonApiError> {
    serve(&state, Route::Top).await
}

/// `/explore/new`; any other path below the root is not found.
pub async fn by_path(
    State(state): State<AppState>,
    Path(route): Path<String>,
) -> Result<impl IntoResponse, JsonApiError> {
    let route = Route::from_path(&route)?;
    serve(&state, route).await
}
