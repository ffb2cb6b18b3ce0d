use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use common::types::TOTAL_COUNT_HEADER;
use service::conversation::OrderingMode;
use service::pagination::index_from_wire;

use crate::errors::JsonApiError;
use crate::routes::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// `new` for newest first; anything else is most viewed.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// 1-based page number. Missing, 0 or not a number means the first page.
    pub page: Option<String>,
}

impl ListQuery {
    fn page_index(&self) -> u64 {
        index_from_wire(self.page.as_deref().and_then(|p| p.trim().parse::<u64>().ok()))
    }
}

/// One listing page. The total number of conversations is in `X-Total-Count`.
#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "explore",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of conversations", body = [crate::openapi::ConversationMetaDoc]),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<impl IntoResponse, JsonApiError> {
    let mode = OrderingMode::from_param(q.kind.as_deref());
    let page = state.resolver.resolve(mode, q.page_index()).await?;
    info!(key = %page.key(), total = page.total_count(), items = page.items().len(), "listing page served");
    let total = page.total_count().to_string();
    Ok(([(TOTAL_COUNT_HEADER, total)], Json(page.into_items())))
}
