use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(Serialize, ToSchema)]
pub struct ConversationMetaDoc {
    pub id: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub views: i64,
    /// RFC 3339 timestamp
    pub created_at: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageDoc {
    /// `top` or `new`
    pub mode: String,
    /// 0-based
    pub page_index: u64,
    pub total_count: u64,
    pub items: Vec<ConversationMetaDoc>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::conversations::list,
        crate::routes::explore::top,
    ),
    components(
        schemas(
            HealthResponse,
            ConversationMetaDoc,
            PageDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "explore")
    )
)]
pub struct ApiDoc;
