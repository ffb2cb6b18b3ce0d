use std::cmp::Ordering;
use std::fmt;

use chrono::Utc;
use sea_orm::{
    entity::prelude::*, ActiveModelTrait, DatabaseConnection, FromQueryResult, PaginatorTrait, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conversation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub views: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Read-only listing projection of a conversation. `views` and `created_at`
/// drive the two orderings; the remaining fields are display-only.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct ConversationMeta {
    pub id: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub views: i64,
    pub created_at: DateTimeWithTimeZone,
}

impl From<Model> for ConversationMeta {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            excerpt: m.excerpt,
            author: m.author,
            views: m.views,
            created_at: m.created_at,
        }
    }
}

/// The two listing orders. Wire names match the `type` query parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderingMode {
    #[serde(rename = "new")]
    Newest,
    #[default]
    #[serde(rename = "top")]
    MostViewed,
}

impl OrderingMode {
    pub fn as_param(self) -> &'static str {
        match self {
            OrderingMode::Newest => "new",
            OrderingMode::MostViewed => "top",
        }
    }

    /// `new` selects newest-first; anything else, including no value, is most-viewed.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some(p) if p.eq_ignore_ascii_case("new") => OrderingMode::Newest,
            _ => OrderingMode::MostViewed,
        }
    }

    pub fn sort_column(self) -> Column {
        match self {
            OrderingMode::Newest => Column::CreatedAt,
            OrderingMode::MostViewed => Column::Views,
        }
    }

    /// Total order used by every store: sort key descending, then `id` ascending.
    pub fn compare(self, a: &ConversationMeta, b: &ConversationMeta) -> Ordering {
        let primary = match self {
            OrderingMode::Newest => b.created_at.cmp(&a.created_at),
            OrderingMode::MostViewed => b.views.cmp(&a.views),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

impl fmt::Display for OrderingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Total number of conversations; ordering never changes cardinality.
pub async fn count(db: &DatabaseConnection) -> Result<u64, errors::ModelError> {
    Entity::find()
        .count(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Largest offset or limit the SQL drivers accept; both bind as signed 64-bit.
pub const MAX_WINDOW: u64 = i64::MAX as u64;

/// One window of the listing under `mode`. An offset past the end yields an empty vec.
pub async fn list_meta(
    db: &DatabaseConnection,
    mode: OrderingMode,
    offset: u64,
    limit: u64,
) -> Result<Vec<ConversationMeta>, errors::ModelError> {
    if limit == 0 {
        return Err(errors::ModelError::Validation("limit must be > 0".into()));
    }
    if offset >= MAX_WINDOW {
        return Ok(Vec::new());
    }
    let limit = limit.min(MAX_WINDOW);
    Entity::find()
        .select_only()
        .columns([
            Column::Id,
            Column::Title,
            Column::Excerpt,
            Column::Author,
            Column::Views,
            Column::CreatedAt,
        ])
        .order_by_desc(mode.sort_column())
        .order_by_asc(Column::Id)
        .offset(offset)
        .limit(limit)
        .into_model::<ConversationMeta>()
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Insert payload; used by seeding and tests, not by the listing surface.
#[derive(Clone, Debug)]
pub struct NewConversation {
    pub id: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub content: String,
    pub views: i64,
    pub created_at: DateTimeWithTimeZone,
}

impl NewConversation {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            title: title.into(),
            excerpt: None,
            author: None,
            content: String::new(),
            views: 0,
            created_at: Utc::now().into(),
        }
    }
}

pub fn validate(new: &NewConversation) -> Result<(), errors::ModelError> {
    if new.id.trim().is_empty() {
        return Err(errors::ModelError::Validation("id must not be empty".into()));
    }
    if new.title.trim().is_empty() {
        return Err(errors::ModelError::Validation("title must not be empty".into()));
    }
    if new.views < 0 {
        return Err(errors::ModelError::Validation("views must be non-negative".into()));
    }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, new: NewConversation) -> Result<Model, errors::ModelError> {
    validate(&new)?;
    let am = ActiveModel {
        id: Set(new.id),
        title: Set(new.title),
        excerpt: Set(new.excerpt),
        author: Set(new.author),
        content: Set(new.content),
        views: Set(new.views),
        created_at: Set(new.created_at),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
