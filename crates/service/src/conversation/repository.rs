use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tokio::sync::RwLock;

use models::conversation::{self, ConversationMeta, OrderingMode};

use crate::errors::ServiceError;

/// Read-only query surface over conversation storage.
///
/// `list` returns at most `limit` items starting at `offset` under `mode`'s
/// order, and fewer (possibly none) at the end of the collection. An offset
/// past the end is not an error. Implementations do not cache.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn count(&self) -> Result<u64, ServiceError>;
    async fn list(&self, mode: OrderingMode, offset: u64, limit: u64) -> Result<Vec<ConversationMeta>, ServiceError>;
}

/// SeaORM-backed store implementation.
pub struct SeaOrmConversationStore {
    pub db: DatabaseConnection,
}

impl SeaOrmConversationStore {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait]
impl ConversationStore for SeaOrmConversationStore {
    async fn count(&self) -> Result<u64, ServiceError> {
        Ok(conversation::count(&self.db).await?)
    }

    async fn list(&self, mode: OrderingMode, offset: u64, limit: u64) -> Result<Vec<ConversationMeta>, ServiceError> {
        Ok(conversation::list_meta(&self.db, mode, offset, limit).await?)
    }
}

/// In-process store; ordering matches the SQL store exactly.
#[derive(Default)]
pub struct InMemoryConversationStore {
    items: RwLock<Vec<ConversationMeta>>,
}

impl InMemoryConversationStore {
    pub fn new(items: Vec<ConversationMeta>) -> Self {
        Self { items: RwLock::new(items) }
    }

    pub async fn insert(&self, item: ConversationMeta) {
        let mut items = self.items.write().await;
        items.retain(|c| c.id != item.id);
        items.push(item);
    }

    pub async fn len(&self) -> usize { self.items.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.items.read().await.is_empty() }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn count(&self) -> Result<u64, ServiceError> {
        Ok(self.items.read().await.len() as u64)
    }

    async fn list(&self, mode: OrderingMode, offset: u64, limit: u64) -> Result<Vec<ConversationMeta>, ServiceError> {
        if limit == 0 {
            return Err(ServiceError::Validation("limit must be > 0".into()));
        }
        let mut sorted = self.items.read().await.clone();
        sorted.sort_by(|a, b| mode.compare(a, b));
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(sorted.into_iter().skip(skip).take(take).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_db, sample};
    use models::conversation::NewConversation;

    #[tokio::test]
    async fn in_memory_orders_and_windows() {
        let store = InMemoryConversationStore::new(sample(7));
        assert_eq!(store.count().await.unwrap(), 7);

        let newest = store.list(OrderingMode::Newest, 0, 3).await.unwrap();
        assert_eq!(newest.len(), 3);
        assert!(newest.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let top = store.list(OrderingMode::MostViewed, 5, 3).await.unwrap();
        assert_eq!(top.len(), 2);
        assert!(top.windows(2).all(|w| w[0].views >= w[1].views));
    }

    #[tokio::test]
    async fn in_memory_offset_past_end_is_empty() {
        let store = InMemoryConversationStore::new(sample(3));
        assert!(store.list(OrderingMode::Newest, 3, 10).await.unwrap().is_empty());
        assert!(store.list(OrderingMode::Newest, u64::MAX, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn in_memory_rejects_zero_limit() {
        let store = InMemoryConversationStore::default();
        let err = store.list(OrderingMode::Newest, 0, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn in_memory_insert_replaces_same_id() {
        let store = InMemoryConversationStore::new(sample(2));
        let mut again = sample(1).remove(0);
        again.views = 999;
        store.insert(again).await;
        assert_eq!(store.len().await, 2);
        let top = store.list(OrderingMode::MostViewed, 0, 1).await.unwrap();
        assert_eq!(top[0].views, 999);
    }

    #[tokio::test]
    async fn sea_orm_store_matches_in_memory_order() -> anyhow::Result<()> {
        let db = memory_db().await?;
        let items = sample(9);
        for c in &items {
            conversation::create(&db, NewConversation {
                id: c.id.clone(),
                title: c.title.clone(),
                excerpt: c.excerpt.clone(),
                author: c.author.clone(),
                content: String::from("[]"),
                views: c.views,
                created_at: c.created_at,
            })
            .await?;
        }
        let sql = SeaOrmConversationStore::new(db);
        let mem = InMemoryConversationStore::new(items);

        assert_eq!(sql.count().await?, 9);
        for mode in [OrderingMode::Newest, OrderingMode::MostViewed] {
            for offset in [0, 4, 8, 9] {
                let a: Vec<String> = sql.list(mode, offset, 4).await?.into_iter().map(|c| c.id).collect();
                let b: Vec<String> = mem.list(mode, offset, 4).await?.into_iter().map(|c| c.id).collect();
                assert_eq!(a, b, "mode={mode} offset={offset}");
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn sea_orm_store_resolves_far_pages_as_empty() -> anyhow::Result<()> {
        use crate::conversation::resolver::PageResolver;
        use std::sync::Arc;

        let db = memory_db().await?;
        for c in sample(3) {
            conversation::create(&db, NewConversation {
                id: c.id,
                title: c.title,
                excerpt: c.excerpt,
                author: c.author,
                content: String::new(),
                views: c.views,
                created_at: c.created_at,
            })
            .await?;
        }
        let sql = Arc::new(SeaOrmConversationStore::new(db));
        assert!(sql.list(OrderingMode::Newest, u64::MAX, 20).await?.is_empty());

        let resolver = PageResolver::new(sql, 20);
        for index in [1, u64::MAX / 2, u64::MAX] {
            let page = resolver.resolve(OrderingMode::Newest, index).await?;
            assert!(page.is_empty(), "index {index}");
            assert_eq!(page.total_count(), 3);
            assert_eq!(page.page_index(), index);
        }
        Ok(())
    }

    #[tokio::test]
    async fn sea_orm_store_failure_is_store_unavailable() -> anyhow::Result<()> {
        use sea_orm::ConnectionTrait;
        let db = memory_db().await?;
        db.execute_unprepared("DROP TABLE conversation").await?;
        let sql = SeaOrmConversationStore::new(db);
        let err = sql.count().await.unwrap_err();
        assert!(matches!(err, ServiceError::StoreUnavailable(_)));
        Ok(())
    }
}
