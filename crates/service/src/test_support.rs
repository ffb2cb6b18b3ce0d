#![cfg(test)]
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use models::conversation::{ConversationMeta, OrderingMode};

use crate::conversation::repository::{ConversationStore, InMemoryConversationStore};
use crate::errors::ServiceError;

/// Deterministic fixtures with scrambled views and timestamps so neither
/// ordering coincides with insertion order; views repeat to exercise ties.
pub fn sample(n: usize) -> Vec<ConversationMeta> {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    (0..n)
        .map(|i| ConversationMeta {
            id: format!("c{i:03}"),
            title: format!("Conversation {i}"),
            excerpt: Some(format!("excerpt {i}")),
            author: Some(format!("author{}", i % 3)),
            views: ((i * 37) % 11) as i64,
            created_at: (base + Duration::minutes(((i * 7) % 13) as i64 * 60 + i as i64)).into(),
        })
        .collect()
}

/// In-memory SQLite with the schema applied; one connection so the database
/// outlives individual queries.
pub async fn memory_db() -> anyhow::Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Store wrapper that counts calls and can be switched into failure.
pub struct FlakyStore {
    inner: InMemoryConversationStore,
    failing: AtomicBool,
    panicking: AtomicBool,
    count_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(items: Vec<ConversationMeta>) -> Self {
        Self {
            inner: InMemoryConversationStore::new(items),
            failing: AtomicBool::new(false),
            panicking: AtomicBool::new(false),
            count_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

    /// Make store calls panic, as a bug inside a driver would.
    pub fn set_panicking(&self, panicking: bool) { self.panicking.store(panicking, Ordering::SeqCst); }

    pub fn list_calls(&self) -> usize { self.list_calls.load(Ordering::SeqCst) }

    pub fn count_calls(&self) -> usize { self.count_calls.load(Ordering::SeqCst) }

    pub async fn insert(&self, item: ConversationMeta) { self.inner.insert(item).await; }

    fn check(&self) -> Result<(), ServiceError> {
        if self.panicking.load(Ordering::SeqCst) {
            panic!("store driver panicked");
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::StoreUnavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for FlakyStore {
    async fn count(&self) -> Result<u64, ServiceError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.count().await
    }

    async fn list(&self, mode: OrderingMode, offset: u64, limit: u64) -> Result<Vec<ConversationMeta>, ServiceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.list(mode, offset, limit).await
    }
}
