use std::fmt;

use serde::{Deserialize, Serialize};

use models::conversation::{ConversationMeta, OrderingMode};

use crate::conversation::repository::ConversationStore;
use crate::errors::ServiceError;

/// Identity of a requested page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageKey {
    pub mode: OrderingMode,
    pub page_index: u64,
}

impl PageKey {
    pub fn new(mode: OrderingMode, page_index: u64) -> Self { Self { mode, page_index } }

    pub fn first(mode: OrderingMode) -> Self { Self::new(mode, 0) }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.mode, self.page_index)
    }
}

/// One materialized listing page. Built once per resolve and never patched;
/// callers replace a page wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    items: Vec<ConversationMeta>,
    total_count: u64,
    mode: OrderingMode,
    page_index: u64,
}

impl Page {
    pub fn new(key: PageKey, total_count: u64, items: Vec<ConversationMeta>) -> Self {
        Self { items, total_count, mode: key.mode, page_index: key.page_index }
    }

    pub fn items(&self) -> &[ConversationMeta] { &self.items }

    pub fn into_items(self) -> Vec<ConversationMeta> { self.items }

    pub fn total_count(&self) -> u64 { self.total_count }

    pub fn mode(&self) -> OrderingMode { self.mode }

    pub fn page_index(&self) -> u64 { self.page_index }

    pub fn key(&self) -> PageKey { PageKey::new(self.mode, self.page_index) }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

/// Count, then fetch the window for `key`. Shared by the snapshot builder and
/// the on-demand resolver so both produce identical pages for index 0.
pub(crate) async fn load_page<S>(store: &S, key: PageKey, page_size: u64) -> Result<Page, ServiceError>
where
    S: ConversationStore + ?Sized,
{
    let total_count = store.count().await?;
    let offset = key.page_index.saturating_mul(page_size);
    if offset >= total_count {
        return Ok(Page::new(key, total_count, Vec::new()));
    }
    let items = store.list(key.mode, offset, page_size).await?;
    Ok(Page::new(key, total_count, items))
}
