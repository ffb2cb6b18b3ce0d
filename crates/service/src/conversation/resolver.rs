use std::sync::Arc;

use tracing::{debug, instrument};

use common::metrics::{PAGE_RESOLVES_TOTAL, PAGE_RESOLVE_DURATION};
use models::conversation::OrderingMode;

use crate::conversation::page::{load_page, Page, PageKey};
use crate::conversation::repository::ConversationStore;
use crate::errors::ServiceError;

/// Serves any `(mode, page_index)` straight from the store. Every call hits
/// the store; there is no window and no route restriction.
pub struct PageResolver<S: ?Sized> {
    store: Arc<S>,
    page_size: u64,
}

impl<S: ConversationStore + ?Sized> PageResolver<S> {
    pub fn new(store: Arc<S>, page_size: u64) -> Self {
        Self { store, page_size: page_size.max(1) }
    }

    pub fn page_size(&self) -> u64 { self.page_size }

    /// An index past the last page yields an empty page with the real total.
    #[instrument(skip(self, mode), fields(mode = %mode))]
    pub async fn resolve(&self, mode: OrderingMode, page_index: u64) -> Result<Page, ServiceError> {
        self.resolve_key(PageKey::new(mode, page_index)).await
    }

    pub async fn resolve_key(&self, key: PageKey) -> Result<Page, ServiceError> {
        let timer = PAGE_RESOLVE_DURATION.start_timer();
        let page = load_page(&*self.store, key, self.page_size).await;
        timer.observe_duration();
        let page = page?;
        PAGE_RESOLVES_TOTAL.inc();
        debug!(key = %key, total = page.total_count(), items = page.items().len(), "page resolved");
        Ok(page)
    }
}
