use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument};

use models::conversation::OrderingMode;

use crate::client::reconcile::{Outcome, Reconciler, ViewState};
use crate::client::source::PageSource;
use crate::conversation::page::{Page, PageKey};
use crate::pagination::PaginationState;

/// Async driver around a [`Reconciler`].
///
/// Navigation computes the next key through the pagination controller,
/// records it, and fetches without holding the state lock, so overlapping
/// navigations are allowed and the latest key wins.
pub struct ListingClient<P: ?Sized> {
    source: Arc<P>,
    state: Mutex<Reconciler>,
}

impl<P: PageSource + ?Sized> ListingClient<P> {
    pub fn new(source: Arc<P>, snapshot: Page, page_size: u64) -> Self {
        Self { source, state: Mutex::new(Reconciler::seed(snapshot, page_size)) }
    }

    pub async fn view(&self) -> ViewState { self.state.lock().await.state().clone() }

    pub async fn displayed(&self) -> Arc<Page> { Arc::clone(self.state.lock().await.displayed()) }

    pub async fn current_key(&self) -> PageKey { self.state.lock().await.current_key() }

    pub async fn pagination(&self) -> PaginationState { self.state.lock().await.pagination_state() }

    /// Move to `key`. `None` when no fetch was needed.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn navigate(&self, key: PageKey) -> Option<Outcome> {
        let to_fetch = self.state.lock().await.request(key)?;
        Some(self.fetch_and_settle(to_fetch).await)
    }

    pub async fn next_page(&self) -> Option<Outcome> {
        let key = self.state.lock().await.next_key();
        self.navigate(key).await
    }

    pub async fn prev_page(&self) -> Option<Outcome> {
        let key = self.state.lock().await.prev_key();
        self.navigate(key).await
    }

    pub async fn go_to(&self, page_index: u64) -> Option<Outcome> {
        let key = self.state.lock().await.key_at(page_index);
        self.navigate(key).await
    }

    pub async fn switch_mode(&self, mode: OrderingMode) -> Option<Outcome> {
        let key = self.state.lock().await.mode_key(mode);
        self.navigate(key).await
    }

    /// Re-fetch what is on screen. `None` while a navigation is in flight.
    pub async fn revalidate(&self) -> Option<Outcome> {
        let key = self.state.lock().await.revalidate()?;
        Some(self.fetch_and_settle(key).await)
    }

    async fn fetch_and_settle(&self, key: PageKey) -> Outcome {
        let result = self.source.fetch(key).await;
        let outcome = self.state.lock().await.settle(key, result);
        if let Outcome::Applied(k) = &outcome {
            info!(key = %k, "listing page displayed");
        }
        outcome
    }
}
