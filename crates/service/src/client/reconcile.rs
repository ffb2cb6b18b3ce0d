use std::sync::Arc;

use tracing::{debug, warn};

use common::metrics::CLIENT_STALE_SERVED_TOTAL;
use models::conversation::OrderingMode;

use crate::client::error::ClientError;
use crate::conversation::page::{Page, PageKey};
use crate::pagination::{Pagination, PaginationState};

/// What is on screen. `Refreshing` keeps showing the previous page while the
/// page for `pending` is in flight; there is no empty or loading state.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewState {
    Settled { displayed: Arc<Page> },
    Refreshing { displayed: Arc<Page>, pending: PageKey },
}

impl ViewState {
    pub fn displayed(&self) -> &Arc<Page> {
        match self {
            ViewState::Settled { displayed } | ViewState::Refreshing { displayed, .. } => displayed,
        }
    }

    pub fn pending(&self) -> Option<PageKey> {
        match self {
            ViewState::Settled { .. } => None,
            ViewState::Refreshing { pending, .. } => Some(*pending),
        }
    }

    pub fn is_refreshing(&self) -> bool { self.pending().is_some() }
}

/// Result of handing a fetched page (or its failure) back to the [`Reconciler`].
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The page replaced the displayed one.
    Applied(PageKey),
    /// The key was superseded before the result arrived; nothing changed.
    Discarded(PageKey),
    /// The fetch for the current key failed; the previous page stays.
    StaleServed { key: PageKey, error: ClientError },
}

impl Outcome {
    pub fn is_applied(&self) -> bool { matches!(self, Outcome::Applied(_)) }
}

/// Two-state machine behind the displayed listing page.
#[derive(Debug)]
pub struct Reconciler {
    state: ViewState,
    page_size: u64,
}

impl Reconciler {
    /// Start settled on a snapshot page; nothing needs fetching before it can be shown.
    pub fn seed(snapshot: impl Into<Arc<Page>>, page_size: u64) -> Self {
        Self { state: ViewState::Settled { displayed: snapshot.into() }, page_size: page_size.max(1) }
    }

    pub fn state(&self) -> &ViewState { &self.state }

    pub fn displayed(&self) -> &Arc<Page> { self.state.displayed() }

    /// The key the user asked for last: the pending one if any, else the displayed one.
    pub fn current_key(&self) -> PageKey {
        self.state.pending().unwrap_or_else(|| self.displayed().key())
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.displayed().total_count(), self.page_size)
    }

    /// Position of the current key within the latest known total.
    pub fn pagination_state(&self) -> PaginationState {
        PaginationState::new(self.displayed().total_count(), self.page_size).at(self.current_key().page_index)
    }

    pub fn next_key(&self) -> PageKey {
        let key = self.current_key();
        PageKey::new(key.mode, self.pagination().next(key.page_index))
    }

    pub fn prev_key(&self) -> PageKey {
        let key = self.current_key();
        PageKey::new(key.mode, self.pagination().prev(key.page_index))
    }

    pub fn key_at(&self, page_index: u64) -> PageKey {
        PageKey::new(self.current_key().mode, self.pagination().clamp(page_index))
    }

    /// Switching order starts over at the first page.
    pub fn mode_key(&self, mode: OrderingMode) -> PageKey { PageKey::first(mode) }

    /// Ask for `key`. Returns the key to fetch, or `None` when nothing needs
    /// fetching: `key` is already pending, or it is the page on screen (which
    /// also abandons any other pending key).
    pub fn request(&mut self, key: PageKey) -> Option<PageKey> {
        if self.state.pending() == Some(key) {
            return None;
        }
        let displayed = Arc::clone(self.displayed());
        if displayed.key() == key {
            self.state = ViewState::Settled { displayed };
            return None;
        }
        debug!(from = %displayed.key(), to = %key, "page key changed");
        self.state = ViewState::Refreshing { displayed, pending: key };
        Some(key)
    }

    /// Re-fetch the displayed key, e.g. to replace a snapshot seed with live
    /// data. `None` while another key is pending: that fetch already brings
    /// live data for the key asked for last, which must keep winning.
    pub fn revalidate(&mut self) -> Option<PageKey> {
        if self.state.is_refreshing() {
            return None;
        }
        let displayed = Arc::clone(self.displayed());
        let key = displayed.key();
        self.state = ViewState::Refreshing { displayed, pending: key };
        Some(key)
    }

    /// Hand back the result of fetching `key`. Only the currently pending key
    /// may change state; anything else is dropped.
    pub fn settle(&mut self, key: PageKey, result: Result<Page, ClientError>) -> Outcome {
        let displayed = match &self.state {
            ViewState::Refreshing { displayed, pending } if *pending == key => Arc::clone(displayed),
            _ => {
                debug!(key = %key, "discarding superseded page");
                return Outcome::Discarded(key);
            }
        };
        match result {
            Ok(page) => {
                self.state = ViewState::Settled { displayed: Arc::new(page) };
                Outcome::Applied(key)
            }
            Err(error) => {
                CLIENT_STALE_SERVED_TOTAL.inc();
                warn!(key = %key, error = %error, "page fetch failed; keeping displayed page");
                self.state = ViewState::Settled { displayed };
                Outcome::StaleServed { key, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample;

    fn page(mode: OrderingMode, index: u64, total: u64, n: usize) -> Page {
        Page::new(PageKey::new(mode, index), total, sample(n))
    }

    #[test]
    fn seeded_state_is_settled_on_snapshot() {
        let snap = page(OrderingMode::MostViewed, 0, 40, 2);
        let r = Reconciler::seed(snap.clone(), 20);
        assert_eq!(r.state(), &ViewState::Settled { displayed: Arc::new(snap) });
        assert_eq!(r.pagination().page_count(), 2);
    }

    #[test]
    fn key_change_keeps_previous_page_until_resolved() {
        let first = page(OrderingMode::Newest, 0, 4, 2);
        let mut r = Reconciler::seed(first.clone(), 2);

        let key = r.request(PageKey::new(OrderingMode::Newest, 1)).unwrap();
        assert!(r.state().is_refreshing());
        assert_eq!(**r.displayed(), first);
        assert!(!r.displayed().is_empty());

        let second = page(OrderingMode::Newest, 1, 4, 2);
        assert_eq!(r.settle(key, Ok(second.clone())), Outcome::Applied(key));
        assert_eq!(r.state(), &ViewState::Settled { displayed: Arc::new(second) });
    }

    #[test]
    fn last_key_wins_in_arrival_order() {
        let mut r = Reconciler::seed(page(OrderingMode::Newest, 0, 60, 2), 20);
        let k1 = r.request(PageKey::new(OrderingMode::Newest, 1)).unwrap();
        let k2 = r.request(PageKey::new(OrderingMode::Newest, 2)).unwrap();

        assert_eq!(r.settle(k1, Ok(page(OrderingMode::Newest, 1, 60, 2))), Outcome::Discarded(k1));
        assert_eq!(r.displayed().page_index(), 0);
        assert_eq!(r.settle(k2, Ok(page(OrderingMode::Newest, 2, 60, 2))), Outcome::Applied(k2));
        assert_eq!(r.displayed().page_index(), 2);
    }

    #[test]
    fn last_key_wins_in_reverse_arrival_order() {
        let mut r = Reconciler::seed(page(OrderingMode::Newest, 0, 60, 2), 20);
        let k1 = r.request(PageKey::new(OrderingMode::Newest, 1)).unwrap();
        let k2 = r.request(PageKey::new(OrderingMode::Newest, 2)).unwrap();

        assert!(r.settle(k2, Ok(page(OrderingMode::Newest, 2, 60, 2))).is_applied());
        assert_eq!(r.settle(k1, Ok(page(OrderingMode::Newest, 1, 60, 2))), Outcome::Discarded(k1));
        assert_eq!(r.displayed().page_index(), 2);
        assert!(!r.state().is_refreshing());
    }

    #[test]
    fn failure_keeps_displayed_page_unchanged() {
        let shown = page(OrderingMode::MostViewed, 0, 30, 3);
        let mut r = Reconciler::seed(shown.clone(), 10);
        let key = r.request(PageKey::new(OrderingMode::MostViewed, 1)).unwrap();

        let outcome = r.settle(key, Err(ClientError::Status(503)));
        assert_eq!(outcome, Outcome::StaleServed { key, error: ClientError::Status(503) });
        assert_eq!(r.state(), &ViewState::Settled { displayed: Arc::new(shown) });
    }

    #[test]
    fn failure_for_superseded_key_is_discarded() {
        let mut r = Reconciler::seed(page(OrderingMode::MostViewed, 0, 30, 3), 10);
        let k1 = r.request(PageKey::new(OrderingMode::MostViewed, 1)).unwrap();
        let k2 = r.request(PageKey::new(OrderingMode::Newest, 0)).unwrap();
        assert_eq!(r.settle(k1, Err(ClientError::Transport("reset".into()))), Outcome::Discarded(k1));
        assert_eq!(r.state().pending(), Some(k2));
    }

    #[test]
    fn repeated_or_displayed_keys_need_no_fetch() {
        let mut r = Reconciler::seed(page(OrderingMode::Newest, 0, 30, 3), 10);
        assert_eq!(r.request(PageKey::first(OrderingMode::Newest)), None);

        let k1 = PageKey::new(OrderingMode::Newest, 1);
        assert_eq!(r.request(k1), Some(k1));
        assert_eq!(r.request(k1), None);

        // Going back to the page on screen abandons the pending one.
        assert_eq!(r.request(PageKey::first(OrderingMode::Newest)), None);
        assert!(!r.state().is_refreshing());
        assert_eq!(r.settle(k1, Ok(page(OrderingMode::Newest, 1, 30, 3))), Outcome::Discarded(k1));
    }

    #[test]
    fn revalidate_refetches_displayed_key() {
        let mut r = Reconciler::seed(page(OrderingMode::Newest, 0, 30, 3), 10);
        let key = r.revalidate().unwrap();
        assert_eq!(key, PageKey::first(OrderingMode::Newest));
        let fresh = page(OrderingMode::Newest, 0, 31, 4);
        assert!(r.settle(key, Ok(fresh)).is_applied());
        assert_eq!(r.displayed().total_count(), 31);
        assert_eq!(r.pagination().page_count(), 4);
    }

    #[test]
    fn revalidate_keeps_pending_navigation() {
        let mut r = Reconciler::seed(page(OrderingMode::Newest, 0, 30, 3), 10);
        let k1 = r.request(PageKey::new(OrderingMode::Newest, 1)).unwrap();

        assert_eq!(r.revalidate(), None);
        assert_eq!(r.state().pending(), Some(k1));
        assert_eq!(r.current_key(), k1);

        assert_eq!(r.settle(k1, Ok(page(OrderingMode::Newest, 1, 30, 3))), Outcome::Applied(k1));
        assert_eq!(r.displayed().page_index(), 1);

        // Once settled, revalidation targets the newly displayed key.
        assert_eq!(r.revalidate(), Some(k1));
    }

    #[test]
    fn navigation_keys_are_clamped() {
        let r = Reconciler::seed(page(OrderingMode::Newest, 0, 25, 3), 10);
        assert_eq!(r.prev_key(), PageKey::new(OrderingMode::Newest, 0));
        assert_eq!(r.next_key(), PageKey::new(OrderingMode::Newest, 1));
        assert_eq!(r.key_at(9), PageKey::new(OrderingMode::Newest, 2));
        assert_eq!(r.mode_key(OrderingMode::MostViewed), PageKey::first(OrderingMode::MostViewed));
        assert_eq!(r.pagination_state().current(), 0);
    }
}
