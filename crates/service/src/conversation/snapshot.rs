use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use models::conversation::OrderingMode;

use crate::conversation::page::{load_page, Page, PageKey};
use crate::conversation::repository::ConversationStore;
use crate::errors::ServiceError;

/// The statically known listing routes. Nothing else is generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Root listing, most viewed first.
    Top,
    /// `/new`, newest first.
    New,
}

impl Route {
    pub const ALL: [Route; 2] = [Route::Top, Route::New];

    pub fn mode(self) -> OrderingMode {
        match self {
            Route::Top => OrderingMode::MostViewed,
            Route::New => OrderingMode::Newest,
        }
    }

    /// Path segment below the listing root; `None` for the root itself.
    pub fn segment(self) -> Option<&'static str> {
        match self {
            Route::Top => None,
            Route::New => Some("new"),
        }
    }

    /// Map path segments to a route. Only `[]` and `["new"]` exist; any other
    /// shape is not found rather than silently falling back to a default.
    pub fn from_segments(segments: &[&str]) -> Result<Route, ServiceError> {
        match segments {
            [] => Ok(Route::Top),
            ["new"] => Ok(Route::New),
            _ => Err(ServiceError::invalid_route(&segments.join("/"))),
        }
    }

    /// Same as [`Route::from_segments`] for a slash-separated path.
    pub fn from_path(path: &str) -> Result<Route, ServiceError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        Self::from_segments(&segments)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.segment() {
            Some(s) => write!(f, "/{s}"),
            None => f.write_str("/"),
        }
    }
}

/// Produces the first page of a route. Stateless: rate limiting and reuse of
/// previous results belong to the caller (see `SnapshotCache`).
pub struct SnapshotBuilder<S: ?Sized> {
    store: Arc<S>,
    page_size: u64,
}

impl<S: ConversationStore + ?Sized> SnapshotBuilder<S> {
    pub fn new(store: Arc<S>, page_size: u64) -> Self {
        Self { store, page_size: page_size.max(1) }
    }

    pub fn page_size(&self) -> u64 { self.page_size }

    /// A store failure is returned as is; no partial snapshot is assembled.
    #[instrument(skip(self, route), fields(route = %route))]
    pub async fn build(&self, route: Route) -> Result<Page, ServiceError> {
        match load_page(&*self.store, PageKey::first(route.mode()), self.page_size).await {
            Ok(page) => {
                info!(total = page.total_count(), items = page.items().len(), "snapshot built");
                Ok(page)
            }
            Err(e) => {
                warn!(error = %e, "snapshot build failed");
                Err(e)
            }
        }
    }
}
