use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use common::types::TOTAL_COUNT_HEADER;
use models::conversation::ConversationMeta;

use crate::client::error::ClientError;
use crate::conversation::page::{Page, PageKey};
use crate::conversation::repository::ConversationStore;
use crate::conversation::resolver::PageResolver;
use crate::conversation::snapshot::Route;
use crate::pagination::index_to_wire;

/// Where the client gets live pages from.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, key: PageKey) -> Result<Page, ClientError>;
}

/// In-process source: resolve directly against the store.
#[async_trait]
impl<S: ConversationStore + ?Sized> PageSource for PageResolver<S> {
    async fn fetch(&self, key: PageKey) -> Result<Page, ClientError> {
        Ok(self.resolve_key(key).await?)
    }
}

/// Source backed by the HTTP listing endpoint.
#[derive(Clone, Debug)]
pub struct HttpPageSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPageSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn listing_url(&self) -> String { format!("{}/api/conversations", self.base_url) }

    pub fn snapshot_url(&self, route: Route) -> String {
        match route.segment() {
            Some(s) => format!("{}/explore/{}", self.base_url, s),
            None => format!("{}/explore", self.base_url),
        }
    }

    /// Fetch the regenerated first page for `route`, used to seed a client.
    pub async fn snapshot(&self, route: Route) -> Result<Page, ClientError> {
        let res = self.client.get(self.snapshot_url(route)).send().await?;
        if res.status() != StatusCode::OK {
            return Err(ClientError::Status(res.status().as_u16()));
        }
        Ok(res.json::<Page>().await?)
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, key: PageKey) -> Result<Page, ClientError> {
        let page = index_to_wire(key.page_index).to_string();
        let res = self
            .client
            .get(self.listing_url())
            .query(&[("type", key.mode.as_param()), ("page", page.as_str())])
            .send()
            .await?;
        if res.status() != StatusCode::OK {
            return Err(ClientError::Status(res.status().as_u16()));
        }
        let total_count = res
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| ClientError::Decode(format!("missing or invalid {TOTAL_COUNT_HEADER} header")))?;
        let items = res.json::<Vec<ConversationMeta>>().await?;
        debug!(key = %key, total = total_count, items = items.len(), "fetched page over http");
        Ok(Page::new(key, total_count, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::conversation::repository::InMemoryConversationStore;
    use crate::test_support::{sample, FlakyStore};
    use models::conversation::OrderingMode;

    #[test]
    fn urls_are_built_from_base() {
        let src = HttpPageSource::new("http://localhost:8080/");
        assert_eq!(src.listing_url(), "http://localhost:8080/api/conversations");
        assert_eq!(src.snapshot_url(Route::Top), "http://localhost:8080/explore");
        assert_eq!(src.snapshot_url(Route::New), "http://localhost:8080/explore/new");
    }

    #[tokio::test]
    async fn resolver_source_returns_requested_key() {
        let resolver = PageResolver::new(Arc::new(InMemoryConversationStore::new(sample(12))), 5);
        let key = PageKey::new(OrderingMode::MostViewed, 2);
        let page = resolver.fetch(key).await.unwrap();
        assert_eq!(page.key(), key);
        assert_eq!(page.items().len(), 2);
    }

    #[tokio::test]
    async fn resolver_source_maps_store_errors() {
        let store = Arc::new(FlakyStore::new(sample(2)));
        store.set_failing(true);
        let resolver = PageResolver::new(store, 5);
        let err = resolver.fetch(PageKey::first(OrderingMode::Newest)).await.unwrap_err();
        assert!(matches!(err, ClientError::Source(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let src = HttpPageSource::new("http://127.0.0.1:9");
        let err = src.fetch(PageKey::first(OrderingMode::Newest)).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
