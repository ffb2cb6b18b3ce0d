//! Server side of the listing: where conversation pages come from.

pub mod repository;
pub mod page;
pub mod snapshot;
pub mod resolver;
pub mod revalidate;

pub use models::conversation::{ConversationMeta, OrderingMode};
pub use page::{Page, PageKey};
pub use repository::{ConversationStore, InMemoryConversationStore, SeaOrmConversationStore};
pub use resolver::PageResolver;
pub use revalidate::{Clock, Freshness, ManualClock, Served, SnapshotCache, SystemClock};
pub use snapshot::{Route, SnapshotBuilder};
