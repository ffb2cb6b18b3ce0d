//! Service layer for the conversation explore listing.
//! - `conversation`: store adapter, snapshot building and caching, on-demand pages.
//! - `client`: the consumer side that keeps a displayed page in sync with live data.
//! - `pagination`: page-index arithmetic shared by both sides.

pub mod errors;
pub mod pagination;
pub mod conversation;
pub mod client;
#[cfg(test)]
pub mod test_support;
