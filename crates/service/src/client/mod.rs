//! Consumer side of the listing.
//!
//! A [`Reconciler`] holds the page currently on screen, seeded from a
//! snapshot. [`ListingClient`] drives it: navigation changes the page key,
//! the new page is fetched from a [`PageSource`], and only a result whose key
//! is still current replaces what is displayed.

pub mod error;
pub mod reconcile;
pub mod source;
pub mod listing;

pub use error::ClientError;
pub use listing::ListingClient;
pub use reconcile::{Outcome, Reconciler, ViewState};
pub use source::{HttpPageSource, PageSource};
