//! Listing source trait.

use async_trait::async_trait;

use crate::error::FetchResult;

/// Produces the raw HTML of the search-results page.
///
/// Implementations: [`crate::fetch::HttpSource`] for the live site,
/// [`crate::fetch::SnapshotSource`] for sandboxed runs against a local
/// snapshot, and mocks in [`crate::testing`].
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch(&self) -> FetchResult<String>;
}
