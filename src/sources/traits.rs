use crate::models::Listing;
use crate::sources::types::SearchFilters;
use async_trait::async_trait;

/// Tagged result of one fetch attempt against an external source.
///
/// Callers decide what to do with each variant instead of the source
/// swallowing failures internally.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Listings retrieved and validated
    Success(Vec<Listing>),
    /// The source refused automated access (HTTP 403, challenge page)
    Blocked(String),
    /// Network failure, unexpected status, or undecodable payload
    TransportError(String),
}

/// Common trait for all listing sources
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the current listings matching the filters
    async fn fetch(&self, filters: &SearchFilters) -> FetchOutcome;

    /// Get the name of the listing source
    fn source_name(&self) -> &'static str;
}
