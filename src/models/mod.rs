use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source a listing was fetched from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Source {
    Api,
    Web,
}

/// Core listing data model
///
/// Every field except `fetched_at` comes from the external payload; sources
/// validate raw records and reject the ones missing a required field rather
/// than building partial listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub source: Source,
    pub title: String,
    /// Asking price in euros
    pub price: u64,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
}
