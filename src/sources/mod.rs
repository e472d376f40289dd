pub mod api;
pub mod challenge;
pub mod traits;
pub mod types;
pub mod web;

pub use api::ApiSource;
pub use traits::{FetchOutcome, ListingSource};
pub use web::WebSource;

/// Browser user-agent sent with every outbound request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
