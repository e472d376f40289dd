use crate::history::History;
use crate::notify::Notifier;
use crate::sources::traits::{FetchOutcome, ListingSource};
use crate::sources::types::SearchFilters;
use tracing::{info, warn};

/// Counters reported by a single watch pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub new: usize,
    pub notified: usize,
}

/// One watch pass: fetch, drop already-seen listings, notify the rest.
///
/// The caller owns the history and persists it afterwards. Blocked and
/// failed fetches are logged and treated as an empty result set, and a
/// notification failure never aborts the pass. New listings are recorded as
/// seen whether or not their notification was delivered.
pub async fn run_once(
    source: &dyn ListingSource,
    notifier: Option<&dyn Notifier>,
    history: &mut History,
    filters: &SearchFilters,
) -> RunSummary {
    let listings = match source.fetch(filters).await {
        FetchOutcome::Success(listings) => listings,
        FetchOutcome::Blocked(reason) => {
            warn!("{} blocked this run: {reason}", source.source_name());
            Vec::new()
        }
        FetchOutcome::TransportError(detail) => {
            warn!("{} fetch failed: {detail}", source.source_name());
            Vec::new()
        }
    };

    let mut summary = RunSummary {
        fetched: listings.len(),
        ..Default::default()
    };
    info!(
        "Fetched {} listings from {}",
        summary.fetched,
        source.source_name()
    );

    let fresh = history.filter_new(listings);
    summary.new = fresh.len();

    for listing in &fresh {
        info!(
            "New listing {}: {} ({} €)",
            listing.id, listing.title, listing.price
        );

        match notifier {
            Some(notifier) => match notifier.notify(listing).await {
                Ok(()) => summary.notified += 1,
                Err(e) => warn!("Notification for {} failed: {e:#}", listing.id),
            },
            None => warn!(
                "Messaging credentials missing, skipping notification for {}",
                listing.id
            ),
        }
    }

    summary
}
