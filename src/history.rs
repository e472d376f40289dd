use crate::models::Listing;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Set of listing identifiers that have already been notified.
///
/// Serialized as a flat JSON array so the file stays a plain list of ids.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    seen: HashSet<String>,
}

impl History {
    /// Load history from disk.
    ///
    /// A missing or corrupt file yields an empty history; the job must not
    /// fail because it has never run before.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(_) => {
                info!("No history at {}, starting empty", path.display());
                return Self::default();
            }
        };

        match serde_json::from_str(&data) {
            Ok(history) => history,
            Err(e) => {
                warn!(
                    "History file {} is unreadable ({e}), starting empty",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Overwrite the history file with the current set.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Failed to encode history")?;
        std::fs::write(path, data)
            .with_context(|| format!("Failed to write history to {}", path.display()))
    }

    /// Keep only listings whose id has not been seen, recording every
    /// emitted id as seen. Input order is preserved.
    pub fn filter_new(&mut self, listings: Vec<Listing>) -> Vec<Listing> {
        listings
            .into_iter()
            .filter(|listing| self.seen.insert(listing.id.clone()))
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
