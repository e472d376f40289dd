use serde::{Deserialize, Serialize};

/// Search parameters for the listings API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Two-letter country code of the API portal
    #[serde(default = "default_country")]
    pub country: String,
    /// "sale" or "rent"
    #[serde(default = "default_operation")]
    pub operation: String,
    /// Property category, e.g. "homes"
    #[serde(default = "default_property_type")]
    pub property_type: String,
    /// Geo center of the search area as "lat,lon"
    #[serde(default = "default_center")]
    pub center: String,
    /// Search radius in meters around the center
    #[serde(default = "default_distance")]
    pub distance: u32,
    /// Minimum price (EUR)
    pub min_price: Option<u64>,
    /// Maximum price (EUR)
    pub max_price: Option<u64>,
    /// Minimum number of bedrooms
    pub min_bedrooms: Option<u32>,
    #[serde(default)]
    pub has_lift: bool,
    #[serde(default)]
    pub has_parking_space: bool,
    /// Restrict to recent publications ("W" = last week)
    pub since_date: Option<String>,
}

fn default_country() -> String {
    "es".to_string()
}

fn default_operation() -> String {
    "sale".to_string()
}

fn default_property_type() -> String {
    "homes".to_string()
}

fn default_center() -> String {
    // Madrid center
    "40.4167,-3.70325".to_string()
}

fn default_distance() -> u32 {
    10_000
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            country: default_country(),
            operation: default_operation(),
            property_type: default_property_type(),
            center: default_center(),
            distance: default_distance(),
            min_price: Some(80_000),
            max_price: Some(150_000),
            min_bedrooms: Some(3),
            has_lift: true,
            has_parking_space: true,
            since_date: None,
        }
    }
}
