use crate::models::{Listing, Source};
use crate::sources::traits::{FetchOutcome, ListingSource};
use crate::sources::types::SearchFilters;
use crate::sources::USER_AGENT;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const TOKEN_URL: &str = "https://api.idealista.com/oauth/token";
const API_BASE: &str = "https://api.idealista.com/3.5";

/// Listings source backed by the vendor REST API
pub struct ApiSource {
    client: Client,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "elementList", default)]
    element_list: Vec<ApiAd>,
}

/// Raw ad payload as returned by the search endpoint
#[derive(Debug, Deserialize)]
struct ApiAd {
    #[serde(rename = "propertyCode")]
    property_code: Option<serde_json::Value>,
    price: Option<f64>,
    url: Option<String>,
    address: Option<String>,
    #[serde(rename = "suggestedTexts")]
    suggested_texts: Option<SuggestedTexts>,
}

#[derive(Debug, Deserialize)]
struct SuggestedTexts {
    title: Option<String>,
}

impl ApiSource {
    /// Exchange the client credential pair for a bearer token.
    ///
    /// Without a token the job cannot do anything useful, so every failure
    /// here is returned to the caller instead of being degraded.
    pub async fn connect(api_key: &str, api_secret: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .post(TOKEN_URL)
            .basic_auth(api_key, Some(api_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", "read")])
            .send()
            .await
            .context("Token request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Token endpoint returned {status}: {body}");
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Malformed token response")?;

        info!("Authenticated against the listings API");

        Ok(Self {
            client,
            access_token: token.access_token,
        })
    }

    fn query_params(filters: &SearchFilters) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("country", filters.country.clone()),
            ("operation", filters.operation.clone()),
            ("propertyType", filters.property_type.clone()),
            ("center", filters.center.clone()),
            ("distance", filters.distance.to_string()),
        ];

        if let Some(min_price) = filters.min_price {
            params.push(("minPrice", min_price.to_string()));
        }
        if let Some(max_price) = filters.max_price {
            params.push(("maxPrice", max_price.to_string()));
        }
        if let Some(min_bedrooms) = filters.min_bedrooms {
            params.push(("minBedrooms", min_bedrooms.to_string()));
        }
        if filters.has_lift {
            params.push(("hasLift", "true".to_string()));
        }
        if filters.has_parking_space {
            params.push(("hasParkingSpace", "true".to_string()));
        }
        if let Some(since_date) = &filters.since_date {
            params.push(("sinceDate", since_date.clone()));
        }

        params
    }
}

/// Validate a raw ad into a listing.
///
/// The ad code may arrive as a JSON number or string. Title falls back to
/// the street address; an ad missing any required field is rejected.
fn map_ad(ad: ApiAd) -> Result<Listing> {
    let id = match ad.property_code {
        Some(serde_json::Value::String(code)) => code,
        Some(serde_json::Value::Number(code)) => code.to_string(),
        _ => anyhow::bail!("ad is missing propertyCode"),
    };

    let title = ad
        .suggested_texts
        .and_then(|texts| texts.title)
        .or(ad.address)
        .ok_or_else(|| anyhow::anyhow!("ad {id} has neither title nor address"))?;

    let price = ad
        .price
        .ok_or_else(|| anyhow::anyhow!("ad {id} is missing price"))?;

    let url = ad
        .url
        .ok_or_else(|| anyhow::anyhow!("ad {id} is missing url"))?;

    Ok(Listing {
        id,
        source: Source::Api,
        title,
        price: price.round() as u64,
        url,
        fetched_at: Utc::now(),
    })
}

#[async_trait]
impl ListingSource for ApiSource {
    async fn fetch(&self, filters: &SearchFilters) -> FetchOutcome {
        let url = format!("{API_BASE}/{}/search", filters.country);
        debug!("Searching listings API: {}", url);

        let response = match self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .query(&Self::query_params(filters))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransportError(format!("search request failed: {e}")),
        };

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return FetchOutcome::Blocked(format!("listings API returned {status}"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return FetchOutcome::TransportError(format!("listings API returned {status}: {body}"));
        }

        let parsed: SearchResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => return FetchOutcome::TransportError(format!("malformed search response: {e}")),
        };

        debug!("API returned {} ads", parsed.element_list.len());

        let listings = parsed
            .element_list
            .into_iter()
            .filter_map(|ad| match map_ad(ad) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    warn!("Skipping invalid ad: {e:#}");
                    None
                }
            })
            .collect();

        FetchOutcome::Success(listings)
    }

    fn source_name(&self) -> &'static str {
        "idealista-api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ad_from(value: serde_json::Value) -> ApiAd {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn maps_complete_ad() {
        let ad = ad_from(json!({
            "propertyCode": "106752408",
            "price": 149000.0,
            "url": "https://www.idealista.com/inmueble/106752408/",
            "address": "Calle de Toledo",
            "suggestedTexts": { "title": "Piso en Calle de Toledo" }
        }));

        let listing = map_ad(ad).unwrap();
        assert_eq!(listing.id, "106752408");
        assert_eq!(listing.title, "Piso en Calle de Toledo");
        assert_eq!(listing.price, 149_000);
        assert_eq!(listing.url, "https://www.idealista.com/inmueble/106752408/");
        assert_eq!(listing.source, Source::Api);
    }

    #[test]
    fn accepts_numeric_property_code() {
        let ad = ad_from(json!({
            "propertyCode": 106752408,
            "price": 95000.0,
            "url": "https://www.idealista.com/inmueble/106752408/",
            "address": "Calle Mayor"
        }));

        assert_eq!(map_ad(ad).unwrap().id, "106752408");
    }

    #[test]
    fn title_falls_back_to_address() {
        let ad = ad_from(json!({
            "propertyCode": "1",
            "price": 100000.0,
            "url": "http://x/1",
            "address": "Calle Mayor 5"
        }));

        assert_eq!(map_ad(ad).unwrap().title, "Calle Mayor 5");
    }

    #[test]
    fn rejects_ad_without_property_code() {
        let ad = ad_from(json!({
            "price": 100000.0,
            "url": "http://x/1",
            "address": "Calle Mayor 5"
        }));

        assert!(map_ad(ad).is_err());
    }

    #[test]
    fn rejects_ad_without_price_or_url() {
        let no_price = ad_from(json!({
            "propertyCode": "1",
            "url": "http://x/1",
            "address": "Calle Mayor 5"
        }));
        assert!(map_ad(no_price).is_err());

        let no_url = ad_from(json!({
            "propertyCode": "1",
            "price": 100000.0,
            "address": "Calle Mayor 5"
        }));
        assert!(map_ad(no_url).is_err());
    }

    #[test]
    fn rejects_ad_without_any_title() {
        let ad = ad_from(json!({
            "propertyCode": "1",
            "price": 100000.0,
            "url": "http://x/1"
        }));

        assert!(map_ad(ad).is_err());
    }

    #[test]
    fn default_filters_produce_expected_params() {
        let params = ApiSource::query_params(&SearchFilters::default());

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("country"), Some("es"));
        assert_eq!(get("operation"), Some("sale"));
        assert_eq!(get("propertyType"), Some("homes"));
        assert_eq!(get("center"), Some("40.4167,-3.70325"));
        assert_eq!(get("distance"), Some("10000"));
        assert_eq!(get("minPrice"), Some("80000"));
        assert_eq!(get("maxPrice"), Some("150000"));
        assert_eq!(get("minBedrooms"), Some("3"));
        assert_eq!(get("hasLift"), Some("true"));
        assert_eq!(get("hasParkingSpace"), Some("true"));
        assert_eq!(get("sinceDate"), None);
    }

    #[test]
    fn unset_filters_are_omitted() {
        let filters = SearchFilters {
            min_price: None,
            max_price: None,
            min_bedrooms: None,
            has_lift: false,
            has_parking_space: false,
            since_date: Some("W".to_string()),
            ..SearchFilters::default()
        };

        let params = ApiSource::query_params(&filters);
        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();

        assert!(!keys.contains(&"minPrice"));
        assert!(!keys.contains(&"maxPrice"));
        assert!(!keys.contains(&"minBedrooms"));
        assert!(!keys.contains(&"hasLift"));
        assert!(!keys.contains(&"hasParkingSpace"));
        assert!(keys.contains(&"sinceDate"));
    }
}
