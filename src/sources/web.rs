use crate::models::{Listing, Source};
use crate::sources::challenge::{Challenge, ChallengeSolver, Clearance};
use crate::sources::traits::{FetchOutcome, ListingSource};
use crate::sources::types::SearchFilters;
use crate::sources::USER_AGENT;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

const SITE_ORIGIN: &str = "https://www.idealista.com";
const CHALLENGE_MARKER: &str = "geo.captcha-delivery.com";

/// Listings source scraping the public search result page
pub struct WebSource {
    client: Client,
    search_url: String,
    solver: Box<dyn ChallengeSolver>,
}

impl WebSource {
    pub fn new(search_url: String, solver: Box<dyn ChallengeSolver>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            search_url,
            solver,
        })
    }

    async fn get_page(&self, clearance: Option<&Clearance>) -> Result<(StatusCode, String)> {
        let mut request = self.client.get(&self.search_url);
        if let Some(clearance) = clearance {
            request = request.header(
                header::COOKIE,
                format!("{}={}", clearance.name, clearance.value),
            );
        }

        let response = request.send().await.context("Page request failed")?;
        let status = response.status();
        let body = response.text().await.context("Failed to read page body")?;

        debug!("Downloaded {} bytes of HTML ({})", body.len(), status);
        Ok((status, body))
    }
}

/// Whether the response is an anti-bot block rather than a result page
fn looks_blocked(status: StatusCode, body: &str) -> bool {
    status == StatusCode::FORBIDDEN || body.contains(CHALLENGE_MARKER)
}

/// Isolate the challenge frame URL from a blocked page, when present
fn extract_challenge(page_url: &str, html: &str) -> Challenge {
    let document = Html::parse_document(html);
    let iframe_selector = Selector::parse("iframe").unwrap();

    let frame_url = document
        .select(&iframe_selector)
        .filter_map(|frame| frame.value().attr("src"))
        .find(|src| src.contains(CHALLENGE_MARKER))
        .map(String::from);

    Challenge {
        page_url: page_url.to_string(),
        frame_url,
    }
}

/// Extract listings from a search result page.
///
/// Cards missing a required field are skipped with a warning instead of
/// producing partial records.
fn parse_listing_page(html: &str) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let item_selector = Selector::parse("article.item").unwrap();
    let link_selector = Selector::parse("a.item-link").unwrap();
    let price_selector = Selector::parse(".item-price").unwrap();

    let mut listings = Vec::new();

    for item in document.select(&item_selector) {
        let Some(id) = item.value().attr("data-adid") else {
            warn!("Skipping listing card without an ad id");
            continue;
        };

        let Some(link) = item.select(&link_selector).next() else {
            warn!("Skipping ad {id}: no title link");
            continue;
        };

        let title = link.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            warn!("Skipping ad {id}: empty title");
            continue;
        }

        let Some(href) = link.value().attr("href") else {
            warn!("Skipping ad {id}: title link has no href");
            continue;
        };
        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{SITE_ORIGIN}{href}")
        };

        let price_text = item
            .select(&price_selector)
            .next()
            .map(|price| price.text().collect::<String>())
            .unwrap_or_default();
        let digits: String = price_text.chars().filter(|c| c.is_ascii_digit()).collect();
        let Ok(price) = digits.parse::<u64>() else {
            warn!("Skipping ad {id}: unparsable price {:?}", price_text.trim());
            continue;
        };

        listings.push(Listing {
            id: id.to_string(),
            source: Source::Web,
            title,
            price,
            url,
            fetched_at: Utc::now(),
        });
    }

    listings
}

#[async_trait]
impl ListingSource for WebSource {
    /// The configured search URL already encodes the filters, so they are
    /// not consulted here.
    async fn fetch(&self, _filters: &SearchFilters) -> FetchOutcome {
        let (status, body) = match self.get_page(None).await {
            Ok(page) => page,
            Err(e) => return FetchOutcome::TransportError(format!("{e:#}")),
        };

        if looks_blocked(status, &body) {
            warn!(
                "Access denied ({status}), consulting challenge solver '{}'",
                self.solver.solver_name()
            );
            let challenge = extract_challenge(&self.search_url, &body);

            return match self.solver.solve(&challenge).await {
                Ok(Some(clearance)) => {
                    info!("Challenge cleared, retrying once with clearance cookie");
                    match self.get_page(Some(&clearance)).await {
                        Ok((status, body)) if !looks_blocked(status, &body) => {
                            FetchOutcome::Success(parse_listing_page(&body))
                        }
                        Ok((status, _)) => {
                            FetchOutcome::Blocked(format!("still blocked after clearance ({status})"))
                        }
                        Err(e) => FetchOutcome::TransportError(format!("retry failed: {e:#}")),
                    }
                }
                Ok(None) => FetchOutcome::Blocked(format!(
                    "challenge declined by solver '{}'",
                    self.solver.solver_name()
                )),
                Err(e) => FetchOutcome::Blocked(format!("challenge solver failed: {e:#}")),
            };
        }

        if !status.is_success() {
            return FetchOutcome::TransportError(format!("search page returned {status}"));
        }

        FetchOutcome::Success(parse_listing_page(&body))
    }

    fn source_name(&self) -> &'static str {
        "idealista-web"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULT_PAGE: &str = r#"
        <html><body><main>
          <article class="item" data-adid="106752408">
            <a class="item-link" href="/inmueble/106752408/">Piso en venta en Calle de Toledo</a>
            <span class="item-price">150.000€</span>
          </article>
          <article class="item" data-adid="99881122">
            <a class="item-link" href="https://www.idealista.com/inmueble/99881122/">Ático en Lavapiés</a>
            <span class="item-price">119.500€</span>
          </article>
          <article class="item">
            <a class="item-link" href="/inmueble/1/">Sin identificador</a>
            <span class="item-price">80.000€</span>
          </article>
          <article class="item" data-adid="777">
            <a class="item-link" href="/inmueble/777/">Sin precio</a>
          </article>
        </main></body></html>
    "#;

    #[test]
    fn parses_complete_cards_and_skips_partial_ones() {
        let listings = parse_listing_page(RESULT_PAGE);

        assert_eq!(listings.len(), 2);

        assert_eq!(listings[0].id, "106752408");
        assert_eq!(listings[0].title, "Piso en venta en Calle de Toledo");
        assert_eq!(listings[0].price, 150_000);
        assert_eq!(
            listings[0].url,
            "https://www.idealista.com/inmueble/106752408/"
        );
        assert_eq!(listings[0].source, Source::Web);

        assert_eq!(listings[1].id, "99881122");
        assert_eq!(listings[1].price, 119_500);
        assert_eq!(
            listings[1].url,
            "https://www.idealista.com/inmueble/99881122/"
        );
    }

    #[test]
    fn empty_page_yields_no_listings() {
        assert!(parse_listing_page("<html><body></body></html>").is_empty());
    }

    #[test]
    fn forbidden_status_is_blocked() {
        assert!(looks_blocked(StatusCode::FORBIDDEN, ""));
    }

    #[test]
    fn challenge_marker_in_body_is_blocked() {
        let body = r#"<iframe src="https://geo.captcha-delivery.com/captcha/?cid=abc"></iframe>"#;
        assert!(looks_blocked(StatusCode::OK, body));
    }

    #[test]
    fn ordinary_page_is_not_blocked() {
        assert!(!looks_blocked(StatusCode::OK, RESULT_PAGE));
    }

    #[test]
    fn extracts_challenge_frame_url() {
        let body = r#"
            <html><body>
              <iframe src="https://ads.example.com/banner"></iframe>
              <iframe src="https://geo.captcha-delivery.com/captcha/?cid=abc"></iframe>
            </body></html>
        "#;

        let challenge = extract_challenge("https://www.idealista.com/areas/venta/", body);
        assert_eq!(
            challenge.frame_url.as_deref(),
            Some("https://geo.captcha-delivery.com/captcha/?cid=abc")
        );
        assert_eq!(challenge.page_url, "https://www.idealista.com/areas/venta/");
    }

    #[test]
    fn challenge_without_frame_has_no_url() {
        let challenge = extract_challenge("https://x", "<html><body>403</body></html>");
        assert!(challenge.frame_url.is_none());
    }
}
