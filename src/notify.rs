use crate::models::Listing;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Delivery channel for new-listing notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, listing: &Listing) -> Result<()>;
}

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'a str,
}

/// Message body with the listing title, price and a direct link
pub fn format_message(listing: &Listing) -> String {
    format!(
        "🏠 *New Listing*\n\n*{}*\n💰 {} €\n🔗 [View Listing]({})",
        listing.title, listing.price, listing.url
    )
}

pub struct TelegramNotifier {
    client: Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token,
            chat_id,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, listing: &Listing) -> Result<()> {
        let body = SendMessageBody {
            chat_id: &self.chat_id,
            text: format_message(listing),
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(format!("{TELEGRAM_API}/bot{}/sendMessage", self.token))
            .json(&body)
            .send()
            .await
            .context("Telegram request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API error {status}: {body}");
        }

        info!("Sent notification for listing {}", listing.id);
        Ok(())
    }
}
