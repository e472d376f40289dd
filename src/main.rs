mod config;
mod history;
mod models;
mod notify;
mod sources;
mod watcher;

use config::{Config, SourceKind};
use history::History;
use notify::{Notifier, TelegramNotifier};
use sources::challenge::NoSolver;
use sources::{ApiSource, ListingSource, WebSource};
use std::path::Path;
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("🏠 Idealista Watch");

    let config_path = std::env::var("CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let config = Config::load(&config_path)?;

    let source: Box<dyn ListingSource> = match config.source {
        SourceKind::Api => {
            // missing credentials or a failed token exchange end the run here
            let credentials = config::api_credentials()?;
            Box::new(ApiSource::connect(&credentials.key, &credentials.secret).await?)
        }
        SourceKind::Web => Box::new(WebSource::new(
            config.search_url.clone(),
            Box::new(NoSolver),
        )?),
    };

    let notifier = match config::telegram_credentials() {
        Some(telegram) => Some(TelegramNotifier::new(telegram.token, telegram.chat_id)?),
        None => {
            warn!("TELEGRAM_TOKEN/TELEGRAM_CHAT_ID not set, notifications disabled");
            None
        }
    };

    let history_path = Path::new(&config.history_file);
    let mut history = History::load(history_path);
    info!(
        "Loaded {} known listings from {}",
        history.len(),
        history_path.display()
    );

    let summary = watcher::run_once(
        source.as_ref(),
        notifier.as_ref().map(|n| n as &dyn Notifier),
        &mut history,
        &config.filters,
    )
    .await;

    history.save(history_path)?;

    info!(
        "✅ Done: {} fetched, {} new, {} notified",
        summary.fetched, summary.new, summary.notified
    );

    Ok(())
}
