use crate::sources::types::SearchFilters;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Which fetch variant a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Api,
    Web,
}

/// Job configuration from the optional JSON config file.
///
/// Credentials never live here; they come from the environment.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_source")]
    pub source: SourceKind,
    #[serde(default = "default_history_file")]
    pub history_file: String,
    /// Search result page fetched by the web source; its query already
    /// encodes the filters
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default)]
    pub filters: SearchFilters,
}

fn default_source() -> SourceKind {
    SourceKind::Api
}

fn default_history_file() -> String {
    "history.json".to_string()
}

fn default_search_url() -> String {
    "https://www.idealista.com/areas/venta-viviendas/con-precio-hasta_150000,precio-desde_80000,pisos,de-tres-dormitorios,de-cuatro-cinco-habitaciones-o-mas,ascensor,garaje,ultimas-plantas,plantas-intermedias/?shape=%28%28wrlnFbknBktKcsOej%40abDz%5CwbSrzPkyNb%7EM%7CuGvjHshPhtJp%7CHuaAdlLezLlnM%7DdAngJisGwv%40_%60M%60%7CQ%29%29&ordenado-por=fecha-publicacion-desc".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_source(),
            history_file: default_history_file(),
            search_url: default_search_url(),
            filters: SearchFilters::default(),
        }
    }
}

impl Config {
    /// Read the config file; a missing file means all defaults, while a
    /// present but invalid file is an error.
    pub fn load(path: &str) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(_) => {
                debug!("No config file at {path}, using defaults");
                return Ok(Self::default());
            }
        };

        serde_json::from_str(&data).with_context(|| format!("Invalid config file {path}"))
    }
}

pub struct ApiCredentials {
    pub key: String,
    pub secret: String,
}

/// Listings-API credential pair, required whenever the API source runs
pub fn api_credentials() -> Result<ApiCredentials> {
    let key = std::env::var("IDEALISTA_API_KEY").context("IDEALISTA_API_KEY is not set")?;
    let secret =
        std::env::var("IDEALISTA_API_SECRET").context("IDEALISTA_API_SECRET is not set")?;
    Ok(ApiCredentials { key, secret })
}

pub struct TelegramCredentials {
    pub token: String,
    pub chat_id: String,
}

/// Messaging credential pair; either variable missing disables dispatch
pub fn telegram_credentials() -> Option<TelegramCredentials> {
    let token = std::env::var("TELEGRAM_TOKEN").ok()?;
    let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?;
    Some(TelegramCredentials { token, chat_id })
}
