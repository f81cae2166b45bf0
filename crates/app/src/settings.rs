//! Application configuration, read from `settings.toml`.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// External ledger access. Without this section the service runs with
/// reconciliation disabled.
#[derive(Debug, Deserialize)]
pub struct Ledger {
    pub base_url: String,
    pub user_agent: Option<String>,
    pub treasury_account_id: i64,
    /// Zero disables the periodic sync task; admins can still trigger a
    /// sync over HTTP.
    pub sync_interval_minutes: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    pub ledger: Option<Ledger>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
