use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub carrier: CarrierConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_expiration")]
    pub jwt_expiration_seconds: u64,
}

fn default_expiration() -> u64 { 2 * 60 * 60 }

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    Real,
    TestDouble,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub mode: BackendMode,
}

/// Google service account and the spreadsheet it edits.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub client_email: String,
    /// PEM, with `\n` escapes allowed.
    #[serde(default)]
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String { "https://oauth2.googleapis.com/token".into() }

#[derive(Debug, Deserialize, Clone)]
pub struct CarrierConfig {
    #[serde(default = "default_carrier_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub user_guid: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_carrier_url() -> String { "https://app.noest-dz.com/api/public".into() }

fn default_timeout() -> u64 { 30 }

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            base_url: default_carrier_url(),
            api_token: String::new(),
            user_guid: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `COLIS__CARRIER__API_TOKEN=...` sets `carrier.api_token`
            .add_source(config::Environment::with_prefix("COLIS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
