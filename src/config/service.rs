use serde::Deserialize;

use crate::config::{adapters::AdaptersConfig, settings::SettingsConfig};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub auth: AuthConfig,
    pub adapters: AdaptersConfig,
}

/// ================================
/// OAuth 2.0 authorization code exchange
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
    /// Defaults to the Mercedes-Benz identity provider token endpoint.
    pub token_url: Option<String>,
}
