use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{error, info};

use crate::config::service::AuthConfig;
use crate::errors::upstream_error::ensure_success;
use crate::errors::{GatewayError, UpstreamError};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::{ADAPTER_OAUTH2, TOKEN_URL};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Acquires an access token through the OAuth 2.0 authorization code grant.
///
/// The code is supplied by the client for every request; tokens are neither
/// cached nor refreshed.
#[derive(Debug, Clone)]
pub struct OAuth2TokenProvider {
    pub token_url: String,
    sandbox: bool,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    client: Client,
}

impl OAuth2TokenProvider {
    pub fn new(cfg: &AuthConfig, sandbox: bool, client: Client) -> Self {
        let token_url = cfg.token_url.clone().unwrap_or_else(|| TOKEN_URL.to_owned());
        info!("Instantiated OAuth2TokenProvider, token url: {}", token_url);

        Self {
            token_url,
            sandbox,
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            redirect_uri: cfg.redirect_uri.clone(),
            client,
        }
    }

    /// Exchanges `code` for an access token.
    ///
    /// A missing code is rejected in every mode. Any other failure is only
    /// fatal outside sandbox mode, where it yields `None` instead.
    pub async fn exchange_code(&self, code: Option<&str>) -> Result<Option<String>, GatewayError> {
        let code = code
            .filter(|code| !code.is_empty())
            .ok_or_else(|| GatewayError::InvalidRequest("No authorization code provided".to_owned()))?;

        let access_token = match self.request_token(code).await {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(err) => {
                error!(
                    "Error acquiring access token, {:?}: {} {:?}",
                    err.status(),
                    err,
                    err.body()
                );
                None
            }
        };

        match access_token {
            Some(token) => {
                info!("Acquired access token");
                Ok(Some(token))
            }
            None if self.sandbox => {
                info!("No access token acquired, continuing in sandbox mode");
                Ok(None)
            }
            None => {
                error!("Did not get an access token");
                Err(GatewayError::AuthenticationFailed("Authentication failed".to_owned()))
            }
        }
    }

    /// `Basic base64(client_id:client_secret)`
    pub fn authorization_header(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(credentials))
    }

    async fn request_token(&self, code: &str) -> Result<Option<String>, UpstreamError> {
        let metrics = get_metrics().await;
        let start = Instant::now();
        metrics
            .upstream_requests
            .with_label_values(&[ADAPTER_OAUTH2, "token"])
            .inc();

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        let result = async {
            let response = self
                .client
                .post(&self.token_url)
                .header(http::header::AUTHORIZATION, self.authorization_header())
                .form(&params)
                .send()
                .await?;
            let response = ensure_success(response).await?;
            let body = response.bytes().await?;
            let token: TokenResponse = serde_json::from_slice(&body)?;
            Ok::<Option<String>, UpstreamError>(token.access_token)
        }
        .await;

        metrics
            .upstream_duration
            .with_label_values(&[ADAPTER_OAUTH2])
            .observe(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            metrics
                .upstream_failures
                .with_label_values(&[ADAPTER_OAUTH2, err.reason()])
                .inc();
        }
        result
    }
}
