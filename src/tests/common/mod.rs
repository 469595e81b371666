// src/tests/common/mod.rs
use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use reqwest::Client;
use tokio::task::JoinHandle;

use crate::config::adapters::{AdaptersConfig, ContainerApiConfig, VehicleDataConfig, VehicleImagesConfig};
use crate::config::service::{AuthConfig, ServiceConfig};
use crate::config::settings::{MetricsConfig, ServerConfig, SettingsConfig};

pub const FUEL_SANDBOX_TOKEN: &str = "7c7c777c-f123-4123-s123-7c7c777c7c77";
pub const EV_SANDBOX_TOKEN: &str = "2c2c222c-e123-4123-v123-2c2c222c2c22";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// `fuelstatus` and `electricvehicle`, with their tryout tokens.
pub fn vehicle_data_config(base_url: Option<String>) -> VehicleDataConfig {
    VehicleDataConfig {
        apis: vec![
            ContainerApiConfig {
                path: "fuelstatus".to_owned(),
                sandbox_token: Some(FUEL_SANDBOX_TOKEN.to_owned()),
            },
            ContainerApiConfig {
                path: "electricvehicle".to_owned(),
                sandbox_token: Some(EV_SANDBOX_TOKEN.to_owned()),
            },
        ],
        base_url,
    }
}

pub fn vehicle_images_config(api_key: &str, base_url: Option<String>) -> VehicleImagesConfig {
    VehicleImagesConfig {
        api_key: api_key.to_owned(),
        image_path: "images".to_owned(),
        download_host: Some("http://localhost:3000".to_owned()),
        base_url,
    }
}

pub fn auth_config(token_url: Option<String>) -> AuthConfig {
    AuthConfig {
        client_id: "some_client_id".to_owned(),
        client_secret: "some_client_secret".to_owned(),
        redirect_uri: "http://localhost:8080/".to_owned(),
        token_url,
    }
}

/// Where the mocked upstream APIs live.
pub struct UpstreamUrls {
    pub vehicle_data: String,
    pub vehicle_images: String,
    pub token: String,
}

impl UpstreamUrls {
    /// Every upstream API served by one mock server.
    pub fn all(base_url: &str) -> Self {
        Self {
            vehicle_data: base_url.to_owned(),
            vehicle_images: base_url.to_owned(),
            token: format!("{}/as/token.oauth2", base_url),
        }
    }
}

pub fn service_config(sandbox: bool, urls: &UpstreamUrls, static_dir: &Path) -> ServiceConfig {
    ServiceConfig {
        settings: SettingsConfig {
            sandbox,
            server: ServerConfig::default(),
            static_dir: static_dir.to_string_lossy().into_owned(),
            request_timeout_ms: 5_000,
            metrics: MetricsConfig {
                path: "/metrics".to_owned(),
                is_enabled: true,
            },
            logging: None,
        },
        auth: auth_config(Some(urls.token.clone())),
        adapters: AdaptersConfig {
            vehicle_data: vehicle_data_config(Some(urls.vehicle_data.clone())),
            vehicle_images: vehicle_images_config("some_api_key", Some(urls.vehicle_images.clone())),
        },
    }
}
