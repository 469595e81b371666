//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * server / logging / metrics settings
//!   * container endpoints (non-empty, unique, sandbox tokens in sandbox mode)
//!   * image path, download host and base URL overrides

use std::collections::HashSet;

use tracing::{error, info, warn};

use crate::config::adapters::{VehicleDataConfig, VehicleImagesConfig};
use crate::config::service::ServiceConfig;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();
    let sandbox = cfg.settings.sandbox;

    validate_settings(&cfg.settings, &mut errors);
    validate_vehicle_data(&cfg.adapters.vehicle_data, sandbox, &mut errors);
    validate_vehicle_images(&cfg.adapters.vehicle_images, &mut errors);

    if let Some(token_url) = &cfg.auth.token_url {
        validate_http_url("auth.token_url", token_url, &mut errors);
    }
    if !sandbox && (cfg.auth.client_id.trim().is_empty() || cfg.auth.client_secret.trim().is_empty()) {
        warn!("auth.client_id or auth.client_secret is empty; token exchange will fail outside sandbox mode");
    }

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.trim().is_empty() {
        errors.push(format!(
            "settings.server.host '{}' must be valid",
            settings.server.host
        ));
    }
    if settings.server.port == 0 {
        errors.push("settings.server.port must be in range 1-65535".to_string());
    }
    if settings.static_dir.trim().is_empty() {
        errors.push("settings.static_dir cannot be empty".to_string());
    }
    if settings.request_timeout_ms == 0 {
        errors.push("settings.request_timeout_ms must be > 0".to_string());
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }
    if metrics.path.starts_with("/api/") {
        errors.push(format!(
            "settings.metrics.path '{}' collides with the vehicle API",
            metrics.path
        ));
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

/// CONTAINER ENDPOINTS
fn validate_vehicle_data(cfg: &VehicleDataConfig, sandbox: bool, errors: &mut Vec<String>) {
    if cfg.apis.is_empty() {
        errors.push("adapters.vehicle_data.apis is empty; at least one container required".to_string());
    }

    let mut paths = HashSet::new();
    for (idx, api) in cfg.apis.iter().enumerate() {
        let path = api.path.trim();
        if path.is_empty() {
            errors.push(format!("adapters.vehicle_data.apis[{}].path cannot be empty", idx));
            continue;
        }
        if path.contains('/') {
            errors.push(format!(
                "adapters.vehicle_data.apis[{}].path '{}' must be a single container name",
                idx, path
            ));
        }
        if !paths.insert(path.to_owned()) {
            errors.push(format!(
                "adapters.vehicle_data.apis[{}].path '{}' is a duplicate; container paths must be unique",
                idx, path
            ));
        }
        if sandbox && api.sandbox_token.as_deref().map(str::trim).unwrap_or("").is_empty() {
            errors.push(format!(
                "adapters.vehicle_data.apis[{}].sandbox_token is required in sandbox mode",
                idx
            ));
        }
    }

    if let Some(base_url) = &cfg.base_url {
        validate_http_url("adapters.vehicle_data.base_url", base_url, errors);
    }
}

/// IMAGES
fn validate_vehicle_images(cfg: &VehicleImagesConfig, errors: &mut Vec<String>) {
    let image_path = cfg.image_path.as_str();
    if image_path.is_empty()
        || image_path.contains('/')
        || image_path.contains('\\')
        || image_path.contains("..")
    {
        errors.push(format!(
            "adapters.vehicle_images.image_path '{}' must be a single directory name",
            image_path
        ));
    }
    if image_path == "api" {
        errors.push("adapters.vehicle_images.image_path 'api' collides with the vehicle API".to_string());
    }
    if let Some(host) = &cfg.download_host {
        validate_http_url("adapters.vehicle_images.download_host", host, errors);
    }
    if let Some(base_url) = &cfg.base_url {
        validate_http_url("adapters.vehicle_images.base_url", base_url, errors);
    }
}

fn validate_http_url(path: &str, url: &str, errors: &mut Vec<String>) {
    let parsed = reqwest::Url::parse(url);
    match parsed {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
        Ok(u) => errors.push(format!(
            "{} '{}' must use http or https, got '{}'",
            path,
            url,
            u.scheme()
        )),
        Err(e) => errors.push(format!("{} '{}' is not a valid URL: {}", path, url, e)),
    }
}
