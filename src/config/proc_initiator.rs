use crate::config::service::ServiceConfig;
use crate::config::settings::{LogFormat, LoggingConfig};

pub fn initiate_default_values(mut config: ServiceConfig) -> ServiceConfig {
    if config.settings.logging.is_none() {
        config.settings.logging = Some(LoggingConfig::new("info".to_owned(), LogFormat::Compact));
    }

    // images are served by this gateway unless another host is configured
    let images = &mut config.adapters.vehicle_images;
    if images.download_host.as_deref().map(str::trim).unwrap_or("").is_empty() {
        images.download_host = Some(format!("http://localhost:{}", config.settings.server.port));
    }
    if let Some(host) = images.download_host.as_mut() {
        *host = host.trim_end_matches('/').to_owned();
    }
    images.image_path = images.image_path.trim_matches('/').to_owned();

    config
}
