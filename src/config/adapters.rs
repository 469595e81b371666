use serde::Deserialize;

use crate::utils::constants::DEFAULT_IMAGE_PATH;

/// ================================
/// Source adapters
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AdaptersConfig {
    pub vehicle_data: VehicleDataConfig,
    pub vehicle_images: VehicleImagesConfig,
}

/// BYOCAR containers fetched for every vehicle request
#[derive(Debug, Deserialize, Clone)]
pub struct VehicleDataConfig {
    /// Order matters: container results are merged in this order.
    pub apis: Vec<ContainerApiConfig>,
    /// Overrides the production/sandbox URL, e.g. for a local mock.
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContainerApiConfig {
    /// Container name, e.g. `fuelstatus`
    pub path: String,
    /// Bearer token used instead of the caller's token in sandbox mode.
    /// invariant: required when settings.sandbox is true
    pub sandbox_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VehicleImagesConfig {
    #[serde(default)]
    pub api_key: String,
    /// Public path prefix of downloaded images, also their directory below `settings.static_dir`.
    #[serde(default = "default_image_path")]
    pub image_path: String,
    /// Scheme and authority prepended to image URLs, `http://localhost:{port}` when omitted.
    pub download_host: Option<String>,
    pub base_url: Option<String>,
}

fn default_image_path() -> String {
    DEFAULT_IMAGE_PATH.to_string()
}
