//! Shared constants and invariants

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_IMAGE_PATH: &str = "images";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

// Token provider
pub const TOKEN_URL: &str = "https://id.mercedes-benz.com/as/token.oauth2";

// Vehicle data (BYOCAR) API
pub const VEHICLE_DATA_URL: &str = "https://api.mercedes-benz.com/vehicledata/v2";
pub const VEHICLE_DATA_SANDBOX_URL: &str = "https://api.mercedes-benz.com/vehicledata_tryout/v2";

// Vehicle images API
pub const VEHICLE_IMAGES_URL: &str = "https://api.mercedes-benz.com/vehicle_images/v1";
pub const VEHICLE_IMAGES_SANDBOX_URL: &str = "https://api.mercedes-benz.com/tryout/vehicle_images/v1";
pub const VEHICLE_IMAGES_SANDBOX_API_KEY: &str = "d705585c-a672-11ea-bb37-0242ac130002";

// Inbound
pub const AUTHORIZATION_CODE_HEADER: &str = "x-authorization-code";

// Response shape
pub const FIELD_ERROR_SUFFIX: &str = "Error";
pub const IMAGE_URLS_FIELD: &str = "imageUrls";

// Adapter labels (logs, metrics)
pub const ADAPTER_VEHICLE_DATA: &str = "vehicle_data";
pub const ADAPTER_VEHICLE_IMAGES: &str = "vehicle_images";
pub const ADAPTER_OAUTH2: &str = "oauth2";
