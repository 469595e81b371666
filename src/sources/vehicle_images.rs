use std::path::Path;

use futures_util::future::join_all;
use indexmap::IndexMap;
use reqwest::{Client, Url};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::cache::image_cache::ImageCache;
use crate::config::adapters::VehicleImagesConfig;
use crate::errors::upstream_error::ensure_success;
use crate::errors::UpstreamError;
use crate::model::VehicleRecord;
use crate::observability::metrics::get_metrics;
use crate::sources::endpoint_url;
use crate::utils::constants::{
    ADAPTER_VEHICLE_IMAGES, IMAGE_URLS_FIELD, VEHICLE_IMAGES_SANDBOX_API_KEY, VEHICLE_IMAGES_SANDBOX_URL,
    VEHICLE_IMAGES_URL,
};

/// Perspective label to opaque image id, in upstream order.
pub type PerspectiveMap = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub file_name: String,
    pub downloaded: bool,
}

/// Mirrors vehicle images into the static directory and returns their public URLs.
///
/// Never fails: an unavailable perspective map yields `{}` and a failed
/// download only drops that perspective from `imageUrls`.
#[derive(Debug, Clone)]
pub struct VehicleImagesAdapter {
    pub url: String,
    api_key: String,
    image_path: String,
    download_host: String,
    cache: ImageCache,
    client: Client,
}

impl VehicleImagesAdapter {
    pub fn new(cfg: &VehicleImagesConfig, sandbox: bool, static_dir: &Path, client: Client) -> Self {
        let url = cfg
            .base_url
            .clone()
            .unwrap_or_else(|| Self::resolve_base_url(sandbox).to_owned())
            .trim_end_matches('/')
            .to_owned();
        let api_key = if sandbox {
            VEHICLE_IMAGES_SANDBOX_API_KEY.to_owned()
        } else {
            cfg.api_key.clone()
        };
        let cache = ImageCache::new(static_dir.join(&cfg.image_path));
        info!(
            "Instantiated VehicleImagesAdapter, url: {}, sandbox: {}, image dir: {}",
            url,
            sandbox,
            cache.root().display()
        );

        Self {
            url,
            api_key,
            image_path: cfg.image_path.clone(),
            download_host: cfg.download_host.clone().unwrap_or_default(),
            cache,
            client,
        }
    }

    pub fn resolve_base_url(sandbox: bool) -> &'static str {
        if sandbox {
            VEHICLE_IMAGES_SANDBOX_URL
        } else {
            VEHICLE_IMAGES_URL
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub async fn fetch(&self, vehicle_id: &str) -> VehicleRecord {
        let images = self.get_image_ids(vehicle_id).await;
        let mut record = VehicleRecord::new();
        if images.is_empty() {
            warn!("No images available for vehicle ID {}", vehicle_id);
            return record;
        }

        let lookups = images
            .iter()
            .map(|(perspective, image_id)| self.get_image_data(perspective, image_id, vehicle_id));
        let image_urls: Vec<Value> = join_all(lookups)
            .await
            .into_iter()
            .filter(|image| image.downloaded)
            .filter_map(|image| match self.image_url(&image.file_name) {
                Ok(url) => Some(Value::String(url)),
                Err(err) => {
                    warn!("Cannot build URL for image {}: {}", image.file_name, err);
                    None
                }
            })
            .collect();

        info!("Retrieved {} image(s) for vehicle ID {}", image_urls.len(), vehicle_id);
        record.insert_data(IMAGE_URLS_FIELD, Value::Array(image_urls));
        record
    }

    /// `{download_host}/{image_path}/{file_name}`, the file name percent-encoded.
    pub fn image_url(&self, file_name: &str) -> Result<String, UpstreamError> {
        endpoint_url(&self.download_host, &[self.image_path.as_str(), file_name]).map(String::from)
    }

    /// The perspective map, empty when the upstream call fails.
    pub async fn get_image_ids(&self, vehicle_id: &str) -> PerspectiveMap {
        info!("Getting image IDs for vehicle ID {}...", vehicle_id);
        match self.fetch_image_ids(vehicle_id).await {
            Ok(images) => images,
            Err(err) => {
                warn!(
                    "Retrieving image IDs for vehicle ID {} failed with {:?}: {} {:?}",
                    vehicle_id,
                    err.status(),
                    err,
                    err.body()
                );
                PerspectiveMap::new()
            }
        }
    }

    async fn fetch_image_ids(&self, vehicle_id: &str) -> Result<PerspectiveMap, UpstreamError> {
        let url = endpoint_url(&self.url, &["vehicles", vehicle_id])?;
        let body = self.get_bytes(url, "vehicles").await?;
        let raw: IndexMap<String, Value> = serde_json::from_slice(&body)?;

        Ok(raw
            .into_iter()
            .filter_map(|(perspective, image_id)| match image_id {
                Value::String(id) => Some((perspective, id)),
                other => {
                    warn!("Ignoring perspective {} with non-string image ID {}", perspective, other);
                    None
                }
            })
            .collect())
    }

    /// Ensures the image is on disk, downloading it on a miss.
    pub async fn get_image_data(&self, perspective: &str, image_id: &str, vehicle_id: &str) -> ImageData {
        let metrics = get_metrics().await;
        let file_name = ImageCache::file_name(perspective, vehicle_id);

        if !ImageCache::is_safe_file_name(&file_name) {
            warn!("Refusing image file name {} for vehicle ID {}", file_name, vehicle_id);
            metrics.image_downloads.with_label_values(&["skipped"]).inc();
            return ImageData {
                file_name,
                downloaded: false,
            };
        }

        if self.cache.contains(&file_name).await {
            metrics.image_downloads.with_label_values(&["cached"]).inc();
            return ImageData {
                file_name,
                downloaded: true,
            };
        }

        info!("Downloading image {}...", file_name);
        if let Err(err) = self.download_image(image_id, &file_name).await {
            warn!(
                "Downloading image {} failed with {:?}: {} {:?}",
                file_name,
                err.status(),
                err,
                err.body()
            );
        }

        let downloaded = self.cache.contains(&file_name).await;
        metrics
            .image_downloads
            .with_label_values(&[if downloaded { "downloaded" } else { "failed" }])
            .inc();
        ImageData { file_name, downloaded }
    }

    async fn download_image(&self, image_id: &str, file_name: &str) -> Result<(), UpstreamError> {
        let url = endpoint_url(&self.url, &["images", image_id])?;
        let bytes = self.get_bytes(url, "images").await?;
        self.cache.store(file_name, &bytes).await?;
        Ok(())
    }

    async fn get_bytes(&self, url: Url, endpoint: &str) -> Result<Vec<u8>, UpstreamError> {
        let metrics = get_metrics().await;
        let start = Instant::now();
        metrics
            .upstream_requests
            .with_label_values(&[ADAPTER_VEHICLE_IMAGES, endpoint])
            .inc();

        let result = async {
            let response = self
                .client
                .get(url)
                .query(&[("apikey", self.api_key.as_str())])
                .send()
                .await?;
            let response = ensure_success(response).await?;
            Ok::<Vec<u8>, UpstreamError>(response.bytes().await?.to_vec())
        }
        .await;

        metrics
            .upstream_duration
            .with_label_values(&[ADAPTER_VEHICLE_IMAGES])
            .observe(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            metrics
                .upstream_failures
                .with_label_values(&[ADAPTER_VEHICLE_IMAGES, err.reason()])
                .inc();
        }
        result
    }
}
