use std::sync::Arc;

use futures_util::future::try_join_all;
use reqwest::Client;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::adapters::{ContainerApiConfig, VehicleDataConfig};
use crate::errors::upstream_error::ensure_success;
use crate::errors::{GatewayError, UpstreamError};
use crate::model::{FieldError, VehicleRecord};
use crate::observability::metrics::get_metrics;
use crate::parser::container::{container_to_record, ContainerResponse};
use crate::sources::endpoint_url;
use crate::utils::constants::{ADAPTER_VEHICLE_DATA, VEHICLE_DATA_SANDBOX_URL, VEHICLE_DATA_URL};

/// Retrieves the configured BYOCAR containers of a vehicle and folds them
/// into one record.
///
/// A container that fails with anything but 401 is reported as a
/// `<container>Error` field; a 401 fails the whole fetch.
#[derive(Debug, Clone)]
pub struct VehicleDataAdapter {
    pub url: String,
    sandbox: bool,
    apis: Arc<Vec<ContainerApiConfig>>,
    client: Client,
}

impl VehicleDataAdapter {
    pub fn new(cfg: &VehicleDataConfig, sandbox: bool, client: Client) -> Self {
        let url = cfg
            .base_url
            .clone()
            .unwrap_or_else(|| Self::resolve_base_url(sandbox).to_owned())
            .trim_end_matches('/')
            .to_owned();
        info!("Instantiated VehicleDataAdapter, url: {}, sandbox: {}", url, sandbox);

        Self {
            url,
            sandbox,
            apis: Arc::new(cfg.apis.clone()),
            client,
        }
    }

    pub fn resolve_base_url(sandbox: bool) -> &'static str {
        if sandbox {
            VEHICLE_DATA_SANDBOX_URL
        } else {
            VEHICLE_DATA_URL
        }
    }

    /// Fetches all containers concurrently, merged in configuration order.
    pub async fn fetch(&self, vehicle_id: &str, access_token: Option<&str>) -> Result<VehicleRecord, GatewayError> {
        let requests = self.apis.iter().map(|api| {
            let token = if self.sandbox {
                api.sandbox_token.as_deref()
            } else {
                access_token
            };
            self.get_container_record(&api.path, vehicle_id, token)
        });

        let records = try_join_all(requests).await?;
        let mut vehicle_data = VehicleRecord::new();
        for record in records {
            vehicle_data.merge(record);
        }

        info!(
            "Retrieved vehicle data for vehicle ID {}: {:?}",
            vehicle_id,
            vehicle_data.keys().collect::<Vec<_>>()
        );
        Ok(vehicle_data)
    }

    async fn get_container_record(
        &self,
        endpoint: &str,
        vehicle_id: &str,
        access_token: Option<&str>,
    ) -> Result<VehicleRecord, GatewayError> {
        match self.get_container_response(endpoint, vehicle_id, access_token).await {
            Ok(container) => Ok(container_to_record(container)),
            Err(err) => {
                warn!(
                    "Retrieving {} for vehicle ID {} failed with {:?}: {} {:?}",
                    endpoint,
                    vehicle_id,
                    err.status(),
                    err,
                    err.body()
                );
                if err.is_unauthorized() {
                    return Err(GatewayError::AuthenticationFailed(
                        "Authentication for BYOCAR failed".to_owned(),
                    ));
                }

                let mut record = VehicleRecord::new();
                record.insert_error(endpoint, field_error(&err));
                Ok(record)
            }
        }
    }

    /// `GET {url}/vehicles/{vehicle_id}/containers/{endpoint}` with a bearer token.
    pub async fn get_container_response(
        &self,
        endpoint: &str,
        vehicle_id: &str,
        access_token: Option<&str>,
    ) -> Result<ContainerResponse, UpstreamError> {
        let metrics = get_metrics().await;
        let start = Instant::now();
        info!("Getting vehicle data from {} for vehicle ID {}...", endpoint, vehicle_id);
        metrics
            .upstream_requests
            .with_label_values(&[ADAPTER_VEHICLE_DATA, endpoint])
            .inc();

        let result = async {
            let url = endpoint_url(&self.url, &["vehicles", vehicle_id, "containers", endpoint])?;
            let response = self
                .client
                .get(url)
                .bearer_auth(access_token.unwrap_or_default())
                .send()
                .await?;
            let response = ensure_success(response).await?;
            let body = response.bytes().await?;
            Ok::<ContainerResponse, UpstreamError>(serde_json::from_slice(&body)?)
        }
        .await;

        metrics
            .upstream_duration
            .with_label_values(&[ADAPTER_VEHICLE_DATA])
            .observe(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            metrics
                .upstream_failures
                .with_label_values(&[ADAPTER_VEHICLE_DATA, err.reason()])
                .inc();
        }
        result
    }
}

fn field_error(err: &UpstreamError) -> FieldError {
    let error_details = match err {
        UpstreamError::Status { body, .. } => body.clone(),
        other => Some(serde_json::Value::String(other.to_string())),
    };
    FieldError {
        status: err.status().map(|status| status.as_u16()),
        error_details,
    }
}
