use std::sync::Arc;

use futures_util::future::try_join_all;
use reqwest::Client;
use tracing::{error, info};

use crate::config::service::ServiceConfig;
use crate::errors::GatewayError;
use crate::model::VehicleRecord;
use crate::sources::{build_adapters, SourceAdapter};

/// Fans one vehicle request out to every source adapter and merges the results.
#[derive(Debug, Clone)]
pub struct VehicleService {
    adapters: Arc<Vec<SourceAdapter>>,
}

impl VehicleService {
    pub fn new(adapters: Vec<SourceAdapter>) -> Self {
        info!(
            "Instantiated VehicleService with adapters {:?}",
            adapters.iter().map(SourceAdapter::name).collect::<Vec<_>>()
        );
        Self {
            adapters: Arc::new(adapters),
        }
    }

    pub fn from_config(cfg: &ServiceConfig, client: &Client) -> Self {
        Self::new(build_adapters(cfg, client))
    }

    /// Aggregated dashboard data for `vehicle_id`.
    ///
    /// Empty adapter results are dropped, the rest merged in adapter order.
    /// Fails with [`GatewayError::NoDataAvailable`] unless at least one key
    /// is a real data field.
    pub async fn get_vehicle_data(
        &self,
        vehicle_id: &str,
        access_token: Option<&str>,
    ) -> Result<VehicleRecord, GatewayError> {
        if vehicle_id.is_empty() {
            return Err(GatewayError::InvalidRequest("No vehicle ID provided".to_owned()));
        }

        let responses = try_join_all(
            self.adapters
                .iter()
                .map(|adapter| adapter.fetch(vehicle_id, access_token)),
        )
        .await?;

        let mut result = VehicleRecord::new();
        for response in responses.into_iter().filter(|response| !response.is_empty()) {
            result.merge(response);
        }

        if !result.has_real_data() {
            error!("No data available for vehicle ID {}: {:?}", vehicle_id, result);
            return Err(GatewayError::NoDataAvailable {
                vehicle_id: vehicle_id.to_owned(),
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::{build_reqwest_client, service_config, UpstreamUrls};
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    const VEHICLE_ID: &str = "WDB111111ZZZ22222";

    fn service(server: &MockServer, static_dir: &std::path::Path) -> VehicleService {
        let cfg = service_config(false, &UpstreamUrls::all(&server.base_url()), static_dir);
        VehicleService::from_config(&cfg, &build_reqwest_client())
    }

    #[tokio::test]
    async fn rejects_empty_vehicle_id_before_any_adapter_runs() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!([]));
            })
            .await;

        let err = service(&server, dir.path())
            .get_vehicle_data("", Some("some_token"))
            .await
            .unwrap_err();

        any.assert_calls_async(0).await;
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
        assert_eq!(err.to_string(), "No vehicle ID provided");
        Ok(())
    }

    #[tokio::test]
    async fn fails_when_no_adapter_returns_data() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_includes("/containers/");
                then.status(200).json_body(json!([]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/vehicles/{}", VEHICLE_ID));
                then.status(200).json_body(json!({}));
            })
            .await;

        let err = service(&server, dir.path())
            .get_vehicle_data(VEHICLE_ID, Some("some_token"))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::NoDataAvailable { .. }));
        assert_eq!(err.to_string(), format!("Did not get any data for VIN {}", VEHICLE_ID));
        Ok(())
    }

    #[tokio::test]
    async fn fails_when_only_error_fields_remain() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_includes("/containers/");
                then.status(503).body("unavailable");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/vehicles/{}", VEHICLE_ID));
                then.status(404);
            })
            .await;

        let err = service(&server, dir.path())
            .get_vehicle_data(VEHICLE_ID, Some("some_token"))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::NoDataAvailable { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn merges_error_fields_with_image_urls() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_includes("/containers/");
                then.status(500).json_body(json!({ "exveErrorMsg": "down" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/vehicles/{}", VEHICLE_ID));
                then.status(200).json_body(json!({ "EXT150": "id-ext150" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/images/id-ext150");
                then.status(200).body("png");
            })
            .await;

        let record = service(&server, dir.path())
            .get_vehicle_data(VEHICLE_ID, Some("some_token"))
            .await?;

        assert_eq!(
            serde_json::to_value(&record)?,
            json!({
                "fuelstatusError": { "status": 500, "errorDetails": { "exveErrorMsg": "down" } },
                "electricvehicleError": { "status": 500, "errorDetails": { "exveErrorMsg": "down" } },
                "imageUrls": [format!("http://localhost:3000/images/EXT150-{}.png", VEHICLE_ID)]
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn returns_union_of_adapter_results() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/vehicles/{}/containers/fuelstatus", VEHICLE_ID));
                then.status(200)
                    .json_body(json!([{ "tanklevelpercent": { "value": "90", "timestamp": 1541080800000u64 } }]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/vehicles/{}/containers/electricvehicle", VEHICLE_ID));
                then.status(200).json_body(json!([{ "soc": { "value": "75", "timestamp": 1541080800000u64 } }]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/vehicles/{}", VEHICLE_ID));
                then.status(500);
            })
            .await;

        let record = service(&server, dir.path())
            .get_vehicle_data(VEHICLE_ID, Some("some_token"))
            .await?;

        assert_eq!(
            serde_json::to_value(&record)?,
            json!({ "tanklevelpercent": 90, "soc": 75 })
        );
        Ok(())
    }

    #[tokio::test]
    async fn propagates_authentication_failure() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_includes("/containers/");
                then.status(401);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/vehicles/{}", VEHICLE_ID));
                then.status(200).json_body(json!({}));
            })
            .await;

        let err = service(&server, dir.path())
            .get_vehicle_data(VEHICLE_ID, Some("some_token"))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::AuthenticationFailed(_)));
        Ok(())
    }
}
