use std::path::Path;

use reqwest::{Client, Url};

use crate::config::service::ServiceConfig;
use crate::errors::{GatewayError, UpstreamError};
use crate::model::VehicleRecord;
use crate::utils::constants::{ADAPTER_VEHICLE_DATA, ADAPTER_VEHICLE_IMAGES};

pub mod oauth2;
pub mod vehicle_data;
pub mod vehicle_images;

use vehicle_data::VehicleDataAdapter;
use vehicle_images::VehicleImagesAdapter;

/// Upstream API family consulted for every vehicle request.
#[derive(Debug, Clone)]
pub enum SourceAdapter {
    VehicleData(VehicleDataAdapter),
    VehicleImages(VehicleImagesAdapter),
}

impl SourceAdapter {
    pub fn name(&self) -> &'static str {
        match self {
            SourceAdapter::VehicleData(_) => ADAPTER_VEHICLE_DATA,
            SourceAdapter::VehicleImages(_) => ADAPTER_VEHICLE_IMAGES,
        }
    }

    pub async fn fetch(&self, vehicle_id: &str, access_token: Option<&str>) -> Result<VehicleRecord, GatewayError> {
        match self {
            SourceAdapter::VehicleData(s) => s.fetch(vehicle_id, access_token).await,
            SourceAdapter::VehicleImages(s) => Ok(s.fetch(vehicle_id).await),
        }
    }
}

/// Appends each value to `base` as exactly one percent-encoded path segment.
///
/// `/`, `?` and `#` inside a value are encoded, `.` and `..` are refused.
pub fn endpoint_url(base: &str, segments: &[&str]) -> Result<Url, UpstreamError> {
    if let Some(segment) = segments.iter().find(|segment| matches!(**segment, "" | "." | "..")) {
        return Err(UpstreamError::InvalidUrl(format!("invalid path segment '{}'", segment)));
    }

    let mut url = Url::parse(base).map_err(|err| UpstreamError::InvalidUrl(format!("{}: {}", base, err)))?;
    url.path_segments_mut()
        .map_err(|_| UpstreamError::InvalidUrl(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Adapters in merge order: vehicle data first, images last.
pub fn build_adapters(cfg: &ServiceConfig, client: &Client) -> Vec<SourceAdapter> {
    let sandbox = cfg.settings.sandbox;
    vec![
        SourceAdapter::VehicleData(VehicleDataAdapter::new(
            &cfg.adapters.vehicle_data,
            sandbox,
            client.clone(),
        )),
        SourceAdapter::VehicleImages(VehicleImagesAdapter::new(
            &cfg.adapters.vehicle_images,
            sandbox,
            Path::new(&cfg.settings.static_dir),
            client.clone(),
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_each_value_as_one_segment() -> anyhow::Result<()> {
        let url = endpoint_url(
            "https://api.mercedes-benz.com/vehicledata/v2",
            &["vehicles", "../../admin", "containers", "fuelstatus"],
        )?;
        assert_eq!(
            url.as_str(),
            "https://api.mercedes-benz.com/vehicledata/v2/vehicles/..%2F..%2Fadmin/containers/fuelstatus"
        );

        let url = endpoint_url("http://127.0.0.1:4000/", &["vehicles", "WDB?x=1#frag"])?;
        assert_eq!(url.as_str(), "http://127.0.0.1:4000/vehicles/WDB%3Fx=1%23frag");
        Ok(())
    }

    #[test]
    fn refuses_dot_segments() {
        for vehicle_id in ["..", ".", ""] {
            let err = endpoint_url("http://127.0.0.1:4000", &["vehicles", vehicle_id]).unwrap_err();
            assert!(matches!(err, UpstreamError::InvalidUrl(_)));
        }
    }
}
