use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::time::Instant;
use tracing::info;

use crate::errors::GatewayError;
use crate::model::VehicleRecord;
use crate::observability::metrics::get_metrics;
use crate::server::server::AppState;
use crate::utils::constants::AUTHORIZATION_CODE_HEADER;

pub const VEHICLE_ROUTE: &str = "/api/vehicle/{vehicle_id}";

pub fn router() -> Router<AppState> {
    Router::new().route(VEHICLE_ROUTE, get(get_dashboard_data).options(preflight))
}

/// Token exchange, then aggregation; any failure renders as `{message}`.
async fn get_dashboard_data(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let metrics = get_metrics().await;
    let start = Instant::now();
    let code = headers
        .get(AUTHORIZATION_CODE_HEADER)
        .and_then(|value| value.to_str().ok());
    info!("Received request to fetch vehicle dashboard data for VIN {}", vehicle_id);

    let result: Result<VehicleRecord, GatewayError> = async {
        let access_token = state.token_provider.exchange_code(code).await?;
        state
            .vehicle_service
            .get_vehicle_data(&vehicle_id, access_token.as_deref())
            .await
    }
    .await;

    let response = match result {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    };
    metrics
        .vehicle_requests
        .with_label_values(&[response.status().as_str()])
        .inc();
    info!(
        "Answered request for VIN {} with {} in {:?}",
        vehicle_id,
        response.status(),
        start.elapsed()
    );
    response
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET,HEAD,PUT,PATCH,POST,DELETE"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
        ],
    )
}

pub async fn allow_any_origin(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}
