pub mod gateway_error;
pub mod upstream_error;

pub use gateway_error::GatewayError;
pub use upstream_error::UpstreamError;
