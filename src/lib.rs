//! # Vehicle Gateway Library
//!
//! Aggregates Mercedes-Benz vehicle telemetry (BYOCAR containers) and vehicle
//! images behind a single dashboard endpoint.
//!
//! Modules:
//! - `config` - service configuration, defaults and validation
//! - `sources` - OAuth2 token provider and the upstream source adapters
//! - `service` - fan-out and merge of adapter results
//! - `parser` - normalization of container responses
//! - `cache` - write-once image store
//! - `server` - HTTP API, static files and metrics route

pub mod cache;
pub mod config;
pub mod errors;
pub mod model;
pub mod observability;
pub mod parser;
pub mod server;
pub mod service;
pub mod sources;
pub mod utils;

#[cfg(test)]
pub mod tests;

pub use crate::errors::GatewayError;
pub use crate::model::VehicleRecord;
