pub mod vehicle_record;

pub use vehicle_record::{FieldError, FieldValue, VehicleRecord};
