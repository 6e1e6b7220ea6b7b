//! Port traits implemented by adapters.

pub mod config_port;
pub mod data_port;
pub mod telemetry_port;
