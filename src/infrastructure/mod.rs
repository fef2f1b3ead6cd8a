pub mod influxdb;
pub mod mock;

pub use influxdb::{HttpClient, HttpConnector};
