//! InfluxDB 1.x HTTP API client

mod client;

pub use client::{HttpClient, HttpConnector};
