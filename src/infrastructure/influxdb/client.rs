use crate::domain::batch::BatchPoints;
use crate::domain::errors::ClientError;
use crate::domain::ports::{ConnectionConfig, Connector, PingResponse, TimeSeriesClient};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Body of an error response
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the `/ping` and `/write` endpoints.
///
/// Creating one performs no I/O; an unreachable server is only noticed by
/// the first request.
#[derive(Clone)]
pub struct HttpClient {
    url: Url,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ConnectionConfig) -> Result<Self, ClientError> {
        let url = Url::parse(&config.address).map_err(|e| ClientError::InvalidAddress {
            address: config.address.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            });
        }

        let mut builder = reqwest::Client::builder();
        if !config.timeout.is_zero() {
            builder = builder.timeout(config.timeout);
        }
        if !config.user_agent.is_empty() {
            builder = builder.user_agent(config.user_agent.clone());
        }
        let http = builder.build().map_err(ClientError::Build)?;

        Ok(Self {
            url,
            username: config.username.clone(),
            password: config.password.clone(),
            http,
        })
    }

    fn endpoint(&self, name: &str) -> Url {
        let mut url = self.url.clone();
        // http(s) URLs always have a path, so this cannot fail
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.username.is_empty() {
            request
        } else {
            request.basic_auth(&self.username, Some(&self.password))
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

async fn status_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string());
    ClientError::Status { status, message }
}

#[async_trait]
impl TimeSeriesClient for HttpClient {
    async fn ping(&self, timeout: Duration) -> Result<PingResponse, ClientError> {
        let start = Instant::now();

        let mut request = self.authorize(self.http.get(self.endpoint("ping")));
        if !timeout.is_zero() {
            request = request
                .query(&[("wait_for_leader", format!("{:.0}s", timeout.as_secs_f64()))])
                .timeout(timeout);
        }

        let response = request.send().await?;
        if response.status() != StatusCode::NO_CONTENT {
            return Err(status_error(response).await);
        }

        let version = response
            .headers()
            .get("X-Influxdb-Version")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(PingResponse {
            rtt: start.elapsed(),
            version,
        })
    }

    async fn write(&self, batch: &BatchPoints) -> Result<(), ClientError> {
        let mut params = vec![
            ("db", batch.database().to_string()),
            ("precision", batch.precision().query_value().to_string()),
        ];
        if !batch.retention_policy().is_empty() {
            params.push(("rp", batch.retention_policy().to_string()));
        }
        if !batch.write_consistency().is_empty() {
            params.push(("consistency", batch.write_consistency().to_string()));
        }

        let response = self
            .authorize(self.http.post(self.endpoint("write")))
            .query(&params)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(batch.body())
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            _ => Err(status_error(response).await),
        }
    }
}

/// Creates [`HttpClient`]s
#[derive(Debug, Default, Clone)]
pub struct HttpConnector;

impl HttpConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for HttpConnector {
    fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn TimeSeriesClient>, ClientError> {
        Ok(Arc::new(HttpClient::new(config)?))
    }
}
