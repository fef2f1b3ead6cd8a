//! Exercises the HTTP client against a minimal in-process responder.

use chrono::{TimeZone, Utc};
use influx_reporter::application::Reporter;
use influx_reporter::config::ReporterConfig;
use influx_reporter::domain::batch::{BatchPoints, BatchPointsConfig};
use influx_reporter::domain::errors::ClientError;
use influx_reporter::domain::metrics::Registry;
use influx_reporter::domain::point::{FieldValue, Point};
use influx_reporter::domain::ports::{ConnectionConfig, Connector, TimeSeriesClient};
use influx_reporter::infrastructure::influxdb::{HttpClient, HttpConnector};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
struct CapturedRequest {
    /// e.g. `POST /write?db=metrics&precision=ns`
    request_line: String,
    headers: BTreeMap<String, String>,
    body: String,
}

#[derive(Clone)]
struct CannedResponse {
    status: &'static str,
    headers: Vec<(&'static str, &'static str)>,
    body: &'static str,
}

/// Answer every request with `response` and record what was received
async fn spawn_server(response: CannedResponse) -> (String, Arc<Mutex<Vec<CapturedRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    let captured = Arc::new(Mutex::new(Vec::new()));

    let seen = captured.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let response = response.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                handle(stream, &response, &seen).await;
            });
        }
    });

    (address, captured)
}

async fn handle(
    mut stream: TcpStream,
    response: &CannedResponse,
    seen: &Mutex<Vec<CapturedRequest>>,
) -> Option<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers: BTreeMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    // recorded before replying so the client never sees a response first
    seen.lock().unwrap().push(CapturedRequest {
        request_line,
        headers,
        body,
    });

    let mut reply = format!("HTTP/1.1 {}\r\nConnection: close\r\n", response.status);
    for (name, value) in &response.headers {
        reply.push_str(&format!("{name}: {value}\r\n"));
    }
    if !response.status.starts_with("204") {
        reply.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
    }
    reply.push_str("\r\n");
    reply.push_str(response.body);
    stream.write_all(reply.as_bytes()).await.ok()?;
    stream.shutdown().await.ok();
    Some(())
}

fn no_content() -> CannedResponse {
    CannedResponse {
        status: "204 No Content",
        headers: vec![("X-Influxdb-Version", "1.8.10")],
        body: "",
    }
}

fn connection_config(address: &str) -> ConnectionConfig {
    ConnectionConfig {
        address: address.to_string(),
        timeout: Duration::from_secs(5),
        user_agent: "influx-reporter-test".to_string(),
        ..Default::default()
    }
}

fn batch() -> BatchPoints {
    let mut batch = BatchPoints::new(BatchPointsConfig {
        precision: "s".to_string(),
        database: "metrics".to_string(),
        retention_policy: "weekly".to_string(),
        ..Default::default()
    })
    .unwrap();
    batch.add_point(
        Point::new(
            "requests.count",
            BTreeMap::from([("host".to_string(), "web-1".to_string())]),
            BTreeMap::from([("value".to_string(), FieldValue::Integer(42))]),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
        .unwrap(),
    );
    batch
}

#[tokio::test]
async fn test_ping_reports_version() {
    let (address, captured) = spawn_server(no_content()).await;
    let client = HttpClient::new(&ConnectionConfig {
        username: "user".to_string(),
        password: "pass".to_string(),
        ..connection_config(&address)
    })
    .unwrap();

    let pong = client.ping(Duration::from_secs(1)).await.unwrap();
    assert_eq!(pong.version, "1.8.10");

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0]
            .request_line
            .starts_with("GET /ping?wait_for_leader=1s "),
        "{}",
        requests[0].request_line
    );
    assert_eq!(requests[0].headers["authorization"], "Basic dXNlcjpwYXNz");
    assert_eq!(requests[0].headers["user-agent"], "influx-reporter-test");
}

#[tokio::test]
async fn test_ping_without_credentials_sends_no_auth() {
    let (address, captured) = spawn_server(no_content()).await;
    let client = HttpClient::new(&connection_config(&address)).unwrap();

    client.ping(Duration::from_secs(1)).await.unwrap();
    let requests = captured.lock().unwrap().clone();
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_write_sends_line_protocol() {
    let (address, captured) = spawn_server(no_content()).await;
    let client = HttpClient::new(&connection_config(&address)).unwrap();

    client.write(&batch()).await.unwrap();

    let requests = captured.lock().unwrap().clone();
    let request = &requests[0];
    assert!(
        request
            .request_line
            .starts_with("POST /write?db=metrics&precision=s&rp=weekly "),
        "{}",
        request.request_line
    );
    assert_eq!(request.headers["content-type"], "application/octet-stream");
    assert_eq!(
        request.body,
        "requests.count,host=web-1 value=42i 1700000000\n"
    );
}

#[tokio::test]
async fn test_write_error_message_from_json_body() {
    let (address, _) = spawn_server(CannedResponse {
        status: "400 Bad Request",
        headers: vec![("Content-Type", "application/json")],
        body: r#"{"error":"unable to parse 'bad line'"}"#,
    })
    .await;
    let client = HttpClient::new(&connection_config(&address)).unwrap();

    let err = client.write(&batch()).await.unwrap_err();
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "unable to parse 'bad line'");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_write_error_falls_back_to_raw_body() {
    let (address, _) = spawn_server(CannedResponse {
        status: "503 Service Unavailable",
        headers: vec![],
        body: "overloaded\n",
    })
    .await;
    let client = HttpClient::new(&connection_config(&address)).unwrap();

    let err = client.write(&batch()).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Status { status: 503, ref message } if message == "overloaded"
    ));
}

#[tokio::test]
async fn test_unreachable_store_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = HttpConnector::new()
        .connect(&connection_config(&address))
        .expect("creating a client does no I/O");
    let err = client.ping(Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn test_reporter_flush_over_http() {
    let (address, captured) = spawn_server(no_content()).await;
    let registry = Arc::new(Registry::new());
    registry.counter("requests").unwrap().inc(42);

    let config = ReporterConfig {
        address,
        database: "metrics".to_string(),
        tags: BTreeMap::from([("host".to_string(), "web-1".to_string())]),
        ..Default::default()
    };
    let reporter = Reporter::connect(registry, &config, Arc::new(HttpConnector::new()))
        .expect("address is valid");
    assert_eq!(reporter.flush().await.unwrap(), 1);

    let requests = captured.lock().unwrap().clone();
    assert!(requests[0].request_line.starts_with("POST /write?db=metrics&precision=ns "));
    assert!(
        requests[0]
            .body
            .starts_with("requests.count,host=web-1 value=42i ")
    );
}
