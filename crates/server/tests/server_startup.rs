//! Tests that run the built binaries against a local S3 listing endpoint.

use std::collections::HashMap;
use std::io::Write;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use reqwest::{redirect, Client, StatusCode};
use tempfile::NamedTempFile;
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout};

const BUCKET: &str = "s1-orbits";
const GRANULE_2023: &str = "S1A_IW_GRDH_1SDV_20230515T075514_20230515T075542_048541_05D6B8_579B";
const GRANULE_2024: &str = "S1A_IW_GRDH_1SDV_20240515T075514_20240515T075542_048541_05D6B8_579B";
const POEORB_KEY: &str =
    "AUX_POEORB/S1A_OPER_AUX_POEORB_OPOD_20230604T080854_V20230514T225942_20230516T005942.EOF";

/// Answer `ListObjectsV2` for a fixed set of keys, filtered by prefix.
async fn list_objects(
    State(keys): State<Arc<Vec<String>>>,
    Path(bucket): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let prefix = params.get("prefix").cloned().unwrap_or_default();
    let contents: String = keys
        .iter()
        .filter(|k| k.starts_with(&prefix))
        .map(|k| format!("<Contents><Key>{}</Key><Size>0</Size></Contents>", k))
        .collect();
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>{}</Name><Prefix>{}</Prefix><IsTruncated>false</IsTruncated>{}</ListBucketResult>"#,
        bucket, prefix, contents
    );
    ([(header::CONTENT_TYPE, "application/xml")], body)
}

/// Serve the given keys as the mirror bucket and return the endpoint URL.
async fn spawn_s3_stub(keys: &[&str]) -> String {
    let keys = Arc::new(keys.iter().map(|k| k.to_string()).collect::<Vec<_>>());
    let app = Router::new()
        .route("/{bucket}", get(list_objects))
        .route("/{bucket}/", get(list_objects))
        .with_state(keys);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn available_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// An `orbits-api` process serving a stubbed bucket.
struct RunningApi {
    _child: Child,
    _config: NamedTempFile,
    base_url: String,
    client: Client,
}

impl RunningApi {
    async fn start(keys: &[&str]) -> Self {
        let endpoint = spawn_s3_stub(keys).await;
        let port = available_port();
        let config = write_config(&format!(
            r#"
[server]
host = "127.0.0.1"
port = {port}

[storage]
bucket = "{BUCKET}"
region = "us-east-1"
endpoint = "{endpoint}"
force_path_style = true

[upstream]
username = "me"
password = "hunter2"
"#
        ));

        let child = Command::new(env!("CARGO_BIN_EXE_orbits-api"))
            .env("ORBITS_CONFIG", config.path())
            .env("AWS_ACCESS_KEY_ID", "test")
            .env("AWS_SECRET_ACCESS_KEY", "test")
            .env("AWS_EC2_METADATA_DISABLED", "true")
            .env("RUST_LOG", "error")
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn orbits-api");

        let api = Self {
            _child: child,
            _config: config,
            base_url: format!("http://127.0.0.1:{}", port),
            client: Client::builder()
                .redirect(redirect::Policy::none())
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap(),
        };
        assert!(api.wait_ready().await, "orbits-api did not start in time");
        api
    }

    async fn wait_ready(&self) -> bool {
        for _ in 0..100 {
            if self.get("/api/v1/health").await.is_ok() {
                return true;
            }
            sleep(Duration::from_millis(50)).await;
        }
        false
    }

    async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
    }
}

/// Run a binary to completion with the given config.
async fn run_to_exit(binary: &str, config: Option<&str>, args: &[&str]) -> ExitStatus {
    let file = config.map(write_config);
    let mut command = Command::new(binary);
    command
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("ORBITS_UPSTREAM__USERNAME")
        .env_remove("ORBITS_UPSTREAM__PASSWORD");
    match &file {
        Some(file) => command.env("ORBITS_CONFIG", file.path()),
        None => command.env("ORBITS_CONFIG", "/nonexistent/config.toml"),
    };

    timeout(Duration::from_secs(5), command.output())
        .await
        .expect("Command timed out")
        .expect("Failed to execute command")
        .status
}

#[tokio::test]
async fn test_running_api_redirects_to_covering_orbit() {
    let api = RunningApi::start(&[POEORB_KEY]).await;

    let response = api.get(&format!("/{}", GRANULE_2023)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[reqwest::header::LOCATION],
        format!("https://{}.s3.amazonaws.com/{}", BUCKET, POEORB_KEY)
    );
}

#[tokio::test]
async fn test_running_api_reports_missing_orbit() {
    let api = RunningApi::start(&[POEORB_KEY]).await;

    let response = api.get(&format!("/{}", GRANULE_2024)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.text().await.unwrap(),
        format!("No orbit file found for {}", GRANULE_2024)
    );
}

#[tokio::test]
async fn test_running_api_rejects_malformed_granule() {
    let api = RunningApi::start(&[]).await;

    let response = api.get("/S1A_not_a_granule").await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_running_api_serves_sanitized_config() {
    let api = RunningApi::start(&[]).await;

    let json: serde_json::Value = api
        .get("/api/v1/config")
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["storage"]["bucket"], BUCKET);
    assert_eq!(json["storage"]["force_path_style"], true);
    assert_eq!(json["upstream"]["password_configured"], true);
    assert!(!json.to_string().contains("hunter2"));
}

#[tokio::test]
async fn test_api_exits_on_bad_config() {
    let api = env!("CARGO_BIN_EXE_orbits-api");

    assert!(!run_to_exit(api, None, &[]).await.success());
    assert!(!run_to_exit(api, Some("[server]\nport = 8080\n"), &[]).await.success());

    let ttl_too_long = r#"
[storage]
bucket = "s1-orbits"
region = "us-east-1"

[resolver]
listing_ttl_secs = 3600
"#;
    assert!(!run_to_exit(api, Some(ttl_too_long), &[]).await.success());
}

#[tokio::test]
async fn test_sync_exits_without_credentials() {
    let config = r#"
[storage]
bucket = "s1-orbits"
region = "us-east-1"
"#;
    let sync = env!("CARGO_BIN_EXE_orbits-sync");
    let status = run_to_exit(sync, Some(config), &["AUX_POEORB"]).await;

    assert!(!status.success());
}

#[tokio::test]
async fn test_sync_rejects_unknown_orbit_type() {
    let config = r#"
[storage]
bucket = "s1-orbits"
region = "us-east-1"

[upstream]
username = "me"
password = "hunter2"
"#;
    let sync = env!("CARGO_BIN_EXE_orbits-sync");
    let status = run_to_exit(sync, Some(config), &["AUX_NOPE"]).await;

    assert!(!status.success());
}
