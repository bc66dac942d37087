//! Shared test helpers for integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use testpool_api::{AppState, build_router};
use testpool_core::config::AppConfig;
use testpool_store::{AllocationStore, PoolService};

/// Header row used by most fixtures.
pub const HEADER: &str =
    "Premise_ID,Post_Code,Street_Name,Dummy_Device_ID,Utilized_PID,Utilized_Dev,Test_Case_ID";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Pool file backing the router
    pub pool_path: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    /// App over a pool file holding `HEADER` and the given rows.
    pub fn with_rows(rows: &[&str]) -> Self {
        let mut body = format!("{HEADER}\n");
        for row in rows {
            body.push_str(row);
            body.push('\n');
        }
        Self::with_contents(Some(&body))
    }

    /// App over a pool file with exact contents, or no file when `None`.
    pub fn with_contents(contents: Option<&str>) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let pool_path = dir.path().join("premise_data.csv");
        if let Some(contents) = contents {
            std::fs::write(&pool_path, contents).expect("Failed to write pool fixture");
        }

        let mut config = AppConfig::default();
        config.pool.path = pool_path.to_string_lossy().into_owned();
        config.pool.lock_timeout_ms = 2_000;
        config.pool.lock_poll_interval_ms = 2;

        let service = PoolService::new(AllocationStore::from_config(&config.pool));
        let router = build_router(AppState::new(config, Arc::new(service)));

        Self {
            router,
            pool_path,
            _dir: dir,
        }
    }

    /// Current pool file contents.
    pub fn pool_contents(&self) -> String {
        std::fs::read_to_string(&self.pool_path).expect("Failed to read pool file")
    }

    /// Make a request and return status + JSON body
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        match body {
            Some(json) => {
                self.request_raw(method, uri, Some("application/json"), json.to_string())
                    .await
            }
            None => self.request_raw(method, uri, None, String::new()).await,
        }
    }

    /// Make a request with a raw body and optional content type
    pub async fn request_raw(
        &self,
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }
        let body = if body.is_empty() {
            Body::empty()
        } else {
            Body::from(body)
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("Failed to build request"))
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    /// POST /api/reservations
    pub async fn reserve(&self, kind: &str, tag: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/api/reservations",
            Some(serde_json::json!({ "kind": kind, "tag": tag })),
        )
        .await
    }
}
