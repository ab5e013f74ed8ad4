#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use staffing_api::config::{AppConfig, DatabaseConfig, StoreBackend};
use staffing_api::database::{Database, PgStore};
use staffing_api::server;
use staffing_api::state::AppState;

static SCHEMA_READY: tokio::sync::OnceCell<()> = tokio::sync::OnceCell::const_new();

/// Postgres store from `DATABASE_URL`, or `None` when the variable is unset
/// so database-backed tests skip on machines without one.
pub async fn pg_store() -> Result<Option<PgStore>> {
    let _ = dotenvy::dotenv();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping Postgres-backed test");
        return Ok(None);
    };

    let config = DatabaseConfig {
        backend: StoreBackend::Postgres,
        url: Some(url),
        max_connections: 5,
        connection_timeout: 10,
    };
    let db = Database::connect(&config)
        .await
        .context("failed to connect to DATABASE_URL")?;
    SCHEMA_READY
        .get_or_try_init(|| async { db.ensure_schema().await })
        .await
        .context("failed to prepare schema")?;
    Ok(Some(PgStore::new(db)))
}

/// An email no other test run has used, so a shared database stays usable.
pub fn unique_email(name: &str) -> String {
    format!("{}.{}@pg.test", name.to_lowercase(), uuid::Uuid::new_v4().simple())
}

/// A fresh app over an empty in-memory store.
pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_state(AppState::memory())
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            router: server::app(state, &AppConfig::development()),
        }
    }

    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let raw = match body {
            Some(json) => Body::from(serde_json::to_vec(&json)?),
            None => Body::empty(),
        };
        self.send_raw(method, path, raw).await
    }

    pub async fn send_raw(&self, method: Method, path: &str, body: Body) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .context("failed to build request")?;

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };
        Ok((status, json))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, path, None).await
    }

    /// POST an employee and return its id, failing the test if it was rejected.
    pub async fn employee(&self, body: Value) -> Result<String> {
        let (status, json) = self.post("/employee", body).await?;
        anyhow::ensure!(status == StatusCode::OK, "create failed: {} {}", status, json);
        id_of(&json)
    }

    pub async fn project(&self, body: Value) -> Result<String> {
        let (status, json) = self.post("/project", body).await?;
        anyhow::ensure!(status == StatusCode::OK, "create failed: {} {}", status, json);
        id_of(&json)
    }
}

pub fn id_of(envelope: &Value) -> Result<String> {
    envelope["data"]["id"]
        .as_str()
        .map(str::to_string)
        .context("response has no data.id")
}

pub fn assert_fail(status: StatusCode, body: &Value, message: &str) {
    assert_eq!(status, StatusCode::BAD_REQUEST, "unexpected status: {}", body);
    assert_eq!(body["status"], "fail", "unexpected envelope: {}", body);
    assert_eq!(body["message"], message, "unexpected message: {}", body);
}
