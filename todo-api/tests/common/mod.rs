#![allow(dead_code)] // each test binary uses a different subset of these helpers

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};
use todo_api::task::TaskRepository;
use todo_api::task::api::v1::TaskState;
use todo_api::task::InMemoryTaskRepository;
use tower::ServiceExt;

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

pub async fn setup_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Builds the full application over the given repository.
pub fn app_with(repository: Arc<dyn TaskRepository>) -> Router {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    todo_api::web::create_app(Arc::new(TaskState { repository }))
}

/// Builds the full application over an empty in-memory repository.
pub fn in_memory_app() -> Router {
    app_with(Arc::new(InMemoryTaskRepository::new()))
}

/// A response with its body decoded as JSON (`Null` when the body is empty).
pub struct JsonResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Sends a request through the router and decodes the response.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> JsonResponse {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    send_request(app, request).await
}

/// Sends a prepared request through the router and decodes the response.
pub async fn send_request(app: &Router, request: Request<Body>) -> JsonResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    JsonResponse {
        status,
        headers,
        body,
    }
}
