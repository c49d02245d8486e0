use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use migration::MigratorTrait;
use sea_orm::Database;
use std::any::Any;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::task::SeaOrmTaskRepository;
use crate::task::api::v1::TaskState;
use api::v1::{INTERNAL_ERROR_MESSAGE, ServerErrorResponse};

pub mod api;

/// Builds the complete application router around the given task state.
pub fn create_app(task_state: Arc<TaskState>) -> axum::Router {
    use axum::Router;

    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(api::create_api_router(task_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
}

/// Turns a panicking handler into the generic 500 body instead of a dropped connection.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic payload"
    };
    tracing::error!("Request handler panicked: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ServerErrorResponse::new(INTERNAL_ERROR_MESSAGE.to_string())),
    )
        .into_response()
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let task_state = Arc::new(TaskState {
        repository: Arc::new(SeaOrmTaskRepository::new(db)),
    });

    axum::serve(listener, create_app(task_state)).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
