use std::sync::Arc;

use crate::task::api::v1::{self as tasks_v1, TaskState};

use axum::Router;
use utoipa::OpenApi;

pub mod v1 {
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    /// Body text for any failure whose detail must stay in the logs.
    pub const INTERNAL_ERROR_MESSAGE: &str =
        "An unexpected error occurred while processing your request. Please try again later.";

    /// JSON body returned for every failed API request.
    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct ServerErrorResponse {
        /// Human-readable description of what went wrong
        pub error: String,
    }

    impl ServerErrorResponse {
        pub fn new(error: String) -> Self {
            Self { error }
        }
    }
}

/// OpenAPI document for the JSON API.
#[derive(OpenApi)]
#[openapi(
    paths(
        tasks_v1::list_tasks_handler,
        tasks_v1::get_task_handler,
        tasks_v1::create_task_handler,
        tasks_v1::update_task_handler,
        tasks_v1::change_status_handler,
        tasks_v1::delete_task_handler,
    ),
    components(schemas(
        tasks_v1::TaskJson,
        tasks_v1::CreateTaskRequest,
        tasks_v1::UpdateTaskRequest,
        tasks_v1::ChangeStatusRequest,
        crate::task::TaskStatus,
        v1::ServerErrorResponse,
    )),
    tags((name = "Tasks", description = "Task management"))
)]
pub struct ApiDoc;

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(task_state: Arc<TaskState>) -> axum::Router {
    let tasks_router = tasks_v1::create_api_router(task_state);
    Router::new().nest("/api/v1", tasks_router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_every_task_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        assert_eq!(
            paths,
            vec![
                "/api/v1/tasks",
                "/api/v1/tasks/{id}",
                "/api/v1/tasks/{id}/status"
            ]
        );
    }
}
