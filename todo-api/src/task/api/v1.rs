use crate::task::repository::TaskRepository;
use crate::task::validation::{self, ValidationError};
use crate::task::{NewTask, Task, TaskService, TaskServiceError, TaskStatus, TaskUpdate};
use crate::web::api::v1::{INTERNAL_ERROR_MESSAGE, ServerErrorResponse};
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

/// Shared state for the task routes.
#[derive(Clone)]
pub struct TaskState {
    pub repository: Arc<dyn TaskRepository>,
}

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    /// Unique identifier assigned on creation
    pub id: i32,
    /// Short title of the task
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Lifecycle status
    pub status: TaskStatus,
    /// When the task was created
    pub created_at: DateTime<Utc>,
    /// When the task was last saved
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            description: task.description().map(str::to_string),
            status: task.status(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

/// Request body for creating a task. Any status sent by the caller is ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// Title, 1 to 100 characters
    title: String,
    /// Optional description, at most 500 characters
    #[serde(default)]
    description: Option<String>,
}

impl CreateTaskRequest {
    fn validate(self) -> Result<NewTask, ValidationError> {
        validation::validate_title(&self.title)?;
        validation::validate_description(self.description.as_deref())?;
        Ok(NewTask {
            title: self.title,
            description: self.description,
        })
    }
}

/// Request body for a full update of a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    /// Title, 1 to 100 characters
    title: String,
    /// Optional description, at most 500 characters. Omitting it clears the description.
    #[serde(default)]
    description: Option<String>,
    /// Optional status symbol, case-insensitive. Omitting it keeps the current status.
    #[serde(default)]
    status: Option<String>,
}

impl UpdateTaskRequest {
    fn validate(self) -> Result<TaskUpdate, ValidationError> {
        validation::validate_title(&self.title)?;
        validation::validate_description(self.description.as_deref())?;
        let status = self
            .status
            .as_deref()
            .map(validation::parse_status)
            .transpose()?;
        Ok(TaskUpdate {
            title: self.title,
            description: self.description,
            status,
        })
    }
}

/// Request body for changing only the status of a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    /// Status symbol, case-insensitive
    status: String,
}

/// Query parameters for filtering the task list.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TasksQuery {
    /// Only return tasks with this status (case-insensitive)
    #[serde(default)]
    status: Option<String>,
    /// Only return tasks whose title contains this text (case-insensitive)
    #[serde(default)]
    title: Option<String>,
}

/// Error type for the task API handlers.
#[derive(Debug, thiserror::Error)]
pub enum TaskApiError {
    /// The request was rejected before reaching the service.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The referenced task does not exist.
    #[error("Task with ID {0} not found")]
    NotFound(i32),
    /// Anything else. The detail is logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TaskServiceError> for TaskApiError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::TaskNotFound(id) => TaskApiError::NotFound(id),
            TaskServiceError::Database(db_err) => TaskApiError::Internal(db_err.to_string()),
        }
    }
}

impl From<JsonRejection> for TaskApiError {
    fn from(rejection: JsonRejection) -> Self {
        TaskApiError::Validation(ValidationError::MalformedBody(rejection.body_text()))
    }
}

impl From<PathRejection> for TaskApiError {
    fn from(rejection: PathRejection) -> Self {
        TaskApiError::Validation(ValidationError::MalformedRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for TaskApiError {
    fn from(rejection: QueryRejection) -> Self {
        TaskApiError::Validation(ValidationError::MalformedRequest(rejection.body_text()))
    }
}

impl IntoResponse for TaskApiError {
    fn into_response(self) -> Response {
        let (status_code, message) = match &self {
            TaskApiError::Validation(err) => {
                tracing::warn!("Rejected task request: {}", err);
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            TaskApiError::NotFound(_) => {
                tracing::warn!("{}", self);
                (StatusCode::NOT_FOUND, self.to_string())
            }
            TaskApiError::Internal(detail) => {
                tracing::error!("Task request failed: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string())
            }
        };
        (status_code, Json(ServerErrorResponse::new(message))).into_response()
    }
}

/// Handler for GET /api/v1/tasks - Returns all tasks, optionally filtered.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(TasksQuery),
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = Vec<TaskJson>),
        (status = 400, description = "Unknown status symbol", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
    query: Result<Query<TasksQuery>, QueryRejection>,
) -> Result<Json<Vec<TaskJson>>, TaskApiError> {
    tracing::info!("GET /api/v1/tasks");
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .map(validation::parse_status)
        .transpose()?;
    let service = TaskService::new(state.repository.as_ref());

    let tasks = match (query.title.as_deref(), status) {
        (Some(fragment), status) => {
            let mut found = service.search_by_title(fragment).await?;
            if let Some(status) = status {
                found.retain(|task| task.status() == status);
            }
            found
        }
        (None, Some(status)) => service.list_by_status(status).await?,
        (None, None) => service.list_all().await?,
    };

    Ok(Json(tasks.into_iter().map(TaskJson::from).collect()))
}

/// Handler for GET /api/v1/tasks/{id} - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = TaskJson),
        (status = 404, description = "Task not found", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<TaskJson>, TaskApiError> {
    let Path(id) = id?;
    tracing::info!("GET /api/v1/tasks/{}", id);
    let service = TaskService::new(state.repository.as_ref());
    let task = service
        .get_by_id(id)
        .await?
        .ok_or(TaskApiError::NotFound(id))?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for POST /api/v1/tasks - Creates a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 400, description = "Invalid task", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskJson>), TaskApiError> {
    let Json(request) = payload?;
    tracing::info!("POST /api/v1/tasks - {}", request.title);
    let new_task = request.validate()?;

    let service = TaskService::new(state.repository.as_ref());
    let created = service.create(new_task).await?;
    Ok((StatusCode::CREATED, Json(TaskJson::from(created))))
}

/// Handler for PUT /api/v1/tasks/{id} - Replaces a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskJson),
        (status = 400, description = "Invalid task", body = ServerErrorResponse),
        (status = 404, description = "Task not found", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskJson>, TaskApiError> {
    let Path(id) = id?;
    tracing::info!("PUT /api/v1/tasks/{}", id);
    let Json(request) = payload?;
    let update = request.validate()?;

    let service = TaskService::new(state.repository.as_ref());
    let updated = service.update(id, update).await?;
    Ok(Json(TaskJson::from(updated)))
}

/// Handler for PATCH /api/v1/tasks/{id}/status - Changes only the status.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{id}/status",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = TaskJson),
        (status = 400, description = "Unknown status symbol", body = ServerErrorResponse),
        (status = 404, description = "Task not found", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn change_status_handler(
    State(state): State<Arc<TaskState>>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> Result<Json<TaskJson>, TaskApiError> {
    let Path(id) = id?;
    tracing::info!("PATCH /api/v1/tasks/{}/status", id);
    let Json(request) = payload?;
    let status = validation::parse_status(&request.status)?;

    let service = TaskService::new(state.repository.as_ref());
    let updated = service.change_status(id, status).await?;
    Ok(Json(TaskJson::from(updated)))
}

/// Handler for DELETE /api/v1/tasks/{id} - Deletes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, TaskApiError> {
    let Path(id) = id?;
    tracing::info!("DELETE /api/v1/tasks/{}", id);
    let service = TaskService::new(state.repository.as_ref());
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .route("/tasks/{id}/status", patch(change_status_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn create_request_ignores_smuggled_status() {
        let request: CreateTaskRequest =
            serde_json::from_str(r#"{"title":"Buy milk","status":"DONE"}"#).unwrap();
        let new_task = request.validate().unwrap();
        assert_eq!(
            new_task,
            NewTask {
                title: "Buy milk".to_string(),
                description: None
            }
        );
    }

    #[test]
    fn update_request_parses_status_ignoring_case() {
        let request: UpdateTaskRequest =
            serde_json::from_str(r#"{"title":"Report","status":"in_progress"}"#).unwrap();
        let update = request.validate().unwrap();
        assert_eq!(update.status, Some(TaskStatus::InProgress));
        assert_eq!(update.description, None);
    }

    #[test]
    fn update_request_rejects_unknown_status() {
        let request: UpdateTaskRequest =
            serde_json::from_str(r#"{"title":"Report","status":"later"}"#).unwrap();
        assert!(matches!(
            request.validate(),
            Err(ValidationError::UnknownStatus(_))
        ));
    }

    #[test]
    fn task_json_uses_camel_case_and_null_description() {
        let now = Utc::now();
        let task = Task::new(1, "Buy milk".to_string(), None, TaskStatus::Pending, now, now);
        let json = serde_json::to_value(TaskJson::from(task)).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["status"], "PENDING");
        assert!(json["description"].is_null());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[tokio::test]
    async fn can_hide_internal_detail_from_the_response() {
        let err = TaskApiError::from(TaskServiceError::Database(DbErr::Custom(
            "password authentication failed".to_string(),
        )));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_text = std::str::from_utf8(&body).unwrap();
        assert!(!body_text.contains("password"));
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = TaskApiError::from(TaskServiceError::TaskNotFound(4)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
