use crate::task::repository::TaskRepository;
use crate::task::{NewTask, Task, TaskDraft, TaskStatus, TaskUpdate};
use sea_orm::DbErr;

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Represents a task not found error.
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct TaskService<'a> {
    repository: &'a dyn TaskRepository,
}

impl TaskService<'_> {
    pub fn new(repository: &dyn TaskRepository) -> TaskService<'_> {
        TaskService { repository }
    }

    /// Retrieves all tasks.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.repository.find_all().await?)
    }

    /// Retrieves the tasks with exactly the given status.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.repository.find_by_status(status).await?)
    }

    /// Retrieves the tasks whose title contains `fragment`, ignoring case.
    #[tracing::instrument(skip(self))]
    pub async fn search_by_title(&self, fragment: &str) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.repository.find_by_title_containing(fragment).await?)
    }

    /// Retrieves a task by its ID. A missing task is `Ok(None)`.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Task>, TaskServiceError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Creates a new task.
    ///
    /// The task always starts as [`TaskStatus::Pending`].
    ///
    /// # Arguments
    ///
    /// * `new_task` - Title and description, already validated.
    ///
    /// # Returns
    ///
    /// A `Result` containing the stored `Task` with its assigned ID.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, new_task: NewTask) -> Result<Task, TaskServiceError> {
        tracing::info!("Creating task '{}'", new_task.title);
        let draft = TaskDraft::new(new_task.title, new_task.description);
        let created = self.repository.save(draft).await?;
        tracing::info!("Created task with ID {}", created.id());
        Ok(created)
    }

    /// Replaces the title and description of a task, and its status if one is given.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to update.
    /// * `update` - The new field values. A `None` status keeps the stored one.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Task`, or `TaskNotFound` if there is
    /// no task with that ID.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: i32, update: TaskUpdate) -> Result<Task, TaskServiceError> {
        tracing::info!("Updating task with ID {}", id);
        let mut draft = TaskDraft::from(self.existing(id).await?);
        draft.title = update.title;
        draft.description = update.description;
        if let Some(status) = update.status {
            draft.status = status;
        }
        let updated = self.store(id, draft).await?;
        tracing::info!("Updated task with ID {}", id);
        Ok(updated)
    }

    /// Sets the status of a task, leaving every other field untouched.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Task`, or `TaskNotFound` if there is
    /// no task with that ID.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: i32,
        status: TaskStatus,
    ) -> Result<Task, TaskServiceError> {
        tracing::info!("Changing status of task {} to {}", id, status);
        let mut draft = TaskDraft::from(self.existing(id).await?);
        draft.status = status;
        let updated = self.store(id, draft).await?;
        tracing::info!("Changed status of task {} to {}", id, status);
        Ok(updated)
    }

    /// Deletes a task by its ID.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the task is gone, or `TaskNotFound` if there is no task
    /// with that ID.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), TaskServiceError> {
        tracing::info!("Deleting task with ID {}", id);
        if !self.repository.exists_by_id(id).await? {
            return Err(TaskServiceError::TaskNotFound(id));
        }
        self.repository.delete_by_id(id).await?;
        tracing::info!("Deleted task with ID {}", id);
        Ok(())
    }

    async fn existing(&self, id: i32) -> Result<Task, TaskServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    /// Saves a draft of an existing task. A row deleted since it was read is
    /// reported as not found.
    async fn store(&self, id: i32, draft: TaskDraft) -> Result<Task, TaskServiceError> {
        self.repository.save(draft).await.map_err(|err| match err {
            DbErr::RecordNotUpdated => TaskServiceError::TaskNotFound(id),
            other => TaskServiceError::Database(other),
        })
    }
}
