//! Persistence access for tasks.
//!
//! [`TaskRepository`] is the seam between the service layer and the store.
//! Two adapters are provided:
//! - [`SeaOrmTaskRepository`], backed by the `tasks` table through SeaORM
//! - [`InMemoryTaskRepository`], backed by an ordered map, used by the tests

use crate::entities::task;
use crate::task::{Task, TaskDraft, TaskStatus};
use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::*;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Trait defining the storage operations for tasks.
///
/// Implementations do not validate anything; that happens before the
/// service layer is reached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Returns every task in insertion order.
    async fn find_all(&self) -> Result<Vec<Task>, DbErr>;

    /// Returns the task with the given ID, or `None` if there is none.
    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, DbErr>;

    /// Returns the tasks whose status is exactly `status`.
    async fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, DbErr>;

    /// Returns the tasks whose title contains `fragment`, ignoring case.
    async fn find_by_title_containing(&self, fragment: &str) -> Result<Vec<Task>, DbErr>;

    /// Inserts the draft if it has no ID, otherwise overwrites the row with that ID.
    ///
    /// # Returns
    ///
    /// The stored task, including its assigned ID and timestamps. Saving a draft
    /// whose ID has no row fails with `DbErr::RecordNotUpdated`.
    async fn save(&self, draft: TaskDraft) -> Result<Task, DbErr>;

    /// Checks whether a task with the given ID exists.
    async fn exists_by_id(&self, id: i32) -> Result<bool, DbErr>;

    /// Deletes the task with the given ID. Callers check existence first.
    async fn delete_by_id(&self, id: i32) -> Result<(), DbErr>;
}

/// Escapes LIKE wildcards so the fragment matches literally.
fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Repository implementation over a SeaORM database connection.
pub struct SeaOrmTaskRepository {
    db: DatabaseConnection,
}

impl SeaOrmTaskRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepository for SeaOrmTaskRepository {
    #[tracing::instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Task>, DbErr> {
        let tasks = task::Entity::find()
            .order_by_asc(task::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, DbErr> {
        let model = task::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Task::from))
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, DbErr> {
        let tasks = task::Entity::find()
            .filter(task::Column::Status.eq(task::Status::from(status)))
            .order_by_asc(task::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_title_containing(&self, fragment: &str) -> Result<Vec<Task>, DbErr> {
        let pattern = LikeExpr::new(like_pattern(fragment)).escape('\\');
        let tasks = task::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(task::Column::Title))).like(pattern))
            .order_by_asc(task::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn save(&self, draft: TaskDraft) -> Result<Task, DbErr> {
        let saved_model = match draft.id {
            None => {
                let active_model = task::ActiveModel {
                    title: ActiveValue::Set(draft.title),
                    description: ActiveValue::Set(draft.description),
                    status: ActiveValue::Set(draft.status.into()),
                    ..Default::default()
                };
                active_model.insert(&self.db).await?
            }
            Some(id) => {
                let active_model = task::ActiveModel {
                    id: ActiveValue::Unchanged(id),
                    title: ActiveValue::Set(draft.title),
                    description: ActiveValue::Set(draft.description),
                    status: ActiveValue::Set(draft.status.into()),
                    ..Default::default()
                };
                active_model.update(&self.db).await?
            }
        };
        Ok(Task::from(saved_model))
    }

    #[tracing::instrument(skip(self))]
    async fn exists_by_id(&self, id: i32) -> Result<bool, DbErr> {
        let count = task::Entity::find_by_id(id).count(&self.db).await?;
        Ok(count > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: i32) -> Result<(), DbErr> {
        task::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryTasks {
    rows: BTreeMap<i32, Task>,
    last_id: i32,
}

/// Repository implementation that keeps tasks in process memory.
///
/// IDs are assigned from a counter that never reuses a value, so map order
/// is insertion order.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<InMemoryTasks>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn matching<F>(&self, predicate: F) -> Vec<Task>
    where
        F: Fn(&Task) -> bool + Send,
    {
        self.tasks
            .read()
            .await
            .rows
            .values()
            .filter(|task| predicate(*task))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn find_all(&self) -> Result<Vec<Task>, DbErr> {
        Ok(self.matching(|_| true).await)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, DbErr> {
        Ok(self.tasks.read().await.rows.get(&id).cloned())
    }

    async fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, DbErr> {
        Ok(self.matching(|task| task.status() == status).await)
    }

    async fn find_by_title_containing(&self, fragment: &str) -> Result<Vec<Task>, DbErr> {
        let needle = fragment.to_lowercase();
        Ok(self
            .matching(|task| task.title().to_lowercase().contains(&needle))
            .await)
    }

    async fn save(&self, draft: TaskDraft) -> Result<Task, DbErr> {
        let mut tasks = self.tasks.write().await;
        let now = chrono::Utc::now();
        let saved = match draft.id {
            None => {
                tasks.last_id += 1;
                Task::new(
                    tasks.last_id,
                    draft.title,
                    draft.description,
                    draft.status,
                    now,
                    now,
                )
            }
            Some(id) => {
                let existing = tasks.rows.get(&id).ok_or(DbErr::RecordNotUpdated)?;
                Task::new(
                    id,
                    draft.title,
                    draft.description,
                    draft.status,
                    existing.created_at(),
                    now,
                )
            }
        };
        tasks.rows.insert(saved.id(), saved.clone());
        Ok(saved)
    }

    async fn exists_by_id(&self, id: i32) -> Result<bool, DbErr> {
        Ok(self.tasks.read().await.rows.contains_key(&id))
    }

    async fn delete_by_id(&self, id: i32) -> Result<(), DbErr> {
        self.tasks.write().await.rows.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> TaskDraft {
        TaskDraft::new(title.to_string(), None)
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Milk"), "%milk%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[tokio::test]
    async fn can_assign_increasing_ids_in_insertion_order() {
        let repository = InMemoryTaskRepository::new();
        let first = repository.save(draft("First")).await.unwrap();
        let second = repository.save(draft("Second")).await.unwrap();

        assert!(second.id() > first.id());
        let all = repository.find_all().await.unwrap();
        assert_eq!(all, vec![first, second]);
    }

    #[tokio::test]
    async fn does_not_reuse_ids_after_delete() {
        let repository = InMemoryTaskRepository::new();
        let first = repository.save(draft("First")).await.unwrap();
        repository.delete_by_id(first.id()).await.unwrap();
        let second = repository.save(draft("Second")).await.unwrap();

        assert_ne!(first.id(), second.id());
        assert!(!repository.exists_by_id(first.id()).await.unwrap());
    }

    #[tokio::test]
    async fn can_update_in_place_keeping_created_at() {
        let repository = InMemoryTaskRepository::new();
        let created = repository.save(draft("Draft")).await.unwrap();

        let mut changes = TaskDraft::from(created.clone());
        changes.title = "Final".to_string();
        changes.status = TaskStatus::Done;
        let updated = repository.save(changes).await.unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.title(), "Final");
        assert_eq!(updated.status(), TaskStatus::Done);
        assert_eq!(updated.created_at(), created.created_at());
        assert!(updated.updated_at() >= created.updated_at());
        assert_eq!(repository.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn saving_missing_id_is_record_not_updated() {
        let repository = InMemoryTaskRepository::new();
        let mut ghost = draft("Ghost");
        ghost.id = Some(42);

        let result = repository.save(ghost).await;
        assert!(matches!(result, Err(DbErr::RecordNotUpdated)));
    }

    #[tokio::test]
    async fn can_search_titles_ignoring_case() {
        let repository = InMemoryTaskRepository::new();
        let milk = repository.save(draft("Buy MILK")).await.unwrap();
        repository.save(draft("Walk the dog")).await.unwrap();

        let found = repository.find_by_title_containing("milk").await.unwrap();
        assert_eq!(found, vec![milk]);
        assert!(
            repository
                .find_by_title_containing("cheese")
                .await
                .unwrap()
                .is_empty()
        );
    }
}
