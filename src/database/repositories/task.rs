//! Task repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::{TaskDbModel, TaskStatus, TaskType};
use crate::database::time;
use crate::{Error, Result};

/// Task repository trait.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn get_task(&self, id: &str) -> Result<TaskDbModel>;
    async fn list_tasks_by_status(
        &self,
        status: TaskStatus,
        task_type: Option<TaskType>,
        limit: Option<i64>,
    ) -> Result<Vec<TaskDbModel>>;
    async fn list_tasks_by_item(&self, item_id: &str) -> Result<Vec<TaskDbModel>>;
    async fn create_task(&self, task: &TaskDbModel) -> Result<()>;
    /// Set the progress fraction, clamped to [0, 1].
    async fn set_progress(&self, id: &str, progress: f64) -> Result<()>;
    async fn set_result(&self, id: &str, result: &str) -> Result<()>;
    async fn increment_retry(&self, id: &str) -> Result<i64>;
    /// Single atomic status update applying the state-machine bookkeeping.
    /// The caller ([`crate::pipeline::StatusMachine`]) decides the flags.
    async fn apply_transition(
        &self,
        id: &str,
        status: TaskStatus,
        error_message: Option<&str>,
        result: Option<&str>,
    ) -> Result<TaskDbModel>;
    async fn delete_task(&self, id: &str) -> Result<()>;
}

/// SQLx implementation of TaskRepository.
pub struct SqlxTaskRepository {
    pool: SqlitePool,
}

impl SqlxTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqlxTaskRepository {
    async fn get_task(&self, id: &str) -> Result<TaskDbModel> {
        sqlx::query_as::<_, TaskDbModel>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("Task", id))
    }

    async fn list_tasks_by_status(
        &self,
        status: TaskStatus,
        task_type: Option<TaskType>,
        limit: Option<i64>,
    ) -> Result<Vec<TaskDbModel>> {
        let tasks = match task_type {
            Some(task_type) => {
                sqlx::query_as::<_, TaskDbModel>(
                    "SELECT * FROM tasks WHERE status = ? AND task_type = ? \
                     ORDER BY created_at LIMIT ?",
                )
                .bind(status.as_str())
                .bind(task_type.as_str())
                .bind(limit.unwrap_or(-1))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, TaskDbModel>(
                    "SELECT * FROM tasks WHERE status = ? ORDER BY created_at LIMIT ?",
                )
                .bind(status.as_str())
                .bind(limit.unwrap_or(-1))
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(tasks)
    }

    async fn list_tasks_by_item(&self, item_id: &str) -> Result<Vec<TaskDbModel>> {
        let tasks = sqlx::query_as::<_, TaskDbModel>(
            "SELECT * FROM tasks WHERE item_id = ? ORDER BY created_at DESC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn create_task(&self, task: &TaskDbModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, item_id, task_type, status, created_at, started_at,
                completed_at, progress, result, error_message, retry_count
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.item_id)
        .bind(&task.task_type)
        .bind(&task.status)
        .bind(&task.created_at)
        .bind(&task.started_at)
        .bind(&task.completed_at)
        .bind(task.progress)
        .bind(&task.result)
        .bind(&task.error_message)
        .bind(task.retry_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_progress(&self, id: &str, progress: f64) -> Result<()> {
        let clamped = progress.clamp(0.0, 1.0);
        let result = sqlx::query("UPDATE tasks SET progress = ? WHERE id = ?")
            .bind(clamped)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("Task", id));
        }
        Ok(())
    }

    async fn set_result(&self, id: &str, result_payload: &str) -> Result<()> {
        let result = sqlx::query("UPDATE tasks SET result = ? WHERE id = ?")
            .bind(result_payload)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("Task", id));
        }
        Ok(())
    }

    async fn increment_retry(&self, id: &str) -> Result<i64> {
        let result = sqlx::query("UPDATE tasks SET retry_count = retry_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("Task", id));
        }
        let count: (i64,) = sqlx::query_as("SELECT retry_count FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn apply_transition(
        &self,
        id: &str,
        status: TaskStatus,
        error_message: Option<&str>,
        result_payload: Option<&str>,
    ) -> Result<TaskDbModel> {
        let now = time::to_db(chrono::Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE tasks SET
                status = ?,
                started_at = CASE WHEN ? THEN COALESCE(started_at, ?) ELSE started_at END,
                completed_at = CASE WHEN ? THEN ? ELSE completed_at END,
                error_message = COALESCE(?, error_message),
                result = COALESCE(?, result),
                retry_count = retry_count + ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(status.is_in_progress())
        .bind(&now)
        .bind(status.is_terminal())
        .bind(&now)
        .bind(error_message)
        .bind(result_payload)
        .bind(if error_message.is_some() { 1i64 } else { 0i64 })
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Task", id));
        }
        self.get_task(id).await
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
