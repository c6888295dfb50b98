//! Status state machine for items and tasks.
//!
//! One discipline for both entity kinds: parse the target status, apply a
//! single atomic row update, and let the repository stamp timestamps and
//! counters. The machine guarantees bookkeeping correctness (a started
//! timestamp is set at most once, an error message always costs one retry
//! count), not transition-graph legality. Ordering discipline belongs to
//! the caller, and backward moves for manual reprocessing stay possible.

use std::sync::Arc;

use crate::database::models::{ItemDbModel, ItemStatus, TaskDbModel, TaskStatus};
use crate::database::repositories::{ItemRepository, TaskRepository};
use crate::database::retry::retry_on_sqlite_busy;
use crate::{Error, Result};

/// Applies status transitions to items and tasks.
pub struct StatusMachine {
    items: Arc<dyn ItemRepository>,
    tasks: Arc<dyn TaskRepository>,
}

impl StatusMachine {
    pub fn new(items: Arc<dyn ItemRepository>, tasks: Arc<dyn TaskRepository>) -> Self {
        Self { items, tasks }
    }

    /// Transition an item to `new_status`.
    ///
    /// Fails with [`Error::InvalidStatus`] for an unknown status and
    /// [`Error::NotFound`] for an unknown id; the caller decides whether
    /// either is fatal. Supplying an error message stores it and increments
    /// the retry counter by exactly one.
    pub async fn transition_item(
        &self,
        id: &str,
        new_status: &str,
        error_message: Option<&str>,
    ) -> Result<ItemDbModel> {
        let status =
            ItemStatus::parse(new_status).ok_or_else(|| Error::invalid_status(new_status))?;

        let item = retry_on_sqlite_busy("item transition", || {
            self.items.apply_transition(id, status, error_message)
        })
        .await?;

        tracing::info!("Item {} transitioned to {}", id, status.as_str());
        Ok(item)
    }

    /// Transition a task to `new_status`, optionally attaching a result
    /// payload. Same discipline as [`Self::transition_item`].
    pub async fn transition_task(
        &self,
        id: &str,
        new_status: &str,
        error_message: Option<&str>,
        result: Option<&str>,
    ) -> Result<TaskDbModel> {
        let status =
            TaskStatus::parse(new_status).ok_or_else(|| Error::invalid_status(new_status))?;

        let task = retry_on_sqlite_busy("task transition", || {
            self.tasks.apply_transition(id, status, error_message, result)
        })
        .await?;

        tracing::info!("Task {} transitioned to {}", id, status.as_str());
        Ok(task)
    }

    /// Cancel a task. Terminal: stamps the completion time.
    pub async fn cancel_task(&self, id: &str) -> Result<TaskDbModel> {
        self.transition_task(id, TaskStatus::Cancelled.as_str(), None, None)
            .await
    }
}
