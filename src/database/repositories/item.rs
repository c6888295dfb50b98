//! Item repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::{ItemDbModel, ItemStatus};
use crate::database::time;
use crate::{Error, Result};

/// Item repository trait.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn get_item(&self, id: &str) -> Result<ItemDbModel>;
    async fn get_item_by_video_ref(&self, video_ref: &str) -> Result<ItemDbModel>;
    async fn exists_by_video_ref(&self, video_ref: &str) -> Result<bool>;
    async fn list_items_by_status(
        &self,
        status: ItemStatus,
        limit: Option<i64>,
    ) -> Result<Vec<ItemDbModel>>;
    async fn list_items(&self, limit: Option<i64>, offset: Option<i64>)
    -> Result<Vec<ItemDbModel>>;
    /// Recently discovered items above a view threshold, most viewed first.
    async fn list_recent_viral(
        &self,
        discovered_since: &str,
        min_views: i64,
        limit: Option<i64>,
    ) -> Result<Vec<ItemDbModel>>;
    async fn create_item(&self, item: &ItemDbModel) -> Result<()>;
    async fn set_analysis(&self, id: &str, analysis: &str) -> Result<ItemDbModel>;
    async fn increment_retry(&self, id: &str) -> Result<i64>;
    /// Single atomic status update applying the state-machine bookkeeping.
    /// The caller ([`crate::pipeline::StatusMachine`]) decides the flags.
    async fn apply_transition(
        &self,
        id: &str,
        status: ItemStatus,
        error_message: Option<&str>,
    ) -> Result<ItemDbModel>;
    async fn delete_item(&self, id: &str) -> Result<()>;
}

/// SQLx implementation of ItemRepository.
pub struct SqlxItemRepository {
    pool: SqlitePool,
}

impl SqlxItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for SqlxItemRepository {
    async fn get_item(&self, id: &str) -> Result<ItemDbModel> {
        sqlx::query_as::<_, ItemDbModel>("SELECT * FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("Item", id))
    }

    async fn get_item_by_video_ref(&self, video_ref: &str) -> Result<ItemDbModel> {
        sqlx::query_as::<_, ItemDbModel>("SELECT * FROM items WHERE video_ref = ?")
            .bind(video_ref)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("Item", video_ref))
    }

    async fn exists_by_video_ref(&self, video_ref: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(1) FROM items WHERE video_ref = ?")
            .bind(video_ref)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    async fn list_items_by_status(
        &self,
        status: ItemStatus,
        limit: Option<i64>,
    ) -> Result<Vec<ItemDbModel>> {
        let items = sqlx::query_as::<_, ItemDbModel>(
            "SELECT * FROM items WHERE status = ? ORDER BY discovered_at LIMIT ?",
        )
        .bind(status.as_str())
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn list_items(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ItemDbModel>> {
        let items = sqlx::query_as::<_, ItemDbModel>(
            "SELECT * FROM items ORDER BY discovered_at DESC LIMIT ? OFFSET ?",
        )
        .bind(limit.unwrap_or(-1))
        .bind(offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn list_recent_viral(
        &self,
        discovered_since: &str,
        min_views: i64,
        limit: Option<i64>,
    ) -> Result<Vec<ItemDbModel>> {
        let items = sqlx::query_as::<_, ItemDbModel>(
            "SELECT * FROM items WHERE discovered_at >= ? AND views >= ? \
             ORDER BY views DESC LIMIT ?",
        )
        .bind(discovered_since)
        .bind(min_views)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn create_item(&self, item: &ItemDbModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO items (
                id, video_ref, url, title, channel, views, likes, duration_secs,
                published_at, status, analysis, error_message, retry_count,
                discovered_at, started_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.video_ref)
        .bind(&item.url)
        .bind(&item.title)
        .bind(&item.channel)
        .bind(item.views)
        .bind(item.likes)
        .bind(item.duration_secs)
        .bind(&item.published_at)
        .bind(&item.status)
        .bind(&item.analysis)
        .bind(&item.error_message)
        .bind(item.retry_count)
        .bind(&item.discovered_at)
        .bind(&item.started_at)
        .bind(&item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_analysis(&self, id: &str, analysis: &str) -> Result<ItemDbModel> {
        let now = time::to_db(chrono::Utc::now());
        let result = sqlx::query("UPDATE items SET analysis = ?, updated_at = ? WHERE id = ?")
            .bind(analysis)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("Item", id));
        }
        self.get_item(id).await
    }

    async fn increment_retry(&self, id: &str) -> Result<i64> {
        let now = time::to_db(chrono::Utc::now());
        let result =
            sqlx::query("UPDATE items SET retry_count = retry_count + 1, updated_at = ? WHERE id = ?")
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("Item", id));
        }
        let count: (i64,) = sqlx::query_as("SELECT retry_count FROM items WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn apply_transition(
        &self,
        id: &str,
        status: ItemStatus,
        error_message: Option<&str>,
    ) -> Result<ItemDbModel> {
        let now = time::to_db(chrono::Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE items SET
                status = ?,
                started_at = CASE WHEN ? THEN COALESCE(started_at, ?) ELSE started_at END,
                error_message = COALESCE(?, error_message),
                retry_count = retry_count + ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(status.is_in_progress())
        .bind(&now)
        .bind(error_message)
        .bind(if error_message.is_some() { 1i64 } else { 0i64 })
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Item", id));
        }
        self.get_item(id).await
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
