//! Channel repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::Channel;
use crate::Result;

/// Channel repository trait.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// Upsert a channel by id. Re-adding an existing channel reactivates it
    /// and refreshes metadata; empty names and zero counts never overwrite
    /// stored values, and `created_at` / `last_scanned_at` are untouched.
    async fn add_channel(&self, channel: &Channel) -> Result<()>;
    async fn get_channel(&self, channel_id: &str) -> Result<Option<Channel>>;
    async fn list_active_channels(&self) -> Result<Vec<Channel>>;
    /// Stamp `last_scanned_at` with the current time.
    async fn update_channel_scanned(&self, channel_id: &str) -> Result<()>;
    async fn deactivate_channel(&self, channel_id: &str) -> Result<()>;
}

/// SQLx implementation of ChannelRepository.
pub struct SqlxChannelRepository {
    pool: SqlitePool,
    write_pool: SqlitePool,
}

impl SqlxChannelRepository {
    pub fn new(pool: SqlitePool, write_pool: SqlitePool) -> Self {
        Self { pool, write_pool }
    }
}

#[async_trait]
impl ChannelRepository for SqlxChannelRepository {
    async fn add_channel(&self, channel: &Channel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO channels (
                channel_id, name, url, subscriber_count, video_count,
                scan_frequency_hours, is_active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(channel_id) DO UPDATE SET
                name = COALESCE(NULLIF(excluded.name, ''), channels.name),
                url = excluded.url,
                subscriber_count = COALESCE(NULLIF(excluded.subscriber_count, 0), channels.subscriber_count),
                video_count = COALESCE(NULLIF(excluded.video_count, 0), channels.video_count),
                is_active = 1
            "#,
        )
        .bind(&channel.channel_id)
        .bind(&channel.name)
        .bind(&channel.url)
        .bind(channel.subscriber_count)
        .bind(channel.video_count)
        .bind(channel.scan_frequency_hours)
        .bind(channel.is_active)
        .bind(channel.created_at)
        .execute(&self.write_pool)
        .await?;
        Ok(())
    }

    async fn get_channel(&self, channel_id: &str) -> Result<Option<Channel>> {
        let channel = sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE channel_id = ?")
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(channel)
    }

    async fn list_active_channels(&self) -> Result<Vec<Channel>> {
        let channels = sqlx::query_as::<_, Channel>(
            "SELECT * FROM channels WHERE is_active = 1 ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(channels)
    }

    async fn update_channel_scanned(&self, channel_id: &str) -> Result<()> {
        sqlx::query("UPDATE channels SET last_scanned_at = ? WHERE channel_id = ?")
            .bind(Utc::now())
            .bind(channel_id)
            .execute(&self.write_pool)
            .await?;
        Ok(())
    }

    async fn deactivate_channel(&self, channel_id: &str) -> Result<()> {
        sqlx::query("UPDATE channels SET is_active = 0 WHERE channel_id = ?")
            .bind(channel_id)
            .execute(&self.write_pool)
            .await?;
        Ok(())
    }
}
