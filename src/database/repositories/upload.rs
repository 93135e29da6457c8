//! Upload repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::Upload;
use crate::Result;

/// Channel id stored when the caller could not determine one.
const UNKNOWN_CHANNEL: &str = "unknown";

/// Upload repository trait.
#[async_trait]
pub trait UploadRepository: Send + Sync {
    async fn is_uploaded(&self, video_id: &str) -> Result<bool>;
    /// Upsert the upload record for a video. An empty channel id is stored
    /// as the `"unknown"` sentinel; an absent platform id never clobbers a
    /// previously stored one.
    async fn mark_uploaded(
        &self,
        video_id: &str,
        channel_id: &str,
        platform_video_id: Option<&str>,
    ) -> Result<()>;
    async fn get_upload(&self, video_id: &str) -> Result<Option<Upload>>;
    /// Backfill the platform id for an existing upload.
    async fn update_platform_video_id(&self, video_id: &str, platform_video_id: &str)
        -> Result<()>;
}

/// SQLx implementation of UploadRepository.
pub struct SqlxUploadRepository {
    pool: SqlitePool,
    write_pool: SqlitePool,
}

impl SqlxUploadRepository {
    pub fn new(pool: SqlitePool, write_pool: SqlitePool) -> Self {
        Self { pool, write_pool }
    }
}

#[async_trait]
impl UploadRepository for SqlxUploadRepository {
    async fn is_uploaded(&self, video_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM uploads WHERE video_id = ?")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn mark_uploaded(
        &self,
        video_id: &str,
        channel_id: &str,
        platform_video_id: Option<&str>,
    ) -> Result<()> {
        let channel_id = if channel_id.is_empty() {
            UNKNOWN_CHANNEL
        } else {
            channel_id
        };
        let platform_video_id = platform_video_id.filter(|id| !id.is_empty());
        sqlx::query(
            r#"
            INSERT INTO uploads (video_id, channel_id, platform_video_id, uploaded_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(video_id) DO UPDATE SET
                channel_id = excluded.channel_id,
                platform_video_id = COALESCE(excluded.platform_video_id, uploads.platform_video_id),
                uploaded_at = excluded.uploaded_at
            "#,
        )
        .bind(video_id)
        .bind(channel_id)
        .bind(platform_video_id)
        .bind(Utc::now())
        .execute(&self.write_pool)
        .await?;
        Ok(())
    }

    async fn get_upload(&self, video_id: &str) -> Result<Option<Upload>> {
        let upload = sqlx::query_as::<_, Upload>("SELECT * FROM uploads WHERE video_id = ?")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(upload)
    }

    async fn update_platform_video_id(
        &self,
        video_id: &str,
        platform_video_id: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE uploads SET platform_video_id = ? WHERE video_id = ?")
            .bind(platform_video_id)
            .bind(video_id)
            .execute(&self.write_pool)
            .await?;
        Ok(())
    }
}
