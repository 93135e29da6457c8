//! Video candidate repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::{CandidateRow, VideoCandidate};
use crate::Result;

const CANDIDATE_COLUMNS: &str = "vc.video_id, vc.channel_id, vc.title, vc.description, \
     vc.duration_seconds, vc.view_count, vc.like_count, vc.comment_count, \
     vc.published_at, vc.discovered_at, vc.thumbnail_url, vc.tags, \
     vc.category, vc.language, vc.view_velocity, vc.engagement_rate";

/// Video candidate repository trait.
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Insert-or-update keyed by `video_id`; `discovered_at` is assigned on
    /// first insert and preserved on update.
    async fn upsert_candidate(&self, candidate: &VideoCandidate) -> Result<()>;
    async fn get_candidate(&self, video_id: &str) -> Result<Option<VideoCandidate>>;
    /// Candidates for a channel, newest published first (nulls last).
    async fn list_candidates_by_channel(
        &self,
        channel_id: &str,
        limit: i64,
    ) -> Result<Vec<VideoCandidate>>;
    /// Candidates with no upload record, hottest first.
    async fn list_pending_candidates(&self, limit: i64) -> Result<Vec<VideoCandidate>>;
    /// Pending candidates with no decision history.
    async fn list_unevaluated_candidates(&self, limit: i64) -> Result<Vec<VideoCandidate>>;
    /// Pending candidates whose latest decision passed.
    async fn list_filtered_candidates(&self, limit: i64) -> Result<Vec<VideoCandidate>>;
    /// Refresh the raw counters only; `published_at` and `discovered_at`
    /// are untouched.
    async fn update_candidate_metrics(
        &self,
        video_id: &str,
        views: i64,
        likes: i64,
        comments: i64,
    ) -> Result<()>;
}

/// SQLx implementation of CandidateRepository.
pub struct SqlxCandidateRepository {
    pool: SqlitePool,
    write_pool: SqlitePool,
}

impl SqlxCandidateRepository {
    pub fn new(pool: SqlitePool, write_pool: SqlitePool) -> Self {
        Self { pool, write_pool }
    }

    async fn fetch_candidates(
        &self,
        query: &str,
        binds: &[&str],
        limit: i64,
    ) -> Result<Vec<VideoCandidate>> {
        let mut q = sqlx::query_as::<_, CandidateRow>(query);
        for bind in binds {
            q = q.bind(*bind);
        }
        let rows = q.bind(limit).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(VideoCandidate::from).collect())
    }
}

#[async_trait]
impl CandidateRepository for SqlxCandidateRepository {
    async fn upsert_candidate(&self, candidate: &VideoCandidate) -> Result<()> {
        let tags = serde_json::to_string(&candidate.tags)?;
        let discovered_at = candidate.discovered_at.unwrap_or_else(Utc::now);
        sqlx::query(
            r#"
            INSERT INTO video_candidates (
                video_id, channel_id, title, description, duration_seconds,
                view_count, like_count, comment_count, published_at,
                discovered_at, thumbnail_url, tags, category, language,
                view_velocity, engagement_rate
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(video_id) DO UPDATE SET
                channel_id = excluded.channel_id,
                title = excluded.title,
                description = excluded.description,
                duration_seconds = excluded.duration_seconds,
                view_count = excluded.view_count,
                like_count = excluded.like_count,
                comment_count = excluded.comment_count,
                published_at = excluded.published_at,
                thumbnail_url = excluded.thumbnail_url,
                tags = excluded.tags,
                category = excluded.category,
                language = excluded.language,
                view_velocity = excluded.view_velocity,
                engagement_rate = excluded.engagement_rate
            "#,
        )
        .bind(&candidate.video_id)
        .bind(&candidate.channel_id)
        .bind(&candidate.title)
        .bind(&candidate.description)
        .bind(candidate.duration_seconds)
        .bind(candidate.view_count)
        .bind(candidate.like_count)
        .bind(candidate.comment_count)
        .bind(candidate.published_at)
        .bind(discovered_at)
        .bind(&candidate.thumbnail_url)
        .bind(tags)
        .bind(&candidate.category)
        .bind(&candidate.language)
        .bind(candidate.view_velocity)
        .bind(candidate.engagement_rate)
        .execute(&self.write_pool)
        .await?;
        Ok(())
    }

    async fn get_candidate(&self, video_id: &str) -> Result<Option<VideoCandidate>> {
        let row =
            sqlx::query_as::<_, CandidateRow>("SELECT * FROM video_candidates WHERE video_id = ?")
                .bind(video_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(VideoCandidate::from))
    }

    async fn list_candidates_by_channel(
        &self,
        channel_id: &str,
        limit: i64,
    ) -> Result<Vec<VideoCandidate>> {
        let query = format!(
            "SELECT {CANDIDATE_COLUMNS} FROM video_candidates vc \
             WHERE vc.channel_id = ? ORDER BY vc.published_at DESC LIMIT ?"
        );
        self.fetch_candidates(&query, &[channel_id], limit).await
    }

    async fn list_pending_candidates(&self, limit: i64) -> Result<Vec<VideoCandidate>> {
        let query = format!(
            "SELECT {CANDIDATE_COLUMNS} FROM video_candidates vc \
             LEFT JOIN uploads u ON vc.video_id = u.video_id \
             WHERE u.video_id IS NULL \
             ORDER BY vc.view_velocity DESC, vc.engagement_rate DESC \
             LIMIT ?"
        );
        self.fetch_candidates(&query, &[], limit).await
    }

    async fn list_unevaluated_candidates(&self, limit: i64) -> Result<Vec<VideoCandidate>> {
        let query = format!(
            "SELECT {CANDIDATE_COLUMNS} FROM video_candidates vc \
             LEFT JOIN uploads u ON vc.video_id = u.video_id \
             WHERE u.video_id IS NULL \
               AND NOT EXISTS (SELECT 1 FROM rule_decisions rd WHERE rd.video_id = vc.video_id) \
             ORDER BY vc.view_velocity DESC, vc.engagement_rate DESC \
             LIMIT ?"
        );
        self.fetch_candidates(&query, &[], limit).await
    }

    async fn list_filtered_candidates(&self, limit: i64) -> Result<Vec<VideoCandidate>> {
        let query = format!(
            "SELECT {CANDIDATE_COLUMNS} FROM video_candidates vc \
             INNER JOIN rule_decisions rd ON vc.video_id = rd.video_id \
             LEFT JOIN uploads u ON vc.video_id = u.video_id \
             WHERE rd.rule_passed = 1 AND u.video_id IS NULL \
               AND rd.id = (SELECT MAX(id) FROM rule_decisions WHERE video_id = vc.video_id) \
             ORDER BY vc.view_velocity DESC, vc.engagement_rate DESC \
             LIMIT ?"
        );
        self.fetch_candidates(&query, &[], limit).await
    }

    async fn update_candidate_metrics(
        &self,
        video_id: &str,
        views: i64,
        likes: i64,
        comments: i64,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE video_candidates SET view_count = ?, like_count = ?, comment_count = ? \
             WHERE video_id = ?",
        )
        .bind(views)
        .bind(likes)
        .bind(comments)
        .bind(video_id)
        .execute(&self.write_pool)
        .await?;
        Ok(())
    }
}
