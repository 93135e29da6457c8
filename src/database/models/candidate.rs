//! Video candidate database model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A discovered video that may be selected for transfer.
///
/// `discovered_at` is assigned on first insert and never changes; every
/// other field is refreshed on rescan. `view_velocity` and
/// `engagement_rate` are derived at write time from the raw counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoCandidate {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub duration_seconds: i64,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub discovered_at: Option<DateTime<Utc>>,
    pub thumbnail_url: String,
    pub tags: Vec<String>,
    pub category: String,
    pub language: String,
    /// Views per hour since publication.
    pub view_velocity: f64,
    /// (likes + comments) / views.
    pub engagement_rate: f64,
}

/// Raw row shape of `video_candidates`; tags are stored as a JSON array.
#[derive(Debug, FromRow)]
pub struct CandidateRow {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub duration_seconds: i64,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub discovered_at: DateTime<Utc>,
    pub thumbnail_url: String,
    pub tags: String,
    pub category: String,
    pub language: String,
    pub view_velocity: f64,
    pub engagement_rate: f64,
}

impl From<CandidateRow> for VideoCandidate {
    fn from(row: CandidateRow) -> Self {
        let tags = serde_json::from_str(&row.tags).unwrap_or_default();
        Self {
            video_id: row.video_id,
            channel_id: row.channel_id,
            title: row.title,
            description: row.description,
            duration_seconds: row.duration_seconds,
            view_count: row.view_count,
            like_count: row.like_count,
            comment_count: row.comment_count,
            published_at: row.published_at,
            discovered_at: Some(row.discovered_at),
            thumbnail_url: row.thumbnail_url,
            tags,
            category: row.category,
            language: row.language,
            view_velocity: row.view_velocity,
            engagement_rate: row.engagement_rate,
        }
    }
}
