//! Upload database model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Proof that a candidate has been published to the destination platform.
///
/// One row per source video; rows are never deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Upload {
    pub video_id: String,
    pub channel_id: String,
    /// Identifier assigned by the destination platform, when it reported one.
    pub platform_video_id: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}
