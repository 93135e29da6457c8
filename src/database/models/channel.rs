//! Channel database model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How often a channel is rescanned when nothing else is configured.
pub const DEFAULT_SCAN_FREQUENCY_HOURS: i64 = 6;

/// A monitored source channel.
///
/// Channels are never deleted; removal deactivates them so candidate and
/// upload history stays referable.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: String,
    pub name: String,
    pub url: String,
    pub subscriber_count: i64,
    pub video_count: i64,
    /// When this channel was last scanned; `None` means never.
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub scan_frequency_hours: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Channel {
    /// Create a new active channel with default scan frequency.
    pub fn new(
        channel_id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            name: name.into(),
            url: url.into(),
            subscriber_count: 0,
            video_count: 0,
            last_scanned_at: None,
            scan_frequency_hours: DEFAULT_SCAN_FREQUENCY_HOURS,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Whether the channel is due for a scan at `now`.
    pub fn is_scan_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_scanned_at {
            None => true,
            Some(last) => now - last >= chrono::Duration::hours(self.scan_frequency_hours),
        }
    }
}
