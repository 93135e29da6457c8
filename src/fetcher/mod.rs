//! Video source adapter.
//!
//! The core consumes any source through the [`Fetcher`] trait; the shipped
//! implementation shells out to yt-dlp.

pub mod ytdlp;

pub use ytdlp::{YtDlpFetcher, YtDlpOptions};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::Result;

/// Full metadata for a source video, as reported by the fetch tool.
///
/// Count fields are optional because the source frequently reports `null`
/// for videos with hidden counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Duration in seconds.
    pub duration: Option<i64>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    /// Upload date as a YYYYMMDD string.
    pub upload_date: String,
    pub thumbnail: String,
    pub tags: Vec<String>,
    /// Category list; the first entry is the primary category.
    pub categories: Vec<String>,
    pub channel_id: String,
    #[serde(rename = "channel")]
    pub channel_title: String,
}

/// Adapter contract for listing and downloading videos from a source.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// The first `limit` video ids for a channel, in source order.
    async fn list_channel_video_ids(
        &self,
        channel_url: &str,
        limit: i64,
        token: &CancellationToken,
    ) -> Result<Vec<String>>;

    /// Full metadata for the first `limit` videos of a channel.
    async fn get_channel_videos_metadata(
        &self,
        channel_url: &str,
        limit: i64,
        token: &CancellationToken,
    ) -> Result<Vec<VideoMetadata>>;

    /// Download a video into `output_dir`, returning the finished file paths.
    async fn download_video(
        &self,
        video_url: &str,
        output_dir: &Path,
        token: &CancellationToken,
    ) -> Result<Vec<PathBuf>>;
}

/// Watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Videos listing URL for a channel id or `@handle`.
pub fn channel_videos_url(channel_id: &str) -> String {
    if channel_id.starts_with('@') {
        format!("https://www.youtube.com/{channel_id}/videos")
    } else {
        format!("https://www.youtube.com/channel/{channel_id}/videos")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("abc123"), "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn test_channel_videos_url() {
        assert_eq!(
            channel_videos_url("UC_Sync"),
            "https://www.youtube.com/channel/UC_Sync/videos"
        );
        assert_eq!(
            channel_videos_url("@handle"),
            "https://www.youtube.com/@handle/videos"
        );
    }

    #[test]
    fn test_metadata_tolerates_null_counts() {
        let json = r#"{"id":"v1","title":"T","duration":120,"view_count":null,"upload_date":"20250110"}"#;
        let meta: VideoMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.view_count, None);
        assert_eq!(meta.duration, Some(120));
        assert_eq!(meta.upload_date, "20250110");
        assert!(meta.categories.is_empty());
    }
}
