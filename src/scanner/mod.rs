//! Channel scanning: brings remote channel state into the candidate table.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::database::models::{Channel, VideoCandidate};
use crate::database::repositories::{CandidateRepository, ChannelRepository};
use crate::fetcher::{Fetcher, VideoMetadata};
use crate::rules::RuleEngine;
use crate::{Error, Result};

/// Discovers and stores video candidates from watched channels.
pub struct Scanner {
    channels: Arc<dyn ChannelRepository>,
    candidates: Arc<dyn CandidateRepository>,
    fetcher: Arc<dyn Fetcher>,
    engine: Option<Arc<RuleEngine>>,
}

impl Scanner {
    pub fn new(
        channels: Arc<dyn ChannelRepository>,
        candidates: Arc<dyn CandidateRepository>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            channels,
            candidates,
            fetcher,
            engine: None,
        }
    }

    /// Run the rule engine over freshly discovered candidates after each scan.
    pub fn with_auto_filter(mut self, engine: Arc<RuleEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Fetch up to `limit` videos from a channel and upsert them as
    /// candidates. Returns the number of candidates written. A missing
    /// channel yields 0 without error; per-video store failures are logged
    /// and skipped.
    pub async fn scan_channel(
        &self,
        channel_id: &str,
        limit: i64,
        token: &CancellationToken,
    ) -> Result<usize> {
        if limit <= 0 {
            return Ok(0);
        }
        let Some(channel) = self.channels.get_channel(channel_id).await? else {
            return Ok(0);
        };

        let videos = self
            .fetcher
            .get_channel_videos_metadata(&channel.url, limit, token)
            .await?;

        let mut count = 0;
        for video in &videos {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let candidate = build_candidate(channel_id, video, Utc::now());
            if let Err(e) = self.candidates.upsert_candidate(&candidate).await {
                warn!(video_id = %video.id, error = %e, "failed to store candidate");
                continue;
            }
            count += 1;
        }

        // The timestamp records that a scan was attempted, even if some
        // candidates failed to store.
        if let Err(e) = self.channels.update_channel_scanned(channel_id).await {
            warn!(channel_id = %channel_id, error = %e, "failed to update channel scan time");
        }

        if count > 0 {
            if let Some(engine) = &self.engine {
                match self
                    .candidates
                    .list_candidates_by_channel(channel_id, count as i64)
                    .await
                {
                    Ok(batch) => match engine.evaluate_batch(&batch, token).await {
                        Ok(outcome) => info!(
                            channel_id = %channel_id,
                            passed = outcome.passed.len(),
                            rejected = outcome.rejected.len(),
                            "filtered scanned candidates"
                        ),
                        Err(Error::Cancelled) => return Err(Error::Cancelled),
                        Err(e) => warn!(channel_id = %channel_id, error = %e, "filtering failed"),
                    },
                    Err(e) => {
                        warn!(channel_id = %channel_id, error = %e, "failed to fetch candidates for filtering")
                    }
                }
            }
        }

        Ok(count)
    }

    /// Scan every active channel. Per-channel failures are logged and do not
    /// abort the sweep; cancellation does.
    pub async fn scan_all_active(&self, limit: i64, token: &CancellationToken) -> Result<()> {
        let channels = self.channels.list_active_channels().await?;
        for channel in channels {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
            match self.scan_channel(&channel.channel_id, limit, token).await {
                Ok(count) => {
                    info!(channel_id = %channel.channel_id, count, "scanned channel")
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => warn!(channel_id = %channel.channel_id, error = %e, "scan failed"),
            }
        }
        Ok(())
    }

    /// Resolve a URL-or-id input into a canonical channel row and activate
    /// it. Channel id and name come from the source's metadata when
    /// reachable, otherwise from the input itself.
    pub async fn register_channel(
        &self,
        input: &str,
        token: &CancellationToken,
    ) -> Result<Channel> {
        let url = if input.contains("youtube.com") || input.contains("youtu.be") {
            input.to_string()
        } else {
            format!("https://www.youtube.com/channel/{input}")
        };

        let (channel_id, name) = match self
            .fetcher
            .get_channel_videos_metadata(&url, 1, token)
            .await
        {
            Ok(videos) if !videos.is_empty() && !videos[0].channel_id.is_empty() => {
                (videos[0].channel_id.clone(), videos[0].channel_title.clone())
            }
            Ok(_) => (extract_channel_id(input), String::new()),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                warn!(input = %input, error = %e, "metadata lookup failed, falling back to input id");
                (extract_channel_id(input), String::new())
            }
        };

        let channel = Channel::new(channel_id, name, url);
        self.channels.add_channel(&channel).await?;
        info!(channel_id = %channel.channel_id, name = %channel.name, "registered channel");
        Ok(channel)
    }
}

/// Build a candidate from fetched metadata, deriving the write-time metrics.
fn build_candidate(channel_id: &str, video: &VideoMetadata, now: DateTime<Utc>) -> VideoCandidate {
    let published_at = parse_upload_date(&video.upload_date);
    let view_count = video.view_count.unwrap_or(0);
    let like_count = video.like_count.unwrap_or(0);
    let comment_count = video.comment_count.unwrap_or(0);

    VideoCandidate {
        video_id: video.id.clone(),
        channel_id: channel_id.to_string(),
        title: video.title.clone(),
        description: video.description.clone(),
        duration_seconds: video.duration.unwrap_or(0),
        view_count,
        like_count,
        comment_count,
        published_at,
        discovered_at: None,
        thumbnail_url: video.thumbnail.clone(),
        tags: video.tags.clone(),
        category: video.categories.first().cloned().unwrap_or_default(),
        language: String::new(),
        view_velocity: view_velocity(view_count, published_at, now),
        engagement_rate: engagement_rate(view_count, like_count, comment_count),
    }
}

/// Parse a YYYYMMDD upload date into a UTC-midnight instant.
pub fn parse_upload_date(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    let date = chrono::NaiveDate::parse_from_str(s, "%Y%m%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Views per hour since publication; 0 when unpublished or unviewed.
pub fn view_velocity(views: i64, published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(published) = published_at else {
        return 0.0;
    };
    if views == 0 {
        return 0.0;
    }
    let hours = ((now - published).num_seconds() as f64 / 3600.0).max(1.0);
    views as f64 / hours
}

/// (likes + comments) / views; 0 when unviewed.
pub fn engagement_rate(views: i64, likes: i64, comments: i64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    (likes + comments) as f64 / views as f64
}

/// Extract a channel id from a URL-or-id input.
fn extract_channel_id(input: &str) -> String {
    if let Some((_, rest)) = input.split_once("/channel/") {
        let id = rest.split(['/', '?']).next().unwrap_or(rest);
        return id.to_string();
    }
    if let Some((_, rest)) = input.split_once("/@") {
        let handle = rest.split(['/', '?']).next().unwrap_or(rest);
        return format!("@{handle}");
    }
    input.to_string()
}
