//! Sync pipeline: walks a candidate from source id to published upload.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::database::repositories::UploadRepository;
use crate::fetcher::{channel_videos_url, watch_url, Fetcher};
use crate::publisher::Publisher;
use crate::{Error, Result};

/// Counters for one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Video ids returned by the source.
    pub considered: usize,
    /// Videos skipped because an upload record already exists.
    pub skipped: usize,
    /// Videos downloaded this run.
    pub downloaded: usize,
    /// Videos published and recorded this run.
    pub uploaded: usize,
}

/// A sync that aborted partway, carrying the counts accumulated so far.
#[derive(Debug, thiserror::Error)]
#[error(
    "sync aborted ({} considered, {} skipped, {} downloaded, {} uploaded): {source}",
    .report.considered,
    .report.skipped,
    .report.downloaded,
    .report.uploaded
)]
pub struct SyncError {
    pub report: SyncReport,
    #[source]
    pub source: Error,
}

/// Orchestrates download and upload for channels and single videos,
/// skipping work that is already done.
pub struct Controller {
    uploads: Arc<dyn UploadRepository>,
    fetcher: Arc<dyn Fetcher>,
    publisher: Arc<dyn Publisher>,
    output_dir: PathBuf,
}

impl Controller {
    /// Create a controller; the output directory is created if absent.
    pub fn new(
        uploads: Arc<dyn UploadRepository>,
        fetcher: Arc<dyn Fetcher>,
        publisher: Arc<dyn Publisher>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            uploads,
            fetcher,
            publisher,
            output_dir,
        })
    }

    /// Transfer up to `limit` videos from a channel, in source order. The
    /// first failure aborts the run; the error carries the counts
    /// accumulated so far. Already-uploaded videos are skipped, which makes
    /// re-running idempotent.
    pub async fn sync_channel(
        &self,
        channel_id: &str,
        limit: i64,
        token: &CancellationToken,
    ) -> std::result::Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        if limit <= 0 {
            return Ok(report);
        }

        let url = channel_videos_url(channel_id);
        let ids = self
            .fetcher
            .list_channel_video_ids(&url, limit, token)
            .await
            .map_err(|source| SyncError { report, source })?;
        report.considered = ids.len();

        for video_id in &ids {
            if let Err(source) = self.transfer(video_id, channel_id, &mut report, token).await {
                return Err(SyncError { report, source });
            }
        }

        info!(
            channel_id = %channel_id,
            considered = report.considered,
            skipped = report.skipped,
            uploaded = report.uploaded,
            "channel sync complete"
        );
        Ok(report)
    }

    /// Transfer a single video; a no-op if it is already uploaded. The
    /// upload record is attributed to the unknown-channel sentinel.
    pub async fn sync_video(&self, video_id: &str, token: &CancellationToken) -> Result<()> {
        self.sync_candidate(video_id, "", token).await
    }

    /// Transfer a single video for a known channel; a no-op if it is
    /// already uploaded.
    pub async fn sync_candidate(
        &self,
        video_id: &str,
        channel_id: &str,
        token: &CancellationToken,
    ) -> Result<()> {
        let mut report = SyncReport {
            considered: 1,
            ..Default::default()
        };
        self.transfer(video_id, channel_id, &mut report, token).await
    }

    async fn transfer(
        &self,
        video_id: &str,
        channel_id: &str,
        report: &mut SyncReport,
        token: &CancellationToken,
    ) -> Result<()> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if self.uploads.is_uploaded(video_id).await? {
            debug!(video_id = %video_id, "already uploaded, skipping");
            report.skipped += 1;
            return Ok(());
        }

        let files = self
            .fetcher
            .download_video(&watch_url(video_id), &self.output_dir, token)
            .await?;
        if files.is_empty() {
            return Err(Error::fetch(format!(
                "no files produced for video {video_id}"
            )));
        }
        report.downloaded += 1;

        let mut platform_video_id: Option<String> = None;
        for file in &files {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let receipt = self.publisher.upload(file, token).await?;
            if platform_video_id.is_none() {
                platform_video_id = receipt.platform_video_id;
            }
        }

        // A cancelled run must not record the upload.
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.uploads
            .mark_uploaded(video_id, channel_id, platform_video_id.as_deref())
            .await?;
        report.uploaded += 1;
        info!(video_id = %video_id, "video transferred");
        Ok(())
    }
}
