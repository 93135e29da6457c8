//! yt-dlp fetch adapter.
//!
//! Spawns the yt-dlp binary and parses its line-oriented output. All
//! invocations honor the cancellation token: a cancelled call kills the
//! child process.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::utils::process::{binary_available, run_command, CommandOutput};
use crate::{Error, Result};

use super::{Fetcher, VideoMetadata};

/// Options for the yt-dlp adapter.
#[derive(Debug, Clone)]
pub struct YtDlpOptions {
    /// Binary name or path.
    pub binary: String,
    /// Sleep interval between requests, in seconds (0 disables).
    pub sleep_secs: u64,
    /// Format selector passed to `--format`.
    pub format: Option<String>,
}

impl Default for YtDlpOptions {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            sleep_secs: 0,
            format: None,
        }
    }
}

/// yt-dlp implementation of [`Fetcher`].
pub struct YtDlpFetcher {
    opts: YtDlpOptions,
}

impl YtDlpFetcher {
    pub fn new(opts: YtDlpOptions) -> Self {
        Self { opts }
    }

    /// Whether the configured binary is reachable on PATH.
    pub fn is_available(&self) -> bool {
        binary_available(&self.opts.binary)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.opts.binary);
        cmd.args(["--quiet", "--no-warnings"]);
        cmd
    }

    fn check_status(output: &CommandOutput) -> Result<()> {
        if output.success() {
            Ok(())
        } else {
            Err(Error::fetch(format!(
                "yt-dlp exited with code {:?}: {}",
                output.status.code(),
                output.stderr.trim()
            )))
        }
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    async fn list_channel_video_ids(
        &self,
        channel_url: &str,
        limit: i64,
        token: &CancellationToken,
    ) -> Result<Vec<String>> {
        if limit <= 0 {
            return Err(Error::validation("limit must be positive"));
        }
        let mut cmd = self.command();
        cmd.args(["--flat-playlist", "--print", "id"])
            .args(["--playlist-items", &format!("1:{limit}")])
            .arg(channel_url);

        let output = run_command(cmd, token).await?;
        Self::check_status(&output)?;

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    async fn get_channel_videos_metadata(
        &self,
        channel_url: &str,
        limit: i64,
        token: &CancellationToken,
    ) -> Result<Vec<VideoMetadata>> {
        if limit <= 0 {
            return Err(Error::validation("limit must be positive"));
        }
        let mut cmd = self.command();
        cmd.args(["--dump-json", "--skip-download"])
            .args(["--playlist-items", &format!("1:{limit}")])
            .arg(channel_url);

        let output = run_command(cmd, token).await?;
        Self::check_status(&output)?;

        // One JSON object per line.
        let mut videos = Vec::new();
        for line in output.stdout.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<VideoMetadata>(line) {
                Ok(meta) => videos.push(meta),
                Err(e) => warn!(error = %e, "failed to parse video metadata line"),
            }
        }
        Ok(videos)
    }

    async fn download_video(
        &self,
        video_url: &str,
        output_dir: &Path,
        token: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        let template = output_dir.join("%(title)s.%(ext)s");
        let mut cmd = self.command();
        cmd.arg("--no-simulate").arg("-o").arg(&template);
        // With ffmpeg present the final path is only known after postprocessing.
        if binary_available("ffmpeg") {
            cmd.args(["--print", "after_postprocess:filepath"]);
        } else {
            cmd.args(["--print", "after_move:filepath"]);
        }
        if let Some(format) = &self.opts.format {
            cmd.args(["--format", format]);
        }
        if self.opts.sleep_secs > 0 {
            cmd.arg(format!("--sleep-interval={}", self.opts.sleep_secs));
            cmd.arg(format!("--max-sleep-interval={}", self.opts.sleep_secs + 1));
        }
        cmd.arg(video_url);

        let output = run_command(cmd, token).await?;
        Self::check_status(&output)?;

        Ok(collect_file_paths(&output.stdout))
    }
}

/// Collect printed file paths, dropping blanks and yt-dlp's `NA` marker.
fn collect_file_paths(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "NA")
        .map(PathBuf::from)
        .collect()
}
