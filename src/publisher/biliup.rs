//! biliup upload adapter.
//!
//! Spawns the biliup binary to deliver a file to Bilibili and extracts the
//! assigned BV id from its output when possible.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::utils::process::{binary_available, run_command};
use crate::{Error, Result};

use super::{Publisher, UploadReceipt};

/// Patterns for extracting the platform video id from uploader output, in
/// decreasing order of reliability.
static PLATFORM_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"[Bb][Vv][Ii][Dd][:\s=]+([Bb][Vv][0-9a-zA-Z]+)",
        r#""bvid"\s*:\s*"([Bb][Vv][0-9a-zA-Z]+)""#,
        r"'bvid'\s*:\s*'([Bb][Vv][0-9a-zA-Z]+)'",
        r"bilibili\.com/video/([Bb][Vv][0-9a-zA-Z]+)",
        r"\b([Bb][Vv]1[0-9a-zA-Z]{9})\b",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Options for the biliup adapter.
#[derive(Debug, Clone)]
pub struct BiliupOptions {
    /// Binary name or path.
    pub binary: String,
    /// Path to the login cookie file.
    pub cookie_path: PathBuf,
    /// Upload line selector.
    pub line: Option<String>,
    /// Concurrent upload limit.
    pub limit: u32,
    /// Prefix prepended to the derived title.
    pub title_prefix: String,
    /// Description for uploaded videos; derived from the title when empty.
    pub description: String,
    /// Dynamic text; falls back to the description when empty.
    pub dynamic: String,
    /// Tags attached to uploads.
    pub tags: Vec<String>,
}

impl Default for BiliupOptions {
    fn default() -> Self {
        Self {
            binary: "biliup".to_string(),
            cookie_path: PathBuf::from("cookies.json"),
            line: None,
            limit: 3,
            title_prefix: String::new(),
            description: String::new(),
            dynamic: String::new(),
            tags: Vec::new(),
        }
    }
}

/// biliup implementation of [`Publisher`].
pub struct BiliupPublisher {
    opts: BiliupOptions,
}

#[derive(Debug)]
struct UploadMetadata {
    title: String,
    description: String,
    dynamic: String,
    tag: String,
}

impl BiliupPublisher {
    pub fn new(opts: BiliupOptions) -> Self {
        Self { opts }
    }

    /// Whether the configured binary is reachable on PATH.
    pub fn is_available(&self) -> bool {
        binary_available(&self.opts.binary)
    }

    fn build_metadata(&self, file: &Path) -> UploadMetadata {
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .unwrap_or_else(|| file.display().to_string());

        let title = {
            let combined = format!("{}{stem}", self.opts.title_prefix);
            let trimmed = combined.trim();
            if trimmed.is_empty() {
                stem.clone()
            } else {
                trimmed.to_string()
            }
        };

        let description = {
            let trimmed = self.opts.description.trim();
            if trimmed.is_empty() {
                format!("Uploaded automatically: {title}")
            } else {
                trimmed.to_string()
            }
        };

        let dynamic = {
            let trimmed = self.opts.dynamic.trim();
            if trimmed.is_empty() {
                description.clone()
            } else {
                trimmed.to_string()
            }
        };

        let tag = self
            .opts
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",");

        UploadMetadata {
            title,
            description,
            dynamic,
            tag,
        }
    }
}

#[async_trait]
impl Publisher for BiliupPublisher {
    async fn upload(&self, file: &Path, token: &CancellationToken) -> Result<UploadReceipt> {
        if !self.is_available() {
            return Err(Error::config(format!(
                "upload binary {:?} not found in PATH",
                self.opts.binary
            )));
        }
        if !self.opts.cookie_path.exists() {
            return Err(Error::config(format!(
                "cookie file {} not found; run `{} login` first",
                self.opts.cookie_path.display(),
                self.opts.binary
            )));
        }

        let meta = self.build_metadata(file);

        let mut cmd = Command::new(&self.opts.binary);
        cmd.arg("--user-cookie")
            .arg(&self.opts.cookie_path)
            .arg("upload")
            .args(["--limit", &self.opts.limit.to_string()]);
        if let Some(line) = &self.opts.line {
            cmd.args(["--line", line]);
        }
        cmd.args(["--title", &meta.title]);
        if !meta.description.is_empty() {
            cmd.args(["--desc", &meta.description]);
        }
        if !meta.dynamic.is_empty() {
            cmd.args(["--dynamic", &meta.dynamic]);
        }
        if !meta.tag.is_empty() {
            cmd.args(["--tag", &meta.tag]);
        }
        cmd.arg(file);

        info!(path = %file.display(), "uploading video");
        let output = run_command(cmd, token).await?;
        if !output.success() {
            return Err(Error::publish(format!(
                "biliup exited with code {:?}: {}",
                output.status.code(),
                output.stderr.trim()
            )));
        }

        let combined = format!("{}\n{}", output.stdout, output.stderr);
        let platform_video_id = parse_platform_video_id(&combined);
        match &platform_video_id {
            Some(id) => info!(platform_video_id = %id, "upload complete"),
            None => info!("upload complete, no platform id found in output"),
        }

        Ok(UploadReceipt { platform_video_id })
    }
}

/// Extract the platform video id from uploader output, if present.
fn parse_platform_video_id(output: &str) -> Option<String> {
    PLATFORM_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(output))
        .map(|captures| captures[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform_video_id_labeled() {
        assert_eq!(
            parse_platform_video_id("upload done, bvid: BV1ab411c7de"),
            Some("BV1ab411c7de".to_string())
        );
        assert_eq!(
            parse_platform_video_id(r#"{"bvid": "BV1xy411z9ab"}"#),
            Some("BV1xy411z9ab".to_string())
        );
    }

    #[test]
    fn test_parse_platform_video_id_from_url() {
        assert_eq!(
            parse_platform_video_id("see https://www.bilibili.com/video/BV1qw411e7rt"),
            Some("BV1qw411e7rt".to_string())
        );
    }

    #[test]
    fn test_parse_platform_video_id_standalone_fallback() {
        assert_eq!(
            parse_platform_video_id("finished BV1abcdefgh2 ok"),
            Some("BV1abcdefgh2".to_string())
        );
    }

    #[test]
    fn test_parse_platform_video_id_absent() {
        assert_eq!(parse_platform_video_id("upload complete"), None);
    }

    #[test]
    fn test_build_metadata_defaults() {
        let publisher = BiliupPublisher::new(BiliupOptions::default());
        let meta = publisher.build_metadata(Path::new("/tmp/My Video.mp4"));
        assert_eq!(meta.title, "My Video");
        assert_eq!(meta.description, "Uploaded automatically: My Video");
        assert_eq!(meta.dynamic, meta.description);
        assert!(meta.tag.is_empty());
    }

    #[test]
    fn test_build_metadata_with_options() {
        let publisher = BiliupPublisher::new(BiliupOptions {
            title_prefix: "[Mirror] ".to_string(),
            tags: vec!["gaming".to_string(), "  ".to_string(), "speedrun".to_string()],
            ..Default::default()
        });
        let meta = publisher.build_metadata(Path::new("/tmp/run.flv"));
        assert_eq!(meta.title, "[Mirror] run");
        assert_eq!(meta.tag, "gaming,speedrun");
    }
}
