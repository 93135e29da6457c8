//! Destination platform adapter.
//!
//! The core delivers files through the [`Publisher`] trait; the shipped
//! implementation shells out to biliup.

pub mod biliup;

pub use biliup::{BiliupOptions, BiliupPublisher};

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::Result;

/// Result of a successful upload.
#[derive(Debug, Clone, Default)]
pub struct UploadReceipt {
    /// Identifier assigned by the destination platform, if it reported one.
    pub platform_video_id: Option<String>,
}

/// Adapter contract for delivering a local media file to a destination
/// platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn upload(&self, file: &Path, token: &CancellationToken) -> Result<UploadReceipt>;
}
