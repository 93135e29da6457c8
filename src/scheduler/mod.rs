//! Periodic channel scanning.
//!
//! Ticks on an interval and scans every active channel whose
//! `scan_frequency_hours` has elapsed since its last scan.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::controller::Controller;
use crate::database::repositories::{CandidateRepository, ChannelRepository};
use crate::scanner::Scanner;
use crate::{Error, Result};

/// Configuration for the scan scheduler.
#[derive(Debug, Clone)]
pub struct ScanSchedulerConfig {
    /// How often to check for due channels.
    pub tick_interval: Duration,
    /// Per-channel scan limit.
    pub scan_limit: i64,
}

impl Default for ScanSchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10 * 60),
            scan_limit: 10,
        }
    }
}

struct AutoSync {
    controller: Arc<Controller>,
    candidates: Arc<dyn CandidateRepository>,
    limit: i64,
}

/// Drives scans of due channels on a fixed tick, optionally followed by a
/// sync pass over candidates that passed filtering.
pub struct ScanScheduler {
    scanner: Arc<Scanner>,
    channels: Arc<dyn ChannelRepository>,
    auto_sync: Option<AutoSync>,
    config: ScanSchedulerConfig,
}

impl ScanScheduler {
    pub fn new(
        scanner: Arc<Scanner>,
        channels: Arc<dyn ChannelRepository>,
        config: ScanSchedulerConfig,
    ) -> Self {
        Self {
            scanner,
            channels,
            auto_sync: None,
            config,
        }
    }

    /// After each sweep, transfer up to `limit` filtered candidates.
    pub fn with_auto_sync(
        mut self,
        controller: Arc<Controller>,
        candidates: Arc<dyn CandidateRepository>,
        limit: i64,
    ) -> Self {
        self.auto_sync = Some(AutoSync {
            controller,
            candidates,
            limit,
        });
        self
    }

    /// Run the scheduler until the token is cancelled.
    pub fn start(self: Arc<Self>, token: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run_loop(token).await;
        })
    }

    async fn run_loop(&self, token: CancellationToken) {
        let mut tick = tokio::time::interval(self.config.tick_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("scan scheduler stopped");
                    return;
                }
                _ = tick.tick() => {}
            }

            match self.scan_due_channels(&token).await {
                Ok(()) => {}
                Err(Error::Cancelled) => {
                    info!("scan scheduler stopped");
                    return;
                }
                Err(e) => error!(error = %e, "scheduled scan sweep failed"),
            }

            match self.sync_filtered(&token).await {
                Ok(()) => {}
                Err(Error::Cancelled) => {
                    info!("scan scheduler stopped");
                    return;
                }
                Err(e) => error!(error = %e, "scheduled sync pass failed"),
            }
        }
    }

    /// Scan every active channel that is due. Per-channel failures are
    /// logged; only cancellation aborts the sweep.
    pub async fn scan_due_channels(&self, token: &CancellationToken) -> Result<()> {
        let now = Utc::now();
        let channels = self.channels.list_active_channels().await?;
        for channel in channels.into_iter().filter(|c| c.is_scan_due(now)) {
            match self
                .scanner
                .scan_channel(&channel.channel_id, self.config.scan_limit, token)
                .await
            {
                Ok(count) => {
                    info!(channel_id = %channel.channel_id, count, "scheduled scan complete")
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!(channel_id = %channel.channel_id, error = %e, "scheduled scan failed")
                }
            }
        }
        Ok(())
    }

    /// Transfer candidates whose latest decision passed. Per-candidate
    /// failures are logged; the candidate stays pending and is retried on
    /// the next tick.
    pub async fn sync_filtered(&self, token: &CancellationToken) -> Result<()> {
        let Some(sync) = &self.auto_sync else {
            return Ok(());
        };
        let batch = sync.candidates.list_filtered_candidates(sync.limit).await?;
        for candidate in batch {
            match sync
                .controller
                .sync_candidate(&candidate.video_id, &candidate.channel_id, token)
                .await
            {
                Ok(()) => {}
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!(video_id = %candidate.video_id, error = %e, "scheduled sync failed")
                }
            }
        }
        Ok(())
    }
}
