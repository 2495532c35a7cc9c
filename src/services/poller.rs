//! Generic "start job, poll until complete, fetch results" driver.
//!
//! Both scanner phases run through the same loop. Polling has no deadline:
//! a job that never reports 100% keeps its run polling. Errors never escape
//! this module; they degrade the phase to an empty outcome.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::clients::zap::{JobId, ScanControl};
use crate::errors::ClientError;
use crate::models::alert::Alert;
use crate::models::scan::PhaseOutcome;
use crate::models::target::ScanTarget;

/// One externally tracked scanner job type.
#[async_trait]
pub trait ScanPhase: Send + Sync {
    type Item: Send;

    fn name(&self) -> &'static str;

    async fn start(&self, target: &ScanTarget) -> Result<JobId, ClientError>;

    /// Percent complete, 0 to 100.
    async fn progress(&self, job: &JobId) -> Result<u8, ClientError>;

    async fn results(
        &self,
        job: &JobId,
        target: &ScanTarget,
    ) -> Result<Vec<Self::Item>, ClientError>;
}

/// Crawl phase: yields discovered URLs.
pub struct SpiderPhase<'a> {
    control: &'a dyn ScanControl,
}

impl<'a> SpiderPhase<'a> {
    pub fn new(control: &'a dyn ScanControl) -> Self {
        Self { control }
    }
}

#[async_trait]
impl ScanPhase for SpiderPhase<'_> {
    type Item = String;

    fn name(&self) -> &'static str {
        "spider"
    }

    async fn start(&self, target: &ScanTarget) -> Result<JobId, ClientError> {
        self.control.start_spider(&target.canonical_url).await
    }

    async fn progress(&self, job: &JobId) -> Result<u8, ClientError> {
        self.control.spider_progress(job).await
    }

    async fn results(&self, job: &JobId, _target: &ScanTarget) -> Result<Vec<String>, ClientError> {
        self.control.spider_results(job).await
    }
}

/// Attack phase: yields the alerts accumulated for the target.
pub struct ActiveScanPhase<'a> {
    control: &'a dyn ScanControl,
}

impl<'a> ActiveScanPhase<'a> {
    pub fn new(control: &'a dyn ScanControl) -> Self {
        Self { control }
    }
}

#[async_trait]
impl ScanPhase for ActiveScanPhase<'_> {
    type Item = Alert;

    fn name(&self) -> &'static str {
        "active_scan"
    }

    async fn start(&self, target: &ScanTarget) -> Result<JobId, ClientError> {
        self.control.start_active_scan(&target.canonical_url).await
    }

    async fn progress(&self, job: &JobId) -> Result<u8, ClientError> {
        self.control.active_scan_progress(job).await
    }

    async fn results(&self, _job: &JobId, target: &ScanTarget) -> Result<Vec<Alert>, ClientError> {
        self.control.alerts(&target.canonical_url).await
    }
}

#[derive(Debug, thiserror::Error)]
enum PollError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Gave up after {0} polls")]
    PollLimit(u32),
}

/// Drives a [`ScanPhase`] to completion.
#[derive(Debug, Clone)]
pub struct PhasePoller {
    interval: Duration,
    max_polls: Option<u32>,
}

impl PhasePoller {
    /// Poller with no attempt cap.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_polls: None,
        }
    }

    /// Degrade the phase after `max_polls` progress checks below 100%.
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    /// Start the phase's job, wait for 100%, then fetch its results once.
    pub async fn run_phase<P: ScanPhase>(
        &self,
        phase: &P,
        target: &ScanTarget,
    ) -> PhaseOutcome<P::Item> {
        let mut polls = 0u32;
        match self.drive(phase, target, &mut polls).await {
            Ok(items) => {
                info!(
                    phase = phase.name(),
                    url = %target,
                    polls,
                    results = items.len(),
                    "Scan completed"
                );
                PhaseOutcome::Completed { items, polls }
            }
            Err(e) => {
                error!(
                    phase = phase.name(),
                    url = %target,
                    polls,
                    error = %e,
                    "Error performing scan"
                );
                PhaseOutcome::Degraded {
                    reason: e.to_string(),
                    polls,
                }
            }
        }
    }

    async fn drive<P: ScanPhase>(
        &self,
        phase: &P,
        target: &ScanTarget,
        polls: &mut u32,
    ) -> Result<Vec<P::Item>, PollError> {
        let job = phase.start(target).await?;

        loop {
            let progress = phase.progress(&job).await?;
            *polls += 1;
            if progress >= 100 {
                break;
            }
            if self.max_polls.is_some_and(|max| *polls >= max) {
                return Err(PollError::PollLimit(*polls));
            }
            info!(phase = phase.name(), job = %job, progress, "Scan progress %");
            tokio::time::sleep(self.interval).await;
        }

        Ok(phase.results(&job, target).await?)
    }
}
