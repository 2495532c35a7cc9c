//! Scan pipeline: spider, active scan, persist, upload, for one target.
//!
//! Steps run strictly in order since the active scan attacks the crawl map
//! the spider built. A degraded phase or a failed write does not stop the
//! run; only a report directory that cannot be created or a broken phase
//! transition fails it. Nothing is retried.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::clients::zap::ScanControl;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::scan::{RunPhase, RunReport, ScanRun};
use crate::models::target::ScanTarget;
use crate::services::persister::{self, ALERTS_FILE, SPIDER_RESULTS_FILE};
use crate::services::poller::{ActiveScanPhase, PhasePoller, SpiderPhase};
use crate::services::uploader::FindingsUploader;

pub struct ScanPipeline {
    scanner: Arc<dyn ScanControl>,
    uploader: FindingsUploader,
    report_root: PathBuf,
    spider_poller: PhasePoller,
    active_scan_poller: PhasePoller,
}

impl ScanPipeline {
    pub fn new(
        scanner: Arc<dyn ScanControl>,
        uploader: FindingsUploader,
        config: &AppConfig,
    ) -> Self {
        Self {
            scanner,
            uploader,
            report_root: config.report_root.clone(),
            spider_poller: PhasePoller::new(config.spider_poll_interval()),
            active_scan_poller: PhasePoller::new(config.active_scan_poll_interval()),
        }
    }

    /// Replace the phase pollers, e.g. to bound polling in tests.
    pub fn with_pollers(mut self, spider: PhasePoller, active_scan: PhasePoller) -> Self {
        self.spider_poller = spider;
        self.active_scan_poller = active_scan;
        self
    }

    /// Directory holding the reports for `target`.
    pub fn report_dir(&self, target: &ScanTarget) -> PathBuf {
        self.report_root.join(&target.safe_name)
    }

    /// Run every step for `target`. Never fails; the outcome is in the report.
    pub async fn run(&self, run_id: Uuid, target: ScanTarget, engagement_id: String) -> RunReport {
        let report_dir = self.report_dir(&target);
        let mut run = ScanRun::new(run_id, target, engagement_id, report_dir);
        let mut report = RunReport {
            run_id,
            target: run.target.canonical_url.clone(),
            phase: run.phase(),
            spider_urls: 0,
            alerts: 0,
            upload: None,
        };

        if let Err(e) = self.execute(&mut run, &mut report).await {
            error!(run_id = %run.id, url = %run.target, error = %e, "Error scanning target");
            run.fail();
        }

        report.phase = run.phase();
        info!(
            run_id = %run.id,
            url = %run.target,
            phase = %report.phase,
            spider_urls = report.spider_urls,
            alerts = report.alerts,
            "Scan run finished"
        );
        report
    }

    async fn execute(&self, run: &mut ScanRun, report: &mut RunReport) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&run.report_dir).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create report directory {}: {e}",
                run.report_dir.display()
            ))
        })?;

        // 1. Spider
        run.advance(RunPhase::Spidering)?;
        info!(run_id = %run.id, url = %run.target, "Spidering target");
        let urls = self
            .spider_poller
            .run_phase(&SpiderPhase::new(self.scanner.as_ref()), &run.target)
            .await
            .into_items();
        report.spider_urls = urls.len();
        persister::write_lines(&urls, &run.report_dir.join(SPIDER_RESULTS_FILE)).await;

        // 2. Active scan
        run.advance(RunPhase::ActiveScanning)?;
        info!(run_id = %run.id, url = %run.target, "Active scanning target");
        let alerts = self
            .active_scan_poller
            .run_phase(&ActiveScanPhase::new(self.scanner.as_ref()), &run.target)
            .await
            .into_items();
        report.alerts = alerts.len();
        let alerts_path = run.report_dir.join(ALERTS_FILE);
        persister::write_structured(&alerts, &alerts_path).await;
        info!(run_id = %run.id, report_dir = %run.report_dir.display(), "Results saved");

        // 3. Upload
        run.advance(RunPhase::Uploading)?;
        let outcome = self
            .uploader
            .upload(&alerts_path, &run.target, &run.engagement_id)
            .await;
        report.upload = Some(outcome);

        run.advance(RunPhase::Done)?;
        Ok(())
    }
}
