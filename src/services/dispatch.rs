//! Fire-and-forget dispatch of scan runs.
//!
//! Every accepted webhook gets its own supervised task. The supervisor waits
//! for the run, logs how it ended, and drops the result: the webhook caller
//! has already been answered and never learns the outcome.

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::scan::{AcceptedScan, RunReport};
use crate::services::pipeline::ScanPipeline;

/// Spawns pipeline runs without handing back a handle to them.
#[derive(Clone)]
pub struct ScanDispatcher {
    pipeline: Arc<ScanPipeline>,
}

impl ScanDispatcher {
    pub fn new(pipeline: Arc<ScanPipeline>) -> Self {
        Self { pipeline }
    }

    /// Start a run for `scan` in the background and return its id at once.
    pub fn dispatch(&self, scan: AcceptedScan) -> Uuid {
        let run_id = Uuid::new_v4();
        let pipeline = Arc::clone(&self.pipeline);
        let AcceptedScan {
            target,
            engagement_id,
        } = scan;

        info!(run_id = %run_id, url = %target, "Dispatching scan run");
        spawn_supervised(run_id, async move {
            pipeline.run(run_id, target, engagement_id).await
        });
        run_id
    }
}

/// Run `work` on its own task, watched by a supervisor that discards the result.
pub fn spawn_supervised<F>(run_id: Uuid, work: F)
where
    F: Future<Output = RunReport> + Send + 'static,
{
    let worker = tokio::spawn(work);

    // The supervisor handle is dropped on purpose: nothing joins a run.
    drop(tokio::spawn(async move {
        match worker.await {
            Ok(report) => {
                info!(run_id = %run_id, phase = %report.phase, "Scan run ended");
            }
            Err(e) if e.is_panic() => {
                error!(run_id = %run_id, error = %e, "Scan run panicked");
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Scan run cancelled");
            }
        }
    }));
}
