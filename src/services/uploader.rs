//! Packages a persisted active-scan report and imports it into DefectDojo.

use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use tracing::{error, info};

use crate::clients::defectdojo::{FindingsBackend, ImportScan};
use crate::models::scan::UploadOutcome;
use crate::models::target::ScanTarget;

/// `scan_type` the backend uses to pick its report parser.
pub const SCAN_TYPE: &str = "ZAP Scan";

/// Findings below this severity are dropped by the backend on import.
pub const MINIMUM_SEVERITY: &str = "Low";

/// Status the import endpoint returns on success.
const CREATED: u16 = 201;

/// Single-attempt uploader. Failures are logged and reported, never retried.
pub struct FindingsUploader {
    backend: Arc<dyn FindingsBackend>,
    test_type: String,
}

impl FindingsUploader {
    pub fn new(backend: Arc<dyn FindingsBackend>, test_type: impl Into<String>) -> Self {
        Self {
            backend,
            test_type: test_type.into(),
        }
    }

    pub async fn upload(
        &self,
        report_path: &Path,
        target: &ScanTarget,
        engagement_id: &str,
    ) -> UploadOutcome {
        // Read fully so the file handle is closed before the request goes out.
        let file = match tokio::fs::read(report_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(
                    url = %target,
                    path = %report_path.display(),
                    error = %e,
                    "Could not read report for upload to DefectDojo"
                );
                return UploadOutcome {
                    success: false,
                    status_code: 0,
                    message: format!("Failed to read report: {e}"),
                };
            }
        };

        let file_name = report_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.json".to_string());

        let import = ImportScan {
            engagement: engagement_id.to_string(),
            test_type: self.test_type.clone(),
            scan_date: Local::now().date_naive(),
            scan_type: SCAN_TYPE.to_string(),
            minimum_severity: MINIMUM_SEVERITY.to_string(),
            active: true,
            verified: true,
            file_name,
            file,
        };

        match self.backend.import_scan(import).await {
            Ok(res) if res.status == CREATED => {
                info!(url = %target, engagement_id, "Report successfully uploaded to DefectDojo");
                UploadOutcome {
                    success: true,
                    status_code: res.status,
                    message: res.body,
                }
            }
            Ok(res) => {
                error!(
                    url = %target,
                    engagement_id,
                    status = res.status,
                    body = %res.body,
                    "Failed to upload report to DefectDojo"
                );
                UploadOutcome {
                    success: false,
                    status_code: res.status,
                    message: res.body,
                }
            }
            Err(e) => {
                error!(
                    url = %target,
                    engagement_id,
                    error = %e,
                    "Exception occurred while uploading report to DefectDojo"
                );
                UploadOutcome {
                    success: false,
                    status_code: 0,
                    message: e.to_string(),
                }
            }
        }
    }
}
