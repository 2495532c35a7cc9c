//! Writes phase outputs into a run's report directory.
//!
//! Writes overwrite existing files. A failed write is logged and reported as
//! `false`; it never aborts the pipeline, so a later upload may read a stale
//! or missing file.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, error};

/// File holding newline-joined spider results.
pub const SPIDER_RESULTS_FILE: &str = "spider_results.txt";

/// File holding the active-scan alert list.
pub const ALERTS_FILE: &str = "alerts.json";

/// Write `lines` joined by newlines.
pub async fn write_lines(lines: &[String], path: &Path) -> bool {
    write_bytes(lines.join("\n").into_bytes(), path, "scan results").await
}

/// Write `value` as pretty-printed JSON.
pub async fn write_structured<T: Serialize + ?Sized>(value: &T, path: &Path) -> bool {
    match serde_json::to_vec_pretty(value) {
        Ok(bytes) => write_bytes(bytes, path, "alerts").await,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Error serializing alerts");
            false
        }
    }
}

async fn write_bytes(bytes: Vec<u8>, path: &Path, what: &str) -> bool {
    match tokio::fs::write(path, &bytes).await {
        Ok(()) => {
            debug!(path = %path.display(), bytes = bytes.len(), "Saved {what}");
            true
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Error saving {what}");
            false
        }
    }
}
