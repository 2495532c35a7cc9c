//! Scan request, run lifecycle and per-phase outcomes.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{AppError, MISSING_FIELDS_MESSAGE};
use crate::models::target::ScanTarget;

/// Webhook payload naming the target and the findings engagement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanRequest {
    #[serde(default, deserialize_with = "text_or_number")]
    pub image: Option<String>,
    /// DefectDojo engagement ids are usually sent as JSON numbers.
    #[serde(default, deserialize_with = "text_or_number")]
    pub engagement_id: Option<String>,
}

/// Accept a string or a non-zero number; anything else counts as missing.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    })
}

/// A validated request, ready to be handed to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedScan {
    pub target: ScanTarget,
    pub engagement_id: String,
}

impl ScanRequest {
    /// Require non-empty `image` and `engagement_id` and normalize the target.
    pub fn validate(self) -> Result<AcceptedScan, AppError> {
        let image = self.image.filter(|s| !s.trim().is_empty());
        let engagement_id = self.engagement_id.filter(|s| !s.trim().is_empty());

        match (image, engagement_id) {
            (Some(image), Some(engagement_id)) => Ok(AcceptedScan {
                target: ScanTarget::normalize(image.trim()),
                engagement_id,
            }),
            _ => Err(AppError::Validation(MISSING_FIELDS_MESSAGE.to_string())),
        }
    }
}

// -- Run lifecycle --

/// Phase of a single scan run.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum RunPhase {
    Started,
    Spidering,
    ActiveScanning,
    Uploading,
    Done,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Check whether a phase change follows the run graph.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (Self::Started, Self::Spidering)
                | (Self::Spidering, Self::ActiveScanning)
                | (Self::ActiveScanning, Self::Uploading)
                | (Self::Uploading, Self::Done)
        ) || (!self.is_terminal() && next == Self::Failed)
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Spidering => write!(f, "spidering"),
            Self::ActiveScanning => write!(f, "active_scanning"),
            Self::Uploading => write!(f, "uploading"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// State of one pipeline run. Owned by the task executing it.
#[derive(Debug)]
pub struct ScanRun {
    pub id: Uuid,
    pub target: ScanTarget,
    pub engagement_id: String,
    pub report_dir: PathBuf,
    phase: RunPhase,
}

impl ScanRun {
    pub fn new(id: Uuid, target: ScanTarget, engagement_id: String, report_dir: PathBuf) -> Self {
        Self {
            id,
            target,
            engagement_id,
            report_dir,
            phase: RunPhase::Started,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Move the run to `next`, rejecting edges outside the run graph.
    pub fn advance(&mut self, next: RunPhase) -> Result<(), AppError> {
        if !self.phase.can_transition_to(next) {
            return Err(AppError::Internal(format!(
                "Cannot move scan run from {} to {next}",
                self.phase
            )));
        }
        tracing::debug!(run_id = %self.id, from = %self.phase, to = %next, "Scan run phase change");
        self.phase = next;
        Ok(())
    }

    /// Mark the run failed. No-op once the run is terminal.
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = RunPhase::Failed;
        }
    }
}

// -- Phase results --

/// Result of driving one scanner phase to completion.
///
/// A degraded phase carries no items; downstream steps treat it as empty.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome<T> {
    Completed { items: Vec<T>, polls: u32 },
    Degraded { reason: String, polls: u32 },
}

impl<T> PhaseOutcome<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Number of progress polls the phase needed.
    pub fn polls(&self) -> u32 {
        match self {
            Self::Completed { polls, .. } | Self::Degraded { polls, .. } => *polls,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Completed { items, .. } => items,
            Self::Degraded { .. } => Vec::new(),
        }
    }
}

/// Result of one import attempt against the findings backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub success: bool,
    /// HTTP status, or 0 when no response was received.
    pub status_code: u16,
    pub message: String,
}

/// Summary of a finished pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub target: String,
    pub phase: RunPhase,
    pub spider_urls: usize,
    pub alerts: usize,
    pub upload: Option<UploadOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(image: Option<&str>, engagement: Option<&str>) -> ScanRequest {
        ScanRequest {
            image: image.map(str::to_string),
            engagement_id: engagement.map(str::to_string),
        }
    }

    #[test]
    fn valid_request_normalizes_target() {
        let accepted = request(Some("example.com"), Some("42")).validate().unwrap();
        assert_eq!(accepted.target.canonical_url, "https://example.com");
        assert_eq!(accepted.engagement_id, "42");
    }

    #[test]
    fn missing_or_empty_fields_are_rejected() {
        for req in [
            request(None, Some("42")),
            request(Some("example.com"), None),
            request(Some(""), Some("42")),
            request(Some("example.com"), Some("  ")),
            request(None, None),
        ] {
            let err = req.validate().unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.to_string(), format!("Validation error: {MISSING_FIELDS_MESSAGE}"));
        }
    }

    #[test]
    fn numeric_engagement_id_is_accepted() {
        let req: ScanRequest =
            serde_json::from_str(r#"{"image": "example.com", "engagement_id": 42}"#).unwrap();
        let accepted = req.validate().unwrap();
        assert_eq!(accepted.engagement_id, "42");
        assert_eq!(accepted.target.canonical_url, "https://example.com");
    }

    #[test]
    fn falsy_or_structured_values_count_as_missing() {
        for body in [
            r#"{"image": "example.com", "engagement_id": 0}"#,
            r#"{"image": "example.com", "engagement_id": null}"#,
            r#"{"image": "example.com", "engagement_id": true}"#,
            r#"{"image": ["example.com"], "engagement_id": 7}"#,
        ] {
            let req: ScanRequest = serde_json::from_str(body).unwrap();
            assert!(req.validate().unwrap_err().is_validation(), "{body}");
        }
    }

    #[test]
    fn run_graph_is_strictly_sequential() {
        assert!(RunPhase::Started.can_transition_to(RunPhase::Spidering));
        assert!(RunPhase::Spidering.can_transition_to(RunPhase::ActiveScanning));
        assert!(RunPhase::ActiveScanning.can_transition_to(RunPhase::Uploading));
        assert!(RunPhase::Uploading.can_transition_to(RunPhase::Done));

        assert!(!RunPhase::Started.can_transition_to(RunPhase::ActiveScanning));
        assert!(!RunPhase::Spidering.can_transition_to(RunPhase::Uploading));
        assert!(!RunPhase::ActiveScanning.can_transition_to(RunPhase::Spidering));
    }

    #[test]
    fn failed_reachable_from_any_live_phase() {
        for phase in [
            RunPhase::Started,
            RunPhase::Spidering,
            RunPhase::ActiveScanning,
            RunPhase::Uploading,
        ] {
            assert!(phase.can_transition_to(RunPhase::Failed), "{phase}");
        }
    }

    #[test]
    fn terminal_phases_are_final() {
        for phase in [RunPhase::Done, RunPhase::Failed] {
            assert!(phase.is_terminal());
            assert!(!phase.can_transition_to(RunPhase::Failed));
            assert!(!phase.can_transition_to(RunPhase::Started));
        }
    }

    #[test]
    fn scan_run_rejects_skipped_phase() {
        let mut run = ScanRun::new(
            Uuid::nil(),
            ScanTarget::normalize("example.com"),
            "1".to_string(),
            PathBuf::from("import/time/example.com"),
        );
        assert!(run.advance(RunPhase::Uploading).is_err());
        assert_eq!(run.phase(), RunPhase::Started);

        run.advance(RunPhase::Spidering).unwrap();
        run.fail();
        assert_eq!(run.phase(), RunPhase::Failed);
        assert!(run.advance(RunPhase::ActiveScanning).is_err());
    }

    #[test]
    fn degraded_outcome_is_empty() {
        let outcome: PhaseOutcome<String> = PhaseOutcome::Degraded {
            reason: "scanner unreachable".to_string(),
            polls: 0,
        };
        assert!(outcome.is_degraded());
        assert_eq!(outcome.polls(), 0);
        assert!(outcome.into_items().is_empty());
    }

    #[test]
    fn completed_outcome_keeps_order() {
        let outcome = PhaseOutcome::Completed {
            items: vec!["b".to_string(), "a".to_string()],
            polls: 3,
        };
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.polls(), 3);
        assert_eq!(outcome.into_items(), vec!["b", "a"]);
    }

    #[test]
    fn run_phase_serialization() {
        let json = serde_json::to_value(RunPhase::ActiveScanning).unwrap();
        assert_eq!(json, "ActiveScanning");
        assert_eq!(RunPhase::ActiveScanning.to_string(), "active_scanning");
    }
}
