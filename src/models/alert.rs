//! ZAP alert record as returned by `core/view/alerts`.

use serde::{Deserialize, Serialize};

/// An alert raised by the active scan.
///
/// ZAP reports the severity as `risk`. Fields other than severity and
/// description are kept verbatim so the persisted report carries everything
/// the scanner returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Alert {
    #[serde(rename = "risk", alias = "severity", default)]
    pub severity: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Alert {
    /// Alert title, when the scanner supplied one.
    pub fn name(&self) -> Option<&str> {
        self.extra
            .get("name")
            .or_else(|| self.extra.get("alert"))
            .and_then(|v| v.as_str())
    }
}
