//! Scan target derived from the raw image/host reference in a webhook.

use serde::Serialize;

/// A normalized scan target.
///
/// The canonical URL is always served over HTTPS, whatever scheme the caller
/// supplied. `safe_name` is the directory name used for the target's reports:
/// it never contains a path separator and is never empty, `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanTarget {
    pub canonical_url: String,
    pub safe_name: String,
}

impl ScanTarget {
    const HTTPS: &'static str = "https://";
    const HTTP: &'static str = "http://";

    /// Derive a target from a raw image or hostname.
    pub fn normalize(raw_image: &str) -> Self {
        let host = raw_image
            .strip_prefix(Self::HTTPS)
            .or_else(|| raw_image.strip_prefix(Self::HTTP))
            .unwrap_or(raw_image);

        let canonical_url = format!("{}{host}", Self::HTTPS);
        let mut safe_name = host.replace(['/', '\\'], "_");
        // "", "." and ".." would land in or above the report root.
        if safe_name.chars().all(|c| c == '.') {
            safe_name = "_".repeat(safe_name.len().max(1));
        }

        Self {
            canonical_url,
            safe_name,
        }
    }
}

impl std::fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical_url)
    }
}
