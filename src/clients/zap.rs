//! OWASP ZAP scan-control client.
//!
//! API endpoints used (relative to the configured ZAP address):
//! - GET /JSON/spider/action/scan/    - start a spider job
//! - GET /JSON/spider/view/status/    - spider percent complete
//! - GET /JSON/spider/view/results/   - URLs discovered by a spider job
//! - GET /JSON/ascan/action/scan/     - start an active scan job
//! - GET /JSON/ascan/view/status/     - active scan percent complete
//! - GET /JSON/core/view/alerts/      - alerts accumulated for a base URL
//! - GET /JSON/core/view/version/     - scanner version (readiness probe)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::errors::ClientError;
use crate::models::alert::Alert;

/// Identifier of a job owned by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scan-control operations the pipeline needs from the scanning engine.
#[async_trait]
pub trait ScanControl: Send + Sync {
    async fn start_spider(&self, url: &str) -> Result<JobId, ClientError>;

    /// Percent complete, 0 to 100.
    async fn spider_progress(&self, job: &JobId) -> Result<u8, ClientError>;

    async fn spider_results(&self, job: &JobId) -> Result<Vec<String>, ClientError>;

    async fn start_active_scan(&self, url: &str) -> Result<JobId, ClientError>;

    /// Percent complete, 0 to 100.
    async fn active_scan_progress(&self, job: &JobId) -> Result<u8, ClientError>;

    /// Alerts are addressed by target URL, not by job.
    async fn alerts(&self, base_url: &str) -> Result<Vec<Alert>, ClientError>;

    async fn version(&self) -> Result<String, ClientError>;
}

/// HTTP client for the ZAP JSON API.
pub struct ZapClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ZapClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(format!("zapdojo/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/JSON/{}/", self.base_url, path.trim_matches('/'))
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ClientError> {
        let mut request = self.http.get(self.api_url(path)).query(query);
        if !self.api_key.is_empty() {
            request = request.header("X-ZAP-API-Key", &self.api_key);
        }

        let res = request.send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status,
                message: text,
            });
        }

        let body: Value = res.json().await?;
        debug!(path, "ZAP API call succeeded");
        Ok(body)
    }

    async fn start(&self, component: &str, url: &str) -> Result<JobId, ClientError> {
        let body = self
            .get_json(&format!("{component}/action/scan"), &[("url", url)])
            .await?;
        scalar(&body, "scan").map(JobId)
    }

    async fn progress(&self, component: &str, job: &JobId) -> Result<u8, ClientError> {
        let body = self
            .get_json(&format!("{component}/view/status"), &[("scanId", job.0.as_str())])
            .await?;
        parse_progress(&scalar(&body, "status")?)
    }
}

#[async_trait]
impl ScanControl for ZapClient {
    async fn start_spider(&self, url: &str) -> Result<JobId, ClientError> {
        self.start("spider", url).await
    }

    async fn spider_progress(&self, job: &JobId) -> Result<u8, ClientError> {
        self.progress("spider", job).await
    }

    async fn spider_results(&self, job: &JobId) -> Result<Vec<String>, ClientError> {
        let body = self
            .get_json("spider/view/results", &[("scanId", job.0.as_str())])
            .await?;
        let results = body
            .get("results")
            .cloned()
            .ok_or_else(|| ClientError::Payload("missing 'results' in spider response".into()))?;
        serde_json::from_value(results)
            .map_err(|e| ClientError::Payload(format!("spider results: {e}")))
    }

    async fn start_active_scan(&self, url: &str) -> Result<JobId, ClientError> {
        self.start("ascan", url).await
    }

    async fn active_scan_progress(&self, job: &JobId) -> Result<u8, ClientError> {
        self.progress("ascan", job).await
    }

    async fn alerts(&self, base_url: &str) -> Result<Vec<Alert>, ClientError> {
        let body = self
            .get_json("core/view/alerts", &[("baseurl", base_url)])
            .await?;
        let alerts = body
            .get("alerts")
            .cloned()
            .ok_or_else(|| ClientError::Payload("missing 'alerts' in alerts response".into()))?;
        serde_json::from_value(alerts).map_err(|e| ClientError::Payload(format!("alerts: {e}")))
    }

    async fn version(&self) -> Result<String, ClientError> {
        let body = self.get_json("core/view/version", &[]).await?;
        scalar(&body, "version")
    }
}

/// Read a scalar field that ZAP may encode as either a string or a number.
fn scalar(body: &Value, key: &str) -> Result<String, ClientError> {
    match body.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ClientError::Payload(format!("missing '{key}' in response: {body}"))),
    }
}

/// Parse a percent-complete value, saturating at 100.
fn parse_progress(raw: &str) -> Result<u8, ClientError> {
    let value: u32 = raw
        .trim()
        .parse()
        .map_err(|_| ClientError::Payload(format!("invalid progress value '{raw}'")))?;
    Ok(value.min(100) as u8)
}
