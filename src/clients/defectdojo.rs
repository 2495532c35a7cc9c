//! DefectDojo findings-import client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::errors::ClientError;

/// One `import-scan` submission.
#[derive(Debug, Clone)]
pub struct ImportScan {
    pub engagement: String,
    pub test_type: String,
    pub scan_date: NaiveDate,
    pub scan_type: String,
    pub minimum_severity: String,
    pub active: bool,
    pub verified: bool,
    pub file_name: String,
    pub file: Vec<u8>,
}

impl ImportScan {
    /// Form fields in submission order, excluding the file payload.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("engagement", self.engagement.clone()),
            ("test_type", self.test_type.clone()),
            ("scan_date", self.scan_date.format("%Y-%m-%d").to_string()),
            ("scan_type", self.scan_type.clone()),
            ("minimum_severity", self.minimum_severity.clone()),
            ("active", self.active.to_string()),
            ("verified", self.verified.to_string()),
        ]
    }
}

/// Raw answer from the findings backend. Success is judged by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: String,
}

/// Findings-management backend accepting scan report imports.
#[async_trait]
pub trait FindingsBackend: Send + Sync {
    async fn import_scan(&self, import: ImportScan) -> Result<BackendResponse, ClientError>;
}

/// HTTP client for the DefectDojo v2 API.
pub struct DefectDojoClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl DefectDojoClient {
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

    fn import_url(&self) -> String {
        format!("{}/import-scan/", self.base_url)
    }
}

#[async_trait]
impl FindingsBackend for DefectDojoClient {
    async fn import_scan(&self, import: ImportScan) -> Result<BackendResponse, ClientError> {
        let mut form = Form::new();
        for (name, value) in import.fields() {
            form = form.text(name, value);
        }
        let part = Part::bytes(import.file)
            .file_name(import.file_name)
            .mime_str("application/json")?;
        form = form.part("file", part);

        let res = self
            .http
            .post(self.import_url())
            .header("Authorization", format!("Token {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        Ok(BackendResponse { status, body })
    }
}
