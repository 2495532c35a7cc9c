use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub zap_api_url: String,
    pub zap_api_key: String,
    pub dojo_url: String,
    pub dojo_api_key: String,
    pub dojo_test_type: String,
    pub report_root: PathBuf,
    pub spider_poll_interval_secs: u64,
    pub active_scan_poll_interval_secs: u64,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    /// Every variable is optional; unset or unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("BACKEND_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            zap_api_url: env::var("ZAP_API_URL")
                .unwrap_or_else(|_| "http://localhost:8090".to_string()),
            zap_api_key: env::var("ZAP_API_KEY").unwrap_or_default(),
            dojo_url: env::var("DOJO_URL").unwrap_or_default(),
            dojo_api_key: env::var("DOJO_API_KEY").unwrap_or_default(),
            dojo_test_type: env::var("DOJO_TEST_TYPE").unwrap_or_else(|_| "ZAP Scan".to_string()),
            report_root: env::var("REPORT_ROOT")
                .unwrap_or_else(|_| "import/time".to_string())
                .into(),
            spider_poll_interval_secs: env::var("SPIDER_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            active_scan_poll_interval_secs: env::var("ACTIVE_SCAN_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        }
    }

    pub fn spider_poll_interval(&self) -> Duration {
        Duration::from_secs(self.spider_poll_interval_secs)
    }

    pub fn active_scan_poll_interval(&self) -> Duration {
        Duration::from_secs(self.active_scan_poll_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            zap_api_url: "http://localhost:8090".to_string(),
            zap_api_key: String::new(),
            dojo_url: String::new(),
            dojo_api_key: String::new(),
            dojo_test_type: "ZAP Scan".to_string(),
            report_root: PathBuf::from("import/time"),
            spider_poll_interval_secs: 1,
            active_scan_poll_interval_secs: 5,
            http_timeout_secs: 30,
        }
    }
}
