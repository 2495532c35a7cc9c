pub mod clients;
pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use clients::defectdojo::{DefectDojoClient, FindingsBackend};
use clients::zap::{ScanControl, ZapClient};
use errors::ClientError;
use services::dispatch::ScanDispatcher;
use services::pipeline::ScanPipeline;
use services::uploader::FindingsUploader;

/// Shared application state passed to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub scanner: Arc<dyn ScanControl>,
    pub dispatcher: ScanDispatcher,
}

impl AppState {
    /// Wire the pipeline from injected scanner and findings-backend clients.
    pub fn new(
        config: config::AppConfig,
        scanner: Arc<dyn ScanControl>,
        backend: Arc<dyn FindingsBackend>,
    ) -> Self {
        let uploader = FindingsUploader::new(backend, config.dojo_test_type.clone());
        let pipeline = ScanPipeline::new(Arc::clone(&scanner), uploader, &config);
        Self::with_pipeline(config, scanner, pipeline)
    }

    /// Use a pre-built pipeline, e.g. one with bounded pollers.
    pub fn with_pipeline(
        config: config::AppConfig,
        scanner: Arc<dyn ScanControl>,
        pipeline: ScanPipeline,
    ) -> Self {
        Self {
            config,
            scanner,
            dispatcher: ScanDispatcher::new(Arc::new(pipeline)),
        }
    }

    /// Build the HTTP clients for ZAP and DefectDojo from configuration.
    pub fn from_config(config: config::AppConfig) -> Result<Self, ClientError> {
        let scanner = ZapClient::new(&config.zap_api_url, &config.zap_api_key, config.http_timeout())?;
        let backend =
            DefectDojoClient::new(&config.dojo_url, &config.dojo_api_key, config.http_timeout())?;
        Ok(Self::new(config, Arc::new(scanner), Arc::new(backend)))
    }
}
