//! In-process mock ZAP and DefectDojo servers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `app` on a random local port and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}")
}

/// Recorded state of the mock ZAP instance.
#[derive(Default)]
pub struct MockZap {
    /// Spider status answers `50` this many times before `100`.
    pub spider_polls_before_done: u32,
    pub spider_polls: AtomicU32,
    pub ascan_polls: AtomicU32,
    pub calls: Mutex<Vec<String>>,
    pub api_keys: Mutex<Vec<String>>,
    pub queries: Mutex<Vec<HashMap<String, String>>>,
}

impl MockZap {
    fn record(&self, call: &str, headers: &HeaderMap, query: HashMap<String, String>) {
        self.calls.lock().unwrap().push(call.to_string());
        if let Some(key) = headers.get("X-ZAP-API-Key").and_then(|v| v.to_str().ok()) {
            self.api_keys.lock().unwrap().push(key.to_string());
        }
        self.queries.lock().unwrap().push(query);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

type ZapState = State<Arc<MockZap>>;
type Params = Query<HashMap<String, String>>;

async fn spider_scan(State(zap): ZapState, headers: HeaderMap, Query(q): Params) -> Json<Value> {
    zap.record("spider_scan", &headers, q);
    Json(json!({ "scan": "3" }))
}

async fn spider_status(State(zap): ZapState, headers: HeaderMap, Query(q): Params) -> Json<Value> {
    zap.record("spider_status", &headers, q);
    let seen = zap.spider_polls.fetch_add(1, Ordering::SeqCst);
    let status = if seen < zap.spider_polls_before_done { "50" } else { "100" };
    Json(json!({ "status": status }))
}

async fn spider_results(State(zap): ZapState, headers: HeaderMap, Query(q): Params) -> Json<Value> {
    zap.record("spider_results", &headers, q);
    Json(json!({ "results": ["https://example.com/", "https://example.com/login"] }))
}

async fn ascan_scan(State(zap): ZapState, headers: HeaderMap, Query(q): Params) -> Json<Value> {
    zap.record("ascan_scan", &headers, q);
    Json(json!({ "scan": 4 }))
}

async fn ascan_status(State(zap): ZapState, headers: HeaderMap, Query(q): Params) -> Json<Value> {
    zap.record("ascan_status", &headers, q);
    zap.ascan_polls.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "status": "100" }))
}

async fn alerts(State(zap): ZapState, headers: HeaderMap, Query(q): Params) -> Json<Value> {
    zap.record("alerts", &headers, q);
    Json(json!({
        "alerts": [
            {
                "risk": "High",
                "description": "Cross Site Scripting (Reflected)",
                "name": "Cross Site Scripting (Reflected)",
                "url": "https://example.com/login?q=%3Cscript%3E",
                "param": "q",
                "pluginId": "40012"
            },
            {
                "risk": "Low",
                "description": "Cookie without HttpOnly flag",
                "name": "Cookie No HttpOnly Flag",
                "url": "https://example.com/",
                "pluginId": "10010"
            }
        ]
    }))
}

async fn version(State(zap): ZapState, headers: HeaderMap, Query(q): Params) -> Json<Value> {
    zap.record("version", &headers, q);
    Json(json!({ "version": "2.15.0" }))
}

/// Start a mock ZAP API and return its base URL.
pub async fn start_zap(zap: Arc<MockZap>) -> String {
    let app = Router::new()
        .route("/JSON/spider/action/scan/", get(spider_scan))
        .route("/JSON/spider/view/status/", get(spider_status))
        .route("/JSON/spider/view/results/", get(spider_results))
        .route("/JSON/ascan/action/scan/", get(ascan_scan))
        .route("/JSON/ascan/view/status/", get(ascan_status))
        .route("/JSON/core/view/alerts/", get(alerts))
        .route("/JSON/core/view/version/", get(version))
        .with_state(zap);
    serve(app).await
}

/// One request received by the mock DefectDojo.
#[derive(Debug, Clone)]
pub struct ReceivedImport {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

/// Recorded state of the mock DefectDojo instance.
pub struct MockDojo {
    pub status: StatusCode,
    pub response_body: String,
    pub imports: Mutex<Vec<ReceivedImport>>,
}

impl MockDojo {
    pub fn answering(status: StatusCode, response_body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            response_body: response_body.to_string(),
            imports: Mutex::new(Vec::new()),
        })
    }

    pub fn imports(&self) -> Vec<ReceivedImport> {
        self.imports.lock().unwrap().clone()
    }
}

async fn import_scan(
    State(dojo): State<Arc<MockDojo>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    dojo.imports.lock().unwrap().push(ReceivedImport {
        authorization: header("authorization"),
        content_type: header("content-type"),
        body: String::from_utf8_lossy(&body).into_owned(),
    });
    (dojo.status, dojo.response_body.clone())
}

/// Start a mock DefectDojo API and return its `/api/v2` base URL.
pub async fn start_dojo(dojo: Arc<MockDojo>) -> String {
    let app = Router::new()
        .route("/api/v2/import-scan/", post(import_scan))
        .with_state(dojo);
    format!("{}/api/v2", serve(app).await)
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
