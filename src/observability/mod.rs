//! Observability
//!
//! Prometheus-format counters, health checks and tracing setup.

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::config::LoggingConfig;
use crate::storage::StorageBackend;

// ===== Metrics =====

/// Application counters
#[derive(Debug, Default)]
pub struct AppMetrics {
    pub http_requests_total: AtomicU64,
    pub http_request_duration_sum: AtomicU64,
    pub active_connections: AtomicUsize,
    pub chat_turns_total: AtomicU64,
    pub chat_fallbacks_total: AtomicU64,
    pub sms_sent_total: AtomicU64,
    pub sms_failed_total: AtomicU64,
    pub errors_total: AtomicU64,
}

impl AppMetrics {
    pub fn record_http_request(&self, duration_ms: u64) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
        self.http_request_duration_sum
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record one chat turn and whether it fell back.
    pub fn record_chat_turn(&self, fallback: bool) {
        self.chat_turns_total.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.chat_fallbacks_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_sms(&self, success: bool) {
        if success {
            self.sms_sent_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.sms_failed_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Render in Prometheus text format
    pub fn gather(&self) -> String {
        let requests = self.http_requests_total.load(Ordering::Relaxed);
        format!(
            r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP http_request_duration_seconds HTTP request duration in seconds
# TYPE http_request_duration_seconds summary
http_request_duration_seconds_sum {}
http_request_duration_seconds_count {}
# HELP active_connections In-flight HTTP requests
# TYPE active_connections gauge
active_connections {}
# HELP chat_turns_total Chat turns answered
# TYPE chat_turns_total counter
chat_turns_total {}
# HELP chat_fallbacks_total Chat turns with no confident intent
# TYPE chat_fallbacks_total counter
chat_fallbacks_total {}
# HELP sms_sent_total SMS accepted by the provider
# TYPE sms_sent_total counter
sms_sent_total {}
# HELP sms_failed_total SMS rejected or not delivered to the provider
# TYPE sms_failed_total counter
sms_failed_total {}
# HELP errors_total Responses with a 5xx status
# TYPE errors_total counter
errors_total {}
"#,
            requests,
            self.http_request_duration_sum.load(Ordering::Relaxed) as f64 / 1000.0,
            requests,
            self.active_connections.load(Ordering::Relaxed),
            self.chat_turns_total.load(Ordering::Relaxed),
            self.chat_fallbacks_total.load(Ordering::Relaxed),
            self.sms_sent_total.load(Ordering::Relaxed),
            self.sms_failed_total.load(Ordering::Relaxed),
            self.errors_total.load(Ordering::Relaxed),
        )
    }
}

// ===== Health Check =====

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub checks: Vec<HealthCheck>,
}

/// One dependency check
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

impl HealthCheck {
    fn new(name: &str, healthy: bool, message: String, latency_ms: Option<u64>) -> Self {
        Self {
            name: name.to_string(),
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            message: Some(message),
            latency_ms,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// State shared by the observability routes
#[derive(Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub storage: StorageBackend,
    pub sms_configured: bool,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(
        version: String,
        metrics: Arc<AppMetrics>,
        storage: StorageBackend,
        sms_configured: bool,
    ) -> Self {
        Self {
            metrics,
            storage,
            sms_configured,
            start_time: Utc::now(),
            version,
        }
    }

    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_seconds() as f64
    }

    /// Probe storage; SMS is reported but never fails the check.
    pub async fn run_checks(&self) -> Vec<HealthCheck> {
        let started = Instant::now();
        let storage = match self.storage.health_check().await {
            Ok(()) => HealthCheck::new(
                "storage",
                true,
                format!("{} backend reachable", self.storage.name()),
                Some(started.elapsed().as_millis() as u64),
            ),
            Err(e) => HealthCheck::new(
                "storage",
                false,
                e.to_string(),
                Some(started.elapsed().as_millis() as u64),
            ),
        };

        let sms = HealthCheck::new(
            "sms",
            true,
            if self.sms_configured {
                "provider configured".to_string()
            } else {
                "provider not configured, SMS features disabled".to_string()
            },
            None,
        );

        vec![storage, sms]
    }
}

// ===== Handlers =====

/// Full health status
pub async fn health_check(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let checks = state.run_checks().await;
    let all_healthy = checks.iter().all(HealthCheck::is_healthy);

    let health_status = HealthStatus {
        status: if all_healthy { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks,
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_status))
}

pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// Readiness: storage must answer
pub async fn readiness(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    match state.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "Ready"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "Not Ready"),
    }
}

pub async fn metrics(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    (StatusCode::OK, state.metrics.gather())
}

pub async fn version(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "version": state.version,
        "uptime_seconds": state.uptime_seconds(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .route("/metrics", get(metrics))
        .route("/version", get(version))
        .with_state(state)
}

// ===== Structured Logging =====

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `level`. The returned guard flushes the log file
/// and must be held for the lifetime of the process.
pub fn init_tracing(
    config: &LoggingConfig,
) -> Result<Option<WorkerGuard>, tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = if config.structured {
        fmt::layer().json().with_current_span(true).boxed()
    } else {
        fmt::layer().with_target(true).with_line_number(true).boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "maternia.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .with(filter)
        .try_init()?;

    Ok(guard)
}

// ===== Request Metrics Middleware =====

/// Count requests, latency and 5xx responses
pub async fn metrics_middleware(
    State(metrics): State<Arc<AppMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    metrics.connection_opened();

    let response = next.run(req).await;

    metrics.record_http_request(start.elapsed().as_millis() as u64);
    if response.status().is_server_error() {
        metrics.record_error();
    }
    metrics.connection_closed();

    response
}
