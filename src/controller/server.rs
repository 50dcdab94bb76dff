//! # HTTP Server
//!
//! HTTP server for metrics, health checks, Kubernetes probes and the CRD webhooks.
//!
//! Provides endpoints:
//! - `/metrics` - Prometheus metrics in text format
//! - `/healthz` - Liveness probe (always returns 200)
//! - `/readyz` - Readiness probe (200 once Passbolt login and the first cache load succeeded)
//! - `/convert` - `ConversionReview` between the served `PassboltSecret` versions
//! - `/validate` - `AdmissionReview` for `PassboltSecret` objects
//!
//! The server runs on port 5000 by default (configurable via `METRICS_PORT` environment variable).
//! TLS for the webhooks is terminated in front of the server.

use crate::admission;
use crate::conversion::{convert_review, NameLookup};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use kube::core::admission::AdmissionReview;
use kube::core::conversion::ConversionReview;
use kube::core::DynamicObject;
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub struct ServerState {
    /// Set once the listener is bound
    pub is_serving: AtomicBool,
    /// Set once the controller can sync, cleared on shutdown
    pub is_ready: AtomicBool,
    pub registry: Registry,
    /// Name/ID lookups for `/convert`
    pub lookup: Arc<dyn NameLookup>,
    /// Serve `/convert` and `/validate`
    pub webhooks_enabled: bool,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("is_serving", &self.is_serving.load(Ordering::Relaxed))
            .field("is_ready", &self.is_ready.load(Ordering::Relaxed))
            .field("webhooks_enabled", &self.webhooks_enabled)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    pub fn new(registry: Registry, lookup: Arc<dyn NameLookup>, webhooks_enabled: bool) -> Self {
        Self {
            is_serving: AtomicBool::new(false),
            is_ready: AtomicBool::new(false),
            registry,
            lookup,
            webhooks_enabled,
        }
    }
}

pub fn router(state: Arc<ServerState>) -> Router {
    let mut app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler));
    if state.webhooks_enabled {
        app = app
            .route("/convert", post(convert_handler))
            .route("/validate", post(validate_handler));
    }
    app.layer(TraceLayer::new_for_http()).with_state(state)
}

#[allow(clippy::missing_errors_doc, reason = "Bind or serve failure")]
pub async fn start_server(port: u16, state: Arc<ServerState>) -> Result<(), anyhow::Error> {
    let app = router(Arc::clone(&state));

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    state.is_serving.store(true, Ordering::Relaxed);

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn metrics_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        buffer,
    )
}

async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

async fn readyz_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    if state.is_ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn convert_handler(
    State(state): State<Arc<ServerState>>,
    Json(review): Json<ConversionReview>,
) -> Json<ConversionReview> {
    Json(convert_review(review, state.lookup.as_ref()).await)
}

async fn validate_handler(
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    Json(admission::review(review))
}
