//! Prometheus metrics and probe endpoints.
//!
//! Serves `/healthz`, `/readyz` and `/metrics` over HTTP.

use crate::error::ControllerError;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Controller metrics
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    scale_operations: IntCounterVec,
    objects_scaled: IntCounterVec,
    validation_failures: IntCounter,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create and register every metric
    pub fn new() -> Result<Self, ControllerError> {
        let registry = Registry::new();

        let scale_operations = IntCounterVec::new(
            Opts::new(
                "downscaler_scale_operations_total",
                "Scaling runs per resource kind and result",
            ),
            &["kind", "result"],
        )?;
        let objects_scaled = IntCounterVec::new(
            Opts::new(
                "downscaler_objects_scaled_total",
                "Workload objects patched per resource kind",
            ),
            &["kind"],
        )?;
        let validation_failures = IntCounter::new(
            "downscaler_validation_failures_total",
            "Downscaler specs rejected by validation",
        )?;

        registry.register(Box::new(scale_operations.clone()))?;
        registry.register(Box::new(objects_scaled.clone()))?;
        registry.register(Box::new(validation_failures.clone()))?;

        Ok(Self {
            registry,
            scale_operations,
            objects_scaled,
            validation_failures,
        })
    }

    /// Record a successful scaling run
    pub fn scale_succeeded(&self, kind: &str, objects: usize) {
        self.scale_operations.with_label_values(&[kind, "success"]).inc();
        self.objects_scaled
            .with_label_values(&[kind])
            .inc_by(u64::try_from(objects).unwrap_or(u64::MAX));
    }

    /// Record a failed scaling run
    pub fn scale_failed(&self, kind: &str) {
        self.scale_operations.with_label_values(&[kind, "error"]).inc();
    }

    /// Record a rejected spec
    pub fn validation_failed(&self) {
        self.validation_failures.inc();
    }

    /// Render every metric in the Prometheus text format
    pub fn render(&self) -> Result<String, ControllerError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| ControllerError::InvalidConfig(format!("metrics are not UTF-8: {}", e)))
    }
}

/// Shared state of the probe server
#[derive(Debug)]
pub struct ProbeState {
    /// Controller metrics
    pub metrics: Arc<Metrics>,
    /// Set once the watcher has listed every Downscaler
    pub ready: AtomicBool,
}

impl ProbeState {
    /// Create a not-yet-ready probe state
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            ready: AtomicBool::new(false),
        }
    }

    /// Mark the controller ready
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }
}

/// Build the probe router
pub fn router(state: Arc<ProbeState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn readyz(State(state): State<Arc<ProbeState>>) -> (StatusCode, &'static str) {
    if state.ready.load(Ordering::Acquire) {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

async fn metrics(State(state): State<Arc<ProbeState>>) -> (StatusCode, String) {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Serve probes until the listener fails
pub async fn serve(addr: SocketAddr, state: Arc<ProbeState>) -> Result<(), ControllerError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Probe server listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_recorded_values() {
        let metrics = Metrics::new().expect("metrics register");
        metrics.scale_succeeded("deployments", 3);
        metrics.scale_failed("hpa");
        metrics.validation_failed();

        let body = metrics.render().expect("render");
        assert!(
            body.contains("downscaler_scale_operations_total{kind=\"deployments\",result=\"success\"} 1")
        );
        assert!(
            body.contains("downscaler_scale_operations_total{kind=\"hpa\",result=\"error\"} 1")
        );
        assert!(body.contains("downscaler_objects_scaled_total{kind=\"deployments\"} 3"));
        assert!(body.contains("downscaler_validation_failures_total 1"));
    }

    #[tokio::test]
    async fn test_readyz_follows_ready_flag() {
        let state = Arc::new(ProbeState::new(Arc::new(Metrics::new().expect("metrics register"))));
        assert_eq!(readyz(State(Arc::clone(&state))).await.0, StatusCode::SERVICE_UNAVAILABLE);
        state.set_ready();
        assert_eq!(readyz(State(state)).await.0, StatusCode::OK);
    }
}
