//! HTTP Server and Collector Supervision
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing `/metrics`, `/health`, and `/`
//! - **Collectors**: one long-lived task per configured endpoint, each running
//!   its enabled modules on their own poll cadence
//! - **Shutdown**: a watch channel signals every module task when the server
//!   stops; `start` returns only after all of them wound down
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - Health check (200 once every array is reachable, 503 otherwise)

use crate::collectors::Collector;
use crate::config::Config;
use crate::metrics::ExporterMetrics;
use crate::unisphere::UnisphereClient;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    metrics: ExporterMetrics,
    instances: Vec<String>,
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let metrics = ExporterMetrics::new()?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut instances = Vec::new();
    let mut tasks = Vec::new();
    for endpoint in &config.endpoints {
        let client = Arc::new(UnisphereClient::new(endpoint)?);
        instances.push(client.endpoint().to_string());
        let collector = Collector::new(
            client,
            endpoint.clone(),
            config.modules.clone(),
            metrics.clone(),
        );
        tasks.push(tokio::spawn(collector.run(shutdown_rx.clone())));
    }

    let state = AppState { metrics, instances };
    let app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the module tasks and wait for them to wind down.
    let _ = shutdown_tx.send(true);
    for task in tasks {
        let _ = task.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn root_handler() -> impl IntoResponse {
    r#"<html>
<head><title>Unisphere Exporter</title></head>
<body>
<h1>Unisphere Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let up = state
        .instances
        .iter()
        .all(|instance| state.metrics.up.with_label_values(&[instance]).get() > 0.0);

    if up {
        (axum::http::StatusCode::OK, "OK")
    } else {
        (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Unisphere API unreachable",
        )
    }
}
