//! Poll-loop collectors.
//!
//! One [`Collector`] per configured endpoint. At startup it discovers the
//! array's self-reported name for a shared `host_name` label, then launches
//! one independent task per enabled module. Module tasks never communicate;
//! they share only the session client and read-only label sets, and each owns
//! its own polling cadence and error handling.
//!
//! # Error Handling
//!
//! A failed fetch costs one cycle, never the module: every module converts
//! fetch errors into "log, mark the endpoint down, sleep, retry".

use crate::config::{EndpointConfig, ModulesConfig};
use crate::metrics::ExporterMetrics;
use crate::unisphere::request::{QueryOptions, ResourceType};
use crate::unisphere::types::SystemInstance;
use crate::unisphere::UnisphereClient;
use chrono::{DateTime, Duration as TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

pub mod alert;
pub mod capacity;
pub mod event;
pub mod metric;
pub mod storage_processor;

/// Timestamp layout understood by Unisphere filter predicates.
pub const FILTER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Shared, read-only state handed to every module task of one endpoint.
#[derive(Clone)]
pub struct ModuleContext {
    pub client: Arc<UnisphereClient>,
    pub metrics: ExporterMetrics,
    /// The configured endpoint URL, used as the `instance` label.
    pub instance: String,
    /// Custom labels from the config plus labels discovered at startup.
    pub labels: HashMap<String, String>,
    pub interval: Duration,
}

impl ModuleContext {
    /// Record the outcome of one poll cycle on the shared `up` gauge.
    pub fn record_poll(&self, success: bool) {
        self.metrics
            .up
            .with_label_values(&[&self.instance])
            .set(if success { 1.0 } else { 0.0 });
    }
}

/// Timestamp watermark for the cursor-based log modules.
///
/// The watermark only moves when [`LogCursor::advance`] is called after a
/// successful fetch, so a failed cycle re-covers the same window on the next
/// poll: at-least-once delivery, no gaps under normal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogCursor {
    at: DateTime<Utc>,
}

impl LogCursor {
    /// Seeded one hour before the first poll.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            at: now - TimeDelta::hours(1),
        }
    }

    /// Filter predicate selecting entries newer than the watermark.
    pub fn filter(&self, field: &str) -> String {
        format!("{} gt \"{}\"", field, self.at.format(FILTER_TIME_FORMAT))
    }

    pub fn advance(&mut self, to: DateTime<Utc>) {
        self.at = to;
    }

    pub fn position(&self) -> DateTime<Utc> {
        self.at
    }
}

/// Per-endpoint scheduling unit.
pub struct Collector {
    client: Arc<UnisphereClient>,
    endpoint: EndpointConfig,
    modules: ModulesConfig,
    metrics: ExporterMetrics,
}

impl Collector {
    pub fn new(
        client: Arc<UnisphereClient>,
        endpoint: EndpointConfig,
        modules: ModulesConfig,
        metrics: ExporterMetrics,
    ) -> Self {
        Self {
            client,
            endpoint,
            modules,
            metrics,
        }
    }

    /// Discover shared labels once, then run one task per enabled module
    /// until shutdown is signalled. Returns after every module task wound
    /// down, so callers have a deterministic join point.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let mut labels = self.endpoint.labels.clone();
        if let Some(host) = self.discover_host_name().await {
            labels.insert("host_name".to_string(), host);
        }

        let ctx = ModuleContext {
            client: self.client.clone(),
            metrics: self.metrics.clone(),
            instance: self.client.endpoint().to_string(),
            labels,
            interval: self.endpoint.poll_interval(),
        };

        let mut tasks = Vec::new();
        if self.modules.metric.enabled {
            tasks.push(tokio::spawn(metric::run(
                ctx.clone(),
                self.modules.metric.clone(),
                shutdown.clone(),
            )));
        }
        if self.modules.alert.enabled {
            tasks.push(tokio::spawn(alert::run(
                ctx.clone(),
                self.modules.alert.clone(),
                shutdown.clone(),
            )));
        }
        if self.modules.event.enabled {
            tasks.push(tokio::spawn(event::run(
                ctx.clone(),
                self.modules.event.clone(),
                shutdown.clone(),
            )));
        }
        if self.modules.capacity.enabled {
            tasks.push(tokio::spawn(capacity::run(ctx.clone(), shutdown.clone())));
        }
        if self.modules.storage_processor.enabled {
            tasks.push(tokio::spawn(storage_processor::run(
                ctx.clone(),
                shutdown.clone(),
            )));
        }

        if tasks.is_empty() {
            warn!(instance = %ctx.instance, "no modules enabled for endpoint");
            return;
        }
        info!(instance = %ctx.instance, modules = tasks.len(), "collector started");

        for task in tasks {
            let _ = task.await;
        }
    }

    /// Learn the array's self-reported name for the shared `host_name` label.
    /// Failure only costs the label, never startup.
    async fn discover_host_name(&self) -> Option<String> {
        let query = QueryOptions::new(ResourceType::System).fields(["name"]);
        match self.client.get_instances(&query).await {
            Ok(instances) => instances
                .into_iter()
                .filter_map(|v| serde_json::from_value::<SystemInstance>(v).ok())
                .map(|s| s.name)
                .find(|name| !name.is_empty()),
            Err(e) => {
                warn!(
                    instance = %self.client.endpoint(),
                    error = %e,
                    "cannot discover system name label"
                );
                None
            }
        }
    }
}

/// Sleep one poll interval, or return `true` if shutdown was signalled first.
pub(crate) async fn sleep_or_shutdown(
    interval: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(interval) => false,
        _ = shutdown.changed() => true,
    }
}
