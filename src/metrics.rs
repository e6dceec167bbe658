//! Prometheus Metrics Definitions
//!
//! Fixed-schema instruments live here: per-endpoint reachability, system
//! capacity, and storage processor gauges. The realtime metric module builds
//! its instruments from the array's catalog at runtime and registers them as
//! a custom collector through [`ExporterMetrics::register_collector`].
//!
//! All metrics use the `unisphere_` namespace prefix and carry an `instance`
//! label naming the endpoint they came from.

use prometheus::core::Collector;
use prometheus::{Encoder, GaugeVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

#[derive(Clone)]
pub struct ExporterMetrics {
    registry: Arc<Registry>,

    /// Whether the last poll against an endpoint succeeded.
    pub up: Arc<GaugeVec>,

    // System capacity, in MiB
    pub capacity_total: Arc<GaugeVec>,
    pub capacity_used: Arc<GaugeVec>,
    pub capacity_free: Arc<GaugeVec>,
    pub capacity_preallocated: Arc<GaugeVec>,
    pub capacity_provisioned: Arc<GaugeVec>,

    // Storage processor
    pub sp_info: Arc<IntGaugeVec>,
    pub sp_health: Arc<GaugeVec>,
    pub sp_memory_size: Arc<GaugeVec>,
}

impl ExporterMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let up = GaugeVec::new(
            Opts::new("up", "Whether the Unisphere API is reachable (1=up, 0=down)")
                .namespace("unisphere"),
            &["instance"],
        )?;

        let capacity_total = GaugeVec::new(
            Opts::new("capacity_total_capacity", "Total capacity of the array")
                .namespace("unisphere"),
            &["instance"],
        )?;

        let capacity_used = GaugeVec::new(
            Opts::new("capacity_used_capacity", "Used capacity of the array")
                .namespace("unisphere"),
            &["instance"],
        )?;

        let capacity_free = GaugeVec::new(
            Opts::new("capacity_free_capacity", "Free capacity of the array")
                .namespace("unisphere"),
            &["instance"],
        )?;

        let capacity_preallocated = GaugeVec::new(
            Opts::new(
                "capacity_preallocated_capacity",
                "Preallocated capacity of the array",
            )
            .namespace("unisphere"),
            &["instance"],
        )?;

        let capacity_provisioned = GaugeVec::new(
            Opts::new(
                "capacity_total_provision",
                "Total provisioned capacity of the array",
            )
            .namespace("unisphere"),
            &["instance"],
        )?;

        let sp_info = IntGaugeVec::new(
            Opts::new(
                "storage_processor_info",
                "Storage processor information (value is always 1)",
            )
            .namespace("unisphere"),
            &["instance", "sp_id", "model"],
        )?;

        let sp_health = GaugeVec::new(
            Opts::new("storage_processor_health", "Health of the storage processor")
                .namespace("unisphere"),
            &["instance", "sp_id"],
        )?;

        let sp_memory_size = GaugeVec::new(
            Opts::new(
                "storage_processor_memory_size",
                "Memory size of the storage processor",
            )
            .namespace("unisphere"),
            &["instance", "sp_id"],
        )?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(capacity_total.clone()))?;
        registry.register(Box::new(capacity_used.clone()))?;
        registry.register(Box::new(capacity_free.clone()))?;
        registry.register(Box::new(capacity_preallocated.clone()))?;
        registry.register(Box::new(capacity_provisioned.clone()))?;
        registry.register(Box::new(sp_info.clone()))?;
        registry.register(Box::new(sp_health.clone()))?;
        registry.register(Box::new(sp_memory_size.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            up: Arc::new(up),
            capacity_total: Arc::new(capacity_total),
            capacity_used: Arc::new(capacity_used),
            capacity_free: Arc::new(capacity_free),
            capacity_preallocated: Arc::new(capacity_preallocated),
            capacity_provisioned: Arc::new(capacity_provisioned),
            sp_info: Arc::new(sp_info),
            sp_health: Arc::new(sp_health),
            sp_memory_size: Arc::new(sp_memory_size),
        })
    }

    /// Register a runtime-built collector (the realtime metric engine).
    pub fn register_collector(&self, collector: Box<dyn Collector>) -> prometheus::Result<()> {
        self.registry.register(collector)
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Convenience for labeled gauge updates.
    pub fn set_gauge(&self, gauge: &GaugeVec, labels: &[&str], value: f64) {
        gauge.with_label_values(labels).set(value);
    }
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics collector")
    }
}
