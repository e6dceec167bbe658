//! Storage processor module.
//!
//! # Metrics Produced
//! - `unisphere_storage_processor_info` - SP information (value is always 1)
//!   - Labels: sp_id, model
//! - `unisphere_storage_processor_health` - Health of the storage processor
//!   - Labels: sp_id
//! - `unisphere_storage_processor_memory_size` - SP memory size
//!   - Labels: sp_id

use super::{sleep_or_shutdown, ModuleContext};
use crate::unisphere::request::{QueryOptions, ResourceType};
use crate::unisphere::types::StorageProcessor;
use tokio::sync::watch;
use tracing::warn;

pub async fn run(ctx: ModuleContext, mut shutdown: watch::Receiver<bool>) {
    let query = QueryOptions::new(ResourceType::StorageProcessor)
        .fields(["id", "model", "health", "memorySize"]);

    loop {
        match ctx.client.get_instances(&query).await {
            Ok(instances) => {
                ctx.record_poll(true);
                for value in instances {
                    let sp: StorageProcessor = match serde_json::from_value(value) {
                        Ok(sp) => sp,
                        Err(e) => {
                            warn!(error = %e, "skipping malformed storage processor entry");
                            continue;
                        }
                    };
                    ctx.metrics
                        .sp_info
                        .with_label_values(&[&ctx.instance, &sp.id, &sp.model])
                        .set(1);
                    ctx.metrics.set_gauge(
                        &ctx.metrics.sp_health,
                        &[&ctx.instance, &sp.id],
                        sp.health.value,
                    );
                    ctx.metrics.set_gauge(
                        &ctx.metrics.sp_memory_size,
                        &[&ctx.instance, &sp.id],
                        sp.memory_size,
                    );
                }
            }
            Err(e) => {
                ctx.record_poll(false);
                warn!(instance = %ctx.instance, error = %e, "cannot fetch storage processors");
            }
        }

        if sleep_or_shutdown(ctx.interval, &mut shutdown).await {
            return;
        }
    }
}
