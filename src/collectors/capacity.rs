//! System capacity module.
//!
//! The array reports sizes in bytes; the gauges carry MiB.
//!
//! # Metrics Produced
//! - `unisphere_capacity_total_capacity` - Total capacity of the array
//! - `unisphere_capacity_used_capacity` - Used capacity of the array
//! - `unisphere_capacity_free_capacity` - Free capacity of the array
//! - `unisphere_capacity_preallocated_capacity` - Preallocated capacity
//! - `unisphere_capacity_total_provision` - Total provisioned capacity

use super::{sleep_or_shutdown, ModuleContext};
use crate::unisphere::request::{QueryOptions, ResourceType};
use crate::unisphere::types::SystemCapacity;
use tokio::sync::watch;
use tracing::warn;

const MIB: f64 = 1024.0 * 1024.0;

pub async fn run(ctx: ModuleContext, mut shutdown: watch::Receiver<bool>) {
    let query = QueryOptions::new(ResourceType::SystemCapacity).fields([
        "sizeTotal",
        "sizeUsed",
        "sizeFree",
        "sizePreallocated",
        "totalLogicalSize",
    ]);

    loop {
        match ctx.client.get_instances(&query).await {
            Ok(instances) => {
                ctx.record_poll(true);
                for value in instances {
                    let capacity: SystemCapacity = match serde_json::from_value(value) {
                        Ok(capacity) => capacity,
                        Err(e) => {
                            warn!(error = %e, "skipping malformed capacity entry");
                            continue;
                        }
                    };
                    let gauges = [
                        (&ctx.metrics.capacity_total, capacity.size_total),
                        (&ctx.metrics.capacity_used, capacity.size_used),
                        (&ctx.metrics.capacity_free, capacity.size_free),
                        (&ctx.metrics.capacity_preallocated, capacity.size_preallocated),
                        (&ctx.metrics.capacity_provisioned, capacity.total_logical_size),
                    ];
                    for (gauge, bytes) in gauges {
                        ctx.metrics.set_gauge(gauge, &[&ctx.instance], bytes / MIB);
                    }
                }
            }
            Err(e) => {
                ctx.record_poll(false);
                warn!(instance = %ctx.instance, error = %e, "cannot fetch system capacity");
            }
        }

        if sleep_or_shutdown(ctx.interval, &mut shutdown).await {
            return;
        }
    }
}
