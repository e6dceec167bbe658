//! Alert log module.
//!
//! Republishes new array alerts as structured log records on the
//! `unisphere::alert` channel. A timestamp cursor keeps each poll to entries
//! that arrived since the last successful cycle; the cursor advances only
//! after a successful fetch, so a failed cycle is re-covered on the next one.

use super::{sleep_or_shutdown, LogCursor, ModuleContext};
use crate::config::AlertModuleConfig;
use crate::unisphere::request::{QueryOptions, ResourceType};
use crate::unisphere::types::{severity_name, AlertRecord};
use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};

pub async fn run(
    ctx: ModuleContext,
    config: AlertModuleConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut cursor = LogCursor::starting_at(Utc::now());

    loop {
        let window_end = Utc::now();
        let query = QueryOptions::new(ResourceType::Alert)
            .fields(["timestamp", "severity", "messageId", "message"])
            .filter(cursor.filter("timestamp"));

        match ctx.client.get_instances(&query).await {
            Ok(instances) => {
                ctx.record_poll(true);
                for value in instances {
                    let record: AlertRecord = match serde_json::from_value(value) {
                        Ok(record) => record,
                        Err(e) => {
                            warn!(error = %e, "skipping malformed alert entry");
                            continue;
                        }
                    };
                    // Dropped entries are gone for good; the cursor advances
                    // past them either way.
                    if record.severity < config.min_severity {
                        continue;
                    }
                    emit(&ctx, &record);
                }
                cursor.advance(window_end);
            }
            Err(e) => {
                ctx.record_poll(false);
                warn!(instance = %ctx.instance, error = %e, "cannot fetch alert log");
            }
        }

        if sleep_or_shutdown(ctx.interval, &mut shutdown).await {
            return;
        }
    }
}

fn emit(ctx: &ModuleContext, record: &AlertRecord) {
    let body = serde_json::json!({
        "message": record.message,
        "message_id": record.message_id,
    });
    let timestamp = record
        .timestamp
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    info!(
        target: "unisphere::alert",
        instance = %ctx.instance,
        host_name = ctx.labels.get("host_name").map(String::as_str).unwrap_or(""),
        severity = severity_name(record.severity),
        timestamp = %timestamp,
        "{}",
        body
    );
}
