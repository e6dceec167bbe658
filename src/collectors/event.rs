//! Event log module.
//!
//! Same cursor discipline as the alert module, against the array's event log.
//! Events carry a `source` field and are keyed on `creationTime`.

use super::{sleep_or_shutdown, LogCursor, ModuleContext};
use crate::config::EventModuleConfig;
use crate::unisphere::request::{QueryOptions, ResourceType};
use crate::unisphere::types::{severity_name, EventRecord};
use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};

pub async fn run(
    ctx: ModuleContext,
    config: EventModuleConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut cursor = LogCursor::starting_at(Utc::now());

    loop {
        let window_end = Utc::now();
        let query = QueryOptions::new(ResourceType::Event)
            .fields(["creationTime", "severity", "messageId", "message", "source"])
            .filter(cursor.filter("creationTime"));

        match ctx.client.get_instances(&query).await {
            Ok(instances) => {
                ctx.record_poll(true);
                for value in instances {
                    let record: EventRecord = match serde_json::from_value(value) {
                        Ok(record) => record,
                        Err(e) => {
                            warn!(error = %e, "skipping malformed event entry");
                            continue;
                        }
                    };
                    if record.severity < config.min_severity {
                        continue;
                    }
                    emit(&ctx, &record);
                }
                cursor.advance(window_end);
            }
            Err(e) => {
                ctx.record_poll(false);
                warn!(instance = %ctx.instance, error = %e, "cannot fetch event log");
            }
        }

        if sleep_or_shutdown(ctx.interval, &mut shutdown).await {
            return;
        }
    }
}

fn emit(ctx: &ModuleContext, record: &EventRecord) {
    let body = serde_json::json!({
        "source": record.source,
        "message": record.message,
        "message_id": record.message_id,
    });
    let timestamp = record
        .creation_time
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    info!(
        target: "unisphere::event",
        instance = %ctx.instance,
        host_name = ctx.labels.get("host_name").map(String::as_str).unwrap_or(""),
        severity = severity_name(record.severity),
        timestamp = %timestamp,
        "{}",
        body
    );
}
