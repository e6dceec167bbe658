//! Unisphere REST API type definitions.
//!
//! Response envelopes plus the typed views collector modules project out of
//! the opaque per-entry `content` objects. Fields carry `#[serde(default)]`
//! throughout because compact responses omit anything not requested.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Collection response envelope: a list of entries each wrapping one
/// `content` object.
#[derive(Debug, Default, Deserialize)]
pub struct InstanceCollection {
    #[serde(default)]
    pub entries: Vec<InstanceEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InstanceEntry {
    #[serde(default)]
    pub content: serde_json::Value,
}

/// Creation response envelope for POSTed resources.
#[derive(Debug, Default, Deserialize)]
pub struct CreatedResource {
    #[serde(default)]
    pub content: CreatedContent,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatedContent {
    #[serde(default)]
    pub id: String,
}

/// Error envelope carried by 422/500 responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub messages: Vec<LocalizedMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocalizedMessage {
    #[serde(rename = "en-US", default)]
    pub en_us: String,
}

/// One realtime-capable metric known to the array. `path` uses dot-separated
/// segments where a literal `*` marks a per-instance index position.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricCatalogEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub type_code: i64,
    #[serde(rename = "unitDisplayString", default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
}

/// One result entry of a `metricQueryResult` fetch. `values` nests one object
/// level per wildcard dimension of `path`.
#[derive(Debug, Default, Deserialize)]
pub struct QueryResultEntry {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub values: serde_json::Value,
}

/// `system` instance, projected down to the self-reported array name.
#[derive(Debug, Deserialize)]
pub struct SystemInstance {
    #[serde(default)]
    pub name: String,
}

/// `systemCapacity` instance. All sizes arrive in bytes.
#[derive(Debug, Deserialize)]
pub struct SystemCapacity {
    #[serde(rename = "sizeTotal", default)]
    pub size_total: f64,
    #[serde(rename = "sizeUsed", default)]
    pub size_used: f64,
    #[serde(rename = "sizeFree", default)]
    pub size_free: f64,
    #[serde(rename = "sizePreallocated", default)]
    pub size_preallocated: f64,
    #[serde(rename = "totalLogicalSize", default)]
    pub total_logical_size: f64,
}

#[derive(Debug, Deserialize)]
pub struct StorageProcessor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub health: HealthInfo,
    #[serde(rename = "memorySize", default)]
    pub memory_size: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthInfo {
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct AlertRecord {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub severity: i64,
    #[serde(rename = "messageId", default)]
    pub message_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "creationTime", default)]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub severity: i64,
    #[serde(rename = "messageId", default)]
    pub message_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub source: String,
}

/// Human-readable name for a Unisphere severity code.
pub fn severity_name(code: i64) -> &'static str {
    match code {
        0 => "OK",
        1 => "DEBUG",
        2 => "INFO",
        3 => "NOTICE",
        4 => "WARNING",
        5 => "ERROR",
        6 => "CRITICAL",
        7 => "EMERGENCY",
        _ => "UNKNOWN",
    }
}
