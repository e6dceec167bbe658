//! Canonical Unisphere request targets.
//!
//! A [`QueryOptions`] is an immutable description of one request: the target
//! resource type, the lookup mode, a field projection, and filter predicates.
//! [`QueryOptions::to_path`] turns it into the request target string. Building
//! is pure and deterministic, so descriptors are safe to reuse across polls.

use std::fmt;

const API_PREFIX: &str = "/api";
const TYPES_PREFIX: &str = "/api/types";
const INSTANCES: &str = "/instances";

/// Unisphere resource types addressed by this exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    System,
    SystemCapacity,
    StorageProcessor,
    Alert,
    Event,
    Metric,
    MetricRealTimeQuery,
    MetricQueryResult,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::System => "system",
            ResourceType::SystemCapacity => "systemCapacity",
            ResourceType::StorageProcessor => "storageProcessor",
            ResourceType::Alert => "alert",
            ResourceType::Event => "event",
            ResourceType::Metric => "metric",
            ResourceType::MetricRealTimeQuery => "metricRealTimeQuery",
            ResourceType::MetricQueryResult => "metricQueryResult",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How instances are addressed. The mode decides the URL shape; fields and
/// filters are only meaningful for `All` queries but accepted in every mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LookupMode {
    #[default]
    All,
    ById(String),
    ByName(String),
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    resource: ResourceType,
    mode: LookupMode,
    fields: Vec<String>,
    filters: Vec<String>,
    compact: bool,
}

impl QueryOptions {
    pub fn new(resource: ResourceType) -> Self {
        Self {
            resource,
            mode: LookupMode::All,
            fields: Vec::new(),
            filters: Vec::new(),
            compact: true,
        }
    }

    pub fn by_id(mut self, id: impl Into<String>) -> Self {
        self.mode = LookupMode::ById(id.into());
        self
    }

    pub fn by_name(mut self, name: impl Into<String>) -> Self {
        self.mode = LookupMode::ByName(name.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Append one filter predicate. Predicates stay independent clauses; the
    /// array combines them conjunctively.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Build the request target for this descriptor.
    pub fn to_path(&self) -> String {
        let mut raw = match &self.mode {
            LookupMode::All => {
                format!("{}/{}{}", TYPES_PREFIX, self.resource, INSTANCES)
            }
            LookupMode::ById(id) => {
                format!("{}{}/{}/{}", API_PREFIX, INSTANCES, self.resource, id)
            }
            LookupMode::ByName(name) => {
                format!("{}{}/{}/name:{}", API_PREFIX, INSTANCES, self.resource, name)
            }
        };

        raw.push_str(if self.compact {
            "?compact=true"
        } else {
            "?compact=false"
        });

        if !self.fields.is_empty() {
            raw.push_str("&fields=");
            raw.push_str(&self.fields.join(","));
        }
        for filter in &self.filters {
            raw.push_str("&filter=");
            raw.push_str(&filter.replace(' ', "%20"));
        }
        raw
    }
}
