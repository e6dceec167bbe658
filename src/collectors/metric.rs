//! Dynamic realtime metric module.
//!
//! Discovers the array's realtime metric catalog once, matches it against the
//! configured path patterns, derives one instrument per matched path (label
//! names taken from the segments preceding each `*` wildcard), and registers
//! a pull-based Prometheus collector.
//!
//! The server-side realtime query backing the instruments can expire without
//! notice, so its id is soft state: any fetch failure discards it and the
//! next scrape recreates it inline. The worst case of an expired query or
//! token is one missed export window, never a dead module.

use super::{sleep_or_shutdown, ModuleContext};
use crate::config::MetricModuleConfig;
use crate::error::{ExporterError, Result};
use crate::unisphere::request::{QueryOptions, ResourceType};
use crate::unisphere::types::{MetricCatalogEntry, QueryResultEntry};
use crate::unisphere::UnisphereClient;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, Gauge, GaugeVec, Opts};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// The array rejects realtime queries carrying more than this many paths.
pub const REALTIME_QUERY_PATH_LIMIT: usize = 48;

const NAMESPACE: &str = "unisphere";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentKind {
    Counter,
    Gauge,
}

/// One registered instrument, derived from a matched catalog entry.
#[derive(Debug, Clone)]
pub struct Instrument {
    /// The catalog path; doubles as the lookup key for query results.
    pub key: String,
    pub name: String,
    pub help: String,
    pub unit: String,
    pub kind: InstrumentKind,
    /// Label names derived from the wildcard positions of `key`.
    pub labels: Vec<String>,
}

/// Map a vendor type code onto an instrument kind. Codes that do not report
/// numbers (notably 6, text) have no representation and yield `None`.
pub fn instrument_kind(type_code: i64) -> Option<InstrumentKind> {
    match type_code {
        2 | 3 | 7 | 8 => Some(InstrumentKind::Counter),
        4 | 5 => Some(InstrumentKind::Gauge),
        _ => None,
    }
}

/// Whether a configured pattern selects a catalog path. A pattern ending in
/// `%` matches by substring containment (every `%` stripped); anything else
/// must equal the path exactly.
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern.ends_with('%') {
        path.contains(&pattern.replace('%', ""))
    } else {
        pattern == path
    }
}

/// Label names for a catalog path: the segment immediately before each `*`,
/// in path order. This ordering matches the nesting order of the per-instance
/// indices the array returns, so zipping the two yields correct pairs.
pub fn wildcard_labels(path: &str) -> Vec<String> {
    let mut labels = Vec::new();
    let mut previous = "";
    for segment in path.split('.') {
        if segment == "*" {
            labels.push(previous.to_string());
        }
        previous = segment;
    }
    labels
}

/// Public instrument name for a catalog path: lower-cased, each `.*.`
/// collapsed to a single joining underscore, remaining dots replaced, and the
/// namespace prefixed.
pub fn instrument_name(path: &str) -> String {
    let flattened = path.to_lowercase().replace(".*.", "_").replace('.', "_");
    format!("{}_{}", NAMESPACE, flattened)
}

/// Derive the instrument set for the configured patterns.
///
/// Each catalog path is registered at most once, even when several patterns
/// select it. More than [`REALTIME_QUERY_PATH_LIMIT`] matches exceeds what a
/// realtime query can carry and fails the whole module.
pub fn build_instruments(
    catalog: &[MetricCatalogEntry],
    patterns: &[String],
) -> Result<Vec<Instrument>> {
    let mut seen = HashSet::new();
    let mut instruments = Vec::new();

    for entry in catalog {
        if entry.path.is_empty() || !patterns.iter().any(|p| pattern_matches(p, &entry.path)) {
            continue;
        }
        if !seen.insert(entry.path.clone()) {
            continue;
        }
        let kind = match instrument_kind(entry.type_code) {
            Some(kind) => kind,
            None => {
                info!(
                    path = %entry.path,
                    type_code = entry.type_code,
                    "skipping metric with non-numeric type"
                );
                continue;
            }
        };
        let unit = entry.unit.to_lowercase();
        let help = if entry.description.is_empty() {
            entry.path.clone()
        } else if unit.is_empty() {
            entry.description.clone()
        } else {
            format!("{} ({})", entry.description, unit)
        };
        instruments.push(Instrument {
            key: entry.path.clone(),
            name: instrument_name(&entry.path),
            help,
            unit,
            kind,
            labels: wildcard_labels(&entry.path),
        });
    }

    if instruments.len() > REALTIME_QUERY_PATH_LIMIT {
        return Err(ExporterError::CatalogOverflow(instruments.len()));
    }
    Ok(instruments)
}

/// Flatten a query-result values payload into (label tuple, value) pairs.
///
/// The payload nests one object level per wildcard dimension, keyed by the
/// per-instance index the array substituted; the leaf carries the numeric
/// value, sometimes encoded as a string. Zero, one, or many pairs may come
/// out of a single entry.
pub fn parse_values(values: &serde_json::Value, dimensions: usize) -> Vec<(Vec<String>, f64)> {
    let mut out = Vec::new();
    let mut stack = Vec::new();
    flatten_values(values, dimensions, &mut stack, &mut out);
    out
}

fn flatten_values(
    value: &serde_json::Value,
    remaining: usize,
    labels: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, f64)>,
) {
    if remaining == 0 {
        if let Some(number) = numeric_value(value) {
            out.push((labels.clone(), number));
        }
        return;
    }
    if let serde_json::Value::Object(map) = value {
        for (key, nested) in map {
            labels.push(key.clone());
            flatten_values(nested, remaining - 1, labels, out);
            labels.pop();
        }
    }
}

fn numeric_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Run the metric module for one endpoint: discovery, instrument derivation,
/// eager query creation, collector registration. The registered collector
/// keeps serving scrapes after this task returns.
pub async fn run(
    ctx: ModuleContext,
    config: MetricModuleConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    if config.paths.is_empty() {
        warn!(instance = %ctx.instance, "metric module enabled without path patterns");
        return;
    }

    // Discovery retries on the poll cadence until the array answers.
    let catalog = loop {
        let query = QueryOptions::new(ResourceType::Metric)
            .fields(["name", "path", "type", "unitDisplayString", "description"])
            .filter("isRealtimeAvailable eq true");
        match ctx.client.get_instances(&query).await {
            Ok(instances) => {
                break instances
                    .into_iter()
                    .filter_map(|v| serde_json::from_value::<MetricCatalogEntry>(v).ok())
                    .collect::<Vec<_>>();
            }
            Err(e) => {
                warn!(instance = %ctx.instance, error = %e, "cannot fetch metric catalog");
            }
        }
        if sleep_or_shutdown(ctx.interval, &mut shutdown).await {
            return;
        }
    };

    let instruments = match build_instruments(&catalog, &config.paths) {
        Ok(instruments) => instruments,
        Err(e) => {
            error!(instance = %ctx.instance, error = %e, "metric module stopped");
            return;
        }
    };
    if instruments.is_empty() {
        warn!(
            instance = %ctx.instance,
            "no catalog entries matched the configured patterns"
        );
        return;
    }
    info!(
        instance = %ctx.instance,
        instruments = instruments.len(),
        "registering realtime instruments"
    );

    // Eager first creation; a failure here just leaves the id empty and the
    // scrape path retries.
    let paths: Vec<String> = instruments.iter().map(|i| i.key.clone()).collect();
    let query_id = match ctx.client.create_realtime_query(&paths, ctx.interval).await {
        Ok(id) => id,
        Err(e) => {
            warn!(instance = %ctx.instance, error = %e, "cannot create realtime query");
            String::new()
        }
    };

    let collector = match RealtimeMetricCollector::new(&ctx, instruments, query_id) {
        Ok(collector) => collector,
        Err(e) => {
            error!(instance = %ctx.instance, error = %e, "cannot build realtime collector");
            return;
        }
    };
    if let Err(e) = ctx.metrics.register_collector(Box::new(collector)) {
        error!(instance = %ctx.instance, error = %e, "cannot register realtime collector");
    }
}

enum InstrumentVec {
    Counter(CounterVec),
    Gauge(GaugeVec),
}

/// Pull-based collector backing the dynamic instruments.
///
/// `collect` runs one fetch against the held realtime query on the runtime
/// captured at registration. A fetch failure discards the query id and emits
/// nothing for the scrape; the next scrape recreates the query inline.
pub struct RealtimeMetricCollector {
    client: Arc<UnisphereClient>,
    instruments: Vec<Instrument>,
    /// Matched catalog paths, submitted on query creation.
    paths: Vec<String>,
    const_labels: HashMap<String, String>,
    interval: Duration,
    descs: Vec<Desc>,
    query_id: Mutex<String>,
    handle: tokio::runtime::Handle,
    up: Gauge,
}

impl RealtimeMetricCollector {
    fn new(
        ctx: &ModuleContext,
        instruments: Vec<Instrument>,
        query_id: String,
    ) -> anyhow::Result<Self> {
        let mut const_labels = ctx.labels.clone();
        const_labels.insert("instance".to_string(), ctx.instance.clone());

        let mut descs = Vec::with_capacity(instruments.len());
        for instrument in &instruments {
            descs.push(Desc::new(
                instrument.name.clone(),
                instrument.help.clone(),
                instrument.labels.clone(),
                const_labels.clone(),
            )?);
        }
        let paths = instruments.iter().map(|i| i.key.clone()).collect();

        Ok(Self {
            client: ctx.client.clone(),
            instruments,
            paths,
            const_labels,
            interval: ctx.interval,
            descs,
            query_id: Mutex::new(query_id),
            handle: tokio::runtime::Handle::current(),
            up: ctx.metrics.up.with_label_values(&[&ctx.instance]),
        })
    }

    /// The held query id, recreating the server-side query inline when it is
    /// absent. `None` means this scrape has nothing to fetch against.
    async fn ensure_query(&self) -> Option<String> {
        let current = self.query_id.lock().unwrap().clone();
        if !current.is_empty() {
            return Some(current);
        }

        info!(path_count = self.paths.len(), "recreating metric realtime query");
        match self.client.create_realtime_query(&self.paths, self.interval).await {
            Ok(id) if !id.is_empty() => {
                *self.query_id.lock().unwrap() = id.clone();
                Some(id)
            }
            Ok(_) => {
                warn!("realtime query creation returned no id");
                None
            }
            Err(e) => {
                warn!(error = %e, "cannot create realtime query");
                None
            }
        }
    }

    /// Fresh per-scrape metric vecs, keyed by catalog path.
    fn build_vecs(&self) -> prometheus::Result<HashMap<&str, InstrumentVec>> {
        let mut vecs = HashMap::with_capacity(self.instruments.len());
        for instrument in &self.instruments {
            let opts = Opts::new(instrument.name.clone(), instrument.help.clone())
                .const_labels(self.const_labels.clone());
            let labels: Vec<&str> = instrument.labels.iter().map(String::as_str).collect();
            let vec = match instrument.kind {
                InstrumentKind::Counter => InstrumentVec::Counter(CounterVec::new(opts, &labels)?),
                InstrumentKind::Gauge => InstrumentVec::Gauge(GaugeVec::new(opts, &labels)?),
            };
            vecs.insert(instrument.key.as_str(), vec);
        }
        Ok(vecs)
    }

    async fn scrape(&self) -> Vec<MetricFamily> {
        let query_id = match self.ensure_query().await {
            Some(id) => id,
            None => return Vec::new(),
        };

        let query = QueryOptions::new(ResourceType::MetricQueryResult)
            .filter(format!("queryId eq {}", query_id));
        let results = match self.client.get_instances(&query).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "realtime query fetch failed, dropping query id");
                self.up.set(0.0);
                self.query_id.lock().unwrap().clear();
                return Vec::new();
            }
        };
        self.up.set(1.0);

        let vecs = match self.build_vecs() {
            Ok(vecs) => vecs,
            Err(e) => {
                warn!(error = %e, "cannot build metric families");
                return Vec::new();
            }
        };

        for value in results {
            let entry: QueryResultEntry = match serde_json::from_value(value) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "skipping malformed query result entry");
                    continue;
                }
            };
            let vec = match vecs.get(entry.path.as_str()) {
                Some(vec) => vec,
                None => continue,
            };
            // Recompute the wildcard positions from the returned path; its
            // dimension count bounds the values traversal.
            let labels = wildcard_labels(&entry.path);
            for (label_values, value) in parse_values(&entry.values, labels.len()) {
                let label_refs: Vec<&str> = label_values.iter().map(String::as_str).collect();
                match vec {
                    InstrumentVec::Counter(counter) => {
                        if value >= 0.0 {
                            counter.with_label_values(&label_refs).inc_by(value);
                        }
                    }
                    InstrumentVec::Gauge(gauge) => {
                        gauge.with_label_values(&label_refs).set(value);
                    }
                }
            }
        }

        let mut families = Vec::new();
        for instrument in &self.instruments {
            if let Some(vec) = vecs.get(instrument.key.as_str()) {
                match vec {
                    InstrumentVec::Counter(counter) => families.extend(counter.collect()),
                    InstrumentVec::Gauge(gauge) => families.extend(gauge.collect()),
                }
            }
        }
        families
    }
}

impl Collector for RealtimeMetricCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        // The registry gathers synchronously from the scrape handler; the
        // fetch must run on the runtime captured at registration.
        tokio::task::block_in_place(|| self.handle.block_on(self.scrape()))
    }
}
