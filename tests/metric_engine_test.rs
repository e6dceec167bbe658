//! Realtime metric engine tests
//!
//! Catalog matching, instrument derivation, wildcard label scanning, the
//! realtime query path limit, and values-payload parsing.

use serde_json::json;
use unisphere_exporter::collectors::metric::{
    build_instruments, instrument_kind, instrument_name, parse_values, pattern_matches,
    wildcard_labels, InstrumentKind, REALTIME_QUERY_PATH_LIMIT,
};
use unisphere_exporter::error::ExporterError;
use unisphere_exporter::unisphere::types::MetricCatalogEntry;

fn catalog_entry(path: &str, type_code: i64) -> MetricCatalogEntry {
    MetricCatalogEntry {
        path: path.to_string(),
        type_code,
        ..Default::default()
    }
}

#[test]
fn test_wildcard_labels_single_dimension() {
    assert_eq!(wildcard_labels("sp.*.physical.bytes"), vec!["sp"]);
}

#[test]
fn test_wildcard_labels_two_dimensions() {
    assert_eq!(wildcard_labels("lun.*.host.*.iops"), vec!["lun", "host"]);
}

#[test]
fn test_wildcard_labels_without_wildcards() {
    assert!(wildcard_labels("system.cpu.summary").is_empty());
}

#[test]
fn test_instrument_name_collapses_wildcards() {
    assert_eq!(
        instrument_name("sp.*.physical.bytes"),
        "unisphere_sp_physical_bytes"
    );
    assert_eq!(
        instrument_name("lun.*.host.*.iops"),
        "unisphere_lun_host_iops"
    );
}

#[test]
fn test_instrument_name_lowercases() {
    assert_eq!(
        instrument_name("sp.*.blockCache.global.summary.dirtyBytes"),
        "unisphere_sp_blockcache_global_summary_dirtybytes"
    );
}

#[test]
fn test_type_code_mapping() {
    for code in [2, 3, 7, 8] {
        assert_eq!(instrument_kind(code), Some(InstrumentKind::Counter));
    }
    for code in [4, 5] {
        assert_eq!(instrument_kind(code), Some(InstrumentKind::Gauge));
    }
    assert_eq!(instrument_kind(6), None);
    assert_eq!(instrument_kind(0), None);
    assert_eq!(instrument_kind(99), None);
}

#[test]
fn test_pattern_exact_match() {
    assert!(pattern_matches("sp.*.physical.bytes", "sp.*.physical.bytes"));
    assert!(!pattern_matches("sp.*.physical", "sp.*.physical.bytes"));
}

#[test]
fn test_pattern_trailing_percent_matches_by_containment() {
    assert!(pattern_matches("sp.%", "sp.*.physical.bytes"));
    assert!(pattern_matches("physical%", "sp.*.physical.bytes"));
    assert!(!pattern_matches("lun.%", "sp.*.physical.bytes"));
}

#[test]
fn test_matched_entry_becomes_gauge_instrument() {
    // Given: catalog {path:"a.*.x", type:4} and pattern "a.%"
    let catalog = vec![catalog_entry("a.*.x", 4)];
    let patterns = vec!["a.%".to_string()];

    // When: Deriving instruments
    let instruments = build_instruments(&catalog, &patterns).unwrap();

    // Then: One gauge, namespace-prefixed underscore-joined name, labels ["a"]
    assert_eq!(instruments.len(), 1);
    assert_eq!(instruments[0].name, "unisphere_a_x");
    assert_eq!(instruments[0].kind, InstrumentKind::Gauge);
    assert_eq!(instruments[0].labels, vec!["a"]);
    assert_eq!(instruments[0].key, "a.*.x");
}

#[test]
fn test_type_code_6_is_never_registered() {
    let catalog = vec![
        catalog_entry("sp.*.text.status", 6),
        catalog_entry("sp.*.physical.bytes", 2),
    ];
    let patterns = vec!["sp.%".to_string()];

    let instruments = build_instruments(&catalog, &patterns).unwrap();

    assert_eq!(instruments.len(), 1);
    assert_eq!(instruments[0].key, "sp.*.physical.bytes");
}

#[test]
fn test_path_matching_multiple_patterns_registers_once() {
    let catalog = vec![catalog_entry("sp.*.physical.bytes", 4)];
    let patterns = vec!["sp.%".to_string(), "sp.*.physical.bytes".to_string()];

    let instruments = build_instruments(&catalog, &patterns).unwrap();

    assert_eq!(instruments.len(), 1);
}

#[test]
fn test_limit_overflow_registers_nothing() {
    // Given: 49 matching catalog paths
    let catalog: Vec<_> = (0..REALTIME_QUERY_PATH_LIMIT + 1)
        .map(|i| catalog_entry(&format!("sp.*.queue.{}", i), 4))
        .collect();
    let patterns = vec!["sp.%".to_string()];

    // Then: The engine refuses the whole set
    let result = build_instruments(&catalog, &patterns);
    assert!(matches!(result, Err(ExporterError::CatalogOverflow(49))));
}

#[test]
fn test_limit_boundary_is_inclusive() {
    let catalog: Vec<_> = (0..REALTIME_QUERY_PATH_LIMIT)
        .map(|i| catalog_entry(&format!("sp.*.queue.{}", i), 4))
        .collect();
    let patterns = vec!["sp.%".to_string()];

    let instruments = build_instruments(&catalog, &patterns).unwrap();
    assert_eq!(instruments.len(), REALTIME_QUERY_PATH_LIMIT);
}

#[test]
fn test_unit_folded_into_help() {
    let mut entry = catalog_entry("sp.*.physical.bytes", 4);
    entry.description = "Physical bytes".to_string();
    entry.unit = "KB/s".to_string();

    let instruments = build_instruments(&[entry], &["sp.%".to_string()]).unwrap();

    assert_eq!(instruments[0].unit, "kb/s");
    assert_eq!(instruments[0].help, "Physical bytes (kb/s)");
}

#[test]
fn test_help_falls_back_to_path() {
    let instruments =
        build_instruments(&[catalog_entry("a.*.x", 4)], &["a.%".to_string()]).unwrap();

    assert_eq!(instruments[0].help, "a.*.x");
}

#[test]
fn test_parse_values_single_dimension() {
    // One object level per wildcard dimension, keyed by instance index
    let values = json!({"spa": 12.5, "spb": 4.0});

    let mut pairs = parse_values(&values, 1);
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(
        pairs,
        vec![
            (vec!["spa".to_string()], 12.5),
            (vec!["spb".to_string()], 4.0),
        ]
    );
}

#[test]
fn test_parse_values_two_dimensions() {
    let values = json!({
        "sv_1": {"Host_1": 10.0, "Host_2": 20.0},
        "sv_2": {"Host_1": 30.0}
    });

    let mut pairs = parse_values(&values, 2);
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(pairs.len(), 3);
    assert_eq!(
        pairs[0],
        (vec!["sv_1".to_string(), "Host_1".to_string()], 10.0)
    );
    assert_eq!(
        pairs[2],
        (vec!["sv_2".to_string(), "Host_1".to_string()], 30.0)
    );
}

#[test]
fn test_parse_values_string_encoded_numbers() {
    let values = json!({"spa": "123.25"});

    assert_eq!(
        parse_values(&values, 1),
        vec![(vec!["spa".to_string()], 123.25)]
    );
}

#[test]
fn test_parse_values_zero_dimensions() {
    let values = json!(99.0);

    assert_eq!(parse_values(&values, 0), vec![(vec![], 99.0)]);
}

#[test]
fn test_parse_values_skips_non_numeric_leaves() {
    let values = json!({"spa": "n/a", "spb": 1.0});

    let pairs = parse_values(&values, 1);

    assert_eq!(pairs, vec![(vec!["spb".to_string()], 1.0)]);
}

#[test]
fn test_parse_values_structure_mismatch_is_empty() {
    // A payload shallower than the declared dimensions yields nothing
    let values = json!(42.0);

    assert!(parse_values(&values, 1).is_empty());
    assert!(parse_values(&json!(null), 2).is_empty());
}
