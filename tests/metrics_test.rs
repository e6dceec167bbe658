//! Metrics rendering tests

use unisphere_exporter::metrics::ExporterMetrics;

fn create_test_metrics() -> ExporterMetrics {
    ExporterMetrics::new().expect("Failed to create metrics")
}

#[test]
fn test_empty_registry_renders_without_error() {
    let metrics = create_test_metrics();

    let rendered = metrics.render().expect("Failed to render");

    assert!(rendered.contains("# HELP"));
    assert!(rendered.contains("# TYPE"));
}

#[test]
fn test_up_gauge_per_instance() {
    let metrics = create_test_metrics();

    metrics
        .up
        .with_label_values(&["https://array-01.example"])
        .set(1.0);
    metrics
        .up
        .with_label_values(&["https://array-02.example"])
        .set(0.0);

    let rendered = metrics.render().expect("Failed to render");
    assert!(rendered.contains("unisphere_up{instance=\"https://array-01.example\"} 1"));
    assert!(rendered.contains("unisphere_up{instance=\"https://array-02.example\"} 0"));
}

#[test]
fn test_capacity_gauges() {
    let metrics = create_test_metrics();

    metrics.set_gauge(&metrics.capacity_total, &["array-01"], 5e9);
    metrics.set_gauge(&metrics.capacity_used, &["array-01"], 3e9);
    metrics.set_gauge(&metrics.capacity_free, &["array-01"], 2e9);
    metrics.set_gauge(&metrics.capacity_preallocated, &["array-01"], 1e8);
    metrics.set_gauge(&metrics.capacity_provisioned, &["array-01"], 8e9);

    let rendered = metrics.render().expect("Failed to render");
    assert!(rendered.contains("unisphere_capacity_total_capacity{instance=\"array-01\"}"));
    assert!(rendered.contains("unisphere_capacity_used_capacity{instance=\"array-01\"}"));
    assert!(rendered.contains("unisphere_capacity_free_capacity{instance=\"array-01\"}"));
    assert!(rendered.contains("unisphere_capacity_preallocated_capacity{instance=\"array-01\"}"));
    assert!(rendered.contains("unisphere_capacity_total_provision{instance=\"array-01\"}"));
}

#[test]
fn test_storage_processor_metrics() {
    let metrics = create_test_metrics();

    metrics
        .sp_info
        .with_label_values(&["array-01", "spa", "Unity 480"])
        .set(1);
    metrics.set_gauge(&metrics.sp_health, &["array-01", "spa"], 5.0);
    metrics.set_gauge(&metrics.sp_memory_size, &["array-01", "spa"], 65536.0);

    let rendered = metrics.render().expect("Failed to render");
    assert!(rendered
        .contains("unisphere_storage_processor_info{instance=\"array-01\",model=\"Unity 480\",sp_id=\"spa\"} 1"));
    assert!(rendered.contains("unisphere_storage_processor_health"));
    assert!(rendered.contains("unisphere_storage_processor_memory_size"));
}

#[test]
fn test_renders_are_stable() {
    let metrics = create_test_metrics();
    metrics.up.with_label_values(&["array-01"]).set(1.0);

    let first = metrics.render().expect("First render failed");
    let second = metrics.render().expect("Second render failed");

    assert_eq!(first, second);
}
