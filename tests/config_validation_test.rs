//! Configuration validation tests
//!
//! Tests that verify configuration defaults, structure, and validation.

use secrecy::SecretString;
use std::collections::HashMap;
use unisphere_exporter::config::{
    AlertModuleConfig, CapacityModuleConfig, Config, EndpointConfig, EventModuleConfig,
    MetricModuleConfig, ModulesConfig, ServerConfig, StorageProcessorModuleConfig,
};

fn test_endpoint() -> EndpointConfig {
    EndpointConfig {
        url: "https://array-01.example".to_string(),
        username: "monitor".to_string(),
        password: SecretString::from(String::from("secret")),
        insecure: false,
        poll_interval_seconds: 60,
        labels: HashMap::new(),
    }
}

#[test]
fn test_default_server_config() {
    // Given: ServerConfig default values
    let config = ServerConfig::default();

    // Then: Bind to all interfaces on the standard exporter port
    assert_eq!(config.addr, "0.0.0.0");
    assert_eq!(config.port, 9100);
}

#[test]
fn test_default_module_config() {
    // Given: The module set with nothing configured
    let modules = ModulesConfig::default();

    // Then: Capacity is the only default-enabled module
    assert!(modules.capacity.enabled);
    assert!(!modules.metric.enabled);
    assert!(!modules.alert.enabled);
    assert!(!modules.event.enabled);
    assert!(!modules.storage_processor.enabled);
}

#[test]
fn test_severity_thresholds_default_per_module() {
    // Alerts default to everything, events to ERROR and above
    assert_eq!(AlertModuleConfig::default().min_severity, 0);
    assert_eq!(EventModuleConfig::default().min_severity, 5);
}

#[test]
fn test_metric_module_config_construction() {
    let config = MetricModuleConfig {
        enabled: true,
        paths: vec!["sp.*.physical.bytes".to_string(), "lun.%".to_string()],
    };

    assert!(config.enabled);
    assert_eq!(config.paths.len(), 2);
}

#[test]
fn test_endpoint_poll_interval() {
    let endpoint = test_endpoint();

    assert_eq!(endpoint.poll_interval().as_secs(), 60);
}

#[test]
fn test_validate_requires_endpoints() {
    let config = Config {
        server: ServerConfig::default(),
        endpoints: vec![],
        modules: ModulesConfig::default(),
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_interval() {
    let mut endpoint = test_endpoint();
    endpoint.poll_interval_seconds = 0;
    let config = Config {
        server: ServerConfig::default(),
        endpoints: vec![endpoint],
        modules: ModulesConfig::default(),
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_accepts_complete_config() {
    let config = Config {
        server: ServerConfig::default(),
        endpoints: vec![test_endpoint()],
        modules: ModulesConfig {
            metric: MetricModuleConfig {
                enabled: true,
                paths: vec!["sp.%".to_string()],
            },
            alert: AlertModuleConfig {
                enabled: true,
                min_severity: 4,
            },
            event: EventModuleConfig::default(),
            capacity: CapacityModuleConfig::default(),
            storage_processor: StorageProcessorModuleConfig { enabled: true },
        },
    };

    assert!(config.validate().is_ok());
}
