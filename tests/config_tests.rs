// Config loading and validation tests

use hotspot_monitor::config::AppConfig;
use std::io::Write;
use std::time::Duration;

const VALID_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000
stream_port = 9090

[device]
host = "192.168.88.1"
port = 8728
username = "admin"
password = "secret"
connect_timeout_ms = 4000
query_timeout_ms = 2500

[polling]
interval_ms = 2000
max_concurrent_interface_queries = 3

[publishing]
subscriber_queue_capacity = 8

[monitoring]
stats_log_interval_secs = 30
"#;

const MINIMAL_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 3000
stream_port = 9090

[device]
host = "router.lan"
username = "api"
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.stream_port, 9090);
    assert_eq!(config.device.host, "192.168.88.1");
    assert_eq!(config.device.password, "secret");
    assert_eq!(config.device.connect_timeout_ms, 4000);
    assert_eq!(config.device.query_timeout_ms, 2500);
    assert_eq!(config.polling.interval_ms, 2000);
    assert_eq!(config.polling.max_concurrent_interface_queries, 3);
    assert_eq!(config.publishing.subscriber_queue_capacity, 8);
    assert_eq!(config.monitoring.stats_log_interval_secs, 30);
}

#[test]
fn test_config_defaults_for_optional_sections() {
    let config = AppConfig::load_from_str(MINIMAL_CONFIG).expect("minimal config");
    assert_eq!(config.device.port, 8728);
    assert_eq!(config.device.password, "");
    assert_eq!(config.device.connect_timeout_ms, 5000);
    assert_eq!(config.device.query_timeout_ms, 3000);
    assert_eq!(config.polling.interval_ms, 3000);
    assert_eq!(config.polling.max_concurrent_interface_queries, 4);
    assert_eq!(config.publishing.subscriber_queue_capacity, 16);
    assert_eq!(config.monitoring.stats_log_interval_secs, 60);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 3000", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_shared_ports() {
    let bad = VALID_CONFIG.replace("stream_port = 9090", "stream_port = 3000");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.stream_port"));
}

#[test]
fn test_config_validation_rejects_empty_device_host() {
    let bad = VALID_CONFIG.replace("host = \"192.168.88.1\"", "host = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("device.host"));
}

#[test]
fn test_config_validation_rejects_empty_username() {
    let bad = VALID_CONFIG.replace("username = \"admin\"", "username = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("device.username"));
}

#[test]
fn test_config_validation_rejects_zero_interval() {
    let bad = VALID_CONFIG.replace("interval_ms = 2000", "interval_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("polling.interval_ms"));
}

#[test]
fn test_config_validation_rejects_zero_interface_concurrency() {
    let bad = VALID_CONFIG.replace(
        "max_concurrent_interface_queries = 3",
        "max_concurrent_interface_queries = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_concurrent_interface_queries"));
}

#[test]
fn test_config_validation_rejects_zero_queue_capacity() {
    let bad = VALID_CONFIG.replace(
        "subscriber_queue_capacity = 8",
        "subscriber_queue_capacity = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("subscriber_queue_capacity"));
}

#[test]
fn test_config_validation_rejects_zero_timeouts() {
    let bad = VALID_CONFIG.replace("connect_timeout_ms = 4000", "connect_timeout_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("device.connect_timeout_ms"));

    let bad = VALID_CONFIG.replace("query_timeout_ms = 2500", "query_timeout_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("device.query_timeout_ms"));
}

#[test]
fn test_config_missing_device_section_fails() {
    let bad = r#"
[server]
host = "127.0.0.1"
port = 3000
stream_port = 9090
"#;
    assert!(AppConfig::load_from_str(bad).is_err());
}

#[test]
fn test_config_load_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(VALID_CONFIG.as_bytes()).unwrap();
    let config = AppConfig::load_from_path(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.device.username, "admin");
}

#[test]
fn test_config_load_from_missing_path_names_file() {
    let err = AppConfig::load_from_path("/nonexistent/hotspot-monitor.toml").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/hotspot-monitor.toml"));
}

#[test]
fn test_section_timeout_defaults_below_interval() {
    let config = AppConfig::load_from_str(MINIMAL_CONFIG).unwrap();
    assert_eq!(config.polling.section_timeout_ms, None);
    assert_eq!(config.polling.section_timeout(), Duration::from_millis(2000));

    let config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    assert!(config.polling.section_timeout() < Duration::from_millis(config.polling.interval_ms));
}

#[test]
fn test_section_timeout_explicit_value() {
    let with_timeout =
        VALID_CONFIG.replace("interval_ms = 2000", "interval_ms = 2000\nsection_timeout_ms = 1500");
    let config = AppConfig::load_from_str(&with_timeout).unwrap();
    assert_eq!(config.polling.section_timeout(), Duration::from_millis(1500));
}

#[test]
fn test_config_validation_rejects_section_timeout_not_below_interval() {
    let bad =
        VALID_CONFIG.replace("interval_ms = 2000", "interval_ms = 2000\nsection_timeout_ms = 2000");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("polling.section_timeout_ms"));
}
