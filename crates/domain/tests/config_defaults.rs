use std::io::Write;

use ev_domain::config::Config;

#[test]
fn default_reconnect_policy() {
    let config = Config::default();
    assert_eq!(config.reconnect.initial_delay_ms, 1_000);
    assert_eq!(config.reconnect.max_delay_ms, 120_000);
    assert_eq!(config.reconnect.growth_factor, 0.5);
    assert_eq!(config.reconnect.max_attempts, 0);
}

#[test]
fn default_subscriber_does_not_retry() {
    let config = Config::default();
    assert!(!config.subscriber.retry);
    assert!(!config.subscriber.debug);
    assert!(config.subscriber.endpoint.is_none());
    assert!(config.subscriber.last_event_id.is_none());
}

#[test]
fn default_transport_timeouts() {
    let config = Config::default();
    assert_eq!(config.transport.connect_timeout_ms, 10_000);
    assert_eq!(config.transport.preflight_timeout_ms, 10_000);
    assert_eq!(config.transport.handshake_timeout_ms, 10_000);
}

#[test]
fn partial_sections_keep_defaults() {
    let toml_str = r#"
[subscriber]
endpoint = "http://events.local:3000"
burst_count = 50
retry = true

[reconnect]
max_delay_ms = 30000
"#;
    let config = Config::from_toml(toml_str).unwrap();
    assert_eq!(config.subscriber.endpoint.as_deref(), Some("http://events.local:3000"));
    assert_eq!(config.subscriber.burst_count, Some(50));
    assert_eq!(config.subscriber.burst_time, None);
    assert!(config.subscriber.retry);
    assert_eq!(config.reconnect.max_delay_ms, 30_000);
    assert_eq!(config.reconnect.initial_delay_ms, 1_000);
    assert_eq!(config.transport.handshake_timeout_ms, 10_000);
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = Config::from_toml("[subscriber\nretry = ").unwrap_err();
    assert!(matches!(err, ev_domain::Error::Config(_)));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert!(config.subscriber.endpoint.is_none());
}

#[test]
fn load_reads_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[subscriber]\nlast_event_id = \"99\"\ndebug = true").unwrap();
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.subscriber.last_event_id.as_deref(), Some("99"));
    assert!(config.subscriber.debug);
}
