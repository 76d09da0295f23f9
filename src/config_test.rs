use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> =
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_when_nothing_is_set() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.api_base_url, "https://slack.com/api");
    assert_eq!(cfg.session.heartbeat_interval, Duration::from_secs(5));
    assert_eq!(cfg.session.close_grace, Duration::from_secs(1));
    assert_eq!(cfg.session.variant_errors, VariantErrorPolicy::Skip);
}

#[test]
fn parses_overrides() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("SLACK_API_BASE_URL", "http://127.0.0.1:9000/api/"),
        ("SLACK_HEARTBEAT_SECS", "30"),
        ("SLACK_CLOSE_GRACE_MS", "250"),
        ("SLACK_VARIANT_ERRORS", "Fatal"),
    ]))
    .unwrap();

    assert_eq!(cfg.api_base_url, "http://127.0.0.1:9000/api");
    assert_eq!(cfg.session.heartbeat_interval, Duration::from_secs(30));
    assert_eq!(cfg.session.close_grace, Duration::from_millis(250));
    assert_eq!(cfg.session.variant_errors, VariantErrorPolicy::Fatal);
}

#[test]
fn blank_values_fall_back_to_defaults() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("SLACK_API_BASE_URL", "  "),
        ("SLACK_HEARTBEAT_SECS", ""),
        ("SLACK_VARIANT_ERRORS", " "),
    ]))
    .unwrap();
    assert_eq!(cfg, ClientConfig::default());
}

#[test]
fn rejects_non_numeric_heartbeat() {
    let err = ClientConfig::from_lookup(lookup_from(&[("SLACK_HEARTBEAT_SECS", "five")])).unwrap_err();
    let ConfigError::Parse { var, .. } = err;
    assert_eq!(var, "SLACK_HEARTBEAT_SECS");
}

#[test]
fn rejects_zero_heartbeat() {
    let err = ClientConfig::from_lookup(lookup_from(&[("SLACK_HEARTBEAT_SECS", "0")])).unwrap_err();
    assert_eq!(err.to_string(), "invalid value for SLACK_HEARTBEAT_SECS: must be greater than zero");
}

#[test]
fn rejects_unknown_variant_policy() {
    let err = ClientConfig::from_lookup(lookup_from(&[("SLACK_VARIANT_ERRORS", "retry")])).unwrap_err();
    assert!(err.to_string().contains("expected `skip` or `fatal`"), "{err}");
}

#[test]
fn zero_close_grace_is_allowed() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[("SLACK_CLOSE_GRACE_MS", "0")])).unwrap();
    assert_eq!(cfg.session.close_grace, Duration::ZERO);
}
