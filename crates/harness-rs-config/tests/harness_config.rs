//! Resolution tests for the harness configuration schema.

use harness_rs_config::{
    BUNDLED_OVERLAYS, ConfigError, FieldKind, HarnessConfig, REDACTED, Resolver, Schema, Stage,
};
use pretty_assertions::assert_eq;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tempfile::TempDir;

fn resolver(temp: &TempDir, env: &[(&str, &str)]) -> Resolver {
    let env: HashMap<String, String> = env
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    Resolver::new(BUNDLED_OVERLAYS)
        .with_environment(env)
        .with_temp_root(temp.path())
        .with_cwd(temp.path())
        .with_seed(5)
}

/// Every descriptor path must exist in the serialized config, so overlays
/// and descriptors address the same keys.
#[test]
fn descriptor_paths_match_serialized_keys() {
    let value = serde_json::to_value(HarnessConfig::default()).expect("serialize");
    for row in HarnessConfig::describe() {
        let pointer = format!("/{}", row.path.replace('.', "/"));
        assert!(
            value.pointer(&pointer).is_some(),
            "descriptor path {} missing from serialized config",
            row.path
        );
    }
}

#[test]
fn environment_variable_names_are_unique() {
    let mut seen = HashSet::new();
    for row in HarnessConfig::describe() {
        if let Some(env) = row.env {
            assert!(seen.insert(env), "duplicate env binding {env}");
        }
    }
}

#[test]
fn every_bundled_overlay_resolves() {
    let temp = TempDir::new().expect("tmp");
    for name in BUNDLED_OVERLAYS.names() {
        HarnessConfig::resolve_with(&mut resolver(&temp, &[]), &[name], None)
            .unwrap_or_else(|err| panic!("overlay {name} failed: {err}"));
    }
}

#[test]
fn defaults_resolve() {
    let temp = TempDir::new().expect("tmp");
    let config = HarnessConfig::resolve_with(&mut resolver(&temp, &[]), &[] as &[&str], None)
        .expect("config");
    assert_eq!(config.cluster.region, "us-east-1");
    assert_eq!(config.cluster.provider, "aws");
    assert_eq!(config.cluster.expiry_in_minutes, 210);
    assert_eq!(config.ocm.environment, "prod");
    assert_eq!(config.ocm.retries, 3);
    assert_eq!(config.ocm.user_id, "");
    assert_eq!(config.artifacts_dir, "");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.tests.polling_timeout, 30);
    assert!(config.tests.suppress_skip_notifications);
    assert!(config.must_gather);
    assert_eq!(config.suffix.len(), 3);
    assert!(Path::new(&config.report_dir).is_dir());
    assert!(config.tests.test_harnesses.is_empty());
}

#[test]
fn stage_overlay_then_environment() {
    let temp = TempDir::new().expect("tmp");
    let config = HarnessConfig::resolve_with(
        &mut resolver(&temp, &[("OSD_ENV", "int"), ("TEST_HARNESSES", "a,b")]),
        &["stage", "upgrade-latest"],
        None,
    )
    .expect("config");
    assert_eq!(config.ocm.environment, "int");
    assert_eq!(config.ocm.url, "https://api.stage.example.com");
    assert_eq!(config.cluster.expiry_in_minutes, 120);
    assert!(config.upgrade.upgrade_to_latest);
    assert_eq!(config.upgrade.wait_minutes, 90);
    assert_eq!(
        config.tests.test_harnesses,
        vec!["a".to_string(), "b".to_string()]
    );
}

#[test]
fn run_settings_come_from_environment() {
    let temp = TempDir::new().expect("tmp");
    let config = HarnessConfig::resolve_with(
        &mut resolver(
            &temp,
            &[
                ("OCM_USER_ID", "ci-bot"),
                ("ARTIFACTS", "/var/artifacts"),
                ("LOG_LEVEL", "debug"),
            ],
        ),
        &["prod"],
        None,
    )
    .expect("config");
    assert_eq!(config.ocm.user_id, "ci-bot");
    assert_eq!(config.artifacts_dir, "/var/artifacts");
    assert_eq!(config.log_level, "debug");
}

#[test]
fn later_bundled_overlay_wins() {
    let temp = TempDir::new().expect("tmp");
    let config = HarnessConfig::resolve_with(&mut resolver(&temp, &[]), &["stage", "int"], None)
        .expect("config");
    assert_eq!(config.ocm.environment, "int");
    assert_eq!(config.cluster.expiry_in_minutes, 90);
    assert!(config.ocm.debug);
}

#[test]
fn custom_overlay_carries_nested_lists() {
    let temp = TempDir::new().expect("tmp");
    std::fs::write(
        temp.path().join("addons.yaml"),
        "addons:\n  ids: [logging, monitoring]\nkubeconfig:\n  contents: |\n    apiVersion: v1\n",
    )
    .expect("write");
    let config = HarnessConfig::resolve_with(
        &mut resolver(&temp, &[]),
        &["prod"],
        Some(Path::new("addons.yaml")),
    )
    .expect("config");
    assert_eq!(
        config.addons.ids,
        vec!["logging".to_string(), "monitoring".to_string()]
    );
    assert_eq!(config.kubeconfig.contents, "apiVersion: v1\n");
    assert_eq!(config.addons.slack_channel, "harness-alerts");
}

#[test]
fn unknown_overlay_is_fatal() {
    let temp = TempDir::new().expect("tmp");
    let err = HarnessConfig::resolve_with(&mut resolver(&temp, &[]), &["nightly"], None)
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::BundledOverlay));
    assert!(matches!(err.root(), ConfigError::OverlayNotFound { name } if name == "nightly"));
}

#[test]
fn redaction_masks_credentials_only() {
    let temp = TempDir::new().expect("tmp");
    let config = HarnessConfig::resolve_with(
        &mut resolver(&temp, &[("OCM_TOKEN", "secret"), ("PROMETHEUS_ADDRESS", "https://m")]),
        &[] as &[&str],
        None,
    )
    .expect("config");
    let redacted = config.redacted();
    assert_eq!(redacted.ocm.token, REDACTED);
    assert_eq!(redacted.prometheus.bearer_token, "");
    assert_eq!(redacted.prometheus.address, "https://m");
}

#[test]
fn list_fields_are_described_as_lists() {
    let rows = HarnessConfig::describe();
    let harnesses = rows
        .iter()
        .find(|row| row.path == "tests.testHarnesses")
        .expect("row");
    assert_eq!(harnesses.kind, FieldKind::StringList);
    assert_eq!(harnesses.env, Some("TEST_HARNESSES"));
}
