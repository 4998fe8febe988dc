//! Configuration schema for the end-to-end test harness.

use crate::{
    BundledOverlay, BundledOverlays, ConfigError, FieldDescriptor, Resolver, Schema,
    field_accessor,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// Overlays packaged with the harness.
pub static BUNDLED_OVERLAYS: BundledOverlays = BundledOverlays::new(&[
    BundledOverlay {
        name: "prod",
        contents: include_str!("../configs/prod.yaml"),
    },
    BundledOverlay {
        name: "stage",
        contents: include_str!("../configs/stage.yaml"),
    },
    BundledOverlay {
        name: "int",
        contents: include_str!("../configs/int.yaml"),
    },
    BundledOverlay {
        name: "e2e-suite",
        contents: include_str!("../configs/e2e-suite.yaml"),
    },
    BundledOverlay {
        name: "conformance-suite",
        contents: include_str!("../configs/conformance-suite.yaml"),
    },
    BundledOverlay {
        name: "upgrade-latest",
        contents: include_str!("../configs/upgrade-latest.yaml"),
    },
]);

/// Root config for a harness run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    pub cluster: ClusterConfig,
    pub ocm: OcmConfig,
    pub prometheus: PrometheusConfig,
    pub kubeconfig: KubeconfigConfig,
    pub tests: TestsConfig,
    pub upgrade: UpgradeConfig,
    pub addons: AddonsConfig,
    /// Directory that receives JUnit reports and logs.
    pub report_dir: String,
    /// Directory uploaded as build artifacts when set.
    pub artifacts_dir: String,
    /// Short random suffix used to name per-run resources.
    pub suffix: String,
    pub dry_run: bool,
    pub must_gather: bool,
    pub log_level: String,
}

impl HarnessConfig {
    /// Resolve a harness config from the bundled overlays, an optional custom
    /// overlay, and the process environment.
    pub fn resolve<N: AsRef<str>>(
        overlays: &[N],
        custom_overlay: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        Self::resolve_with(&mut Resolver::new(BUNDLED_OVERLAYS), overlays, custom_overlay)
    }

    /// Resolve using a caller-configured resolver.
    pub fn resolve_with<N: AsRef<str>>(
        resolver: &mut Resolver,
        overlays: &[N],
        custom_overlay: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        resolver.resolve(&mut config, overlays, custom_overlay)?;
        Ok(config)
    }

    /// Copy of the config with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for secret in [
            &mut config.ocm.token,
            &mut config.prometheus.bearer_token,
            &mut config.kubeconfig.contents,
        ] {
            if !secret.is_empty() {
                *secret = REDACTED.to_string();
            }
        }
        config
    }
}

/// Replacement text for masked credentials.
pub const REDACTED: &str = "[REDACTED]";

/// Cluster under test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    pub id: String,
    pub name: String,
    pub version: String,
    pub provider: String,
    pub region: String,
    pub multi_az: bool,
    pub expiry_in_minutes: i64,
    pub install_timeout: i32,
    pub reuse: bool,
    pub destroy_after_test: bool,
}

/// OCM API the harness provisions clusters through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcmConfig {
    pub token: String,
    pub environment: String,
    pub url: String,
    pub debug: bool,
    /// Account the harness acts as; clusters are labelled with it.
    pub user_id: String,
    pub retries: i32,
}

/// Metrics endpoint queried after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusConfig {
    pub address: String,
    pub bearer_token: String,
}

/// Kubeconfig used to reach the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeconfigConfig {
    pub path: String,
    /// Inline kubeconfig, normally supplied through an overlay.
    pub contents: String,
}

/// Test selection and pacing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestsConfig {
    pub polling_timeout: i64,
    pub ginkgo_skip: String,
    pub ginkgo_focus: String,
    pub test_harnesses: Vec<String>,
    pub clean_check_runs: i32,
    pub suppress_skip_notifications: bool,
}

/// Upgrade run settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeConfig {
    pub release_stream: String,
    pub image: String,
    pub upgrade_to_latest: bool,
    pub wait_minutes: i32,
}

/// Add-on test settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonsConfig {
    pub ids: Vec<String>,
    pub test_harnesses: Vec<String>,
    pub slack_channel: String,
}

impl Schema for HarnessConfig {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: LazyLock<Vec<FieldDescriptor<HarnessConfig>>> = LazyLock::new(|| {
            vec![
                FieldDescriptor::nested(
                    "cluster",
                    field_accessor!(HarnessConfig, cluster: ClusterConfig),
                ),
                FieldDescriptor::nested("ocm", field_accessor!(HarnessConfig, ocm: OcmConfig)),
                FieldDescriptor::nested(
                    "prometheus",
                    field_accessor!(HarnessConfig, prometheus: PrometheusConfig),
                ),
                FieldDescriptor::nested(
                    "kubeconfig",
                    field_accessor!(HarnessConfig, kubeconfig: KubeconfigConfig),
                ),
                FieldDescriptor::nested(
                    "tests",
                    field_accessor!(HarnessConfig, tests: TestsConfig),
                ),
                FieldDescriptor::nested(
                    "upgrade",
                    field_accessor!(HarnessConfig, upgrade: UpgradeConfig),
                ),
                FieldDescriptor::nested(
                    "addons",
                    field_accessor!(HarnessConfig, addons: AddonsConfig),
                ),
                FieldDescriptor::string(
                    "reportDir",
                    field_accessor!(HarnessConfig, report_dir: String),
                )
                .default_value("__TMP_DIR__")
                .env("REPORT_DIR")
                .section("Environment")
                .help("Directory for reports and collected logs."),
                FieldDescriptor::string(
                    "artifactsDir",
                    field_accessor!(HarnessConfig, artifacts_dir: String),
                )
                .env("ARTIFACTS")
                .section("Environment")
                .help("Directory uploaded as build artifacts; empty disables upload."),
                FieldDescriptor::string("suffix", field_accessor!(HarnessConfig, suffix: String))
                    .default_value("__RND_3__")
                    .env("SUFFIX")
                    .section("Environment")
                    .help("Random suffix appended to generated resource names."),
                FieldDescriptor::bool("dryRun", field_accessor!(HarnessConfig, dry_run: bool))
                    .default_value("false")
                    .env("DRY_RUN")
                    .section("Environment")
                    .help("Resolve and report without touching any cluster."),
                FieldDescriptor::bool(
                    "mustGather",
                    field_accessor!(HarnessConfig, must_gather: bool),
                )
                .default_value("true")
                .env("MUST_GATHER")
                .section("Environment")
                .help("Collect diagnostics after the run."),
                FieldDescriptor::string(
                    "logLevel",
                    field_accessor!(HarnessConfig, log_level: String),
                )
                .default_value("info")
                .env("LOG_LEVEL")
                .section("Environment")
                .help("Verbosity of harness logging."),
            ]
        });
        FIELDS.as_slice()
    }
}

impl Schema for ClusterConfig {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: LazyLock<Vec<FieldDescriptor<ClusterConfig>>> = LazyLock::new(|| {
            vec![
                FieldDescriptor::string("id", field_accessor!(ClusterConfig, id: String))
                    .env("CLUSTER_ID")
                    .section("Cluster")
                    .help("Existing cluster to test instead of provisioning one."),
                FieldDescriptor::string("name", field_accessor!(ClusterConfig, name: String))
                    .env("CLUSTER_NAME")
                    .section("Cluster"),
                FieldDescriptor::string("version", field_accessor!(ClusterConfig, version: String))
                    .env("CLUSTER_VERSION")
                    .section("Cluster")
                    .help("Version to install; empty selects the default."),
                FieldDescriptor::string(
                    "provider",
                    field_accessor!(ClusterConfig, provider: String),
                )
                .default_value("aws")
                .env("CLOUD_PROVIDER_ID")
                .section("Cluster"),
                FieldDescriptor::string("region", field_accessor!(ClusterConfig, region: String))
                    .default_value("us-east-1")
                    .env("CLOUD_PROVIDER_REGION")
                    .section("Cluster"),
                FieldDescriptor::bool("multiAz", field_accessor!(ClusterConfig, multi_az: bool))
                    .default_value("false")
                    .env("MULTI_AZ")
                    .section("Cluster"),
                FieldDescriptor::int64(
                    "expiryInMinutes",
                    field_accessor!(ClusterConfig, expiry_in_minutes: i64),
                )
                .default_value("210")
                .env("CLUSTER_EXPIRY_IN_MINUTES")
                .section("Cluster")
                .help("Minutes before a provisioned cluster expires."),
                FieldDescriptor::int32(
                    "installTimeout",
                    field_accessor!(ClusterConfig, install_timeout: i32),
                )
                .default_value("135")
                .env("CLUSTER_UP_TIMEOUT")
                .section("Cluster")
                .help("Minutes to wait for installation."),
                FieldDescriptor::bool("reuse", field_accessor!(ClusterConfig, reuse: bool))
                    .default_value("false")
                    .env("USE_EXISTING_CLUSTER")
                    .section("Cluster"),
                FieldDescriptor::bool(
                    "destroyAfterTest",
                    field_accessor!(ClusterConfig, destroy_after_test: bool),
                )
                .default_value("false")
                .env("DESTROY_CLUSTER")
                .section("Cluster"),
            ]
        });
        FIELDS.as_slice()
    }
}

impl Schema for OcmConfig {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: LazyLock<Vec<FieldDescriptor<OcmConfig>>> = LazyLock::new(|| {
            vec![
                FieldDescriptor::string("token", field_accessor!(OcmConfig, token: String))
                    .env("OCM_TOKEN")
                    .section("OCM")
                    .help("Offline token for the OCM API."),
                FieldDescriptor::string(
                    "environment",
                    field_accessor!(OcmConfig, environment: String),
                )
                .default_value("prod")
                .env("OSD_ENV")
                .section("OCM"),
                FieldDescriptor::string("url", field_accessor!(OcmConfig, url: String))
                    .env("OCM_URL")
                    .section("OCM")
                    .help("Overrides the URL implied by the environment."),
                FieldDescriptor::bool("debug", field_accessor!(OcmConfig, debug: bool))
                    .default_value("false")
                    .env("DEBUG_OSD")
                    .section("OCM"),
                FieldDescriptor::string("userId", field_accessor!(OcmConfig, user_id: String))
                    .env("OCM_USER_ID")
                    .section("OCM"),
                FieldDescriptor::int32("retries", field_accessor!(OcmConfig, retries: i32))
                    .default_value("3")
                    .env("OCM_RETRIES")
                    .section("OCM"),
            ]
        });
        FIELDS.as_slice()
    }
}

impl Schema for PrometheusConfig {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: LazyLock<Vec<FieldDescriptor<PrometheusConfig>>> = LazyLock::new(|| {
            vec![
                FieldDescriptor::string(
                    "address",
                    field_accessor!(PrometheusConfig, address: String),
                )
                .env("PROMETHEUS_ADDRESS")
                .section("Metrics")
                .help("Base URL of the metrics endpoint."),
                FieldDescriptor::string(
                    "bearerToken",
                    field_accessor!(PrometheusConfig, bearer_token: String),
                )
                .env("PROMETHEUS_BEARER_TOKEN")
                .section("Metrics"),
            ]
        });
        FIELDS.as_slice()
    }
}

impl Schema for KubeconfigConfig {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: LazyLock<Vec<FieldDescriptor<KubeconfigConfig>>> = LazyLock::new(|| {
            vec![
                FieldDescriptor::string("path", field_accessor!(KubeconfigConfig, path: String))
                    .env("TEST_KUBECONFIG")
                    .section("Kubeconfig"),
                FieldDescriptor::string(
                    "contents",
                    field_accessor!(KubeconfigConfig, contents: String),
                )
                .section("Kubeconfig"),
            ]
        });
        FIELDS.as_slice()
    }
}

impl Schema for TestsConfig {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: LazyLock<Vec<FieldDescriptor<TestsConfig>>> = LazyLock::new(|| {
            vec![
                FieldDescriptor::int64(
                    "pollingTimeout",
                    field_accessor!(TestsConfig, polling_timeout: i64),
                )
                .default_value("30")
                .env("POLLING_TIMEOUT")
                .section("Tests")
                .help("Seconds to poll before a check gives up."),
                FieldDescriptor::string(
                    "ginkgoSkip",
                    field_accessor!(TestsConfig, ginkgo_skip: String),
                )
                .env("GINKGO_SKIP")
                .section("Tests"),
                FieldDescriptor::string(
                    "ginkgoFocus",
                    field_accessor!(TestsConfig, ginkgo_focus: String),
                )
                .env("GINKGO_FOCUS")
                .section("Tests"),
                FieldDescriptor::string_list(
                    "testHarnesses",
                    field_accessor!(TestsConfig, test_harnesses: Vec<String>),
                )
                .env("TEST_HARNESSES")
                .section("Tests")
                .help("Comma-separated harness images."),
                FieldDescriptor::int32(
                    "cleanCheckRuns",
                    field_accessor!(TestsConfig, clean_check_runs: i32),
                )
                .default_value("20")
                .env("CLEAN_CHECK_RUNS")
                .section("Tests"),
                FieldDescriptor::bool(
                    "suppressSkipNotifications",
                    field_accessor!(TestsConfig, suppress_skip_notifications: bool),
                )
                .default_value("true")
                .env("SUPPRESS_SKIP_NOTIFICATIONS")
                .section("Tests"),
            ]
        });
        FIELDS.as_slice()
    }
}

impl Schema for UpgradeConfig {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: LazyLock<Vec<FieldDescriptor<UpgradeConfig>>> = LazyLock::new(|| {
            vec![
                FieldDescriptor::string(
                    "releaseStream",
                    field_accessor!(UpgradeConfig, release_stream: String),
                )
                .env("UPGRADE_RELEASE_STREAM")
                .section("Upgrade"),
                FieldDescriptor::string("image", field_accessor!(UpgradeConfig, image: String))
                    .env("UPGRADE_IMAGE")
                    .section("Upgrade"),
                FieldDescriptor::bool(
                    "upgradeToLatest",
                    field_accessor!(UpgradeConfig, upgrade_to_latest: bool),
                )
                .default_value("false")
                .env("UPGRADE_TO_LATEST")
                .section("Upgrade"),
                FieldDescriptor::int32(
                    "waitMinutes",
                    field_accessor!(UpgradeConfig, wait_minutes: i32),
                )
                .default_value("60")
                .env("UPGRADE_WAIT_MINUTES")
                .section("Upgrade"),
            ]
        });
        FIELDS.as_slice()
    }
}

impl Schema for AddonsConfig {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: LazyLock<Vec<FieldDescriptor<AddonsConfig>>> = LazyLock::new(|| {
            vec![
                FieldDescriptor::string_list("ids", field_accessor!(AddonsConfig, ids: Vec<String>))
                    .env("ADDON_IDS")
                    .section("Add-ons"),
                FieldDescriptor::string_list(
                    "testHarnesses",
                    field_accessor!(AddonsConfig, test_harnesses: Vec<String>),
                )
                .env("ADDON_TEST_HARNESSES")
                .section("Add-ons"),
                FieldDescriptor::string(
                    "slackChannel",
                    field_accessor!(AddonsConfig, slack_channel: String),
                )
                .default_value("harness-alerts")
                .env("ADDON_SLACK_CHANNEL")
                .section("Add-ons"),
            ]
        });
        FIELDS.as_slice()
    }
}
