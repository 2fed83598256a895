//! Downscaler CRD
//!
//! Declares time windows during which workloads in a set of namespaces are
//! scaled up, and outside of which they are scaled down.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Resource kind scaled when `resourceScaling` is not set.
pub const DEFAULT_RESOURCE_KIND: &str = "deployments";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "downscaler.microscaler.io",
    version = "v1alpha1",
    kind = "Downscaler",
    status = "DownscalerStatus",
    printcolumn = r#"{"name":"Valid","type":"boolean","jsonPath":".status.valid"}"#,
    printcolumn = r#"{"name":"TimeZone","type":"string","jsonPath":".spec.schedule.timeZone"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DownscalerSpec {
    /// Time zone and recurrence the rules are evaluated in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,

    /// Scaling policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downscaler_options: Option<DownscalerOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// IANA time zone in region/city form (e.g., "Europe/Berlin")
    #[serde(default)]
    pub time_zone: String,

    /// Days the windows apply to (e.g., "MON-FRI", "MON,WED,FRI"). Every day when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DownscalerOptions {
    /// Resource kinds scaled in every targeted namespace ("deployments", "statefulset", "hpa")
    #[serde(default = "default_resource_scaling")]
    pub resource_scaling: Vec<String>,

    /// Replica count applied when an upscale window opens
    #[serde(default = "default_upscale_replicas")]
    pub upscale_replicas: i32,

    /// Replica count applied when an upscale window closes
    #[serde(default)]
    pub downscale_replicas: i32,

    /// Time windows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_rules: Option<TimeRules>,
}

impl Default for DownscalerOptions {
    fn default() -> Self {
        Self {
            resource_scaling: default_resource_scaling(),
            upscale_replicas: default_upscale_replicas(),
            downscale_replicas: 0,
            time_rules: None,
        }
    }
}

fn default_resource_scaling() -> Vec<String> {
    vec![DEFAULT_RESOURCE_KIND.to_string()]
}

fn default_upscale_replicas() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRules {
    /// Ordered list of windows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<TimeRule>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRule {
    /// Namespaces the window applies to
    #[serde(default)]
    pub namespaces: Vec<String>,

    /// Local time ("HH:MM") at which workloads are scaled up
    #[serde(default)]
    pub upscale_time: String,

    /// Local time ("HH:MM") at which workloads are scaled down
    #[serde(default)]
    pub downscale_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct DownscalerStatus {
    /// Result of the last validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,

    /// Field errors from the last validation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,

    /// Last applied scaling decision per namespace
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<NamespaceScaleStatus>,

    /// Last reconciliation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled: Option<chrono::DateTime<chrono::Utc>>,

    /// Error message if the last scaling run failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceScaleStatus {
    /// Namespace name
    pub namespace: String,

    /// Window state that was applied
    pub state: ScaleState,

    /// Replica count that was applied, unset when the state was adopted without scaling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// When the state last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition: Option<chrono::DateTime<chrono::Utc>>,
}

/// Scaling state of a namespace
///
/// Serializes as PascalCase ("Up", "Down") and accepts lowercase on input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum ScaleState {
    /// Inside an upscale window
    #[serde(alias = "up")]
    Up,

    /// Outside every upscale window
    #[serde(alias = "down")]
    Down,
}

impl std::fmt::Display for ScaleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleState::Up => f.write_str("Up"),
            ScaleState::Down => f.write_str("Down"),
        }
    }
}
