//! Scaler errors
//!
//! Validation causes are reported as data (`FieldError`), scaling and
//! schedule evaluation failures as `Result` errors.

use crate::field::FieldPath;
use thiserror::Error;

/// Why a declared field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ValidationCause {
    /// A required block is absent
    #[error("required block was not included")]
    NilInclude,

    /// Time zone is empty or has no region/city separator
    #[error("time zone must be in region/city form (e.g. Europe/Berlin)")]
    MalformedTimeZone,

    /// `timeRules` block is absent
    #[error("timeRules block was not provided")]
    TimeRulesBlockNotProvided,

    /// `timeRules.rules` is absent
    #[error("rules were not provided")]
    RulesNotProvided,

    /// A rule targets no namespace
    #[error("namespaces must not be empty")]
    EmptyNamespaces,

    /// Upscale time has no `:` separator
    #[error("upscaleTime must be in HH:MM form")]
    MalformedUpscaleTime,

    /// Downscale time has no `:` separator
    #[error("downscaleTime must be in HH:MM form")]
    MalformedDownscaleTime,

    /// Recurrence is not a list or range of weekdays
    #[error("recurrence must be weekdays or ranges of weekdays (e.g. MON-FRI)")]
    MalformedRecurrence,

    /// No resource kind to scale
    #[error("resourceScaling must list at least one resource kind")]
    EmptyResourceScaling,

    /// Resource kind is outside the supported set
    #[error("resource kind must be one of deployments, statefulset, hpa")]
    UnknownResourceKind,

    /// Replica target is negative
    #[error("replicas must not be negative")]
    NegativeReplicas,
}

/// A rejected field: where, what value, and why
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{path}: Invalid value: {value}: {cause}")]
pub struct FieldError {
    /// Dotted path of the field (e.g., `spec.schedule.timeZone`)
    pub path: FieldPath,

    /// The offending value, `null` when the field was absent
    pub value: serde_json::Value,

    /// Cause from the fixed taxonomy
    pub cause: ValidationCause,
}

impl FieldError {
    /// Build a field error from any serializable value
    pub fn invalid<T: serde::Serialize>(
        path: FieldPath,
        value: &T,
        cause: ValidationCause,
    ) -> Self {
        Self {
            path,
            value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
            cause,
        }
    }
}

/// Errors from selecting or running a scaling strategy
#[derive(Debug, Error)]
pub enum ScaleError {
    /// Resource kind string did not match any known kind
    #[error("resource kind not found: {0:?}")]
    ResourceKindNotFound(String),

    /// No resource kind was configured for scaling
    #[error("no resource kind configured for scaling")]
    NoResourceKinds,

    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Workload API error not originating from kube (e.g., mock clients)
    #[error("API error: {0}")]
    Api(String),

    /// Object has no namespace, so it cannot be patched
    #[error("{kind} {name} has no namespace")]
    MissingNamespace {
        /// Resource kind
        kind: String,
        /// Object name
        name: String,
    },
}

/// Errors from evaluating a schedule against the clock
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Time is not a valid `HH:MM` clock time
    #[error("invalid {field} {value:?}: expected HH:MM between 00:00 and 23:59")]
    InvalidTime {
        /// Field name (`upscaleTime` or `downscaleTime`)
        field: &'static str,
        /// Rejected value
        value: String,
    },

    /// Time zone is not in the IANA database
    #[error("unknown time zone: {0:?}")]
    UnknownTimeZone(String),

    /// Recurrence could not be parsed
    #[error("malformed recurrence {0:?}")]
    MalformedRecurrence(String),
}
