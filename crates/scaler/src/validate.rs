//! Downscaler spec validation
//!
//! Evaluation is pure: [`validate_spec`] returns every field error it finds
//! as a [`ValidationReport`]. Emitting the errors to the log is a separate
//! step ([`ValidationReport::emit`]) so callers choose where diagnostics go.
//!
//! Errors accumulate across the whole spec. A missing required block records
//! one error and stops only its own branch.

use crate::error::{FieldError, ValidationCause};
use crate::field::FieldPath;
use crate::kind::ResourceKind;
use crate::window::Recurrence;
use crds::{DownscalerOptions, DownscalerSpec, Schedule};
use tracing::error;

const SPEC: &str = "spec";
const SCHEDULE: &str = "schedule";
const TIME_ZONE: &str = "timeZone";
const RECURRENCE: &str = "recurrence";
const DOWNSCALER_OPTIONS: &str = "downscalerOptions";
const RESOURCE_SCALING: &str = "resourceScaling";
const UPSCALE_REPLICAS: &str = "upscaleReplicas";
const DOWNSCALE_REPLICAS: &str = "downscaleReplicas";
const TIME_RULES: &str = "timeRules";
const RULES: &str = "rules";
const NAMESPACES: &str = "namespaces";
const UPSCALE_TIME: &str = "upscaleTime";
const DOWNSCALE_TIME: &str = "downscaleTime";

/// Outcome of validating a spec
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    /// True when no field error was found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Every field error, in discovery order
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Consume the report, returning the errors
    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// Rendered errors, one line each
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Log every error
    pub fn emit(&self) {
        for err in &self.errors {
            error!(path = %err.path, cause = ?err.cause, "validation failed: {}", err);
        }
    }

    fn push(&mut self, err: FieldError) {
        self.errors.push(err);
    }
}

/// Validate a Downscaler spec
pub fn validate_spec(spec: &DownscalerSpec) -> ValidationReport {
    validate(spec.schedule.as_ref(), spec.downscaler_options.as_ref())
}

/// Validate the schedule and options blocks
pub fn validate(
    schedule: Option<&Schedule>,
    options: Option<&DownscalerOptions>,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_schedule(schedule, &mut report);
    validate_options(options, &mut report);
    report
}

/// Validate, log every error, and return whether both blocks are valid
pub fn is_valid(schedule: Option<&Schedule>, options: Option<&DownscalerOptions>) -> bool {
    let report = validate(schedule, options);
    report.emit();
    report.is_valid()
}

fn validate_schedule(schedule: Option<&Schedule>, report: &mut ValidationReport) {
    let base = FieldPath::new(SPEC).child(SCHEDULE);

    let Some(schedule) = schedule else {
        report.push(FieldError::invalid(base, &schedule, ValidationCause::NilInclude));
        return;
    };

    if schedule.time_zone.is_empty() || schedule.time_zone.split('/').count() == 1 {
        report.push(FieldError::invalid(
            base.child(TIME_ZONE),
            &schedule.time_zone,
            ValidationCause::MalformedTimeZone,
        ));
    }

    if let Some(recurrence) = &schedule.recurrence {
        if Recurrence::parse(recurrence).is_err() {
            report.push(FieldError::invalid(
                base.child(RECURRENCE),
                recurrence,
                ValidationCause::MalformedRecurrence,
            ));
        }
    }
}

fn validate_options(options: Option<&DownscalerOptions>, report: &mut ValidationReport) {
    let base = FieldPath::new(SPEC).child(DOWNSCALER_OPTIONS);

    let Some(options) = options else {
        report.push(FieldError::invalid(base, &options, ValidationCause::NilInclude));
        return;
    };

    if options.resource_scaling.is_empty() {
        report.push(FieldError::invalid(
            base.child(RESOURCE_SCALING),
            &options.resource_scaling,
            ValidationCause::EmptyResourceScaling,
        ));
    }

    for (index, kind) in options.resource_scaling.iter().enumerate() {
        if kind.parse::<ResourceKind>().is_err() {
            report.push(FieldError::invalid(
                base.child(RESOURCE_SCALING).index(index),
                kind,
                ValidationCause::UnknownResourceKind,
            ));
        }
    }

    for (field, replicas) in [
        (UPSCALE_REPLICAS, options.upscale_replicas),
        (DOWNSCALE_REPLICAS, options.downscale_replicas),
    ] {
        if replicas < 0 {
            report.push(FieldError::invalid(
                base.child(field),
                &replicas,
                ValidationCause::NegativeReplicas,
            ));
        }
    }

    let time_rules_path = base.child(TIME_RULES);
    let Some(time_rules) = &options.time_rules else {
        report.push(FieldError::invalid(
            time_rules_path,
            &options.time_rules,
            ValidationCause::TimeRulesBlockNotProvided,
        ));
        return;
    };

    let rules_path = time_rules_path.child(RULES);
    let Some(rules) = &time_rules.rules else {
        report.push(FieldError::invalid(
            rules_path,
            &time_rules.rules,
            ValidationCause::RulesNotProvided,
        ));
        return;
    };

    for (index, rule) in rules.iter().enumerate() {
        let rule_path = rules_path.index(index);

        if rule.namespaces.is_empty() {
            report.push(FieldError::invalid(
                rule_path.child(NAMESPACES),
                &rule.namespaces,
                ValidationCause::EmptyNamespaces,
            ));
        }

        if rule.upscale_time.split(':').count() == 1 {
            report.push(FieldError::invalid(
                rule_path.child(UPSCALE_TIME),
                &rule.upscale_time,
                ValidationCause::MalformedUpscaleTime,
            ));
        }

        if rule.downscale_time.split(':').count() == 1 {
            report.push(FieldError::invalid(
                rule_path.child(DOWNSCALE_TIME),
                &rule.downscale_time,
                ValidationCause::MalformedDownscaleTime,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::{TimeRule, TimeRules};

    fn schedule(time_zone: &str) -> Schedule {
        Schedule {
            time_zone: time_zone.to_string(),
            recurrence: None,
        }
    }

    fn rule(namespaces: &[&str], up: &str, down: &str) -> TimeRule {
        TimeRule {
            namespaces: namespaces.iter().map(|ns| (*ns).to_string()).collect(),
            upscale_time: up.to_string(),
            downscale_time: down.to_string(),
        }
    }

    fn options(rules: Vec<TimeRule>) -> DownscalerOptions {
        DownscalerOptions {
            time_rules: Some(TimeRules { rules: Some(rules) }),
            ..Default::default()
        }
    }

    fn paths(report: &ValidationReport) -> Vec<&str> {
        report.errors().iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_well_formed_spec_is_valid() {
        let report = validate(
            Some(&schedule("Europe/Berlin")),
            Some(&options(vec![rule(&["team-a"], "08:00", "20:00")])),
        );
        assert!(report.is_valid());
        assert!(report.errors().is_empty());
    }

    #[test]
    fn test_single_segment_time_zone_is_rejected() {
        let report = validate(
            Some(&schedule("UTC")),
            Some(&options(vec![rule(&["team-a"], "08:00", "20:00")])),
        );
        assert!(!report.is_valid());
        assert_eq!(report.errors().len(), 1);
        let err = &report.errors()[0];
        assert_eq!(err.cause, ValidationCause::MalformedTimeZone);
        assert_eq!(err.path.as_str(), "spec.schedule.timeZone");
        assert_eq!(err.value, serde_json::json!("UTC"));
    }

    #[test]
    fn test_empty_time_zone_is_rejected() {
        let report = validate(Some(&schedule("")), Some(&options(vec![])));
        assert_eq!(paths(&report), vec!["spec.schedule.timeZone"]);
    }

    #[test]
    fn test_missing_schedule_block() {
        let report = validate(None, Some(&options(vec![rule(&["team-a"], "08:00", "20:00")])));
        assert_eq!(paths(&report), vec!["spec.schedule"]);
        assert_eq!(report.errors()[0].cause, ValidationCause::NilInclude);
        assert_eq!(report.errors()[0].value, serde_json::Value::Null);
    }

    #[test]
    fn test_missing_options_block() {
        let report = validate(Some(&schedule("Europe/Berlin")), None);
        assert_eq!(paths(&report), vec!["spec.downscalerOptions"]);
        assert_eq!(report.errors()[0].cause, ValidationCause::NilInclude);
    }

    #[test]
    fn test_missing_time_rules_block() {
        let opts = DownscalerOptions::default();
        let report = validate(Some(&schedule("Europe/Berlin")), Some(&opts));
        assert_eq!(paths(&report), vec!["spec.downscalerOptions.timeRules"]);
        assert_eq!(report.errors()[0].cause, ValidationCause::TimeRulesBlockNotProvided);
    }

    #[test]
    fn test_missing_rules() {
        let opts = DownscalerOptions {
            time_rules: Some(TimeRules { rules: None }),
            ..Default::default()
        };
        let report = validate(Some(&schedule("Europe/Berlin")), Some(&opts));
        assert_eq!(paths(&report), vec!["spec.downscalerOptions.timeRules.rules"]);
        assert_eq!(report.errors()[0].cause, ValidationCause::RulesNotProvided);
    }

    #[test]
    fn test_empty_rules_are_valid() {
        let report = validate(Some(&schedule("Europe/Berlin")), Some(&options(vec![])));
        assert!(report.is_valid());
    }

    #[test]
    fn test_every_rule_accumulates_three_errors() {
        let rules = vec![rule(&[], "0800", "2000"), rule(&[], "", "x"), rule(&[], "8", "20")];
        let report = validate(Some(&schedule("Europe/Berlin")), Some(&options(rules)));
        assert_eq!(report.errors().len(), 9);

        let causes: Vec<_> = report.errors().iter().map(|e| e.cause).collect();
        for chunk in causes.chunks(3) {
            assert_eq!(
                chunk,
                [
                    ValidationCause::EmptyNamespaces,
                    ValidationCause::MalformedUpscaleTime,
                    ValidationCause::MalformedDownscaleTime,
                ]
            );
        }
        assert_eq!(
            &paths(&report)[3..6],
            [
                "spec.downscalerOptions.timeRules.rules[1].namespaces",
                "spec.downscalerOptions.timeRules.rules[1].upscaleTime",
                "spec.downscalerOptions.timeRules.rules[1].downscaleTime",
            ]
        );
    }

    #[test]
    fn test_block_and_rule_errors_combine() {
        let rules = vec![rule(&["team-a"], "08:00", "20:00"), rule(&["team-b"], "08:00", "2000")];
        let report = validate(Some(&schedule("CET")), Some(&options(rules)));
        assert_eq!(
            paths(&report),
            vec![
                "spec.schedule.timeZone",
                "spec.downscalerOptions.timeRules.rules[1].downscaleTime",
            ]
        );
    }

    #[test]
    fn test_resource_scaling_and_replicas() {
        let opts = DownscalerOptions {
            resource_scaling: vec![
                "Deployments".to_string(),
                "daemonset".to_string(),
                "HPA".to_string(),
            ],
            upscale_replicas: -1,
            downscale_replicas: 0,
            time_rules: Some(TimeRules { rules: Some(vec![]) }),
        };
        let report = validate(Some(&schedule("Europe/Berlin")), Some(&opts));
        assert_eq!(
            paths(&report),
            vec![
                "spec.downscalerOptions.resourceScaling[1]",
                "spec.downscalerOptions.upscaleReplicas",
            ]
        );
        assert_eq!(report.errors()[0].cause, ValidationCause::UnknownResourceKind);
        assert_eq!(report.errors()[1].cause, ValidationCause::NegativeReplicas);
    }

    #[test]
    fn test_empty_resource_scaling_is_rejected() {
        let opts = DownscalerOptions {
            resource_scaling: vec![],
            ..options(vec![rule(&["team-a"], "08:00", "20:00")])
        };
        let report = validate(Some(&schedule("Europe/Berlin")), Some(&opts));
        assert!(!report.is_valid());
        assert_eq!(paths(&report), vec!["spec.downscalerOptions.resourceScaling"]);
        assert_eq!(report.errors()[0].cause, ValidationCause::EmptyResourceScaling);
        assert_eq!(report.errors()[0].value, serde_json::json!([]));
    }

    #[test]
    fn test_malformed_recurrence() {
        let sched = Schedule {
            time_zone: "Europe/Berlin".to_string(),
            recurrence: Some("weekdays".to_string()),
        };
        let report = validate(Some(&sched), Some(&options(vec![])));
        assert_eq!(paths(&report), vec!["spec.schedule.recurrence"]);
        assert_eq!(report.errors()[0].cause, ValidationCause::MalformedRecurrence);
    }

    #[test]
    fn test_is_valid_on_spec() {
        let spec = DownscalerSpec {
            schedule: Some(schedule("America/New_York")),
            downscaler_options: Some(options(vec![rule(&["team-a", "team-b"], "07:30", "19:00")])),
        };
        assert!(is_valid(spec.schedule.as_ref(), spec.downscaler_options.as_ref()));
        assert!(!is_valid(None, None));
        assert_eq!(validate_spec(&DownscalerSpec::default()).errors().len(), 2);
    }

    #[test]
    fn test_error_rendering() {
        let report = validate(Some(&schedule("UTC")), Some(&options(vec![])));
        assert_eq!(
            report.messages(),
            vec![
                "spec.schedule.timeZone: Invalid value: \"UTC\": time zone must be in region/city form (e.g. Europe/Berlin)"
                    .to_string()
            ]
        );
    }
}
