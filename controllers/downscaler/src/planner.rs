//! Scaling plan for one Downscaler.
//!
//! Turns the window state of every targeted namespace into the list of
//! namespaces that need scaling now. Pure: the clock and the last applied
//! status are inputs.

use chrono::{DateTime, Utc};
use crds::{DownscalerSpec, NamespaceScaleStatus, ScaleState};
use scaler::{ScheduleError, desired_state};
use std::collections::BTreeMap;

/// A namespace that has to be scaled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    /// Target namespace
    pub namespace: String,
    /// State being entered
    pub state: ScaleState,
    /// Replica count to apply
    pub replicas: i32,
}

/// Desired state of every targeted namespace and the transitions to apply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Desired state per namespace
    pub desired: BTreeMap<String, ScaleState>,
    /// Namespaces whose state changes, sorted by namespace
    pub actions: Vec<PlannedAction>,
}

/// Evaluate every rule at `now`
///
/// A namespace listed by several rules is up if any of its rules is up.
pub fn desired_states(
    spec: &DownscalerSpec,
    now: DateTime<Utc>,
) -> Result<BTreeMap<String, ScaleState>, ScheduleError> {
    let mut desired = BTreeMap::new();
    let (Some(schedule), Some(options)) = (&spec.schedule, &spec.downscaler_options) else {
        return Ok(desired);
    };
    let rules = options
        .time_rules
        .as_ref()
        .and_then(|time_rules| time_rules.rules.as_deref())
        .unwrap_or_default();

    for rule in rules {
        let state = desired_state(schedule, rule, now)?;
        for namespace in &rule.namespaces {
            desired
                .entry(namespace.clone())
                .and_modify(|current| {
                    if state == ScaleState::Up {
                        *current = ScaleState::Up;
                    }
                })
                .or_insert(state);
        }
    }
    Ok(desired)
}

/// Plan the transitions needed at `now`
///
/// A namespace is acted on when its desired state differs from the recorded
/// one. A namespace seen for the first time is only acted on when it should
/// be down; one that should be up is adopted as-is.
pub fn plan(
    spec: &DownscalerSpec,
    previous: &[NamespaceScaleStatus],
    now: DateTime<Utc>,
) -> Result<Plan, ScheduleError> {
    let desired = desired_states(spec, now)?;
    let (upscale_replicas, downscale_replicas) = spec
        .downscaler_options
        .as_ref()
        .map_or((1, 0), |options| (options.upscale_replicas, options.downscale_replicas));

    let actions = desired
        .iter()
        .filter(|(namespace, state)| {
            match previous.iter().find(|record| &record.namespace == *namespace) {
                Some(record) => record.state != **state,
                None => **state == ScaleState::Down,
            }
        })
        .map(|(namespace, state)| PlannedAction {
            namespace: namespace.clone(),
            state: *state,
            replicas: match state {
                ScaleState::Up => upscale_replicas,
                ScaleState::Down => downscale_replicas,
            },
        })
        .collect();

    Ok(Plan { desired, actions })
}

/// Namespace status after applying `applied` out of `plan`
///
/// Namespaces no longer targeted are dropped. A failed first downscale is
/// left unrecorded so the next run retries it.
pub fn next_status(
    plan: &Plan,
    previous: &[NamespaceScaleStatus],
    applied: &[PlannedAction],
    now: DateTime<Utc>,
) -> Vec<NamespaceScaleStatus> {
    plan.desired
        .iter()
        .filter_map(|(namespace, state)| {
            if let Some(action) = applied.iter().find(|action| &action.namespace == namespace) {
                return Some(NamespaceScaleStatus {
                    namespace: namespace.clone(),
                    state: action.state,
                    replicas: Some(action.replicas),
                    last_transition: Some(now),
                });
            }
            if let Some(record) = previous.iter().find(|record| &record.namespace == namespace) {
                return Some(record.clone());
            }
            (*state == ScaleState::Up).then(|| NamespaceScaleStatus {
                namespace: namespace.clone(),
                state: ScaleState::Up,
                replicas: None,
                last_transition: Some(now),
            })
        })
        .collect()
}
