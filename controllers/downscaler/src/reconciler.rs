//! Reconciliation logic for Downscaler CRDs.
//!
//! Two entry points:
//! - [`Reconciler::reconcile_validation`] runs when a Downscaler changes and
//!   records the validation result in its status.
//! - [`Reconciler::reconcile_schedule`] runs on every scheduler tick, plans
//!   namespace transitions and applies them through the scalers.

use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::planner::{self, PlannedAction};
use crate::reconcile_helpers::{became_invalid, validation_status_needs_update};
use chrono::{DateTime, Utc};
use crds::{Downscaler, NamespaceScaleStatus};
use kube::Api;
use kube::ResourceExt;
use kube::api::{Patch, PatchParams};
use scaler::{ScaleError, WorkloadClient, get_scaler, validate_spec};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reconciles Downscaler resources.
pub struct Reconciler<C> {
    api: Api<Downscaler>,
    client: Arc<C>,
    metrics: Arc<Metrics>,
}

impl<C: WorkloadClient> Reconciler<C> {
    /// Creates a new reconciler instance.
    pub fn new(api: Api<Downscaler>, client: Arc<C>, metrics: Arc<Metrics>) -> Self {
        Self { api, client, metrics }
    }

    /// Validates a Downscaler and records the result in its status.
    ///
    /// Every field error is logged. The status is only patched, and a
    /// failure only counted, when the outcome changed.
    pub async fn reconcile_validation(
        &self,
        downscaler: &Downscaler,
    ) -> Result<bool, ControllerError> {
        let name = downscaler.name_any();
        let report = validate_spec(&downscaler.spec);
        report.emit();

        let valid = report.is_valid();
        let messages = report.messages();
        let current = downscaler.status.as_ref();
        if valid {
            info!("Downscaler {} is valid", name);
        } else {
            warn!("Downscaler {} is invalid ({} errors)", name, messages.len());
        }
        if became_invalid(current, valid) {
            self.metrics.validation_failed();
        }

        if !validation_status_needs_update(current, valid, &messages) {
            debug!("Downscaler {} validation status unchanged", name);
            return Ok(valid);
        }

        let status_patch = json!({
            "status": {
                "valid": valid,
                "validationErrors": messages,
            }
        });
        self.api
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&status_patch))
            .await?;
        Ok(valid)
    }

    /// Evaluates a Downscaler's windows at `now` and scales namespaces whose
    /// state changed.
    ///
    /// Invalid Downscalers are skipped. Execution stops at the first scaling
    /// error; namespaces scaled before it are still recorded in the status.
    pub async fn reconcile_schedule(
        &self,
        downscaler: &Downscaler,
        now: DateTime<Utc>,
    ) -> Result<(), ControllerError> {
        let name = downscaler.name_any();
        if !validate_spec(&downscaler.spec).is_valid() {
            debug!("Skipping invalid Downscaler {}", name);
            return Ok(());
        }

        let previous = downscaler
            .status
            .as_ref()
            .map(|status| status.namespaces.clone())
            .unwrap_or_default();

        let plan = match planner::plan(&downscaler.spec, &previous, now) {
            Ok(plan) => plan,
            Err(e) => {
                error!("Failed to evaluate Downscaler {}: {}", name, e);
                self.update_status(&name, &previous, now, Some(e.to_string())).await;
                return Err(e.into());
            }
        };

        if plan.actions.is_empty() {
            debug!("Downscaler {}: no namespace changes state", name);
        }

        let kinds = downscaler
            .spec
            .downscaler_options
            .as_ref()
            .map(|options| options.resource_scaling.clone())
            .unwrap_or_default();

        let (applied, result) =
            apply_plan(&self.client, &kinds, &plan.actions, &self.metrics).await;
        let namespaces = planner::next_status(&plan, &previous, &applied, now);
        let error_msg = result.as_ref().err().map(ToString::to_string);
        self.update_status(&name, &namespaces, now, error_msg).await;

        result.map_err(ControllerError::from)
    }

    async fn update_status(
        &self,
        name: &str,
        namespaces: &[NamespaceScaleStatus],
        now: DateTime<Utc>,
        error_msg: Option<String>,
    ) {
        let status = json!({
            "status": {
                "namespaces": namespaces,
                "lastReconciled": now,
                "error": error_msg,
            }
        });
        if let Err(e) = self
            .api
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&status))
            .await
        {
            error!("Failed to update Downscaler {} status: {}", name, e);
        }
    }
}

/// Applies planned actions, scaling every configured kind in each namespace.
///
/// Returns the actions that fully succeeded, and the first error if any.
/// Nothing after the first error is attempted. An action is never
/// reported as applied when there is no kind to scale.
pub async fn apply_plan<C: WorkloadClient>(
    client: &Arc<C>,
    kinds: &[String],
    actions: &[PlannedAction],
    metrics: &Metrics,
) -> (Vec<PlannedAction>, Result<(), ScaleError>) {
    let mut applied = Vec::with_capacity(actions.len());
    if kinds.is_empty() && !actions.is_empty() {
        return (applied, Err(ScaleError::NoResourceKinds));
    }

    for action in actions {
        info!(
            "Scaling namespace {} to {} ({} replicas)",
            action.namespace, action.state, action.replicas
        );

        for kind in kinds {
            let scaler = match get_scaler(kind, Arc::clone(client)) {
                Ok(scaler) => scaler,
                Err(e) => {
                    metrics.scale_failed(kind);
                    return (applied, Err(e));
                }
            };

            match scaler.run(&action.namespace, action.replicas).await {
                Ok(report) => {
                    metrics.scale_succeeded(scaler.kind().as_str(), report.objects.len());
                }
                Err(e) => {
                    metrics.scale_failed(scaler.kind().as_str());
                    return (applied, Err(e));
                }
            }
        }

        applied.push(action.clone());
    }

    (applied, Ok(()))
}
