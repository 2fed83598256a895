//! Kubernetes resource watchers.
//!
//! This module watches Downscaler resources for changes and triggers
//! validation.

use crate::error::ControllerError;
use crate::metrics::ProbeState;
use crate::reconciler::Reconciler;
use crds::Downscaler;
use futures::TryStreamExt;
use kube::Api;
use kube_runtime::watcher;
use scaler::WorkloadClient;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Watches Downscaler resources for changes.
pub struct Watcher<C> {
    reconciler: Arc<Reconciler<C>>,
    api: Api<Downscaler>,
    probes: Arc<ProbeState>,
}

impl<C: WorkloadClient> Watcher<C> {
    /// Creates a new watcher instance.
    pub fn new(
        reconciler: Arc<Reconciler<C>>,
        api: Api<Downscaler>,
        probes: Arc<ProbeState>,
    ) -> Self {
        Self { reconciler, api, probes }
    }

    /// Starts watching Downscaler resources.
    pub async fn watch_downscalers(&self) -> Result<(), ControllerError> {
        info!("Starting Downscaler watcher");

        let mut stream = Box::pin(watcher(self.api.clone(), watcher::Config::default()));

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| ControllerError::Watch(format!("Watcher stream error: {}", e)))?
        {
            match event {
                watcher::Event::Apply(downscaler) => {
                    let name = downscaler.metadata.name.as_deref().unwrap_or("<unknown>");
                    info!("Downscaler applied: {}", name);

                    if let Err(e) = self.reconciler.reconcile_validation(&downscaler).await {
                        error!("Failed to validate Downscaler {}: {}", name, e);
                    }
                }
                watcher::Event::Delete(downscaler) => {
                    let name = downscaler.metadata.name.as_deref().unwrap_or("<unknown>");
                    info!("Downscaler deleted: {}", name);
                }
                watcher::Event::Init => {
                    debug!("Downscaler watcher initialized");
                }
                watcher::Event::InitApply(downscaler) => {
                    let name = downscaler.metadata.name.as_deref().unwrap_or("<unknown>");
                    debug!("Downscaler init apply: {}", name);

                    if let Err(e) = self.reconciler.reconcile_validation(&downscaler).await {
                        warn!("Failed to validate Downscaler {}: {}", name, e);
                    }
                }
                watcher::Event::InitDone => {
                    info!("Downscaler watcher initialization complete");
                    self.probes.set_ready();
                }
            }
        }

        Ok(())
    }
}
