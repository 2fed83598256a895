//! Main controller implementation.
//!
//! This module contains the `Controller` struct that orchestrates
//! validation watching, scheduled scaling and the probe server.

use crate::backoff::BackoffTracker;
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::metrics::{self, Metrics, ProbeState};
use crate::reconciler::Reconciler;
use crate::scheduler::Scheduler;
use crate::watcher::Watcher;
use crds::Downscaler;
use kube::{Api, Client};
use scaler::KubeWorkloadClient;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for Downscaler management.
pub struct Controller {
    watcher: JoinHandle<Result<(), ControllerError>>,
    scheduler: JoinHandle<Result<(), ControllerError>>,
    probes: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its background tasks.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing Downscaler Controller");

        let kube_client = Client::try_default().await?;

        // Downscalers are cluster-scoped
        let downscaler_api: Api<Downscaler> = Api::all(kube_client.clone());
        let workload_client = Arc::new(KubeWorkloadClient::new(kube_client));

        let metrics = Arc::new(Metrics::new()?);
        let probe_state = Arc::new(ProbeState::new(metrics.clone()));

        let reconciler = Arc::new(Reconciler::new(
            downscaler_api.clone(),
            workload_client,
            metrics,
        ));

        let watcher_instance = Watcher::new(
            reconciler.clone(),
            downscaler_api.clone(),
            probe_state.clone(),
        );
        let scheduler_instance = Scheduler::new(
            reconciler,
            downscaler_api,
            config.reconcile_interval,
            BackoffTracker::new(config.backoff_min, config.backoff_max),
        );

        let watcher = tokio::spawn(async move { watcher_instance.watch_downscalers().await });
        let scheduler = tokio::spawn(scheduler_instance.run());
        let probes = tokio::spawn(metrics::serve(config.probe_addr, probe_state));

        Ok(Self {
            watcher,
            scheduler,
            probes,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Downscaler Controller running");

        // Every task runs forever; the first one to exit stops the controller
        tokio::select! {
            result = &mut self.watcher => {
                result.map_err(|e| {
                    ControllerError::Watch(format!("Downscaler watcher panicked: {}", e))
                })??;
            }
            result = &mut self.scheduler => {
                result.map_err(|e| ControllerError::Watch(format!("Scheduler panicked: {}", e)))??;
            }
            result = &mut self.probes => {
                result.map_err(|e| {
                    ControllerError::Watch(format!("Probe server panicked: {}", e))
                })??;
            }
        }

        Ok(())
    }
}
