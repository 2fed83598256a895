//! Periodic window evaluation.
//!
//! On every tick, lists all Downscalers and runs their scheduled scaling.
//! A Downscaler whose run failed is skipped until its backoff expires.

use crate::backoff::BackoffTracker;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use chrono::Utc;
use crds::Downscaler;
use kube::api::ListParams;
use kube::{Api, ResourceExt};
use scaler::WorkloadClient;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Drives scheduled reconciliation of every Downscaler.
pub struct Scheduler<C> {
    reconciler: Arc<Reconciler<C>>,
    api: Api<Downscaler>,
    interval: Duration,
    backoff: BackoffTracker,
}

impl<C: WorkloadClient> Scheduler<C> {
    /// Creates a new scheduler.
    pub fn new(
        reconciler: Arc<Reconciler<C>>,
        api: Api<Downscaler>,
        interval: Duration,
        backoff: BackoffTracker,
    ) -> Self {
        Self {
            reconciler,
            api,
            interval,
            backoff,
        }
    }

    /// Runs ticks until the task is aborted.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Starting scheduler (interval {:?})", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    async fn tick(&mut self) {
        let downscalers = match self.api.list(&ListParams::default()).await {
            Ok(list) => list.items,
            Err(e) => {
                warn!("Failed to list Downscalers: {}", e);
                return;
            }
        };

        self.backoff
            .retain(|name| downscalers.iter().any(|d| d.name_any() == name));

        let now = Utc::now();
        for downscaler in &downscalers {
            let name = downscaler.name_any();
            if self.backoff.is_waiting(&name, Instant::now()) {
                debug!("Downscaler {} is backing off", name);
                continue;
            }

            match self.reconciler.reconcile_schedule(downscaler, now).await {
                Ok(()) => self.backoff.record_success(&name),
                Err(e) => {
                    let delay = self.backoff.record_failure(&name, Instant::now());
                    warn!(
                        "Scheduled reconcile of Downscaler {} failed: {} (retry in {:?})",
                        name, e, delay
                    );
                }
            }
        }
    }
}
