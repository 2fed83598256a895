//! Downscaler Controller
//!
//! Scales workloads in selected namespaces up and down on a daily schedule.
//!
//! This controller watches cluster-scoped `Downscaler` CRDs, validates them,
//! and on every tick scales the configured Deployments, StatefulSets and
//! HorizontalPodAutoscalers of each namespace whose time window opened or
//! closed.

mod backoff;
mod config;
mod controller;
mod error;
mod metrics;
mod planner;
mod reconcile_helpers;
mod reconciler;
mod scheduler;
mod watcher;

#[cfg(test)]
mod reconcile_helpers_test;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| {
            ControllerError::InvalidConfig("rustls crypto provider already installed".to_string())
        })?;

    info!("Starting Downscaler Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Reconcile interval: {:?}", config.reconcile_interval);
    info!("  Probe address: {}", config.probe_addr);
    info!("  Backoff: {:?} to {:?}", config.backoff_min, config.backoff_max);

    // Initialize and run controller
    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
