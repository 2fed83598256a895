//! Controller-specific error types.
//!
//! This module defines error types specific to the Downscaler Controller
//! that are not covered by upstream library errors.

use kube::Error as KubeError;
use scaler::{ScaleError, ScheduleError};
use thiserror::Error;

/// Errors that can occur in the Downscaler Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Scaling dispatch or execution failed
    #[error("Scaling failed: {0}")]
    Scale(#[from] ScaleError),

    /// Schedule could not be evaluated against the clock
    #[error("Schedule evaluation failed: {0}")]
    Schedule(#[from] ScheduleError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Probe server I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
