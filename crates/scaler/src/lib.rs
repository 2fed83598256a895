//! Downscaler core
//!
//! Validates `Downscaler` specs, evaluates their time windows, and scales
//! workloads through a uniform strategy per resource kind.
//!
//! # Example
//!
//! ```no_run
//! use scaler::{KubeWorkloadClient, get_scaler};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(KubeWorkloadClient::new(kube::Client::try_default().await?));
//!
//! // Scale every Deployment in team-a down to zero
//! let scaler = get_scaler("deployments", client)?;
//! let report = scaler.run("team-a", 0).await?;
//! println!("patched {} objects", report.objects.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Validation**: accumulates every field error with its path and cause
//! - **Windows**: time-of-day windows in IANA time zones, with weekday recurrence
//! - **Dispatch**: Deployments, StatefulSets and HPAs behind one generic executor
//! - **Mocking**: in-memory `MockWorkloadClient` behind the `test-util` feature

pub mod client;
pub mod error;
pub mod field;
pub mod kind;
pub mod scaler;
pub mod validate;
pub mod window;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;


pub use client::{KubeWorkloadClient, Scalable, WorkloadClient};
pub use error::{FieldError, ScaleError, ScheduleError, ValidationCause};
pub use field::FieldPath;
pub use kind::ResourceKind;
pub use scaler::{ScaleReport, ScaledObject, Scaler, get_scaler};
pub use validate::{ValidationReport, is_valid, validate, validate_spec};
pub use window::{Recurrence, ScaleWindow, desired_state, local_time};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockWorkloadClient;
