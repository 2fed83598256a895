//! Downscaler CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the downscaler controller.

pub mod downscaler;

pub use downscaler::*;
