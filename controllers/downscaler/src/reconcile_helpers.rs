//! Status comparison helpers for reconciliation.
//!
//! The watcher sees every status write the controller makes, so writes and
//! counters are gated on an actual change of the recorded outcome.

use crds::DownscalerStatus;

/// Check if the validation part of a status needs updating
///
/// Returns `true` when there is no status yet, or when the recorded
/// validity or error list differs from the desired one.
pub fn validation_status_needs_update(
    current_status: Option<&DownscalerStatus>,
    desired_valid: bool,
    desired_errors: &[String],
) -> bool {
    match current_status {
        None => true,
        Some(status) => {
            status.valid != Some(desired_valid) || status.validation_errors != desired_errors
        }
    }
}

/// Check if a validation outcome moves the Downscaler into the invalid state
///
/// Re-validating an already invalid Downscaler (relists, its own status
/// write) is not a new failure.
pub fn became_invalid(current_status: Option<&DownscalerStatus>, desired_valid: bool) -> bool {
    !desired_valid && current_status.and_then(|status| status.valid) != Some(false)
}
