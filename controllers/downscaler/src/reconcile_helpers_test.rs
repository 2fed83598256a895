//! Unit tests for reconcile_helpers module

#[cfg(test)]
mod tests {
    use crate::reconcile_helpers::{became_invalid, validation_status_needs_update};
    use crds::DownscalerStatus;

    fn status(valid: Option<bool>, errors: &[&str]) -> DownscalerStatus {
        DownscalerStatus {
            valid,
            validation_errors: errors.iter().map(|e| (*e).to_string()).collect(),
            ..Default::default()
        }
    }

    fn errors(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|e| (*e).to_string()).collect()
    }

    #[test]
    fn test_needs_update_without_status() {
        assert!(validation_status_needs_update(None, true, &[]));
        let messages = errors(&["spec.schedule: Invalid value"]);
        assert!(validation_status_needs_update(None, false, &messages));
    }

    #[test]
    fn test_no_update_when_unchanged() {
        let current = status(Some(true), &[]);
        assert!(!validation_status_needs_update(Some(&current), true, &[]));

        let current = status(Some(false), &["spec.schedule.timeZone: Invalid value: \"UTC\""]);
        assert!(!validation_status_needs_update(
            Some(&current),
            false,
            &errors(&["spec.schedule.timeZone: Invalid value: \"UTC\""]),
        ));
    }

    #[test]
    fn test_needs_update_when_validity_flips() {
        let current = status(Some(true), &[]);
        assert!(validation_status_needs_update(Some(&current), false, &[]));

        // A status written by the scheduler only has no validity yet
        let current = status(None, &[]);
        assert!(validation_status_needs_update(Some(&current), true, &[]));
    }

    #[test]
    fn test_needs_update_when_error_list_changes() {
        let current = status(Some(false), &["spec.schedule.timeZone: Invalid value: \"UTC\""]);
        assert!(validation_status_needs_update(
            Some(&current),
            false,
            &errors(&["spec.downscalerOptions: Invalid value: null"]),
        ));
        assert!(validation_status_needs_update(
            Some(&current),
            false,
            &errors(&[
                "spec.schedule.timeZone: Invalid value: \"UTC\"",
                "spec.downscalerOptions: Invalid value: null",
            ]),
        ));
    }

    #[test]
    fn test_became_invalid_only_on_transition() {
        assert!(became_invalid(None, false));
        assert!(became_invalid(Some(&status(Some(true), &[])), false));
        assert!(became_invalid(Some(&status(None, &[])), false));

        assert!(!became_invalid(Some(&status(Some(false), &["x"])), false));
        assert!(!became_invalid(None, true));
        assert!(!became_invalid(Some(&status(Some(false), &["x"])), true));
    }
}
