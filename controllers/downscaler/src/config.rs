//! Controller configuration.
//!
//! Read from environment variables at startup.

use crate::error::ControllerError;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;
const DEFAULT_PROBE_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_BACKOFF_MAX_SECS: u64 = 600;

/// Runtime configuration for the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// How often every Downscaler's windows are evaluated
    pub reconcile_interval: Duration,
    /// Address of the health/readiness/metrics server
    pub probe_addr: SocketAddr,
    /// First retry delay after a failed scaling run
    pub backoff_min: Duration,
    /// Upper bound on the retry delay
    pub backoff_max: Duration,
}

impl ControllerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a key lookup
    ///
    /// - `RECONCILE_INTERVAL_SECS` (default 60)
    /// - `PROBE_ADDR` (default `0.0.0.0:8080`)
    /// - `BACKOFF_MIN_SECS` (default: the reconcile interval)
    /// - `BACKOFF_MAX_SECS` (default 600)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval_secs =
            parse_secs(&lookup, "RECONCILE_INTERVAL_SECS", DEFAULT_RECONCILE_INTERVAL_SECS)?;
        if interval_secs == 0 {
            return Err(ControllerError::InvalidConfig(
                "RECONCILE_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        let probe_addr = lookup("PROBE_ADDR")
            .unwrap_or_else(|| DEFAULT_PROBE_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ControllerError::InvalidConfig(format!("PROBE_ADDR: {}", e)))?;

        let backoff_min = parse_secs(&lookup, "BACKOFF_MIN_SECS", interval_secs)?;
        let backoff_max = parse_secs(&lookup, "BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS)?;
        if backoff_min == 0 || backoff_max < backoff_min {
            return Err(ControllerError::InvalidConfig(format!(
                "backoff bounds must satisfy 0 < BACKOFF_MIN_SECS ({}) <= BACKOFF_MAX_SECS ({})",
                backoff_min, backoff_max
            )));
        }

        Ok(Self {
            reconcile_interval: Duration::from_secs(interval_secs),
            probe_addr,
            backoff_min: Duration::from_secs(backoff_min),
            backoff_max: Duration::from_secs(backoff_max),
        })
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ControllerError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| ControllerError::InvalidConfig(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ControllerConfig, ControllerError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ControllerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).expect("defaults are valid");
        assert_eq!(cfg.reconcile_interval, Duration::from_secs(60));
        assert_eq!(cfg.probe_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.backoff_min, Duration::from_secs(60));
        assert_eq!(cfg.backoff_max, Duration::from_secs(600));
    }

    #[test]
    fn test_backoff_min_follows_interval() {
        let cfg = config(&[("RECONCILE_INTERVAL_SECS", "30")]).expect("valid");
        assert_eq!(cfg.reconcile_interval, Duration::from_secs(30));
        assert_eq!(cfg.backoff_min, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values() {
        for bad in [
            ("RECONCILE_INTERVAL_SECS", "soon"),
            ("RECONCILE_INTERVAL_SECS", "0"),
            ("PROBE_ADDR", "localhost"),
        ] {
            assert!(
                matches!(config(&[bad]), Err(ControllerError::InvalidConfig(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(matches!(
            config(&[("BACKOFF_MIN_SECS", "120"), ("BACKOFF_MAX_SECS", "60")]),
            Err(ControllerError::InvalidConfig(_))
        ));
    }
}
