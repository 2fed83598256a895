//! Resource kinds the scaler can drive.

use crate::error::ScaleError;
use std::fmt;
use std::str::FromStr;

/// Workload kinds with a scaling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// `apps/v1` Deployment, scaled through `spec.replicas`
    Deployments,
    /// `apps/v1` StatefulSet, scaled through `spec.replicas`
    StatefulSet,
    /// `autoscaling/v2` HorizontalPodAutoscaler, scaled through `spec.minReplicas`
    Hpa,
}

impl ResourceKind {
    /// Every supported kind
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Deployments,
        ResourceKind::StatefulSet,
        ResourceKind::Hpa,
    ];

    /// Identifier used in `resourceScaling`
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Deployments => "deployments",
            ResourceKind::StatefulSet => "statefulset",
            ResourceKind::Hpa => "hpa",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = ScaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScaleError::ResourceKindNotFound(s.to_string()))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        for raw in ["deployments", "Deployments", "DEPLOYMENTS"] {
            assert_eq!(raw.parse::<ResourceKind>().ok(), Some(ResourceKind::Deployments));
        }
        assert_eq!("StatefulSet".parse::<ResourceKind>().ok(), Some(ResourceKind::StatefulSet));
        assert_eq!("HPA".parse::<ResourceKind>().ok(), Some(ResourceKind::Hpa));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        for raw in ["", "deployment", "statefulsets", "daemonset", " hpa"] {
            match raw.parse::<ResourceKind>() {
                Err(ScaleError::ResourceKindNotFound(kind)) => assert_eq!(kind, raw),
                other => panic!("expected ResourceKindNotFound for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_display_round_trips() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.to_string().parse::<ResourceKind>().ok(), Some(kind));
        }
    }
}
