//! Field paths for validation errors
//!
//! Renders Kubernetes-style paths such as
//! `spec.downscalerOptions.timeRules.rules[0].namespaces`.

use std::fmt;

/// Path to a field in a resource spec
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// Start a path at a root field name
    pub fn new(root: &str) -> Self {
        Self(root.to_string())
    }

    /// Descend into a named child field
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, name))
    }

    /// Descend into a list element
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    /// Rendered path
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_and_index() {
        let path = FieldPath::new("spec")
            .child("downscalerOptions")
            .child("timeRules")
            .child("rules")
            .index(2)
            .child("namespaces");
        assert_eq!(path.as_str(), "spec.downscalerOptions.timeRules.rules[2].namespaces");
    }

    #[test]
    fn test_paths_are_independent() {
        let base = FieldPath::new("spec").child("schedule");
        let zone = base.child("timeZone");
        assert_eq!(base.to_string(), "spec.schedule");
        assert_eq!(zone.to_string(), "spec.schedule.timeZone");
    }
}
