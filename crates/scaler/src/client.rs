//! Workload API client
//!
//! [`WorkloadClient`] is the seam between the scaling strategies and the
//! Kubernetes API: list every object of a kind in a namespace, and patch one
//! object's scale field. [`KubeWorkloadClient`] is the production
//! implementation; tests use `MockWorkloadClient` (feature `test-util`).

use crate::error::ScaleError;
use crate::kind::ResourceKind;
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use kube::api::{ListParams, Patch, PatchParams};
use kube::{Api, Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt::Debug;

/// A namespaced workload with a replica-like scale field
pub trait Scalable:
    Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Kind this type is dispatched under
    const KIND: ResourceKind;

    /// Current value of the scale field, if set
    fn current_scale(&self) -> Option<i32>;

    /// Merge patch setting the scale field to `replicas`
    fn scale_patch(replicas: i32) -> serde_json::Value;
}

impl Scalable for Deployment {
    const KIND: ResourceKind = ResourceKind::Deployments;

    fn current_scale(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|spec| spec.replicas)
    }

    fn scale_patch(replicas: i32) -> serde_json::Value {
        json!({ "spec": { "replicas": replicas } })
    }
}

impl Scalable for StatefulSet {
    const KIND: ResourceKind = ResourceKind::StatefulSet;

    fn current_scale(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|spec| spec.replicas)
    }

    fn scale_patch(replicas: i32) -> serde_json::Value {
        json!({ "spec": { "replicas": replicas } })
    }
}

impl Scalable for HorizontalPodAutoscaler {
    const KIND: ResourceKind = ResourceKind::Hpa;

    fn current_scale(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|spec| spec.min_replicas)
    }

    fn scale_patch(replicas: i32) -> serde_json::Value {
        json!({ "spec": { "minReplicas": replicas } })
    }
}

/// Operations the scaling strategies need from the API
///
/// Implementations hold no per-call state and are shared across strategies.
#[async_trait]
pub trait WorkloadClient: Send + Sync {
    /// List every object of kind `K` in `namespace`
    async fn list<K: Scalable>(&self, namespace: &str) -> Result<Vec<K>, ScaleError>;

    /// Set the scale field of `object` to `replicas`
    async fn patch<K: Scalable>(&self, replicas: i32, object: &K) -> Result<(), ScaleError>;
}

/// [`WorkloadClient`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeWorkloadClient {
    client: Client,
}

impl std::fmt::Debug for KubeWorkloadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeWorkloadClient").finish_non_exhaustive()
    }
}

impl KubeWorkloadClient {
    /// Wrap a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkloadClient for KubeWorkloadClient {
    async fn list<K: Scalable>(&self, namespace: &str) -> Result<Vec<K>, ScaleError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn patch<K: Scalable>(&self, replicas: i32, object: &K) -> Result<(), ScaleError> {
        let name = object.name_any();
        let namespace = object.namespace().ok_or_else(|| ScaleError::MissingNamespace {
            kind: K::KIND.to_string(),
            name: name.clone(),
        })?;

        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        let patch = K::scale_patch(replicas);
        api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::DeploymentSpec;
    use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscalerSpec;

    #[test]
    fn test_current_scale_reads_kind_specific_field() {
        let deployment = Deployment {
            spec: Some(DeploymentSpec {
                replicas: Some(3),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(deployment.current_scale(), Some(3));
        assert_eq!(StatefulSet::default().current_scale(), None);

        let hpa = HorizontalPodAutoscaler {
            spec: Some(HorizontalPodAutoscalerSpec {
                min_replicas: Some(2),
                max_replicas: 10,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(hpa.current_scale(), Some(2));
    }

    #[test]
    fn test_scale_patch_targets_kind_specific_field() {
        assert_eq!(Deployment::scale_patch(0), json!({ "spec": { "replicas": 0 } }));
        assert_eq!(StatefulSet::scale_patch(2), json!({ "spec": { "replicas": 2 } }));
        assert_eq!(
            HorizontalPodAutoscaler::scale_patch(1),
            json!({ "spec": { "minReplicas": 1 } })
        );
    }
}
