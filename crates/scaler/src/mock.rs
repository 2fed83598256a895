//! Mock WorkloadClient for unit testing
//!
//! Stores workloads in memory as JSON, keyed by kind and namespace, so one
//! store serves every `Scalable` type. Failures can be injected per
//! namespace (list) or per object name (patch).

use crate::client::{Scalable, WorkloadClient};
use crate::error::ScaleError;
use crate::kind::ResourceKind;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, StatefulSet, StatefulSetSpec};
use k8s_openapi::api::autoscaling::v2::{HorizontalPodAutoscaler, HorizontalPodAutoscalerSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

type StoreKey = (ResourceKind, String);

/// In-memory workload store implementing [`WorkloadClient`]
#[derive(Clone, Default, Debug)]
pub struct MockWorkloadClient {
    objects: Arc<Mutex<HashMap<StoreKey, Vec<Value>>>>,
    failing_lists: Arc<Mutex<HashSet<StoreKey>>>,
    failing_patches: Arc<Mutex<HashSet<String>>>,
    patch_log: Arc<Mutex<Vec<(ResourceKind, String, i32)>>>,
}

impl MockWorkloadClient {
    /// Create an empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the store (for test setup)
    ///
    /// Objects without a namespace are stored under "default".
    pub fn add<K: Scalable>(&self, object: K) {
        let namespace = object.namespace().unwrap_or_else(|| "default".to_string());
        let value = serde_json::to_value(&object).unwrap();
        self.objects
            .lock()
            .unwrap()
            .entry((K::KIND, namespace))
            .or_default()
            .push(value);
    }

    /// Fetch an object's current state from the store
    pub fn get<K: Scalable>(&self, namespace: &str, name: &str) -> Option<K> {
        let objects = self.objects.lock().unwrap();
        objects
            .get(&(K::KIND, namespace.to_string()))?
            .iter()
            .find(|value| object_name(value) == Some(name))
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Make every list of `kind` in `namespace` fail
    pub fn fail_list(&self, kind: ResourceKind, namespace: &str) {
        self.failing_lists.lock().unwrap().insert((kind, namespace.to_string()));
    }

    /// Make every patch of an object with this name fail
    pub fn fail_patch(&self, name: &str) {
        self.failing_patches.lock().unwrap().insert(name.to_string());
    }

    /// Patches applied so far, as (kind, name, replicas)
    pub fn patches(&self) -> Vec<(ResourceKind, String, i32)> {
        self.patch_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkloadClient for MockWorkloadClient {
    async fn list<K: Scalable>(&self, namespace: &str) -> Result<Vec<K>, ScaleError> {
        let key = (K::KIND, namespace.to_string());
        if self.failing_lists.lock().unwrap().contains(&key) {
            return Err(ScaleError::Api(format!("list {} in {} rejected", K::KIND, namespace)));
        }

        let objects = self.objects.lock().unwrap();
        objects
            .get(&key)
            .map(|values| {
                values
                    .iter()
                    .map(|value| serde_json::from_value(value.clone()))
                    .collect::<Result<Vec<K>, _>>()
            })
            .transpose()
            .map_err(|e| ScaleError::Api(e.to_string()))
            .map(Option::unwrap_or_default)
    }

    async fn patch<K: Scalable>(&self, replicas: i32, object: &K) -> Result<(), ScaleError> {
        let name = object.name_any();
        if self.failing_patches.lock().unwrap().contains(&name) {
            return Err(ScaleError::Api(format!("patch of {} {} rejected", K::KIND, name)));
        }

        let namespace = object.namespace().unwrap_or_else(|| "default".to_string());
        let mut objects = self.objects.lock().unwrap();
        let stored = objects
            .get_mut(&(K::KIND, namespace.clone()))
            .and_then(|values| {
                values
                    .iter_mut()
                    .find(|value| object_name(value) == Some(name.as_str()))
            })
            .ok_or_else(|| {
                ScaleError::Api(format!("{} {}/{} not found", K::KIND, namespace, name))
            })?;

        json_patch::merge(stored, &K::scale_patch(replicas));
        self.patch_log.lock().unwrap().push((K::KIND, name, replicas));
        Ok(())
    }
}

fn object_name(value: &Value) -> Option<&str> {
    value.pointer("/metadata/name").and_then(Value::as_str)
}

fn metadata(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

/// Helper to create a test Deployment
pub fn deployment(name: &str, namespace: &str, replicas: i32) -> Deployment {
    Deployment {
        metadata: metadata(name, namespace),
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            ..Default::default()
        }),
        status: None,
    }
}

/// Helper to create a test StatefulSet
pub fn stateful_set(name: &str, namespace: &str, replicas: i32) -> StatefulSet {
    StatefulSet {
        metadata: metadata(name, namespace),
        spec: Some(StatefulSetSpec {
            replicas: Some(replicas),
            ..Default::default()
        }),
        status: None,
    }
}

/// Helper to create a test HorizontalPodAutoscaler
pub fn hpa(name: &str, namespace: &str, min_replicas: i32) -> HorizontalPodAutoscaler {
    HorizontalPodAutoscaler {
        metadata: metadata(name, namespace),
        spec: Some(HorizontalPodAutoscalerSpec {
            min_replicas: Some(min_replicas),
            max_replicas: 10,
            ..Default::default()
        }),
        status: None,
    }
}
