//! Scaling dispatch
//!
//! [`get_scaler`] turns a resource kind identifier into a [`Scaler`] bound to
//! a shared client. [`Scaler::run`] lists every object of that kind in a
//! namespace and patches each to the target replica count.
//!
//! Patching stops at the first failure: objects patched before it keep their
//! new value, objects after it are left untouched.

use crate::client::{Scalable, WorkloadClient};
use crate::error::ScaleError;
use crate::kind::ResourceKind;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// One object patched during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledObject {
    /// Object name
    pub name: String,
    /// Scale value before the patch (`None` when unset)
    pub before: Option<i32>,
    /// Scale value applied
    pub after: i32,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleReport {
    /// Kind that was scaled
    pub kind: ResourceKind,
    /// Namespace that was scaled
    pub namespace: String,
    /// Patched objects, in list order
    pub objects: Vec<ScaledObject>,
}

/// Scaling strategy for one resource kind
///
/// Holds only the kind and a shared client, so it can be reused across calls
/// and tasks.
#[derive(Debug)]
pub struct Scaler<C> {
    kind: ResourceKind,
    client: Arc<C>,
}

impl<C> Clone for Scaler<C> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: WorkloadClient> Scaler<C> {
    /// Bind a kind to a client
    pub fn new(kind: ResourceKind, client: Arc<C>) -> Self {
        Self { kind, client }
    }

    /// Kind this scaler drives
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Scale every object of this kind in `namespace` to `replicas`
    pub async fn run(&self, namespace: &str, replicas: i32) -> Result<ScaleReport, ScaleError> {
        let client = self.client.as_ref();
        match self.kind {
            ResourceKind::Deployments => {
                scale_all::<Deployment, C>(client, namespace, replicas).await
            }
            ResourceKind::StatefulSet => {
                scale_all::<StatefulSet, C>(client, namespace, replicas).await
            }
            ResourceKind::Hpa => {
                scale_all::<HorizontalPodAutoscaler, C>(client, namespace, replicas).await
            }
        }
    }
}

/// Select the scaler for a resource kind identifier (case-insensitive)
pub fn get_scaler<C: WorkloadClient>(kind: &str, client: Arc<C>) -> Result<Scaler<C>, ScaleError> {
    let kind: ResourceKind = kind.parse()?;
    Ok(Scaler::new(kind, client))
}

/// List objects of kind `K`, then patch each in list order
async fn scale_all<K, C>(
    client: &C,
    namespace: &str,
    replicas: i32,
) -> Result<ScaleReport, ScaleError>
where
    K: Scalable,
    C: WorkloadClient,
{
    let kind = K::KIND;
    let items: Vec<K> = client.list(namespace).await?;
    debug!("Found {} {} in namespace {}", items.len(), kind, namespace);

    let mut objects = Vec::with_capacity(items.len());
    for item in &items {
        let name = item.name_any();
        let before = item.current_scale();

        if let Err(e) = client.patch(replicas, item).await {
            error!(
                kind = %kind,
                name = %name,
                namespace = %namespace,
                patched = objects.len(),
                "Failed to patch {} {}/{}: {}", kind, namespace, name, e
            );
            return Err(e);
        }

        info!(
            kind = %kind,
            name = %name,
            namespace = %namespace,
            before = ?before,
            after = replicas,
            "Patched {} {}/{}", kind, namespace, name
        );
        objects.push(ScaledObject { name, before, after: replicas });
    }

    Ok(ScaleReport {
        kind,
        namespace: namespace.to_string(),
        objects,
    })
}
