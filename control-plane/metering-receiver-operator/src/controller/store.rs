use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use serde_json::json;
use tracing::trace;

#[cfg(test)]
use mockall::automock;

use super::ReconcileErr;
use super::managed::{ManagedKind, ManagedResource};
use crate::crd::{Certificate, MeteringReceiver};
use crate::templates::labels::to_selector;

pub const FIELD_MANAGER: &str = "metering-receiver-operator";

/// Cluster operations the reconciler depends on.
///
/// `Ok(None)` from a lookup means the object does not exist; every other
/// failure is an error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterStore: Send + Sync {
    async fn get_receiver(
        &self,
        ns: &str,
        name: &str,
    ) -> Result<Option<MeteringReceiver>, ReconcileErr>;

    /// Write `receiver.status` through the status sub-resource and return the
    /// stored object, carrying its new resourceVersion.
    async fn update_receiver_status(
        &self,
        receiver: &MeteringReceiver,
    ) -> Result<MeteringReceiver, ReconcileErr>;

    async fn get_managed(
        &self,
        kind: ManagedKind,
        ns: &str,
        name: &str,
    ) -> Result<Option<ManagedResource>, ReconcileErr>;

    async fn create_managed(
        &self,
        resource: &ManagedResource,
    ) -> Result<(), ReconcileErr>;

    async fn list_pods(
        &self,
        ns: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<Pod>, ReconcileErr>;
}

/// [`ClusterStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterStore for KubeStore {
    async fn get_receiver(
        &self,
        ns: &str,
        name: &str,
    ) -> Result<Option<MeteringReceiver>, ReconcileErr> {
        let api: Api<MeteringReceiver> =
            Api::namespaced(self.client.clone(), ns);
        Ok(api.get_opt(name).await?)
    }

    async fn update_receiver_status(
        &self,
        receiver: &MeteringReceiver,
    ) -> Result<MeteringReceiver, ReconcileErr> {
        let ns = receiver
            .namespace()
            .ok_or(ReconcileErr::MissingField("metadata.namespace"))?;
        let name = receiver.name_any();
        let api: Api<MeteringReceiver> =
            Api::namespaced(self.client.clone(), &ns);

        // Carry resourceVersion so a concurrent writer surfaces as a conflict.
        let status = serde_json::to_value(&receiver.status)?;
        let mut patch = json!({ "status": status });
        if let Some(rv) = receiver.resource_version() {
            patch["metadata"] = json!({ "resourceVersion": rv });
        }
        trace!(%ns, %name, "patching MeteringReceiver status");
        let updated = api
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(updated)
    }

    async fn get_managed(
        &self,
        kind: ManagedKind,
        ns: &str,
        name: &str,
    ) -> Result<Option<ManagedResource>, ReconcileErr> {
        let found = match kind {
            ManagedKind::Service => {
                Api::<Service>::namespaced(self.client.clone(), ns)
                    .get_opt(name)
                    .await?
                    .map(ManagedResource::from)
            }
            ManagedKind::Deployment => {
                Api::<Deployment>::namespaced(self.client.clone(), ns)
                    .get_opt(name)
                    .await?
                    .map(ManagedResource::from)
            }
            ManagedKind::Certificate => {
                Api::<Certificate>::namespaced(self.client.clone(), ns)
                    .get_opt(name)
                    .await?
                    .map(ManagedResource::from)
            }
        };
        Ok(found)
    }

    async fn create_managed(
        &self,
        resource: &ManagedResource,
    ) -> Result<(), ReconcileErr> {
        let ns = resource
            .namespace()
            .ok_or(ReconcileErr::MissingField("metadata.namespace"))?;
        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        match resource {
            ManagedResource::Service(svc) => {
                Api::<Service>::namespaced(self.client.clone(), ns)
                    .create(&pp, svc)
                    .await?;
            }
            ManagedResource::Deployment(dep) => {
                Api::<Deployment>::namespaced(self.client.clone(), ns)
                    .create(&pp, dep)
                    .await?;
            }
            ManagedResource::Certificate(cert) => {
                Api::<Certificate>::namespaced(self.client.clone(), ns)
                    .create(&pp, cert)
                    .await?;
            }
        }
        Ok(())
    }

    async fn list_pods(
        &self,
        ns: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<Pod>, ReconcileErr> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), ns);
        let lp = ListParams::default().labels(&to_selector(selector));
        Ok(api.list(&lp).await?.items)
    }
}
