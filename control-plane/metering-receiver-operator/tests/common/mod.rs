#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::ObjectMeta;
use metering_receiver_operator::controller::{
    ClusterStore, ManagedKind, ManagedResource, ReconcileErr,
};
use metering_receiver_operator::crd::{
    MeteringReceiver, MeteringReceiverSpec, MongoDbSpec,
};
use metering_receiver_operator::templates::{RECEIVER_NAME, labels};

// DNS-1123 safe numeric suffix for unique names
pub const DIGITS: [char; 10] =
    ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
pub fn uniq(prefix: &str) -> String {
    format!("{prefix}-{}", nanoid::nanoid!(6, &DIGITS))
}

pub type Key = (ManagedKind, String, String);

#[derive(Default)]
struct State {
    receivers: HashMap<(String, String), MeteringReceiver>,
    managed: HashMap<Key, ManagedResource>,
    pods: Vec<Pod>,
    created: Vec<Key>,
    status_writes: usize,
    fail_create: Option<ManagedKind>,
}

/// Cluster store kept in process memory. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_receiver(&self, mut mr: MeteringReceiver) {
        mr.metadata
            .resource_version
            .get_or_insert_with(|| "1".to_string());
        let key = (
            mr.metadata.namespace.clone().unwrap_or_default(),
            name_of(&mr.metadata),
        );
        self.state.lock().unwrap().receivers.insert(key, mr);
    }

    /// Drop the stored status the way an external writer would, bumping the
    /// resourceVersion.
    pub fn clear_status(&self, ns: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(mr) = state
            .receivers
            .get_mut(&(ns.to_string(), name.to_string()))
        {
            mr.status = None;
            bump_version(&mut mr.metadata);
        }
    }

    pub fn delete_receiver(&self, ns: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .receivers
            .remove(&(ns.to_string(), name.to_string()));
    }

    pub fn receiver(&self, ns: &str, name: &str) -> Option<MeteringReceiver> {
        self.state
            .lock()
            .unwrap()
            .receivers
            .get(&(ns.to_string(), name.to_string()))
            .cloned()
    }

    pub fn put_pod(&self, pod: Pod) {
        self.state.lock().unwrap().pods.push(pod);
    }

    pub fn managed(
        &self,
        kind: ManagedKind,
        ns: &str,
        name: &str,
    ) -> Option<ManagedResource> {
        self.state
            .lock()
            .unwrap()
            .managed
            .get(&(kind, ns.to_string(), name.to_string()))
            .cloned()
    }

    pub fn all_managed(&self) -> Vec<ManagedResource> {
        self.state.lock().unwrap().managed.values().cloned().collect()
    }

    /// Every create in call order.
    pub fn created(&self) -> Vec<Key> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn status_writes(&self) -> usize {
        self.state.lock().unwrap().status_writes
    }

    pub fn fail_creates_of(&self, kind: Option<ManagedKind>) {
        self.state.lock().unwrap().fail_create = kind;
    }
}

fn bump_version(meta: &mut ObjectMeta) {
    let next = meta
        .resource_version
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    meta.resource_version = Some(next.to_string());
}

fn name_of(meta: &ObjectMeta) -> String {
    meta.name.clone().unwrap_or_default()
}

fn matches(pod: &Pod, ns: &str, selector: &BTreeMap<String, String>) -> bool {
    if pod.metadata.namespace.as_deref() != Some(ns) {
        return false;
    }
    let labels = pod.metadata.labels.clone().unwrap_or_default();
    selector.iter().all(|(k, v)| labels.get(k) == Some(v))
}

#[async_trait]
impl ClusterStore for InMemoryStore {
    async fn get_receiver(
        &self,
        ns: &str,
        name: &str,
    ) -> Result<Option<MeteringReceiver>, ReconcileErr> {
        Ok(self.receiver(ns, name))
    }

    async fn update_receiver_status(
        &self,
        receiver: &MeteringReceiver,
    ) -> Result<MeteringReceiver, ReconcileErr> {
        let ns = receiver.metadata.namespace.clone().unwrap_or_default();
        let name = name_of(&receiver.metadata);
        let mut state = self.state.lock().unwrap();
        let stored = state
            .receivers
            .get_mut(&(ns, name.clone()))
            .ok_or_else(|| ReconcileErr::Internal(format!("{name} not found")))?;
        // Optimistic concurrency as the API server applies it.
        if let Some(sent) = receiver.metadata.resource_version.as_deref() {
            if stored.metadata.resource_version.as_deref() != Some(sent) {
                return Err(ReconcileErr::Internal(format!(
                    "409 conflict on {name}: sent {sent}, stored {:?}",
                    stored.metadata.resource_version
                )));
            }
        }
        stored.status = receiver.status.clone();
        bump_version(&mut stored.metadata);
        let updated = stored.clone();
        state.status_writes += 1;
        Ok(updated)
    }

    async fn get_managed(
        &self,
        kind: ManagedKind,
        ns: &str,
        name: &str,
    ) -> Result<Option<ManagedResource>, ReconcileErr> {
        Ok(self.managed(kind, ns, name))
    }

    async fn create_managed(
        &self,
        resource: &ManagedResource,
    ) -> Result<(), ReconcileErr> {
        let key = (
            resource.kind(),
            resource.namespace().unwrap_or_default().to_string(),
            resource.name().unwrap_or_default().to_string(),
        );
        let mut state = self.state.lock().unwrap();
        if state.fail_create == Some(resource.kind()) {
            return Err(ReconcileErr::Internal(format!(
                "create {} rejected",
                resource.kind()
            )));
        }
        if state.managed.contains_key(&key) {
            return Err(ReconcileErr::Internal(format!(
                "{} {} already exists",
                key.0, key.2
            )));
        }
        state.managed.insert(key.clone(), resource.clone());
        state.created.push(key);
        Ok(())
    }

    async fn list_pods(
        &self,
        ns: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<Pod>, ReconcileErr> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pods
            .iter()
            .filter(|p| matches(p, ns, selector))
            .cloned()
            .collect())
    }
}

pub fn mongodb(host: &str) -> MongoDbSpec {
    MongoDbSpec {
        host: host.into(),
        port: 27017,
        username_secret: "icp-mongodb-admin".into(),
        username_key: "user".into(),
        password_secret: "icp-mongodb-admin".into(),
        password_key: "password".into(),
        cluster_certs_secret: "mongodb-root-ca-cert".into(),
        client_certs_secret: "icp-mongodb-client-cert".into(),
    }
}

pub fn receiver(ns: &str, name: &str, mongo_host: &str) -> MeteringReceiver {
    let mut mr = MeteringReceiver::new(
        name,
        MeteringReceiverSpec {
            version: "3.6.0".into(),
            mongodb: mongodb(mongo_host),
            ..Default::default()
        },
    );
    mr.metadata.namespace = Some(ns.into());
    mr.metadata.uid = Some(format!("uid-{ns}-{name}"));
    mr
}

/// A pod carrying the selector labels of receiver `cr_name`.
pub fn receiver_pod(ns: &str, cr_name: &str, pod_name: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(pod_name.into()),
            namespace: Some(ns.into()),
            labels: Some(labels::pod_labels(RECEIVER_NAME, cr_name)),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn env_value(res: &ManagedResource, var: &str) -> Option<String> {
    let ManagedResource::Deployment(dep) = res else {
        return None;
    };
    dep.spec
        .as_ref()?
        .template
        .spec
        .as_ref()?
        .containers
        .first()?
        .env
        .as_ref()?
        .iter()
        .find(|e| e.name == var)
        .and_then(|e| e.value.clone())
}
