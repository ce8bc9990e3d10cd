use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    ObjectMeta, OwnerReference,
};
use kube::Resource;

use crate::crd::Certificate;

/// Kinds of child objects a MeteringReceiver owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManagedKind {
    Service,
    Deployment,
    Certificate,
}

impl std::fmt::Display for ManagedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManagedKind::Service => write!(f, "Service"),
            ManagedKind::Deployment => write!(f, "Deployment"),
            ManagedKind::Certificate => write!(f, "Certificate"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum ManagedResource {
    Service(Service),
    Deployment(Deployment),
    Certificate(Certificate),
}

impl ManagedResource {
    pub fn kind(&self) -> ManagedKind {
        match self {
            ManagedResource::Service(_) => ManagedKind::Service,
            ManagedResource::Deployment(_) => ManagedKind::Deployment,
            ManagedResource::Certificate(_) => ManagedKind::Certificate,
        }
    }

    pub fn meta(&self) -> &ObjectMeta {
        match self {
            ManagedResource::Service(r) => r.meta(),
            ManagedResource::Deployment(r) => r.meta(),
            ManagedResource::Certificate(r) => r.meta(),
        }
    }

    pub fn meta_mut(&mut self) -> &mut ObjectMeta {
        match self {
            ManagedResource::Service(r) => r.meta_mut(),
            ManagedResource::Deployment(r) => r.meta_mut(),
            ManagedResource::Certificate(r) => r.meta_mut(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.meta().name.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.meta().namespace.as_deref()
    }

    /// The owner reference marked `controller: true`, if any.
    pub fn controller_owner(&self) -> Option<&OwnerReference> {
        self.meta()
            .owner_references
            .as_ref()?
            .iter()
            .find(|r| r.controller == Some(true))
    }
}

impl From<Service> for ManagedResource {
    fn from(value: Service) -> Self {
        ManagedResource::Service(value)
    }
}

impl From<Deployment> for ManagedResource {
    fn from(value: Deployment) -> Self {
        ManagedResource::Deployment(value)
    }
}

impl From<Certificate> for ManagedResource {
    fn from(value: Certificate) -> Self {
        ManagedResource::Certificate(value)
    }
}
