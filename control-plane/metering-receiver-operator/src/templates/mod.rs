//! Desired-state builders for the objects a MeteringReceiver owns.
//!
//! Builders are pure: they take a [`ReceiverContext`] computed for the receiver
//! being reconciled and return fresh objects without owner references. Binding
//! ownership and talking to the cluster is the controller's job.

pub mod certificate;
pub mod containers;
pub mod image;
pub mod labels;
pub mod mongodb;
pub mod receiver;

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{EnvVar, Volume};

use crate::config::OperandConfig;
use crate::crd::{Certificate, MeteringReceiverSpec};

pub use certificate::{
    CertificateRole, DEFAULT_CLUSTER_ISSUER, build_certificate,
    certificate_roles, dns_names, resolve_issuer,
};
pub use receiver::{render_deployment, render_service};

/// Name shared by the receiver Deployment, its Service and its pods' `app` label.
pub const RECEIVER_NAME: &str = "metering-receiver";

const LOGLEVEL_TYPE: &str = "loglevel";

/// Per-reconcile rendering inputs for one MeteringReceiver.
#[derive(Clone, Debug)]
pub struct ReceiverContext<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub spec: &'a MeteringReceiverSpec,
    pub service_account: &'a str,
    pub image: String,
    pub selector: BTreeMap<String, String>,
    pub mongodb_env: Vec<EnvVar>,
    pub volumes: Vec<Volume>,
}

impl<'a> ReceiverContext<'a> {
    pub fn new(
        name: &'a str,
        namespace: &'a str,
        spec: &'a MeteringReceiverSpec,
        operand: &'a OperandConfig,
    ) -> Self {
        let image = image::image_id(
            spec.image_registry(),
            spec.image_tag_postfix(),
            image::RECEIVER_IMAGE_NAME,
            operand.receiver_image(),
            image::DEFAULT_RECEIVER_IMAGE_TAG,
        );
        tracing::debug!(%image, "resolved receiver image");
        Self {
            name,
            namespace,
            spec,
            service_account: operand.service_account(),
            image,
            selector: labels::selector_labels(RECEIVER_NAME, name),
            mongodb_env: mongodb::env_vars(&spec.mongodb),
            volumes: mongodb::common_volumes(
                &spec.mongodb,
                RECEIVER_NAME,
                LOGLEVEL_TYPE,
            ),
        }
    }

    /// Env shared by the init and main containers.
    pub fn common_env(&self) -> Vec<EnvVar> {
        let mut env = vec![containers::env("NODE_TLS_REJECT_UNAUTHORIZED", "0")];
        env.extend(self.mongodb_env.iter().cloned());
        env
    }

    pub fn certificates(&self) -> Vec<Certificate> {
        certificate_roles()
            .iter()
            .map(|role| {
                build_certificate(self.namespace, self.spec.cluster_issuer(), role)
            })
            .collect()
    }
}
