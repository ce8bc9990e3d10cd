use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Placeholder published in `status.podNames` while no receiver pod exists.
pub const NO_PODS: &str = "none";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "operator.ibm.com",
    version = "v1alpha1",
    kind = "MeteringReceiver",
    plural = "meteringreceivers",
    namespaced,
    status = "MeteringReceiverStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct MeteringReceiverSpec {
    pub version: String,
    /// Registry to pull the receiver image from instead of the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_registry: Option<String>,
    /// Appended to the image tag (ignored when pulling by digest)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_tag_postfix: Option<String>,
    /// ClusterIssuer that signs the receiver certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_issuer: Option<String>,
    pub mongodb: MongoDbSpec,
}

/// Connection settings for the metering database.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MongoDbSpec {
    pub host: String,
    pub port: i32,
    pub username_secret: String,
    pub username_key: String,
    pub password_secret: String,
    pub password_key: String,
    #[serde(rename = "clustercertssecret")]
    pub cluster_certs_secret: String,
    #[serde(rename = "clientcertssecret")]
    pub client_certs_secret: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeteringReceiverStatus {
    /// Names of the receiver pods, in listing order
    #[serde(default)]
    pub pod_names: Vec<String>,
}

impl MeteringReceiverStatus {
    pub fn no_pods() -> Self {
        Self {
            pod_names: vec![NO_PODS.to_string()],
        }
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

impl MeteringReceiverSpec {
    pub fn image_registry(&self) -> Option<&str> {
        non_empty(&self.image_registry)
    }

    pub fn image_tag_postfix(&self) -> &str {
        non_empty(&self.image_tag_postfix).unwrap_or_default()
    }

    pub fn cluster_issuer(&self) -> Option<&str> {
        non_empty(&self.cluster_issuer)
    }
}

impl MeteringReceiver {
    pub fn pod_names(&self) -> &[String] {
        self.status
            .as_ref()
            .map(|s| s.pod_names.as_slice())
            .unwrap_or_default()
    }
}
