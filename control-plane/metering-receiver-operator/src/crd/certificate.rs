//! Client-side model of the cert-manager `Certificate` kind the operator
//! requests. Only the fields the operator writes are modelled; the issued key
//! material lands in `secret_name` and is never read back.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CERT_MANAGER_GROUP: &str = "certmanager.k8s.io";
pub const CLUSTER_ISSUER_KIND: &str = "ClusterIssuer";

#[derive(
    CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema,
    PartialEq,
)]
#[kube(
    group = "certmanager.k8s.io",
    version = "v1alpha1",
    kind = "Certificate",
    plural = "certificates",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSpec {
    pub common_name: String,
    pub secret_name: String,
    #[serde(rename = "isCA", default)]
    pub is_ca: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organization: Vec<String>,
    pub issuer_ref: IssuerRef,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
pub struct IssuerRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_uses_cert_manager_field_names() {
        let spec = CertificateSpec {
            common_name: "metering-receiver".into(),
            secret_name: "icp-metering-receiver-secret".into(),
            is_ca: false,
            dns_names: vec!["metering-receiver".into()],
            organization: vec!["IBM".into()],
            issuer_ref: IssuerRef {
                name: "cs-ca-clusterissuer".into(),
                kind: CLUSTER_ISSUER_KIND.into(),
            },
        };
        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(v["commonName"], "metering-receiver");
        assert_eq!(v["secretName"], "icp-metering-receiver-secret");
        assert_eq!(v["isCA"], false);
        assert_eq!(v["dnsNames"][0], "metering-receiver");
        assert_eq!(v["issuerRef"]["kind"], "ClusterIssuer");
    }
}
