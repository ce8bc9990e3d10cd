use kube::api::ObjectMeta;

use super::labels::certificate_labels;
use crate::crd::certificate::{
    CLUSTER_ISSUER_KIND, Certificate, CertificateSpec, IssuerRef,
};

pub const DEFAULT_CLUSTER_ISSUER: &str = "cs-ca-clusterissuer";
const ORGANIZATION: &str = "IBM";

/// One logical certificate the operator requests on behalf of a receiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CertificateRole {
    pub name: &'static str,
    pub secret: &'static str,
    pub common_name: &'static str,
    pub app: &'static str,
    pub component: &'static str,
}

pub const RECEIVER_CERT_DIR: &str = "metering-receiver";
pub const RECEIVER_CERT_VOLUME: &str = "icp-metering-receiver-certs";

pub const RECEIVER_CERTIFICATE: CertificateRole = CertificateRole {
    name: "icp-metering-receiver-ca-cert",
    secret: "icp-metering-receiver-secret",
    common_name: "metering-receiver",
    app: super::RECEIVER_NAME,
    component: "metering-receiver",
};

pub fn certificate_roles() -> &'static [CertificateRole] {
    &[RECEIVER_CERTIFICATE]
}

/// In-cluster DNS names a service named `common_name` answers to.
pub fn dns_names(common_name: &str, namespace: &str) -> Vec<String> {
    vec![
        common_name.to_string(),
        format!("{}.{}", common_name, namespace),
        format!("{}.{}.svc.cluster.local", common_name, namespace),
    ]
}

pub fn resolve_issuer(issuer_override: Option<&str>) -> &str {
    match issuer_override {
        Some(issuer) if !issuer.is_empty() => issuer,
        _ => DEFAULT_CLUSTER_ISSUER,
    }
}

/// Build the Certificate for `role`. The caller still has to bind the owner.
pub fn build_certificate(
    namespace: &str,
    issuer_override: Option<&str>,
    role: &CertificateRole,
) -> Certificate {
    let issuer = resolve_issuer(issuer_override);
    tracing::debug!(certificate = role.name, %issuer, "resolved cluster issuer");

    let mut cert = Certificate::new(
        role.name,
        CertificateSpec {
            common_name: role.common_name.to_string(),
            secret_name: role.secret.to_string(),
            is_ca: false,
            dns_names: dns_names(role.common_name, namespace),
            organization: vec![ORGANIZATION.to_string()],
            issuer_ref: IssuerRef {
                name: issuer.to_string(),
                kind: CLUSTER_ISSUER_KIND.to_string(),
            },
        },
    );
    cert.metadata = ObjectMeta {
        name: Some(role.name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(certificate_labels(role.app, role.component)),
        ..Default::default()
    };
    cert
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dns_names_for_receiver_in_ns1() {
        assert_eq!(
            dns_names("metering-receiver", "ns1"),
            vec![
                "metering-receiver",
                "metering-receiver.ns1",
                "metering-receiver.ns1.svc.cluster.local",
            ]
        );
    }

    #[test]
    fn empty_issuer_falls_back_to_default() {
        assert_eq!(resolve_issuer(None), DEFAULT_CLUSTER_ISSUER);
        assert_eq!(resolve_issuer(Some("")), DEFAULT_CLUSTER_ISSUER);
        assert_eq!(resolve_issuer(Some("my-issuer")), "my-issuer");
    }

    #[test]
    fn receiver_certificate_shape() {
        let cert = build_certificate("ns1", Some("custom"), &RECEIVER_CERTIFICATE);
        assert_eq!(
            cert.metadata.name.as_deref(),
            Some("icp-metering-receiver-ca-cert")
        );
        assert_eq!(cert.metadata.namespace.as_deref(), Some("ns1"));
        assert_eq!(cert.spec.secret_name, "icp-metering-receiver-secret");
        assert_eq!(cert.spec.common_name, "metering-receiver");
        assert_eq!(cert.spec.issuer_ref.name, "custom");
        assert_eq!(cert.spec.issuer_ref.kind, "ClusterIssuer");
        assert!(!cert.spec.is_ca);
        assert_eq!(cert.spec.dns_names.len(), 3);
        assert!(cert.metadata.owner_references.is_none());
        let labels = cert.metadata.labels.unwrap();
        assert_eq!(labels.get("release").map(String::as_str), Some("metering"));
    }
}
