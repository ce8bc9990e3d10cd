use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Affinity, NodeAffinity, NodeSelector, NodeSelectorRequirement,
    NodeSelectorTerm, PodSpec, PodTemplateSpec, Service, ServicePort,
    ServiceSpec, Toleration, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::ReceiverContext;
use super::certificate::{
    RECEIVER_CERT_DIR, RECEIVER_CERT_VOLUME, RECEIVER_CERTIFICATE,
};
use super::containers::{
    SecretCheckExtra, env, init_container, receiver_container,
    secret_check_container,
};
use super::labels::{metadata_labels, pod_annotations, pod_labels};
use super::mongodb::{cert_mounts, secret_volume};

pub const RECEIVER_PORT: i32 = 5000;
const ARCHITECTURES: &[&str] = &["amd64", "ppc64le", "s390x"];

fn receiver_cert_mount(root: &str) -> VolumeMount {
    VolumeMount {
        name: RECEIVER_CERT_VOLUME.to_string(),
        mount_path: format!("/{}/{}", root, RECEIVER_CERT_DIR),
        ..Default::default()
    }
}

fn receiver_ssl_env() -> Vec<k8s_openapi::api::core::v1::EnvVar> {
    let dir = format!("/certs/{}", RECEIVER_CERT_DIR);
    vec![
        env("HC_RECEIVER_SSL_CA", &format!("{}/ca.crt", dir)),
        env("HC_RECEIVER_SSL_CERT", &format!("{}/tls.crt", dir)),
        env("HC_RECEIVER_SSL_KEY", &format!("{}/tls.key", dir)),
    ]
}

fn arch_affinity() -> Affinity {
    Affinity {
        node_affinity: Some(NodeAffinity {
            required_during_scheduling_ignored_during_execution: Some(
                NodeSelector {
                    node_selector_terms: vec![NodeSelectorTerm {
                        match_expressions: Some(vec![NodeSelectorRequirement {
                            key: "kubernetes.io/arch".to_string(),
                            operator: "In".to_string(),
                            values: Some(
                                ARCHITECTURES
                                    .iter()
                                    .map(|a| a.to_string())
                                    .collect(),
                            ),
                        }]),
                        ..Default::default()
                    }],
                },
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn tolerations() -> Vec<Toleration> {
    vec![
        Toleration {
            key: Some("dedicated".to_string()),
            operator: Some("Exists".to_string()),
            effect: Some("NoSchedule".to_string()),
            ..Default::default()
        },
        Toleration {
            key: Some("CriticalAddonsOnly".to_string()),
            operator: Some("Exists".to_string()),
            ..Default::default()
        },
    ]
}

/// Render the receiver Deployment. Owner references are left empty.
pub fn render_deployment(ctx: &ReceiverContext<'_>) -> Deployment {
    let app = super::RECEIVER_NAME;
    let mongodb = &ctx.spec.mongodb;

    let secret_check = secret_check_container(
        app,
        &ctx.image,
        mongodb,
        Some(&SecretCheckExtra {
            names: vec![RECEIVER_CERTIFICATE.secret.to_string()],
            dirs: vec![RECEIVER_CERT_DIR.to_string()],
            volume_mounts: vec![receiver_cert_mount("sec")],
        }),
    );

    let mut init_env = vec![env("MCM_VERBOSE", "true")];
    init_env.extend(ctx.common_env());
    let init = init_container(app, &ctx.image, init_env);

    let mut main_env = vec![env("HC_DM_MCM_RECEIVER_ENABLED", "true")];
    main_env.extend(receiver_ssl_env());
    main_env.extend(ctx.common_env());
    let mut main_mounts = vec![receiver_cert_mount("certs")];
    main_mounts.extend(cert_mounts());
    let main = receiver_container(app, &ctx.image, main_env, main_mounts);

    let mut volumes = ctx.volumes.clone();
    volumes.push(secret_volume(
        RECEIVER_CERT_VOLUME,
        RECEIVER_CERTIFICATE.secret,
    ));

    Deployment {
        metadata: ObjectMeta {
            name: Some(app.to_string()),
            namespace: Some(ctx.namespace.to_string()),
            labels: Some(metadata_labels(app)),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(ctx.selector.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels(app, ctx.name)),
                    annotations: Some(pod_annotations()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(
                        ctx.service_account.to_string(),
                    ),
                    host_network: Some(false),
                    host_pid: Some(false),
                    host_ipc: Some(false),
                    termination_grace_period_seconds: Some(60),
                    affinity: Some(arch_affinity()),
                    tolerations: Some(tolerations()),
                    volumes: Some(volumes),
                    init_containers: Some(vec![secret_check, init]),
                    containers: vec![main],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Render the ClusterIP Service in front of the receiver pods.
pub fn render_service(ctx: &ReceiverContext<'_>) -> Service {
    let app = super::RECEIVER_NAME;
    Service {
        metadata: ObjectMeta {
            name: Some(app.to_string()),
            namespace: Some(ctx.namespace.to_string()),
            labels: Some(metadata_labels(app)),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(ctx.selector.clone()),
            ports: Some(vec![ServicePort {
                name: Some(app.to_string()),
                protocol: Some("TCP".to_string()),
                port: RECEIVER_PORT,
                target_port: Some(IntOrString::Int(RECEIVER_PORT)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
