use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Capabilities, Container, ContainerPort, EnvVar, HTTPGetAction, Probe,
    ResourceRequirements, SecurityContext, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::mongodb::{self, password_volume_name, username_volume_name};
use crate::crd::MongoDbSpec;

/// Waits until every secret directory listed in `SECRET_DIR_LIST` is
/// populated, logging the matching entry of `SECRET_LIST` while it waits.
pub const SECRET_CHECK_CMD: &str = concat!(
    "set -- $SECRET_LIST; ",
    "for secretDirName in $SECRET_DIR_LIST; do",
    "  while true; do",
    "    echo `date`: Checking for secret $1;",
    "    ls /sec/$secretDirName/* && break;",
    "    echo `date`: Required secret $1 not found ... try again in 30s;",
    "    sleep 30;",
    "  done;",
    "  echo `date`: Secret $1 found;",
    "  shift; ",
    "done; ",
    "echo `date`: All required secrets exist"
);

const PULL_ALWAYS: &str = "Always";

/// Extra secrets, beyond the database ones, the secret-check container waits for.
#[derive(Clone, Debug, Default)]
pub struct SecretCheckExtra {
    pub names: Vec<String>,
    pub dirs: Vec<String>,
    pub volume_mounts: Vec<VolumeMount>,
}

pub(crate) fn env(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

fn mount(name: &str, path: String) -> VolumeMount {
    VolumeMount {
        name: name.to_string(),
        mount_path: path,
        ..Default::default()
    }
}

fn quantities(cpu: &str, memory: &str) -> BTreeMap<String, Quantity> {
    BTreeMap::from([
        ("cpu".to_string(), Quantity(cpu.to_string())),
        ("memory".to_string(), Quantity(memory.to_string())),
    ])
}

fn init_resources() -> ResourceRequirements {
    ResourceRequirements {
        limits: Some(quantities("100m", "100Mi")),
        requests: Some(quantities("100m", "100Mi")),
        ..Default::default()
    }
}

pub fn restricted_security_context() -> SecurityContext {
    SecurityContext {
        allow_privilege_escalation: Some(false),
        privileged: Some(false),
        read_only_root_filesystem: Some(true),
        run_as_non_root: Some(true),
        capabilities: Some(Capabilities {
            drop: Some(vec!["ALL".to_string()]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn secret_check_container(
    deployment_name: &str,
    image: &str,
    mongodb: &MongoDbSpec,
    extra: Option<&SecretCheckExtra>,
) -> Container {
    let user_dir = username_volume_name(mongodb);
    let pass_dir = password_volume_name(mongodb);

    let mut names = vec![
        mongodb.username_secret.clone(),
        mongodb.password_secret.clone(),
        mongodb.cluster_certs_secret.clone(),
        mongodb.client_certs_secret.clone(),
    ];
    let mut dirs = vec![
        user_dir.clone(),
        pass_dir.clone(),
        mongodb.cluster_certs_secret.clone(),
        mongodb.client_certs_secret.clone(),
    ];
    let mut volume_mounts = vec![
        mount(
            mongodb::CA_CERT_VOLUME,
            format!("/sec/{}", mongodb.cluster_certs_secret),
        ),
        mount(
            mongodb::CLIENT_CERT_VOLUME,
            format!("/sec/{}", mongodb.client_certs_secret),
        ),
        mount(&user_dir, format!("/sec/{}", user_dir)),
        mount(&pass_dir, format!("/sec/{}", pass_dir)),
    ];
    if let Some(extra) = extra {
        names.extend(extra.names.iter().cloned());
        dirs.extend(extra.dirs.iter().cloned());
        volume_mounts.extend(extra.volume_mounts.iter().cloned());
    }

    Container {
        name: format!("{}-secret-check", deployment_name),
        image: Some(image.to_string()),
        image_pull_policy: Some(PULL_ALWAYS.to_string()),
        command: Some(vec![
            "sh".to_string(),
            "-c".to_string(),
            SECRET_CHECK_CMD.to_string(),
        ]),
        env: Some(vec![
            env("SECRET_LIST", &names.join(" ")),
            env("SECRET_DIR_LIST", &dirs.join(" ")),
        ]),
        volume_mounts: Some(volume_mounts),
        resources: Some(init_resources()),
        security_context: Some(restricted_security_context()),
        ..Default::default()
    }
}

/// Init container that blocks until the database is reachable.
pub fn init_container(
    deployment_name: &str,
    image: &str,
    env: Vec<EnvVar>,
) -> Container {
    Container {
        name: format!("{}-init", deployment_name),
        image: Some(image.to_string()),
        image_pull_policy: Some(PULL_ALWAYS.to_string()),
        command: Some(vec![
            "node".to_string(),
            "/datamanager/lib/metering_init.js".to_string(),
            "verifyOnlyMongo".to_string(),
        ]),
        env: Some(env),
        volume_mounts: Some(mongodb::cert_mounts()),
        resources: Some(init_resources()),
        security_context: Some(restricted_security_context()),
        ..Default::default()
    }
}

fn http_probe(
    path: &str,
    initial_delay: i32,
    timeout: i32,
    period: i32,
) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(path.to_string()),
            port: IntOrString::Int(3000),
            scheme: Some("HTTP".to_string()),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay),
        timeout_seconds: Some(timeout),
        period_seconds: Some(period),
        success_threshold: Some(1),
        failure_threshold: Some(3),
        ..Default::default()
    }
}

/// Data-manager features that stay off in a receiver-only deployment.
const DISABLED_FEATURES: &[&str] = &[
    "METERING_API_ENABLED",
    "HC_DM_USE_HTTPS",
    "HC_DM_MCM_SENDER_ENABLED",
    "HC_DM_STORAGEREADER_ENABLED",
    "HC_DM_REPORTER2_ENABLED",
    "HC_DM_PURGER2_ENABLED",
    "HC_DM_PREAGGREGATOR_ENABLED",
    "HC_DM_METRICS_ENABLED",
    "HC_DM_SELFMETER_PURGER_ENABLED",
];

/// Main receiver container; `env` and `volume_mounts` are appended after the
/// built-in feature switches and log-level mount.
pub fn receiver_container(
    name: &str,
    image: &str,
    env: Vec<EnvVar>,
    volume_mounts: Vec<VolumeMount>,
) -> Container {
    let mut all_env: Vec<EnvVar> = DISABLED_FEATURES
        .iter()
        .map(|n| self::env(n, "false"))
        .collect();
    all_env.extend(env);

    let mut all_mounts =
        vec![mount("loglevel", "/etc/config".to_string())];
    all_mounts.extend(volume_mounts);

    Container {
        name: name.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some(PULL_ALWAYS.to_string()),
        env: Some(all_env),
        volume_mounts: Some(all_mounts),
        ports: Some(vec![
            ContainerPort {
                container_port: 3000,
                ..Default::default()
            },
            ContainerPort {
                container_port: 5000,
                ..Default::default()
            },
        ]),
        liveness_probe: Some(http_probe("/livenessProbe", 305, 5, 300)),
        readiness_probe: Some(http_probe("/readinessProbe", 15, 15, 30)),
        resources: Some(ResourceRequirements {
            limits: Some(quantities("1000m", "2560Mi")),
            requests: Some(quantities("100m", "256Mi")),
            ..Default::default()
        }),
        security_context: Some(restricted_security_context()),
        ..Default::default()
    }
}
