//! Database wiring shared by every receiver container.
//!
//! Everything here is derived from one MeteringReceiver's `spec.mongodb` and
//! rebuilt on each reconcile, so two receivers with different databases never
//! see each other's settings.

use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, EnvVar, EnvVarSource, KeyToPath, SecretKeySelector,
    SecretVolumeSource, Volume, VolumeMount,
};

use crate::crd::MongoDbSpec;

pub const CA_CERT_VOLUME: &str = "mongodb-ca-cert";
pub const CLIENT_CERT_VOLUME: &str = "mongodb-client-cert";
pub const LOGGING_CONFIG_MAP: &str = "metering-logging-configuration";
/// File mode 0644 for projected secrets and config maps.
pub const DEFAULT_MODE: i32 = 420;

pub fn username_volume_name(mongodb: &MongoDbSpec) -> String {
    format!("muser-{}", mongodb.username_secret)
}

pub fn password_volume_name(mongodb: &MongoDbSpec) -> String {
    format!("mpass-{}", mongodb.password_secret)
}

fn plain(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        ..Default::default()
    }
}

fn from_secret(name: &str, secret: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret.to_string(),
                key: key.to_string(),
                optional: Some(true),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn env_vars(mongodb: &MongoDbSpec) -> Vec<EnvVar> {
    vec![
        plain("HC_MONGO_HOST", mongodb.host.as_str()),
        plain("HC_MONGO_PORT", mongodb.port.to_string()),
        from_secret(
            "HC_MONGO_USER",
            &mongodb.username_secret,
            &mongodb.username_key,
        ),
        from_secret(
            "HC_MONGO_PASS",
            &mongodb.password_secret,
            &mongodb.password_key,
        ),
        plain("HC_MONGO_ISSSL", "true"),
        plain("HC_MONGO_SSL_CA", "/certs/mongodb-ca/tls.crt"),
        plain("HC_MONGO_SSL_CERT", "/certs/mongodb-client/tls.crt"),
        plain("HC_MONGO_SSL_KEY", "/certs/mongodb-client/tls.key"),
    ]
}

pub(crate) fn secret_volume(name: &str, secret: &str) -> Volume {
    Volume {
        name: name.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret.to_string()),
            default_mode: Some(DEFAULT_MODE),
            optional: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Volumes every receiver pod mounts: database certificates, database
/// credentials, and the `<prefix>-<loglevel_type>.json` logging config.
pub fn common_volumes(
    mongodb: &MongoDbSpec,
    loglevel_prefix: &str,
    loglevel_type: &str,
) -> Vec<Volume> {
    vec![
        secret_volume(CA_CERT_VOLUME, &mongodb.cluster_certs_secret),
        secret_volume(CLIENT_CERT_VOLUME, &mongodb.client_certs_secret),
        secret_volume(&username_volume_name(mongodb), &mongodb.username_secret),
        secret_volume(&password_volume_name(mongodb), &mongodb.password_secret),
        Volume {
            name: loglevel_type.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: LOGGING_CONFIG_MAP.to_string(),
                items: Some(vec![KeyToPath {
                    key: format!("{}-{}.json", loglevel_prefix, loglevel_type),
                    path: format!("{}.json", loglevel_type),
                    ..Default::default()
                }]),
                default_mode: Some(DEFAULT_MODE),
                optional: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        },
    ]
}

/// Certificate mounts used by both the init and main containers.
pub fn cert_mounts() -> Vec<VolumeMount> {
    vec![
        VolumeMount {
            name: CA_CERT_VOLUME.to_string(),
            mount_path: "/certs/mongodb-ca".to_string(),
            ..Default::default()
        },
        VolumeMount {
            name: CLIENT_CERT_VOLUME.to_string(),
            mount_path: "/certs/mongodb-client".to_string(),
            ..Default::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mongodb() -> MongoDbSpec {
        MongoDbSpec {
            host: "mongodb.ns1".into(),
            port: 27017,
            username_secret: "icp-mongodb-admin".into(),
            username_key: "user".into(),
            password_secret: "icp-mongodb-admin".into(),
            password_key: "password".into(),
            cluster_certs_secret: "mongodb-root-ca-cert".into(),
            client_certs_secret: "icp-mongodb-client-cert".into(),
        }
    }

    fn value_of<'a>(env: &'a [EnvVar], name: &str) -> Option<&'a str> {
        env.iter()
            .find(|e| e.name == name)
            .and_then(|e| e.value.as_deref())
    }

    #[test]
    fn env_vars_reflect_spec() {
        let env = env_vars(&mongodb());
        assert_eq!(value_of(&env, "HC_MONGO_HOST"), Some("mongodb.ns1"));
        assert_eq!(value_of(&env, "HC_MONGO_PORT"), Some("27017"));

        let user = env.iter().find(|e| e.name == "HC_MONGO_USER").unwrap();
        let sel = user
            .value_from
            .as_ref()
            .and_then(|v| v.secret_key_ref.as_ref())
            .unwrap();
        assert_eq!(sel.name, "icp-mongodb-admin");
        assert_eq!(sel.key, "user");
        assert_eq!(sel.optional, Some(true));
    }

    #[test]
    fn common_volumes_reference_spec_secrets() {
        let vols = common_volumes(&mongodb(), "metering-receiver", "loglevel");
        let names: Vec<_> = vols.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "mongodb-ca-cert",
                "mongodb-client-cert",
                "muser-icp-mongodb-admin",
                "mpass-icp-mongodb-admin",
                "loglevel",
            ]
        );
        let ca = vols[0].secret.as_ref().unwrap();
        assert_eq!(ca.secret_name.as_deref(), Some("mongodb-root-ca-cert"));

        let cm = vols[4].config_map.as_ref().unwrap();
        let item = &cm.items.as_ref().unwrap()[0];
        assert_eq!(item.key, "metering-receiver-loglevel.json");
        assert_eq!(item.path, "loglevel.json");
    }
}
