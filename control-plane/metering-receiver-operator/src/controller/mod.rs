pub mod converge;
pub mod managed;
pub mod owner;
pub mod reconcile;
pub mod status;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service};
use kube::{
    Client, Discovery, Resource, ResourceExt,
    api::Api,
    runtime::{Controller, controller::Action, watcher::Config},
};
use tracing::{error, info, warn};

use crate::config::OperatorConfig;
use crate::crd::{CERT_MANAGER_GROUP, Certificate, MeteringReceiver};

pub use managed::{ManagedKind, ManagedResource};
pub use reconcile::{ReconcileOutcome, ReconcileSettings, Reconciler};
pub use store::{ClusterStore, KubeStore};

#[derive(thiserror::Error, Debug)]
pub enum ReconcileErr {
    #[error("kube error: {0}")]
    Kube(#[from] kube::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("cannot set owner of {kind} {name}: {reason}")]
    Ownership {
        kind: ManagedKind,
        name: String,
        reason: String,
    },
    #[error("refusing to create {kind} {name} without a controller owner")]
    MissingOwner { kind: ManagedKind, name: String },
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
}

pub struct ControllerContext {
    pub reconciler: Reconciler<KubeStore>,
    pub error_requeue: Duration,
}

pub async fn run_controller(
    client: Client,
    cfg: OperatorConfig,
) -> anyhow::Result<()> {
    let watch_ns = cfg.watch_namespace();
    match watch_ns {
        Some(ns) => info!(%ns, "watching MeteringReceivers in namespace"),
        None => info!("watching MeteringReceivers in all namespaces"),
    }

    let receivers: Api<MeteringReceiver> = scoped_api(client.clone(), watch_ns);
    let mut controller = Controller::new(receivers, Config::default())
        .owns(scoped_api::<Deployment>(client.clone(), watch_ns), Config::default())
        .owns(scoped_api::<Service>(client.clone(), watch_ns), Config::default());

    // cert-manager is optional: without it the Certificate create fails and is
    // retried, but the controller itself still runs.
    if certificates_installed(&client).await {
        controller = controller.owns(
            scoped_api::<Certificate>(client.clone(), watch_ns),
            Config::default(),
        );
    } else {
        warn!(
            group = CERT_MANAGER_GROUP,
            "certificate API not served; not watching Certificates"
        );
    }

    let ctx = Arc::new(ControllerContext {
        reconciler: Reconciler::new(
            KubeStore::new(client),
            ReconcileSettings::from(&cfg),
        ),
        error_requeue: cfg.error_requeue(),
    });

    controller
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj_ref, action)) => {
                    info!(name = %obj_ref.name, ns = ?obj_ref.namespace, "reconciled: requeue={:?}", action)
                }
                Err(e) => error!(error = ?e, "reconcile error"),
            }
        })
        .await;

    info!("controller stopped");
    Ok(())
}

fn scoped_api<K>(client: Client, ns: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    match ns {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

async fn certificates_installed(client: &Client) -> bool {
    match Discovery::new(client.clone())
        .filter(&[CERT_MANAGER_GROUP])
        .run()
        .await
    {
        Ok(discovery) => discovery.has_group(CERT_MANAGER_GROUP),
        Err(e) => {
            warn!(error = %e, "api discovery failed");
            false
        }
    }
}

async fn reconcile(
    obj: Arc<MeteringReceiver>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcileErr> {
    let (ns, name) = reconcile::object_key(&obj)?;
    let outcome = ctx.reconciler.reconcile(&ns, &name).await?;
    Ok(outcome.into_action())
}

fn error_policy(
    obj: Arc<MeteringReceiver>,
    err: &ReconcileErr,
    ctx: Arc<ControllerContext>,
) -> Action {
    warn!(
        ns = ?obj.namespace(),
        name = %obj.name_any(),
        error = %err,
        "reconcile failed; retrying in {:?}",
        ctx.error_requeue
    );
    Action::requeue(ctx.error_requeue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_child() {
        let err = ReconcileErr::Ownership {
            kind: ManagedKind::Deployment,
            name: "metering-receiver".into(),
            reason: "already controlled by MeteringReceiver other".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot set owner of Deployment metering-receiver: already controlled by MeteringReceiver other"
        );

        let err = ReconcileErr::MissingOwner {
            kind: ManagedKind::Certificate,
            name: "icp-metering-receiver-ca-cert".into(),
        };
        assert!(err.to_string().contains("Certificate icp-metering-receiver-ca-cert"));
    }
}
