use std::time::Duration;

use kube::ResourceExt;
use kube::runtime::controller::Action;
use tracing::{debug, info, instrument};

use super::ReconcileErr;
use super::converge::converge;
use super::managed::ManagedResource;
use super::owner::bind_owner;
use super::status::{initialize_status, sync_status};
use super::store::ClusterStore;
use crate::config::{OperandConfig, OperatorConfig};
use crate::crd::MeteringReceiver;
use crate::templates::{ReceiverContext, render_deployment, render_service};

/// Knobs a reconcile pass reads; everything else is derived from the
/// MeteringReceiver being reconciled.
#[derive(Clone, Debug, Default)]
pub struct ReconcileSettings {
    pub settle_delay: Duration,
    pub operand: OperandConfig,
}

impl From<&OperatorConfig> for ReconcileSettings {
    fn from(cfg: &OperatorConfig) -> Self {
        Self {
            settle_delay: cfg.settle_delay(),
            operand: cfg.operand.clone(),
        }
    }
}

/// What the dispatcher should do after a successful pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub requeue: bool,
}

impl ReconcileOutcome {
    pub fn done() -> Self {
        Self { requeue: false }
    }

    pub fn requeue() -> Self {
        Self { requeue: true }
    }

    /// The settle delay has already elapsed inside the pass, so a requeue is
    /// immediate.
    pub fn into_action(self) -> Action {
        if self.requeue {
            Action::requeue(Duration::ZERO)
        } else {
            Action::await_change()
        }
    }
}

/// Drives one MeteringReceiver towards its desired children.
///
/// Holds no state between passes: every rendered object is computed from the
/// receiver fetched at the start of the pass, so passes for different
/// receivers can run concurrently.
pub struct Reconciler<S> {
    store: S,
    settings: ReconcileSettings,
}

impl<S: ClusterStore> Reconciler<S> {
    pub fn new(store: S, settings: ReconcileSettings) -> Self {
        Self { store, settings }
    }

    #[instrument(skip(self))]
    pub async fn reconcile(
        &self,
        ns: &str,
        name: &str,
    ) -> Result<ReconcileOutcome, ReconcileErr> {
        let Some(receiver) = self.store.get_receiver(ns, name).await? else {
            debug!("MeteringReceiver not found; children are garbage collected");
            return Ok(ReconcileOutcome::done());
        };
        let receiver = initialize_status(&self.store, receiver).await?;

        let ctx = ReceiverContext::new(
            name,
            ns,
            &receiver.spec,
            &self.settings.operand,
        );

        let mut desired: Vec<ManagedResource> = vec![
            render_service(&ctx).into(),
            render_deployment(&ctx).into(),
        ];
        desired.extend(ctx.certificates().into_iter().map(ManagedResource::from));

        let mut created = false;
        for mut child in desired {
            bind_owner(&receiver, &mut child)?;
            created |= converge(&self.store, &child).await?.created();
        }

        if created {
            info!(delay = ?self.settings.settle_delay, "created children; requeueing after settle delay");
            self.settle().await;
            return Ok(ReconcileOutcome::requeue());
        }

        sync_status(&self.store, &receiver, &ctx.selector).await?;
        self.settle().await;
        Ok(ReconcileOutcome::done())
    }

    async fn settle(&self) {
        if !self.settings.settle_delay.is_zero() {
            tokio::time::sleep(self.settings.settle_delay).await;
        }
    }
}

/// Namespace and name of a watched receiver.
pub fn object_key(obj: &MeteringReceiver) -> Result<(String, String), ReconcileErr> {
    let ns = obj
        .namespace()
        .ok_or(ReconcileErr::MissingField("metadata.namespace"))?;
    Ok((ns, obj.name_any()))
}
