use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::{debug, info, instrument, trace};

use super::ReconcileErr;
use super::store::ClusterStore;
use crate::crd::{MeteringReceiver, MeteringReceiverStatus};

/// Pod names in listing order, or the `["none"]` placeholder when empty.
pub fn pod_names(pods: &[Pod]) -> Vec<String> {
    let names: Vec<String> =
        pods.iter().filter_map(|p| p.metadata.name.clone()).collect();
    if names.is_empty() {
        MeteringReceiverStatus::no_pods().pod_names
    } else {
        names
    }
}

/// Give a receiver seen for the first time the placeholder status, so a
/// partially reconciled object never shows an empty pod list. Returns the
/// receiver as stored, so later writes in the pass carry the current
/// resourceVersion.
#[instrument(skip_all, fields(name = %receiver.name_any()))]
pub async fn initialize_status<S>(
    store: &S,
    mut receiver: MeteringReceiver,
) -> Result<MeteringReceiver, ReconcileErr>
where
    S: ClusterStore + ?Sized,
{
    if !receiver.pod_names().is_empty() {
        return Ok(receiver);
    }
    info!("setting default status");
    receiver.status = Some(MeteringReceiverStatus::no_pods());
    store.update_receiver_status(&receiver).await
}

/// Publish the names of the pods matching `selector` into the receiver's
/// status. Returns whether a write happened; identical lists are not written
/// so the status update does not trigger another reconcile.
#[instrument(skip_all, fields(name = %receiver.name_any()))]
pub async fn sync_status<S>(
    store: &S,
    receiver: &MeteringReceiver,
    selector: &BTreeMap<String, String>,
) -> Result<bool, ReconcileErr>
where
    S: ClusterStore + ?Sized,
{
    let ns = receiver
        .namespace()
        .ok_or(ReconcileErr::MissingField("metadata.namespace"))?;
    let pods = store.list_pods(&ns, selector).await?;
    let names = pod_names(&pods);
    trace!(pods = ?names, "listed receiver pods");

    if receiver.pod_names() == names.as_slice() {
        debug!("pod names unchanged; skipping status update");
        return Ok(false);
    }

    let mut updated = receiver.clone();
    updated.status = Some(MeteringReceiverStatus { pod_names: names });
    info!(pods = ?updated.pod_names(), "updating status");
    store.update_receiver_status(&updated).await?;
    Ok(true)
}
