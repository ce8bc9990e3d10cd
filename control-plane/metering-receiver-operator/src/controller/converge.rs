use tracing::{debug, info, instrument};

use super::ReconcileErr;
use super::managed::ManagedResource;
use super::store::ClusterStore;

/// Result of converging one child object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convergence {
    /// The object was missing and has been created.
    Created,
    /// An object with the same kind, namespace and name already exists.
    /// Its spec is not compared; drift is left alone.
    Present,
}

impl Convergence {
    pub fn created(self) -> bool {
        matches!(self, Convergence::Created)
    }
}

/// Create `desired` unless an object of the same kind/namespace/name exists.
///
/// `desired` must be fully rendered and already carry its controller owner
/// reference; unowned objects are refused so nothing is ever created that the
/// garbage collector could not reclaim.
#[instrument(skip_all, fields(kind = %desired.kind(), resource = desired.name().unwrap_or_default()))]
pub async fn converge<S>(
    store: &S,
    desired: &ManagedResource,
) -> Result<Convergence, ReconcileErr>
where
    S: ClusterStore + ?Sized,
{
    let kind = desired.kind();
    let name = desired
        .name()
        .ok_or(ReconcileErr::MissingField("metadata.name"))?;
    let ns = desired
        .namespace()
        .ok_or(ReconcileErr::MissingField("metadata.namespace"))?;
    if desired.controller_owner().is_none() {
        return Err(ReconcileErr::MissingOwner {
            kind,
            name: name.to_string(),
        });
    }

    match store.get_managed(kind, ns, name).await? {
        Some(_) => {
            debug!(%ns, "already exists; leaving as is");
            Ok(Convergence::Present)
        }
        None => {
            info!(%ns, "creating");
            store.create_managed(desired).await?;
            Ok(Convergence::Created)
        }
    }
}
