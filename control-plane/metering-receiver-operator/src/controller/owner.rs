use kube::{Resource, ResourceExt};
use tracing::debug;

use super::ReconcileErr;
use super::managed::ManagedResource;
use crate::crd::MeteringReceiver;

/// Mark `owner` as the controlling owner of `child`.
///
/// The reference lets the garbage collector delete the child together with
/// its MeteringReceiver and lets the controller map child events back to the
/// owner. A child may have only one controller: binding to a second owner is
/// an error, binding the same owner again is a no-op.
pub fn bind_owner(
    owner: &MeteringReceiver,
    child: &mut ManagedResource,
) -> Result<(), ReconcileErr> {
    let kind = child.kind();
    let child_name = child.name().unwrap_or_default().to_string();
    let mut oref = owner.controller_owner_ref(&()).ok_or_else(|| {
        ReconcileErr::Ownership {
            kind,
            name: child_name.clone(),
            reason: format!("owner {} has no uid yet", owner.name_any()),
        }
    })?;
    // Foreground deletion of the receiver waits for its children.
    oref.block_owner_deletion = Some(true);

    if let Some(existing) = child.controller_owner() {
        if existing.uid != oref.uid {
            return Err(ReconcileErr::Ownership {
                kind,
                name: child_name,
                reason: format!(
                    "already controlled by {} {}",
                    existing.kind, existing.name
                ),
            });
        }
    }

    let refs = child.meta_mut().owner_references.get_or_insert_with(Vec::new);
    refs.retain(|r| r.uid != oref.uid);
    refs.push(oref);
    debug!(%kind, name = %child_name, owner = %owner.name_any(), "bound controller owner");
    Ok(())
}
