//! Spec update handling.
//!
//! Only the storage request of the recorded volume claim follows spec
//! changes; the other dependents are left as created.

use tracing::info;

use crate::controller::error::{Error, Result};
use crate::crd::{DependentNames, MinecraftServerSpec};
use crate::resources::DependentKind;
use crate::store::ResourceStore;

/// Patch the recorded PVC to request `spec.storageSize`.
///
/// Only a missing `storageSize` is permanent. Store failures are retried.
pub async fn update_storage(
    store: &dyn ResourceStore,
    spec: &MinecraftServerSpec,
    prior: &DependentNames,
    namespace: &str,
) -> Result<()> {
    let size = match spec.storage_size.as_deref() {
        Some(size) if !size.is_empty() => size,
        other => {
            let value = other.map(|s| serde_json::Value::String(s.to_string()));
            return Err(Error::missing_field("storageSize", value.as_ref()));
        }
    };

    store
        .patch_storage_request(namespace, &prior.data_pvc_name, size)
        .await
        .map_err(|e| Error::store("patch", DependentKind::VolumeClaim, &prior.data_pvc_name, e))?;
    info!(
        name = %prior.data_pvc_name,
        namespace = %namespace,
        size = %size,
        "Updated storage request"
    );
    Ok(())
}
