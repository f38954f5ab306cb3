//! PersistentVolumeClaim generation for server world data.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::crd::StorageSpec;
use crate::resources::common::dependent_metadata;

/// Access mode used when none is requested.
pub const DEFAULT_ACCESS_MODE: &str = "ReadWriteOnce";

/// Generate the data PVC from the storage spec.
pub fn generate_volume_claim(
    storage: &StorageSpec,
    name: &str,
    namespace: &str,
    labels: &BTreeMap<String, String>,
) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: dependent_metadata(name, namespace, labels),
        spec: Some(PersistentVolumeClaimSpec {
            storage_class_name: storage.class.clone(),
            access_modes: Some(vec![DEFAULT_ACCESS_MODE.to_string()]),
            resources: storage.size.as_ref().map(|size| VolumeResourceRequirements {
                requests: Some(storage_request(size)),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Resource requests map holding only the storage size.
pub fn storage_request(size: &str) -> BTreeMap<String, Quantity> {
    BTreeMap::from([("storage".to_string(), Quantity(size.to_string()))])
}
