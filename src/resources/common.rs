//! Common resource generation utilities.
//!
//! Provides the labels shared by every dependent and the owner reference that
//! ties a dependent's lifecycle to its MinecraftServer.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};

use crate::crd::MinecraftServer;

/// Label key selecting a server's pods.
pub const APP_LABEL: &str = "app";

/// Labels applied to every dependent at creation.
pub fn common_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}

/// Create a controller owner reference for a MinecraftServer.
///
/// The API server's garbage collector deletes every dependent carrying this
/// reference once the server is deleted.
pub fn owner_reference(server: &MinecraftServer) -> OwnerReference {
    OwnerReference {
        api_version: MinecraftServer::api_version(&()).to_string(),
        kind: MinecraftServer::kind(&()).to_string(),
        name: server.name_any(),
        uid: server.uid().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Attach `owner` to a dependent's metadata.
///
/// An existing reference with the same uid is replaced, so adopting twice
/// leaves a single reference.
pub fn adopt(meta: &mut ObjectMeta, owner: &OwnerReference) {
    let refs = meta.owner_references.get_or_insert_with(Vec::new);
    refs.retain(|r| r.uid != owner.uid);
    refs.push(owner.clone());
}

/// Object metadata for a dependent with the given labels.
pub fn dependent_metadata(
    name: &str,
    namespace: &str,
    labels: &BTreeMap<String, String>,
) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(labels.clone()),
        ..Default::default()
    }
}
