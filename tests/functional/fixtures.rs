//! Shared fixtures for functional tests.

use std::collections::BTreeMap;

use minecraft_operator::controller::dependents::ParentRef;
use minecraft_operator::crd::{MinecraftServer, MinecraftServerSpec, ServerConfigSpec, StorageSpec};
use minecraft_operator::resources::secret::RCON_PASSWORD_KEY;
use minecraft_operator::resources::{DependentKind, DependentManifest, common_labels, owner_reference};
use minecraft_operator::store::MemoryStore;

pub const NAME: &str = "mc1";
pub const NAMESPACE: &str = "games";
pub const UID: &str = "7f1c2a6e-0000-4000-8000-000000000001";

/// The spec of the end-to-end scenario.
pub fn mc1_spec() -> MinecraftServerSpec {
    MinecraftServerSpec {
        storage: Some(StorageSpec {
            size: Some("10Gi".to_string()),
            class: Some("standard".to_string()),
        }),
        server_config: Some(ServerConfigSpec {
            motd: Some("Hi".to_string()),
            name: Some("mc1".to_string()),
            memory: Some("1G".to_string()),
            max_memory: Some("2G".to_string()),
            max_players: Some(20),
            server_type: Some("VANILLA".to_string()),
            ..Default::default()
        }),
        storage_size: None,
    }
}

/// A stored server object as the controller would receive it.
pub fn mc1_server(spec: MinecraftServerSpec, generation: i64) -> MinecraftServer {
    let mut server = MinecraftServer::new(NAME, spec);
    server.metadata.namespace = Some(NAMESPACE.to_string());
    server.metadata.uid = Some(UID.to_string());
    server.metadata.generation = Some(generation);
    server
}

pub fn set_labels(server: &mut MinecraftServer, labels: &[(&str, &str)]) {
    server.metadata.labels = Some(
        labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );
}

pub fn mc1_parent() -> ParentRef {
    let server = mc1_server(mc1_spec(), 1);
    ParentRef {
        name: NAME.to_string(),
        namespace: NAMESPACE.to_string(),
        labels: common_labels(NAME),
        owner: owner_reference(&server),
    }
}

/// Labels of the stored dependent of `kind`.
pub fn labels_of(store: &MemoryStore, kind: DependentKind) -> BTreeMap<String, String> {
    store.labels(kind, NAMESPACE, &kind.dependent_name(NAME))
}

/// The RCON password held by the stored secret.
pub fn stored_password(store: &MemoryStore) -> String {
    let name = DependentKind::Secret.dependent_name(NAME);
    match store.get(DependentKind::Secret, NAMESPACE, &name) {
        Some(DependentManifest::Secret(secret)) => secret
            .string_data
            .and_then(|data| data.get(RCON_PASSWORD_KEY).cloned())
            .expect("secret carries RCON_PASSWORD"),
        other => panic!("expected stored secret, got {other:?}"),
    }
}

/// Storage request of the stored volume claim.
pub fn stored_storage_request(store: &MemoryStore) -> Option<String> {
    let name = DependentKind::VolumeClaim.dependent_name(NAME);
    match store.get(DependentKind::VolumeClaim, NAMESPACE, &name) {
        Some(DependentManifest::VolumeClaim(pvc)) => pvc
            .spec
            .and_then(|s| s.resources)
            .and_then(|r| r.requests)
            .and_then(|r| r.get("storage").map(|q| q.0.clone())),
        _ => None,
    }
}
