//! Multi-pass scenarios driven through the event source.
//!
//! Each pass classifies the server with [`StatusEventSource`], runs the
//! handlers against the store and writes the resulting status back onto the
//! server, as the controller does through the status subresource.

use minecraft_operator::controller::dependents::reconcile_dependents;
use minecraft_operator::controller::events::{EventSource, ServerEvent, StatusEventSource};
use minecraft_operator::controller::server_reconciler::{PassOutcome, run_handlers};
use minecraft_operator::crd::{MinecraftServer, ServerPhase, StorageSpec};
use minecraft_operator::resources::{DependentKind, LABEL_SYNCED_KINDS};
use minecraft_operator::store::{MemoryStore, StoreOperation};

use crate::fixtures::*;

/// Run one controller pass and persist its status onto `server`.
async fn pass(store: &MemoryStore, server: &mut MinecraftServer, first_seen: bool) -> PassOutcome {
    let events = StatusEventSource.events_for(server, first_seen);
    let outcome = run_handlers(store, server, &events, &LABEL_SYNCED_KINDS).await;
    server.status = Some(outcome.status.clone());
    outcome
}

fn handlers(server: &MinecraftServer, first_seen: bool) -> Vec<&'static str> {
    StatusEventSource
        .events_for(server, first_seen)
        .iter()
        .map(ServerEvent::as_str)
        .collect()
}

#[tokio::test]
async fn test_end_to_end_mc1() {
    let store = MemoryStore::new();
    let names = reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();

    let created: Vec<String> = store
        .operations()
        .into_iter()
        .filter_map(|op| match op {
            StoreOperation::Create(_, name) => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(created, vec!["mc1-data", "mc1-config", "mc1-secret", "mc1-svc", "mc1"]);

    let record = serde_json::to_value(&names).unwrap();
    assert_eq!(
        record,
        serde_json::json!({
            "data-pvc-name": "mc1-data",
            "config-name": "mc1-config",
            "secret-name": "mc1-secret",
            "deployment-name": "mc1",
        })
    );
}

#[tokio::test]
async fn test_lifecycle_create_update_relabel() {
    let store = MemoryStore::new();
    let mut server = mc1_server(mc1_spec(), 1);

    // Create
    let outcome = pass(&store, &mut server, true).await;
    assert!(outcome.error.is_none());
    assert_eq!(outcome.created, DependentKind::ALL.to_vec());
    assert_eq!(outcome.status.phase, ServerPhase::Ready);
    assert_eq!(outcome.status.observed_generation, Some(1));
    assert!(handlers(&server, false).is_empty());

    // Spec update
    server.spec.storage_size = Some("20Gi".to_string());
    server.metadata.generation = Some(2);
    assert_eq!(handlers(&server, false), vec!["update"]);
    let outcome = pass(&store, &mut server, false).await;
    assert!(outcome.storage_updated);
    assert_eq!(stored_storage_request(&store).as_deref(), Some("20Gi"));
    assert_eq!(server.status.as_ref().unwrap().observed_generation, Some(2));

    // Relabel
    set_labels(&mut server, &[("team", "ops")]);
    assert_eq!(handlers(&server, false), vec!["labels"]);
    let outcome = pass(&store, &mut server, false).await;
    assert_eq!(outcome.labels_patched, 3);
    assert_eq!(
        labels_of(&store, DependentKind::Secret).get("team").map(String::as_str),
        Some("ops")
    );
    assert!(handlers(&server, false).is_empty());
}

#[tokio::test]
async fn test_restart_resumes_partial_create() {
    let store = MemoryStore::new();
    let mut server = mc1_server(mc1_spec(), 1);
    store.fail_creates(DependentKind::Deployment);

    let outcome = pass(&store, &mut server, true).await;
    assert!(outcome.error.as_ref().is_some_and(|e| e.is_retryable()));
    assert_eq!(outcome.status.phase, ServerPhase::Provisioning);
    assert!(outcome.status.dependents.is_none());

    // The next pass is a create again, since nothing was recorded
    store.heal();
    assert_eq!(handlers(&server, true), vec!["create"]);
    let outcome = pass(&store, &mut server, true).await;
    assert!(outcome.error.is_none());
    assert_eq!(outcome.created, vec![DependentKind::Deployment]);
    assert_eq!(outcome.status.phase, ServerPhase::Ready);

    // After a process restart the recorded server is resumed, creating nothing
    assert_eq!(handlers(&server, true), vec!["resume"]);
    let outcome = pass(&store, &mut server, true).await;
    assert!(outcome.created.is_empty());
    assert_eq!(store.created_kinds().len(), 5);
}

#[tokio::test]
async fn test_resume_recreates_deleted_dependent_names_unchanged() {
    let store = MemoryStore::new();
    let mut server = mc1_server(mc1_spec(), 1);
    pass(&store, &mut server, true).await;
    let recorded = server.status.as_ref().unwrap().dependents.clone();

    let fresh = MemoryStore::new();
    let outcome = pass(&fresh, &mut server, true).await;

    assert_eq!(outcome.created, DependentKind::ALL.to_vec());
    assert_eq!(server.status.as_ref().unwrap().dependents, recorded);
}

#[tokio::test]
async fn test_invalid_spec_then_fixed() {
    let store = MemoryStore::new();
    let mut spec = mc1_spec();
    spec.storage = Some(StorageSpec {
        size: Some(String::new()),
        class: Some("standard".to_string()),
    });
    let mut server = mc1_server(spec, 1);

    let outcome = pass(&store, &mut server, true).await;
    assert!(outcome.error.as_ref().is_some_and(|e| e.is_permanent()));
    assert_eq!(outcome.status.phase, ServerPhase::Failed);
    assert!(store.is_empty());

    server.spec = mc1_spec();
    server.metadata.generation = Some(2);
    let outcome = pass(&store, &mut server, false).await;
    assert!(outcome.error.is_none());
    assert_eq!(outcome.status.phase, ServerPhase::Ready);
    assert_eq!(outcome.status.observed_generation, Some(2));
}

#[tokio::test]
async fn test_rejected_update_does_not_block_labels() {
    let store = MemoryStore::new();
    let mut server = mc1_server(mc1_spec(), 1);
    pass(&store, &mut server, true).await;

    // A spec change without storageSize, together with a label change
    server.metadata.generation = Some(2);
    set_labels(&mut server, &[("team", "ops")]);
    assert_eq!(handlers(&server, false), vec!["update", "labels"]);

    let outcome = pass(&store, &mut server, false).await;
    assert!(outcome.error.is_none());
    assert!(outcome.update_rejected.is_some());
    assert_eq!(outcome.labels_patched, 3);
    assert_eq!(server.status.as_ref().unwrap().observed_generation, Some(2));
    assert!(handlers(&server, false).is_empty());
}

#[tokio::test]
async fn test_failed_label_patch_is_retried() {
    let store = MemoryStore::new();
    let mut server = mc1_server(mc1_spec(), 1);
    pass(&store, &mut server, true).await;

    set_labels(&mut server, &[("team", "ops")]);
    store.fail_patches(DependentKind::ConfigMap);
    let outcome = pass(&store, &mut server, false).await;
    assert!(outcome.error.as_ref().is_some_and(|e| e.is_retryable()));
    assert_eq!(server.status.as_ref().unwrap().observed_labels, None);

    store.heal();
    assert_eq!(handlers(&server, false), vec!["labels"]);
    let outcome = pass(&store, &mut server, false).await;
    assert!(outcome.error.is_none());
    assert!(labels_of(&store, DependentKind::ConfigMap).contains_key("team"));
}

#[tokio::test]
async fn test_failed_storage_patch_is_retried() {
    let store = MemoryStore::new();
    let mut server = mc1_server(mc1_spec(), 1);
    pass(&store, &mut server, true).await;

    server.spec.storage_size = Some("20Gi".to_string());
    server.metadata.generation = Some(2);
    store.fail_patches(DependentKind::VolumeClaim);

    let outcome = pass(&store, &mut server, false).await;
    assert!(outcome.update_rejected.is_none());
    assert!(outcome.error.as_ref().is_some_and(|e| e.is_retryable()));
    assert_eq!(server.status.as_ref().unwrap().observed_generation, Some(1));
    assert_eq!(handlers(&server, false), vec!["update"]);

    store.heal();
    let outcome = pass(&store, &mut server, false).await;
    assert!(outcome.error.is_none());
    assert!(outcome.storage_updated);
    assert_eq!(stored_storage_request(&store).as_deref(), Some("20Gi"));
    assert_eq!(server.status.as_ref().unwrap().observed_generation, Some(2));
}
