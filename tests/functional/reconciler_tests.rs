//! Reconciler tests: creation order, idempotence, validation and resume.

use minecraft_operator::controller::dependents::{recorded_names, reconcile_dependents};
use minecraft_operator::crd::{MinecraftServerSpec, StorageSpec};
use minecraft_operator::resources::DependentKind;
use minecraft_operator::store::{MemoryStore, StoreOperation};

use crate::fixtures::*;

// ============================================================================
// Idempotence
// ============================================================================

#[tokio::test]
async fn test_reconcile_twice_creates_each_kind_once() {
    let store = MemoryStore::new();

    let first = reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();
    let second = reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();

    assert_eq!(first, second);
    for kind in DependentKind::ALL {
        assert_eq!(store.count(kind, NAMESPACE), 1, "{kind} count");
    }
    assert_eq!(store.created_kinds().len(), 5);
}

#[tokio::test]
async fn test_second_pass_only_lists() {
    let store = MemoryStore::new();
    reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();
    store.reset_operations();

    reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();

    let expected: Vec<_> = DependentKind::ALL
        .into_iter()
        .map(StoreOperation::List)
        .collect();
    assert_eq!(store.operations(), expected);
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_config_and_secret_precede_deployment() {
    let store = MemoryStore::new();
    reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();

    let created = store.created_kinds();
    let position = |kind| created.iter().position(|k| *k == kind).unwrap();
    assert!(position(DependentKind::ConfigMap) < position(DependentKind::Deployment));
    assert!(position(DependentKind::Secret) < position(DependentKind::Deployment));
}

// ============================================================================
// Validation gate
// ============================================================================

#[tokio::test]
async fn test_missing_storage_size_creates_nothing() {
    let store = MemoryStore::new();
    let spec = MinecraftServerSpec {
        storage: Some(StorageSpec {
            size: None,
            class: Some("standard".to_string()),
        }),
        ..mc1_spec()
    };

    let err = reconcile_dependents(&store, &spec, &mc1_parent())
        .await
        .unwrap_err();

    assert!(err.is_permanent());
    assert_eq!(err.to_string(), "storage.size is required, got: None");
    assert!(store.is_empty());
    assert!(store.operations().is_empty());
}

#[tokio::test]
async fn test_zero_max_players_is_rejected() {
    let store = MemoryStore::new();
    let mut spec = mc1_spec();
    if let Some(config) = spec.server_config.as_mut() {
        config.max_players = Some(0);
    }

    let err = reconcile_dependents(&store, &spec, &mc1_parent())
        .await
        .unwrap_err();

    assert!(err.is_permanent());
    assert!(store.is_empty());
}

// ============================================================================
// Resume after partial failure
// ============================================================================

#[tokio::test]
async fn test_resume_after_failed_create() {
    let store = MemoryStore::new();
    store.fail_creates(DependentKind::Service);

    let err = reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(
        store.created_kinds(),
        vec![
            DependentKind::VolumeClaim,
            DependentKind::ConfigMap,
            DependentKind::Secret,
        ]
    );
    let password = stored_password(&store);

    store.heal();
    store.reset_operations();
    let names = reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();

    assert_eq!(names, recorded_names(NAME));
    assert_eq!(
        store.created_kinds(),
        vec![DependentKind::Service, DependentKind::Deployment]
    );
    assert_eq!(stored_password(&store), password);
}

#[tokio::test]
async fn test_create_race_is_adopted() {
    let store = MemoryStore::new();
    reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();
    let password = stored_password(&store);

    // A stale listing makes the secret look absent; the create must lose
    // gracefully instead of failing or replacing the secret.
    store.hide_from_list(DependentKind::Secret);
    store.reset_operations();
    reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();

    assert!(
        store
            .operations()
            .contains(&StoreOperation::CreateSkipped(
                DependentKind::Secret,
                "mc1-secret".to_string()
            ))
    );
    assert_eq!(store.count(DependentKind::Secret, NAMESPACE), 1);
    assert_eq!(stored_password(&store), password);
}

// ============================================================================
// Secret
// ============================================================================

#[tokio::test]
async fn test_secret_password_shape() {
    let store = MemoryStore::new();
    reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();

    let password = stored_password(&store);
    assert_eq!(password.len(), 32);
    assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn test_passwords_differ_between_parents() {
    let store = MemoryStore::new();
    reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();

    let other = MemoryStore::new();
    reconcile_dependents(&other, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();

    assert_ne!(stored_password(&store), stored_password(&other));
}
