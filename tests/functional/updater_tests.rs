//! Updater tests: only the recorded volume claim follows storage changes.

use minecraft_operator::controller::dependents::reconcile_dependents;
use minecraft_operator::controller::updater::update_storage;
use minecraft_operator::crd::{DependentNames, MinecraftServerSpec};
use minecraft_operator::store::{MemoryStore, StoreOperation};

use crate::fixtures::*;

async fn provisioned() -> (MemoryStore, DependentNames) {
    let store = MemoryStore::new();
    let names = reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();
    store.reset_operations();
    (store, names)
}

#[tokio::test]
async fn test_update_patches_only_volume_claim() {
    let (store, prior) = provisioned().await;
    let spec = MinecraftServerSpec {
        storage_size: Some("20Gi".to_string()),
        ..Default::default()
    };

    update_storage(&store, &spec, &prior, NAMESPACE).await.unwrap();

    assert_eq!(
        store.operations(),
        vec![StoreOperation::PatchStorage("mc1-data".to_string())]
    );
    assert_eq!(stored_storage_request(&store).as_deref(), Some("20Gi"));
}

#[tokio::test]
async fn test_reapplying_same_size_is_stable() {
    let (store, prior) = provisioned().await;
    let spec = MinecraftServerSpec {
        storage_size: Some("20Gi".to_string()),
        ..Default::default()
    };

    update_storage(&store, &spec, &prior, NAMESPACE).await.unwrap();
    update_storage(&store, &spec, &prior, NAMESPACE).await.unwrap();

    assert_eq!(stored_storage_request(&store).as_deref(), Some("20Gi"));
}

#[tokio::test]
async fn test_update_without_storage_size_touches_nothing() {
    let (store, prior) = provisioned().await;

    let err = update_storage(&store, &mc1_spec(), &prior, NAMESPACE)
        .await
        .unwrap_err();

    assert!(err.is_permanent());
    assert!(store.operations().is_empty());
    assert_eq!(stored_storage_request(&store).as_deref(), Some("10Gi"));
}
