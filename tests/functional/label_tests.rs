//! Label propagation tests.

use std::collections::BTreeMap;

use minecraft_operator::controller::dependents::reconcile_dependents;
use minecraft_operator::controller::labels::{LabelChange, LabelOp, diff_labels, propagate_labels};
use minecraft_operator::crd::DependentNames;
use minecraft_operator::resources::{DependentKind, LABEL_SYNCED_KINDS};
use minecraft_operator::store::MemoryStore;

use crate::fixtures::*;

async fn provisioned() -> (MemoryStore, DependentNames) {
    let store = MemoryStore::new();
    let names = reconcile_dependents(&store, &mc1_spec(), &mc1_parent())
        .await
        .unwrap();
    store.reset_operations();
    (store, names)
}

fn add_team_ops() -> Vec<LabelChange> {
    vec![LabelChange {
        op: LabelOp::Add,
        path: vec![
            "metadata".to_string(),
            "labels".to_string(),
            "team".to_string(),
        ],
        old: None,
        new: Some("ops".to_string()),
    }]
}

#[tokio::test]
async fn test_propagation_scope() {
    let (store, prior) = provisioned().await;
    let service_before = labels_of(&store, DependentKind::Service);
    let deployment_before = labels_of(&store, DependentKind::Deployment);

    let patched = propagate_labels(&store, &add_team_ops(), &prior, NAMESPACE, &LABEL_SYNCED_KINDS)
        .await
        .unwrap();

    assert_eq!(patched, 3);
    for kind in LABEL_SYNCED_KINDS {
        assert_eq!(
            labels_of(&store, kind).get("team").map(String::as_str),
            Some("ops"),
            "{kind} label"
        );
    }
    assert_eq!(labels_of(&store, DependentKind::Service), service_before);
    assert_eq!(labels_of(&store, DependentKind::Deployment), deployment_before);
}

#[tokio::test]
async fn test_removal_clears_label() {
    let (store, prior) = provisioned().await;
    propagate_labels(&store, &add_team_ops(), &prior, NAMESPACE, &LABEL_SYNCED_KINDS)
        .await
        .unwrap();

    let old = BTreeMap::from([("team".to_string(), "ops".to_string())]);
    let diff = diff_labels(&old, &BTreeMap::new());
    propagate_labels(&store, &diff, &prior, NAMESPACE, &LABEL_SYNCED_KINDS)
        .await
        .unwrap();

    for kind in LABEL_SYNCED_KINDS {
        let labels = labels_of(&store, kind);
        assert!(!labels.contains_key("team"), "{kind} still labelled");
        assert_eq!(labels.get("app").map(String::as_str), Some(NAME));
    }
}

#[tokio::test]
async fn test_every_kind_attempted_before_error() {
    let (store, prior) = provisioned().await;
    store.fail_patches(DependentKind::VolumeClaim);

    let err = propagate_labels(&store, &add_team_ops(), &prior, NAMESPACE, &LABEL_SYNCED_KINDS)
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(!labels_of(&store, DependentKind::VolumeClaim).contains_key("team"));
    assert!(labels_of(&store, DependentKind::ConfigMap).contains_key("team"));
    assert!(labels_of(&store, DependentKind::Secret).contains_key("team"));
}

#[tokio::test]
async fn test_empty_diff_issues_no_patch() {
    let (store, prior) = provisioned().await;

    let patched = propagate_labels(&store, &[], &prior, NAMESPACE, &LABEL_SYNCED_KINDS)
        .await
        .unwrap();

    assert_eq!(patched, 0);
    assert!(store.operations().is_empty());
}

#[tokio::test]
async fn test_custom_synced_kinds() {
    let (store, prior) = provisioned().await;

    propagate_labels(
        &store,
        &add_team_ops(),
        &prior,
        NAMESPACE,
        &[DependentKind::Deployment],
    )
    .await
    .unwrap();

    assert!(labels_of(&store, DependentKind::Deployment).contains_key("team"));
    assert!(!labels_of(&store, DependentKind::ConfigMap).contains_key("team"));
}
