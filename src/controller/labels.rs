//! Propagation of parent label changes to the dependents.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use crate::controller::error::{Error, Result};
use crate::crd::DependentNames;
use crate::resources::DependentKind;
use crate::store::{LabelPatch, ResourceStore};

/// Kind of change to a single label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelOp {
    Add,
    Change,
    Remove,
}

/// One entry of a label diff.
///
/// `path` addresses the label from the object root, e.g.
/// `["metadata", "labels", "team"]`; only its last segment is used as the key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelChange {
    pub op: LabelOp,
    pub path: Vec<String>,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl LabelChange {
    fn new(op: LabelOp, key: &str, old: Option<&String>, new: Option<&String>) -> Self {
        Self {
            op,
            path: vec!["metadata".to_string(), "labels".to_string(), key.to_string()],
            old: old.cloned(),
            new: new.cloned(),
        }
    }

    /// The label key this change targets.
    pub fn key(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }
}

/// Compute the changes turning `old` into `new`, sorted by key.
pub fn diff_labels(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
) -> Vec<LabelChange> {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    keys.into_iter()
        .filter_map(|key| match (old.get(key), new.get(key)) {
            (None, Some(n)) => Some(LabelChange::new(LabelOp::Add, key, None, Some(n))),
            (Some(o), None) => Some(LabelChange::new(LabelOp::Remove, key, Some(o), None)),
            (Some(o), Some(n)) if o != n => {
                Some(LabelChange::new(LabelOp::Change, key, Some(o), Some(n)))
            }
            _ => None,
        })
        .collect()
}

/// Flatten a diff into one patch. Later changes to a key win.
pub fn flatten(diff: &[LabelChange]) -> LabelPatch {
    let mut patch = LabelPatch::new();
    for change in diff {
        let Some(key) = change.key() else {
            continue;
        };
        let value = match change.op {
            LabelOp::Add | LabelOp::Change => change.new.clone(),
            LabelOp::Remove => None,
        };
        patch.insert(key.to_string(), value);
    }
    patch
}

/// Name of the recorded dependent of `kind`, if the record has one.
pub fn recorded_name(prior: &DependentNames, kind: DependentKind) -> Option<&str> {
    match kind {
        DependentKind::VolumeClaim => Some(&prior.data_pvc_name),
        DependentKind::ConfigMap => Some(&prior.config_name),
        DependentKind::Secret => Some(&prior.secret_name),
        DependentKind::Deployment => Some(&prior.deployment_name),
        DependentKind::Service => None,
    }
}

/// Apply a label diff to the recorded dependents of `synced_kinds`.
///
/// Every kind is attempted; the first error is returned afterwards.
pub async fn propagate_labels(
    store: &dyn ResourceStore,
    diff: &[LabelChange],
    prior: &DependentNames,
    namespace: &str,
    synced_kinds: &[DependentKind],
) -> Result<usize> {
    let patch = flatten(diff);
    if patch.is_empty() {
        return Ok(0);
    }

    let mut first_error: Option<Error> = None;
    let mut patched = 0;
    for &kind in synced_kinds {
        let Some(name) = recorded_name(prior, kind) else {
            warn!(kind = %kind, "No recorded name for kind, skipping label sync");
            continue;
        };
        match store.patch_labels(kind, namespace, name, &patch).await {
            Ok(()) => {
                info!(kind = %kind, name = %name, labels = patch.len(), "Patched labels");
                patched += 1;
            }
            Err(e) => {
                warn!(kind = %kind, name = %name, error = %e, "Failed to patch labels");
                first_error.get_or_insert(Error::store("patch labels of", kind, name, e));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(patched),
    }
}
