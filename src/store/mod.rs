//! Object store access for dependents.
//!
//! The reconciler, updater and label propagator talk to the cluster only
//! through [`ResourceStore`], so they run unchanged against the API server
//! ([`KubeStore`]) or an in-memory fake ([`MemoryStore`]).

mod kube_store;
mod memory;

pub use kube_store::KubeStore;
pub use memory::{MemoryStore, StoreOperation};

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::controller::error::Result;
use crate::resources::{DependentKind, DependentManifest};

/// Outcome of a conditional create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The object was created by this call.
    Created(String),
    /// An object with the same name already existed and was left untouched.
    AlreadyExists(String),
}

impl CreateOutcome {
    pub fn name(&self) -> &str {
        match self {
            CreateOutcome::Created(name) | CreateOutcome::AlreadyExists(name) => name,
        }
    }

    pub fn created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

/// Label changes to apply: `Some` sets a label, `None` removes it.
pub type LabelPatch = BTreeMap<String, Option<String>>;

/// Cluster operations on dependents.
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Names of the existing objects of `kind` in `namespace`.
    async fn list_names(&self, kind: DependentKind, namespace: &str) -> Result<BTreeSet<String>>;

    /// Create `manifest` unless an object with its name already exists.
    async fn create(&self, namespace: &str, manifest: DependentManifest) -> Result<CreateOutcome>;

    /// Merge `patch` into the labels of an existing object.
    ///
    /// Must fail rather than overwrite when the object changed concurrently.
    async fn patch_labels(
        &self,
        kind: DependentKind,
        namespace: &str,
        name: &str,
        patch: &LabelPatch,
    ) -> Result<()>;

    /// Set the storage request of an existing PersistentVolumeClaim.
    async fn patch_storage_request(&self, namespace: &str, name: &str, size: &str) -> Result<()>;
}
