//! In-memory store for testing
//!
//! Keeps dependents in a map, records every operation for ordering
//! assertions, and can inject failures or hide objects from listings to
//! simulate partial runs and list/create races.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use super::{CreateOutcome, LabelPatch, ResourceStore};
use crate::controller::error::{Error, Result};
use crate::resources::volume_claim::storage_request;
use crate::resources::{DependentKind, DependentManifest};

type ObjectKey = (DependentKind, String, String);

/// An operation performed against the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOperation {
    List(DependentKind),
    Create(DependentKind, String),
    CreateSkipped(DependentKind, String),
    PatchLabels(DependentKind, String),
    PatchStorage(String),
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<ObjectKey, DependentManifest>,
    operations: Vec<StoreOperation>,
    failing_creates: HashSet<DependentKind>,
    failing_patches: HashSet<DependentKind>,
    hidden_from_list: HashSet<DependentKind>,
}

/// In-memory [`ResourceStore`] for unit and functional tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an object as if it had been created earlier.
    pub fn insert(&self, namespace: &str, manifest: DependentManifest) {
        let key = (manifest.kind(), namespace.to_string(), manifest.name().to_string());
        self.write().objects.insert(key, manifest);
    }

    /// Make every create of `kind` fail until [`MemoryStore::heal`].
    pub fn fail_creates(&self, kind: DependentKind) {
        self.write().failing_creates.insert(kind);
    }

    /// Make every patch of `kind` fail until [`MemoryStore::heal`].
    pub fn fail_patches(&self, kind: DependentKind) {
        self.write().failing_patches.insert(kind);
    }

    /// Leave objects of `kind` out of listings, as a concurrent writer
    /// racing the list would.
    pub fn hide_from_list(&self, kind: DependentKind) {
        self.write().hidden_from_list.insert(kind);
    }

    /// Clear all injected failures and hidden kinds.
    pub fn heal(&self) {
        let mut inner = self.write();
        inner.failing_creates.clear();
        inner.failing_patches.clear();
        inner.hidden_from_list.clear();
    }

    pub fn get(&self, kind: DependentKind, namespace: &str, name: &str) -> Option<DependentManifest> {
        self.read()
            .objects
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Labels of an object, empty if it has none or does not exist.
    pub fn labels(&self, kind: DependentKind, namespace: &str, name: &str) -> BTreeMap<String, String> {
        self.get(kind, namespace, name)
            .and_then(|m| m.metadata().labels.clone())
            .unwrap_or_default()
    }

    /// Number of objects of `kind` in `namespace`.
    pub fn count(&self, kind: DependentKind, namespace: &str) -> usize {
        self.read()
            .objects
            .keys()
            .filter(|(k, ns, _)| *k == kind && ns == namespace)
            .count()
    }

    /// Total number of objects in the store.
    pub fn len(&self) -> usize {
        self.read().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Operations performed so far, oldest first.
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.read().operations.clone()
    }

    /// Kinds created by this store, in creation order.
    pub fn created_kinds(&self) -> Vec<DependentKind> {
        self.read()
            .operations
            .iter()
            .filter_map(|op| match op {
                StoreOperation::Create(kind, _) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded operations.
    pub fn reset_operations(&self) {
        self.write().operations.clear();
    }
}

fn injected(action: &'static str, kind: DependentKind, name: &str) -> Error {
    Error::Store {
        action,
        kind,
        name: name.to_string(),
        message: "injected failure".to_string(),
    }
}

fn not_found(kind: DependentKind, name: &str) -> Error {
    Error::Kube(kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{kind} \"{name}\" not found"),
        reason: "NotFound".to_string(),
        code: 404,
    }))
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn list_names(&self, kind: DependentKind, namespace: &str) -> Result<BTreeSet<String>> {
        let mut inner = self.write();
        inner.operations.push(StoreOperation::List(kind));
        if inner.hidden_from_list.contains(&kind) {
            return Ok(BTreeSet::new());
        }
        Ok(inner
            .objects
            .keys()
            .filter(|(k, ns, _)| *k == kind && ns == namespace)
            .map(|(_, _, name)| name.clone())
            .collect())
    }

    async fn create(&self, namespace: &str, manifest: DependentManifest) -> Result<CreateOutcome> {
        let kind = manifest.kind();
        let name = manifest.name().to_string();
        let mut inner = self.write();

        if inner.failing_creates.contains(&kind) {
            return Err(injected("create", kind, &name));
        }

        let key = (kind, namespace.to_string(), name.clone());
        if inner.objects.contains_key(&key) {
            inner
                .operations
                .push(StoreOperation::CreateSkipped(kind, name.clone()));
            return Ok(CreateOutcome::AlreadyExists(name));
        }

        inner.objects.insert(key, manifest);
        inner.operations.push(StoreOperation::Create(kind, name.clone()));
        Ok(CreateOutcome::Created(name))
    }

    async fn patch_labels(
        &self,
        kind: DependentKind,
        namespace: &str,
        name: &str,
        patch: &LabelPatch,
    ) -> Result<()> {
        let mut inner = self.write();
        if inner.failing_patches.contains(&kind) {
            return Err(injected("patch", kind, name));
        }

        let key = (kind, namespace.to_string(), name.to_string());
        let manifest = inner
            .objects
            .get_mut(&key)
            .ok_or_else(|| not_found(kind, name))?;
        let labels = manifest.metadata_mut().labels.get_or_insert_with(BTreeMap::new);
        for (key, value) in patch {
            match value {
                Some(v) => {
                    labels.insert(key.clone(), v.clone());
                }
                None => {
                    labels.remove(key);
                }
            }
        }
        inner
            .operations
            .push(StoreOperation::PatchLabels(kind, name.to_string()));
        Ok(())
    }

    async fn patch_storage_request(&self, namespace: &str, name: &str, size: &str) -> Result<()> {
        let kind = DependentKind::VolumeClaim;
        let mut inner = self.write();
        if inner.failing_patches.contains(&kind) {
            return Err(injected("patch", kind, name));
        }

        let key = (kind, namespace.to_string(), name.to_string());
        let Some(DependentManifest::VolumeClaim(pvc)) = inner.objects.get_mut(&key) else {
            return Err(not_found(kind, name));
        };
        let resources = pvc
            .spec
            .get_or_insert_with(Default::default)
            .resources
            .get_or_insert_with(Default::default);
        resources
            .requests
            .get_or_insert_with(|| storage_request(size))
            .insert("storage".to_string(), Quantity(size.to_string()));
        inner
            .operations
            .push(StoreOperation::PatchStorage(name.to_string()));
        Ok(())
    }
}
