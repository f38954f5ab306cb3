//! [`ResourceStore`] backed by the Kubernetes API.

use std::collections::BTreeSet;
use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Secret, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use super::{CreateOutcome, LabelPatch, ResourceStore};
use crate::controller::context::FIELD_MANAGER;
use crate::controller::error::{Error, Result};
use crate::resources::{DependentKind, DependentManifest};

/// Store that reads and writes dependents through the API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

async fn list_names_of<K>(api: Api<K>) -> Result<BTreeSet<String>>
where
    K: Resource + Clone + DeserializeOwned + Debug,
    <K as Resource>::DynamicType: Default,
{
    let list = api.list_metadata(&ListParams::default()).await?;
    Ok(list
        .items
        .into_iter()
        .filter_map(|item| item.metadata.name)
        .collect())
}

async fn create_object<K>(api: Api<K>, object: K) -> Result<CreateOutcome>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
    <K as Resource>::DynamicType: Default,
{
    let name = object.meta().name.clone().unwrap_or_default();
    let params = PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    };
    let result = api
        .create(&params, &object)
        .await
        .map(|created| created.meta().name.clone().unwrap_or_else(|| name.clone()));
    create_outcome(name, result)
}

/// Map the result of a create call; only `AlreadyExists` counts as adoption.
fn create_outcome(name: String, result: kube::Result<String>) -> Result<CreateOutcome> {
    match result.map_err(Error::from) {
        Ok(created) => Ok(CreateOutcome::Created(created)),
        Err(e) if e.is_already_exists() => {
            debug!(name = %name, "Object already exists, adopting");
            Ok(CreateOutcome::AlreadyExists(name))
        }
        Err(e) => Err(e),
    }
}

/// Merge-patch `name` with a body built around its current resourceVersion.
///
/// The API server rejects the patch with 409 Conflict when the object changed
/// after the read.
async fn guarded_merge_patch<K, F>(api: Api<K>, name: &str, build: F) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug,
    <K as Resource>::DynamicType: Default,
    F: FnOnce(Option<String>) -> Value,
{
    let current = api.get_metadata(name).await?;
    let body = build(current.metadata.resource_version);
    api.patch(
        name,
        &PatchParams::apply(FIELD_MANAGER),
        &Patch::Merge(&body),
    )
    .await?;
    Ok(())
}

fn labels_body(patch: &LabelPatch) -> impl FnOnce(Option<String>) -> Value + '_ {
    move |resource_version| {
        json!({
            "metadata": {
                "labels": patch,
                "resourceVersion": resource_version,
            }
        })
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn list_names(&self, kind: DependentKind, namespace: &str) -> Result<BTreeSet<String>> {
        match kind {
            DependentKind::VolumeClaim => {
                list_names_of(self.api::<PersistentVolumeClaim>(namespace)).await
            }
            DependentKind::ConfigMap => list_names_of(self.api::<ConfigMap>(namespace)).await,
            DependentKind::Secret => list_names_of(self.api::<Secret>(namespace)).await,
            DependentKind::Service => list_names_of(self.api::<Service>(namespace)).await,
            DependentKind::Deployment => list_names_of(self.api::<Deployment>(namespace)).await,
        }
    }

    async fn create(&self, namespace: &str, manifest: DependentManifest) -> Result<CreateOutcome> {
        match manifest {
            DependentManifest::VolumeClaim(o) => create_object(self.api(namespace), o).await,
            DependentManifest::ConfigMap(o) => create_object(self.api(namespace), o).await,
            DependentManifest::Secret(o) => create_object(self.api(namespace), o).await,
            DependentManifest::Service(o) => create_object(self.api(namespace), o).await,
            DependentManifest::Deployment(o) => create_object(self.api(namespace), o).await,
        }
    }

    async fn patch_labels(
        &self,
        kind: DependentKind,
        namespace: &str,
        name: &str,
        patch: &LabelPatch,
    ) -> Result<()> {
        let body = labels_body(patch);
        match kind {
            DependentKind::VolumeClaim => {
                guarded_merge_patch(self.api::<PersistentVolumeClaim>(namespace), name, body).await
            }
            DependentKind::ConfigMap => {
                guarded_merge_patch(self.api::<ConfigMap>(namespace), name, body).await
            }
            DependentKind::Secret => {
                guarded_merge_patch(self.api::<Secret>(namespace), name, body).await
            }
            DependentKind::Service => {
                guarded_merge_patch(self.api::<Service>(namespace), name, body).await
            }
            DependentKind::Deployment => {
                guarded_merge_patch(self.api::<Deployment>(namespace), name, body).await
            }
        }
    }

    async fn patch_storage_request(&self, namespace: &str, name: &str, size: &str) -> Result<()> {
        guarded_merge_patch(
            self.api::<PersistentVolumeClaim>(namespace),
            name,
            |resource_version| {
                json!({
                    "metadata": { "resourceVersion": resource_version },
                    "spec": { "resources": { "requests": { "storage": size } } }
                })
            },
        )
        .await
    }
}
