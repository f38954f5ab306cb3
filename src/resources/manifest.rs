//! A rendered dependent of any of the five kinds.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Secret, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::crd::MinecraftServerSpec;
use crate::resources::common::APP_LABEL;
use crate::resources::names::DependentKind;
use crate::resources::secret::RconPassword;
use crate::resources::{config_map, deployment, secret, services, volume_claim};

/// A rendered dependent object, ready to be adopted and created.
#[derive(Clone, Debug)]
pub enum DependentManifest {
    VolumeClaim(PersistentVolumeClaim),
    ConfigMap(ConfigMap),
    Secret(Secret),
    Service(Service),
    Deployment(Deployment),
}

impl DependentManifest {
    pub fn kind(&self) -> DependentKind {
        match self {
            DependentManifest::VolumeClaim(_) => DependentKind::VolumeClaim,
            DependentManifest::ConfigMap(_) => DependentKind::ConfigMap,
            DependentManifest::Secret(_) => DependentKind::Secret,
            DependentManifest::Service(_) => DependentKind::Service,
            DependentManifest::Deployment(_) => DependentKind::Deployment,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            DependentManifest::VolumeClaim(o) => &o.metadata,
            DependentManifest::ConfigMap(o) => &o.metadata,
            DependentManifest::Secret(o) => &o.metadata,
            DependentManifest::Service(o) => &o.metadata,
            DependentManifest::Deployment(o) => &o.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            DependentManifest::VolumeClaim(o) => &mut o.metadata,
            DependentManifest::ConfigMap(o) => &mut o.metadata,
            DependentManifest::Secret(o) => &mut o.metadata,
            DependentManifest::Service(o) => &mut o.metadata,
            DependentManifest::Deployment(o) => &mut o.metadata,
        }
    }

    /// Object name, empty if the manifest has none.
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }
}

/// Render the manifest of `kind` for a parent.
///
/// `labels` must contain the parent's `app` label. The Secret is the only
/// kind that needs `password`; a caller creating a Secret must generate one
/// first, and no other kind reads it.
pub fn render(
    kind: DependentKind,
    spec: &MinecraftServerSpec,
    parent: &str,
    namespace: &str,
    labels: &BTreeMap<String, String>,
    password: Option<&RconPassword>,
) -> Option<DependentManifest> {
    let name = kind.dependent_name(parent);
    let manifest = match kind {
        DependentKind::VolumeClaim => DependentManifest::VolumeClaim(
            volume_claim::generate_volume_claim(spec.storage.as_ref()?, &name, namespace, labels),
        ),
        DependentKind::ConfigMap => DependentManifest::ConfigMap(config_map::generate_config_map(
            spec.server_config.as_ref()?,
            &name,
            namespace,
            labels,
        )),
        DependentKind::Secret => DependentManifest::Secret(secret::generate_secret(
            &name, namespace, labels, password?,
        )),
        DependentKind::Service => {
            let app = labels.get(APP_LABEL).map(String::as_str).unwrap_or(parent);
            DependentManifest::Service(services::generate_service(&name, namespace, app, labels))
        }
        DependentKind::Deployment => DependentManifest::Deployment(
            deployment::generate_deployment(spec.server_config.as_ref()?, &name, namespace, labels),
        ),
    };
    Some(manifest)
}
