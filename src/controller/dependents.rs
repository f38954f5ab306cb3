//! Creation of the dependents of a MinecraftServer.
//!
//! Each kind is processed in [`DependentKind::ALL`] order with
//! list-then-conditional-create. A kind whose deterministic name already
//! exists is adopted as is, so an interrupted pass resumes at the first
//! missing kind and a repeated pass creates nothing.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use tracing::{debug, info};

use crate::controller::error::{Error, Result};
use crate::controller::validation::validate_create;
use crate::crd::{DependentNames, MinecraftServer, MinecraftServerSpec};
use crate::resources::{DependentKind, RconPassword, adopt, common_labels, owner_reference, render};
use crate::store::{CreateOutcome, ResourceStore};

/// Identity of the parent a dependent set is created for.
#[derive(Clone, Debug)]
pub struct ParentRef {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub owner: OwnerReference,
}

impl ParentRef {
    /// Build the parent identity of a server object.
    ///
    /// Fails when the object has no namespace, since the owner reference
    /// cannot cross namespaces.
    pub fn from_server(server: &MinecraftServer) -> Result<Self> {
        let name = server.metadata.name.clone().unwrap_or_default();
        let namespace = server
            .metadata
            .namespace
            .clone()
            .ok_or_else(|| Error::Validation(format!("MinecraftServer {name} has no namespace")))?;
        Ok(Self {
            labels: common_labels(&name),
            owner: owner_reference(server),
            name,
            namespace,
        })
    }
}

/// Per-kind outcome of a reconcile pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependentsReport {
    /// Kinds created by this pass, in creation order.
    pub created: Vec<DependentKind>,
    /// Kinds that already existed and were adopted.
    pub adopted: Vec<DependentKind>,
}

/// Ensure all dependents exist and return their recorded names.
pub async fn reconcile_dependents(
    store: &dyn ResourceStore,
    spec: &MinecraftServerSpec,
    parent: &ParentRef,
) -> Result<DependentNames> {
    reconcile_dependents_with_report(store, spec, parent)
        .await
        .map(|(names, _)| names)
}

/// Like [`reconcile_dependents`], also reporting what was created.
pub async fn reconcile_dependents_with_report(
    store: &dyn ResourceStore,
    spec: &MinecraftServerSpec,
    parent: &ParentRef,
) -> Result<(DependentNames, DependentsReport)> {
    validate_create(spec)?;

    let mut report = DependentsReport::default();
    for kind in DependentKind::ALL {
        let name = kind.dependent_name(&parent.name);
        let existing = store
            .list_names(kind, &parent.namespace)
            .await
            .map_err(|e| Error::store("list", kind, &name, e))?;

        if existing.contains(&name) {
            debug!(kind = %kind, name = %name, "Dependent exists, adopting");
            report.adopted.push(kind);
            continue;
        }

        let password = (kind == DependentKind::Secret).then(RconPassword::generate);
        let mut manifest = render(
            kind,
            spec,
            &parent.name,
            &parent.namespace,
            &parent.labels,
            password.as_ref(),
        )
        .ok_or_else(|| Error::Validation(format!("cannot render {kind} {name} from spec")))?;
        adopt(manifest.metadata_mut(), &parent.owner);
        debug!(kind = %kind, metadata = ?manifest.metadata(), "Rendered dependent");

        let outcome = store
            .create(&parent.namespace, manifest)
            .await
            .map_err(|e| Error::store("create", kind, &name, e))?;
        match outcome {
            CreateOutcome::Created(_) => {
                info!(
                    kind = %kind,
                    name = %name,
                    namespace = %parent.namespace,
                    "Created dependent"
                );
                report.created.push(kind);
            }
            CreateOutcome::AlreadyExists(_) => {
                info!(kind = %kind, name = %name, "Dependent created concurrently, adopting");
                report.adopted.push(kind);
            }
        }
    }

    Ok((recorded_names(&parent.name), report))
}

/// Names recorded in status for a parent.
pub fn recorded_names(parent: &str) -> DependentNames {
    DependentNames {
        data_pvc_name: DependentKind::VolumeClaim.dependent_name(parent),
        config_name: DependentKind::ConfigMap.dependent_name(parent),
        secret_name: DependentKind::Secret.dependent_name(parent),
        deployment_name: DependentKind::Deployment.dependent_name(parent),
    }
}
