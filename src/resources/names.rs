//! Dependent kinds and their deterministic names.
//!
//! A dependent's name is a pure function of the parent's name. The reconciler
//! relies on this to find prior progress after a restart.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The five kinds of object derived from a MinecraftServer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum DependentKind {
    VolumeClaim,
    ConfigMap,
    Secret,
    Service,
    Deployment,
}

/// Kinds whose labels follow the parent's labels.
///
/// Service and Deployment are left out: their labels carry the `app`
/// selector and are owned by the renderer.
pub const LABEL_SYNCED_KINDS: [DependentKind; 3] = [
    DependentKind::VolumeClaim,
    DependentKind::ConfigMap,
    DependentKind::Secret,
];

impl DependentKind {
    /// Creation order. ConfigMap and Secret precede the Deployment that
    /// sources its environment from them.
    pub const ALL: [DependentKind; 5] = [
        DependentKind::VolumeClaim,
        DependentKind::ConfigMap,
        DependentKind::Secret,
        DependentKind::Service,
        DependentKind::Deployment,
    ];

    /// Name of this dependent for the given parent.
    pub fn dependent_name(self, parent: &str) -> String {
        match self {
            DependentKind::VolumeClaim => format!("{parent}-data"),
            DependentKind::ConfigMap => format!("{parent}-config"),
            DependentKind::Secret => format!("{parent}-secret"),
            DependentKind::Service => format!("{parent}-svc"),
            DependentKind::Deployment => parent.to_string(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DependentKind::VolumeClaim => "VolumeClaim",
            DependentKind::ConfigMap => "ConfigMap",
            DependentKind::Secret => "Secret",
            DependentKind::Service => "Service",
            DependentKind::Deployment => "Deployment",
        }
    }
}

impl fmt::Display for DependentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a kind name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown dependent kind: {0}")]
pub struct ParseKindError(pub String);

impl FromStr for DependentKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "volumeclaim" | "persistentvolumeclaim" | "pvc" => Ok(DependentKind::VolumeClaim),
            "configmap" => Ok(DependentKind::ConfigMap),
            "secret" => Ok(DependentKind::Secret),
            "service" => Ok(DependentKind::Service),
            "deployment" => Ok(DependentKind::Deployment),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

/// Name of the data PersistentVolumeClaim.
pub fn data_pvc_name(parent: &str) -> String {
    DependentKind::VolumeClaim.dependent_name(parent)
}

/// Name of the server ConfigMap.
pub fn config_map_name(parent: &str) -> String {
    DependentKind::ConfigMap.dependent_name(parent)
}

/// Name of the RCON Secret.
pub fn secret_name(parent: &str) -> String {
    DependentKind::Secret.dependent_name(parent)
}

/// Name of the NodePort Service.
pub fn service_name(parent: &str) -> String {
    DependentKind::Service.dependent_name(parent)
}

/// Name of the Deployment.
pub fn deployment_name(parent: &str) -> String {
    DependentKind::Deployment.dependent_name(parent)
}
