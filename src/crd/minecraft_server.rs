//! MinecraftServer Custom Resource Definition.
//!
//! Every field of the spec is optional at the type level. Required fields are
//! enforced by the controller's validation gate so that an incomplete spec
//! surfaces as a permanent reconcile error instead of a watch decode failure.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// MinecraftServer describes a single game server.
///
/// Example:
/// ```yaml
/// apiVersion: hellshade.fi/v1
/// kind: MinecraftServer
/// metadata:
///   name: mc1
/// spec:
///   storage:
///     size: 10Gi
///     class: standard
///   serverConfig:
///     motd: Hi
///     name: mc1
///     memory: 1G
///     maxMemory: 2G
///     maxPlayers: 20
///     serverType: VANILLA
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "hellshade.fi",
    version = "v1",
    kind = "MinecraftServer",
    plural = "minecraftservers",
    shortname = "mcs",
    status = "MinecraftServerStatus",
    namespaced,
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Storage", "type":"string", "jsonPath":".spec.storage.size"}"#,
    printcolumn = r#"{"name":"Type", "type":"string", "jsonPath":".spec.serverConfig.serverType"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MinecraftServerSpec {
    /// Persistent storage for the world data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageSpec>,

    /// Server settings, rendered into the server ConfigMap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_config: Option<ServerConfigSpec>,

    /// Requested volume size on update. Only read by the storage updater.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_size: Option<String>,
}

/// Storage settings for the data PersistentVolumeClaim.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    /// Requested size (e.g. "10Gi").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Storage class name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// Minecraft server settings.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motd: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Initial heap size (e.g. "1G").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    /// Maximum heap size (e.g. "2G").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_memory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_players: Option<i64>,

    /// Server flavour (VANILLA, PAPER, FORGE, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<bool>,

    /// Minecraft version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    /// World name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Java major version selecting the image tag (e.g. "17" -> `java17`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_version: Option<String>,

    /// Server icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spiget_resources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modrinth_projects: Vec<String>,

    /// Extra environment entries appended to the ConfigMap verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_env: BTreeMap<String, String>,
}

/// Names of the dependents created for a server.
///
/// This is the record later handlers use to find the dependents. The service
/// name is not recorded.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct DependentNames {
    #[serde(rename = "data-pvc-name")]
    pub data_pvc_name: String,
    #[serde(rename = "config-name")]
    pub config_name: String,
    #[serde(rename = "secret-name")]
    pub secret_name: String,
    #[serde(rename = "deployment-name")]
    pub deployment_name: String,
}

/// Status of a MinecraftServer.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MinecraftServerStatus {
    /// Current phase.
    #[serde(default)]
    pub phase: ServerPhase,

    /// Dependents recorded by the first successful reconcile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependents: Option<DependentNames>,

    /// The generation most recently handled by the storage updater.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Parent labels as last propagated to the dependents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_labels: Option<BTreeMap<String, String>>,

    /// Conditions describing the current state.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Lifecycle phase of a MinecraftServer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum ServerPhase {
    /// Not reconciled yet.
    #[default]
    Pending,
    /// Some dependents are still missing.
    Provisioning,
    /// All dependents exist.
    Ready,
    /// The spec is invalid and needs to be changed.
    Failed,
}

impl std::fmt::Display for ServerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerPhase::Pending => write!(f, "Pending"),
            ServerPhase::Provisioning => write!(f, "Provisioning"),
            ServerPhase::Ready => write!(f, "Ready"),
            ServerPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Condition describes the state of a server at a certain point.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition.
    pub r#type: String,
    /// Status of the condition ("True", "False", "Unknown").
    pub status: String,
    /// Machine-readable reason for the condition's last transition.
    pub reason: String,
    /// Human-readable message indicating details about last transition.
    pub message: String,
    /// Last time the condition transitioned from one status to another.
    pub last_transition_time: String,
    /// The generation of the resource this condition was observed for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    /// Create a new condition.
    pub fn new(
        condition_type: &str,
        status: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
    ) -> Self {
        Self {
            r#type: condition_type.to_string(),
            status: if status {
                "True".to_string()
            } else {
                "False".to_string()
            },
            reason: reason.to_string(),
            message: message.to_string(),
            last_transition_time: jiff::Timestamp::now().to_string(),
            observed_generation: generation,
        }
    }

    /// Create a "Ready" condition.
    pub fn ready(ready: bool, reason: &str, message: &str, generation: Option<i64>) -> Self {
        Self::new("Ready", ready, reason, message, generation)
    }

    /// Create a "Progressing" condition.
    pub fn progressing(
        progressing: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
    ) -> Self {
        Self::new("Progressing", progressing, reason, message, generation)
    }

    /// Create a "Degraded" condition.
    pub fn degraded(degraded: bool, reason: &str, message: &str, generation: Option<i64>) -> Self {
        Self::new("Degraded", degraded, reason, message, generation)
    }
}
