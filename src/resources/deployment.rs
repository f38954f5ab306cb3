//! Deployment generation for the server container.
//!
//! The Deployment references the other dependents by their deterministic
//! names: environment from the ConfigMap and Secret, and world data from the
//! PVC mounted at [`DATA_MOUNT_PATH`].

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapEnvSource, Container, ContainerPort, EnvFromSource,
    PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec, SecretEnvSource, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use crate::crd::ServerConfigSpec;
use crate::resources::common::dependent_metadata;
use crate::resources::config_map::{QUERY_PORT, SERVER_PORT};
use crate::resources::names::{config_map_name, data_pvc_name, secret_name};

/// Server image repository.
pub const IMAGE_REPOSITORY: &str = "itzg/minecraft-server";
/// Path the world data volume is mounted at.
pub const DATA_MOUNT_PATH: &str = "/data";
/// Pod volume name backed by the data PVC.
pub const DATA_VOLUME_NAME: &str = "server-data-volume";

/// Image reference for the requested Java version.
pub fn server_image(java_version: Option<&str>) -> String {
    match java_version {
        Some(v) if !v.is_empty() => format!("{IMAGE_REPOSITORY}:java{v}"),
        _ => format!("{IMAGE_REPOSITORY}:latest"),
    }
}

/// Generate the server Deployment.
///
/// `labels` doubles as the pod selector, so it must contain the `app` label
/// the Service selects on.
pub fn generate_deployment(
    config: &ServerConfigSpec,
    name: &str,
    namespace: &str,
    labels: &BTreeMap<String, String>,
) -> Deployment {
    let container = Container {
        name: format!("{name}-server"),
        image: Some(server_image(config.java_version.as_deref())),
        ports: Some(vec![
            ContainerPort {
                container_port: SERVER_PORT,
                name: Some("minecraft".to_string()),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            },
            ContainerPort {
                container_port: QUERY_PORT,
                name: Some("query".to_string()),
                protocol: Some("UDP".to_string()),
                ..Default::default()
            },
        ]),
        env_from: Some(vec![
            EnvFromSource {
                config_map_ref: Some(ConfigMapEnvSource {
                    name: config_map_name(name),
                    ..Default::default()
                }),
                ..Default::default()
            },
            EnvFromSource {
                secret_ref: Some(SecretEnvSource {
                    name: secret_name(name),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ]),
        volume_mounts: Some(vec![VolumeMount {
            name: DATA_VOLUME_NAME.to_string(),
            mount_path: DATA_MOUNT_PATH.to_string(),
            ..Default::default()
        }]),
        ..Default::default()
    };

    Deployment {
        metadata: dependent_metadata(name, namespace, labels),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels.clone()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    restart_policy: Some("Always".to_string()),
                    volumes: Some(vec![Volume {
                        name: DATA_VOLUME_NAME.to_string(),
                        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                            claim_name: data_pvc_name(name),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
