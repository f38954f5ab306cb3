//! Service generation for Minecraft servers.
//!
//! Creates a single NodePort Service exposing:
//! - **minecraft**: the game port over TCP
//! - **query**: the query protocol over UDP on the same port number

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::resources::common::{APP_LABEL, dependent_metadata};
use crate::resources::config_map::{QUERY_PORT, SERVER_PORT};

/// Service type used for game servers.
pub const SERVICE_TYPE: &str = "NodePort";

/// Generate the NodePort Service selecting the server's pods by `app` label.
pub fn generate_service(
    name: &str,
    namespace: &str,
    app: &str,
    labels: &BTreeMap<String, String>,
) -> Service {
    Service {
        metadata: dependent_metadata(name, namespace, labels),
        spec: Some(ServiceSpec {
            type_: Some(SERVICE_TYPE.to_string()),
            selector: Some(BTreeMap::from([(APP_LABEL.to_string(), app.to_string())])),
            ports: Some(vec![
                ServicePort {
                    name: Some("minecraft".to_string()),
                    port: SERVER_PORT,
                    target_port: Some(IntOrString::String("minecraft".to_string())),
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                },
                ServicePort {
                    name: Some("query".to_string()),
                    port: QUERY_PORT,
                    target_port: Some(IntOrString::String("query".to_string())),
                    protocol: Some("UDP".to_string()),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::get_unwrap
)]
mod tests {
    use super::*;
    use crate::resources::common::common_labels;

    #[test]
    fn test_generate_service() {
        let svc = generate_service("mc1-svc", "games", "mc1", &common_labels("mc1"));

        assert_eq!(svc.metadata.name, Some("mc1-svc".to_string()));
        assert_eq!(svc.metadata.namespace, Some("games".to_string()));

        let spec = svc.spec.unwrap();
        assert_eq!(spec.type_, Some("NodePort".to_string()));
        assert_eq!(
            spec.selector.unwrap().get("app"),
            Some(&"mc1".to_string())
        );
    }

    #[test]
    fn test_service_ports() {
        let svc = generate_service("mc1-svc", "games", "mc1", &common_labels("mc1"));
        let ports = svc.spec.unwrap().ports.unwrap();

        assert_eq!(ports.len(), 2);
        let minecraft = ports
            .iter()
            .find(|p| p.name == Some("minecraft".to_string()))
            .unwrap();
        assert_eq!(minecraft.port, 25565);
        assert_eq!(minecraft.protocol, Some("TCP".to_string()));

        let query = ports
            .iter()
            .find(|p| p.name == Some("query".to_string()))
            .unwrap();
        assert_eq!(query.port, 25565);
        assert_eq!(query.protocol, Some("UDP".to_string()));
        assert_eq!(
            query.target_port,
            Some(IntOrString::String("query".to_string()))
        );
    }
}
