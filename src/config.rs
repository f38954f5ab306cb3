//! Operator configuration read from the environment.

use thiserror::Error;
use tracing::warn;

use crate::resources::{DependentKind, LABEL_SYNCED_KINDS};

/// Default port of the health and metrics server
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Configuration errors, reported at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Runtime configuration of the operator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Namespace to watch, `None` for cluster-wide
    pub watch_namespace: Option<String>,
    /// Holder identity for leader election
    pub pod_name: String,
    /// Namespace of the leader-election lease
    pub pod_namespace: String,
    pub health_port: u16,
    /// Kinds whose labels follow the parent's labels
    pub label_sync_kinds: Vec<DependentKind>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            pod_name: "unknown".to_string(),
            pod_namespace: "default".to_string(),
            health_port: DEFAULT_HEALTH_PORT,
            label_sync_kinds: LABEL_SYNCED_KINDS.to_vec(),
        }
    }
}

impl OperatorConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let pod_name = non_empty("POD_NAME").unwrap_or_else(|| {
            warn!("POD_NAME not set, using hostname");
            hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string())
        });
        let pod_namespace = non_empty("POD_NAMESPACE").unwrap_or_else(|| {
            warn!("POD_NAMESPACE not set, using 'default'");
            "default".to_string()
        });

        let health_port = match non_empty("HEALTH_PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "HEALTH_PORT",
                message: format!("{port:?}: {e}"),
            })?,
            None => DEFAULT_HEALTH_PORT,
        };

        let label_sync_kinds = match non_empty("LABEL_SYNC_KINDS") {
            Some(kinds) => parse_kinds(&kinds)?,
            None => LABEL_SYNCED_KINDS.to_vec(),
        };

        Ok(Self {
            watch_namespace: non_empty("WATCH_NAMESPACE"),
            pod_name,
            pod_namespace,
            health_port,
            label_sync_kinds,
        })
    }
}

/// Parse a comma-separated list of kind names, dropping duplicates.
///
/// Service is rejected: its name is not part of the status record.
fn parse_kinds(value: &str) -> Result<Vec<DependentKind>, ConfigError> {
    let mut kinds = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let kind: DependentKind = part.parse().map_err(|e| ConfigError::Invalid {
            var: "LABEL_SYNC_KINDS",
            message: format!("{e}"),
        })?;
        if kind == DependentKind::Service {
            return Err(ConfigError::Invalid {
                var: "LABEL_SYNC_KINDS",
                message: "Service names are not recorded and cannot be label-synced".to_string(),
            });
        }
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}
