//! Resource generation module.
//!
//! Contains the renderers for the Kubernetes objects owned by a MinecraftServer.
//! Renderers are pure: they never touch the cluster.
//!
//! ## Resources Generated
//!
//! | Resource | Name | Purpose |
//! |----------|------|---------|
//! | PersistentVolumeClaim | `<name>-data` | World data |
//! | ConfigMap | `<name>-config` | Server settings as environment |
//! | Secret | `<name>-secret` | RCON password |
//! | Service | `<name>-svc` | NodePort for game and query traffic |
//! | Deployment | `<name>` | The server container |

pub mod common;
pub mod config_map;
pub mod deployment;
pub mod manifest;
pub mod names;
pub mod secret;
pub mod services;
pub mod volume_claim;

// Re-export commonly used items
pub use common::{adopt, common_labels, owner_reference};
pub use manifest::{DependentManifest, render};
pub use names::{DependentKind, LABEL_SYNCED_KINDS};
pub use secret::RconPassword;
