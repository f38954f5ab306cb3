//! Custom Resource Definitions (CRDs) for minecraft-operator.
//!
//! - `MinecraftServer`: a game server backed by a PVC, ConfigMap, Secret,
//!   Service and Deployment

mod minecraft_server;

pub use minecraft_server::*;
