//! Prints the MinecraftServer CustomResourceDefinition as YAML.
//!
//! `cargo run --bin crdgen > deploy/crd.yaml`

use kube::CustomResourceExt;
use minecraft_operator::crd::MinecraftServer;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&MinecraftServer::crd())?);
    Ok(())
}
