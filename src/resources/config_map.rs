//! ConfigMap generation for server settings.
//!
//! The ConfigMap is consumed by the server container through `envFrom`, so
//! every key is an environment variable understood by the server image.
//!
//! ## Rendering rules
//!
//! - booleans render as `"true"` / `"false"`
//! - lists are comma-joined
//! - absent values and empty strings are omitted
//! - `extraEnv` entries are applied last and may override any key

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;

use crate::crd::ServerConfigSpec;
use crate::resources::common::dependent_metadata;

/// Game port exposed by the server.
pub const SERVER_PORT: i32 = 25565;
/// Query protocol port (UDP, shares the game port number).
pub const QUERY_PORT: i32 = 25565;
/// RCON port.
pub const RCON_PORT: i32 = 25575;

/// Environment map for the server container.
pub fn server_env(config: &ServerConfigSpec) -> BTreeMap<String, String> {
    let mut env = EnvBuilder::default();

    env.text("MOTD", config.motd.as_deref());
    env.text("SERVER_NAME", config.name.as_deref());
    env.text("MEMORY", config.memory.as_deref());
    env.text("MAX_MEMORY", config.max_memory.as_deref());
    env.text("MAX_PLAYERS", config.max_players.map(|p| p.to_string()).as_deref());
    env.text("TYPE", config.server_type.as_deref());
    env.flag("ENABLE_WHITELIST", config.whitelist);
    env.text("ICON", config.icon.as_deref());
    env.flag("OVERRIDE_ICON", Some(false));
    env.text("SERVER_PORT", Some(SERVER_PORT.to_string().as_str()));
    env.text("QUERY_PORT", Some(QUERY_PORT.to_string().as_str()));
    env.text("RCON_PORT", Some(RCON_PORT.to_string().as_str()));
    env.text("VERSION", config.version.as_deref());
    env.text("TZ", config.time_zone.as_deref());
    env.text("LEVEL", config.level.as_deref());
    env.list("PLUGINS", &config.plugins);
    env.list("SPIGET_RESOURCES", &config.spiget_resources);
    env.flag("USE_SIMD_FLAGS", Some(true));
    env.list("MODRINTH_PROJECTS", &config.modrinth_projects);
    env.flag("EULA", Some(true));
    env.flag("ENABLE_RCON", Some(true));
    env.flag("ENABLE_QUERY", Some(true));
    env.flag("SNOOPER_ENABLED", Some(false));

    for (key, value) in &config.extra_env {
        env.text(key, Some(value.as_str()));
    }

    env.0
}

#[derive(Default)]
struct EnvBuilder(BTreeMap<String, String>);

impl EnvBuilder {
    fn text(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(v) if !v.is_empty() => {
                self.0.insert(key.to_string(), v.to_string());
            }
            _ => {
                self.0.remove(key);
            }
        }
    }

    fn flag(&mut self, key: &str, value: Option<bool>) {
        if let Some(v) = value {
            self.0.insert(key.to_string(), v.to_string());
        }
    }

    fn list(&mut self, key: &str, values: &[String]) {
        self.text(key, Some(values.join(",").as_str()));
    }
}

/// Generate the server ConfigMap.
pub fn generate_config_map(
    config: &ServerConfigSpec,
    name: &str,
    namespace: &str,
    labels: &BTreeMap<String, String>,
) -> ConfigMap {
    ConfigMap {
        metadata: dependent_metadata(name, namespace, labels),
        data: Some(server_env(config)),
        ..Default::default()
    }
}
