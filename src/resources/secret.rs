//! Secret generation for the RCON password.
//!
//! The password is generated by the caller, once per new Secret, and handed
//! to [`generate_secret`]. Rendering itself is deterministic.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::core::v1::Secret;
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::resources::common::dependent_metadata;

/// Secret key holding the RCON password.
pub const RCON_PASSWORD_KEY: &str = "RCON_PASSWORD";

/// Length of a generated RCON password.
pub const RCON_PASSWORD_LENGTH: usize = 32;

/// A freshly generated RCON password.
#[derive(Clone, PartialEq, Eq)]
pub struct RconPassword(String);

impl RconPassword {
    /// Generate a password from the thread-local RNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Generate a password from the given RNG.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let password = (0..RCON_PASSWORD_LENGTH)
            .map(|_| char::from(rng.sample(Alphanumeric)))
            .collect();
        Self(password)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RconPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RconPassword(<redacted>)")
    }
}

/// Generate the RCON Secret holding `password`.
pub fn generate_secret(
    name: &str,
    namespace: &str,
    labels: &BTreeMap<String, String>,
    password: &RconPassword,
) -> Secret {
    Secret {
        metadata: dependent_metadata(name, namespace, labels),
        string_data: Some(BTreeMap::from([(
            RCON_PASSWORD_KEY.to_string(),
            password.expose().to_string(),
        )])),
        ..Default::default()
    }
}
