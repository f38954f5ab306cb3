//! Required-field validation for MinecraftServer specs.
//!
//! Fields are named by dotted paths into the camelCase wire form of the spec.
//! A value counts as missing when it is absent, null, an empty string, zero,
//! `false`, an empty list or an empty map.

use serde_json::Value;

use crate::controller::error::{Error, Result};
use crate::crd::MinecraftServerSpec;

/// Fields that must be set before any dependent is created.
pub const CREATE_REQUIRED_FIELDS: &[&str] = &[
    "storage.size",
    "storage.class",
    "serverConfig.motd",
    "serverConfig.name",
    "serverConfig.memory",
    "serverConfig.maxMemory",
    "serverConfig.maxPlayers",
    "serverConfig.serverType",
];

/// Validate a spec against [`CREATE_REQUIRED_FIELDS`].
pub fn validate_create(spec: &MinecraftServerSpec) -> Result<()> {
    let value = serde_json::to_value(spec)?;
    check_required_fields(&value, CREATE_REQUIRED_FIELDS)
}

/// Check that every dotted path in `fields` holds a non-empty value.
///
/// Each intermediate segment is itself required: `storage.size` fails on
/// `storage` first when the whole object is missing. The first failing path
/// is reported with the value found there.
pub fn check_required_fields(spec: &Value, fields: &[&str]) -> Result<()> {
    for field in fields {
        let mut current = spec;
        let mut path = String::new();
        for segment in field.split('.') {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(segment);

            let value = current.get(segment);
            match value {
                Some(v) if is_present(v) => current = v,
                _ => return Err(Error::missing_field(path, value.filter(|v| !v.is_null()))),
            }
        }
    }
    Ok(())
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
