//! Status management utilities.
//!
//! Provides helpers for building conditions and the status merge patch.

use serde_json::{Map, Value};

use crate::crd::{Condition, MinecraftServerStatus};

/// Builder for managing conditions list
pub struct ConditionBuilder {
    conditions: Vec<Condition>,
}

impl ConditionBuilder {
    /// Create a new condition builder
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Start from an existing conditions list
    pub fn from_existing(conditions: &[Condition]) -> Self {
        Self {
            conditions: conditions.to_vec(),
        }
    }

    /// Add or update a condition
    ///
    /// The transition time of an existing condition is kept when its status
    /// does not change.
    pub fn set(&mut self, mut condition: Condition) -> &mut Self {
        if let Some(existing) = self
            .conditions
            .iter_mut()
            .find(|c| c.r#type == condition.r#type)
        {
            if existing.status == condition.status {
                condition.last_transition_time = existing.last_transition_time.clone();
            }
            *existing = condition;
        } else {
            self.conditions.push(condition);
        }
        self
    }

    /// Set Ready condition
    pub fn ready(
        &mut self,
        ready: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
    ) -> &mut Self {
        self.set(Condition::ready(ready, reason, message, generation))
    }

    /// Set Progressing condition
    pub fn progressing(
        &mut self,
        progressing: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
    ) -> &mut Self {
        self.set(Condition::progressing(
            progressing,
            reason,
            message,
            generation,
        ))
    }

    /// Set Degraded condition
    pub fn degraded(
        &mut self,
        degraded: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
    ) -> &mut Self {
        self.set(Condition::degraded(degraded, reason, message, generation))
    }

    /// Build the conditions list
    pub fn build(self) -> Vec<Condition> {
        self.conditions
    }
}

impl Default for ConditionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a condition type is true
pub fn is_condition_true(conditions: &[Condition], condition_type: &str) -> bool {
    conditions
        .iter()
        .find(|c| c.r#type == condition_type)
        .is_some_and(|c| c.status == "True")
}

/// Merge patch body turning the `old` status into `new`.
///
/// Merge patches merge maps, so labels dropped from `observedLabels` are
/// sent as explicit nulls.
pub fn status_patch(
    old: Option<&MinecraftServerStatus>,
    new: &MinecraftServerStatus,
) -> serde_json::Result<Value> {
    let mut status = serde_json::to_value(new)?;
    let previous = old.and_then(|s| s.observed_labels.as_ref());
    if let (Some(previous), Value::Object(fields)) = (previous, &mut status) {
        let current = new.observed_labels.clone().unwrap_or_default();
        let observed = fields
            .entry("observedLabels")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(labels) = observed {
            for key in previous.keys().filter(|k| !current.contains_key(*k)) {
                labels.insert(key.clone(), Value::Null);
            }
        }
    }
    Ok(serde_json::json!({ "status": status }))
}
