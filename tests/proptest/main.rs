// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Property-based tests for minecraft-operator.
//!
//! Uses proptest to generate random inputs and verify invariants.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

use minecraft_operator::controller::labels::{LabelOp, diff_labels, flatten};
use minecraft_operator::controller::validation::{CREATE_REQUIRED_FIELDS, check_required_fields};
use minecraft_operator::resources::secret::RCON_PASSWORD_LENGTH;
use minecraft_operator::resources::{DependentKind, RconPassword};

/// Strategy for DNS-1123 style parent names.
fn parent_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,30}[a-z0-9]"
}

/// Strategy for label maps.
fn label_map() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,6}", 0..8)
}

fn valid_spec() -> serde_json::Value {
    json!({
        "storage": { "size": "10Gi", "class": "standard" },
        "serverConfig": {
            "motd": "Hi",
            "name": "mc1",
            "memory": "1G",
            "maxMemory": "2G",
            "maxPlayers": 20,
            "serverType": "VANILLA"
        }
    })
}

proptest! {
    /// Property: dependent names are distinct and derived from the parent name.
    #[test]
    fn prop_dependent_names_distinct(name in parent_name()) {
        let names: Vec<String> = DependentKind::ALL
            .iter()
            .map(|kind| kind.dependent_name(&name))
            .collect();
        for (i, a) in names.iter().enumerate() {
            prop_assert!(a.starts_with(&name));
            for b in names.iter().skip(i + 1) {
                prop_assert_ne!(a, b);
            }
        }
    }

    /// Property: passwords always have the fixed length and alphabet.
    #[test]
    fn prop_password_shape(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let password = RconPassword::generate_with(&mut rng);
        prop_assert_eq!(password.expose().len(), RCON_PASSWORD_LENGTH);
        prop_assert!(password.expose().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    /// Property: applying the flattened diff of old -> new to old yields new.
    #[test]
    fn prop_flattened_diff_converges(old in label_map(), new in label_map()) {
        let patch = flatten(&diff_labels(&old, &new));
        let mut applied = old.clone();
        for (key, value) in patch {
            match value {
                Some(v) => { applied.insert(key, v); }
                None => { applied.remove(&key); }
            }
        }
        prop_assert_eq!(applied, new);
    }

    /// Property: a diff carries exactly one change per differing key.
    #[test]
    fn prop_diff_is_minimal(old in label_map(), new in label_map()) {
        let diff = diff_labels(&old, &new);
        for change in &diff {
            let key = change.key().unwrap();
            match change.op {
                LabelOp::Add => prop_assert!(!old.contains_key(key) && new.contains_key(key)),
                LabelOp::Remove => prop_assert!(old.contains_key(key) && !new.contains_key(key)),
                LabelOp::Change => prop_assert_ne!(old.get(key), new.get(key)),
            }
        }
        let differing = old
            .keys()
            .chain(new.keys())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .filter(|k| old.get(*k) != new.get(*k))
            .count();
        prop_assert_eq!(diff.len(), differing);
    }

    /// Property: blanking any required field fails validation.
    #[test]
    fn prop_blank_required_field_rejected(
        index in 0..CREATE_REQUIRED_FIELDS.len(),
        blank in prop_oneof![Just(json!(null)), Just(json!("")), Just(json!(0)), Just(json!(false))],
    ) {
        let field = CREATE_REQUIRED_FIELDS[index];
        let (root, leaf) = field.split_once('.').unwrap();
        let mut spec = valid_spec();
        spec[root][leaf] = blank;

        let err = check_required_fields(&spec, CREATE_REQUIRED_FIELDS).unwrap_err();
        prop_assert!(err.is_permanent());
        prop_assert!(err.to_string().starts_with(field));
    }
}

#[test]
fn test_valid_spec_passes_validation() {
    assert!(check_required_fields(&valid_spec(), CREATE_REQUIRED_FIELDS).is_ok());
}
