//! Overlay key checking against a schema's descriptor tree.

use crate::Schema;
use crate::descriptor::join_path;
use log::warn;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Known key paths of a schema: leaf fields plus every nested prefix.
pub(super) struct KnownKeys {
    leaves: HashSet<String>,
    sections: HashSet<String>,
}

impl KnownKeys {
    pub(super) fn of<S: Schema>() -> Self {
        let mut leaves = HashSet::new();
        let mut sections = HashSet::new();
        for row in S::describe() {
            let mut prefix = row.path.as_str();
            while let Some((parent, _)) = prefix.rsplit_once('.') {
                sections.insert(parent.to_string());
                prefix = parent;
            }
            leaves.insert(row.path);
        }
        Self { leaves, sections }
    }

    /// Collect overlay key paths that map onto no schema field.
    pub(super) fn unknown_keys(&self, value: &Value) -> Vec<String> {
        let mut unknown = Vec::new();
        if let Value::Object(map) = value {
            self.collect_unknown(map, "", &mut unknown);
        }
        unknown
    }

    fn collect_unknown(&self, map: &Map<String, Value>, prefix: &str, unknown: &mut Vec<String>) {
        for (key, value) in map {
            let path = join_path(prefix, key);
            if self.leaves.contains(&path) {
                continue;
            }
            if self.sections.contains(&path) {
                if let Value::Object(child) = value {
                    self.collect_unknown(child, &path, unknown);
                }
                continue;
            }
            unknown.push(path);
        }
    }
}

/// Warn about overlay keys the schema does not know about.
///
/// Unknown keys are otherwise ignored by decoding.
pub(super) fn warn_unknown_keys<S: Schema>(value: &Value, label: &str) {
    for path in KnownKeys::of::<S>().unknown_keys(value) {
        warn!("ignoring unknown key in overlay {label}: {path}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldDescriptor, field_accessor};
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::LazyLock;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Limits {
        max: i32,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Root {
        name: String,
        limits: Limits,
    }

    impl Schema for Limits {
        fn fields() -> &'static [FieldDescriptor<Self>] {
            static FIELDS: LazyLock<Vec<FieldDescriptor<Limits>>> = LazyLock::new(|| {
                vec![FieldDescriptor::int32("max", field_accessor!(Limits, max: i32))]
            });
            FIELDS.as_slice()
        }
    }

    impl Schema for Root {
        fn fields() -> &'static [FieldDescriptor<Self>] {
            static FIELDS: LazyLock<Vec<FieldDescriptor<Root>>> = LazyLock::new(|| {
                vec![
                    FieldDescriptor::string("name", field_accessor!(Root, name: String)),
                    FieldDescriptor::nested("limits", field_accessor!(Root, limits: Limits)),
                ]
            });
            FIELDS.as_slice()
        }
    }

    #[test]
    fn known_keys_pass() {
        let keys = KnownKeys::of::<Root>();
        let value = json!({ "name": "x", "limits": { "max": 3 } });
        assert!(keys.unknown_keys(&value).is_empty());
    }

    #[test]
    fn unknown_keys_are_reported_with_paths() {
        let keys = KnownKeys::of::<Root>();
        let value = json!({ "nmae": "x", "limits": { "max": 3, "min": 1 } });
        let mut unknown = keys.unknown_keys(&value);
        unknown.sort();
        assert_eq!(unknown, vec!["limits.min".to_string(), "nmae".to_string()]);
    }
}
