//! JSON merge helpers for overlay documents.

use serde_json::Value;

/// Merge overlay values into the base, recursively overriding objects.
///
/// Keys absent from the overlay keep their base value, and `null` overlay
/// values leave the base untouched. Arrays and scalars replace wholesale.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        if !value.is_null() {
                            base_map.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}
