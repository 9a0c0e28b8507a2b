//! Overlaying one config layer on the layers below it.

use serde_json::Value;

/// Lay `overlay` over `base`. Objects merge key by key and anything else
/// replaces the lower value. A `null` member drops the key so the built-in
/// default applies again.
pub(super) fn overlay_layer(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(lower), Value::Object(upper)) => {
            for (key, value) in upper {
                if value.is_null() {
                    lower.remove(key);
                } else if let Some(slot) = lower.get_mut(key) {
                    overlay_layer(slot, value);
                } else {
                    lower.insert(key.clone(), value.clone());
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::overlay_layer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn sections_merge_and_scalars_override() {
        let mut merged = json!({ "storage": { "key": "a", "quota_bytes": 10 }, "export": { "dir": "x" } });
        overlay_layer(&mut merged, &json!({ "storage": { "key": "b" } }));
        assert_eq!(
            merged,
            json!({ "storage": { "key": "b", "quota_bytes": 10 }, "export": { "dir": "x" } })
        );
    }

    #[test]
    fn null_resets_a_lower_layer_value() {
        let mut merged = json!({ "storage": { "path": "/srv/prompts", "key": "k" } });
        overlay_layer(&mut merged, &json!({ "storage": { "path": null } }));
        assert_eq!(merged, json!({ "storage": { "key": "k" } }));
    }
}
