use serde_json::Value;

/// Replace every empty-string leaf with `null`, descending through arrays and objects.
///
/// Typed columns (uuid, date, numeric) reject `""` at the storage layer, so write
/// bodies are normalized once at the boundary. Filters and read paths are never
/// normalized.
pub fn normalize_payload(value: Value) -> Value {
    match value {
        Value::String(s) if s.is_empty() => Value::Null,
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_payload).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| (key, normalize_payload(v)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_string_becomes_null() {
        assert_eq!(normalize_payload(json!("")), Value::Null);
    }

    #[test]
    fn nested_empty_strings_become_null() {
        let input = json!({
            "customer_id": "",
            "notes": "oil change",
            "items": [
                { "service_item_id": "", "quantity": 2, "tags": ["", "urgent"] },
                { "service_item_id": "5b1c", "discount": null }
            ],
            "meta": { "inner": { "plate": "" } }
        });

        let expected = json!({
            "customer_id": null,
            "notes": "oil change",
            "items": [
                { "service_item_id": null, "quantity": 2, "tags": [null, "urgent"] },
                { "service_item_id": "5b1c", "discount": null }
            ],
            "meta": { "inner": { "plate": null } }
        });

        assert_eq!(normalize_payload(input), expected);
    }

    #[test]
    fn other_scalars_pass_through() {
        assert_eq!(normalize_payload(json!(0)), json!(0));
        assert_eq!(normalize_payload(json!(false)), json!(false));
        assert_eq!(normalize_payload(json!(" ")), json!(" "));
        assert_eq!(normalize_payload(json!(1.5)), json!(1.5));
    }

    #[test]
    fn keys_are_preserved() {
        let out = normalize_payload(json!({ "": "", "a": "" }));
        let obj = out.as_object().unwrap();
        assert!(obj.contains_key(""));
        assert!(obj.contains_key("a"));
        assert_eq!(obj.len(), 2);
    }
}
