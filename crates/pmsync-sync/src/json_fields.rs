use std::collections::BTreeMap;

use pmsync_core::Value;

/// Replaces list and map values in the listed columns with their encoded JSON text.
///
/// Scalars, already-encoded strings and absent columns are left alone. Returns the
/// number of columns that were encoded.
pub fn encode_json_fields(columns: &mut BTreeMap<String, Value>, json_fields: &[String]) -> usize {
    let mut encoded = 0;
    for field in json_fields {
        if let Some(value) = columns.get_mut(field) {
            if value.is_composite() {
                *value = Value::String(value.to_json_text());
                encoded += 1;
            }
        }
    }
    encoded
}

/// Decodes a stored JSON column back into a value. `None` when the column is not
/// encoded JSON text.
pub fn decode_json_field(stored: &Value) -> Option<Value> {
    let text = stored.as_str()?;
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .map(Value::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn composites_are_encoded_and_scalars_pass_through() {
        let tags = Value::List(vec![Value::from("blue"), Value::from("urgent")]);
        let custom = Value::Map(BTreeMap::from([
            ("z".to_string(), Value::from(1)),
            ("a".to_string(), Value::Null),
        ]));
        let mut columns = BTreeMap::from([
            ("tag_list".to_string(), tags.clone()),
            ("custom_fields".to_string(), custom),
            ("tag_colors".to_string(), Value::from(r#"{"blue":"navy"}"#)),
            ("name".to_string(), Value::List(vec![Value::from(1)])),
        ]);

        let encoded = encode_json_fields(
            &mut columns,
            &fields(&["tag_list", "custom_fields", "tag_colors", "missing"]),
        );

        assert_eq!(encoded, 2);
        assert_eq!(columns["tag_list"], Value::from(r#"["blue","urgent"]"#));
        assert_eq!(columns["custom_fields"], Value::from(r#"{"a":null,"z":1}"#));
        assert_eq!(columns["tag_colors"], Value::from(r#"{"blue":"navy"}"#));
        assert!(columns["name"].is_composite());
        assert!(!columns.contains_key("missing"));

        assert_eq!(decode_json_field(&columns["tag_list"]), Some(tags));
    }

    #[test]
    fn encoding_twice_is_a_no_op() {
        let mut columns = BTreeMap::from([(
            "tag_list".to_string(),
            Value::List(vec![Value::from("a")]),
        )]);
        encode_json_fields(&mut columns, &fields(&["tag_list"]));
        let once = columns.clone();
        assert_eq!(encode_json_fields(&mut columns, &fields(&["tag_list"])), 0);
        assert_eq!(columns, once);
    }
}
