//! Array-valued columns (`technologies`, `tags`) are stored as JSON text.
//! Older rows hold comma-separated strings, so reads decode defensively:
//! JSON array, then array passthrough, then comma split, then empty.

use serde_json::Value;

/// Outcome of decoding a list field, tagged with the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListDecode {
    /// The text was a JSON array.
    Parsed(Vec<String>),
    /// The value was already an array.
    Passthrough(Vec<String>),
    /// The text was split on commas.
    Fallback(Vec<String>),
    /// Nothing usable.
    Empty,
}

impl ListDecode {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ListDecode::Parsed(items)
            | ListDecode::Passthrough(items)
            | ListDecode::Fallback(items) => items,
            ListDecode::Empty => Vec::new(),
        }
    }
}

/// Decode stored text.
pub fn decode_list(raw: &str) -> ListDecode {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ListDecode::Empty;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => ListDecode::Parsed(strings_of(&items)),
        // JSON-encoded string, as stored when a client sent "a, b" instead of an array
        Ok(Value::String(inner)) => split_commas(&inner),
        _ => split_commas(trimmed),
    }
}

/// Decode a value from a request body, which may be an array or a string.
pub fn decode_list_value(value: &Value) -> ListDecode {
    match value {
        Value::String(raw) => decode_list(raw),
        Value::Array(items) => ListDecode::Passthrough(strings_of(items)),
        _ => ListDecode::Empty,
    }
}

/// Encode for storage.
pub fn encode_list(items: &[String]) -> String {
    Value::Array(items.iter().cloned().map(Value::String).collect()).to_string()
}

fn strings_of(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

fn split_commas(raw: &str) -> ListDecode {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        ListDecode::Empty
    } else {
        ListDecode::Fallback(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_json_array_takes_parse_path() {
        assert_eq!(
            decode_list(r#"["Rust","Axum"]"#),
            ListDecode::Parsed(list(&["Rust", "Axum"]))
        );
    }

    #[test]
    fn test_encoded_list_decodes_to_original() {
        let original = list(&["Next.js", "React, hooks", "Prisma"]);
        assert_eq!(decode_list(&encode_list(&original)).into_vec(), original);
        assert_eq!(decode_list(&encode_list(&[])), ListDecode::Parsed(vec![]));
    }

    #[test]
    fn test_comma_string_matches_json_equivalent() {
        let legacy = decode_list("React, TypeScript ,Node.js");
        assert!(matches!(legacy, ListDecode::Fallback(_)));
        assert_eq!(
            legacy.into_vec(),
            decode_list(r#"["React","TypeScript","Node.js"]"#).into_vec()
        );
    }

    #[test]
    fn test_non_array_json_falls_back_to_split() {
        assert_eq!(decode_list("42"), ListDecode::Fallback(list(&["42"])));
        assert_eq!(
            decode_list(r#"{"a":1}"#),
            ListDecode::Fallback(list(&[r#"{"a":1}"#]))
        );
    }

    #[test]
    fn test_json_string_is_unquoted_before_split() {
        assert_eq!(
            decode_list(r#""React, Rust""#),
            ListDecode::Fallback(list(&["React", "Rust"]))
        );
        assert_eq!(decode_list(r#"" , ""#), ListDecode::Empty);
    }

    #[test]
    fn test_blank_and_comma_only_are_empty() {
        assert_eq!(decode_list(""), ListDecode::Empty);
        assert_eq!(decode_list("   "), ListDecode::Empty);
        assert_eq!(decode_list(" , ,"), ListDecode::Empty);
    }

    #[test]
    fn test_request_values() {
        assert_eq!(
            decode_list_value(&json!(["Rust", null, 2])),
            ListDecode::Passthrough(list(&["Rust", "2"]))
        );
        assert_eq!(
            decode_list_value(&json!("Rust, Go")),
            ListDecode::Fallback(list(&["Rust", "Go"]))
        );
        assert_eq!(decode_list_value(&json!(null)), ListDecode::Empty);
        assert_eq!(decode_list_value(&json!(true)), ListDecode::Empty);
    }
}
