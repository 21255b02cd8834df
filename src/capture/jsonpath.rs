//! Minimal JSONPath evaluation for response references.
//!
//! Supported: dot-separated property names with optional `[index]` suffixes,
//! such as `$.items[0].id` or `user.roles[2]`. Anything that fails to parse or
//! match yields `None`.

use serde_json::Value as JsonValue;

/// Represents a segment in a JSONPath expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    /// Object field access (e.g., "user", "name")
    Field(String),

    /// Array index access (e.g., [0], [5])
    ArrayIndex(usize),
}

/// Extracts the value at `path` from a JSON document.
///
/// # Arguments
///
/// * `body` - JSON text
/// * `path` - Path with or without the leading `$.`
///
/// # Returns
///
/// The extracted value as a string, or `None` when the body is not JSON or
/// the path does not match.
pub fn extract_json(body: &str, path: &str) -> Option<String> {
    let json: JsonValue = serde_json::from_str(body).ok()?;
    let value = evaluate(&json, path)?;
    json_value_to_string(value)
}

fn evaluate<'a>(json: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.trim();
    let path = path.strip_prefix('$').unwrap_or(path);
    let path = path.strip_prefix('.').unwrap_or(path);

    let mut current = json;
    for segment in parse_segments(path)? {
        current = match segment {
            PathSegment::Field(name) => current.as_object()?.get(&name)?,
            PathSegment::ArrayIndex(index) => current.as_array()?.get(index)?,
        };
    }
    Some(current)
}

/// Parses a path into segments.
///
/// - "user.name" -> [Field("user"), Field("name")]
/// - "items[0].id" -> [Field("items"), ArrayIndex(0), Field("id")]
///
/// An unterminated or non-numeric index makes the whole path invalid.
fn parse_segments(path: &str) -> Option<Vec<PathSegment>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Field(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Field(std::mem::take(&mut current)));
                }

                let mut index = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ']' {
                        closed = true;
                        break;
                    }
                    index.push(next);
                }
                if !closed {
                    return None;
                }
                segments.push(PathSegment::ArrayIndex(index.trim().parse().ok()?));
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Field(current));
    }

    Some(segments)
}

/// Converts a JSON value to its substitution text.
///
/// Strings lose their quotes; numbers, booleans and null use their JSON
/// spelling; objects and arrays are serialized compactly.
fn json_value_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null => Some("null".to_string()),
        JsonValue::Array(_) | JsonValue::Object(_) => serde_json::to_string(value).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "token": "abc123",
        "user": {"id": 42, "active": true, "roles": ["admin", "dev", "ops"], "manager": null},
        "items": [{"id": 1}, {"id": 2}]
    }"#;

    #[test]
    fn test_parse_segments() {
        assert_eq!(
            parse_segments("items[0].id"),
            Some(vec![
                PathSegment::Field("items".to_string()),
                PathSegment::ArrayIndex(0),
                PathSegment::Field("id".to_string()),
            ])
        );
        assert_eq!(parse_segments("items[x]"), None);
        assert_eq!(parse_segments("items[1"), None);
    }

    #[test]
    fn test_extract_scalars() {
        assert_eq!(extract_json(BODY, "$.token").as_deref(), Some("abc123"));
        assert_eq!(extract_json(BODY, "$.user.id").as_deref(), Some("42"));
        assert_eq!(extract_json(BODY, "$.user.active").as_deref(), Some("true"));
        assert_eq!(extract_json(BODY, "$.user.manager").as_deref(), Some("null"));
    }

    #[test]
    fn test_extract_array_index() {
        assert_eq!(extract_json(BODY, "items[1].id").as_deref(), Some("2"));
        assert_eq!(extract_json(BODY, "$.user.roles[2]").as_deref(), Some("ops"));
    }

    #[test]
    fn test_extract_object_serialized() {
        assert_eq!(extract_json(BODY, "$.items[0]").as_deref(), Some(r#"{"id":1}"#));
    }

    #[test]
    fn test_root_array_index() {
        assert_eq!(extract_json(r#"[{"n":"a"},{"n":"b"}]"#, "$[1].n").as_deref(), Some("b"));
    }

    #[test]
    fn test_missing_values() {
        assert_eq!(extract_json(BODY, "$.missing"), None);
        assert_eq!(extract_json(BODY, "$.items[5].id"), None);
        assert_eq!(extract_json(BODY, "$.token[0]"), None);
        assert_eq!(extract_json("not json", "$.token"), None);
    }
}
