//! Request query parameters with bracket notation.
//!
//! `createdAt[after]=2023-01-01&age[]=30&age[]=31` decodes to
//! `{"createdAt": {"after": "2023-01-01"}, "age": ["30", "31"]}`, keeping
//! the order in which parameters first appear.

use serde_json::{Map, Value};

/// Decoded request query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParameters {
    params: Map<String, Value>,
}

impl RequestParameters {
    /// Decode a URL query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        let mut params = Map::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            insert(&mut params, &key, value.into_owned());
        }
        Self { params }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.params.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The parameters as a filter context mapping.
    pub fn to_value(&self) -> Value {
        Value::Object(self.params.clone())
    }
}

impl From<Map<String, Value>> for RequestParameters {
    fn from(params: Map<String, Value>) -> Self {
        Self { params }
    }
}

/// Split `a[b][]` into `("a", ["b", ""])`; keys with unbalanced brackets
/// are kept literal.
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    let (base, mut rest) = key.split_at(open);
    if base.is_empty() {
        return (key, Vec::new());
    }

    let mut segments = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return (key, Vec::new());
        };
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() {
        return (key, Vec::new());
    }

    (base, segments)
}

fn insert(params: &mut Map<String, Value>, key: &str, value: String) {
    let (base, segments) = split_key(key);
    let slot = params.entry(base.to_string()).or_insert(Value::Null);
    insert_nested(slot, &segments, value);
}

fn insert_nested(slot: &mut Value, segments: &[&str], value: String) {
    let Some((segment, rest)) = segments.split_first() else {
        *slot = Value::String(value);
        return;
    };

    if segment.is_empty() {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            items.push(Value::Null);
            if let Some(last) = items.last_mut() {
                insert_nested(last, rest, value);
            }
        }
        return;
    }

    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        let child = map.entry(segment.to_string()).or_insert(Value::Null);
        insert_nested(child, rest, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_parameters() {
        let params = RequestParameters::parse("age=30&name=foo%20bar");
        assert_eq!(params.get("age"), Some(&json!("30")));
        assert_eq!(params.get("name"), Some(&json!("foo bar")));
    }

    #[test]
    fn bracket_notation_builds_maps_and_lists() {
        let params = RequestParameters::parse(
            "createdAt%5Bafter%5D=2023-01-01&age[]=30&age[]=31&createdAt[before]=2024-01-01",
        );
        assert_eq!(
            params.to_value(),
            json!({
                "createdAt": {"after": "2023-01-01", "before": "2024-01-01"},
                "age": ["30", "31"]
            })
        );
    }

    #[test]
    fn insertion_order_is_kept() {
        let params = RequestParameters::parse("z=1&a=2&m[x]=3");
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn dotted_names_are_kept() {
        let params = RequestParameters::parse("relatedDummy.age[gt]=3");
        assert_eq!(
            params.get("relatedDummy.age"),
            Some(&json!({"gt": "3"}))
        );
    }

    #[test]
    fn malformed_brackets_stay_literal() {
        let params = RequestParameters::parse("a[b=1&[x]=2&c[d]e=3");
        assert_eq!(params.get("a[b"), Some(&json!("1")));
        assert_eq!(params.get("[x]"), Some(&json!("2")));
        assert_eq!(params.get("c[d]e"), Some(&json!("3")));
    }

    #[test]
    fn later_scalar_replaces_earlier_value() {
        let params = RequestParameters::parse("age=1&age=2");
        assert_eq!(params.get("age"), Some(&json!("2")));
    }
}
