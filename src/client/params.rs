//! Query-string encoding
//!
//! Turns named JSON values into `key=value` fragments the way the PHP
//! backend parses them back: arrays as `key[]=v` (or `key[0]=v`), mappings
//! as `key[sub]=v`, or the whole value as one JSON document when the
//! structured hint is used. Encoding is a pure function of its inputs.

use serde_json::{Map, Value};
use std::fmt;

/// How arrays and mappings are laid out in the query string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatHint {
    /// `key[]=a&key[]=b`, mappings as `key[sub]=v`
    #[default]
    Repeated,
    /// `key[0]=a&key[1]=b`, mappings as `key[sub]=v`
    Indexed,
    /// Arrays and mappings sent as a single JSON fragment
    Structured,
}

/// A single encoded `key=value` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamFragment(String);

impl ParamFragment {
    fn new(name: &str, raw: &str) -> Self {
        Self(format!("{}={}", name, urlencoding::encode(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ParamFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text form of a leaf value; `None` for null
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        // Deeper than one level: compact JSON
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Encode one named value into zero or more fragments
pub fn encode(value: Option<&Value>, key: &str, hint: FormatHint) -> Vec<ParamFragment> {
    let Some(value) = value else {
        return Vec::new();
    };

    let key = urlencoding::encode(key);
    let mut fragments = Vec::new();

    match value {
        Value::Null => {},
        Value::Array(_) | Value::Object(_) if hint == FormatHint::Structured => {
            fragments.push(ParamFragment::new(&key, &value.to_string()));
        },
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let Some(raw) = scalar_text(item) else {
                    continue;
                };
                let name = match hint {
                    FormatHint::Indexed => format!("{}[{}]", key, index),
                    _ => format!("{}[]", key),
                };
                fragments.push(ParamFragment::new(&name, &raw));
            }
        },
        Value::Object(map) => {
            for (sub_key, item) in map {
                let Some(raw) = scalar_text(item) else {
                    continue;
                };
                let name = format!("{}[{}]", key, urlencoding::encode(sub_key));
                fragments.push(ParamFragment::new(&name, &raw));
            }
        },
        scalar => {
            if let Some(raw) = scalar_text(scalar) {
                fragments.push(ParamFragment::new(&key, &raw));
            }
        },
    }

    fragments
}

/// Encode every entry of `params` and join the fragments with `&`
pub fn build_query<F>(params: &Map<String, Value>, hint_for: F) -> String
where
    F: Fn(&str) -> FormatHint,
{
    params
        .iter()
        .flat_map(|(key, value)| encode(Some(value), key, hint_for(key)))
        .map(ParamFragment::into_string)
        .collect::<Vec<_>>()
        .join("&")
}

/// Append an encoded query to a URL; an empty query leaves it untouched
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&{}", url, query)
    } else {
        format!("{}?{}", url, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(fragments: Vec<ParamFragment>) -> Vec<String> {
        fragments.into_iter().map(ParamFragment::into_string).collect()
    }

    #[test]
    fn test_scalar_is_url_encoded() {
        let value = json!("title,nid");
        assert_eq!(
            strings(encode(Some(&value), "fields", FormatHint::default())),
            vec!["fields=title%2Cnid"]
        );
        assert_eq!(
            strings(encode(Some(&json!(1)), "page", FormatHint::default())),
            vec!["page=1"]
        );
        assert_eq!(
            strings(encode(Some(&json!(true)), "format_output", FormatHint::default())),
            vec!["format_output=1"]
        );
    }

    #[test]
    fn test_absent_and_null_emit_nothing() {
        assert!(encode(None, "page", FormatHint::default()).is_empty());
        assert!(encode(Some(&Value::Null), "page", FormatHint::Structured).is_empty());
    }

    #[test]
    fn test_array_forms() {
        let args = json!(["a b", 2, null]);
        assert_eq!(
            strings(encode(Some(&args), "args", FormatHint::Repeated)),
            vec!["args[]=a%20b", "args[]=2"]
        );
        assert_eq!(
            strings(encode(Some(&args), "args", FormatHint::Indexed)),
            vec!["args[0]=a%20b", "args[1]=2"]
        );
    }

    #[test]
    fn test_mapping_flattens_one_level() {
        let filters = json!({"nid": 12345, "type": "article", "tags": [1, 2]});
        assert_eq!(
            strings(encode(Some(&filters), "parameters", FormatHint::Repeated)),
            vec![
                "parameters[nid]=12345",
                "parameters[type]=article",
                "parameters[tags]=%5B1%2C2%5D",
            ]
        );
    }

    #[test]
    fn test_structured_mapping_is_single_json_fragment() {
        let filters = json!({"nid": 12345});
        let fragments = strings(encode(Some(&filters), "exposed_filters", FormatHint::Structured));
        assert_eq!(fragments, vec!["exposed_filters=%7B%22nid%22%3A12345%7D"]);
    }

    #[test]
    fn test_build_query_joins_in_order() {
        let params = json!({"page": 1, "fields": "title,nid", "pagesize": null});
        let query = build_query(params.as_object().unwrap(), |_| FormatHint::default());
        assert_eq!(query, "page=1&fields=title%2Cnid");
    }

    #[test]
    fn test_build_query_uses_hint_per_key() {
        let params = json!({"args": ["x"], "exposed_filters": {"nid": 1}});
        let query = build_query(params.as_object().unwrap(), |key| {
            if key == "exposed_filters" {
                FormatHint::Structured
            } else {
                FormatHint::Repeated
            }
        });
        assert_eq!(query, "args[]=x&exposed_filters=%7B%22nid%22%3A1%7D");
    }

    #[test]
    fn test_append_query() {
        assert_eq!(append_query("http://h/api/views/front", ""), "http://h/api/views/front");
        assert_eq!(append_query("http://h/api/views/front", "a=1"), "http://h/api/views/front?a=1");
        assert_eq!(append_query("http://h/api?x=1", "a=1"), "http://h/api?x=1&a=1");
    }

    #[test]
    fn test_encoding_is_repeatable() {
        let value = json!({"a": [1, 2], "b": "c"});
        let first = encode(Some(&value), "q", FormatHint::Indexed);
        let second = encode(Some(&value), "q", FormatHint::Indexed);
        assert_eq!(first, second);
    }
}
