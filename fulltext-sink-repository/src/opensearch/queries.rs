//! Search request builders.
//!
//! Each builder returns a full `_search` body. Results always include the
//! identity fields so hits can be turned back into graph elements.

use std::time::Duration;

use serde_json::{json, Value};

use super::index_config::{EDGE_FIELDS, VERTEX_FIELDS};

/// Paging and timeout applied to a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub from: Option<usize>,
    pub size: Option<usize>,
    /// Server-side search timeout.
    pub timeout: Option<Duration>,
}

impl SearchOptions {
    pub fn page(from: usize, size: usize) -> Self {
        Self {
            from: Some(from),
            size: Some(size),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set `from` and `size` on `body` when present.
    pub fn apply(&self, mut body: Value) -> Value {
        if let Some(from) = self.from {
            body["from"] = json!(from);
        }
        if let Some(size) = self.size {
            body["size"] = json!(size);
        }
        body
    }
}

fn with_source(query: Value) -> Value {
    let source: Vec<&str> = VERTEX_FIELDS.iter().chain(EDGE_FIELDS).copied().collect();
    json!({
        "query": query,
        "_source": source
    })
}

/// Query-string syntax search over `fields` (all fields when empty).
pub fn build_query_string(query: &str, fields: &[String]) -> Value {
    let mut inner = json!({ "query": query });
    if !fields.is_empty() {
        inner["fields"] = json!(fields);
    }
    with_source(json!({ "query_string": inner }))
}

/// Every document of the index.
pub fn build_match_all() -> Value {
    with_source(json!({ "match_all": {} }))
}

/// Terms of `field` starting with `prefix`.
pub fn build_prefix(field: &str, prefix: &str) -> Value {
    with_source(json!({ "prefix": { field: prefix } }))
}

/// Terms of `field` matching a `*`/`?` pattern.
pub fn build_wildcard(field: &str, pattern: &str) -> Value {
    with_source(json!({ "wildcard": { field: { "value": pattern } } }))
}

/// Terms of `field` matching a regular expression.
pub fn build_regexp(field: &str, pattern: &str) -> Value {
    with_source(json!({ "regexp": { field: pattern } }))
}

/// Match on `field` tolerating edits.
///
/// `fuzziness` follows the cluster syntax (`"AUTO"`, `"1"`, `"2"`); `operator`
/// is `"or"` or `"and"` and decides how multi-term values combine.
pub fn build_fuzzy(field: &str, value: &str, fuzziness: &str, operator: &str) -> Value {
    with_source(json!({
        "match": {
            field: {
                "query": value,
                "fuzziness": fuzziness,
                "operator": operator
            }
        }
    }))
}

/// Delete-by-query body removing every document.
pub fn build_clear_all() -> Value {
    json!({ "query": { "match_all": {} } })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string() {
        let body = build_query_string("hello*", &["text".to_string()]);
        assert_eq!(body["query"]["query_string"]["query"], "hello*");
        assert_eq!(body["query"]["query_string"]["fields"][0], "text");
        assert_eq!(body["_source"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_query_string_all_fields() {
        let body = build_query_string("x", &[]);
        assert!(body["query"]["query_string"].get("fields").is_none());
    }

    #[test]
    fn test_term_level_queries() {
        assert_eq!(build_prefix("name", "ab")["query"]["prefix"]["name"], "ab");
        assert_eq!(
            build_wildcard("name", "a?c*")["query"]["wildcard"]["name"]["value"],
            "a?c*"
        );
        assert_eq!(build_regexp("name", "a.*")["query"]["regexp"]["name"], "a.*");
    }

    #[test]
    fn test_fuzzy() {
        let body = build_fuzzy("name", "helo", "AUTO", "and");
        let inner = &body["query"]["match"]["name"];
        assert_eq!(inner["query"], "helo");
        assert_eq!(inner["fuzziness"], "AUTO");
        assert_eq!(inner["operator"], "and");
    }

    #[test]
    fn test_paging() {
        let options = SearchOptions::page(10, 5).with_timeout(Duration::from_secs(1));
        let body = options.apply(build_match_all());
        assert_eq!(body["from"], 10);
        assert_eq!(body["size"], 5);
        assert!(body.get("timeout").is_none());

        let body = SearchOptions::default().apply(build_match_all());
        assert!(body.get("from").is_none());
    }
}
