//! Index mappings for full-text indexes.
//!
//! Every index carries the identity fields of the graph element it mirrors
//! plus one `text` property per indexed field.

use serde_json::{json, Map, Value};

/// Identity property of vertex documents.
pub const VERTEX_FIELDS: &[&str] = &["vid"];

/// Identity properties of edge documents.
pub const EDGE_FIELDS: &[&str] = &["src", "dst", "rank"];

/// Build the create-index body for the given text fields.
///
/// Identity fields are mapped as `keyword` (`rank` as `long`) so they are
/// returned verbatim and never analyzed. When `analyzer` is set it applies
/// to every text field.
pub fn index_mapping(fields: &[String], analyzer: Option<&str>) -> Value {
    let mut properties = Map::new();
    properties.insert("vid".to_string(), json!({ "type": "keyword" }));
    properties.insert("src".to_string(), json!({ "type": "keyword" }));
    properties.insert("dst".to_string(), json!({ "type": "keyword" }));
    properties.insert("rank".to_string(), json!({ "type": "long" }));

    for field in fields {
        let mut mapping = json!({ "type": "text" });
        if let Some(analyzer) = analyzer.filter(|a| !a.is_empty()) {
            mapping["analyzer"] = json!(analyzer);
        }
        properties.insert(field.clone(), mapping);
    }

    json!({
        "mappings": {
            "properties": properties
        }
    })
}
