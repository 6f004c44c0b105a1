//! Multi-match query - full-text search across several fields

use crate::query::ast::QueryNode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Query that searches one text across multiple fields
///
/// Field names may carry wildcards (`*_title`) or boost suffixes (`title^2`);
/// both are passed to the engine verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiMatchQuery {
    pub query: Value,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl MultiMatchQuery {
    pub fn new(query: impl Into<Value>, fields: Vec<String>) -> Self {
        Self {
            query: query.into(),
            fields,
        }
    }
}

impl QueryNode for MultiMatchQuery {
    fn source(&self) -> Value {
        let mut inner = Map::new();
        inner.insert("query".to_string(), self.query.clone());
        if !self.fields.is_empty() {
            inner.insert("fields".to_string(), json!(self.fields));
        }
        json!({ "multi_match": inner })
    }

    fn query_type(&self) -> &'static str {
        "multi_match"
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
