//! Exists query - matches documents that have a value for a field

use crate::query::ast::QueryNode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Query that matches documents where `field` is present
///
/// The optional name is echoed back by the engine in `matched_queries`; it
/// never changes which documents match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExistsQuery {
    pub field: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ExistsQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            name: None,
        }
    }

    /// Attach an identifying name (`_name`) to this clause
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl QueryNode for ExistsQuery {
    fn source(&self) -> Value {
        let mut inner = Map::new();
        inner.insert("field".to_string(), json!(self.field));
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            inner.insert("_name".to_string(), json!(name));
        }
        json!({ "exists": inner })
    }

    fn query_type(&self) -> &'static str {
        "exists"
    }

    fn is_scoring(&self) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
