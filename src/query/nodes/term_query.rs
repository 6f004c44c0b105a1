//! Term query - exact match on a field

use crate::query::ast::QueryNode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Query that matches documents whose field equals an exact value
///
/// The value is not analyzed; numbers and booleans keep their JSON type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    /// Field to search in
    pub field: String,
    /// Exact value to match
    pub value: Value,
    /// Boost factor for scoring
    #[serde(default = "default_boost")]
    pub boost: f64,
}

fn default_boost() -> f64 {
    1.0
}

impl TermQuery {
    /// Create a new term query
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            boost: 1.0,
        }
    }

    /// Set the boost factor
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }
}

impl QueryNode for TermQuery {
    fn source(&self) -> Value {
        let mut inner = serde_json::Map::new();
        if self.boost == 1.0 {
            inner.insert(self.field.clone(), self.value.clone());
        } else {
            inner.insert(
                self.field.clone(),
                json!({ "value": self.value, "boost": self.boost }),
            );
        }
        json!({ "term": inner })
    }

    fn query_type(&self) -> &'static str {
        "term"
    }

    fn is_scoring(&self) -> bool {
        false
    }

    fn boost(&self) -> f64 {
        self.boost
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
