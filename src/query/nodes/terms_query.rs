//! Terms query - matches documents containing any of the specified values

use crate::query::ast::QueryNode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Query that matches documents whose field equals any of the given values
///
/// This is a set-membership test, equivalent to a boolean OR of term queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TermsQuery {
    /// Field to search in
    pub field: String,
    /// Values to match (document must contain at least one)
    pub values: Vec<Value>,
    /// Boost factor for scoring
    #[serde(default = "default_boost")]
    pub boost: f64,
}

fn default_boost() -> f64 {
    1.0
}

impl TermsQuery {
    /// Create a new terms query
    pub fn new(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            values,
            boost: 1.0,
        }
    }

    /// Set the boost factor
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }

    /// Add a value to the query
    pub fn add_value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }
}

impl QueryNode for TermsQuery {
    fn source(&self) -> Value {
        let mut inner = Map::new();
        inner.insert(self.field.clone(), Value::Array(self.values.clone()));
        if self.boost != 1.0 {
            inner.insert("boost".to_string(), json!(self.boost));
        }
        json!({ "terms": inner })
    }

    fn query_type(&self) -> &'static str {
        "terms"
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
