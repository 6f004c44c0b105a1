//! Match query - full-text search with analysis

use crate::query::ast::QueryNode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Query that performs full-text search on a field
///
/// The engine analyzes the query text with the field's analyzer. The boost
/// weights this clause against its siblings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchQuery {
    /// Field to search in
    pub field: String,
    /// Text (or value) to search for
    pub query: Value,
    /// Boost factor for scoring
    #[serde(default = "default_boost")]
    pub boost: f64,
}

fn default_boost() -> f64 {
    1.0
}

impl MatchQuery {
    /// Create a new match query
    pub fn new(field: impl Into<String>, query: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            query: query.into(),
            boost: 1.0,
        }
    }

    /// Set the boost factor
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }
}

impl QueryNode for MatchQuery {
    fn source(&self) -> Value {
        let mut inner = Map::new();
        inner.insert(
            self.field.clone(),
            json!({ "query": self.query, "boost": self.boost }),
        );
        json!({ "match": inner })
    }

    fn query_type(&self) -> &'static str {
        "match"
    }

    fn boost(&self) -> f64 {
        self.boost
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
