//! Range query - matches documents with field values in a range

use crate::query::ast::QueryNode;
use crate::query::types::{RangeBounds, RangeOp};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Query that matches documents with field values within a specified range
///
/// Works with numeric, date and keyword fields; bound values are passed through
/// verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    /// Field to search in
    pub field: String,
    /// Range bounds (gte, gt, lte, lt)
    #[serde(flatten)]
    pub bounds: RangeBounds,
}

impl RangeQuery {
    /// Create a new range query
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            bounds: RangeBounds::default(),
        }
    }

    /// Constrain one side of the range
    pub fn bound(mut self, op: RangeOp, value: impl Into<Value>) -> Self {
        self.bounds.set(op, value.into());
        self
    }

    /// Set the greater-than-or-equal bound
    pub fn gte(self, value: impl Into<Value>) -> Self {
        self.bound(RangeOp::Gte, value)
    }

    /// Set the less-than bound
    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.bound(RangeOp::Lt, value)
    }

    /// Set the bounds from a RangeBounds struct
    pub fn with_bounds(mut self, bounds: RangeBounds) -> Self {
        self.bounds = bounds;
        self
    }
}

impl QueryNode for RangeQuery {
    fn source(&self) -> Value {
        let mut inner = Map::new();
        inner.insert(self.field.clone(), Value::Object(self.bounds.to_map()));
        json!({ "range": inner })
    }

    fn query_type(&self) -> &'static str {
        "range"
    }

    fn is_scoring(&self) -> bool {
        // Range queries typically don't contribute to relevance
        false
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
