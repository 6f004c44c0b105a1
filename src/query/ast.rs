//! Abstract Syntax Tree for compiled queries
//!
//! This module defines the core `QueryNode` trait that all compiled query types
//! implement. A node knows how to render itself as Elasticsearch query source,
//! which is what the request builder sends and what the debug path prints.

use serde_json::Value;
use std::fmt::Debug;

/// Core trait for all query nodes in the compiled tree
///
/// Query nodes form a tree that mirrors the boolean structure of the request.
/// Nodes are immutable once built; the compiler produces a fresh tree per call.
pub trait QueryNode: Send + Sync + Debug {
    /// Render this node as Elasticsearch query source, e.g. `{"term": {"f": "v"}}`
    fn source(&self) -> Value;

    /// Get the query type name for debugging and logging
    fn query_type(&self) -> &'static str;

    /// Whether this query produces scores (vs just filtering)
    fn is_scoring(&self) -> bool {
        true
    }

    /// Get the boost factor for this query
    fn boost(&self) -> f64 {
        1.0
    }

    /// Clone this query node into a boxed trait object
    fn clone_box(&self) -> Box<dyn QueryNode>;
}

impl Clone for Box<dyn QueryNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
