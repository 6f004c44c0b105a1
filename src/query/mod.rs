//! Query DSL compiler
//!
//! This module turns the nested JSON search language into Elasticsearch
//! boolean queries, supporting:
//! - Logical nesting (`and`, `or`, `not`) over an implicit top-level filter
//! - Term and terms queries (exact match, set membership)
//! - Range queries with half-open defaults
//! - Exists, match and multi-match queries
//! - Geo bounding box and geo distance filters
//! - Sort directives with a trailing relevance tiebreak
//!
//! # Example
//!
//! ```json
//! {
//!   "term": { "field": "status", "query": ["active", "pending"] },
//!   "and": {
//!     "match": { "field": "title", "query": ["rust"], "weight": [2] },
//!     "range": {
//!       "field": "published",
//!       "query": { "left": { "value": "2024-01-01" }, "right": { "value": "2025-01-01" } }
//!     }
//!   }
//! }
//! ```

pub mod ast;
pub mod clauses;
pub mod compiler;
pub mod nodes;
pub mod sort;
pub mod types;

pub use ast::QueryNode;
pub use clauses::{ClauseKind, ClauseSpec};
pub use compiler::{CompileReport, Compiled, QueryCompiler};
pub use nodes::{
    BoolQuery, ExistsQuery, GeoBoundingBoxQuery, GeoDistanceQuery, MatchQuery, MultiMatchQuery,
    RangeQuery, TermQuery, TermsQuery,
};
pub use sort::{compile_sort, SortCriterion, SortSpec};
pub use types::*;
