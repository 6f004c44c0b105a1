//! Boolean query - combines multiple clauses with AND, OR, NOT semantics

use crate::query::ast::QueryNode;
use crate::query::types::Occur;
use serde_json::{json, Map, Value};

/// Boolean query combining multiple clauses
///
/// The boolean query supports four types of clauses:
/// - `must`: All clauses must match (AND). Contributes to score.
/// - `should`: At least one clause should match (OR). Contributes to score.
/// - `must_not`: No clause must match (NOT). Does not contribute to score.
/// - `filter`: All clauses must match (AND). Does not contribute to score.
///
/// A boolean query without clauses matches every document.
///
/// # Example
///
/// ```json
/// {
///   "bool": {
///     "must": [
///       { "match": { "content": { "query": "rust", "boost": 1.0 } } }
///     ],
///     "must_not": [
///       { "term": { "status": "draft" } }
///     ],
///     "filter": [
///       { "range": { "created_at": { "gte": "2024-01-01" } } }
///     ]
///   }
/// }
/// ```
#[derive(Clone, Debug)]
pub struct BoolQuery {
    /// Clauses that must match (AND, scoring)
    pub must: Vec<Box<dyn QueryNode>>,
    /// Clauses where at least one should match (OR, scoring)
    pub should: Vec<Box<dyn QueryNode>>,
    /// Clauses that must not match (NOT, no scoring)
    pub must_not: Vec<Box<dyn QueryNode>>,
    /// Clauses that must match (AND, no scoring)
    pub filter: Vec<Box<dyn QueryNode>>,
    /// Boost factor for scoring
    pub boost: f64,
}

impl Default for BoolQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl BoolQuery {
    /// Create a new empty boolean query
    pub fn new() -> Self {
        Self {
            must: Vec::new(),
            should: Vec::new(),
            must_not: Vec::new(),
            filter: Vec::new(),
            boost: 1.0,
        }
    }

    /// Add a must clause
    pub fn must(mut self, query: impl QueryNode + 'static) -> Self {
        self.must.push(Box::new(query));
        self
    }

    /// Add a should clause
    pub fn should(mut self, query: impl QueryNode + 'static) -> Self {
        self.should.push(Box::new(query));
        self
    }

    /// Add a must_not clause
    pub fn must_not(mut self, query: impl QueryNode + 'static) -> Self {
        self.must_not.push(Box::new(query));
        self
    }

    /// Add a filter clause
    pub fn filter(mut self, query: impl QueryNode + 'static) -> Self {
        self.filter.push(Box::new(query));
        self
    }

    /// Append a clause under the given occurrence
    pub fn push(&mut self, occur: Occur, query: Box<dyn QueryNode>) {
        self.clauses_mut(occur).push(query);
    }

    /// Clauses attached under the given occurrence
    pub fn clauses(&self, occur: Occur) -> &[Box<dyn QueryNode>] {
        match occur {
            Occur::Must => &self.must,
            Occur::Should => &self.should,
            Occur::MustNot => &self.must_not,
            Occur::Filter => &self.filter,
        }
    }

    fn clauses_mut(&mut self, occur: Occur) -> &mut Vec<Box<dyn QueryNode>> {
        match occur {
            Occur::Must => &mut self.must,
            Occur::Should => &mut self.should,
            Occur::MustNot => &mut self.must_not,
            Occur::Filter => &mut self.filter,
        }
    }

    /// Set boost factor
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }

    /// Check if this is an empty (match-all) query
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }

    /// Get total number of direct clauses
    pub fn clause_count(&self) -> usize {
        self.must.len() + self.should.len() + self.must_not.len() + self.filter.len()
    }
}

impl QueryNode for BoolQuery {
    fn source(&self) -> Value {
        let mut body = Map::new();
        for occur in [Occur::Must, Occur::Should, Occur::MustNot, Occur::Filter] {
            let clauses = self.clauses(occur);
            if !clauses.is_empty() {
                let rendered = clauses.iter().map(|q| q.source()).collect();
                body.insert(occur.as_str().to_string(), Value::Array(rendered));
            }
        }
        if self.boost != 1.0 {
            body.insert("boost".to_string(), json!(self.boost));
        }
        json!({ "bool": body })
    }

    fn query_type(&self) -> &'static str {
        "bool"
    }

    fn is_scoring(&self) -> bool {
        // Bool query scores if any must or should clause scores
        self.must.iter().any(|q| q.is_scoring()) || self.should.iter().any(|q| q.is_scoring())
    }

    fn boost(&self) -> f64 {
        self.boost
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
