//! Logic tree compiler
//!
//! Walks a DSL mapping and builds a [`BoolQuery`]. Reserved keys (`and`, `or`,
//! `not`) open a nested boolean node whose children combine as `must`,
//! `should` or `must_not`; every other key names a leaf clause. Children of a
//! node are attached under the node's own occurrence, and the top level of a
//! request compiles in `filter` context.
//!
//! # Example
//!
//! ```json
//! {
//!   "term": { "field": "lang", "query": ["en"] },
//!   "or": {
//!     "match": { "field": "title", "query": ["rust", "tokio"], "weight": [2] }
//!   },
//!   "not": {
//!     "exists": { "field": "deleted_at" }
//!   }
//! }
//! ```
//!
//! compiles to
//!
//! ```json
//! {
//!   "bool": {
//!     "filter": [
//!       { "term": { "lang": "en" } },
//!       { "bool": { "should": [
//!         { "match": { "title": { "query": "rust", "boost": 2.0 } } },
//!         { "match": { "title": { "query": "tokio", "boost": 1.0 } } }
//!       ] } },
//!       { "bool": { "must_not": [ { "exists": { "field": "deleted_at" } } ] } }
//!     ]
//!   }
//! }
//! ```

use crate::config::{CompilePolicy, CompilerConfig};
use crate::error::EsQueryError;
use crate::query::ast::QueryNode;
use crate::query::clauses::{json_type, ClauseKind, ClauseSpec};
use crate::query::nodes::BoolQuery;
use crate::query::types::Occur;
use crate::Result;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Diagnostics for a single compile call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Keys dropped because their body could not be decoded
    pub skipped: usize,
    /// Keys dropped because they name no known clause type
    pub ignored: usize,
}

impl CompileReport {
    pub fn is_clean(&self) -> bool {
        self.skipped == 0 && self.ignored == 0
    }
}

/// Output of the compiler: the query tree plus what was left out of it
#[derive(Clone, Debug)]
pub struct Compiled {
    pub query: BoolQuery,
    pub report: CompileReport,
}

impl Compiled {
    fn empty(report: CompileReport) -> Self {
        Self {
            query: BoolQuery::new(),
            report,
        }
    }

    /// Whether the compiled query matches every document
    pub fn is_match_all(&self) -> bool {
        self.query.is_empty()
    }

    /// Elasticsearch source of the compiled query
    pub fn source(&self) -> Value {
        self.query.source()
    }
}

/// Compiles DSL mappings into boolean query trees
///
/// The compiler holds no state between calls and can be shared freely.
#[derive(Clone, Debug, Default)]
pub struct QueryCompiler {
    config: CompilerConfig,
}

impl QueryCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a structured tree, falling back to raw text when the tree is absent or empty
    pub fn compile_input(&self, tree: Option<&Map<String, Value>>, text: &str) -> Result<Compiled> {
        match tree {
            Some(tree) if !tree.is_empty() => self.compile(tree),
            _ => self.compile_str(text),
        }
    }

    /// Compile a DSL mapping in top-level (`filter`) context
    pub fn compile(&self, tree: &Map<String, Value>) -> Result<Compiled> {
        let mut report = CompileReport::default();
        let query = self.compile_node(tree, Occur::Filter, "", 0, &mut report)?;
        Ok(self.finish(query, report))
    }

    /// Compile DSL supplied as JSON text
    ///
    /// Blank text compiles to a match-all query. Text that is not a JSON object
    /// also compiles to match-all under the lenient policy.
    pub fn compile_str(&self, text: &str) -> Result<Compiled> {
        if text.trim().is_empty() {
            return Ok(Compiled::empty(CompileReport::default()));
        }

        let mut report = CompileReport::default();
        let tree = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(tree)) => tree,
            Ok(other) => {
                let reason = format!("query text must be a JSON object, got {}", json_type(&other));
                self.reject(EsQueryError::decode("query_string", reason), &mut report)?;
                return Ok(self.finish(BoolQuery::new(), report));
            }
            Err(e) => {
                let reason = format!("query text is not valid JSON: {}", e);
                self.reject(EsQueryError::decode("query_string", reason), &mut report)?;
                return Ok(self.finish(BoolQuery::new(), report));
            }
        };

        let query = self.compile_node(&tree, Occur::Filter, "", 0, &mut report)?;
        Ok(self.finish(query, report))
    }

    fn compile_node(
        &self,
        node: &Map<String, Value>,
        occur: Occur,
        path: &str,
        depth: usize,
        report: &mut CompileReport,
    ) -> Result<BoolQuery> {
        let mut query = BoolQuery::new();

        for (key, value) in node {
            let key_path = if path.is_empty() {
                key.to_ascii_lowercase()
            } else {
                format!("{}.{}", path, key.to_ascii_lowercase())
            };

            if let Some(child_occur) = Occur::from_keyword(key) {
                let Some(child) = value.as_object() else {
                    let reason = format!("logic value must be an object, got {}", json_type(value));
                    self.reject(EsQueryError::decode(key_path, reason), report)?;
                    continue;
                };
                if depth >= self.config.max_depth {
                    let reason = format!("nesting exceeds {} levels", self.config.max_depth);
                    self.reject(EsQueryError::decode(key_path, reason), report)?;
                    continue;
                }
                let nested = self.compile_node(child, child_occur, &key_path, depth + 1, report)?;
                query.push(occur, Box::new(nested));
                continue;
            }

            let kind = match key.parse::<ClauseKind>() {
                Ok(kind) => kind,
                Err(_) => {
                    debug!(key = %key_path, "ignoring unknown clause type");
                    report.ignored += 1;
                    continue;
                }
            };

            match ClauseSpec::decode(kind, value) {
                Ok(spec) => {
                    for leaf in spec.into_nodes() {
                        query.push(occur, leaf);
                    }
                }
                Err(EsQueryError::Decode { reason, .. }) => {
                    self.reject(EsQueryError::decode(key_path, reason), report)?;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(query)
    }

    /// Apply the policy to a decode failure
    fn reject(&self, err: EsQueryError, report: &mut CompileReport) -> Result<()> {
        match self.config.policy {
            CompilePolicy::Strict => Err(err),
            CompilePolicy::Lenient => {
                debug!("skipping clause: {}", err);
                report.skipped += 1;
                Ok(())
            }
        }
    }

    fn finish(&self, query: BoolQuery, report: CompileReport) -> Compiled {
        if report.skipped > 0 {
            warn!(
                skipped = report.skipped,
                "query compiled with malformed clauses left out"
            );
        }
        Compiled { query, report }
    }
}
