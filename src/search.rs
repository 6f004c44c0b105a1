//! Search request builder
//!
//! Combines a compiled query with sort directives, pagination and a source
//! projection, and hands the resulting `_search` body to a [`SearchTransport`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::client::SearchTransport;
use crate::config::CompilerConfig;
use crate::metrics::QueryMetrics;
use crate::query::{BoolQuery, Compiled, QueryCompiler, QueryNode, SortCriterion, SortSpec};
use crate::Result;

/// Page size used when the caller asks for zero hits
pub const DEFAULT_SIZE: usize = 10;

/// Fields to return from each hit's `_source`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ret {
    #[serde(default, alias = "Includes")]
    pub includes: Vec<String>,
    #[serde(default, alias = "Excludes")]
    pub excludes: Vec<String>,
}

impl Ret {
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }
}

/// A search as submitted by a caller
///
/// `query` takes precedence; `query_string` holds the same DSL as raw JSON
/// text and is only read when `query` is absent or empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QueryInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query_string: String,
    #[serde(default)]
    pub ret: Ret,
    #[serde(default)]
    pub sort: SortSpec,
    #[serde(default)]
    pub from: usize,
    #[serde(default)]
    pub size: usize,
}

impl QueryInput {
    /// Input carrying a structured tree
    pub fn tree(query: Map<String, Value>) -> Self {
        Self {
            query: Some(query),
            ..Default::default()
        }
    }

    /// Input carrying raw DSL text
    pub fn text(query_string: impl Into<String>) -> Self {
        Self {
            query_string: query_string.into(),
            ..Default::default()
        }
    }

    pub fn with_ret(mut self, ret: Ret) -> Self {
        self.ret = ret;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    /// Override the input's paging with whichever values are given
    pub fn with_paging(mut self, from: Option<usize>, size: Option<usize>) -> Self {
        if let Some(from) = from {
            self.from = from;
        }
        if let Some(size) = size {
            self.size = size;
        }
        self
    }
}

/// A fully built `_search` request
#[derive(Clone, Debug)]
pub struct SearchRequest {
    pub index: String,
    pub query: BoolQuery,
    /// Empty when the input named no sort entries
    pub sort: Vec<SortCriterion>,
    pub from: usize,
    pub size: usize,
    pub source: Option<Ret>,
}

impl SearchRequest {
    /// Render the request body
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), self.query.source());
        if !self.sort.is_empty() {
            body.insert(
                "sort".to_string(),
                Value::Array(self.sort.iter().map(|s| s.source()).collect()),
            );
        }
        body.insert("from".to_string(), json!(self.from));
        body.insert("size".to_string(), json!(self.size));
        if let Some(ret) = &self.source {
            body.insert(
                "_source".to_string(),
                json!({ "includes": ret.includes, "excludes": ret.excludes }),
            );
        }
        Value::Object(body)
    }
}

/// Compiles query inputs and runs them through a transport
pub struct Searcher<T: SearchTransport> {
    transport: T,
    compiler: QueryCompiler,
    metrics: Option<QueryMetrics>,
}

impl<T: SearchTransport> Searcher<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, CompilerConfig::default())
    }

    pub fn with_config(transport: T, config: CompilerConfig) -> Self {
        Self {
            transport,
            compiler: QueryCompiler::new(config),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: QueryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    fn compile(&self, tree: Option<&Map<String, Value>>, text: &str) -> Result<Compiled> {
        let compiled = self.compiler.compile_input(tree, text)?;
        if let Some(metrics) = &self.metrics {
            metrics.record_compile(&compiled.report);
        }
        Ok(compiled)
    }

    /// Build the request for `input` without executing it
    pub fn build_request(
        &self,
        index: &str,
        input: &QueryInput,
        from: usize,
        size: usize,
    ) -> Result<SearchRequest> {
        let compiled = self.compile(input.query.as_ref(), &input.query_string)?;
        let sort = if input.sort.is_empty() {
            Vec::new()
        } else {
            input.sort.compile()
        };

        Ok(SearchRequest {
            index: index.to_string(),
            query: compiled.query,
            sort,
            from,
            size: if size == 0 { DEFAULT_SIZE } else { size },
            source: (!input.ret.is_empty()).then(|| input.ret.clone()),
        })
    }

    /// Compile and execute a search, returning the engine's raw response
    pub async fn search(
        &self,
        index: &str,
        input: &QueryInput,
        from: usize,
        size: usize,
    ) -> Result<Value> {
        let request = self.build_request(index, input, from, size)?;
        let body = request.to_body();
        debug!(index, body = %body, "executing search");

        let start = Instant::now();
        let result = self.transport.search(index, &body).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => {
                info!(index, from = request.from, size = request.size, "search completed in {:?}", elapsed);
                if let Some(metrics) = &self.metrics {
                    metrics.record_search(elapsed.as_secs_f64());
                }
            }
            Err(e) => {
                error!(index, "search failed: {}", e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_search_error();
                }
            }
        }
        result
    }

    /// Compile and execute a search using the input's own `from` and `size`
    pub async fn search_input(&self, index: &str, input: &QueryInput) -> Result<Value> {
        self.search(index, input, input.from, input.size).await
    }

    /// Compile a tree (or raw text when the tree is absent/empty) to pretty JSON
    pub fn gen_query_dsl(&self, tree: Option<&Map<String, Value>>, text: &str) -> Result<String> {
        let compiled = self.compile(tree, text)?;
        Ok(serde_json::to_string_pretty(&compiled.source())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EsQueryError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        bodies: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl SearchTransport for Recorder {
        async fn search(&self, index: &str, body: &Value) -> Result<Value> {
            self.bodies
                .lock()
                .unwrap()
                .push((index.to_string(), body.clone()));
            Ok(json!({ "hits": { "total": { "value": 0 }, "hits": [] } }))
        }
    }

    struct Failing;

    #[async_trait]
    impl SearchTransport for Failing {
        async fn search(&self, _index: &str, _body: &Value) -> Result<Value> {
            Err(EsQueryError::Search {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    fn tree(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_size_defaults_to_ten() {
        let searcher = Searcher::new(Recorder::default());
        let request = searcher
            .build_request("books", &QueryInput::default(), 0, 0)
            .unwrap();
        assert_eq!(request.size, 10);

        let request = searcher
            .build_request("books", &QueryInput::default(), 20, 5)
            .unwrap();
        assert_eq!((request.from, request.size), (20, 5));
    }

    #[test]
    fn test_body_omits_sort_and_source_when_unset() {
        let searcher = Searcher::new(Recorder::default());
        let body = searcher
            .build_request("books", &QueryInput::default(), 0, 0)
            .unwrap()
            .to_body();
        assert_eq!(
            body,
            json!({ "query": { "bool": {} }, "from": 0, "size": 10 })
        );
    }

    #[test]
    fn test_body_with_sort_and_projection() {
        let searcher = Searcher::new(Recorder::default());
        let input = QueryInput::tree(tree(json!({
            "term": { "field": "lang", "query": ["en"] }
        })))
        .with_sort(SortSpec::new().push("year", "desc"))
        .with_ret(Ret {
            includes: vec!["title".to_string()],
            excludes: vec![],
        });

        let body = searcher.build_request("books", &input, 0, 3).unwrap().to_body();
        assert_eq!(body["query"], json!({ "bool": { "filter": [{ "term": { "lang": "en" } }] } }));
        assert_eq!(
            body["sort"],
            json!([{ "year": { "order": "desc" } }, { "_score": { "order": "desc" } }])
        );
        assert_eq!(body["_source"], json!({ "includes": ["title"], "excludes": [] }));
        assert_eq!(body["size"], json!(3));
    }

    #[test]
    fn test_query_string_used_when_tree_empty() {
        let searcher = Searcher::new(Recorder::default());
        let input = QueryInput {
            query: Some(Map::new()),
            query_string: r#"{"exists": {"field": "isbn"}}"#.to_string(),
            ..Default::default()
        };
        let body = searcher.build_request("books", &input, 0, 0).unwrap().to_body();
        assert_eq!(
            body["query"],
            json!({ "bool": { "filter": [{ "exists": { "field": "isbn" } }] } })
        );
    }

    #[test]
    fn test_gen_query_dsl_is_pretty() {
        let searcher = Searcher::new(Recorder::default());
        let dsl = searcher
            .gen_query_dsl(None, r#"{"term": {"field": "a", "query": [1]}}"#)
            .unwrap();
        assert!(dsl.contains('\n'));
        let parsed: Value = serde_json::from_str(&dsl).unwrap();
        assert_eq!(parsed, json!({ "bool": { "filter": [{ "term": { "a": 1 } }] } }));

        assert_eq!(
            serde_json::from_str::<Value>(&searcher.gen_query_dsl(None, "").unwrap()).unwrap(),
            json!({ "bool": {} })
        );
    }

    #[tokio::test]
    async fn test_search_passes_body_to_transport() {
        let metrics = QueryMetrics::new().unwrap();
        let searcher = Searcher::new(Recorder::default()).with_metrics(metrics.clone());
        let input = QueryInput::text(r#"{"bogus": {}, "term": {"field": "a", "query": []}}"#);

        let result = searcher.search("books", &input, 0, 0).await.unwrap();
        assert_eq!(result["hits"]["total"]["value"], json!(0));

        let bodies = searcher.transport().bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].0, "books");
        assert_eq!(bodies[0].1["query"], json!({ "bool": {} }));
        drop(bodies);

        assert_eq!(metrics.searches_total.get(), 1.0);
        assert_eq!(metrics.clauses_skipped.get(), 1.0);
        assert_eq!(metrics.clauses_ignored.get(), 1.0);
    }

    #[test]
    fn test_with_paging_overrides_given_values() {
        let input = QueryInput {
            from: 20,
            size: 5,
            ..Default::default()
        };
        let kept = input.clone().with_paging(None, None);
        assert_eq!((kept.from, kept.size), (20, 5));

        let overridden = input.with_paging(Some(0), Some(50));
        assert_eq!((overridden.from, overridden.size), (0, 50));
    }

    #[tokio::test]
    async fn test_search_input_uses_input_paging() {
        let searcher = Searcher::new(Recorder::default());
        let input: QueryInput =
            serde_json::from_value(json!({ "from": 20, "size": 5 })).unwrap();
        searcher.search_input("books", &input).await.unwrap();

        let bodies = searcher.transport().bodies.lock().unwrap();
        assert_eq!(bodies[0].1["from"], json!(20));
        assert_eq!(bodies[0].1["size"], json!(5));
    }

    #[tokio::test]
    async fn test_search_error_is_counted() {
        let metrics = QueryMetrics::new().unwrap();
        let searcher = Searcher::new(Failing).with_metrics(metrics.clone());
        let err = searcher
            .search("books", &QueryInput::default(), 0, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, EsQueryError::Search { status: 503, .. }));
        assert_eq!(metrics.search_errors.get(), 1.0);
        assert_eq!(metrics.searches_total.get(), 0.0);
    }

    #[tokio::test]
    async fn test_strict_compile_failure_skips_transport() {
        let searcher = Searcher::with_config(Recorder::default(), CompilerConfig::strict());
        let input = QueryInput::text("not json");
        let err = searcher.search("books", &input, 0, 0).await.unwrap_err();
        assert!(err.is_decode());
        assert!(searcher.transport().bodies.lock().unwrap().is_empty());
    }

    #[test]
    fn test_query_input_deserializes() {
        let input: QueryInput = serde_json::from_value(json!({
            "query": { "or": { "exists": { "field": "a" } } },
            "ret": { "Includes": ["a"] },
            "sort": { "b": "asc", "a": "desc" },
            "from": 5,
            "size": 2
        }))
        .unwrap();
        assert!(input.query.is_some());
        assert_eq!(input.ret.includes, vec!["a".to_string()]);
        assert_eq!(input.sort.0[0].0, "b");
        assert_eq!((input.from, input.size), (5, 2));

        let input: QueryInput = serde_json::from_value(json!({ "query": null })).unwrap();
        assert!(input.query.is_none());
    }
}
