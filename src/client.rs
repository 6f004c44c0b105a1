//! Search engine client
//!
//! [`SearchTransport`] is the seam between the request builder and whatever
//! executes a search body. [`ElasticClient`] implements it over HTTP with
//! `reqwest` and also covers the index and document operations an application
//! needs around its searches.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::EsQueryError;
use crate::Result;

/// Document key holding the id of a bulk insert
pub const DOC_ID_KEY: &str = "ID";

/// Executes search bodies against an index
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Run `body` against `index` and return the engine's raw response
    async fn search(&self, index: &str, body: &Value) -> Result<Value>;
}

enum Payload {
    Empty,
    Json(Value),
    NdJson(String),
}

/// HTTP client for an Elasticsearch-compatible cluster
pub struct ElasticClient {
    http: Client,
    config: ClientConfig,
    next_address: AtomicUsize,
}

impl ElasticClient {
    /// Build a client, failing fast on an invalid configuration
    ///
    /// No request is sent here; use [`ElasticClient::ping`] to check connectivity.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| EsQueryError::Config(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| EsQueryError::Config(format!("invalid value for header '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .pool_max_idle_per_host(config.max_idle_per_host)
            .gzip(config.gzip)
            .build()
            .map_err(|e| EsQueryError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            next_address: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch cluster information from the root endpoint
    pub async fn ping(&self) -> Result<Value> {
        self.send(Method::GET, &[], Payload::Empty).await
    }

    /// Create an index with the given settings/mappings/aliases body
    pub async fn create_index(&self, index: &str, body: &Value) -> Result<Value> {
        require_index(index)?;
        self.send(Method::PUT, &[index], Payload::Json(body.clone()))
            .await
    }

    /// Fetch settings, mappings and aliases of one or more indices
    pub async fn get_indices(&self, indices: &[&str]) -> Result<Value> {
        if indices.is_empty() {
            return Err(EsQueryError::InvalidRequest(
                "at least one index name is required".to_string(),
            ));
        }
        for index in indices {
            require_index(index)?;
        }
        let joined = indices.join(",");
        self.send(Method::GET, &[joined.as_str()], Payload::Empty)
            .await
    }

    /// Index a single document under `id`
    pub async fn index_document(&self, index: &str, id: &str, doc: &Value) -> Result<Value> {
        require_index(index)?;
        require_segment("document id", id)?;
        self.send(Method::PUT, &[index, "_doc", id], Payload::Json(doc.clone()))
            .await
    }

    /// Insert and delete documents in one bulk request
    ///
    /// Inserts without a string `ID` get a generated UUID, written back into
    /// the document. Fails without contacting the cluster when there is
    /// nothing to do.
    pub async fn bulk(
        &self,
        index: &str,
        inserts: &mut [Map<String, Value>],
        delete_ids: &[String],
    ) -> Result<Value> {
        require_index(index)?;
        let body = build_bulk_body(index, inserts, delete_ids)?;
        debug!(
            index,
            inserts = inserts.len(),
            deletes = delete_ids.len(),
            "sending bulk request"
        );
        self.send(Method::POST, &["_bulk"], Payload::NdJson(body)).await
    }

    fn address(&self) -> &str {
        let i = self.next_address.fetch_add(1, Ordering::Relaxed);
        self.config.addresses[i % self.config.addresses.len()].trim_end_matches('/')
    }

    /// URL of the next address with `segments` appended, each percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let address = self.address();
        let mut url = Url::parse(address)
            .map_err(|e| EsQueryError::Config(format!("invalid address '{}': {}", address, e)))?;
        url.path_segments_mut()
            .map_err(|_| EsQueryError::Config(format!("address '{}' cannot carry a path", address)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, retrying connection failures on the next address
    ///
    /// The delay between attempts doubles from `retry_initial_delay_ms` up to
    /// `retry_max_delay_ms`.
    async fn execute(&self, method: Method, segments: &[&str], payload: &Payload) -> Result<reqwest::Response> {
        let mut delay = self.config.retry_initial_delay();
        let mut attempt = 0;
        loop {
            let url = self.url(segments)?;
            let mut request = self.http.request(method.clone(), url.clone());
            if let Some(username) = &self.config.username {
                request = request.basic_auth(username, self.config.password.as_ref());
            }
            request = match payload {
                Payload::Empty => request,
                Payload::Json(body) => request.json(body),
                Payload::NdJson(body) => request
                    .header(CONTENT_TYPE, "application/x-ndjson")
                    .body(body.clone()),
            };

            match request.send().await {
                Ok(response) => {
                    if attempt > 0 {
                        info!("{} {} succeeded after {} retries", method, url, attempt);
                    }
                    return Ok(response);
                }
                Err(e) => {
                    let err = EsQueryError::from(e);
                    if !err.is_retriable() || attempt >= self.config.max_retries {
                        return Err(err);
                    }
                    attempt += 1;
                    warn!(
                        "{} {} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        method, url, attempt, self.config.max_retries, err, delay
                    );
                    sleep(delay).await;
                    delay = delay.mul_f64(2.0).min(self.config.retry_max_delay());
                }
            }
        }
    }

    async fn send(&self, method: Method, segments: &[&str], payload: Payload) -> Result<Value> {
        let response = self.execute(method, segments, &payload).await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(EsQueryError::Search {
                status: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl SearchTransport for ElasticClient {
    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        require_index(index)?;
        self.send(Method::POST, &[index, "_search"], Payload::Json(body.clone()))
            .await
    }
}

/// Reject values that cannot stand as a single path segment
fn require_segment(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EsQueryError::InvalidRequest(format!("{} is empty", what)));
    }
    if value == "." || value == ".." {
        return Err(EsQueryError::InvalidRequest(format!("{} '{}' is not allowed", what, value)));
    }
    Ok(())
}

fn require_index(index: &str) -> Result<()> {
    require_segment("index name", index)?;
    if index.contains(',') {
        return Err(EsQueryError::InvalidRequest(format!(
            "index name '{}' contains a comma",
            index
        )));
    }
    Ok(())
}

/// Build the NDJSON body of a bulk request
pub fn build_bulk_body(
    index: &str,
    inserts: &mut [Map<String, Value>],
    delete_ids: &[String],
) -> Result<String> {
    if inserts.is_empty() && delete_ids.is_empty() {
        return Err(EsQueryError::InvalidRequest(
            "bulk request needs at least one insert or delete".to_string(),
        ));
    }

    let mut body = String::new();
    for doc in inserts.iter_mut() {
        let id = match doc.get(DOC_ID_KEY) {
            Some(Value::String(id)) => id.clone(),
            _ => {
                let id = uuid::Uuid::new_v4().to_string();
                doc.insert(DOC_ID_KEY.to_string(), Value::String(id.clone()));
                id
            }
        };
        body.push_str(&json!({ "index": { "_index": index, "_id": id } }).to_string());
        body.push('\n');
        body.push_str(&serde_json::to_string(doc)?);
        body.push('\n');
    }
    for id in delete_ids {
        body.push_str(&json!({ "delete": { "_index": index, "_id": id } }).to_string());
        body.push('\n');
    }
    Ok(body)
}
