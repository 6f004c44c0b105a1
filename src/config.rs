use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::EsQueryError;
use crate::Result;

/// How the compiler treats clauses it cannot decode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilePolicy {
    /// Skip the offending key, count it, and keep compiling its siblings
    #[default]
    Lenient,
    /// Abort on the first malformed clause
    Strict,
}

/// Compiler configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub policy: CompilePolicy,
    /// Maximum nesting of and/or/not sub-trees
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    32
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            policy: CompilePolicy::Lenient,
            max_depth: default_max_depth(),
        }
    }
}

impl CompilerConfig {
    /// Lenient compiler with default depth
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Strict compiler with default depth
    pub fn strict() -> Self {
        Self {
            policy: CompilePolicy::Strict,
            ..Default::default()
        }
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Connection settings for the search engine client
///
/// Passed by value to [`crate::client::ElasticClient::new`]; there is no
/// process-wide default transport.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URLs of the cluster nodes, e.g. `http://127.0.0.1:9200`
    pub addresses: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub gzip: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
    /// Delay before the first retry; doubles per attempt
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
    /// Upper bound on the delay between retries
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_idle_per_host() -> usize {
    10
}

fn default_retry_initial_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addresses: vec!["http://127.0.0.1:9200".to_string()],
            username: None,
            password: None,
            headers: BTreeMap::new(),
            max_retries: default_max_retries(),
            gzip: false,
            timeout_ms: default_timeout_ms(),
            max_idle_per_host: default_max_idle_per_host(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given node addresses
    pub fn new(addresses: Vec<String>) -> Self {
        Self {
            addresses,
            ..Default::default()
        }
    }

    /// Use HTTP basic authentication
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the first retry delay and the cap it doubles up to
    pub fn with_retry_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.retry_initial_delay_ms = initial.as_millis() as u64;
        self.retry_max_delay_ms = max.as_millis() as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    /// Check the configuration before any connection is attempted
    pub fn validate(&self) -> Result<()> {
        if self.addresses.is_empty() {
            return Err(EsQueryError::Config(
                "at least one address is required".to_string(),
            ));
        }
        for address in &self.addresses {
            let url = reqwest::Url::parse(address)
                .map_err(|e| EsQueryError::Config(format!("invalid address '{}': {}", address, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(EsQueryError::Config(format!(
                    "unsupported scheme '{}' in address '{}'",
                    url.scheme(),
                    address
                )));
            }
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(EsQueryError::Config(
                "password given without a username".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(EsQueryError::Config("timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}
