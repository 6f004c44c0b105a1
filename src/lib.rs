pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod query;
pub mod search;

pub use client::{ElasticClient, SearchTransport};
pub use config::{ClientConfig, CompilePolicy, CompilerConfig};
pub use error::{EsQueryError, Result};
pub use metrics::QueryMetrics;
pub use query::{CompileReport, Compiled, QueryCompiler, SortCriterion, SortSpec};
pub use search::{QueryInput, Ret, SearchRequest, Searcher};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
