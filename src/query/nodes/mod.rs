//! Concrete query node implementations
//!
//! This module provides implementations of the `QueryNode` trait for
//! the predicate kinds the compiler emits.

mod bool_query;
mod exists_query;
mod geo_query;
mod match_query;
mod multi_match_query;
mod range_query;
mod term_query;
mod terms_query;

pub use bool_query::BoolQuery;
pub use exists_query::ExistsQuery;
pub use geo_query::{GeoBoundingBoxQuery, GeoDistanceQuery};
pub use match_query::MatchQuery;
pub use multi_match_query::MultiMatchQuery;
pub use range_query::RangeQuery;
pub use term_query::TermQuery;
pub use terms_query::TermsQuery;
