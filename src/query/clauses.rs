//! Leaf clause decoders
//!
//! Each leaf tag of the DSL (`term`, `range`, `exists`, `match`, `multi_match`,
//! `geo_bounding_box`, `geo_distance`) has a typed spec that is decoded from the
//! untyped JSON body. Decoding either yields a [`ClauseSpec`] or a decode error;
//! the compiler decides whether that error skips the key or aborts.
//!
//! Unknown keys inside a clause body (for instance `"type": "phrase"` on a
//! match clause) are ignored.

use crate::error::EsQueryError;
use crate::query::ast::QueryNode;
use crate::query::nodes::{
    ExistsQuery, GeoBoundingBoxQuery, GeoDistanceQuery, MatchQuery, MultiMatchQuery, RangeQuery,
    TermQuery, TermsQuery,
};
use crate::query::types::{GeoPoint, RangeBounds, RangeOp};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Leaf tags understood by the compiler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Term,
    Range,
    Exists,
    Match,
    MultiMatch,
    GeoBoundingBox,
    GeoDistance,
}

impl ClauseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseKind::Term => "term",
            ClauseKind::Range => "range",
            ClauseKind::Exists => "exists",
            ClauseKind::Match => "match",
            ClauseKind::MultiMatch => "multi_match",
            ClauseKind::GeoBoundingBox => "geo_bounding_box",
            ClauseKind::GeoDistance => "geo_distance",
        }
    }
}

impl FromStr for ClauseKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "term" => Ok(ClauseKind::Term),
            "range" => Ok(ClauseKind::Range),
            "exists" => Ok(ClauseKind::Exists),
            "match" => Ok(ClauseKind::Match),
            "multi_match" => Ok(ClauseKind::MultiMatch),
            "geo_bounding_box" => Ok(ClauseKind::GeoBoundingBox),
            "geo_distance" => Ok(ClauseKind::GeoDistance),
            other => Err(format!("unknown clause type: {}", other)),
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{"field": f, "query": [v, ...]}`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TermSpec {
    pub field: String,
    #[serde(rename = "query")]
    pub values: Vec<Value>,
}

/// One side of a range clause: `{"value": v, "op": ">="}`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RangeSide {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub op: Option<String>,
}

impl RangeSide {
    /// A side whose value is null or missing leaves that end of the range open
    pub fn is_present(&self) -> bool {
        !self.value.is_null()
    }

    /// Explicit operator, or `default` when none (or an unrecognized one) is given
    pub fn op_or(&self, default: RangeOp) -> RangeOp {
        match self.op.as_deref() {
            None | Some("") => default,
            Some(op) => op.parse().unwrap_or_else(|e| {
                tracing::debug!("{}, using {}", e, default);
                default
            }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RangeSides {
    #[serde(default)]
    pub left: Option<RangeSide>,
    #[serde(default)]
    pub right: Option<RangeSide>,
}

/// `{"field": f, "query": {"left": {...}, "right": {...}}}`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RangeSpec {
    pub field: String,
    #[serde(rename = "query", default)]
    pub sides: RangeSides,
}

impl RangeSpec {
    /// Resolve both sides into concrete bounds
    ///
    /// The left side defaults to `>=` and the right side to `<`, giving a
    /// half-open interval. When both sides bound the same end, the right side
    /// wins.
    pub fn bounds(&self) -> RangeBounds {
        let mut bounds = RangeBounds::default();
        let sides = [
            (self.sides.left.as_ref(), RangeOp::LEFT_DEFAULT),
            (self.sides.right.as_ref(), RangeOp::RIGHT_DEFAULT),
        ];
        for (side, default) in sides {
            if let Some(side) = side.filter(|s| s.is_present()) {
                bounds.set(side.op_or(default), side.value.clone());
            }
        }
        bounds
    }
}

/// `{"field": f, "query": name}`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ExistsSpec {
    pub field: String,
    #[serde(rename = "query", default)]
    pub name: Option<String>,
}

/// `{"field": f, "query": [v, ...], "weight": [w, ...]}`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MatchSpec {
    pub field: String,
    #[serde(rename = "query")]
    pub values: Vec<Value>,
    #[serde(rename = "weight", default)]
    pub weights: Vec<f64>,
}

impl MatchSpec {
    /// Weight paired with the value at `index`; missing trailing weights are 1.0
    pub fn weight(&self, index: usize) -> f64 {
        self.weights.get(index).copied().unwrap_or(1.0)
    }
}

/// `{"query": v, "fields": [f, ...]}`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MultiMatchSpec {
    pub query: Value,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// `{"field": f, "order": o, "top_left": {lat, lon}, "bottom_right": {lat, lon}}`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GeoBoundingBoxSpec {
    pub field: String,
    #[serde(default)]
    pub order: Option<String>,
    pub top_left: GeoPoint,
    pub bottom_right: GeoPoint,
}

/// `{"field": f, "distance": "2km", "order": o, "location": {lat, lon}}`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GeoDistanceSpec {
    pub field: String,
    pub distance: String,
    #[serde(default)]
    pub order: Option<String>,
    pub location: GeoPoint,
}

/// A decoded leaf clause
#[derive(Clone, Debug, PartialEq)]
pub enum ClauseSpec {
    Term(TermSpec),
    Range(RangeSpec),
    Exists(ExistsSpec),
    Match(MatchSpec),
    MultiMatch(MultiMatchSpec),
    GeoBoundingBox(GeoBoundingBoxSpec),
    GeoDistance(GeoDistanceSpec),
}

impl ClauseSpec {
    /// Decode the body of a leaf clause of the given kind
    pub fn decode(kind: ClauseKind, body: &Value) -> Result<Self> {
        let spec = match kind {
            ClauseKind::Term => {
                let spec: TermSpec = decode_body(kind, body)?;
                require_field(kind, &spec.field)?;
                if spec.values.is_empty() {
                    return Err(EsQueryError::decode(kind.as_str(), "no values to match"));
                }
                ClauseSpec::Term(spec)
            }
            ClauseKind::Range => {
                let spec: RangeSpec = decode_body(kind, body)?;
                require_field(kind, &spec.field)?;
                if spec.bounds().is_empty() {
                    return Err(EsQueryError::decode(
                        kind.as_str(),
                        "neither a left nor a right bound is given",
                    ));
                }
                ClauseSpec::Range(spec)
            }
            ClauseKind::Exists => {
                let spec: ExistsSpec = decode_body(kind, body)?;
                require_field(kind, &spec.field)?;
                ClauseSpec::Exists(spec)
            }
            ClauseKind::Match => {
                let spec: MatchSpec = decode_body(kind, body)?;
                require_field(kind, &spec.field)?;
                ClauseSpec::Match(spec)
            }
            ClauseKind::MultiMatch => {
                let spec: MultiMatchSpec = decode_body(kind, body)?;
                if spec.query.is_null() {
                    return Err(EsQueryError::decode(kind.as_str(), "query is null"));
                }
                ClauseSpec::MultiMatch(spec)
            }
            ClauseKind::GeoBoundingBox => {
                let spec: GeoBoundingBoxSpec = decode_body(kind, body)?;
                require_field(kind, &spec.field)?;
                ClauseSpec::GeoBoundingBox(spec)
            }
            ClauseKind::GeoDistance => {
                let spec: GeoDistanceSpec = decode_body(kind, body)?;
                require_field(kind, &spec.field)?;
                if spec.distance.trim().is_empty() {
                    return Err(EsQueryError::decode(kind.as_str(), "distance is empty"));
                }
                ClauseSpec::GeoDistance(spec)
            }
        };
        Ok(spec)
    }

    /// Build the predicates for this clause
    ///
    /// Every kind yields exactly one predicate except `match`, which yields one
    /// sibling per value.
    pub fn into_nodes(self) -> Vec<Box<dyn QueryNode>> {
        let node: Box<dyn QueryNode> = match self {
            ClauseSpec::Match(spec) => {
                return spec
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, value)| {
                        let query = MatchQuery::new(spec.field.clone(), value.clone())
                            .with_boost(spec.weight(i));
                        Box::new(query) as Box<dyn QueryNode>
                    })
                    .collect();
            }
            ClauseSpec::Term(mut spec) => {
                if spec.values.len() == 1 {
                    let value = spec.values.remove(0);
                    Box::new(TermQuery::new(spec.field, value))
                } else {
                    Box::new(TermsQuery::new(spec.field, spec.values))
                }
            }
            ClauseSpec::Range(spec) => {
                let bounds = spec.bounds();
                Box::new(RangeQuery::new(spec.field).with_bounds(bounds))
            }
            ClauseSpec::Exists(spec) => match spec.name {
                Some(name) => Box::new(ExistsQuery::new(spec.field).with_name(name)),
                None => Box::new(ExistsQuery::new(spec.field)),
            },
            ClauseSpec::MultiMatch(spec) => Box::new(MultiMatchQuery::new(spec.query, spec.fields)),
            ClauseSpec::GeoBoundingBox(spec) => Box::new(GeoBoundingBoxQuery::new(
                spec.field,
                spec.top_left,
                spec.bottom_right,
            )),
            ClauseSpec::GeoDistance(spec) => Box::new(GeoDistanceQuery::new(
                spec.field,
                spec.location,
                spec.distance,
            )),
        };
        vec![node]
    }
}

fn decode_body<T: DeserializeOwned>(kind: ClauseKind, body: &Value) -> Result<T> {
    if !body.is_object() {
        return Err(EsQueryError::decode(
            kind.as_str(),
            format!("clause body must be an object, got {}", json_type(body)),
        ));
    }
    T::deserialize(body).map_err(|e| EsQueryError::decode(kind.as_str(), e.to_string()))
}

fn require_field(kind: ClauseKind, field: &str) -> Result<()> {
    if field.trim().is_empty() {
        return Err(EsQueryError::decode(kind.as_str(), "field is empty"));
    }
    Ok(())
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nodes(kind: ClauseKind, body: Value) -> Vec<Value> {
        ClauseSpec::decode(kind, &body)
            .unwrap()
            .into_nodes()
            .iter()
            .map(|n| n.source())
            .collect()
    }

    #[test]
    fn test_clause_kind_parse() {
        assert_eq!("TERM".parse::<ClauseKind>(), Ok(ClauseKind::Term));
        assert_eq!(
            "geo_bounding_box".parse::<ClauseKind>(),
            Ok(ClauseKind::GeoBoundingBox)
        );
        assert!("terms".parse::<ClauseKind>().is_err());
        assert_eq!(ClauseKind::MultiMatch.to_string(), "multi_match");
    }

    #[test]
    fn test_term_single_value_is_equality() {
        let out = nodes(
            ClauseKind::Term,
            json!({ "field": "status", "query": ["active"] }),
        );
        assert_eq!(out, vec![json!({ "term": { "status": "active" } })]);
    }

    #[test]
    fn test_term_many_values_is_membership() {
        let out = nodes(
            ClauseKind::Term,
            json!({ "field": "status", "query": ["active", "pending"] }),
        );
        assert_eq!(
            out,
            vec![json!({ "terms": { "status": ["active", "pending"] } })]
        );
    }

    #[test]
    fn test_term_rejects_empty_or_missing() {
        let empty = json!({ "field": "status", "query": [] });
        assert!(ClauseSpec::decode(ClauseKind::Term, &empty).is_err());

        let no_field = json!({ "query": ["a"] });
        assert!(ClauseSpec::decode(ClauseKind::Term, &no_field).is_err());

        let scalar = json!({ "field": "status", "query": "active" });
        assert!(ClauseSpec::decode(ClauseKind::Term, &scalar).is_err());

        let not_object = json!(["status"]);
        let err = ClauseSpec::decode(ClauseKind::Term, &not_object).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_range_defaults_to_half_open() {
        let out = nodes(
            ClauseKind::Range,
            json!({
                "field": "age",
                "query": { "left": { "value": 18 }, "right": { "value": 65 } }
            }),
        );
        assert_eq!(
            out,
            vec![json!({ "range": { "age": { "gte": 18, "lt": 65 } } })]
        );
    }

    #[test]
    fn test_range_explicit_operators_override() {
        let out = nodes(
            ClauseKind::Range,
            json!({
                "field": "age",
                "query": {
                    "left": { "value": 18, "op": ">" },
                    "right": { "value": 65 }
                }
            }),
        );
        assert_eq!(
            out,
            vec![json!({ "range": { "age": { "gt": 18, "lt": 65 } } })]
        );

        let out = nodes(
            ClauseKind::Range,
            json!({
                "field": "age",
                "query": {
                    "left": { "value": 18 },
                    "right": { "value": 65, "op": "<=" }
                }
            }),
        );
        assert_eq!(
            out,
            vec![json!({ "range": { "age": { "gte": 18, "lte": 65 } } })]
        );
    }

    #[test]
    fn test_range_absent_side_is_unconstrained() {
        let out = nodes(
            ClauseKind::Range,
            json!({ "field": "price", "query": { "right": { "value": 100 } } }),
        );
        assert_eq!(out, vec![json!({ "range": { "price": { "lt": 100 } } })]);

        let out = nodes(
            ClauseKind::Range,
            json!({
                "field": "price",
                "query": { "left": { "value": 5 }, "right": { "value": null } }
            }),
        );
        assert_eq!(out, vec![json!({ "range": { "price": { "gte": 5 } } })]);
    }

    #[test]
    fn test_range_sides_on_same_end_keep_the_right() {
        let out = nodes(
            ClauseKind::Range,
            json!({
                "field": "age",
                "query": {
                    "left": { "value": 18, "op": ">" },
                    "right": { "value": 21, "op": ">=" }
                }
            }),
        );
        assert_eq!(out, vec![json!({ "range": { "age": { "gte": 21 } } })]);

        let out = nodes(
            ClauseKind::Range,
            json!({
                "field": "age",
                "query": {
                    "left": { "value": 65, "op": "<=" },
                    "right": { "value": 70, "op": "<" }
                }
            }),
        );
        assert_eq!(out, vec![json!({ "range": { "age": { "lt": 70 } } })]);
    }

    #[test]
    fn test_range_unknown_operator_uses_default() {
        let out = nodes(
            ClauseKind::Range,
            json!({
                "field": "age",
                "query": { "left": { "value": 1, "op": "=>" }, "right": { "value": 2, "op": "" } }
            }),
        );
        assert_eq!(out, vec![json!({ "range": { "age": { "gte": 1, "lt": 2 } } })]);
    }

    #[test]
    fn test_range_without_bounds_fails() {
        let body = json!({ "field": "age", "query": {} });
        assert!(ClauseSpec::decode(ClauseKind::Range, &body).is_err());

        let body = json!({ "field": "age" });
        assert!(ClauseSpec::decode(ClauseKind::Range, &body).is_err());
    }

    #[test]
    fn test_exists_carries_name() {
        let out = nodes(
            ClauseKind::Exists,
            json!({ "field": "tags", "query": "has_tags" }),
        );
        assert_eq!(
            out,
            vec![json!({ "exists": { "field": "tags", "_name": "has_tags" } })]
        );

        let out = nodes(ClauseKind::Exists, json!({ "field": "tags" }));
        assert_eq!(out, vec![json!({ "exists": { "field": "tags" } })]);
    }

    #[test]
    fn test_match_pads_missing_weights() {
        let out = nodes(
            ClauseKind::Match,
            json!({
                "field": "title",
                "query": ["rust", "tokio", "serde"],
                "weight": [3],
                "type": "phrase"
            }),
        );
        assert_eq!(
            out,
            vec![
                json!({ "match": { "title": { "query": "rust", "boost": 3.0 } } }),
                json!({ "match": { "title": { "query": "tokio", "boost": 1.0 } } }),
                json!({ "match": { "title": { "query": "serde", "boost": 1.0 } } }),
            ]
        );
    }

    #[test]
    fn test_match_ignores_surplus_weights() {
        let spec = ClauseSpec::decode(
            ClauseKind::Match,
            &json!({ "field": "title", "query": ["rust"], "weight": [2, 5] }),
        )
        .unwrap();
        let out = spec.into_nodes();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].boost(), 2.0);
    }

    #[test]
    fn test_match_with_no_values_yields_nothing() {
        let out = nodes(ClauseKind::Match, json!({ "field": "title", "query": [] }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_multi_match_passes_fields_through() {
        let out = nodes(
            ClauseKind::MultiMatch,
            json!({ "query": "value", "fields": ["field1", "*_field2", "field3^2"] }),
        );
        assert_eq!(
            out,
            vec![json!({
                "multi_match": { "query": "value", "fields": ["field1", "*_field2", "field3^2"] }
            })]
        );

        let missing = json!({ "fields": ["a"] });
        assert!(ClauseSpec::decode(ClauseKind::MultiMatch, &missing).is_err());
    }

    #[test]
    fn test_geo_bounding_box() {
        let out = nodes(
            ClauseKind::GeoBoundingBox,
            json!({
                "field": "pin",
                "order": "asc",
                "top_left": { "lat": 40.8, "lon": -74.0 },
                "bottom_right": { "lat": 40.7, "lon": -73.0 }
            }),
        );
        assert_eq!(
            out,
            vec![json!({
                "geo_bounding_box": {
                    "pin": {
                        "top_left": { "lat": 40.8, "lon": -74.0 },
                        "bottom_right": { "lat": 40.7, "lon": -73.0 }
                    }
                }
            })]
        );

        let missing_corner = json!({ "field": "pin", "top_left": { "lat": 1.0, "lon": 2.0 } });
        assert!(ClauseSpec::decode(ClauseKind::GeoBoundingBox, &missing_corner).is_err());
    }

    #[test]
    fn test_geo_distance() {
        let spec = ClauseSpec::decode(
            ClauseKind::GeoDistance,
            &json!({
                "field": "pin",
                "distance": "1km",
                "order": "asc",
                "location": { "lat": 40.715, "lon": -73.988 }
            }),
        )
        .unwrap();
        assert!(matches!(spec, ClauseSpec::GeoDistance(_)));
        let out: Vec<Value> = spec.into_nodes().iter().map(|n| n.source()).collect();
        assert_eq!(
            out,
            vec![json!({
                "geo_distance": { "distance": "1km", "pin": { "lat": 40.715, "lon": -73.988 } }
            })]
        );

        let bad_lat = json!({ "field": "pin", "distance": "1km", "location": { "lat": "north", "lon": 1.0 } });
        assert!(ClauseSpec::decode(ClauseKind::GeoDistance, &bad_lat).is_err());
    }
}
