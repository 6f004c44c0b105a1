//! Core types for the query system

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// How the children of a boolean node combine
///
/// The top level of a request compiles in `Filter`; the `and`, `or` and `not`
/// keywords switch their sub-tree to `Must`, `Should` and `MustNot`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occur {
    /// All clauses must match (AND). Does not contribute to score.
    #[default]
    Filter,
    /// All clauses must match (AND). Contributes to score.
    Must,
    /// At least one clause should match (OR). Contributes to score.
    Should,
    /// No clause may match (NOT).
    MustNot,
}

impl Occur {
    /// Map a logic keyword (`and`, `or`, `not`) to its occurrence, case-insensitively
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "and" => Some(Occur::Must),
            "or" => Some(Occur::Should),
            "not" => Some(Occur::MustNot),
            _ => None,
        }
    }

    /// Key of this occurrence inside a `bool` query
    pub fn as_str(&self) -> &'static str {
        match self {
            Occur::Filter => "filter",
            Occur::Must => "must",
            Occur::Should => "should",
            Occur::MustNot => "must_not",
        }
    }
}

impl fmt::Display for Occur {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of one side of a range clause
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOp {
    /// Default operator of the left (lower) bound
    pub const LEFT_DEFAULT: RangeOp = RangeOp::Gte;
    /// Default operator of the right (upper) bound
    pub const RIGHT_DEFAULT: RangeOp = RangeOp::Lt;

    /// Key used in the rendered range query
    pub fn as_key(&self) -> &'static str {
        match self {
            RangeOp::Gt => "gt",
            RangeOp::Gte => "gte",
            RangeOp::Lt => "lt",
            RangeOp::Lte => "lte",
        }
    }
}

impl FromStr for RangeOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(RangeOp::Gt),
            ">=" => Ok(RangeOp::Gte),
            "<" => Ok(RangeOp::Lt),
            "<=" => Ok(RangeOp::Lte),
            other => Err(format!("unknown range operator: {:?}", other)),
        }
    }
}

impl fmt::Display for RangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            RangeOp::Gt => ">",
            RangeOp::Gte => ">=",
            RangeOp::Lt => "<",
            RangeOp::Lte => "<=",
        };
        f.write_str(op)
    }
}

/// Range bounds for range queries
///
/// Bound values keep their JSON type so that numbers, dates and keywords all
/// pass through to the engine unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    /// Greater than or equal to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    /// Greater than
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    /// Less than or equal to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
    /// Less than
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
}

impl RangeBounds {
    /// Set the bound for `op`
    ///
    /// A range holds at most one lower and one upper bound, so setting `gt`
    /// clears `gte` (and the reverse), and likewise for `lt` and `lte`.
    pub fn set(&mut self, op: RangeOp, value: Value) {
        let (slot, other) = match op {
            RangeOp::Gt => (&mut self.gt, &mut self.gte),
            RangeOp::Gte => (&mut self.gte, &mut self.gt),
            RangeOp::Lt => (&mut self.lt, &mut self.lte),
            RangeOp::Lte => (&mut self.lte, &mut self.lt),
        };
        *slot = Some(value);
        *other = None;
    }

    pub fn get(&self, op: RangeOp) -> Option<&Value> {
        match op {
            RangeOp::Gt => self.gt.as_ref(),
            RangeOp::Gte => self.gte.as_ref(),
            RangeOp::Lt => self.lt.as_ref(),
            RangeOp::Lte => self.lte.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gte.is_none() && self.gt.is_none() && self.lte.is_none() && self.lt.is_none()
    }

    /// Render the bounds in `gte, gt, lte, lt` order
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for op in [RangeOp::Gte, RangeOp::Gt, RangeOp::Lte, RangeOp::Lt] {
            if let Some(value) = self.get(op) {
                map.insert(op.as_key().to_string(), value.clone());
            }
        }
        map
    }
}

/// A latitude/longitude pair
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "lat": self.lat, "lon": self.lon })
    }
}
