//! Sort directive compiler
//!
//! Turns an ordered list of `(field, direction)` pairs into sort criteria. The
//! relevance score always closes the list as a descending tiebreak.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;

/// Ordered `(field, direction)` pairs as written by the user
///
/// Deserializes from a JSON object (`{"f1": "desc", "f2": "asc"}`, key order
/// kept) or from an array of pairs (`[["f1", "desc"], ["f2", "asc"]]`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortSpec(pub Vec<(String, String)>);

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair
    pub fn push(mut self, field: impl Into<String>, direction: impl Into<String>) -> Self {
        self.0.push((field.into(), direction.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Compile into sort criteria
    pub fn compile(&self) -> Vec<SortCriterion> {
        compile_sort(self)
    }
}

impl<F: Into<String>, D: Into<String>> FromIterator<(F, D)> for SortSpec {
    fn from_iter<I: IntoIterator<Item = (F, D)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(f, d)| (f.into(), d.into()))
                .collect(),
        )
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, direction) in &self.0 {
            map.serialize_entry(field, direction)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SortSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SortSpecVisitor;

        impl<'de> Visitor<'de> for SortSpecVisitor {
            type Value = SortSpec;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object of field/direction pairs, an array of pairs, or null")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(SortSpec::default())
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(SortSpec::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some((field, direction)) = access.next_entry::<String, String>()? {
                    pairs.push((field, direction));
                }
                Ok(SortSpec(pairs))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some(pair) = seq.next_element::<(String, String)>()? {
                    pairs.push(pair);
                }
                Ok(SortSpec(pairs))
            }
        }

        deserializer.deserialize_any(SortSpecVisitor)
    }
}

/// One entry of the request's `sort` section
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortCriterion {
    Field { field: String, ascending: bool },
    /// Relevance score, descending
    Score,
}

impl SortCriterion {
    pub fn field(field: impl Into<String>, ascending: bool) -> Self {
        SortCriterion::Field {
            field: field.into(),
            ascending,
        }
    }

    /// Render as Elasticsearch sort source
    pub fn source(&self) -> Value {
        match self {
            SortCriterion::Field { field, ascending } => {
                let order = if *ascending { "asc" } else { "desc" };
                let mut inner = Map::new();
                inner.insert(field.clone(), json!({ "order": order }));
                Value::Object(inner)
            }
            SortCriterion::Score => json!({ "_score": { "order": "desc" } }),
        }
    }
}

/// Compile sort pairs in input order, then append the score tiebreak
///
/// Directions other than the literals `asc` and `desc` drop their pair.
pub fn compile_sort(spec: &SortSpec) -> Vec<SortCriterion> {
    let mut criteria: Vec<SortCriterion> = spec
        .0
        .iter()
        .filter_map(|(field, direction)| match direction.as_str() {
            "asc" => Some(SortCriterion::field(field.clone(), true)),
            "desc" => Some(SortCriterion::field(field.clone(), false)),
            other => {
                tracing::debug!(field = %field, direction = %other, "dropping sort with unknown direction");
                None
            }
        })
        .collect();
    criteria.push(SortCriterion::Score);
    criteria
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_pairs_then_score() {
        let spec = SortSpec::new().push("f1", "desc").push("f2", "asc");
        let criteria = spec.compile();
        assert_eq!(
            criteria,
            vec![
                SortCriterion::field("f1", false),
                SortCriterion::field("f2", true),
                SortCriterion::Score,
            ]
        );
    }

    #[test]
    fn test_empty_sort_still_has_score() {
        assert_eq!(compile_sort(&SortSpec::default()), vec![SortCriterion::Score]);
    }

    #[test]
    fn test_unknown_direction_is_dropped() {
        let spec: SortSpec = vec![("a", "ASC"), ("b", "desc"), ("c", "up")].into_iter().collect();
        let criteria = spec.compile();
        assert_eq!(
            criteria,
            vec![SortCriterion::field("b", false), SortCriterion::Score]
        );
    }

    #[test]
    fn test_sort_source() {
        assert_eq!(
            SortCriterion::field("created_at", true).source(),
            json!({ "created_at": { "order": "asc" } })
        );
        assert_eq!(
            SortCriterion::Score.source(),
            json!({ "_score": { "order": "desc" } })
        );
    }

    #[test]
    fn test_deserialize_object_keeps_order() {
        let spec: SortSpec =
            serde_json::from_str(r#"{ "zeta": "desc", "alpha": "asc", "mid": "desc" }"#).unwrap();
        let fields: Vec<&str> = spec.0.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(fields, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_deserialize_pairs_and_null() {
        let spec: SortSpec = serde_json::from_str(r#"[["f1", "desc"], ["f2", "asc"]]"#).unwrap();
        assert_eq!(spec.len(), 2);

        let spec: SortSpec = serde_json::from_str("null").unwrap();
        assert!(spec.is_empty());

        assert!(serde_json::from_str::<SortSpec>(r#"{ "f1": 1 }"#).is_err());
    }

    #[test]
    fn test_serialize_as_object() {
        let spec = SortSpec::new().push("b", "asc").push("a", "desc");
        assert_eq!(
            serde_json::to_string(&spec).unwrap(),
            r#"{"b":"asc","a":"desc"}"#
        );
    }
}
