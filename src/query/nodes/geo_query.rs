//! Geo queries - bounding box and distance filters on geo_point fields

use crate::query::ast::QueryNode;
use crate::query::types::GeoPoint;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Matches points that fall inside a rectangle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundingBoxQuery {
    pub field: String,
    pub top_left: GeoPoint,
    pub bottom_right: GeoPoint,
}

impl GeoBoundingBoxQuery {
    pub fn new(field: impl Into<String>, top_left: GeoPoint, bottom_right: GeoPoint) -> Self {
        Self {
            field: field.into(),
            top_left,
            bottom_right,
        }
    }
}

impl QueryNode for GeoBoundingBoxQuery {
    fn source(&self) -> Value {
        let mut inner = Map::new();
        inner.insert(
            self.field.clone(),
            json!({
                "top_left": self.top_left.to_value(),
                "bottom_right": self.bottom_right.to_value(),
            }),
        );
        json!({ "geo_bounding_box": inner })
    }

    fn query_type(&self) -> &'static str {
        "geo_bounding_box"
    }

    fn is_scoring(&self) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

/// Matches points within `distance` of a center point
///
/// The distance is a magnitude with a unit suffix, e.g. `"12km"` or `"200m"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoDistanceQuery {
    pub field: String,
    pub center: GeoPoint,
    pub distance: String,
}

impl GeoDistanceQuery {
    pub fn new(field: impl Into<String>, center: GeoPoint, distance: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            center,
            distance: distance.into(),
        }
    }
}

impl QueryNode for GeoDistanceQuery {
    fn source(&self) -> Value {
        let mut inner = Map::new();
        inner.insert("distance".to_string(), json!(self.distance));
        inner.insert(self.field.clone(), self.center.to_value());
        json!({ "geo_distance": inner })
    }

    fn query_type(&self) -> &'static str {
        "geo_distance"
    }

    fn is_scoring(&self) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_source() {
        let query = GeoBoundingBoxQuery::new(
            "location",
            GeoPoint::new(40.8, -74.0),
            GeoPoint::new(40.7, -73.0),
        );
        assert_eq!(
            query.source(),
            json!({
                "geo_bounding_box": {
                    "location": {
                        "top_left": { "lat": 40.8, "lon": -74.0 },
                        "bottom_right": { "lat": 40.7, "lon": -73.0 }
                    }
                }
            })
        );
        assert!(!query.is_scoring());
    }

    #[test]
    fn test_distance_source() {
        let query = GeoDistanceQuery::new("pin", GeoPoint::new(40.715, -73.988), "2km");
        assert_eq!(
            query.source(),
            json!({
                "geo_distance": {
                    "distance": "2km",
                    "pin": { "lat": 40.715, "lon": -73.988 }
                }
            })
        );
        assert_eq!(query.query_type(), "geo_distance");
    }
}
