//! Per-frame person detections produced by the external person detector.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Bounding box in pixel coordinates, serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    /// Left edge
    pub x1: f64,
    /// Top edge
    pub y1: f64,
    /// Right edge
    pub x2: f64,
    /// Bottom edge
    pub y2: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box width (zero for inverted boxes).
    #[inline]
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Box height (zero for inverted boxes).
    #[inline]
    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Whether the box encloses any area.
    pub fn is_valid(&self) -> bool {
        self.area() > 0.0
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl JsonSchema for BoundingBox {
    fn schema_name() -> String {
        "BoundingBox".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <[f64; 4]>::json_schema(gen)
    }
}

/// Fixed-length numeric appearance embedding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FeatureVector(pub Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// L2 norm, accumulated in f64.
    pub fn norm(&self) -> f64 {
        self.0
            .iter()
            .map(|&v| (v as f64) * (v as f64))
            .sum::<f64>()
            .sqrt()
    }

    /// True when every component is zero (or the vector is empty).
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// A person found in a single frame.
///
/// Transient: only persisted as evidence on a tracking result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPerson {
    /// Bounding box within the frame
    #[serde(alias = "boundingBox")]
    pub bbox: BoundingBox,

    /// Free-text appearance description
    #[serde(default)]
    pub description: String,

    /// Position within the scene (e.g. "near the north entrance")
    #[serde(default)]
    pub position: String,

    /// Items the person is carrying
    #[serde(default)]
    pub carrying: Vec<String>,

    /// Observed activities
    #[serde(default)]
    pub activities: Vec<String>,

    /// Appearance embedding, when the detector provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,
}

impl DetectedPerson {
    /// Create a detection with only a bounding box.
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            ..Default::default()
        }
    }

    /// Attach an embedding.
    pub fn with_features(mut self, features: impl Into<FeatureVector>) -> Self {
        self.features = Some(features.into());
        self
    }

    /// Attach carried items.
    pub fn carrying<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.carrying = items.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_serializes_as_array() {
        let bbox = BoundingBox::new(10.0, 20.0, 110.0, 220.0);
        let json = serde_json::to_value(bbox).unwrap();
        assert_eq!(json, serde_json::json!([10.0, 20.0, 110.0, 220.0]));

        let back: BoundingBox = serde_json::from_value(json).unwrap();
        assert_eq!(back, bbox);
        assert_eq!(back.area(), 100.0 * 200.0);
    }

    #[test]
    fn test_inverted_bbox_has_no_area() {
        let bbox = BoundingBox::new(50.0, 50.0, 10.0, 10.0);
        assert_eq!(bbox.area(), 0.0);
        assert!(!bbox.is_valid());
    }

    #[test]
    fn test_feature_vector_norm() {
        let v = FeatureVector::new(vec![3.0, 4.0]);
        assert!((v.norm() - 5.0).abs() < 1e-9);
        assert!(!v.is_zero());
        assert!(FeatureVector::new(vec![0.0, 0.0]).is_zero());
    }

    #[test]
    fn test_detected_person_accepts_bounding_box_alias() {
        let json = serde_json::json!({
            "boundingBox": [0.0, 0.0, 5.0, 5.0],
            "description": "dark jacket",
            "carrying": ["Backpack"]
        });
        let person: DetectedPerson = serde_json::from_value(json).unwrap();
        assert_eq!(person.bbox, BoundingBox::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(person.carrying, vec!["Backpack".to_string()]);
        assert!(person.features.is_none());
    }
}
