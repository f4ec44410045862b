//! Suspect reference data.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::detection::FeatureVector;
use crate::ids::SuspectId;

/// The tracked individual of interest.
///
/// `features` is computed once from the reference image and treated as
/// immutable for the duration of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Suspect {
    pub id: SuspectId,

    /// Path or URL of the reference image
    #[serde(alias = "imageUrl")]
    pub reference_image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Cached reference embedding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,

    /// Structured appearance descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance: Option<AppearanceProfile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Suspect {
    pub fn new(id: SuspectId, reference_image: impl Into<String>) -> Self {
        Self {
            id,
            reference_image: reference_image.into(),
            name: None,
            description: None,
            features: None,
            appearance: None,
            last_seen: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_features(mut self, features: impl Into<FeatureVector>) -> Self {
        self.features = Some(features.into());
        self
    }

    /// Name for display, defaulting to "Suspect".
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Suspect")
    }

    pub fn has_reference_image(&self) -> bool {
        !self.reference_image.trim().is_empty()
    }
}

/// Appearance attributes extracted from the reference image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceProfile {
    #[serde(default)]
    pub face: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub clothing: Option<String>,
    #[serde(default)]
    pub hair: Option<String>,
    #[serde(default)]
    pub distinctive_marks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_defaults() {
        let suspect = Suspect::new(SuspectId::from("suspect-1"), "/suspects/suspect-1.jpg");
        assert_eq!(suspect.display_name(), "Suspect");
        assert_eq!(suspect.with_name("John Doe").display_name(), "John Doe");
    }

    #[test]
    fn test_image_url_alias() {
        let json = serde_json::json!({
            "id": "suspect-123456",
            "imageUrl": "/suspects/suspect-123456.jpg",
            "name": "Unknown Subject"
        });
        let suspect: Suspect = serde_json::from_value(json).unwrap();
        assert!(suspect.has_reference_image());
        assert_eq!(suspect.reference_image, "/suspects/suspect-123456.jpg");
    }
}
