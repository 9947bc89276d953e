//! Collected data documents: features and the observations recorded on them.

use super::null_as_default;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// A geotagged entity within a layer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// Feature identifier.
    pub id: String,
    /// Owning layer.
    #[serde(default, deserialize_with = "null_as_default")]
    pub layer_id: String,
    /// Optional display name.
    #[serde(default)]
    pub caption: Option<String>,
    /// Optional point location.
    #[serde(default)]
    pub location: Option<Location>,
}

impl Feature {
    /// Creates a feature with no caption or location.
    #[must_use]
    pub fn new(id: impl Into<String>, layer_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layer_id: layer_id.into(),
            caption: None,
            location: None,
        }
    }

    /// Sets the caption.
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Sets the location.
    #[must_use]
    pub const fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(Location {
            latitude: Some(latitude),
            longitude: Some(longitude),
        });
        self
    }
}

/// A latitude/longitude pair.
///
/// Stored geopoints serialize as `_latitude`/`_longitude`; the plain names are
/// accepted too. Either coordinate may be missing or null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees.
    #[serde(default, rename = "_latitude", alias = "latitude")]
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    #[serde(default, rename = "_longitude", alias = "longitude")]
    pub longitude: Option<f64>,
}

/// A set of answers recorded against one feature.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Observation identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Feature this observation belongs to.
    #[serde(default, deserialize_with = "null_as_default")]
    pub feature_id: String,
    /// Layer the observation was recorded in.
    #[serde(default, deserialize_with = "null_as_default")]
    pub layer_id: String,
    /// Answers keyed by element id. A null map reads as empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub responses: HashMap<String, Value>,
}

impl Observation {
    /// Creates an observation with no responses.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        feature_id: impl Into<String>,
        layer_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            feature_id: feature_id.into(),
            layer_id: layer_id.into(),
            responses: HashMap::new(),
        }
    }

    /// Adds a response for an element.
    #[must_use]
    pub fn with_response(mut self, element_id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.responses.insert(element_id.into(), value.into());
        self
    }

    /// Returns the answer recorded for an element.
    #[must_use]
    pub fn response(&self, element_id: &str) -> Option<&Value> {
        self.responses.get(element_id)
    }
}
