//! Project schema documents: project, layer, form, element.

use super::{OrderedMap, null_as_default};
use serde::Deserialize;

/// Label used for elements that carry no display text.
pub const UNNAMED_FIELD: &str = "Unnamed field";

/// A survey project.
///
/// Layers are keyed by layer id in document order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Project {
    /// Project identifier (the document key).
    #[serde(default)]
    pub id: String,
    /// Layers keyed by layer id.
    #[serde(default)]
    pub layers: OrderedMap<Layer>,
}

impl Project {
    /// Creates a project with no layers.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layers: OrderedMap::new(),
        }
    }

    /// Adds a layer.
    #[must_use]
    pub fn with_layer(mut self, id: impl Into<String>, layer: Layer) -> Self {
        self.layers.insert(id, layer);
        self
    }

    /// Looks up a layer by id.
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.get(id)
    }
}

/// A category of collected data within a project.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Layer {
    /// Forms keyed by form id, in document order.
    #[serde(default)]
    pub forms: OrderedMap<Form>,
}

impl Layer {
    /// Creates a layer with no forms.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forms: OrderedMap::new(),
        }
    }

    /// Adds a form.
    #[must_use]
    pub fn with_form(mut self, id: impl Into<String>, form: Form) -> Self {
        self.forms.insert(id, form);
        self
    }
}

/// A set of field definitions used to structure observations.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Form {
    /// Elements keyed by element id.
    #[serde(default)]
    pub elements: OrderedMap<Element>,
}

impl Form {
    /// Creates a form with no elements.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elements: OrderedMap::new(),
        }
    }

    /// Adds an element.
    #[must_use]
    pub fn with_element(mut self, id: impl Into<String>, element: Element) -> Self {
        self.elements.insert(id, element);
        self
    }
}

/// A single form field definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Element {
    /// Display and column order. Null reads as 0.
    #[serde(default, deserialize_with = "null_as_default")]
    pub index: i64,
    /// Display label keyed by locale code. Values may be null.
    #[serde(default)]
    pub label: OrderedMap<Option<String>>,
}

impl Element {
    /// Creates an unlabeled element at the given index.
    #[must_use]
    pub const fn new(index: i64) -> Self {
        Self {
            index,
            label: OrderedMap::new(),
        }
    }

    /// Adds a localized label.
    #[must_use]
    pub fn with_label(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.label.insert(locale, Some(text.into()));
        self
    }

    /// Returns the first localized label, or [`UNNAMED_FIELD`].
    ///
    /// Only the first locale is considered; an empty or null first label also
    /// falls back to [`UNNAMED_FIELD`].
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label
            .values()
            .next()
            .and_then(Option::as_deref)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNNAMED_FIELD)
    }
}
