//! Column resolution.
//!
//! Turns a project's layer/form/element tree into the ordered list of CSV
//! columns. A missing layer or form is not an error: the export degrades to
//! the fixed columns only.

use crate::config::FormSelection;
use crate::models::{Form, Project};
use crate::{Error, Result};

/// Columns present in every export, in order.
pub const FIXED_COLUMNS: [&str; 4] = ["Place ID", "Place name", "Latitude", "Longitude"];

/// A form element projected onto a CSV column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementColumn {
    /// Element id, used to look up responses.
    pub id: String,
    /// Header text.
    pub label: String,
    /// Order index from the form definition.
    pub index: i64,
}

/// Ordered element columns of one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSchema {
    elements: Vec<ElementColumn>,
}

impl ExportSchema {
    /// A schema with no element columns.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Resolves the schema of `layer_id` within `project`.
    ///
    /// Elements are sorted by ascending `index`; the sort is stable, so equal
    /// indexes keep document order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousForm`] when `policy` is
    /// [`FormSelection::Single`] and the layer has more than one form.
    pub fn resolve(
        project: &Project,
        layer_id: Option<&str>,
        policy: FormSelection,
    ) -> Result<Self> {
        let Some(layer_id) = layer_id else {
            return Ok(Self::empty());
        };
        let Some(layer) = project.layer(layer_id) else {
            tracing::debug!(
                project_id = %project.id,
                layer_id,
                "Layer not found; exporting without element columns"
            );
            return Ok(Self::empty());
        };

        if policy == FormSelection::Single && layer.forms.len() > 1 {
            return Err(Error::AmbiguousForm {
                layer_id: layer_id.to_string(),
                count: layer.forms.len(),
            });
        }

        Ok(layer
            .forms
            .first()
            .map(|(_, form)| Self::from_form(form))
            .unwrap_or_default())
    }

    /// Builds the schema of a single form.
    #[must_use]
    pub fn from_form(form: &Form) -> Self {
        let mut elements: Vec<ElementColumn> = form
            .elements
            .iter()
            .map(|(id, element)| ElementColumn {
                id: id.to_string(),
                label: element.display_label().to_string(),
                index: element.index,
            })
            .collect();
        elements.sort_by_key(|column| column.index);
        Self { elements }
    }

    /// Element columns in output order.
    #[must_use]
    pub fn elements(&self) -> &[ElementColumn] {
        &self.elements
    }

    /// Total number of columns, fixed columns included.
    #[must_use]
    pub fn width(&self) -> usize {
        FIXED_COLUMNS.len() + self.elements.len()
    }

    /// Header row.
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        FIXED_COLUMNS
            .iter()
            .map(ToString::to_string)
            .chain(self.elements.iter().map(|c| c.label.clone()))
            .collect()
    }
}
