//! Document models read from the store.
//!
//! The store keeps a nested document graph: a project owns layers, a layer
//! owns forms, a form owns elements. Features and observations live in flat
//! collections that point back at their layer (and, for observations, their
//! feature).

mod feature;
mod ordered;
mod project;

pub use feature::{Feature, Location, Observation};
pub use ordered::OrderedMap;
pub use project::{Element, Form, Layer, Project, UNNAMED_FIELD};

use serde::{Deserialize, Deserializer};

/// Reads `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
