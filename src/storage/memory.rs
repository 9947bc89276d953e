//! In-memory document store.
//!
//! Backs the snapshot loader and tests. Collections keep insertion order,
//! which stands in for the order a real store returns query results in.

use crate::models::{Feature, Observation, Project};
use crate::storage::traits::DocumentStore;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::RwLock;

/// Documents held for one project.
#[derive(Debug, Default, Clone)]
struct ProjectDocuments {
    project: Option<Project>,
    features: Vec<Feature>,
    observations: Vec<Observation>,
}

/// In-memory document store.
///
/// Uses `RwLock` so concurrent exports can read while tests seed data.
///
/// # Example
///
/// ```rust,ignore
/// use ground_export::storage::InMemoryDocumentStore;
/// use ground_export::models::{Feature, Project};
///
/// let store = InMemoryDocumentStore::new();
/// store.insert_project(Project::new("p1"))?;
/// store.insert_feature("p1", Feature::new("f1", "l1"))?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    projects: RwLock<HashMap<String, ProjectDocuments>>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a project document.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn insert_project(&self, project: Project) -> Result<()> {
        let id = project.id.clone();
        let mut projects = self.write()?;
        projects.entry(id).or_default().project = Some(project);
        Ok(())
    }

    /// Appends a feature to a project's feature collection.
    ///
    /// The project document does not need to exist; orphaned collections are
    /// simply unreachable through [`DocumentStore::fetch_project`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn insert_feature(&self, project_id: &str, feature: Feature) -> Result<()> {
        let mut projects = self.write()?;
        projects
            .entry(project_id.to_string())
            .or_default()
            .features
            .push(feature);
        Ok(())
    }

    /// Appends an observation to a project's observation collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn insert_observation(&self, project_id: &str, observation: Observation) -> Result<()> {
        let mut projects = self.write()?;
        projects
            .entry(project_id.to_string())
            .or_default()
            .observations
            .push(observation);
        Ok(())
    }

    /// Returns the number of project documents stored.
    #[must_use]
    pub fn project_count(&self) -> usize {
        self.projects
            .read()
            .map(|p| p.values().filter(|d| d.project.is_some()).count())
            .unwrap_or(0)
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, ProjectDocuments>>> {
        self.projects
            .read()
            .map_err(|e| Error::operation("read_document_store", e))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, ProjectDocuments>>> {
        self.projects
            .write()
            .map_err(|e| Error::operation("write_document_store", e))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn fetch_project(&self, project_id: &str) -> Result<Option<Project>> {
        let projects = self.read()?;
        Ok(projects.get(project_id).and_then(|d| d.project.clone()))
    }

    fn fetch_features_by_layer_id(
        &self,
        project_id: &str,
        layer_id: &str,
    ) -> Result<Vec<Feature>> {
        let projects = self.read()?;
        Ok(projects
            .get(project_id)
            .map(|d| {
                d.features
                    .iter()
                    .filter(|f| f.layer_id == layer_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_observations_by_layer_id(
        &self,
        project_id: &str,
        layer_id: &str,
    ) -> Result<Vec<Observation>> {
        let projects = self.read()?;
        Ok(projects
            .get(project_id)
            .map(|d| {
                d.observations
                    .iter()
                    .filter(|o| o.layer_id == layer_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_missing_project() {
        let store = InMemoryDocumentStore::new();
        assert!(store.fetch_project("nope").unwrap().is_none());
        assert_eq!(store.project_count(), 0);
    }

    #[test]
    fn test_collections_without_project_document() {
        let store = InMemoryDocumentStore::new();
        store.insert_feature("p1", Feature::new("f1", "l1")).unwrap();
        assert!(store.fetch_project("p1").unwrap().is_none());
        assert_eq!(store.project_count(), 0);
    }

    #[test]
    fn test_insert_project_replaces_document_and_keeps_collections() {
        let store = InMemoryDocumentStore::new();
        store.insert_feature("p1", Feature::new("f1", "l1")).unwrap();
        store.insert_project(Project::new("p1")).unwrap();
        store
            .insert_project(Project::new("p1").with_layer("l1", crate::models::Layer::new()))
            .unwrap();

        let project = store.fetch_project("p1").unwrap().unwrap();
        assert!(project.layer("l1").is_some());
        assert_eq!(store.project_count(), 1);
        assert_eq!(store.fetch_features_by_layer_id("p1", "l1").unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_filters_by_layer_and_keeps_order() {
        let store = InMemoryDocumentStore::new();
        store.insert_project(Project::new("p1")).unwrap();
        store.insert_feature("p1", Feature::new("f2", "l1")).unwrap();
        store.insert_feature("p1", Feature::new("fx", "l2")).unwrap();
        store.insert_feature("p1", Feature::new("f1", "l1")).unwrap();
        store
            .insert_observation("p1", Observation::new("o1", "f1", "l1"))
            .unwrap();
        store
            .insert_observation("p1", Observation::new("o2", "fx", "l2"))
            .unwrap();

        let features = store.fetch_features_by_layer_id("p1", "l1").unwrap();
        let ids: Vec<&str> = features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f2", "f1"]);

        let observations = store.fetch_observations_by_layer_id("p1", "l2").unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].id, "o2");

        assert!(store.fetch_features_by_layer_id("p2", "l1").unwrap().is_empty());
    }
}
