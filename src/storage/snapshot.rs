//! JSON snapshot loader.
//!
//! Reads an exported copy of the document store into an
//! [`InMemoryDocumentStore`]. The file layout mirrors the store's document
//! tree, with each project carrying its feature and observation collections:
//!
//! ```json
//! {
//!   "projects": {
//!     "p1": {
//!       "layers": { "l1": { "forms": { "form1": { "elements": { ... } } } } },
//!       "features": [ { "id": "f1", "layerId": "l1", "caption": "Tree A" } ],
//!       "observations": [ { "id": "o1", "featureId": "f1", "layerId": "l1", "responses": {} } ]
//!     }
//!   }
//! }
//! ```

use crate::models::{Feature, Layer, Observation, OrderedMap, Project};
use crate::storage::memory::InMemoryDocumentStore;
use crate::{Error, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    projects: OrderedMap<SnapshotProject>,
}

#[derive(Debug, Deserialize)]
struct SnapshotProject {
    #[serde(default)]
    layers: OrderedMap<Layer>,
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default)]
    observations: Vec<Observation>,
}

/// Loads a snapshot file from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not a valid snapshot.
pub fn load_snapshot(path: &Path) -> Result<InMemoryDocumentStore> {
    let file = std::fs::File::open(path).map_err(|e| Error::OperationFailed {
        operation: "open_snapshot".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    let store = load_snapshot_from_reader(std::io::BufReader::new(file))?;
    tracing::info!(
        path = %path.display(),
        projects = store.project_count(),
        "Loaded document snapshot"
    );
    Ok(store)
}

/// Loads a snapshot from any reader.
///
/// # Errors
///
/// Returns an error if the input is not a valid snapshot document.
pub fn load_snapshot_from_reader<R: Read>(reader: R) -> Result<InMemoryDocumentStore> {
    let snapshot: SnapshotFile =
        serde_json::from_reader(reader).map_err(|e| Error::operation("parse_snapshot", e))?;

    let store = InMemoryDocumentStore::new();
    for (project_id, entry) in snapshot.projects.iter() {
        let project = entry
            .layers
            .iter()
            .fold(Project::new(project_id), |project, (layer_id, layer)| {
                project.with_layer(layer_id, layer.clone())
            });
        store.insert_project(project)?;
        for feature in &entry.features {
            store.insert_feature(project_id, feature.clone())?;
        }
        for observation in &entry.observations {
            store.insert_observation(project_id, observation.clone())?;
        }
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::DocumentStore;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "projects": {
            "p1": {
                "layers": {"l1": {"forms": {"form1": {"elements": {
                    "e1": {"index": 0, "label": {"en": "Name"}}
                }}}}},
                "features": [
                    {"id": "f1", "layerId": "l1", "caption": "Tree A",
                     "location": {"_latitude": 10.0, "_longitude": 20.0}},
                    {"id": "f2", "layerId": "l1"}
                ],
                "observations": [
                    {"id": "o1", "featureId": "f1", "layerId": "l1", "responses": {"e1": "Oak"}}
                ]
            },
            "p2": {}
        }
    }"#;

    #[test]
    fn test_load_snapshot_from_reader() {
        let store = load_snapshot_from_reader(SNAPSHOT.as_bytes()).unwrap();
        assert_eq!(store.project_count(), 2);

        let project = store.fetch_project("p1").unwrap().unwrap();
        assert_eq!(project.id, "p1");
        assert!(project.layer("l1").is_some());

        let features = store.fetch_features_by_layer_id("p1", "l1").unwrap();
        assert_eq!(features.len(), 2);
        let observations = store.fetch_observations_by_layer_id("p1", "l1").unwrap();
        assert_eq!(observations.len(), 1);

        let empty = store.fetch_project("p2").unwrap().unwrap();
        assert!(empty.layers.is_empty());
    }

    #[test]
    fn test_load_snapshot_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();
        let store = load_snapshot(file.path()).unwrap();
        assert!(store.fetch_project("p1").unwrap().is_some());
    }

    const SPARSE_SNAPSHOT: &str = r#"{
        "projects": {
            "p1": {
                "layers": {"l1": {"forms": {"form1": {"elements": {
                    "e1": {"index": null, "label": {"en": null}}
                }}}}},
                "features": [
                    {"id": "f1", "layerId": "l1", "location": {"_latitude": 4.5}}
                ],
                "observations": [
                    {"id": "o1", "featureId": "f1", "layerId": "l1", "responses": null}
                ]
            }
        }
    }"#;

    #[test]
    fn test_load_snapshot_with_null_responses() {
        let store = load_snapshot_from_reader(SPARSE_SNAPSHOT.as_bytes()).unwrap();
        let observations = store.fetch_observations_by_layer_id("p1", "l1").unwrap();
        assert_eq!(observations.len(), 1);
        assert!(observations[0].responses.is_empty());
    }

    #[test]
    fn test_load_snapshot_with_null_label_and_index() {
        let store = load_snapshot_from_reader(SPARSE_SNAPSHOT.as_bytes()).unwrap();
        let project = store.fetch_project("p1").unwrap().unwrap();
        let (_, form) = project.layer("l1").unwrap().forms.first().unwrap();
        let element = form.elements.get("e1").unwrap();
        assert_eq!(element.index, 0);
        assert_eq!(element.display_label(), "Unnamed field");
    }

    #[test]
    fn test_load_snapshot_with_partial_location() {
        let store = load_snapshot_from_reader(SPARSE_SNAPSHOT.as_bytes()).unwrap();
        let features = store.fetch_features_by_layer_id("p1", "l1").unwrap();
        let location = features[0].location.as_ref().unwrap();
        assert_eq!(location.latitude, Some(4.5));
        assert!(location.longitude.is_none());
    }

    #[test]
    fn test_load_snapshot_rejects_garbage() {
        let result = load_snapshot_from_reader("not json".as_bytes());
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }

    #[test]
    fn test_load_snapshot_missing_file() {
        let result = load_snapshot(Path::new("/nonexistent/snapshot.json"));
        assert!(result.is_err());
    }
}
