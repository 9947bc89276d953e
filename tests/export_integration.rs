//! Integration tests for the export engine over the in-memory store.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use ground_export::config::ExportSettings;
use ground_export::models::{Element, Feature, Form, Layer, Observation, Project};
use ground_export::storage::{InMemoryDocumentStore, load_snapshot};
use ground_export::{
    DocumentStore, Error, ExportRequest, ExportService, ExportSummary, FormSelection,
};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

const HEADER: &str = "\"Place ID\",\"Place name\",\"Latitude\",\"Longitude\"";

fn survey_store() -> InMemoryDocumentStore {
    let form = Form::new()
        .with_element("species", Element::new(1).with_label("en", "Species"))
        .with_element("height", Element::new(2).with_label("en", "Height (m)"))
        .with_element("notes", Element::new(3))
        .with_element("name", Element::new(0).with_label("en", "Name").with_label("fr", "Nom"));
    let store = InMemoryDocumentStore::new();
    store
        .insert_project(
            Project::new("p1").with_layer("trees", Layer::new().with_form("form1", form)),
        )
        .unwrap();

    store
        .insert_feature(
            "p1",
            Feature::new("t1", "trees")
                .with_caption("Old oak")
                .with_location(51.5, -0.12),
        )
        .unwrap();
    store.insert_feature("p1", Feature::new("t2", "trees")).unwrap();
    store
        .insert_feature("p1", Feature::new("t3", "trees").with_caption("Stump"))
        .unwrap();
    store.insert_feature("p1", Feature::new("b1", "benches")).unwrap();

    store
        .insert_observation(
            "p1",
            Observation::new("o1", "t2", "trees")
                .with_response("species", "Birch")
                .with_response("height", 7.5),
        )
        .unwrap();
    store
        .insert_observation(
            "p1",
            Observation::new("o2", "t1", "trees")
                .with_response("name", "Quercus \"Q\"")
                .with_response("notes", "leaning, hollow\nsecond line"),
        )
        .unwrap();
    store
        .insert_observation(
            "p1",
            Observation::new("o3", "t2", "trees")
                .with_response("species", json!(["Birch", "Alder"])),
        )
        .unwrap();
    store
        .insert_observation(
            "p1",
            Observation::new("o4", "ghost", "trees").with_response("name", "orphan"),
        )
        .unwrap();
    store
}

fn export(
    service: &ExportService<InMemoryDocumentStore>,
    request: &ExportRequest,
) -> (String, ExportSummary) {
    let mut output = Vec::new();
    let summary = service.export_to_writer(request, &mut output).unwrap();
    (String::from_utf8(output).unwrap(), summary)
}

fn parse(csv_text: &str) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(csv_text.as_bytes())
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn test_reference_scenario() {
    let store = InMemoryDocumentStore::new();
    let form = Form::new().with_element("e1", Element::new(0).with_label("en", "Name"));
    store
        .insert_project(Project::new("p1").with_layer("l1", Layer::new().with_form("form1", form)))
        .unwrap();
    store
        .insert_feature(
            "p1",
            Feature::new("f1", "l1")
                .with_caption("Tree A")
                .with_location(10.0, 20.0),
        )
        .unwrap();
    store.insert_feature("p1", Feature::new("f2", "l1")).unwrap();
    store
        .insert_observation("p1", Observation::new("o1", "f1", "l1").with_response("e1", "Oak"))
        .unwrap();

    let service = ExportService::new(Arc::new(store));
    let (output, _) = export(&service, &ExportRequest::new("p1").with_layer("l1"));

    assert_eq!(
        output,
        "\"Place ID\",\"Place name\",\"Latitude\",\"Longitude\",\"Name\"\n\
         \"f1\",\"Tree A\",\"10\",\"20\",\"Oak\"\n"
    );
}

#[test]
fn test_rows_follow_feature_then_observation_order() {
    let service = ExportService::new(Arc::new(survey_store()));
    let (output, summary) = export(&service, &ExportRequest::new("p1").with_layer("trees"));

    let rows = parse(&output);
    assert_eq!(
        rows[0],
        [
            "Place ID",
            "Place name",
            "Latitude",
            "Longitude",
            "Name",
            "Species",
            "Height (m)",
            "Unnamed field"
        ]
    );
    assert_eq!(
        rows[1],
        ["t1", "Old oak", "51.5", "-0.12", "Quercus \"Q\"", "", "", "leaning, hollow\nsecond line"]
    );
    assert_eq!(rows[2], ["t2", "", "", "", "", "Birch", "7.5", ""]);
    assert_eq!(rows[3], ["t2", "", "", "", "", "Birch,Alder", "", ""]);
    assert_eq!(rows.len(), 4, "t3 has no observations and the orphan is dropped");

    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.features, 3);
    assert_eq!(summary.observations, 4);
    assert_eq!(summary.orphaned_observations, 1);
    assert_eq!(summary.columns, 8);
}

#[test]
fn test_every_row_matches_header_width() {
    let service = ExportService::new(Arc::new(survey_store()));
    let (output, _) = export(&service, &ExportRequest::new("p1").with_layer("trees"));

    let rows = parse(&output);
    let width = rows[0].len();
    assert!(rows.iter().all(|row| row.len() == width));
}

#[test]
fn test_every_field_is_quoted_and_output_ends_with_newline() {
    let service = ExportService::new(Arc::new(survey_store()));
    let (output, _) = export(&service, &ExportRequest::new("p1").with_layer("trees"));

    assert!(output.ends_with("\"\n"));
    assert!(output.contains("\"Quercus \"\"Q\"\"\""));
    assert!(output.starts_with("\"Place ID\",\"Place name\""));
}

#[test]
fn test_repeated_exports_are_byte_identical() {
    let service = ExportService::new(Arc::new(survey_store()));
    let request = ExportRequest::new("p1").with_layer("trees");

    let (first, _) = export(&service, &request);
    let (second, _) = export(&service, &request);
    assert_eq!(first, second);
}

#[test]
fn test_missing_project_writes_nothing() {
    let service = ExportService::new(Arc::new(survey_store()));
    let result = service.prepare(&ExportRequest::new("p404").with_layer("trees"));
    assert!(matches!(result, Err(Error::ProjectNotFound(id)) if id == "p404"));
}

#[test]
fn test_unknown_layer_exports_fixed_columns_only() {
    let service = ExportService::new(Arc::new(survey_store()));
    let (output, summary) = export(&service, &ExportRequest::new("p1").with_layer("benches"));

    assert_eq!(output, format!("{HEADER}\n"));
    assert_eq!(summary.columns, 4);
    assert_eq!(summary.features, 1);
    assert_eq!(summary.rows_written, 0);
}

#[test]
fn test_missing_layer_parameter_is_header_only() {
    let service = ExportService::new(Arc::new(survey_store()));
    let (output, summary) = export(&service, &ExportRequest::new("p1"));

    assert_eq!(output, format!("{HEADER}\n"));
    assert_eq!(summary.features, 0);
    assert_eq!(summary.observations, 0);
}

#[test]
fn test_empty_label_renders_unnamed_field() {
    let store = InMemoryDocumentStore::new();
    let form = Form::new().with_element("e1", Element::new(0));
    store
        .insert_project(Project::new("p1").with_layer("l1", Layer::new().with_form("form1", form)))
        .unwrap();
    let service = ExportService::new(Arc::new(store));

    let (output, _) = export(&service, &ExportRequest::new("p1").with_layer("l1"));
    assert_eq!(output, format!("{HEADER},\"Unnamed field\"\n"));
}

fn two_form_store() -> InMemoryDocumentStore {
    let store = InMemoryDocumentStore::new();
    let layer = Layer::new()
        .with_form("second", Form::new().with_element("b", Element::new(0).with_label("en", "B")))
        .with_form("first", Form::new().with_element("a", Element::new(0).with_label("en", "A")));
    store.insert_project(Project::new("p1").with_layer("l1", layer)).unwrap();
    store
}

#[test]
fn test_first_form_policy_uses_document_order() {
    let service = ExportService::new(Arc::new(two_form_store()));
    let (output, _) = export(&service, &ExportRequest::new("p1").with_layer("l1"));
    assert_eq!(output, format!("{HEADER},\"B\"\n"));
}

#[test]
fn test_single_form_policy_rejects_ambiguous_layer() {
    let service = ExportService::new(Arc::new(two_form_store())).with_settings(ExportSettings {
        form_selection: FormSelection::Single,
        parallel_fetch: true,
    });
    let result = service.prepare(&ExportRequest::new("p1").with_layer("l1"));
    assert!(matches!(result, Err(Error::AmbiguousForm { count: 2, .. })));
}

/// Store whose bulk reads always fail.
struct FailingStore;

impl DocumentStore for FailingStore {
    fn fetch_project(&self, project_id: &str) -> ground_export::Result<Option<Project>> {
        Ok(Some(Project::new(project_id)))
    }

    fn fetch_features_by_layer_id(&self, _: &str, _: &str) -> ground_export::Result<Vec<Feature>> {
        Ok(vec![Feature::new("f1", "l1")])
    }

    fn fetch_observations_by_layer_id(
        &self,
        _: &str,
        _: &str,
    ) -> ground_export::Result<Vec<Observation>> {
        Err(Error::operation("fetch_observations", "connection reset"))
    }
}

#[test]
fn test_store_failure_surfaces_before_streaming() {
    for parallel_fetch in [true, false] {
        let service = ExportService::new(Arc::new(FailingStore)).with_settings(ExportSettings {
            form_selection: FormSelection::First,
            parallel_fetch,
        });
        let result = service.prepare(&ExportRequest::new("p1").with_layer("l1"));
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }
}

#[test]
fn test_export_from_snapshot_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"projects": {{"p1": {{
            "layers": {{"l1": {{"forms": {{"f": {{"elements": {{
                "z": {{"index": 1, "label": {{"en": "Second"}}}},
                "a": {{"index": 0, "label": {{"en": "First"}}}}
            }}}}}}}}}},
            "features": [{{"id": "f1", "layerId": "l1",
                          "location": {{"_latitude": 0, "_longitude": 1.25}}}}],
            "observations": [{{"id": "o1", "featureId": "f1", "layerId": "l1",
                              "responses": {{"a": 0, "z": false}}}}]
        }}}}}}"#
    )
    .unwrap();

    let store = load_snapshot(file.path()).unwrap();
    let service = ExportService::new(Arc::new(store));
    let (output, _) = export(&service, &ExportRequest::new("p1").with_layer("l1"));

    assert_eq!(
        output,
        format!("{HEADER},\"First\",\"Second\"\n\"f1\",\"\",\"0\",\"1.25\",\"0\",\"false\"\n")
    );
}

#[test]
fn test_export_from_sparse_snapshot() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"projects": {{"p1": {{
            "layers": {{"l1": {{"forms": {{"f": {{"elements": {{
                "e1": {{"index": null, "label": {{"en": null}}}}
            }}}}}}}}}},
            "features": [{{"id": "f1", "layerId": "l1", "location": {{"_longitude": 3.5}}}}],
            "observations": [{{"id": "o1", "featureId": "f1", "layerId": "l1",
                              "responses": null}}]
        }}}}}}"#
    )
    .unwrap();

    let store = load_snapshot(file.path()).unwrap();
    let service = ExportService::new(Arc::new(store));
    let (output, _) = export(&service, &ExportRequest::new("p1").with_layer("l1"));

    assert_eq!(
        output,
        format!("{HEADER},\"Unnamed field\"\n\"f1\",\"\",\"\",\"3.5\",\"\"\n")
    );
}
