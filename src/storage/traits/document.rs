//! Document store trait.

use crate::Result;
use crate::models::{Feature, Observation, Project};

/// Read-only view of the document store the exporter pulls from.
///
/// Implementations return point-in-time snapshots. The two bulk reads are
/// independent: nothing guarantees that features and observations come from
/// the same instant, and callers accept that.
///
/// Collections are returned in store order. The exporter treats that order as
/// authoritative and never re-sorts features or observations.
pub trait DocumentStore: Send + Sync {
    /// Fetches a project document, or `None` if it does not exist.
    fn fetch_project(&self, project_id: &str) -> Result<Option<Project>>;

    /// Fetches every feature of a project belonging to `layer_id`.
    fn fetch_features_by_layer_id(&self, project_id: &str, layer_id: &str)
    -> Result<Vec<Feature>>;

    /// Fetches every observation of a project recorded in `layer_id`.
    fn fetch_observations_by_layer_id(
        &self,
        project_id: &str,
        layer_id: &str,
    ) -> Result<Vec<Observation>>;
}
