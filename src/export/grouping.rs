//! Observation grouping.
//!
//! Observations arrive as one flat collection; rows are emitted per feature.
//! The whole observation set is indexed by feature id in memory before any
//! row is written. That costs memory proportional to the layer's data but
//! keeps emission a simple nested loop.

use crate::models::{Feature, Observation};
use std::collections::{HashMap, HashSet};

/// Observations grouped by owning feature id.
///
/// Each group keeps the order in which observations were fetched.
#[derive(Debug, Default, Clone)]
pub struct ObservationIndex {
    groups: HashMap<String, Vec<Observation>>,
    total: usize,
}

impl ObservationIndex {
    /// Builds the index from fetched observations.
    #[must_use]
    pub fn build(observations: Vec<Observation>) -> Self {
        let total = observations.len();
        let mut groups: HashMap<String, Vec<Observation>> = HashMap::new();
        for observation in observations {
            groups
                .entry(observation.feature_id.clone())
                .or_default()
                .push(observation);
        }
        Self { groups, total }
    }

    /// Observations recorded against `feature_id`, in fetch order.
    #[must_use]
    pub fn observations_for(&self, feature_id: &str) -> &[Observation] {
        self.groups
            .get(feature_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total observations indexed.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.total
    }

    /// Whether no observations were indexed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct feature ids referenced.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Counts observations whose feature is not among `features`.
    #[must_use]
    pub fn orphan_count(&self, features: &[Feature]) -> usize {
        let known: HashSet<&str> = features.iter().map(|f| f.id.as_str()).collect();
        self.groups
            .iter()
            .filter(|(feature_id, _)| !known.contains(feature_id.as_str()))
            .map(|(_, group)| group.len())
            .sum()
    }
}

/// Features joined with their grouped observations.
#[derive(Debug, Default, Clone)]
pub struct GroupedFeatures {
    features: Vec<Feature>,
    index: ObservationIndex,
}

impl GroupedFeatures {
    /// Groups `observations` under `features`.
    #[must_use]
    pub fn new(features: Vec<Feature>, observations: Vec<Observation>) -> Self {
        Self {
            features,
            index: ObservationIndex::build(observations),
        }
    }

    /// Features in fetch order.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// The observation index.
    #[must_use]
    pub const fn index(&self) -> &ObservationIndex {
        &self.index
    }

    /// Observations that match no fetched feature.
    #[must_use]
    pub fn orphan_count(&self) -> usize {
        self.index.orphan_count(&self.features)
    }

    /// Iterates (feature, observation) pairs in output order.
    ///
    /// Features without observations yield nothing; orphaned observations are
    /// never reached.
    pub fn pairs(&self) -> impl Iterator<Item = (&Feature, &Observation)> {
        self.features.iter().flat_map(move |feature| {
            self.index
                .observations_for(&feature.id)
                .iter()
                .map(move |observation| (feature, observation))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(id: &str, feature: &str) -> Observation {
        Observation::new(id, feature, "l1")
    }

    #[test]
    fn test_groups_preserve_fetch_order() {
        let index = ObservationIndex::build(vec![
            obs("o3", "f1"),
            obs("o1", "f2"),
            obs("o2", "f1"),
        ]);
        let ids: Vec<&str> = index
            .observations_for("f1")
            .iter()
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(ids, vec!["o3", "o2"]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.group_count(), 2);
        assert!(index.observations_for("f9").is_empty());
    }

    #[test]
    fn test_pairs_follow_feature_order() {
        let grouped = GroupedFeatures::new(
            vec![Feature::new("f2", "l1"), Feature::new("f1", "l1")],
            vec![obs("a", "f1"), obs("b", "f2"), obs("c", "f1")],
        );
        let pairs: Vec<(&str, &str)> = grouped
            .pairs()
            .map(|(f, o)| (f.id.as_str(), o.id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("f2", "b"), ("f1", "a"), ("f1", "c")]);
    }

    #[test]
    fn test_orphans_and_empty_features() {
        let grouped = GroupedFeatures::new(
            vec![Feature::new("f1", "l1"), Feature::new("lonely", "l1")],
            vec![obs("a", "f1"), obs("b", "ghost"), obs("c", "ghost")],
        );
        assert_eq!(grouped.pairs().count(), 1);
        assert_eq!(grouped.orphan_count(), 2);
        assert_eq!(grouped.features().len(), 2);
    }

    #[test]
    fn test_empty_index() {
        let index = ObservationIndex::build(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.orphan_count(&[]), 0);
    }
}
