//! Scoring and classification of completed usage profiles.
//!
//! Profiles are read-only here. Each profile either qualifies and yields one
//! [`DenormalizationCandidate`], or is excluded as low-signal.

pub mod classify;
pub mod score;
pub mod weights;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::config::thresholds::MigrationThresholds;
use crate::models::{DenormalizationCandidate, EntityUsageProfile};

pub use classify::{classify_complexity, interpret_score, rate_score, recommend_datastore};
pub use score::{effective_read_write_ratio, score_components, strong_co_access, total_score};

/// A profile qualifies when it is eager-loaded at least at medium
/// frequency, is always loaded with something, or is co-accessed in
/// production at or above the co-access threshold.
pub fn qualifies(profile: &EntityUsageProfile, thresholds: &MigrationThresholds) -> bool {
    profile.eager_loading_count() >= thresholds.medium_frequency_threshold
        || !profile.always_loaded_with().is_empty()
        || strong_co_access(profile, thresholds).next().is_some()
}

/// Entities a candidate would absorb: the always-loaded set plus strongly
/// co-accessed entities, or its graph neighbours when neither exists.
fn candidate_related(profile: &EntityUsageProfile, thresholds: &MigrationThresholds) -> Vec<String> {
    let mut related: BTreeSet<String> = profile.always_loaded_with().clone();
    related.extend(strong_co_access(profile, thresholds).map(|(entity, _)| entity.clone()));
    if related.is_empty() {
        related.extend(profile.related_entities().keys().cloned());
    }
    related.into_iter().collect()
}

fn build_reason(
    profile: &EntityUsageProfile,
    thresholds: &MigrationThresholds,
    candidate: &DenormalizationCandidate,
) -> String {
    let mut signals: Vec<String> = Vec::new();

    let eager = profile.eager_loading_count();
    if eager > 0 {
        signals.push(format!("eager-loaded {eager} times"));
    }
    if !profile.always_loaded_with().is_empty() {
        let names: Vec<&str> = profile.always_loaded_with().iter().map(String::as_str).collect();
        signals.push(format!("always loaded with {}", names.join(", ")));
    }
    for (entity, count) in strong_co_access(profile, thresholds) {
        signals.push(format!("co-accessed with {entity} in {count} production executions"));
    }
    let ratio = effective_read_write_ratio(profile);
    if ratio > 0.0 {
        signals.push(format!("read/write ratio {ratio:.1}"));
    }

    let mut reason = signals.join("; ");
    if let Some(first) = reason.get(..1) {
        reason = format!("{}{}", first.to_uppercase(), &reason[1..]);
    }
    if !reason.is_empty() {
        reason.push_str(". ");
    }
    reason.push_str(&format!(
        "Score {} ({}), {} migration complexity, recommended target: {}.",
        candidate.score,
        candidate.interpretation.label(),
        candidate.complexity.as_str(),
        candidate.target_datastore.label()
    ));
    reason
}

/// Score one profile. Returns `None` for excluded profiles and for scores
/// below `minimum_score`.
pub fn score_candidate(
    profile: &EntityUsageProfile,
    thresholds: &MigrationThresholds,
) -> Option<DenormalizationCandidate> {
    if !qualifies(profile, thresholds) {
        debug!(entity = %profile.name(), "excluded: low signal");
        return None;
    }

    let components = score_components(profile, thresholds);
    let score = total_score(&components);
    if u64::from(score) < thresholds.minimum_score {
        debug!(
            entity = %profile.name(),
            score,
            minimum = thresholds.minimum_score,
            "excluded: below minimum score"
        );
        return None;
    }

    let related_entities = candidate_related(profile, thresholds);
    let co_access: BTreeMap<String, u64> = related_entities
        .iter()
        .map(|entity| (entity.clone(), profile.co_access_with(entity)))
        .filter(|(_, count)| *count > 0)
        .collect();
    let (complexity, complexity_value) = classify_complexity(profile);
    let target_datastore = recommend_datastore(profile, &related_entities, thresholds);

    let mut candidate = DenormalizationCandidate {
        primary_entity: profile.name().to_string(),
        related_entities,
        complexity,
        complexity_value,
        score,
        interpretation: interpret_score(score),
        rating: rate_score(score, thresholds),
        reason: String::new(),
        target_datastore,
        co_access,
        components,
    };
    candidate.reason = build_reason(profile, thresholds, &candidate);
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cardinality, EntityModel, MigrationComplexity, ScoreTier, TargetDatastore};

    fn customer() -> EntityUsageProfile {
        let mut profile = EntityUsageProfile::new(EntityModel::new("Customer"));
        profile.eager_loading_count = 100;
        profile.read_count = 100;
        profile.always_loaded_with.insert("Order".into());
        profile.related_entities.insert("Order".into(), Cardinality::OneToMany);
        profile.co_accessed_entities.insert("CustomerProfile".into(), 5000);
        profile.production_execution_count = 5000;
        profile
    }

    #[test]
    fn test_low_signal_profile_excluded() {
        let thresholds = MigrationThresholds::default();
        let mut profile = EntityUsageProfile::new(EntityModel::new("AuditEntry"));
        profile.eager_loading_count = 19;
        profile.co_accessed_entities.insert("Customer".into(), 499);
        profile.related_entities.insert("Customer".into(), Cardinality::ManyToOne);
        assert!(!qualifies(&profile, &thresholds));
        assert!(score_candidate(&profile, &thresholds).is_none());

        profile.eager_loading_count = 20;
        assert!(qualifies(&profile, &thresholds));
    }

    #[test]
    fn test_candidate_fields() {
        let candidate = score_candidate(&customer(), &MigrationThresholds::default()).unwrap();
        assert_eq!(candidate.primary_entity(), "Customer");
        assert_eq!(candidate.score(), 123);
        assert_eq!(candidate.interpretation(), ScoreTier::Strong);
        assert_eq!(candidate.rating(), ScoreTier::Strong);
        assert_eq!(candidate.related_entities(), ["CustomerProfile", "Order"]);
        assert_eq!(candidate.co_access().get("CustomerProfile"), Some(&5000));
        assert_eq!(candidate.complexity(), MigrationComplexity::Low);
        assert_eq!(candidate.target_datastore(), TargetDatastore::KeyValue);
    }

    #[test]
    fn test_reason_text() {
        let candidate = score_candidate(&customer(), &MigrationThresholds::default()).unwrap();
        assert_eq!(
            candidate.reason(),
            "Eager-loaded 100 times; always loaded with Order; co-accessed with CustomerProfile \
             in 5000 production executions; read/write ratio 100.0. Score 123 (Strong candidate), \
             LOW migration complexity, recommended target: key-value store."
        );
    }

    #[test]
    fn test_minimum_score_drops_candidate() {
        let thresholds = MigrationThresholds {
            minimum_score: 124,
            ..MigrationThresholds::default()
        };
        assert!(score_candidate(&customer(), &thresholds).is_none());
    }

    #[test]
    fn test_datastore_follows_absorbed_relationships_only() {
        let mut profile = EntityUsageProfile::new(EntityModel::new("Customer"));
        profile.eager_loading_count = 100;
        profile.always_loaded_with.insert("Order".into());
        profile.related_entities.insert("Order".into(), Cardinality::OneToMany);
        profile.related_entities.insert("Tag".into(), Cardinality::ManyToMany);
        let candidate = score_candidate(&profile, &MigrationThresholds::default()).unwrap();
        assert_eq!(candidate.related_entities(), ["Order"]);
        assert_eq!(candidate.target_datastore(), TargetDatastore::Document);

        profile.always_loaded_with.insert("Tag".into());
        let candidate = score_candidate(&profile, &MigrationThresholds::default()).unwrap();
        assert_eq!(candidate.target_datastore(), TargetDatastore::Graph);
    }

    #[test]
    fn test_related_falls_back_to_graph_neighbours() {
        let mut profile = EntityUsageProfile::new(EntityModel::new("Order"));
        profile.eager_loading_count = 40;
        profile.related_entities.insert("Customer".into(), Cardinality::ManyToOne);
        let candidate = score_candidate(&profile, &MigrationThresholds::default()).unwrap();
        assert_eq!(candidate.related_entities(), ["Customer"]);
        assert!(candidate.co_access().is_empty());
    }
}
