//! Tier, complexity, and target-datastore classification.

use crate::config::thresholds::MigrationThresholds;
use crate::models::{Cardinality, EntityUsageProfile, MigrationComplexity, ScoreTier, TargetDatastore};
use crate::scoring::weights::*;

fn tier_for(score: u32, boundaries: [u64; 4]) -> ScoreTier {
    let score = u64::from(score);
    let [excellent, strong, good, fair] = boundaries;
    if score >= excellent {
        ScoreTier::Excellent
    } else if score >= strong {
        ScoreTier::Strong
    } else if score >= good {
        ScoreTier::Good
    } else if score >= fair {
        ScoreTier::Fair
    } else {
        ScoreTier::Reconsider
    }
}

/// Fixed-boundary interpretation: 150 / 100 / 60 / 30.
pub fn interpret_score(score: u32) -> ScoreTier {
    tier_for(
        score,
        [
            u64::from(EXCELLENT_TIER),
            u64::from(STRONG_TIER),
            u64::from(GOOD_TIER),
            u64::from(FAIR_TIER),
        ],
    )
}

/// Band from the active profile's candidate-tier boundaries.
pub fn rate_score(score: u32, thresholds: &MigrationThresholds) -> ScoreTier {
    tier_for(
        score,
        [
            thresholds.excellent_candidate_threshold,
            thresholds.strong_candidate_threshold,
            thresholds.good_candidate_threshold,
            thresholds.fair_candidate_threshold,
        ],
    )
}

/// 0-100 migration difficulty from relationship topology.
pub fn complexity_value(profile: &EntityUsageProfile) -> u32 {
    let related = profile.related_entities();
    let many_to_many = related
        .values()
        .filter(|c| **c == Cardinality::ManyToMany)
        .count() as u32;
    let one_to_many = related
        .values()
        .filter(|c| **c == Cardinality::OneToMany)
        .count() as u32;
    let circular = if profile.has_circular_reference() {
        COMPLEXITY_CIRCULAR
    } else {
        0
    };
    let value = (related.len() as u32)
        .saturating_mul(COMPLEXITY_PER_RELATIONSHIP)
        .saturating_add(many_to_many.saturating_mul(COMPLEXITY_PER_MANY_TO_MANY))
        .saturating_add(one_to_many.saturating_mul(COMPLEXITY_PER_ONE_TO_MANY))
        .saturating_add(circular);
    value.min(COMPLEXITY_MAX)
}

pub fn classify_complexity(profile: &EntityUsageProfile) -> (MigrationComplexity, u32) {
    let value = complexity_value(profile);
    (MigrationComplexity::from_value(value), value)
}

/// Route by the relationships a candidate would absorb (`related`):
/// any many-to-many goes to a graph store; a fan-out of at most three,
/// all one-to-one or one-to-many, under heavy co-access goes to a key-value
/// store; everything else to a document store. Graph neighbours outside
/// `related` are ignored.
pub fn recommend_datastore(
    profile: &EntityUsageProfile,
    related: &[String],
    thresholds: &MigrationThresholds,
) -> TargetDatastore {
    let cardinalities: Vec<Cardinality> = related
        .iter()
        .filter_map(|entity| profile.related_entities().get(entity).copied())
        .collect();
    if cardinalities.contains(&Cardinality::ManyToMany) {
        return TargetDatastore::Graph;
    }
    let embeddable = cardinalities
        .iter()
        .all(|c| matches!(c, Cardinality::OneToOne | Cardinality::OneToMany));
    let peak_co_access = related
        .iter()
        .map(|entity| profile.co_access_with(entity))
        .max()
        .unwrap_or(0);
    if related.len() <= KEY_VALUE_MAX_FAN_OUT
        && embeddable
        && peak_co_access > 0
        && peak_co_access >= thresholds.high_production_execution_threshold
    {
        return TargetDatastore::KeyValue;
    }
    TargetDatastore::Document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityModel;

    fn profile(related: &[(&str, Cardinality)]) -> EntityUsageProfile {
        let mut profile = EntityUsageProfile::new(EntityModel::new("Customer"));
        for (name, cardinality) in related {
            profile.related_entities.insert((*name).into(), *cardinality);
        }
        profile
    }

    #[test]
    fn test_interpretation_boundaries() {
        assert_eq!(interpret_score(150), ScoreTier::Excellent);
        assert_eq!(interpret_score(149), ScoreTier::Strong);
        assert_eq!(interpret_score(100), ScoreTier::Strong);
        assert_eq!(interpret_score(99), ScoreTier::Good);
        assert_eq!(interpret_score(60), ScoreTier::Good);
        assert_eq!(interpret_score(59), ScoreTier::Fair);
        assert_eq!(interpret_score(30), ScoreTier::Fair);
        assert_eq!(interpret_score(29), ScoreTier::Reconsider);
        assert_eq!(interpret_score(0), ScoreTier::Reconsider);
    }

    #[test]
    fn test_rating_uses_profile_boundaries() {
        let thresholds = MigrationThresholds {
            excellent_candidate_threshold: 120,
            strong_candidate_threshold: 80,
            good_candidate_threshold: 50,
            fair_candidate_threshold: 25,
            ..MigrationThresholds::default()
        };
        assert_eq!(rate_score(123, &thresholds), ScoreTier::Excellent);
        assert_eq!(interpret_score(123), ScoreTier::Strong);
        assert_eq!(rate_score(25, &thresholds), ScoreTier::Fair);
    }

    #[test]
    fn test_complexity_value() {
        let simple = profile(&[("Order", Cardinality::OneToMany)]);
        assert_eq!(complexity_value(&simple), 12);
        assert_eq!(classify_complexity(&simple).0, MigrationComplexity::Low);

        let tangled = profile(&[
            ("A", Cardinality::ManyToMany),
            ("B", Cardinality::ManyToMany),
            ("C", Cardinality::OneToMany),
        ]);
        assert_eq!(complexity_value(&tangled), 24 + 30 + 4);
        assert_eq!(classify_complexity(&tangled).0, MigrationComplexity::Medium);
    }

    #[test]
    fn test_complexity_capped_at_hundred() {
        let mut wide = profile(&[
            ("A", Cardinality::ManyToMany),
            ("B", Cardinality::ManyToMany),
            ("C", Cardinality::ManyToMany),
            ("D", Cardinality::ManyToMany),
        ]);
        wide.self_referencing = true;
        assert_eq!(complexity_value(&wide), 100);
        assert_eq!(classify_complexity(&wide).0, MigrationComplexity::High);
    }

    #[test]
    fn test_datastore_routing() {
        let thresholds = MigrationThresholds::default();
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let graph = profile(&[("Tag", Cardinality::ManyToMany)]);
        assert_eq!(
            recommend_datastore(&graph, &names(&["Tag"]), &thresholds),
            TargetDatastore::Graph
        );

        let mut hot = profile(&[("Order", Cardinality::OneToMany)]);
        hot.co_accessed_entities.insert("CustomerProfile".into(), 5000);
        assert_eq!(
            recommend_datastore(&hot, &names(&["CustomerProfile", "Order"]), &thresholds),
            TargetDatastore::KeyValue
        );

        let cold = profile(&[("Order", Cardinality::OneToMany)]);
        assert_eq!(
            recommend_datastore(&cold, &names(&["Order"]), &thresholds),
            TargetDatastore::Document
        );

        let mut wide = profile(&[
            ("A", Cardinality::OneToMany),
            ("B", Cardinality::OneToMany),
            ("C", Cardinality::OneToOne),
            ("D", Cardinality::OneToMany),
        ]);
        wide.co_accessed_entities.insert("A".into(), 5000);
        assert_eq!(
            recommend_datastore(&wide, &names(&["A", "B", "C", "D"]), &thresholds),
            TargetDatastore::Document
        );
    }

    #[test]
    fn test_unabsorbed_many_to_many_does_not_route_to_graph() {
        let thresholds = MigrationThresholds::default();
        let mut customer = profile(&[
            ("Order", Cardinality::OneToMany),
            ("Tag", Cardinality::ManyToMany),
        ]);
        customer.co_accessed_entities.insert("Order".into(), 5000);
        let related = vec!["Order".to_string()];
        assert_eq!(
            recommend_datastore(&customer, &related, &thresholds),
            TargetDatastore::KeyValue
        );
        customer.co_accessed_entities.clear();
        assert_eq!(
            recommend_datastore(&customer, &related, &thresholds),
            TargetDatastore::Document
        );
    }

    #[test]
    fn test_many_to_one_blocks_key_value() {
        let thresholds = MigrationThresholds::default();
        let mut order = profile(&[("Customer", Cardinality::ManyToOne)]);
        order.co_accessed_entities.insert("Customer".into(), 5000);
        assert_eq!(
            recommend_datastore(&order, &["Customer".to_string()], &thresholds),
            TargetDatastore::Document
        );
    }
}
