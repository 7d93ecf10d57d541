//! Additive score assembly for one usage profile.

use crate::config::thresholds::MigrationThresholds;
use crate::models::{EntityUsageProfile, ScoreCategory, ScoreComponent};
use crate::scoring::weights::*;

/// Entities co-accessed with `profile` at or above the co-access threshold,
/// sorted by name.
pub fn strong_co_access<'a>(
    profile: &'a EntityUsageProfile,
    thresholds: &MigrationThresholds,
) -> impl Iterator<Item = (&'a String, u64)> {
    let threshold = thresholds.production_co_access_threshold;
    profile
        .co_accessed_entities()
        .iter()
        .filter(move |(_, count)| **count >= threshold)
        .map(|(entity, count)| (entity, *count))
}

/// The read/write ratio scoring uses: production when telemetry saw the
/// entity, otherwise the source-code ratio.
pub fn effective_read_write_ratio(profile: &EntityUsageProfile) -> f64 {
    profile
        .production_read_write_ratio()
        .unwrap_or_else(|| profile.read_write_ratio())
}

/// Every non-zero score contribution for `profile`, in category order.
pub fn score_components(
    profile: &EntityUsageProfile,
    thresholds: &MigrationThresholds,
) -> Vec<ScoreComponent> {
    let mut components = Vec::new();
    let mut push = |category, points: f64, detail: String| {
        if points != 0.0 {
            components.push(ScoreComponent {
                category,
                points,
                detail,
            });
        }
    };

    let eager = profile.eager_loading_count();
    if eager > 0 {
        let high = thresholds.high_frequency_threshold.max(1) as f64;
        let points = (EAGER_LOADING_MAX * eager as f64 / high).min(EAGER_LOADING_MAX);
        push(
            ScoreCategory::EagerLoading,
            points,
            format!("eager-loaded {eager} times (high threshold {high})"),
        );
    }

    let always = profile.always_loaded_with().len();
    let co_accessed = strong_co_access(profile, thresholds)
        .filter(|(entity, _)| !profile.always_loaded_with().contains(*entity))
        .count();
    let strength = (ALWAYS_LOADED_POINTS * always as f64 + CO_ACCESSED_POINTS * co_accessed as f64)
        .min(RELATIONSHIP_STRENGTH_MAX);
    push(
        ScoreCategory::RelationshipStrength,
        strength,
        format!("{always} always-loaded, {co_accessed} co-accessed entities"),
    );

    let executions = profile.production_execution_count();
    if executions >= thresholds.high_production_execution_threshold && executions > 0 {
        push(
            ScoreCategory::ProductionTraffic,
            PRODUCTION_TRAFFIC_POINTS,
            format!("{executions} production executions"),
        );
    }

    let ratio = effective_read_write_ratio(profile);
    if ratio > 0.0 && ratio >= thresholds.high_read_write_ratio {
        push(
            ScoreCategory::ReadHeavy,
            READ_HEAVY_POINTS,
            format!("read/write ratio {ratio:.1}"),
        );
    }

    let complex = profile.complex_eager_loading_count();
    if complex > 0 {
        let points = if complex >= thresholds.complex_query_requirement {
            COMPLEX_QUERY_POINTS
        } else {
            PARTIAL_COMPLEX_QUERY_POINTS
        };
        push(
            ScoreCategory::QueryComplexity,
            points,
            format!(
                "{complex} complex eager-loading queries (requirement {})",
                thresholds.complex_query_requirement
            ),
        );
    }

    if profile.is_simple_key_access() {
        push(
            ScoreCategory::SimpleKeyAccess,
            SIMPLE_KEY_ACCESS_POINTS,
            "all reads are key lookups".to_string(),
        );
    }

    let penalty =
        thresholds.relationship_complexity_penalty as f64 * thresholds.complexity_penalty_multiplier;

    if profile.has_circular_reference() {
        push(
            ScoreCategory::CircularReference,
            -penalty,
            "circular reference".to_string(),
        );
    }

    let mut weighted: Vec<(f64, &String)> = profile
        .related_entities()
        .iter()
        .map(|(entity, cardinality)| (cardinality_penalty_weight(*cardinality), entity))
        .filter(|(weight, _)| *weight > 0.0)
        .collect();
    // heaviest first, names break ties
    weighted.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    weighted.truncate(MAX_PENALIZED_RELATIONSHIPS);
    if !weighted.is_empty() {
        let points: f64 = weighted.iter().map(|(weight, _)| weight * penalty).sum();
        let names: Vec<&str> = weighted.iter().map(|(_, entity)| entity.as_str()).collect();
        push(
            ScoreCategory::Cardinality,
            -points,
            format!("fan-out to {}", names.join(", ")),
        );
    }

    components
}

/// Sum of all components, floored at zero and rounded.
pub fn total_score(components: &[ScoreComponent]) -> u32 {
    let sum: f64 = components.iter().map(|c| c.points).sum();
    sum.max(0.0).round() as u32
}
