//! One analysis run: fusion, attribution, profile building, then scoring.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::info;

use crate::analysis::context::AnalysisContext;
use crate::analysis::production::attribute_production;
use crate::analysis::relationships::fuse_relationships;
use crate::analysis::usage::build_usage_profiles;
use crate::config::resolver::ThresholdResolver;
use crate::config::thresholds::MigrationThresholds;
use crate::errors::AdenResult;
use crate::models::{
    AnalysisResult, AnalysisSummary, DatabaseSchema, DenormalizationCandidate, EntityModel,
    EntityUsageProfile, QueryPattern, QueryStoreAnalysis,
};
use crate::scoring::score_candidate;

/// Profile count at which scoring moves onto the rayon pool.
pub const PARALLEL_SCORING_CUTOFF: usize = 64;

/// Everything the collaborating extractors hand over for one run.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInput {
    #[serde(default)]
    pub entities: Vec<EntityModel>,
    #[serde(default)]
    pub query_patterns: Vec<QueryPattern>,
    #[serde(default)]
    pub schema: DatabaseSchema,
    /// Collection alias (e.g. a DB-set property name) -> canonical entity name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub query_store: Option<QueryStoreAnalysis>,
}

/// Run the full pipeline against already-resolved thresholds. Never fails:
/// unresolvable input becomes warnings on the result.
pub fn analyze(input: &AnalysisInput, thresholds: &MigrationThresholds) -> AnalysisResult {
    let mut ctx = AnalysisContext::new(thresholds.clone(), &input.entities, &input.aliases);

    let graph = fuse_relationships(&mut ctx, &input.schema, &input.query_patterns);
    if let Some(query_store) = &input.query_store {
        attribute_production(&mut ctx, query_store);
    }
    build_usage_profiles(&mut ctx, &input.query_patterns, &graph);

    let finished = ctx.finish();
    let candidates = rank_candidates(&finished.profiles, &finished.thresholds);

    let summary = AnalysisSummary {
        entities_analyzed: finished.profiles.len(),
        candidates_emitted: candidates.len(),
        schema_only_relationships: graph.schema_only().len(),
        unresolved_tables: finished.unresolved_tables.len(),
    };
    info!(
        profile = %finished.thresholds.profile_name,
        entities = summary.entities_analyzed,
        candidates = summary.candidates_emitted,
        warnings = finished.warnings.len(),
        "analysis complete"
    );

    AnalysisResult {
        candidates,
        usage_profiles: finished.profiles,
        query_patterns: input.query_patterns.clone(),
        schema_only_relationships: graph.schema_only().to_vec(),
        thresholds: finished.thresholds,
        warnings: finished.warnings,
        summary,
    }
}

/// Resolve thresholds first; an unknown profile fails before any scoring.
pub fn analyze_with_resolver(
    input: &AnalysisInput,
    resolver: &ThresholdResolver,
) -> AdenResult<AnalysisResult> {
    let resolved = resolver.resolve()?;
    Ok(analyze(input, &resolved.thresholds))
}

/// Same as [`analyze_with_resolver`] for input handed over as JSON text.
pub fn analyze_json(input: &str, resolver: &ThresholdResolver) -> AdenResult<AnalysisResult> {
    let input: AnalysisInput = serde_json::from_str(input)?;
    analyze_with_resolver(&input, resolver)
}

/// Score every frozen profile and order the survivors by descending score,
/// then entity name.
pub fn rank_candidates(
    profiles: &IndexMap<String, EntityUsageProfile>,
    thresholds: &MigrationThresholds,
) -> Vec<DenormalizationCandidate> {
    let mut candidates: Vec<DenormalizationCandidate> = if profiles.len() >= PARALLEL_SCORING_CUTOFF {
        let frozen: Vec<&EntityUsageProfile> = profiles.values().collect();
        frozen
            .par_iter()
            .filter_map(|profile| score_candidate(profile, thresholds))
            .collect()
    } else {
        profiles
            .values()
            .filter_map(|profile| score_candidate(profile, thresholds))
            .collect()
    };

    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.primary_entity.cmp(&b.primary_entity))
    });
    candidates
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
