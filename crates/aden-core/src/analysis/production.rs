//! Attribution of production telemetry onto per-entity profiles.
//!
//! Table combinations arrive as N-way groupings with one execution count.
//! Each resolved member is credited the full count once and each ordered
//! pair of distinct members is credited the same count as co-access, so
//! totals are additive across combinations and independent of their order.

use std::collections::BTreeSet;

use tracing::debug;

use crate::analysis::context::AnalysisContext;
use crate::analysis::names::clean_table_name;
use crate::models::{AccessKind, QueryStoreAnalysis, QueryStoreQuery, TableCombination, WarningKind};

/// Counts of telemetry records that touched at least one known entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttributionSummary {
    pub combinations_attributed: usize,
    pub queries_attributed: usize,
}

pub fn attribute_production(
    ctx: &mut AnalysisContext,
    analysis: &QueryStoreAnalysis,
) -> AttributionSummary {
    let mut summary = AttributionSummary::default();

    for combination in &analysis.table_combinations {
        if attribute_combination(ctx, combination) {
            summary.combinations_attributed += 1;
        }
    }

    for query in &analysis.queries {
        if attribute_query(ctx, query) {
            summary.queries_attributed += 1;
        }
    }

    debug!(
        combinations = summary.combinations_attributed,
        queries = summary.queries_attributed,
        "production telemetry attributed"
    );
    summary
}

/// Resolve and de-duplicate table names. A table listed twice, or two tables
/// mapping to the same entity, count once.
fn resolve_members(ctx: &mut AnalysisContext, tables: &[String]) -> BTreeSet<String> {
    let mut members = BTreeSet::new();
    for raw in tables {
        match ctx.resolve(raw) {
            Some(entity) => {
                members.insert(entity);
            }
            None => {
                let table = clean_table_name(raw);
                if ctx.note_unresolved_table(table) {
                    ctx.warn(
                        WarningKind::UnresolvedTable,
                        table,
                        format!("production table '{table}' matches no entity; ignored"),
                    );
                }
            }
        }
    }
    members
}

fn attribute_combination(ctx: &mut AnalysisContext, combination: &TableCombination) -> bool {
    let members = resolve_members(ctx, &combination.tables);
    if members.is_empty() {
        return false;
    }

    let executions = combination.execution_count;
    for entity in &members {
        let Some(profile) = ctx.profile_mut(entity) else {
            continue;
        };
        profile.production_execution_count = profile.production_execution_count.saturating_add(executions);
        for other in members.iter().filter(|other| *other != entity) {
            let shared = profile.co_accessed_entities.entry(other.clone()).or_insert(0);
            *shared = shared.saturating_add(executions);
        }
    }
    true
}

/// Per-query operation types feed the production read/write ratio only;
/// execution totals come from table combinations.
fn attribute_query(ctx: &mut AnalysisContext, query: &QueryStoreQuery) -> bool {
    let Some(access) = query.operation.access() else {
        return false;
    };
    let members = resolve_members(ctx, &query.tables);
    if members.is_empty() {
        return false;
    }

    for entity in &members {
        let Some(profile) = ctx.profile_mut(entity) else {
            continue;
        };
        match access {
            AccessKind::Read => {
                profile.production_reads = profile.production_reads.saturating_add(query.execution_count);
            }
            AccessKind::Write => {
                profile.production_writes = profile.production_writes.saturating_add(query.execution_count);
            }
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
