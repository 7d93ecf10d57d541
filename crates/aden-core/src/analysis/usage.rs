//! Usage profile aggregation from source-code query patterns.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::analysis::context::AnalysisContext;
use crate::analysis::relationships::RelationshipGraph;
use crate::models::{AccessKind, QueryKind, QueryPattern, WarningKind};

// ---------------------------------------------------------------------------
// Include paths
// ---------------------------------------------------------------------------

/// Split an include path into navigation segments. Accepts dotted and
/// slash-separated paths and lambda bodies such as `c => c.Orders`.
pub fn include_segments(path: &str) -> Vec<&str> {
    let (parameter, body) = match path.split_once("=>") {
        Some((param, body)) => (
            Some(param.trim().trim_matches(|c| c == '(' || c == ')').trim()),
            body.trim(),
        ),
        None => (None, path.trim()),
    };
    let mut segments: Vec<&str> = body
        .split(['.', '/'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parameter.is_some() && segments.first().copied() == parameter {
        segments.remove(0);
    }
    segments
}

/// `Orders` -> `Order`, `Categories` -> `Category`.
fn singular(segment: &str) -> Option<String> {
    if let Some(stem) = segment.strip_suffix("ies") {
        return Some(format!("{stem}y"));
    }
    segment
        .strip_suffix('s')
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

/// Resolve each segment of `path`, starting from `root`. A segment naming a
/// navigation property of the current entity follows that navigation only;
/// otherwise it is tried as a table, alias, or entity name, then in singular
/// form. Returns the entities reached, stopping at the first segment that
/// reaches no declared entity.
pub(crate) fn resolve_include_path(
    ctx: &AnalysisContext,
    root: &str,
    path: &str,
) -> (Vec<String>, Option<String>) {
    let mut reached = Vec::new();
    let mut current = root.to_string();

    for segment in include_segments(path) {
        // A declared navigation whose target matches no entity stops the
        // path; fusion already reported it.
        let next = match ctx.entity(&current).and_then(|entity| entity.navigation(segment)) {
            Some(nav) => ctx.resolve(&nav.target_entity),
            None => ctx
                .resolve(segment)
                .or_else(|| singular(segment).and_then(|s| ctx.resolve(&s))),
        };
        match next {
            Some(entity) => {
                current = entity.clone();
                reached.push(entity);
            }
            None => return (reached, Some(segment.to_string())),
        }
    }
    (reached, None)
}

// ---------------------------------------------------------------------------
// Profile builder
// ---------------------------------------------------------------------------

/// Fold query patterns and fused relationships into the context's profiles.
///
/// Entity pairs loaded together by eager-loading patterns whose combined
/// frequency reaches the medium-frequency threshold are recorded as always
/// loaded together, in both directions.
pub fn build_usage_profiles(
    ctx: &mut AnalysisContext,
    patterns: &[QueryPattern],
    graph: &RelationshipGraph,
) {
    graph.apply(ctx);

    let mut co_loaded: BTreeMap<(String, String), u64> = BTreeMap::new();

    for pattern in patterns {
        let Some(entity) = ctx.resolve(&pattern.entity) else {
            ctx.warn(
                WarningKind::UnresolvedQueryEntity,
                &pattern.entity,
                format!(
                    "query pattern{} targets unknown entity '{}'",
                    pattern
                        .location
                        .as_deref()
                        .map(|loc| format!(" at {loc}"))
                        .unwrap_or_default(),
                    pattern.entity
                ),
            );
            continue;
        };

        record_pattern(ctx, &entity, pattern);

        if pattern.kind.is_eager_loading() {
            let mut loaded: BTreeSet<String> = BTreeSet::new();
            loaded.insert(entity.clone());
            for include in &pattern.includes {
                let (reached, unresolved) = resolve_include_path(ctx, &entity, include);
                if let Some(segment) = unresolved {
                    ctx.warn(
                        WarningKind::UnresolvedInclude,
                        include,
                        format!("include '{include}' on '{entity}' stops at unknown segment '{segment}'"),
                    );
                }
                loaded.extend(reached);
            }
            let loaded: Vec<&String> = loaded.iter().collect();
            for (i, a) in loaded.iter().enumerate() {
                for b in &loaded[i + 1..] {
                    let count = co_loaded.entry(((*a).clone(), (*b).clone())).or_insert(0);
                    *count = count.saturating_add(pattern.frequency);
                }
            }
        }
    }

    let threshold = ctx.thresholds().medium_frequency_threshold;
    for ((a, b), count) in co_loaded {
        if count < threshold {
            debug!(a = %a, b = %b, count, threshold, "co-loading below medium frequency");
            continue;
        }
        if let Some(profile) = ctx.profile_mut(&a) {
            profile.always_loaded_with.insert(b.clone());
        }
        if let Some(profile) = ctx.profile_mut(&b) {
            profile.always_loaded_with.insert(a);
        }
    }
}

fn record_pattern(ctx: &mut AnalysisContext, entity: &str, pattern: &QueryPattern) {
    let frequency = pattern.frequency;
    let Some(profile) = ctx.profile_mut(entity) else {
        return;
    };

    match pattern.kind {
        QueryKind::EagerLoading => {
            profile.eager_loading_count = profile.eager_loading_count.saturating_add(frequency);
        }
        QueryKind::ComplexEagerLoading => {
            profile.eager_loading_count = profile.eager_loading_count.saturating_add(frequency);
            profile.complex_eager_loading_count =
                profile.complex_eager_loading_count.saturating_add(frequency);
        }
        _ => {}
    }

    match pattern.kind.access() {
        Some(AccessKind::Read) => {
            profile.read_count = profile.read_count.saturating_add(frequency);
            if pattern.kind == QueryKind::SingleEntity {
                profile.key_lookup_count = profile.key_lookup_count.saturating_add(frequency);
            }
        }
        Some(AccessKind::Write) => {
            profile.write_count = profile.write_count.saturating_add(frequency);
        }
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
