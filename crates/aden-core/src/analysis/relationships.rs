//! Relationship fusion across foreign keys, navigation properties, and
//! query-derived joins.
//!
//! Every source is folded into one directed graph keyed by canonical entity
//! name. When two sources describe the same ordered pair the stronger source
//! decides the cardinality: navigation > inverse navigation > schema >
//! query join. At equal strength the first record seen is kept. A final pass
//! reconciles each pair so the two directions always carry inverse
//! cardinalities.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::analysis::context::AnalysisContext;
use crate::analysis::names::clean_table_name;
use crate::models::{Cardinality, DatabaseSchema, EntityModel, QueryPattern, Relationship, WarningKind};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where a fused edge came from, ordered weakest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationshipSource {
    QueryJoin,
    Schema,
    InverseNavigation,
    Navigation,
}

/// One directed edge of the fused graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FusedRelationship {
    pub target: String,
    pub cardinality: Cardinality,
    pub source: RelationshipSource,
}

/// Directed relationship graph over canonical entity names.
#[derive(Clone, Debug, Default)]
pub struct RelationshipGraph {
    edges: BTreeMap<String, BTreeMap<String, FusedRelationship>>,
    self_referencing: BTreeSet<String>,
    schema_only: Vec<Relationship>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or upgrade the `from -> to` edge. Self pairs only mark `from` as
    /// self-referencing.
    pub fn insert(
        &mut self,
        from: &str,
        to: &str,
        cardinality: Cardinality,
        source: RelationshipSource,
    ) {
        if from == to {
            self.self_referencing.insert(from.to_string());
            return;
        }

        let edges = self.edges.entry(from.to_string()).or_default();
        match edges.get_mut(to) {
            Some(existing) if source > existing.source => {
                if existing.cardinality != cardinality {
                    debug!(
                        from = %from,
                        to = %to,
                        kept = %cardinality,
                        replaced = %existing.cardinality,
                        source = ?source,
                        "cardinality conflict resolved by stronger source"
                    );
                }
                existing.cardinality = cardinality;
                existing.source = source;
            }
            Some(existing) => {
                if existing.cardinality != cardinality {
                    debug!(
                        from = %from,
                        to = %to,
                        kept = %existing.cardinality,
                        ignored = %cardinality,
                        source = ?source,
                        "cardinality conflict ignored"
                    );
                }
            }
            None => {
                edges.insert(
                    to.to_string(),
                    FusedRelationship {
                        target: to.to_string(),
                        cardinality,
                        source,
                    },
                );
            }
        }
    }

    pub fn cardinality(&self, from: &str, to: &str) -> Option<Cardinality> {
        self.edge(from, to).map(|e| e.cardinality)
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&FusedRelationship> {
        self.edges.get(from).and_then(|targets| targets.get(to))
    }

    /// Outgoing edges of `entity`, sorted by target name.
    pub fn related(&self, entity: &str) -> impl Iterator<Item = &FusedRelationship> {
        self.edges.get(entity).into_iter().flat_map(|targets| targets.values())
    }

    pub fn neighbors(&self, entity: &str) -> Vec<String> {
        self.related(entity).map(|e| e.target.clone()).collect()
    }

    pub fn is_self_referencing(&self, entity: &str) -> bool {
        self.self_referencing.contains(entity)
    }

    /// Schema relationships with at least one endpoint that matched no entity.
    pub fn schema_only(&self) -> &[Relationship] {
        &self.schema_only
    }

    /// Make every pair's two directions agree. The direction backed by the
    /// stronger source wins; at equal strength the direction leaving the
    /// lexically smaller entity wins.
    fn reconcile(&mut self) {
        let mut fixes: Vec<(String, String, Cardinality, RelationshipSource)> = Vec::new();
        for (from, targets) in &self.edges {
            for edge in targets.values() {
                if from.as_str() > edge.target.as_str() {
                    continue;
                }
                let Some(back) = self.edge(&edge.target, from) else {
                    continue;
                };
                if back.cardinality == edge.cardinality.inverse() {
                    continue;
                }
                if back.source > edge.source {
                    fixes.push((from.clone(), edge.target.clone(), back.cardinality.inverse(), back.source));
                } else {
                    fixes.push((edge.target.clone(), from.clone(), edge.cardinality.inverse(), edge.source));
                }
            }
        }

        for (from, to, cardinality, source) in fixes {
            if let Some(edge) = self.edges.get_mut(&from).and_then(|targets| targets.get_mut(&to)) {
                debug!(
                    from = %from,
                    to = %to,
                    kept = %cardinality,
                    replaced = %edge.cardinality,
                    "pair cardinality reconciled"
                );
                edge.cardinality = cardinality;
                edge.source = source;
            }
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    /// Copy the fused edges onto the context's profiles.
    pub(crate) fn apply(&self, ctx: &mut AnalysisContext) {
        for (from, targets) in &self.edges {
            let Some(profile) = ctx.profile_mut(from) else {
                continue;
            };
            for edge in targets.values() {
                profile
                    .related_entities
                    .insert(edge.target.clone(), edge.cardinality);
            }
        }
        for entity in &self.self_referencing {
            if let Some(profile) = ctx.profile_mut(entity) {
                profile.self_referencing = true;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fusion
// ---------------------------------------------------------------------------

/// Fuse the three relationship sources into one graph. Unresolvable records
/// are recorded as warnings on `ctx`; nothing here is fatal.
pub fn fuse_relationships(
    ctx: &mut AnalysisContext,
    schema: &DatabaseSchema,
    patterns: &[QueryPattern],
) -> RelationshipGraph {
    let mut graph = RelationshipGraph::new();

    add_schema_relationships(ctx, &mut graph, &schema.relationships);

    let entities: Vec<EntityModel> = ctx.profiles().values().map(|p| p.entity().clone()).collect();
    for entity in &entities {
        add_navigation_properties(ctx, &mut graph, entity);
    }

    add_query_joins(ctx, &mut graph, patterns);
    graph.reconcile();

    debug!(
        edges = graph.edge_count(),
        schema_only = graph.schema_only.len(),
        "relationship fusion complete"
    );
    graph
}

fn add_schema_relationships(
    ctx: &mut AnalysisContext,
    graph: &mut RelationshipGraph,
    relationships: &[Relationship],
) {
    for rel in relationships {
        let from = ctx.resolve(&rel.from_table);
        let to = ctx.resolve(&rel.to_table);
        match (from, to) {
            (Some(from), Some(to)) => {
                graph.insert(&from, &to, rel.cardinality, RelationshipSource::Schema);
                graph.insert(&to, &from, rel.cardinality.inverse(), RelationshipSource::Schema);
            }
            (from, to) => {
                let missing: Vec<&str> = [
                    (from.is_none(), clean_table_name(&rel.from_table)),
                    (to.is_none(), clean_table_name(&rel.to_table)),
                ]
                .into_iter()
                .filter_map(|(unresolved, table)| unresolved.then_some(table))
                .collect();
                let subject = format!("{} -> {}", rel.from_table, rel.to_table);
                ctx.warn(
                    WarningKind::UnresolvedRelationship,
                    &subject,
                    format!(
                        "foreign key {subject} kept as schema-only; no entity for {}",
                        missing.join(", ")
                    ),
                );
                graph.schema_only.push(rel.clone());
            }
        }
    }
}

fn add_navigation_properties(
    ctx: &mut AnalysisContext,
    graph: &mut RelationshipGraph,
    entity: &EntityModel,
) {
    for nav in &entity.navigation_properties {
        let Some(target) = ctx.resolve(&nav.target_entity) else {
            let subject = format!("{}.{}", entity.name, nav.name);
            ctx.warn(
                WarningKind::UnresolvedNavigation,
                &subject,
                format!(
                    "navigation {subject} targets unknown entity '{}'",
                    nav.target_entity
                ),
            );
            continue;
        };
        graph.insert(&entity.name, &target, nav.cardinality, RelationshipSource::Navigation);
        graph.insert(
            &target,
            &entity.name,
            nav.cardinality.inverse(),
            RelationshipSource::InverseNavigation,
        );
    }
}

fn add_query_joins(ctx: &mut AnalysisContext, graph: &mut RelationshipGraph, patterns: &[QueryPattern]) {
    for pattern in patterns.iter().filter(|p| !p.joins.is_empty()) {
        // Unknown query entities are reported by the usage builder.
        let Some(owner) = ctx.resolve(&pattern.entity) else {
            continue;
        };
        for joined in &pattern.joins {
            match ctx.resolve(joined) {
                Some(target) => {
                    graph.insert(&owner, &target, Cardinality::ManyToOne, RelationshipSource::QueryJoin);
                    graph.insert(&target, &owner, Cardinality::OneToMany, RelationshipSource::QueryJoin);
                }
                None => {
                    ctx.warn(
                        WarningKind::UnresolvedJoin,
                        joined,
                        format!("query on '{owner}' joins unknown entity '{joined}'"),
                    );
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
