//! Per-run analysis state: resolved thresholds, the name resolver, the
//! usage profile map, and collected warnings.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use tracing::warn;

use crate::analysis::names::EntityNameResolver;
use crate::config::thresholds::MigrationThresholds;
use crate::models::{AnalysisWarning, EntityModel, EntityUsageProfile, WarningKind};

/// State shared by the fusion, attribution, and profile-building stages of
/// one run. Holds exactly one profile per canonical entity name.
#[derive(Debug)]
pub struct AnalysisContext {
    thresholds: MigrationThresholds,
    resolver: EntityNameResolver,
    profiles: IndexMap<String, EntityUsageProfile>,
    warnings: Vec<AnalysisWarning>,
    unresolved_tables: BTreeSet<String>,
}

impl AnalysisContext {
    pub fn new(
        thresholds: MigrationThresholds,
        entities: &[EntityModel],
        aliases: &BTreeMap<String, String>,
    ) -> Self {
        let resolver = EntityNameResolver::new(entities, aliases);
        let mut ctx = Self {
            thresholds,
            resolver,
            profiles: IndexMap::with_capacity(entities.len()),
            warnings: Vec::new(),
            unresolved_tables: BTreeSet::new(),
        };
        let unresolved_aliases = ctx.resolver.unresolved_aliases().to_vec();
        for (alias, target) in unresolved_aliases {
            ctx.warn(
                WarningKind::UnresolvedAlias,
                &alias,
                format!("alias '{alias}' targets unknown entity '{target}'; ignored"),
            );
        }
        for entity in entities {
            if ctx.profiles.contains_key(&entity.name) {
                ctx.warn(
                    WarningKind::DuplicateEntity,
                    &entity.name,
                    format!("entity '{}' declared more than once; keeping the first", entity.name),
                );
                continue;
            }
            ctx.profiles
                .insert(entity.name.clone(), EntityUsageProfile::new(entity.clone()));
        }
        ctx
    }

    pub fn thresholds(&self) -> &MigrationThresholds {
        &self.thresholds
    }

    pub fn resolver(&self) -> &EntityNameResolver {
        &self.resolver
    }

    /// Canonical name for a table, alias, or entity name.
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.resolver.resolve(name).map(str::to_string)
    }

    pub fn entity(&self, name: &str) -> Option<&EntityModel> {
        self.profiles.get(name).map(EntityUsageProfile::entity)
    }

    pub fn profile(&self, name: &str) -> Option<&EntityUsageProfile> {
        self.profiles.get(name)
    }

    pub fn profiles(&self) -> &IndexMap<String, EntityUsageProfile> {
        &self.profiles
    }

    pub fn warnings(&self) -> &[AnalysisWarning] {
        &self.warnings
    }

    /// The single profile for a declared entity. Profiles are only created
    /// in [`AnalysisContext::new`], so unknown names yield `None`.
    pub(crate) fn profile_mut(&mut self, name: &str) -> Option<&mut EntityUsageProfile> {
        self.profiles.get_mut(name)
    }

    pub(crate) fn warn(&mut self, kind: WarningKind, subject: &str, message: String) {
        warn!(kind = ?kind, subject = %subject, "{message}");
        self.warnings.push(AnalysisWarning {
            kind,
            subject: subject.to_string(),
            message,
        });
    }

    /// Record an unresolved production table. Returns true the first time a
    /// table is seen so callers warn once per table.
    pub(crate) fn note_unresolved_table(&mut self, table: &str) -> bool {
        self.unresolved_tables.insert(table.to_string())
    }

    pub fn unresolved_tables(&self) -> &BTreeSet<String> {
        &self.unresolved_tables
    }

    /// Freeze the profile map in canonical-name order and hand back the
    /// pieces the scoring stage and result need.
    pub(crate) fn finish(mut self) -> FinishedContext {
        self.profiles.sort_keys();
        FinishedContext {
            thresholds: self.thresholds,
            profiles: self.profiles,
            warnings: self.warnings,
            unresolved_tables: self.unresolved_tables,
        }
    }
}

pub(crate) struct FinishedContext {
    pub thresholds: MigrationThresholds,
    pub profiles: IndexMap<String, EntityUsageProfile>,
    pub warnings: Vec<AnalysisWarning>,
    pub unresolved_tables: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_profile_per_entity() {
        let entities = vec![
            EntityModel::new("Customer"),
            EntityModel::new("Order"),
            EntityModel::new("Customer").with_table("dup"),
        ];
        let ctx = AnalysisContext::new(MigrationThresholds::default(), &entities, &BTreeMap::new());
        assert_eq!(ctx.profiles().len(), 2);
        assert_eq!(ctx.warnings().len(), 1);
        assert_eq!(ctx.warnings()[0].kind, WarningKind::DuplicateEntity);
        assert_eq!(ctx.entity("Customer").and_then(|e| e.table_name.clone()), None);
    }

    #[test]
    fn test_profile_mut_returns_same_instance() {
        let mut ctx = AnalysisContext::new(
            MigrationThresholds::default(),
            &[EntityModel::new("Customer")],
            &BTreeMap::new(),
        );
        ctx.profile_mut("Customer").unwrap().production_execution_count += 300;
        ctx.profile_mut("Customer").unwrap().production_execution_count += 700;
        assert_eq!(ctx.profile("Customer").unwrap().production_execution_count(), 1000);
        assert!(ctx.profile_mut("Ledger").is_none());
        assert_eq!(ctx.profiles().len(), 1);
    }

    #[test]
    fn test_alias_to_unknown_entity_warns_without_profile() {
        let aliases = BTreeMap::from([
            ("Ledgers".to_string(), "Ledger".to_string()),
            ("Customers".to_string(), "Customer".to_string()),
        ]);
        let ctx = AnalysisContext::new(
            MigrationThresholds::default(),
            &[EntityModel::new("Customer")],
            &aliases,
        );
        assert_eq!(ctx.resolve("Ledgers"), None);
        assert_eq!(ctx.resolve("Customers").as_deref(), Some("Customer"));
        assert_eq!(ctx.warnings().len(), 1);
        assert_eq!(ctx.warnings()[0].kind, WarningKind::UnresolvedAlias);
        assert_eq!(ctx.profiles().len(), 1);
    }

    #[test]
    fn test_finish_sorts_profiles() {
        let entities = vec![EntityModel::new("Order"), EntityModel::new("Customer")];
        let ctx = AnalysisContext::new(MigrationThresholds::default(), &entities, &BTreeMap::new());
        let finished = ctx.finish();
        let names: Vec<&String> = finished.profiles.keys().collect();
        assert_eq!(names, vec!["Customer", "Order"]);
    }

    #[test]
    fn test_unresolved_table_noted_once() {
        let mut ctx = AnalysisContext::new(MigrationThresholds::default(), &[], &BTreeMap::new());
        assert!(ctx.note_unresolved_table("AuditLog"));
        assert!(!ctx.note_unresolved_table("AuditLog"));
        assert_eq!(ctx.unresolved_tables().len(), 1);
    }
}
