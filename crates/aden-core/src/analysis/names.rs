//! Canonical entity-name resolution for table names, collection aliases, and
//! entity names.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::models::EntityModel;

/// Which lookup produced a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameMatch {
    Table,
    Alias,
    Entity,
}

/// Strip quoting and an optional schema qualifier: `[dbo].[Orders]` and
/// `"sales"."Orders"` both become `Orders`.
pub fn clean_table_name(raw: &str) -> &str {
    let unqualified = raw.trim().rsplit('.').next().unwrap_or(raw);
    unqualified.trim_matches(|c| matches!(c, '[' | ']' | '"' | '`' | ' '))
}

fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Resolves names from any of the three input views to canonical entity
/// names.
///
/// Lookup order: mapped table name, then collection alias (exact, then
/// case-insensitive), then case-insensitive entity name.
#[derive(Clone, Debug, Default)]
pub struct EntityNameResolver {
    tables: HashMap<String, String>,
    aliases: HashMap<String, String>,
    folded_aliases: HashMap<String, String>,
    entities: HashMap<String, String>,
    unresolved_aliases: Vec<(String, String)>,
}

impl EntityNameResolver {
    pub fn new(entities: &[EntityModel], aliases: &BTreeMap<String, String>) -> Self {
        let mut resolver = Self::default();

        for entity in entities {
            let folded_name = fold(&entity.name);
            resolver
                .entities
                .entry(folded_name)
                .or_insert_with(|| entity.name.clone());

            let table = fold(clean_table_name(entity.mapped_table()));
            match resolver.tables.get(&table) {
                Some(existing) if existing != &entity.name => {
                    debug!(
                        table = %table,
                        kept = %existing,
                        ignored = %entity.name,
                        "table mapped by more than one entity"
                    );
                }
                Some(_) => {}
                None => {
                    resolver.tables.insert(table, entity.name.clone());
                }
            }
        }

        for (alias, target) in aliases {
            // Aliases resolve to the entity's own spelling; an alias naming no
            // entity is dropped so it can never key a profile.
            let Some(canonical) = resolver.entities.get(&fold(target)).cloned() else {
                resolver
                    .unresolved_aliases
                    .push((alias.trim().to_string(), target.trim().to_string()));
                continue;
            };
            resolver.aliases.insert(alias.trim().to_string(), canonical.clone());
            resolver
                .folded_aliases
                .entry(fold(alias))
                .or_insert(canonical);
        }

        resolver
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.resolve_with_match(name).map(|(canonical, _)| canonical)
    }

    pub fn resolve_with_match(&self, name: &str) -> Option<(&str, NameMatch)> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }

        let table_key = fold(clean_table_name(trimmed));
        if let Some(canonical) = self.tables.get(&table_key) {
            return Some((canonical.as_str(), NameMatch::Table));
        }

        let bare = clean_table_name(trimmed);
        if let Some(canonical) = self
            .aliases
            .get(trimmed)
            .or_else(|| self.aliases.get(bare))
            .or_else(|| self.folded_aliases.get(&fold(bare)))
        {
            return Some((canonical.as_str(), NameMatch::Alias));
        }

        self.entities
            .get(&fold(bare))
            .map(|canonical| (canonical.as_str(), NameMatch::Entity))
    }

    /// `(alias, target)` pairs whose target matched no entity.
    pub fn unresolved_aliases(&self) -> &[(String, String)] {
        &self.unresolved_aliases
    }

    /// True if `name` is already a canonical entity name.
    pub fn is_known_entity(&self, name: &str) -> bool {
        self.entities.get(&fold(name)).is_some_and(|c| c == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> EntityNameResolver {
        let entities = vec![
            EntityModel::new("Customer").with_table("tbl_customers"),
            EntityModel::new("Order").with_table("Orders"),
            EntityModel::new("CustomerProfile"),
        ];
        let aliases = BTreeMap::from([
            ("Customers".to_string(), "Customer".to_string()),
            ("Profiles".to_string(), "customerprofile".to_string()),
        ]);
        EntityNameResolver::new(&entities, &aliases)
    }

    #[test]
    fn test_clean_table_name() {
        assert_eq!(clean_table_name("[dbo].[Orders]"), "Orders");
        assert_eq!(clean_table_name("\"sales\".\"Orders\""), "Orders");
        assert_eq!(clean_table_name(" `Orders` "), "Orders");
        assert_eq!(clean_table_name("Orders"), "Orders");
    }

    #[test]
    fn test_table_match_wins() {
        let r = resolver();
        assert_eq!(r.resolve_with_match("dbo.TBL_CUSTOMERS"), Some(("Customer", NameMatch::Table)));
        assert_eq!(r.resolve_with_match("Orders"), Some(("Order", NameMatch::Table)));
    }

    #[test]
    fn test_alias_match() {
        let r = resolver();
        assert_eq!(r.resolve_with_match("Customers"), Some(("Customer", NameMatch::Alias)));
        assert_eq!(r.resolve_with_match("customers"), Some(("Customer", NameMatch::Alias)));
        // alias target respelled to the entity's canonical name
        assert_eq!(r.resolve("Profiles"), Some("CustomerProfile"));
    }

    #[test]
    fn test_entity_name_fallback_is_case_insensitive() {
        let r = resolver();
        assert_eq!(r.resolve_with_match("customer"), Some(("Customer", NameMatch::Entity)));
        // unmapped entity: its own name is its table
        assert_eq!(r.resolve_with_match("CUSTOMERPROFILE"), Some(("CustomerProfile", NameMatch::Table)));
    }

    #[test]
    fn test_alias_to_unknown_entity_is_dropped() {
        let aliases = BTreeMap::from([("Ledgers".to_string(), "Ledger".to_string())]);
        let r = EntityNameResolver::new(&[EntityModel::new("Customer")], &aliases);
        assert_eq!(r.resolve("Ledgers"), None);
        assert_eq!(
            r.unresolved_aliases(),
            [("Ledgers".to_string(), "Ledger".to_string())]
        );
    }

    #[test]
    fn test_unresolved_names() {
        let r = resolver();
        assert_eq!(r.resolve("AuditLog"), None);
        assert_eq!(r.resolve("   "), None);
    }

    #[test]
    fn test_is_known_entity() {
        let r = resolver();
        assert!(r.is_known_entity("Customer"));
        assert!(!r.is_known_entity("customer"));
        assert!(!r.is_known_entity("Customers"));
    }
}
