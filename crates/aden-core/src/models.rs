//! Shared typed models used across fusion, attribution, and scoring.
//!
//! Input records derive `Deserialize` so collaborators can hand them over as
//! JSON; output records derive `Serialize`. Field names are camelCase on the
//! wire.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::thresholds::MigrationThresholds;

// ---------------------------------------------------------------------------
// Cardinality
// ---------------------------------------------------------------------------

/// Cardinality of a directed relationship, read from the owning side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    /// Cardinality of the same relationship read from the other end.
    pub fn inverse(self) -> Self {
        match self {
            Cardinality::OneToMany => Cardinality::ManyToOne,
            Cardinality::ManyToOne => Cardinality::OneToMany,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToOne => "many-to-one",
            Cardinality::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Source models
// ---------------------------------------------------------------------------

/// A navigation property declared on an entity class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationProperty {
    pub name: String,
    pub target_entity: String,
    pub cardinality: Cardinality,
}

/// One business entity found in the application's source models.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityModel {
    pub name: String,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub navigation_properties: Vec<NavigationProperty>,
    #[serde(default)]
    pub has_circular_reference: bool,
}

impl EntityModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: None,
            navigation_properties: Vec::new(),
            has_circular_reference: false,
        }
    }

    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn with_navigation(
        mut self,
        name: impl Into<String>,
        target_entity: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        self.navigation_properties.push(NavigationProperty {
            name: name.into(),
            target_entity: target_entity.into(),
            cardinality,
        });
        self
    }

    pub fn with_circular_reference(mut self) -> Self {
        self.has_circular_reference = true;
        self
    }

    /// Table the entity maps to; entities without an explicit mapping use
    /// their own name.
    pub fn mapped_table(&self) -> &str {
        self.table_name.as_deref().unwrap_or(&self.name)
    }

    /// Case-insensitive lookup of a navigation property by name.
    pub fn navigation(&self, name: &str) -> Option<&NavigationProperty> {
        self.navigation_properties
            .iter()
            .find(|nav| nav.name.eq_ignore_ascii_case(name))
    }
}

// ---------------------------------------------------------------------------
// Database schema
// ---------------------------------------------------------------------------

/// A directed foreign-key link between two tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub from_table: String,
    #[serde(default)]
    pub from_column: String,
    pub to_table: String,
    #[serde(default)]
    pub to_column: String,
    pub cardinality: Cardinality,
}

impl Relationship {
    pub fn new(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
            cardinality,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub primary_key: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSchema {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

// ---------------------------------------------------------------------------
// Query patterns
// ---------------------------------------------------------------------------

/// Whether a query shape reads or writes its target entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// Shape of a query observed in application source code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryKind {
    /// Lookup of one row by key.
    SingleEntity,
    Collection,
    EagerLoading,
    ComplexEagerLoading,
    Projection,
    Aggregation,
    Insert,
    Update,
    Delete,
    RawSql,
    Unknown,
}

impl QueryKind {
    pub fn is_eager_loading(self) -> bool {
        matches!(self, QueryKind::EagerLoading | QueryKind::ComplexEagerLoading)
    }

    /// Read/write classification; `None` for shapes that count as neither.
    pub fn access(self) -> Option<AccessKind> {
        match self {
            QueryKind::SingleEntity
            | QueryKind::Collection
            | QueryKind::EagerLoading
            | QueryKind::ComplexEagerLoading
            | QueryKind::Projection
            | QueryKind::Aggregation => Some(AccessKind::Read),
            QueryKind::Insert | QueryKind::Update | QueryKind::Delete => Some(AccessKind::Write),
            QueryKind::RawSql | QueryKind::Unknown => None,
        }
    }
}

fn default_frequency() -> u64 {
    1
}

/// One observed query shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPattern {
    pub entity: String,
    pub kind: QueryKind,
    #[serde(default = "default_frequency")]
    pub frequency: u64,
    /// Dotted navigation paths loaded alongside the entity (`Orders.Items`).
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub order_by: Vec<String>,
    /// Entities joined explicitly by the query.
    #[serde(default)]
    pub joins: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl QueryPattern {
    pub fn new(entity: impl Into<String>, kind: QueryKind, frequency: u64) -> Self {
        Self {
            entity: entity.into(),
            kind,
            frequency,
            includes: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
            joins: Vec::new(),
            location: None,
        }
    }

    pub fn with_include(mut self, path: impl Into<String>) -> Self {
        self.includes.push(path.into());
        self
    }

    pub fn with_join(mut self, entity: impl Into<String>) -> Self {
        self.joins.push(entity.into());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Production telemetry
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Other,
}

impl SqlOperation {
    pub fn access(self) -> Option<AccessKind> {
        match self {
            SqlOperation::Select => Some(AccessKind::Read),
            SqlOperation::Insert
            | SqlOperation::Update
            | SqlOperation::Delete
            | SqlOperation::Merge => Some(AccessKind::Write),
            SqlOperation::Other => None,
        }
    }
}

/// One query captured by the production telemetry source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStoreQuery {
    #[serde(default)]
    pub query_id: String,
    pub tables: Vec<String>,
    pub operation: SqlOperation,
    pub execution_count: u64,
}

/// A set of tables observed together in production queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCombination {
    pub tables: Vec<String>,
    pub execution_count: u64,
    #[serde(default)]
    pub percentage: f64,
}

impl TableCombination {
    pub fn new<I, S>(tables: I, execution_count: u64, percentage: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
            execution_count,
            percentage,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStoreAnalysis {
    #[serde(default)]
    pub queries: Vec<QueryStoreQuery>,
    #[serde(default)]
    pub table_combinations: Vec<TableCombination>,
}

// ---------------------------------------------------------------------------
// Usage profile
// ---------------------------------------------------------------------------

/// `reads / writes`, or `reads` when nothing was written.
pub fn read_write_ratio(reads: u64, writes: u64) -> f64 {
    if writes > 0 {
        reads as f64 / writes as f64
    } else {
        reads as f64
    }
}

/// Per-entity aggregate built during one analysis run.
///
/// Only the fusion, attribution, and profile-building stages mutate a
/// profile; scoring reads it through the accessors below.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityUsageProfile {
    pub(crate) entity: EntityModel,
    pub(crate) eager_loading_count: u64,
    pub(crate) complex_eager_loading_count: u64,
    pub(crate) read_count: u64,
    pub(crate) write_count: u64,
    pub(crate) key_lookup_count: u64,
    pub(crate) always_loaded_with: BTreeSet<String>,
    pub(crate) related_entities: BTreeMap<String, Cardinality>,
    pub(crate) co_accessed_entities: BTreeMap<String, u64>,
    pub(crate) production_execution_count: u64,
    pub(crate) production_reads: u64,
    pub(crate) production_writes: u64,
    pub(crate) self_referencing: bool,
}

impl EntityUsageProfile {
    pub fn new(entity: EntityModel) -> Self {
        Self {
            entity,
            eager_loading_count: 0,
            complex_eager_loading_count: 0,
            read_count: 0,
            write_count: 0,
            key_lookup_count: 0,
            always_loaded_with: BTreeSet::new(),
            related_entities: BTreeMap::new(),
            co_accessed_entities: BTreeMap::new(),
            production_execution_count: 0,
            production_reads: 0,
            production_writes: 0,
            self_referencing: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }

    pub fn entity(&self) -> &EntityModel {
        &self.entity
    }

    pub fn eager_loading_count(&self) -> u64 {
        self.eager_loading_count
    }

    pub fn complex_eager_loading_count(&self) -> u64 {
        self.complex_eager_loading_count
    }

    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    pub fn read_write_ratio(&self) -> f64 {
        read_write_ratio(self.read_count, self.write_count)
    }

    pub fn always_loaded_with(&self) -> &BTreeSet<String> {
        &self.always_loaded_with
    }

    pub fn related_entities(&self) -> &BTreeMap<String, Cardinality> {
        &self.related_entities
    }

    pub fn co_accessed_entities(&self) -> &BTreeMap<String, u64> {
        &self.co_accessed_entities
    }

    /// Production executions shared with `other`, zero when never co-accessed.
    pub fn co_access_with(&self, other: &str) -> u64 {
        self.co_accessed_entities.get(other).copied().unwrap_or(0)
    }

    pub fn production_execution_count(&self) -> u64 {
        self.production_execution_count
    }

    /// `None` when no production query touched the entity.
    pub fn production_read_write_ratio(&self) -> Option<f64> {
        if self.production_reads == 0 && self.production_writes == 0 {
            return None;
        }
        Some(read_write_ratio(self.production_reads, self.production_writes))
    }

    /// Declared circular reference or a navigation back onto itself.
    pub fn has_circular_reference(&self) -> bool {
        self.entity.has_circular_reference || self.self_referencing
    }

    /// Every observed read is a key lookup and nothing is eager-loaded.
    pub fn is_simple_key_access(&self) -> bool {
        self.read_count > 0
            && self.key_lookup_count == self.read_count
            && self.eager_loading_count == 0
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Difficulty of migrating an entity, from a 0-100 complexity value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationComplexity {
    Low,
    Medium,
    High,
}

impl MigrationComplexity {
    pub const LOW_MAX: u32 = 30;
    pub const MEDIUM_MAX: u32 = 60;

    pub fn from_value(value: u32) -> Self {
        if value <= Self::LOW_MAX {
            MigrationComplexity::Low
        } else if value <= Self::MEDIUM_MAX {
            MigrationComplexity::Medium
        } else {
            MigrationComplexity::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MigrationComplexity::Low => "LOW",
            MigrationComplexity::Medium => "MEDIUM",
            MigrationComplexity::High => "HIGH",
        }
    }
}

/// Qualitative band a score falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreTier {
    Excellent,
    Strong,
    Good,
    Fair,
    Reconsider,
}

impl ScoreTier {
    pub fn label(self) -> &'static str {
        match self {
            ScoreTier::Excellent => "Excellent candidate",
            ScoreTier::Strong => "Strong candidate",
            ScoreTier::Good => "Good candidate",
            ScoreTier::Fair => "Fair candidate",
            ScoreTier::Reconsider => "Reconsider",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetDatastore {
    Document,
    KeyValue,
    Graph,
}

impl TargetDatastore {
    pub fn label(self) -> &'static str {
        match self {
            TargetDatastore::Document => "document database",
            TargetDatastore::KeyValue => "key-value store",
            TargetDatastore::Graph => "graph database",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreCategory {
    EagerLoading,
    RelationshipStrength,
    ProductionTraffic,
    ReadHeavy,
    QueryComplexity,
    SimpleKeyAccess,
    CircularReference,
    Cardinality,
}

/// One additive contribution to a candidate's score.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponent {
    pub category: ScoreCategory,
    pub points: f64,
    pub detail: String,
}

/// One scored migration recommendation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DenormalizationCandidate {
    pub(crate) primary_entity: String,
    pub(crate) related_entities: Vec<String>,
    pub(crate) complexity: MigrationComplexity,
    pub(crate) complexity_value: u32,
    pub(crate) score: u32,
    pub(crate) interpretation: ScoreTier,
    pub(crate) rating: ScoreTier,
    pub(crate) reason: String,
    pub(crate) target_datastore: TargetDatastore,
    pub(crate) co_access: BTreeMap<String, u64>,
    pub(crate) components: Vec<ScoreComponent>,
}

impl DenormalizationCandidate {
    pub fn primary_entity(&self) -> &str {
        &self.primary_entity
    }

    pub fn related_entities(&self) -> &[String] {
        &self.related_entities
    }

    pub fn complexity(&self) -> MigrationComplexity {
        self.complexity
    }

    pub fn complexity_value(&self) -> u32 {
        self.complexity_value
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Fixed-boundary band (150/100/60/30), independent of profile.
    pub fn interpretation(&self) -> ScoreTier {
        self.interpretation
    }

    /// Band computed from the active profile's tier boundaries.
    pub fn rating(&self) -> ScoreTier {
        self.rating
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn target_datastore(&self) -> TargetDatastore {
        self.target_datastore
    }

    /// Production co-access counts with each related entity.
    pub fn co_access(&self) -> &BTreeMap<String, u64> {
        &self.co_access
    }

    pub fn components(&self) -> &[ScoreComponent] {
        &self.components
    }
}

// ---------------------------------------------------------------------------
// Run output
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    DuplicateEntity,
    UnresolvedAlias,
    UnresolvedRelationship,
    UnresolvedNavigation,
    UnresolvedTable,
    UnresolvedQueryEntity,
    UnresolvedInclude,
    UnresolvedJoin,
}

/// A skipped or ignored input record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisWarning {
    pub kind: WarningKind,
    pub subject: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub entities_analyzed: usize,
    pub candidates_emitted: usize,
    pub schema_only_relationships: usize,
    pub unresolved_tables: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub candidates: Vec<DenormalizationCandidate>,
    pub usage_profiles: IndexMap<String, EntityUsageProfile>,
    pub query_patterns: Vec<QueryPattern>,
    pub schema_only_relationships: Vec<Relationship>,
    pub thresholds: MigrationThresholds,
    pub warnings: Vec<AnalysisWarning>,
    pub summary: AnalysisSummary,
}

impl AnalysisResult {
    pub fn candidate(&self, entity: &str) -> Option<&DenormalizationCandidate> {
        self.candidates.iter().find(|c| c.primary_entity == entity)
    }

    pub fn profile(&self, entity: &str) -> Option<&EntityUsageProfile> {
        self.usage_profiles.get(entity)
    }

    /// SHA-256 hex digest of the serialized candidate list.
    pub fn fingerprint(&self) -> String {
        let payload = serde_json::to_vec(&self.candidates).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&payload);
        format!("{:x}", hasher.finalize())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
