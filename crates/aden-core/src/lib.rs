//! Aden core library: fuses schema, navigation, and query-usage views of a
//! relational application into per-entity usage profiles and a ranked list
//! of NoSQL migration candidates.
//!
//! The crate is a pure, synchronous transformation. Callers hand over
//! already-extracted inputs and raw configuration text; nothing here reads
//! files, touches the network, or installs a tracing subscriber.

pub mod analysis;
pub mod config;
pub mod errors;
pub mod models;
pub mod scoring;

pub use analysis::{analyze, analyze_json, analyze_with_resolver, AnalysisInput};
pub use config::{
    available_profiles, ConfigDocument, MigrationThresholds, ResolvedThresholds, ThresholdResolver,
};
pub use errors::{AdenError, AdenResult};
pub use models::{
    AnalysisResult, Cardinality, DenormalizationCandidate, EntityModel, EntityUsageProfile,
    MigrationComplexity, QueryKind, QueryPattern, ScoreTier, TargetDatastore,
};
