pub mod context;
pub mod names;
pub mod pipeline;
pub mod production;
pub mod relationships;
pub mod usage;

pub use context::AnalysisContext;
pub use names::{clean_table_name, EntityNameResolver, NameMatch};
pub use pipeline::{analyze, analyze_json, analyze_with_resolver, rank_candidates, AnalysisInput};
pub use production::{attribute_production, AttributionSummary};
pub use relationships::{fuse_relationships, FusedRelationship, RelationshipGraph, RelationshipSource};
pub use usage::{build_usage_profiles, include_segments};
