//! Per-category score weights and caps.

use crate::models::Cardinality;

// Additive categories
pub const EAGER_LOADING_MAX: f64 = 50.0;
pub const ALWAYS_LOADED_POINTS: f64 = 15.0;
pub const CO_ACCESSED_POINTS: f64 = 10.0;
pub const RELATIONSHIP_STRENGTH_MAX: f64 = 40.0;
pub const PRODUCTION_TRAFFIC_POINTS: f64 = 20.0;
pub const READ_HEAVY_POINTS: f64 = 30.0;
pub const COMPLEX_QUERY_POINTS: f64 = 30.0;
pub const PARTIAL_COMPLEX_QUERY_POINTS: f64 = 15.0;
pub const SIMPLE_KEY_ACCESS_POINTS: f64 = 20.0;

// Penalties
pub const MAX_PENALIZED_RELATIONSHIPS: usize = 3;

// Interpretation tiers
pub const EXCELLENT_TIER: u32 = 150;
pub const STRONG_TIER: u32 = 100;
pub const GOOD_TIER: u32 = 60;
pub const FAIR_TIER: u32 = 30;

// Migration complexity
pub const COMPLEXITY_PER_RELATIONSHIP: u32 = 8;
pub const COMPLEXITY_PER_MANY_TO_MANY: u32 = 15;
pub const COMPLEXITY_PER_ONE_TO_MANY: u32 = 4;
pub const COMPLEXITY_CIRCULAR: u32 = 25;
pub const COMPLEXITY_MAX: u32 = 100;

// Datastore routing
pub const KEY_VALUE_MAX_FAN_OUT: usize = 3;

/// Fraction of the complexity penalty charged per related entity.
pub fn cardinality_penalty_weight(cardinality: Cardinality) -> f64 {
    match cardinality {
        Cardinality::OneToOne | Cardinality::ManyToOne => 0.0,
        Cardinality::OneToMany => 0.2,
        Cardinality::ManyToMany => 1.0,
    }
}
