//! Built-in threshold profiles tuned for application scale or industry.

use crate::config::thresholds::{
    ThresholdField, ThresholdPatch, ThresholdValue, BASE_CO_ACCESS_THRESHOLD,
    BASE_COMPLEXITY_PENALTY, BASE_COMPLEX_QUERY_REQUIREMENT, BASE_HIGH_FREQUENCY,
    BASE_HIGH_PRODUCTION_EXECUTION, BASE_MEDIUM_FREQUENCY, BASE_READ_WRITE_RATIO,
};

/// A named bundle of multipliers, tier boundaries, and hard overrides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProfileDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub frequency_multiplier: f64,
    /// Scales `relationship_complexity_penalty` only; `complexity_penalty_multiplier`
    /// is left for explicit overrides.
    pub complexity_multiplier: f64,
    pub read_write_multiplier: f64,
    /// Excellent, strong, good, fair.
    pub tiers: [u64; 4],
    /// Fields set outright, regardless of the multipliers.
    pub overrides: &'static [(ThresholdField, ThresholdValue)],
}

pub const PROFILES: &[ProfileDefinition] = &[
    ProfileDefinition {
        name: "default",
        description: "Balanced thresholds for a mid-sized application",
        frequency_multiplier: 1.0,
        complexity_multiplier: 1.0,
        read_write_multiplier: 1.0,
        tiers: [150, 100, 60, 30],
        overrides: &[],
    },
    ProfileDefinition {
        name: "startup",
        description: "Small codebases with little traffic; low frequency bars",
        frequency_multiplier: 0.2,
        complexity_multiplier: 0.5,
        read_write_multiplier: 0.5,
        tiers: [120, 80, 50, 25],
        overrides: &[],
    },
    ProfileDefinition {
        name: "growth",
        description: "Scaling applications with moderate traffic",
        frequency_multiplier: 0.6,
        complexity_multiplier: 0.8,
        read_write_multiplier: 0.8,
        tiers: [140, 95, 55, 28],
        overrides: &[],
    },
    ProfileDefinition {
        name: "enterprise",
        description: "Large systems where only heavily used entities qualify",
        frequency_multiplier: 2.0,
        complexity_multiplier: 1.5,
        read_write_multiplier: 1.5,
        tiers: [160, 110, 70, 35],
        overrides: &[],
    },
    ProfileDefinition {
        name: "ecommerce",
        description: "Catalog and cart workloads; read-heavy at a lower ratio",
        frequency_multiplier: 1.0,
        complexity_multiplier: 1.0,
        read_write_multiplier: 1.0,
        tiers: [150, 100, 60, 30],
        overrides: &[(ThresholdField::HighReadWriteRatio, ThresholdValue::Ratio(5.0))],
    },
    ProfileDefinition {
        name: "financial",
        description: "Transactional systems; strict about complexity and co-access",
        frequency_multiplier: 1.5,
        complexity_multiplier: 2.0,
        read_write_multiplier: 1.0,
        tiers: [170, 120, 80, 40],
        overrides: &[
            (ThresholdField::HighReadWriteRatio, ThresholdValue::Ratio(20.0)),
            (ThresholdField::ProductionCoAccess, ThresholdValue::Count(2000)),
        ],
    },
    ProfileDefinition {
        name: "social",
        description: "Feed-style workloads with very high read volume",
        frequency_multiplier: 3.0,
        complexity_multiplier: 0.8,
        read_write_multiplier: 1.0,
        tiers: [150, 100, 60, 30],
        overrides: &[(ThresholdField::HighReadWriteRatio, ThresholdValue::Ratio(50.0))],
    },
];

/// Profile names in catalogue order.
pub fn available_profiles() -> Vec<&'static str> {
    PROFILES.iter().map(|p| p.name).collect()
}

/// Case-insensitive profile lookup.
pub fn profile_definition(name: &str) -> Option<&'static ProfileDefinition> {
    let wanted = name.trim();
    PROFILES.iter().find(|p| p.name.eq_ignore_ascii_case(wanted))
}

fn scaled(base: f64, multiplier: f64) -> u64 {
    (base * multiplier).round().max(0.0) as u64
}

impl ProfileDefinition {
    /// Every threshold this profile derives, as a patch over the defaults.
    pub fn to_patch(&self) -> ThresholdPatch {
        use ThresholdField::*;
        let freq = self.frequency_multiplier;
        let [excellent, strong, good, fair] = self.tiers;

        let mut patch = ThresholdPatch::new()
            .with(HighFrequency, ThresholdValue::Count(scaled(BASE_HIGH_FREQUENCY, freq).max(1)))
            .with(
                MediumFrequency,
                ThresholdValue::Count(scaled(BASE_MEDIUM_FREQUENCY, freq).max(1)),
            )
            .with(
                ComplexQueryRequirement,
                ThresholdValue::Count(scaled(BASE_COMPLEX_QUERY_REQUIREMENT, freq).max(1)),
            )
            .with(
                ProductionCoAccess,
                ThresholdValue::Count(scaled(BASE_CO_ACCESS_THRESHOLD, freq)),
            )
            .with(
                HighProductionExecution,
                ThresholdValue::Count(scaled(BASE_HIGH_PRODUCTION_EXECUTION, freq)),
            )
            .with(
                HighReadWriteRatio,
                ThresholdValue::Ratio(
                    scaled(BASE_READ_WRITE_RATIO, self.read_write_multiplier) as f64,
                ),
            )
            .with(
                RelationshipComplexityPenalty,
                ThresholdValue::Count(scaled(BASE_COMPLEXITY_PENALTY, self.complexity_multiplier)),
            )
            .with(ExcellentCandidate, ThresholdValue::Count(excellent))
            .with(StrongCandidate, ThresholdValue::Count(strong))
            .with(GoodCandidate, ThresholdValue::Count(good))
            .with(FairCandidate, ThresholdValue::Count(fair));

        for &(field, value) in self.overrides {
            patch.set(field, value);
        }
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::thresholds::MigrationThresholds;

    fn resolve(name: &str) -> MigrationThresholds {
        let mut t = MigrationThresholds::default();
        profile_definition(name).unwrap().to_patch().apply_to(&mut t);
        t
    }

    #[test]
    fn test_default_profile_reproduces_defaults() {
        assert_eq!(resolve("default"), MigrationThresholds::default());
    }

    #[test]
    fn test_startup_profile_scales_frequency() {
        let t = resolve("startup");
        assert_eq!(t.high_frequency_threshold, 10);
        assert_eq!(t.medium_frequency_threshold, 4);
        assert_eq!(t.complex_query_requirement, 1);
        assert_eq!(t.production_co_access_threshold, 100);
        assert_eq!(t.high_read_write_ratio, 5.0);
        assert_eq!(t.relationship_complexity_penalty, 5);
        assert_eq!(t.excellent_candidate_threshold, 120);
    }

    #[test]
    fn test_complexity_scaling_applied_once() {
        let financial = resolve("financial");
        assert_eq!(financial.relationship_complexity_penalty, 20);
        assert_eq!(financial.complexity_penalty_multiplier, 1.0);
        let startup = resolve("startup");
        assert_eq!(
            startup.relationship_complexity_penalty as f64 * startup.complexity_penalty_multiplier,
            5.0
        );
    }

    #[test]
    fn test_industry_override_beats_multiplier() {
        let ecommerce = resolve("ecommerce");
        assert_eq!(ecommerce.high_read_write_ratio, 5.0);
        let financial = resolve("financial");
        assert_eq!(financial.high_read_write_ratio, 20.0);
        assert_eq!(financial.production_co_access_threshold, 2000);
        assert_eq!(financial.high_frequency_threshold, 75);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(profile_definition(" Enterprise ").map(|p| p.name), Some("enterprise"));
        assert!(profile_definition("galactic").is_none());
    }

    #[test]
    fn test_catalogue_tiers_descend() {
        for profile in PROFILES {
            let [e, s, g, f] = profile.tiers;
            assert!(e > s && s > g && g > f, "profile {}", profile.name);
        }
        assert_eq!(available_profiles()[0], "default");
    }
}
