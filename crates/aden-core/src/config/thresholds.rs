//! Resolved migration thresholds and the partial patches that build them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Base constants
// ---------------------------------------------------------------------------

pub const BASE_HIGH_FREQUENCY: f64 = 50.0;
pub const BASE_MEDIUM_FREQUENCY: f64 = 20.0;
pub const BASE_READ_WRITE_RATIO: f64 = 10.0;
pub const BASE_COMPLEXITY_PENALTY: f64 = 10.0;
pub const BASE_COMPLEX_QUERY_REQUIREMENT: f64 = 5.0;
pub const BASE_CO_ACCESS_THRESHOLD: f64 = 500.0;
pub const BASE_HIGH_PRODUCTION_EXECUTION: f64 = 1000.0;

pub const DEFAULT_PROFILE: &str = "default";

// ---------------------------------------------------------------------------
// MigrationThresholds
// ---------------------------------------------------------------------------

/// Effective thresholds for one analysis run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationThresholds {
    pub high_frequency_threshold: u64,
    pub medium_frequency_threshold: u64,
    pub high_read_write_ratio: f64,
    pub relationship_complexity_penalty: u64,
    pub complexity_penalty_multiplier: f64,
    pub excellent_candidate_threshold: u64,
    pub strong_candidate_threshold: u64,
    pub good_candidate_threshold: u64,
    pub fair_candidate_threshold: u64,
    pub minimum_score: u64,
    pub complex_query_requirement: u64,
    pub production_co_access_threshold: u64,
    pub high_production_execution_threshold: u64,
    pub profile_name: String,
}

impl Default for MigrationThresholds {
    fn default() -> Self {
        Self {
            high_frequency_threshold: BASE_HIGH_FREQUENCY as u64,
            medium_frequency_threshold: BASE_MEDIUM_FREQUENCY as u64,
            high_read_write_ratio: BASE_READ_WRITE_RATIO,
            relationship_complexity_penalty: BASE_COMPLEXITY_PENALTY as u64,
            complexity_penalty_multiplier: 1.0,
            excellent_candidate_threshold: 150,
            strong_candidate_threshold: 100,
            good_candidate_threshold: 60,
            fair_candidate_threshold: 30,
            minimum_score: 0,
            complex_query_requirement: BASE_COMPLEX_QUERY_REQUIREMENT as u64,
            production_co_access_threshold: BASE_CO_ACCESS_THRESHOLD as u64,
            high_production_execution_threshold: BASE_HIGH_PRODUCTION_EXECUTION as u64,
            profile_name: DEFAULT_PROFILE.to_string(),
        }
    }
}

impl MigrationThresholds {
    /// Current value of `field`.
    pub fn get(&self, field: ThresholdField) -> ThresholdValue {
        use ThresholdField::*;
        match field {
            HighFrequency => ThresholdValue::Count(self.high_frequency_threshold),
            MediumFrequency => ThresholdValue::Count(self.medium_frequency_threshold),
            HighReadWriteRatio => ThresholdValue::Ratio(self.high_read_write_ratio),
            RelationshipComplexityPenalty => {
                ThresholdValue::Count(self.relationship_complexity_penalty)
            }
            ComplexityPenaltyMultiplier => {
                ThresholdValue::Ratio(self.complexity_penalty_multiplier)
            }
            ExcellentCandidate => ThresholdValue::Count(self.excellent_candidate_threshold),
            StrongCandidate => ThresholdValue::Count(self.strong_candidate_threshold),
            GoodCandidate => ThresholdValue::Count(self.good_candidate_threshold),
            FairCandidate => ThresholdValue::Count(self.fair_candidate_threshold),
            MinimumScore => ThresholdValue::Count(self.minimum_score),
            ComplexQueryRequirement => ThresholdValue::Count(self.complex_query_requirement),
            ProductionCoAccess => ThresholdValue::Count(self.production_co_access_threshold),
            HighProductionExecution => {
                ThresholdValue::Count(self.high_production_execution_threshold)
            }
        }
    }

    fn set(&mut self, field: ThresholdField, value: ThresholdValue) {
        use ThresholdField::*;
        let count = value.as_count();
        let ratio = value.as_ratio();
        match field {
            HighFrequency => self.high_frequency_threshold = count,
            MediumFrequency => self.medium_frequency_threshold = count,
            HighReadWriteRatio => self.high_read_write_ratio = ratio,
            RelationshipComplexityPenalty => self.relationship_complexity_penalty = count,
            ComplexityPenaltyMultiplier => self.complexity_penalty_multiplier = ratio,
            ExcellentCandidate => self.excellent_candidate_threshold = count,
            StrongCandidate => self.strong_candidate_threshold = count,
            GoodCandidate => self.good_candidate_threshold = count,
            FairCandidate => self.fair_candidate_threshold = count,
            MinimumScore => self.minimum_score = count,
            ComplexQueryRequirement => self.complex_query_requirement = count,
            ProductionCoAccess => self.production_co_access_threshold = count,
            HighProductionExecution => self.high_production_execution_threshold = count,
        }
    }
}

// ---------------------------------------------------------------------------
// Fields and values
// ---------------------------------------------------------------------------

/// Every overridable numeric threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ThresholdField {
    HighFrequency,
    MediumFrequency,
    HighReadWriteRatio,
    RelationshipComplexityPenalty,
    ComplexityPenaltyMultiplier,
    ExcellentCandidate,
    StrongCandidate,
    GoodCandidate,
    FairCandidate,
    MinimumScore,
    ComplexQueryRequirement,
    ProductionCoAccess,
    HighProductionExecution,
}

impl ThresholdField {
    pub const ALL: [ThresholdField; 13] = [
        ThresholdField::HighFrequency,
        ThresholdField::MediumFrequency,
        ThresholdField::HighReadWriteRatio,
        ThresholdField::RelationshipComplexityPenalty,
        ThresholdField::ComplexityPenaltyMultiplier,
        ThresholdField::ExcellentCandidate,
        ThresholdField::StrongCandidate,
        ThresholdField::GoodCandidate,
        ThresholdField::FairCandidate,
        ThresholdField::MinimumScore,
        ThresholdField::ComplexQueryRequirement,
        ThresholdField::ProductionCoAccess,
        ThresholdField::HighProductionExecution,
    ];

    /// Canonical snake_case key.
    pub fn key(self) -> &'static str {
        self.names()[0]
    }

    /// Accepted snake_case spellings, canonical first.
    fn names(self) -> &'static [&'static str] {
        match self {
            ThresholdField::HighFrequency => &["high_frequency_threshold", "high_frequency"],
            ThresholdField::MediumFrequency => {
                &["medium_frequency_threshold", "medium_frequency"]
            }
            ThresholdField::HighReadWriteRatio => &[
                "high_read_write_ratio",
                "read_write_ratio",
                "read_write_ratio_threshold",
            ],
            ThresholdField::RelationshipComplexityPenalty => {
                &["relationship_complexity_penalty", "complexity_penalty"]
            }
            ThresholdField::ComplexityPenaltyMultiplier => {
                &["complexity_penalty_multiplier", "complexity_multiplier"]
            }
            ThresholdField::ExcellentCandidate => {
                &["excellent_candidate_threshold", "excellent_threshold"]
            }
            ThresholdField::StrongCandidate => &["strong_candidate_threshold", "strong_threshold"],
            ThresholdField::GoodCandidate => &["good_candidate_threshold", "good_threshold"],
            ThresholdField::FairCandidate => &["fair_candidate_threshold", "fair_threshold"],
            ThresholdField::MinimumScore => &["minimum_score", "min_score"],
            ThresholdField::ComplexQueryRequirement => {
                &["complex_query_requirement", "complex_query_threshold"]
            }
            ThresholdField::ProductionCoAccess => &[
                "production_co_access_threshold",
                "co_access_threshold",
            ],
            ThresholdField::HighProductionExecution => &[
                "high_production_execution_threshold",
                "high_production_executions",
            ],
        }
    }

    /// Look up a field from an already-normalized snake_case key.
    pub fn from_key(normalized: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.names().contains(&normalized))
    }

    /// Ratio fields accept fractional values; everything else is a count.
    pub fn is_ratio(self) -> bool {
        matches!(
            self,
            ThresholdField::HighReadWriteRatio | ThresholdField::ComplexityPenaltyMultiplier
        )
    }

    /// Parse a textual override for this field.
    pub fn parse_value(self, raw: &str) -> Result<ThresholdValue, String> {
        let trimmed = raw.trim();
        if self.is_ratio() {
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Ok(ThresholdValue::Ratio(v)),
                _ => Err(format!("expected a non-negative number, got '{trimmed}'")),
            }
        } else {
            trimmed
                .parse::<u64>()
                .map(ThresholdValue::Count)
                .map_err(|_| format!("expected a non-negative integer, got '{trimmed}'"))
        }
    }

    /// Interpret a JSON value for this field. Numeric strings are accepted.
    pub fn json_value(self, value: &serde_json::Value) -> Result<ThresholdValue, String> {
        match value {
            serde_json::Value::String(s) => self.parse_value(s),
            serde_json::Value::Number(n) => {
                if self.is_ratio() {
                    match n.as_f64() {
                        Some(v) if v >= 0.0 => Ok(ThresholdValue::Ratio(v)),
                        _ => Err(format!("expected a non-negative number, got {n}")),
                    }
                } else if let Some(v) = n.as_u64() {
                    Ok(ThresholdValue::Count(v))
                } else {
                    match n.as_f64() {
                        Some(v) if v >= 0.0 && v.fract() == 0.0 => {
                            Ok(ThresholdValue::Count(v as u64))
                        }
                        _ => Err(format!("expected a non-negative integer, got {n}")),
                    }
                }
            }
            other => Err(format!("expected a number, got {other}")),
        }
    }
}

impl fmt::Display for ThresholdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThresholdValue {
    Count(u64),
    Ratio(f64),
}

impl ThresholdValue {
    fn as_count(self) -> u64 {
        match self {
            ThresholdValue::Count(v) => v,
            ThresholdValue::Ratio(v) => v.round().max(0.0) as u64,
        }
    }

    fn as_ratio(self) -> f64 {
        match self {
            ThresholdValue::Count(v) => v as f64,
            ThresholdValue::Ratio(v) => v,
        }
    }
}

// ---------------------------------------------------------------------------
// ThresholdPatch
// ---------------------------------------------------------------------------

/// A partial set of threshold values contributed by one source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThresholdPatch {
    values: BTreeMap<ThresholdField, ThresholdValue>,
}

impl ThresholdPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: ThresholdField, value: ThresholdValue) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: ThresholdField, value: ThresholdValue) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: ThresholdField) -> Option<ThresholdValue> {
        self.values.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Overwrite exactly the fields this patch sets; others keep their value.
    pub fn apply_to(&self, thresholds: &mut MigrationThresholds) {
        for (&field, &value) in &self.values {
            thresholds.set(field, value);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_base_constants() {
        let t = MigrationThresholds::default();
        assert_eq!(t.high_frequency_threshold, 50);
        assert_eq!(t.medium_frequency_threshold, 20);
        assert_eq!(t.high_read_write_ratio, 10.0);
        assert_eq!(t.production_co_access_threshold, 500);
        assert_eq!(t.high_production_execution_threshold, 1000);
        assert_eq!(t.profile_name, "default");
    }

    #[test]
    fn test_patch_only_touches_set_fields() {
        let mut t = MigrationThresholds::default();
        ThresholdPatch::new()
            .with(ThresholdField::HighFrequency, ThresholdValue::Count(25))
            .apply_to(&mut t);
        assert_eq!(t.high_frequency_threshold, 25);
        assert_eq!(t.medium_frequency_threshold, 20);
    }

    #[test]
    fn test_every_field_round_trips_through_key_lookup() {
        for field in ThresholdField::ALL {
            assert_eq!(ThresholdField::from_key(field.key()), Some(field));
        }
        assert_eq!(
            ThresholdField::from_key("co_access_threshold"),
            Some(ThresholdField::ProductionCoAccess)
        );
        assert_eq!(ThresholdField::from_key("nonsense"), None);
    }

    #[test]
    fn test_parse_value_rejects_malformed_counts() {
        let field = ThresholdField::HighFrequency;
        assert_eq!(field.parse_value(" 25 "), Ok(ThresholdValue::Count(25)));
        assert!(field.parse_value("twenty").is_err());
        assert!(field.parse_value("-3").is_err());
        assert!(field.parse_value("2.5").is_err());
    }

    #[test]
    fn test_parse_value_accepts_fractional_ratio() {
        let field = ThresholdField::HighReadWriteRatio;
        assert_eq!(field.parse_value("7.5"), Ok(ThresholdValue::Ratio(7.5)));
        assert!(field.parse_value("NaN").is_err());
    }

    #[test]
    fn test_json_value_accepts_whole_floats_for_counts() {
        let field = ThresholdField::MediumFrequency;
        assert_eq!(
            field.json_value(&serde_json::json!(12.0)),
            Ok(ThresholdValue::Count(12))
        );
        assert_eq!(
            field.json_value(&serde_json::json!("8")),
            Ok(ThresholdValue::Count(8))
        );
        assert!(field.json_value(&serde_json::json!(12.5)).is_err());
        assert!(field.json_value(&serde_json::json!(true)).is_err());
    }

    #[test]
    fn test_get_reflects_set_values() {
        let mut t = MigrationThresholds::default();
        ThresholdPatch::new()
            .with(ThresholdField::ComplexityPenaltyMultiplier, ThresholdValue::Ratio(1.5))
            .apply_to(&mut t);
        assert_eq!(
            t.get(ThresholdField::ComplexityPenaltyMultiplier),
            ThresholdValue::Ratio(1.5)
        );
    }
}
