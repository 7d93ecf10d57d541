pub mod profiles;
pub mod resolver;
pub mod thresholds;

pub use profiles::{available_profiles, profile_definition, ProfileDefinition};
pub use resolver::{
    ConfigDocument, ConfigScope, ConfigSource, ConfigWarning, ResolvedThresholds,
    ThresholdResolver,
};
pub use thresholds::{MigrationThresholds, ThresholdField, ThresholdPatch, ThresholdValue};
