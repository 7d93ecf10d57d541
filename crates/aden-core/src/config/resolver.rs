//! Threshold resolution across defaults, profiles, config documents,
//! environment variables, and CLI overrides.
//!
//! Precedence, lowest to highest:
//!
//! 1. built-in defaults
//! 2. named profile
//! 3. user-level config documents
//! 4. project-level config documents
//! 5. `ADEN_*` environment variables
//! 6. CLI `--thresholds.*` overrides
//!
//! Each layer is a [`ThresholdPatch`] that only overwrites the fields it
//! sets. Only an unknown profile name is fatal; every other problem is
//! recorded as a [`ConfigWarning`] and the offending value is skipped.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::profiles::{available_profiles, profile_definition};
use crate::config::thresholds::{MigrationThresholds, ThresholdField, ThresholdPatch};
use crate::errors::{AdenError, AdenResult};

pub const ENV_PREFIX: &str = "ADEN_";
pub const ENV_PROFILE: &str = "ADEN_PROFILE";
const CLI_PREFIX: &str = "thresholds.";

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

// ---------------------------------------------------------------------------
// Sources and warnings
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigSource {
    Defaults,
    Profile,
    UserConfig,
    ProjectConfig,
    Environment,
    Cli,
    /// Post-resolution consistency checks.
    Validation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigScope {
    User,
    Project,
}

impl ConfigScope {
    fn source(self) -> ConfigSource {
        match self {
            ConfigScope::User => ConfigSource::UserConfig,
            ConfigScope::Project => ConfigSource::ProjectConfig,
        }
    }
}

/// A JSON configuration document that the caller has already read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigDocument {
    pub scope: ConfigScope,
    /// Where the document came from, for warnings only.
    pub origin: String,
    pub contents: String,
}

impl ConfigDocument {
    pub fn user(origin: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            scope: ConfigScope::User,
            origin: origin.into(),
            contents: contents.into(),
        }
    }

    pub fn project(origin: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            scope: ConfigScope::Project,
            origin: origin.into(),
            contents: contents.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigWarning {
    pub field: String,
    pub source: ConfigSource,
    pub message: String,
}

/// Outcome of a successful resolution.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedThresholds {
    pub thresholds: MigrationThresholds,
    pub warnings: Vec<ConfigWarning>,
    /// Sources that set at least one field, in application order.
    pub sources_applied: Vec<ConfigSource>,
}

// ---------------------------------------------------------------------------
// Key handling
// ---------------------------------------------------------------------------

/// Normalize camelCase, kebab-case, or dotted keys to snake_case, dropping
/// leading dashes and a `thresholds` prefix.
pub fn normalize_key(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('-');
    let lowered_prefix = trimmed.to_ascii_lowercase();
    let without_prefix = if lowered_prefix.starts_with(CLI_PREFIX)
        || lowered_prefix.starts_with("thresholds_")
    {
        &trimmed[CLI_PREFIX.len()..]
    } else {
        trimmed
    };
    CAMEL_BOUNDARY
        .replace_all(without_prefix, "${1}_${2}")
        .to_ascii_lowercase()
        .replace(['-', '.'], "_")
}

/// Split `--thresholds.key=value` style arguments into key/value pairs.
///
/// A flag without `=` takes the following argument as its value. Arguments
/// that are not `--thresholds.*` flags are ignored.
pub fn parse_cli_args<I, S>(args: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
    let mut pairs = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].trim_start_matches('-');
        if !arg.to_ascii_lowercase().starts_with(CLI_PREFIX) || !args[i].starts_with("--") {
            i += 1;
            continue;
        }
        if let Some((key, value)) = arg.split_once('=') {
            pairs.push((key.to_string(), value.to_string()));
            i += 1;
        } else if let Some(value) = args.get(i + 1) {
            pairs.push((arg.to_string(), value.clone()));
            i += 2;
        } else {
            pairs.push((arg.to_string(), String::new()));
            i += 1;
        }
    }
    pairs
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Collects raw configuration sources and resolves them into thresholds.
#[derive(Clone, Debug, Default)]
pub struct ThresholdResolver {
    profile: Option<String>,
    documents: Vec<ConfigDocument>,
    env: BTreeMap<String, String>,
    cli: Vec<(String, String)>,
}

impl ThresholdResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(mut self, name: impl Into<String>) -> Self {
        self.profile = Some(name.into());
        self
    }

    pub fn document(mut self, document: ConfigDocument) -> Self {
        self.documents.push(document);
        self
    }

    /// Keep the `ADEN_*` entries of an environment snapshot.
    pub fn env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let key = key.into();
            if key.starts_with(ENV_PREFIX) {
                self.env.insert(key, value.into());
            }
        }
        self
    }

    pub fn cli_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cli.push((key.into(), value.into()));
        self
    }

    pub fn cli_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cli.extend(parse_cli_args(args));
        self
    }

    pub fn resolve(&self) -> AdenResult<ResolvedThresholds> {
        let mut thresholds = MigrationThresholds::default();
        let mut warnings = Vec::new();
        let mut sources_applied = vec![ConfigSource::Defaults];

        let parsed: Vec<ParsedDocument> = self
            .documents
            .iter()
            .map(|doc| parse_document(doc, &mut warnings))
            .collect();

        // Profile layer.
        if let Some(name) = self.profile_name(&parsed) {
            let definition = profile_definition(&name).ok_or_else(|| AdenError::UnknownProfile {
                name: name.clone(),
                valid: available_profiles().iter().map(|p| p.to_string()).collect(),
            })?;
            definition.to_patch().apply_to(&mut thresholds);
            thresholds.profile_name = definition.name.to_string();
            sources_applied.push(ConfigSource::Profile);
        }

        // Document layers: every user document, then every project document.
        for scope in [ConfigScope::User, ConfigScope::Project] {
            let mut applied = false;
            for doc in parsed.iter().filter(|d| d.scope == scope) {
                if !doc.patch.is_empty() {
                    doc.patch.apply_to(&mut thresholds);
                    applied = true;
                }
            }
            if applied {
                sources_applied.push(scope.source());
            }
        }

        let env_patch = self.env_patch(&mut warnings);
        if !env_patch.is_empty() {
            env_patch.apply_to(&mut thresholds);
            sources_applied.push(ConfigSource::Environment);
        }

        let cli_patch = self.cli_patch(&mut warnings);
        if !cli_patch.is_empty() {
            cli_patch.apply_to(&mut thresholds);
            sources_applied.push(ConfigSource::Cli);
        }

        validate(&thresholds, &mut warnings);

        for warning in &warnings {
            warn!(
                field = %warning.field,
                source = ?warning.source,
                "threshold configuration: {}",
                warning.message
            );
        }
        info!(
            profile = %thresholds.profile_name,
            sources = ?sources_applied,
            warnings = warnings.len(),
            "migration thresholds resolved"
        );

        Ok(ResolvedThresholds {
            thresholds,
            warnings,
            sources_applied,
        })
    }

    /// Explicit name, then `ADEN_PROFILE`, then the last document naming one
    /// (project documents win over user documents).
    fn profile_name(&self, parsed: &[ParsedDocument]) -> Option<String> {
        if let Some(name) = &self.profile {
            return Some(name.clone());
        }
        if let Some(name) = self.env.get(ENV_PROFILE) {
            return Some(name.clone());
        }
        [ConfigScope::User, ConfigScope::Project]
            .into_iter()
            .flat_map(|scope| parsed.iter().filter(move |d| d.scope == scope))
            .filter_map(|d| d.profile.clone())
            .last()
    }

    fn env_patch(&self, warnings: &mut Vec<ConfigWarning>) -> ThresholdPatch {
        let mut patch = ThresholdPatch::new();
        for (key, value) in &self.env {
            if key == ENV_PROFILE {
                continue;
            }
            let bare = &key[ENV_PREFIX.len()..];
            let Some(field) = ThresholdField::from_key(&normalize_key(bare)) else {
                debug!(variable = %key, "ignoring unrelated environment variable");
                continue;
            };
            match field.parse_value(value) {
                Ok(parsed) => patch.set(field, parsed),
                Err(reason) => warnings.push(ConfigWarning {
                    field: field.key().to_string(),
                    source: ConfigSource::Environment,
                    message: format!("{key}: {reason}; keeping previous value"),
                }),
            }
        }
        patch
    }

    fn cli_patch(&self, warnings: &mut Vec<ConfigWarning>) -> ThresholdPatch {
        let mut patch = ThresholdPatch::new();
        for (key, value) in &self.cli {
            let Some(field) = ThresholdField::from_key(&normalize_key(key)) else {
                warnings.push(ConfigWarning {
                    field: key.clone(),
                    source: ConfigSource::Cli,
                    message: format!("unknown threshold '{key}'"),
                });
                continue;
            };
            match field.parse_value(value) {
                Ok(parsed) => patch.set(field, parsed),
                Err(reason) => warnings.push(ConfigWarning {
                    field: field.key().to_string(),
                    source: ConfigSource::Cli,
                    message: format!("--thresholds.{}: {reason}; keeping previous value", field),
                }),
            }
        }
        patch
    }
}

/// Resolve thresholds for a profile name alone.
pub fn resolve_profile(name: Option<&str>) -> AdenResult<MigrationThresholds> {
    let mut resolver = ThresholdResolver::new();
    if let Some(name) = name {
        resolver = resolver.profile(name);
    }
    Ok(resolver.resolve()?.thresholds)
}

// ---------------------------------------------------------------------------
// Document parsing
// ---------------------------------------------------------------------------

struct ParsedDocument {
    scope: ConfigScope,
    profile: Option<String>,
    patch: ThresholdPatch,
}

fn parse_document(doc: &ConfigDocument, warnings: &mut Vec<ConfigWarning>) -> ParsedDocument {
    let source = doc.scope.source();
    let mut parsed = ParsedDocument {
        scope: doc.scope,
        profile: None,
        patch: ThresholdPatch::new(),
    };

    let root = match serde_json::from_str::<serde_json::Value>(&doc.contents) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(_) => {
            warnings.push(ConfigWarning {
                field: "<document>".to_string(),
                source,
                message: format!("{}: expected a JSON object at the root", doc.origin),
            });
            return parsed;
        }
        Err(e) => {
            warnings.push(ConfigWarning {
                field: "<document>".to_string(),
                source,
                message: format!("{}: invalid JSON ({e}); document skipped", doc.origin),
            });
            return parsed;
        }
    };

    for (key, value) in &root {
        match key.as_str() {
            "profile" => match value.as_str() {
                Some(name) => parsed.profile = Some(name.to_string()),
                None => warnings.push(ConfigWarning {
                    field: "profile".to_string(),
                    source,
                    message: format!("{}: profile must be a string", doc.origin),
                }),
            },
            "thresholds" => {}
            _ => apply_document_entry(doc, key, value, &mut parsed.patch, warnings),
        }
    }

    // Nested thresholds take priority over root-level keys.
    match root.get("thresholds") {
        Some(serde_json::Value::Object(nested)) => {
            for (key, value) in nested {
                apply_document_entry(doc, key, value, &mut parsed.patch, warnings);
            }
        }
        Some(_) => warnings.push(ConfigWarning {
            field: "thresholds".to_string(),
            source,
            message: format!("{}: thresholds must be an object", doc.origin),
        }),
        None => {}
    }

    parsed
}

fn apply_document_entry(
    doc: &ConfigDocument,
    key: &str,
    value: &serde_json::Value,
    patch: &mut ThresholdPatch,
    warnings: &mut Vec<ConfigWarning>,
) {
    let source = doc.scope.source();
    let Some(field) = ThresholdField::from_key(&normalize_key(key)) else {
        warnings.push(ConfigWarning {
            field: key.to_string(),
            source,
            message: format!("{}: unknown threshold '{key}'", doc.origin),
        });
        return;
    };
    match field.json_value(value) {
        Ok(parsed) => patch.set(field, parsed),
        Err(reason) => warnings.push(ConfigWarning {
            field: field.key().to_string(),
            source,
            message: format!("{}: {key}: {reason}; keeping previous value", doc.origin),
        }),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(t: &MigrationThresholds, warnings: &mut Vec<ConfigWarning>) {
    if t.high_frequency_threshold <= t.medium_frequency_threshold {
        warnings.push(ConfigWarning {
            field: ThresholdField::HighFrequency.key().to_string(),
            source: ConfigSource::Validation,
            message: format!(
                "high frequency threshold ({}) should exceed medium frequency threshold ({})",
                t.high_frequency_threshold, t.medium_frequency_threshold
            ),
        });
    }
    if t.high_read_write_ratio <= 1.0 {
        warnings.push(ConfigWarning {
            field: ThresholdField::HighReadWriteRatio.key().to_string(),
            source: ConfigSource::Validation,
            message: format!(
                "read/write ratio threshold ({}) should be greater than 1.0",
                t.high_read_write_ratio
            ),
        });
    }
    let tiers = [
        t.excellent_candidate_threshold,
        t.strong_candidate_threshold,
        t.good_candidate_threshold,
        t.fair_candidate_threshold,
    ];
    if tiers.windows(2).any(|pair| pair[0] <= pair[1]) {
        warnings.push(ConfigWarning {
            field: ThresholdField::ExcellentCandidate.key().to_string(),
            source: ConfigSource::Validation,
            message: format!(
                "candidate tiers should be strictly descending (excellent {} > strong {} > good {} > fair {})",
                tiers[0], tiers[1], tiers[2], tiers[3]
            ),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
