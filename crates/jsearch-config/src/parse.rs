//! Configuration file parsing.
//!
//! Parses individual `.jsearch.toml` files into intermediate `RawConfig` structures
//! that preserve the optional nature of all fields before merging.

use std::{fs, path::Path};

use jsearch_pattern::MatchMode;
use serde::Deserialize;
use serde_with::{OneOrMany, serde_as};

use crate::{AccessRuleKind, ConfigError, ErrorPolicy};

/// Raw configuration as parsed directly from a TOML file.
///
/// All fields are optional to support partial configs that will be merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// When true, stop discovery here and ignore parent and global configs.
    pub root: Option<bool>,
    /// Search settings section.
    pub search: Option<RawSearchSettings>,
    /// Access rule section.
    pub access: Option<RawAccess>,
}

/// Raw search settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSearchSettings {
    /// Whether data-source failures abort the search.
    pub error_policy: Option<ErrorPolicy>,
    /// Whether containers are dispatched in parallel.
    pub parallel: Option<bool>,
    /// Whether method reference patterns widen to referencing projects.
    pub polymorphic_methods: Option<bool>,
    /// Default match mode for textual patterns.
    pub match_mode: Option<MatchMode>,
    /// Default case sensitivity for textual patterns.
    pub case_sensitive: Option<bool>,
}

/// Raw `[access]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawAccess {
    /// Access rules in file order.
    pub rules: Option<Vec<RawAccessRule>>,
}

/// Raw access rule from TOML.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawAccessRule {
    /// Glob pattern(s) matched against document paths.
    /// Accepts either a single string or an array of strings.
    #[serde(rename = "match")]
    #[serde_as(as = "OneOrMany<_>")]
    pub patterns: Vec<String>,
    /// Restriction applied to matching paths.
    pub kind: AccessRuleKind,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Checks if a config file has `root = true` set.
///
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(config) = toml::from_str::<RawConfig>(&contents) else {
        return false;
    };
    config.root == Some(true)
}
