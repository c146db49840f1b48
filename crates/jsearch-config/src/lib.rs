//! Configuration system for jsearch.
//!
//! jsearch uses TOML configuration files named `.jsearch.toml`. Configuration is resolved by
//! walking up the directory tree from the current working directory to the workspace root,
//! collecting any `.jsearch.toml` files found, then loading `~/.jsearch.toml` as the global
//! config with lowest precedence. The workspace root is the nearest directory holding a
//! `root = true` config or a version control checkout.
//!
//! ```toml
//! [search]
//! error_policy = "strict"
//! parallel = true
//!
//! [[access.rules]]
//! match = "/lib/internal.jar|*"
//! kind = "forbidden"
//! ```

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod patterns;

use std::path::{Path, PathBuf};

pub use discovery::{
    CONFIG_FILENAME, RootMarker, WorkspaceRoot, discover_config_files, global_config_path,
    is_global_config, workspace_root,
};
pub use error::ConfigError;
use jsearch_pattern::{MatchMode, MatchRule};
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawAccess, RawAccessRule, RawConfig, RawSearchSettings, parse_config_file, parse_config_str,
};
pub use patterns::{AccessRestriction, CompiledAccessRules};
use serde::{Deserialize, Serialize};

/// Top-level merged configuration for jsearch.
///
/// This represents the fully resolved configuration after merging all discovered
/// `.jsearch.toml` files according to precedence rules.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Search-related settings.
    pub search: SearchSettings,
    /// Access rules, highest precedence first.
    pub access_rules: Vec<AccessRule>,
    /// Files this configuration was merged from, highest precedence first.
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.jsearch.toml` files.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(merge_configs(&parsed))
    }

    /// Compiles the access rules of this configuration.
    pub fn access_rules(&self) -> Result<CompiledAccessRules, ConfigError> {
        CompiledAccessRules::compile(&self.access_rules)
    }
}

/// How data-source failures during container selection and scope refresh are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failure and treat the affected branch as empty.
    #[default]
    BestEffort,
    /// Abort the search with the failure.
    Strict,
}

/// Search-related settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    /// How data-source failures are handled.
    pub error_policy: ErrorPolicy,
    /// Whether selected containers are dispatched in parallel.
    pub parallel: bool,
    /// Whether method reference patterns widen visibility to referencing projects.
    pub polymorphic_methods: bool,
    /// Default match mode for textual patterns.
    pub match_mode: MatchMode,
    /// Default case sensitivity for textual patterns.
    pub case_sensitive: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::BestEffort,
            parallel: false,
            polymorphic_methods: true,
            match_mode: MatchMode::Exact,
            case_sensitive: true,
        }
    }
}

impl SearchSettings {
    /// The default match rule for textual patterns.
    pub fn match_rule(&self) -> MatchRule {
        MatchRule::new(self.match_mode, self.case_sensitive)
    }
}

/// Kind of access restriction a rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRuleKind {
    /// No restriction; shadows later rules.
    Accessible,
    /// Matches are reported with a discouraged-access marker.
    Discouraged,
    /// Matches violate visibility.
    Forbidden,
}

/// An access rule from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    /// Glob patterns matched against document paths.
    pub patterns: Vec<String>,
    /// Restriction applied to matching paths.
    pub kind: AccessRuleKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SearchSettings::default();
        assert_eq!(settings.error_policy, ErrorPolicy::BestEffort);
        assert!(settings.polymorphic_methods);
        assert!(!settings.parallel);
        assert_eq!(settings.match_rule(), MatchRule::exact());
    }

    #[test]
    fn test_load_from_no_files() {
        let config = Config::load_from_files(&[]).unwrap();
        assert_eq!(config.search, SearchSettings::default());
        assert!(config.access_rules().unwrap().is_empty());
    }
}
