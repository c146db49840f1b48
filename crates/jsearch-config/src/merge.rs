//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`, applying
//! precedence rules.

use std::path::PathBuf;

use crate::{
    AccessRule, Config, SearchSettings,
    parse::{RawConfig, RawSearchSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to
/// the working directory), lowest precedence last (global config).
///
/// Merge rules:
/// - Scalar settings: first defined value wins
/// - Access rules: concatenated in precedence order, so closer files are checked first
pub fn merge_configs(configs: &[ParsedConfig]) -> Config {
    Config {
        search: merge_search_settings(configs),
        access_rules: merge_access_rules(configs),
        sources: configs.iter().map(|c| c.path.clone()).collect(),
    }
}

/// Merges search settings.
fn merge_search_settings(configs: &[ParsedConfig]) -> SearchSettings {
    let mut result = SearchSettings::default();

    // Iterate in reverse (lowest precedence first) so higher precedence overwrites
    for parsed in configs.iter().rev() {
        if let Some(ref search) = parsed.config.search {
            apply_raw_search(&mut result, search);
        }
    }

    result
}

/// Applies raw search settings to result, overwriting any present values.
fn apply_raw_search(result: &mut SearchSettings, raw: &RawSearchSettings) {
    if let Some(v) = raw.error_policy {
        result.error_policy = v;
    }
    if let Some(v) = raw.parallel {
        result.parallel = v;
    }
    if let Some(v) = raw.polymorphic_methods {
        result.polymorphic_methods = v;
    }
    if let Some(v) = raw.match_mode {
        result.match_mode = v;
    }
    if let Some(v) = raw.case_sensitive {
        result.case_sensitive = v;
    }
}

/// Concatenates access rules, highest precedence first.
fn merge_access_rules(configs: &[ParsedConfig]) -> Vec<AccessRule> {
    configs
        .iter()
        .filter_map(|parsed| parsed.config.access.as_ref())
        .filter_map(|access| access.rules.as_ref())
        .flatten()
        .map(|rule| AccessRule {
            patterns: rule.patterns.clone(),
            kind: rule.kind,
        })
        .collect()
}
