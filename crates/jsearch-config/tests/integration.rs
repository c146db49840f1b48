//! Integration tests for jsearch-config.
//!
//! Tests the full configuration loading pipeline: discovery -> parse -> merge -> compile.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use jsearch_config::{
    AccessRuleKind, CONFIG_FILENAME, Config, ConfigError, ErrorPolicy, is_global_config,
};
use jsearch_pattern::MatchMode;

/// Test helper to create a temporary directory structure for tests.
struct TestEnv {
    root: tempfile::TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    /// Creates a directory and returns its path.
    fn create_dir(&self, rel_path: &str) -> PathBuf {
        let path = self.root.path().join(rel_path);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Writes a config file in `rel_dir` and returns its path.
    fn create_config(&self, rel_dir: &str, content: &str) -> PathBuf {
        let dir = self.create_dir(rel_dir);
        let path = dir.join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }
}

#[test]
fn test_load_nested_configs_merging() {
    let env = TestEnv::new();
    env.create_config(
        "",
        r#"
root = true

[search]
error_policy = "strict"
match_mode = "prefix"
case_sensitive = false

[[access.rules]]
match = "/lib/*.jar|*"
kind = "discouraged"
"#,
    );
    env.create_config(
        "app",
        r#"
[search]
match_mode = "camel_case"
parallel = true

[[access.rules]]
match = ["/lib/internal.jar|*"]
kind = "forbidden"
"#,
    );
    let cwd = env.create_dir("app/src");

    let config = Config::load(&cwd).unwrap();
    assert_eq!(config.sources.len(), 2);
    assert!(config.sources.iter().all(|p| !is_global_config(p)));

    // Closest file wins per scalar; the rest falls through.
    assert_eq!(config.search.match_mode, MatchMode::CamelCase);
    assert!(config.search.parallel);
    assert_eq!(config.search.error_policy, ErrorPolicy::Strict);
    assert!(!config.search.case_sensitive);

    let rules = config.access_rules().unwrap();
    let internal = rules
        .restriction_for("/lib/internal.jar|com/acme/Impl.class")
        .unwrap();
    assert_eq!(internal.kind, AccessRuleKind::Forbidden);
    let other = rules.restriction_for("/lib/util.jar|a/B.class").unwrap();
    assert_eq!(other.kind, AccessRuleKind::Discouraged);
}

#[test]
fn test_load_error_invalid_toml() {
    let env = TestEnv::new();
    let path = env.create_config("", "root = true\n[search\n");

    let err = Config::load_from_files(&[path.clone()]).unwrap_err();
    match err {
        ConfigError::ParseToml { path: p, .. } => assert_eq!(p, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_load_error_missing_file() {
    let env = TestEnv::new();
    let missing = env.path().join("nope").join(CONFIG_FILENAME);

    let err = Config::load_from_files(&[missing]).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn test_invalid_access_glob_fails_at_compile() {
    let env = TestEnv::new();
    let path = env.create_config(
        "",
        "root = true\n[[access.rules]]\nmatch = \"a/{b\"\nkind = \"forbidden\"\n",
    );

    let config = Config::load_from_files(&[path]).unwrap();
    assert!(matches!(
        config.access_rules(),
        Err(ConfigError::InvalidPattern { .. })
    ));
}
