//! Locating the `.jsearch.toml` files that apply to a directory.
//!
//! Files are collected from the start directory upwards until the workspace root: the
//! nearest ancestor holding either a `.jsearch.toml` with `root = true` or a version
//! control checkout marker. Files above the workspace root never apply. The user's
//! `~/.jsearch.toml` comes last, unless the walk was closed by a `root = true` file.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::parse::is_root_config;

/// The configuration filename.
pub const CONFIG_FILENAME: &str = ".jsearch.toml";

/// Entries marking the top of a version control checkout.
const CHECKOUT_MARKERS: &[&str] = &[".git", ".hg"];

/// What marks a directory as the workspace root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootMarker {
    /// A `.jsearch.toml` with `root = true`.
    RootConfig,
    /// A version control checkout.
    Checkout,
}

/// The directory configuration discovery stops at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRoot {
    /// The root directory.
    pub path: PathBuf,
    /// Why `path` is a root.
    pub marker: RootMarker,
}

/// Finds the workspace root enclosing `cwd`, `cwd` included.
///
/// A root config wins over a checkout marker in the same directory.
pub fn workspace_root(cwd: &Path) -> Option<WorkspaceRoot> {
    cwd.ancestors().find_map(|dir| {
        let marker = root_marker(dir)?;
        Some(WorkspaceRoot {
            path: dir.to_path_buf(),
            marker,
        })
    })
}

/// The root marker `dir` holds, if any.
fn root_marker(dir: &Path) -> Option<RootMarker> {
    let config = dir.join(CONFIG_FILENAME);
    if config.is_file() && is_root_config(&config) {
        return Some(RootMarker::RootConfig);
    }
    CHECKOUT_MARKERS
        .iter()
        .any(|marker| dir.join(marker).exists())
        .then_some(RootMarker::Checkout)
}

/// Discovers the configuration files that apply to `cwd`.
///
/// Returns paths in precedence order: closest to `cwd` first, global last.
pub fn discover_config_files(cwd: &Path) -> Vec<PathBuf> {
    let root = workspace_root(cwd);
    let mut configs = Vec::new();

    for dir in cwd.ancestors() {
        let config = dir.join(CONFIG_FILENAME);
        if config.is_file() {
            configs.push(config);
        }
        if root.as_ref().is_some_and(|root| root.path == dir) {
            break;
        }
    }

    let closed = root.is_some_and(|root| root.marker == RootMarker::RootConfig);
    if !closed {
        let global = global_config_path();
        configs.extend(global.filter(|path| path.is_file() && !configs.contains(path)));
    }
    configs
}

/// Returns the path to the global configuration file (`~/.jsearch.toml`).
///
/// Returns `None` if the home directory cannot be determined.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_FILENAME))
}

/// Checks if a path is the global configuration file.
pub fn is_global_config(path: &Path) -> bool {
    global_config_path().is_some_and(|global| path == global)
}
