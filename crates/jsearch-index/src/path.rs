//! Document path construction.
//!
//! Workspace paths are `/`-separated strings rooted at the workspace (`/P1/src/a/A.java`).
//! Paths inside an archive join the archive path and the member path with
//! [`ARCHIVE_SEPARATOR`]: `/lib/j1.jar|com/acme/Foo.class`.

use crate::model::{Container, ContainerKind};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Separator between an archive path and the path of a member inside it.
pub const ARCHIVE_SEPARATOR: char = '|';

/// Suffix of compiled class members.
pub const CLASS_SUFFIX: &str = ".class";

/// Builds the full path of a document indexed by `container`.
pub fn document_path(container: &Container, relative: &str) -> String {
    let separator = match container.kind {
        ContainerKind::Project => SEPARATOR,
        ContainerKind::Archive => ARCHIVE_SEPARATOR,
    };
    let relative = relative.trim_start_matches(SEPARATOR);
    format!("{}{separator}{relative}", container.path.trim_end_matches(SEPARATOR))
}

/// Builds the path of a compiled type inside an archive.
///
/// `binary_name` is dotted (`com.acme.Outer$Inner`); nested types keep their `$`.
pub fn archive_member_path(archive: &str, binary_name: &str) -> String {
    format!(
        "{archive}{ARCHIVE_SEPARATOR}{}{CLASS_SUFFIX}",
        binary_name.replace('.', "/")
    )
}

/// Splits an archive-member path into the archive path and the member path.
pub fn split_archive_member(path: &str) -> Option<(&str, &str)> {
    path.split_once(ARCHIVE_SEPARATOR)
}

/// Returns true if `path` names a member inside an archive.
pub fn is_archive_member(path: &str) -> bool {
    path.contains(ARCHIVE_SEPARATOR)
}

/// Returns the path of the container resource owning `path`.
///
/// Archive-member paths resolve to their archive; other paths are returned unchanged.
pub fn owning_resource(path: &str) -> &str {
    split_archive_member(path).map_or(path, |(archive, _)| archive)
}

/// Returns true if `path` is `container` itself or lies inside it.
pub fn is_within(container: &str, path: &str) -> bool {
    let container = container.trim_end_matches(SEPARATOR);
    match path.strip_prefix(container) {
        Some(rest) => {
            rest.is_empty() || rest.starts_with(SEPARATOR) || rest.starts_with(ARCHIVE_SEPARATOR)
        }
        None => false,
    }
}
