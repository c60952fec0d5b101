//! Materialized path helpers.
//!
//! A path lists ancestor ids from the virtual root down to the node itself,
//! joined by [`PATH_SEPARATOR`], e.g. `-1,1051,1062`.

use common::{PATH_SEPARATOR, ROOT_ID};

/// Path of the virtual root container.
pub fn root_path() -> String {
    ROOT_ID.to_string()
}

/// Path of a node with `id` placed under a parent at `parent_path`.
pub fn child_path(parent_path: &str, id: i32) -> String {
    format!("{parent_path}{PATH_SEPARATOR}{id}")
}

/// Depth below the virtual root: `-1` is level 0, `-1,5` is level 1.
pub fn level_of(path: &str) -> i32 {
    path.split(PATH_SEPARATOR).count() as i32 - 1
}

/// True if `path` is `ancestor` itself or lies underneath it.
///
/// Matching is per segment, so `-1,5` does not contain `-1,50`.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with(PATH_SEPARATOR),
        None => false,
    }
}

/// Prefix shared by every strict descendant of `ancestor`.
pub fn descendant_prefix(ancestor: &str) -> String {
    format!("{ancestor}{PATH_SEPARATOR}")
}

/// Re-parent `path` from `old_prefix` to `new_prefix`.
///
/// Returns `None` when `path` is not within `old_prefix`.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_within(path, old_prefix) {
        return None;
    }
    Some(format!("{new_prefix}{}", &path[old_prefix.len()..]))
}
