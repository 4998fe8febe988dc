//! Helper utilities for loader path handling.

use crate::ConfigError;
use std::path::{Component, Path, PathBuf};

/// Working directory to resolve custom overlays against.
pub(super) fn working_dir(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => std::env::current_dir().map_err(ConfigError::CurrentDir),
    }
}

/// Lexically normalize a path, dropping `.` and folding `..`.
///
/// The path is not required to exist, so symlinks are left alone.
pub(super) fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => cleaned.push(component),
            },
            other => cleaned.push(other),
        }
    }
    cleaned
}
