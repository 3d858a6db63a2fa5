//! Fixed ignore patterns for the watch session.
//!
//! These cover the tool's own write-backs and incidental build output so
//! a rebuild never retriggers itself: build artifacts, version-control
//! internals, editor metadata, virtual environments, and test or
//! type-checker caches.

use std::path::Path;

/// Directory names excluded from watching, matched per path component.
const IGNORED_DIRS: &[&str] = &[
    "__pycache__",
    ".ipynb_checkpoints",
    ".vscode",
    ".idea",
    ".git",
    "venv",
    "env",
    ".env",
    ".pytest_cache",
    ".mypy_cache",
    ".eggs",
    "dist",
    "build",
    "target",
];

/// File extensions excluded from watching (compiled/optimized modules).
const IGNORED_EXTENSIONS: &[&str] = &["pyc", "pyo", "pyd"];

/// Filter that decides whether an event path is worth considering.
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchFilter;

impl WatchFilter {
    /// Create the fixed filter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check whether `path` should be ignored.
    #[must_use]
    pub fn is_ignored(&self, path: &Path) -> bool {
        for component in path.components() {
            let Some(name) = component.as_os_str().to_str() else {
                continue;
            };
            if IGNORED_DIRS.contains(&name) || name.ends_with(".egg-info") {
                return true;
            }
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| IGNORED_EXTENSIONS.contains(&ext))
    }
}
