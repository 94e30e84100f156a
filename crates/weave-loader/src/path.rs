use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A script path that has already been resolved against the current
/// directory stack, used both as the cache key and as the `path` field
/// on every AST node's `Site`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPath(PathBuf);

impl CanonicalPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Directory this script lives in, used to push a new entry onto the
    /// cwd stack while resolving a nested `source`/`exec`.
    pub fn parent_dir(&self) -> &Path {
        self.0.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn as_arc_str(&self) -> Arc<str> {
        Arc::from(self.0.to_string_lossy().into_owned())
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
