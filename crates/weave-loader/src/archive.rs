use crate::error::LoadError;
use crate::path::CanonicalPath;

/// Where scripts come from. Kept separate from `ScriptParser` so a test
/// can swap in an in-memory archive while reusing a production parser,
/// or vice versa.
pub trait ScriptArchive {
    /// Resolves a logical path — as written in a `source`/`exec` attribute,
    /// possibly relative to the current directory stack — to the
    /// canonical path that identifies it uniquely for caching.
    fn resolve(&self, logical_path: &str) -> Result<CanonicalPath, LoadError>;

    /// Reads the raw source text at an already-resolved path.
    fn read(&self, path: &CanonicalPath) -> Result<String, LoadError>;
}
