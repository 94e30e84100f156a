use crate::archive::ScriptArchive;
use crate::error::LoadError;
use crate::parser::ScriptParser;
use crate::path::CanonicalPath;
use std::collections::HashMap;
use std::sync::Arc;
use weave_ast::Script;

/// Loads scripts through an archive and parser pair, caching the result
/// by canonical path. Single generation run owns one `Loader` and walks
/// it from the main thread, so the cache is a plain `HashMap` rather
/// than anything lock-protected — concurrent variation exploration
/// (`weave-engine::inputtree`) clones the `Arc<Script>` out instead of
/// sharing the `Loader` itself.
pub struct Loader<A: ScriptArchive, P: ScriptParser> {
    archive: A,
    parser: P,
    cache: HashMap<CanonicalPath, Arc<Script>>,
}

impl<A: ScriptArchive, P: ScriptParser> Loader<A, P> {
    pub fn new(archive: A, parser: P) -> Self {
        Self {
            archive,
            parser,
            cache: HashMap::new(),
        }
    }

    /// Resolves `logical_path` to its canonical path without loading it,
    /// used by callers that need the path itself (e.g. to push a cwd
    /// scope, or to detect a duplicate `source` in a call chain).
    pub fn resolve(&self, logical_path: &str) -> Result<CanonicalPath, LoadError> {
        self.archive.resolve(logical_path)
    }

    /// Resolves and parses `logical_path`, reusing a cached `Script` when
    /// one is already loaded for the same canonical path. Returns the
    /// canonical path alongside the script.
    pub fn load(&mut self, logical_path: &str) -> Result<(CanonicalPath, Arc<Script>), LoadError> {
        let canonical = self.archive.resolve(logical_path)?;
        if let Some(script) = self.cache.get(&canonical) {
            return Ok((canonical, script.clone()));
        }

        let source = self.archive.read(&canonical)?;
        let root = self.parser.parse(&source, &canonical)?;
        let script = Arc::new(Script::new(canonical.as_arc_str(), root)?);
        self.cache.insert(canonical.clone(), script.clone());
        Ok((canonical, script))
    }

    pub fn cached(&self, path: &CanonicalPath) -> Option<&Arc<Script>> {
        self.cache.get(path)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use std::cell::Cell;
    use weave_ast::{Kind, Node, Site};

    struct FixtureArchive {
        reads: Cell<u32>,
    }

    impl ScriptArchive for FixtureArchive {
        fn resolve(&self, logical_path: &str) -> Result<CanonicalPath, LoadError> {
            Ok(CanonicalPath::new(format!("/scripts/{logical_path}")))
        }

        fn read(&self, _path: &CanonicalPath) -> Result<String, LoadError> {
            self.reads.set(self.reads.get() + 1);
            Ok("<script/>".to_string())
        }
    }

    struct FixtureParser;

    impl ScriptParser for FixtureParser {
        fn parse(&self, _source: &str, path: &CanonicalPath) -> Result<Node, ParseError> {
            Ok(Node::new(Kind::Script, Site::new(path.as_arc_str(), 1)))
        }
    }

    #[test]
    fn repeated_loads_of_the_same_path_hit_the_cache() {
        let archive = FixtureArchive { reads: Cell::new(0) };
        let mut loader = Loader::new(archive, FixtureParser);

        let (_, first) = loader.load("main.xml").unwrap();
        let (_, second) = loader.load("main.xml").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.archive.reads.get(), 1);
    }

    #[test]
    fn distinct_paths_are_cached_separately() {
        let archive = FixtureArchive { reads: Cell::new(0) };
        let mut loader = Loader::new(archive, FixtureParser);

        loader.load("a.xml").unwrap();
        loader.load("b.xml").unwrap();

        assert_eq!(loader.len(), 2);
    }
}
