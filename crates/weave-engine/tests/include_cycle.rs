//! E5: entry `a.xml` sources `b.xml` which execs `a.xml` back — a cycle
//! that must surface naming both the site the cycle started at and the
//! site it was re-entered from.

use std::collections::HashMap;
use std::sync::Arc;
use weave_ast::{Kind, Node, Script, Site};
use weave_context::Context;
use weave_engine::{EngineError, Invoker, NoopVisitor};
use weave_loader::{CanonicalPath, LoadError, Loader, ParseError, ScriptArchive, ScriptParser};

/// An in-memory archive/parser pair keyed by logical path, so a test can
/// build a small multi-file script tree without touching the filesystem.
struct MapArchive(HashMap<String, Node>);

impl ScriptArchive for MapArchive {
    fn resolve(&self, logical_path: &str) -> Result<CanonicalPath, LoadError> {
        if self.0.contains_key(logical_path) {
            Ok(CanonicalPath::new(logical_path))
        } else {
            Err(LoadError::Resolve {
                logical_path: logical_path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such script"),
            })
        }
    }

    fn read(&self, path: &CanonicalPath) -> Result<String, LoadError> {
        Ok(path.as_path().to_string_lossy().into_owned())
    }
}

struct MapParser(HashMap<String, Node>);

impl ScriptParser for MapParser {
    fn parse(&self, source: &str, path: &CanonicalPath) -> Result<Node, ParseError> {
        self.0.get(source).cloned().ok_or_else(|| ParseError {
            path: path.to_string(),
            line: 0,
            message: format!("no fixture script for '{source}'"),
        })
    }
}

fn site(path: &str) -> Site {
    Site::new(path, 1)
}

#[test]
fn source_then_exec_back_into_the_entry_is_an_include_cycle_naming_both_sites() {
    let a_root = Node::new(Kind::Script, site("a.xml")).with_child(
        Node::new(Kind::InvokeSource, site("a.xml")).with_attr("src", "b.xml"),
    );
    let b_root = Node::new(Kind::Script, site("b.xml")).with_child(
        Node::new(Kind::InvokeExec, site("b.xml")).with_attr("src", "a.xml"),
    );

    let mut scripts = HashMap::new();
    scripts.insert("a.xml".to_string(), a_root.clone());
    scripts.insert("b.xml".to_string(), b_root);

    let archive = MapArchive(scripts.clone());
    let parser = MapParser(scripts);
    let mut loader = Loader::new(archive, parser);

    let script = Arc::new(Script::new("a.xml", a_root).unwrap());
    let mut invoker = Invoker::new(&mut loader);
    let mut ctx = Context::new();

    let err = invoker
        .invoke(&script, &script.root, &mut ctx, None, &mut NoopVisitor)
        .unwrap_err();

    // The re-entry is caught while walking b.xml's `exec` back into a.xml.
    assert_eq!(err.site.path.as_ref(), "b.xml");
    match err.source {
        EngineError::IncludeCycle { path, first_site } => {
            assert_eq!(path, "a.xml");
            assert_eq!(first_site.path.as_ref(), "a.xml");
        }
        other => panic!("expected IncludeCycle, got {other:?}"),
    }
}

#[test]
fn sourcing_the_same_non_active_path_twice_is_a_duplicate_include() {
    // a.xml sources b.xml twice as siblings: the first completes and is
    // popped from the active chain before the second is attempted, so
    // this is a duplicate rather than a cycle.
    let b_src = Node::new(Kind::InvokeSource, site("a.xml")).with_attr("src", "b.xml");
    let a_root = Node::new(Kind::Script, site("a.xml"))
        .with_child(b_src.clone())
        .with_child(b_src);
    let b_root = Node::new(Kind::Script, site("b.xml"));

    let mut scripts = HashMap::new();
    scripts.insert("a.xml".to_string(), a_root.clone());
    scripts.insert("b.xml".to_string(), b_root);

    let archive = MapArchive(scripts.clone());
    let parser = MapParser(scripts);
    let mut loader = Loader::new(archive, parser);

    let script = Arc::new(Script::new("a.xml", a_root).unwrap());
    let mut invoker = Invoker::new(&mut loader);
    let mut ctx = Context::new();

    let err = invoker
        .invoke(&script, &script.root, &mut ctx, None, &mut NoopVisitor)
        .unwrap_err();

    assert!(matches!(err.source, EngineError::DuplicateInclude { ref path } if path == "b.xml"));
}
