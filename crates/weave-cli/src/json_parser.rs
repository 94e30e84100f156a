//! A `ScriptParser` that reads a script as JSON — the serialized form of
//! `weave_ast::Node` itself. `weave-loader` deliberately has no opinion
//! on script syntax (`spec.md` §1 scopes the XML-style concrete grammar
//! out of the core entirely); this is the one concrete format weave-cli
//! ships, chosen over hand-rolling an XML dialect because `Node`/`Kind`
//! already derive `serde::{Serialize, Deserialize}` for exactly this
//! purpose.
//!
//! Authors may omit `attrs`, `children`, `raw`, and `site` on any node —
//! they default to empty/`None`/a placeholder. `site.path` is always
//! overwritten with the script's real canonical path after parsing, so
//! authors never need to get it right by hand; `site.line` is preserved
//! as authored (defaulting to `0`) since JSON carries no document line
//! number a generic deserializer could recover on its own.

use weave_ast::{Node, Site};
use weave_loader::{CanonicalPath, ParseError};

pub struct JsonScriptParser;

impl weave_loader::ScriptParser for JsonScriptParser {
    fn parse(&self, source: &str, path: &CanonicalPath) -> Result<Node, ParseError> {
        let mut root: Node = serde_json::from_str(source).map_err(|e| ParseError {
            path: path.to_string(),
            line: e.line() as u32,
            message: e.to_string(),
        })?;
        fixup_paths(&mut root, path);
        Ok(root)
    }
}

fn fixup_paths(node: &mut Node, path: &CanonicalPath) {
    node.site = Site::new(path.as_arc_str(), node.site.line);
    for child in &mut node.children {
        fixup_paths(child, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ast::Kind;
    use weave_loader::ScriptParser;

    #[test]
    fn parses_a_minimal_script_and_stamps_every_site_path() {
        let source = r#"{
            "kind": "Script",
            "children": [
                { "kind": "Step", "attrs": { "id": "welcome" } }
            ]
        }"#;
        let path = CanonicalPath::new("/archetype/main.json");
        let root = JsonScriptParser.parse(source, &path).unwrap();

        assert_eq!(root.kind, Kind::Script);
        assert_eq!(root.site.path.as_ref(), "/archetype/main.json");
        assert_eq!(root.children[0].site.path.as_ref(), "/archetype/main.json");
    }

    #[test]
    fn malformed_json_surfaces_as_a_parse_error() {
        let path = CanonicalPath::new("/archetype/broken.json");
        let err = JsonScriptParser.parse("{ not json", &path).unwrap_err();
        assert_eq!(err.path, "/archetype/broken.json");
    }
}
