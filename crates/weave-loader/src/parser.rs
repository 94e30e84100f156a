use crate::error::ParseError;
use crate::path::CanonicalPath;
use weave_ast::Node;

/// The explicit boundary between this workspace and whatever concrete
/// script-document grammar an embedder chooses. `weave-loader` has no
/// opinion on the wire format; it only asks for an AST back.
pub trait ScriptParser {
    fn parse(&self, source: &str, path: &CanonicalPath) -> Result<Node, ParseError>;
}
