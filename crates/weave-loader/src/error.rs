use crate::path::CanonicalPath;
use thiserror::Error;

/// Raised by a `ScriptParser` implementation. The loader treats this as
/// opaque and only wraps it — it never inspects the XML-level detail
/// itself, since it has no opinion on what the source grammar looks like.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{path}:{line}: {message}")]
pub struct ParseError {
    pub path: String,
    pub line: u32,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not resolve '{logical_path}': {source}")]
    Resolve {
        logical_path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read {path}: {source}")]
    Read {
        path: CanonicalPath,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Ast(#[from] weave_ast::AstError),
}
