use crate::value::ValueError;
use thiserror::Error;

/// All ways expression parsing and evaluation can fail (`spec.md` §7).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("malformed expression at offset {offset} near '{fragment}': {reason}")]
    Format {
        fragment: String,
        offset: usize,
        reason: String,
    },
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("unresolved variable '${{{name}}}'")]
    UnresolvedVariable { name: String },
    #[error(
        "expression has too many free variables to reduce ({found} > {max})"
    )]
    TooManyVariables { found: usize, max: usize },
}
