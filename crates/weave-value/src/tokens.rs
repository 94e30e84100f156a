//! Tokens for the boolean/relational expression language (`spec.md` §3/§4.1).

use std::fmt;

/// Byte offset into the source fragment being tokenized. Expressions are
/// short (they live inside a single XML attribute), so a single offset is
/// enough context for diagnostics — no line/column tracking is needed.
pub type Offset = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    BoolLit(bool),
    IntLit(i64),
    StringLit(String),
    ListLit(Vec<String>),
    /// `${name}` — the only form a variable reference takes.
    Var(String),

    Or,
    And,
    Not,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Contains,
    SizeOf,

    /// Bare `list`/`string`/`int` keyword, only meaningful as `(list)` etc.
    KwList,
    KwString,
    KwInt,

    LParen,
    RParen,
    Comma,
    LBracket,
    RBracket,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::BoolLit(b) => write!(f, "{b}"),
            TokenKind::IntLit(i) => write!(f, "{i}"),
            TokenKind::StringLit(s) => write!(f, "'{s}'"),
            TokenKind::ListLit(_) => write!(f, "list literal"),
            TokenKind::Var(name) => write!(f, "${{{name}}}"),
            TokenKind::Or => write!(f, "||"),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Not => write!(f, "!"),
            TokenKind::Eq => write!(f, "=="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::Contains => write!(f, "contains"),
            TokenKind::SizeOf => write!(f, "sizeof"),
            TokenKind::KwList => write!(f, "list"),
            TokenKind::KwString => write!(f, "string"),
            TokenKind::KwInt => write!(f, "int"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::Eof => write!(f, "<eof>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: Offset,
}

impl Token {
    pub fn new(kind: TokenKind, offset: Offset) -> Self {
        Self { kind, offset }
    }
}
