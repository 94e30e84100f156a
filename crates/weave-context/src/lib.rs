//! Hierarchical scoped context: the live working memory a script invoker
//! threads through an AST walk.
//!
//! Scopes form a tree with a single root. Reads and writes go through
//! `Context`, which also owns the active scope stack (`push`/`pop`) and
//! the separate cwd stack used to resolve relative `source`/`exec`
//! paths. No node stores a parent pointer — ancestor-relative
//! resolution (`..`, the plain-name search) walks the stack instead.

mod context;
mod error;
mod key;
mod kind;
mod scope;
mod substitute;

pub use context::Context;
pub use error::ContextError;
pub use kind::{ValueKind, Visibility};
pub use scope::{ScopeHandle, ScopeNode, ScopeValue};
pub use substitute::substitute;
