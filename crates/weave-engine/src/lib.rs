//! Script invocation, input resolution, template model/render pipeline,
//! and the input-tree variation combinator built on top of
//! `weave-ast`/`weave-loader`/`weave-context`/`weave-value`.

mod compile;
mod condition;
mod error;
mod inputtree;
mod invoker;
mod model;
mod render;
mod resolver;

pub use compile::{compile, CompileMode, CompileResult, ValidationError};
pub use error::{EngineError, InvocationError};
pub use inputtree::{build as build_input_tree, variations, InputDecl, InputTree, NodeIndex};
pub use invoker::{Invoker, NoopVisitor, VisitResult, Visitor};
pub use model::{ModelNode, TemplateModel};
pub use render::render;
pub use resolver::{PromptKind, Prompter};
