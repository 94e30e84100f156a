use thiserror::Error;
use weave_ast::Site;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Expression(#[from] weave_value::ExpressionError),
    #[error(transparent)]
    Context(#[from] weave_context::ContextError),
    #[error(transparent)]
    Load(#[from] weave_loader::LoadError),
    #[error("'{value}' is not one of the declared options for input '{input}'")]
    InvalidInput { input: String, value: String },
    #[error("'{input}' failed validation {failing:?} on value {value:?}")]
    InputValidation {
        input: String,
        value: String,
        failing: Vec<String>,
    },
    #[error("no external value, default, or prompter available for input '{input}'")]
    UnresolvedInput { input: String },
    #[error("method '{name}' re-entered during its own call chain")]
    MethodCycle { name: String },
    #[error("'{path}' forms an include cycle — first entered at {first_site}")]
    IncludeCycle { path: String, first_site: Site },
    #[error("'{path}' is sourced more than once in the same invocation chain")]
    DuplicateInclude { path: String },
    #[error("undefined method '{name}'")]
    UndefinedMethod { name: String },
    #[error("a model entry for key '{key}' has no key but was added to a map")]
    KeylessMapEntry { key: String },
    #[error("'{name}' resolves to a list or map, not a scalar")]
    NotScalar { name: String },
    #[error("prompt for '{input}' was cancelled")]
    PromptCancelled { input: String },
}

/// Wraps any `EngineError` with the AST site it was raised at, matching
/// the one taxonomy entry (`InvocationError`) every other error surfaces
/// through during a traversal.
#[derive(Debug, Error)]
#[error("{site}: {source}")]
pub struct InvocationError {
    pub site: Site,
    #[source]
    pub source: EngineError,
}

impl InvocationError {
    pub fn new(site: Site, source: impl Into<EngineError>) -> Self {
        Self {
            site,
            source: source.into(),
        }
    }
}
