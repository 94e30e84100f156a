use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AstError {
    #[error("method '{name}' is declared more than once in {path}")]
    DuplicateMethod { path: String, name: String },
    #[error("method declaration at {path} is missing a 'name' attribute")]
    UnnamedMethod { path: String },
}
