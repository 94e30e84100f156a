use thiserror::Error;

/// Mirrors the single `InvalidPathError` the context API raises for any
/// malformed-key or out-of-tree condition, including writing two
/// conflicting `External` values to the same scope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("invalid path '{key}': {reason}")]
    InvalidPath { key: String, reason: String },
    #[error("popped past the root scope")]
    PopUnderflow,
}

impl ContextError {
    pub fn invalid_key(key: impl Into<String>) -> Self {
        ContextError::InvalidPath {
            key: key.into(),
            reason: "segments must match [a-z0-9][a-z0-9-]*".to_string(),
        }
    }

    pub fn relative_at_root(key: impl Into<String>) -> Self {
        let key = key.into();
        ContextError::InvalidPath {
            reason: format!("'.{key}' is illegal at the root scope"),
            key,
        }
    }

    pub fn external_conflict(key: impl Into<String>) -> Self {
        let key = key.into();
        ContextError::InvalidPath {
            reason: "conflicts with a value already bound as External".to_string(),
            key,
        }
    }
}
