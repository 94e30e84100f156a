use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a node was declared: the canonical script path plus a 1-based
/// line number. Carried on every node for diagnostics (`spec.md` §4.2).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Site {
    pub path: Arc<str>,
    pub line: u32,
}

impl Site {
    pub fn new(path: impl Into<Arc<str>>, line: u32) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::new("", 0)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}
