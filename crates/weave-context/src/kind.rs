use serde::{Deserialize, Serialize};

/// Where a value on a scope came from. Ordered lowest-to-highest
/// precedence: a `put` with a lower kind never overwrites a value
/// already set with a higher one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Default,
    Presets,
    Local,
    User,
    External,
}

/// Visibility of a scope: whether it can be reached from outside its own
/// subtree while resolving a plain name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Visibility {
    #[default]
    Unset,
    Global,
    Local,
}
