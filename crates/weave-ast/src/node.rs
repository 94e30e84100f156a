use crate::kind::Kind;
use crate::site::Site;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weave_value::Value;

/// A single element of a parsed script.
///
/// Nodes carry no parent pointer. Ancestry, when it matters (condition
/// inheritance, `..`/`~` key resolution), is reconstructed from the
/// explicit stack a traversal keeps as it walks down from the root —
/// see `weave-engine`'s invoker. This keeps the tree cheaply shareable:
/// a cached script's `Node`s can be cloned into many concurrent
/// generation runs without any back-reference to fix up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: Kind,
    #[serde(default)]
    pub attrs: IndexMap<String, Value>,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub raw: Option<Value>,
    #[serde(default)]
    pub site: Site,
}

impl Node {
    pub fn new(kind: Kind, site: Site) -> Self {
        Self {
            kind,
            attrs: IndexMap::new(),
            children: Vec::new(),
            raw: None,
            site,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn attr_str(&self, name: &str) -> Option<&str> {
        match self.attrs.get(name) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        self.attrs.get(name).and_then(|v| v.as_bool().ok())
    }

    pub fn attr_int(&self, name: &str) -> Option<i64> {
        self.attrs.get(name).and_then(|v| v.as_int().ok())
    }

    /// The raw (unparsed) source of this node's `if` guard, when present.
    /// `weave-engine`'s invoker is responsible for parsing and evaluating
    /// it; the AST only remembers where it came from.
    pub fn condition_source(&self) -> Option<&str> {
        self.attr_str("if")
    }

    pub fn children_of_kind(&self, kind: Kind) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(move |c| c.kind == kind)
    }
}
