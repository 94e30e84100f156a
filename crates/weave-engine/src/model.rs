use crate::error::EngineError;
use indexmap::IndexMap;
use std::cmp::Reverse;
use weave_ast::{Kind, Node};
use weave_value::Value;

/// A node of the merged template model tree. `order` and `override_`
/// are merge-time metadata kept alongside the resolved shape so a later
/// fragment arriving for the same key can be compared against it.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelNode {
    Value {
        value: Value,
        order: i64,
        override_: bool,
    },
    List {
        items: Vec<ModelNode>,
        order: i64,
    },
    Map {
        entries: IndexMap<String, ModelNode>,
        order: i64,
    },
}

impl ModelNode {
    fn order(&self) -> i64 {
        match self {
            ModelNode::Value { order, .. } => *order,
            ModelNode::List { order, .. } => *order,
            ModelNode::Map { order, .. } => *order,
        }
    }

    /// Builds a `ModelNode` from a `model.value`/`model.list`/`model.map`
    /// AST node. Does not resolve `${…}` substitution — that happens at
    /// render time against the active `Context`, not at merge time.
    pub fn from_ast(node: &Node) -> Result<ModelNode, EngineError> {
        let order = node.attr_int("order").unwrap_or(100);
        match node.kind {
            Kind::ModelValue => {
                let value = node.raw.clone().unwrap_or(Value::Empty);
                let override_ = node.attr_bool("override").unwrap_or(false);
                Ok(ModelNode::Value {
                    value,
                    order,
                    override_,
                })
            }
            Kind::ModelList => {
                let mut items = Vec::with_capacity(node.children.len());
                for child in &node.children {
                    items.push(ModelNode::from_ast(child)?);
                }
                Ok(ModelNode::List { items, order })
            }
            Kind::ModelMap => {
                let mut entries = IndexMap::new();
                for child in &node.children {
                    let key = child.attr_str("key").ok_or_else(|| EngineError::KeylessMapEntry {
                        key: format!("{}", child.site),
                    })?;
                    entries.insert(key.to_string(), ModelNode::from_ast(child)?);
                }
                Ok(ModelNode::Map { entries, order })
            }
            other => unreachable!("not a model node kind: {other}"),
        }
    }
}

/// Accumulates `modelValue`/`modelList`/`modelMap` fragments emitted
/// while a script is invoked into one merged tree.
#[derive(Debug, Default, Clone)]
pub struct TemplateModel {
    entries: IndexMap<String, ModelNode>,
}

impl TemplateModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one top-level `model` fragment from a `model.{value,list,map}`
    /// AST node. Every fragment needs a `key`; a keyless one is fatal.
    pub fn add(&mut self, node: &Node) -> Result<(), EngineError> {
        let key = node.attr_str("key").ok_or_else(|| EngineError::KeylessMapEntry {
            key: format!("{}", node.site),
        })?;
        let built = ModelNode::from_ast(node)?;
        merge_into(&mut self.entries, key, built)
    }

    pub fn get(&self, key: &str) -> Option<&ModelNode> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> &IndexMap<String, ModelNode> {
        &self.entries
    }
}

fn merge_into(
    entries: &mut IndexMap<String, ModelNode>,
    key: &str,
    incoming: ModelNode,
) -> Result<(), EngineError> {
    match entries.get_mut(key) {
        Some(existing) => merge_node(existing, incoming),
        None => {
            entries.insert(key.to_string(), incoming);
            Ok(())
        }
    }
}

fn merge_node(existing: &mut ModelNode, incoming: ModelNode) -> Result<(), EngineError> {
    match (existing, incoming) {
        (
            ModelNode::Value {
                value: ev,
                order: eo,
                override_: _,
            },
            ModelNode::Value {
                value: iv,
                order: io,
                override_: iovr,
            },
        ) => {
            if iovr || io < *eo {
                *ev = iv;
                *eo = io;
            }
            Ok(())
        }
        (ModelNode::List { items: e, .. }, ModelNode::List { items: inc, .. }) => {
            e.extend(inc);
            e.sort_by_key(|n| Reverse(n.order()));
            Ok(())
        }
        (ModelNode::Map { entries: e, .. }, ModelNode::Map { entries: inc, .. }) => {
            for (k, v) in inc {
                merge_into(e, &k, v)?;
            }
            Ok(())
        }
        (existing_slot, incoming) => {
            // Kinds disagree (e.g. a value re-declared as a list): the
            // later fragment wins outright, matching how a scalar
            // override replaces its predecessor above.
            *existing_slot = incoming;
            Ok(())
        }
    }
}
