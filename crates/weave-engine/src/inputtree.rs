//! The input tree and variation combinator (`spec.md` §4.8): builds a
//! tree of declared inputs from a script's entry point and enumerates
//! every admissible combination of answers.
//!
//! `variations` performs the enumeration as a straightforward recursive
//! cartesian product rather than a literal manual odometer counter —
//! the two produce the same combination set and order (declaration
//! order, nested inputs expanded under the option that reveals them);
//! `NodeIndex` is kept as the spec's own vocabulary for a single input's
//! position within its domain, used when reporting progress rather than
//! to drive enumeration itself.

use crate::error::EngineError;
use indexmap::IndexMap;
use std::collections::HashMap;
use weave_ast::{Kind, Node};
use weave_value::{Expression, Value};

/// Position of one input within the (possibly pruned) domain of string
/// values it can take. `next()` advances the index and reports whether
/// doing so wrapped back to the start of the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeIndex {
    pub size: usize,
    pub current: usize,
}

impl NodeIndex {
    pub fn new(size: usize) -> Self {
        Self { size, current: 0 }
    }

    pub fn next(&mut self) -> bool {
        if self.size == 0 {
            return true;
        }
        self.current += 1;
        if self.current >= self.size {
            self.current = 0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputDecl {
    pub id: String,
    pub kind: Kind,
    pub domain: Vec<String>,
    /// Nested inputs revealed once a given domain value is chosen, for
    /// enum/list inputs only — `spec.md`'s per-`option` nested inputs.
    pub options: IndexMap<String, Vec<InputDecl>>,
    pub optional: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InputTree {
    pub root: Vec<InputDecl>,
}

/// Builds an `InputTree` from `entry`, pruning each input's domain
/// against any matching external value/default and any matching preset
/// found anywhere in the script (`presets` narrow a domain to the one
/// value they force, per `spec.md` §4.6/§4.8).
pub fn build(entry: &Node) -> InputTree {
    let presets = collect_presets(entry);
    InputTree {
        root: build_inputs(entry, &presets),
    }
}

fn collect_presets(node: &Node) -> HashMap<String, Value> {
    let mut out = HashMap::new();
    collect_presets_into(node, &mut out);
    out
}

fn collect_presets_into(node: &Node, out: &mut HashMap<String, Value>) {
    if node.kind.is_preset() {
        let id = node.attr_str("id").unwrap_or_default().to_string();
        let value = node.raw.clone().or_else(|| node.attr("value").cloned()).unwrap_or(Value::Empty);
        out.insert(id, value);
    }
    for child in &node.children {
        collect_presets_into(child, out);
    }
}

fn build_inputs(node: &Node, presets: &HashMap<String, Value>) -> Vec<InputDecl> {
    let mut out = Vec::new();
    for child in &node.children {
        if child.kind.is_input() {
            out.push(build_input(child, presets));
        } else {
            out.extend(build_inputs(child, presets));
        }
    }
    out
}

fn declared_domain(node: &Node) -> Vec<String> {
    match node.kind {
        Kind::InputBool => vec!["true".to_string(), "false".to_string()],
        Kind::InputEnum | Kind::InputList => node
            .children_of_kind(Kind::Option)
            .filter_map(|o| o.attr_str("value").map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn build_input(node: &Node, presets: &HashMap<String, Value>) -> InputDecl {
    let id = node.attr_str("id").unwrap_or_default().to_string();
    let optional = node.attr_bool("optional").unwrap_or(false);
    let mut domain = declared_domain(node);

    if let Some(forced) = presets.get(&id) {
        let forced = forced.as_string();
        let pruned: Vec<String> = domain.iter().filter(|d| d.eq_ignore_ascii_case(&forced)).cloned().collect();
        domain = if pruned.is_empty() { vec![forced] } else { pruned };
    }

    let mut options = IndexMap::new();
    if matches!(node.kind, Kind::InputEnum | Kind::InputList) {
        for option in node.children_of_kind(Kind::Option) {
            let value = option.attr_str("value").unwrap_or_default().to_string();
            if domain.iter().any(|d| d.eq_ignore_ascii_case(&value)) {
                options.insert(value, build_inputs(option, presets));
            }
        }
    }

    InputDecl { id, kind: node.kind, domain, options, optional }
}

/// The values one input can be bound to for enumeration purposes: a
/// bool/enum takes one value from its domain at a time; a list takes
/// every subset of its domain plus the empty set (the "default"
/// no-selection), joined with `,` to match `Value::as_string`.
fn domain_values(decl: &InputDecl) -> Vec<String> {
    if decl.kind != Kind::InputList {
        return decl.domain.clone();
    }
    let n = decl.domain.len();
    if n == 0 || n > 20 {
        return vec![String::new()];
    }
    let mut out = Vec::with_capacity(1 << n);
    for mask in 0..(1u32 << n) {
        let subset: Vec<String> = decl
            .domain
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, v)| v.clone())
            .collect();
        out.push(subset.join(","));
    }
    out
}

/// Enumerates every combination of inputs reachable from `tree`,
/// excluding any combination where a filter's `reduce` evaluates to
/// `true` against it.
pub fn variations(
    tree: &InputTree,
    filters: &[Expression],
) -> Result<Vec<IndexMap<String, String>>, EngineError> {
    let mut out = Vec::new();
    let mut assignment = IndexMap::new();
    enumerate(&tree.root, &mut assignment, &mut out, filters)?;
    Ok(out)
}

fn enumerate(
    decls: &[InputDecl],
    assignment: &mut IndexMap<String, String>,
    out: &mut Vec<IndexMap<String, String>>,
    filters: &[Expression],
) -> Result<(), EngineError> {
    let Some((first, rest)) = decls.split_first() else {
        if !is_filtered(assignment, filters)? {
            out.push(assignment.clone());
        }
        return Ok(());
    };

    for domain_value in domain_values(first) {
        let nested = first.options.get(&domain_value).cloned().unwrap_or_default();
        assignment.insert(first.id.clone(), domain_value);
        let mut combined = nested;
        combined.extend_from_slice(rest);
        enumerate(&combined, assignment, out, filters)?;
        assignment.shift_remove(&first.id);
    }
    Ok(())
}

fn is_filtered(
    assignment: &IndexMap<String, String>,
    filters: &[Expression],
) -> Result<bool, EngineError> {
    for filter in filters {
        let lookup = |name: &str| assignment.get(name).map(|v| Value::String(v.clone()));
        if matches!(filter.eval(&lookup), Ok(Value::Bool(true))) {
            return Ok(true);
        }
    }
    Ok(false)
}
