use crate::kind::{ValueKind, Visibility};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use weave_value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeValue {
    pub value: Value,
    pub kind: ValueKind,
}

/// A node in the scope tree, reference-counted so that copy-on-write
/// forking can share every subtree untouched by a given write and only
/// allocate fresh nodes on the path from the root down to the scope
/// actually written to.
pub type ScopeHandle = Rc<RefCell<ScopeNode>>;

#[derive(Debug)]
pub struct ScopeNode {
    pub id: String,
    pub visibility: Visibility,
    pub value: Option<ScopeValue>,
    pub children: IndexMap<String, ScopeHandle>,
}

impl ScopeNode {
    pub fn new_root() -> ScopeHandle {
        Rc::new(RefCell::new(ScopeNode {
            id: "~".to_string(),
            visibility: Visibility::Unset,
            value: None,
            children: IndexMap::new(),
        }))
    }

    /// Applies a `put` with kind precedence: a lower-precedence write
    /// against an existing higher-precedence value is silently dropped.
    /// Two `External` writes to the same scope are a fatal conflict —
    /// the caller checks for that case itself before calling this, since
    /// it needs the key to report.
    ///
    /// On a `Global` scope a tie is broken in favor of the existing
    /// value rather than the incoming one — "Global specialization"
    /// coalesces same-id Global scopes declared in different branches of
    /// the tree onto one node, and the earliest binding must win.
    pub fn put(&mut self, value: Value, kind: ValueKind) {
        let keep_existing = match (&self.value, self.visibility) {
            (Some(existing), Visibility::Global) => kind <= existing.kind,
            (Some(existing), _) => kind < existing.kind,
            (None, _) => false,
        };
        if !keep_existing {
            self.value = Some(ScopeValue { value, kind });
        }
    }
}

/// Rebuilds the chain from `node` down through `path` (a list of plain
/// child ids, root-relative), cloning every node on that chain into a
/// fresh `Rc` and leaving every untouched sibling subtree shared. This
/// is the one place the tree is ever copy-on-write forked; every other
/// mutation happens on a node this function has just freshly allocated,
/// so it is safe to mutate it through a plain `borrow_mut()`.
pub fn fork_path(node: &ScopeHandle, path: &[String], visibility: Visibility) -> ScopeHandle {
    let inner = node.borrow();
    if path.is_empty() {
        return Rc::new(RefCell::new(ScopeNode {
            id: inner.id.clone(),
            visibility: inner.visibility,
            value: inner.value.clone(),
            children: inner.children.clone(),
        }));
    }

    let head = &path[0];
    let existing = inner.children.get(head).cloned();
    let id = inner.id.clone();
    let own_visibility = inner.visibility;
    let value = inner.value.clone();
    let mut children = inner.children.clone();
    drop(inner);

    let new_child = match existing {
        Some(child) => fork_path(&child, &path[1..], visibility),
        None => build_chain(head, &path[1..], visibility),
    };
    children.insert(head.clone(), new_child);

    Rc::new(RefCell::new(ScopeNode {
        id,
        visibility: own_visibility,
        value,
        children,
    }))
}

fn build_chain(head: &str, rest: &[String], visibility: Visibility) -> ScopeHandle {
    let mut children = IndexMap::new();
    if let Some((next_head, next_rest)) = rest.split_first() {
        children.insert(
            next_head.clone(),
            build_chain(next_head, next_rest, visibility),
        );
    }
    Rc::new(RefCell::new(ScopeNode {
        id: head.to_string(),
        visibility,
        value: None,
        children,
    }))
}

/// Plain (non-forking) descent used once a `fork_path` call has just
/// guaranteed every scope on `path` exists under `node`.
pub fn descend(node: &ScopeHandle, path: &[String]) -> ScopeHandle {
    let mut cursor = node.clone();
    for segment in path {
        let next = cursor.borrow().children.get(segment).cloned();
        cursor = next.expect("fork_path guarantees this chain exists");
    }
    cursor
}

/// Like `descend`, but returns every intermediate scope along the way —
/// used to rebuild the active scope stack after a root replacement.
pub fn descend_each(node: &ScopeHandle, path: &[String]) -> Vec<ScopeHandle> {
    let mut out = Vec::with_capacity(path.len());
    let mut cursor = node.clone();
    for segment in path {
        cursor = cursor
            .borrow()
            .children
            .get(segment)
            .cloned()
            .expect("fork_path guarantees this chain exists");
        out.push(cursor.clone());
    }
    out
}
