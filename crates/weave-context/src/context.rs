use crate::error::ContextError;
use crate::key::{parse_key, Segment};
use crate::kind::{ValueKind, Visibility};
use crate::scope::{descend, descend_each, fork_path, ScopeHandle, ScopeNode, ScopeValue};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use weave_value::Value;

/// The hierarchical, scoped context a script invoker walks alongside
/// the AST. Scope nodes are shared via `Rc`; writing to one forks only
/// the edges on the path from the root to the written scope, so two
/// `Context`s that diverge after a shared prefix still share everything
/// before the divergence at no extra cost.
#[derive(Clone)]
pub struct Context {
    root: ScopeHandle,
    /// The active scope path, root first. `stack.last()` is "the current
    /// scope"; `..` and `push`/`pop` operate on this, not on any parent
    /// pointer stored on the nodes themselves.
    stack: Vec<ScopeHandle>,
    cwd_stack: Vec<PathBuf>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        let root = ScopeNode::new_root();
        Self {
            stack: vec![root.clone()],
            root,
            cwd_stack: Vec::new(),
        }
    }

    pub fn scope(&self) -> ScopeHandle {
        self.stack.last().expect("stack is never empty").clone()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Resolves (creating lazily if needed) the scope named by `key`
    /// under the current scope, forking copy-on-write edges along the
    /// way, and pushes it onto the active scope stack. If `value` is
    /// given it is `put` onto the resulting scope.
    pub fn push(
        &mut self,
        key: &str,
        value: Option<(Value, ValueKind)>,
        visibility: Visibility,
    ) -> Result<(), ContextError> {
        let scope = self.get_or_create(key, visibility)?;
        if let Some((v, kind)) = value {
            self.put(&scope, v, kind)?;
        }
        self.stack.push(scope);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<(), ContextError> {
        if self.stack.len() <= 1 {
            return Err(ContextError::PopUnderflow);
        }
        self.stack.pop();
        Ok(())
    }

    pub fn push_cwd(&mut self, path: impl Into<PathBuf>) {
        self.cwd_stack.push(path.into());
    }

    pub fn pop_cwd(&mut self) -> Option<PathBuf> {
        self.cwd_stack.pop()
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd_stack.last().map(PathBuf::as_path)
    }

    /// Resolves `key` to a scope handle, creating any missing scope
    /// along the path. The entire chain from the root down to the
    /// target is forked (see `scope::fork_path`) so a `Context` cloned
    /// before this call keeps seeing the pre-write tree; `visibility`
    /// only takes effect on scopes created fresh by this call.
    ///
    /// A `Global` scope requested by its plain id is always placed as a
    /// direct child of the root, regardless of the current active path —
    /// "Global specialization": a Global declared deep in one branch of
    /// the tree and the same-id Global declared in a sibling branch must
    /// resolve to the one coalesced scope, not two independent ones.
    pub fn get_or_create(
        &mut self,
        key: &str,
        visibility: Visibility,
    ) -> Result<ScopeHandle, ContextError> {
        let segments = parse_key(key)?;
        let names = if visibility == Visibility::Global && crate::key::is_plain_name(key) {
            vec![key.to_string()]
        } else {
            let mut names = self.absolute_names(&segments);
            for segment in &segments {
                match segment {
                    Segment::Root => names.clear(),
                    Segment::Parent => {
                        names.pop();
                    }
                    Segment::Name(name) => names.push(name.clone()),
                }
            }
            names
        };

        let new_root = fork_path(&self.root, &names, visibility);
        let leaf = descend(&new_root, &names);
        self.rebase_stack(new_root);
        Ok(leaf)
    }

    /// Absolute, root-relative path of the current scope, as the chain
    /// of child ids the active stack was built from.
    fn current_path(&self) -> Vec<String> {
        self.stack
            .iter()
            .skip(1)
            .map(|s| s.borrow().id.clone())
            .collect()
    }

    fn absolute_names(&self, segments: &[Segment]) -> Vec<String> {
        if matches!(segments.first(), Some(Segment::Root)) {
            Vec::new()
        } else {
            self.current_path()
        }
    }

    /// Replaces `self.root` and re-resolves every frame already on the
    /// stack under it. `fork_path` never removes a child, so every
    /// previously existing id chain is guaranteed to still resolve.
    fn rebase_stack(&mut self, new_root: ScopeHandle) {
        let old_path = self.current_path();
        let new_stack_rest = descend_each(&new_root, &old_path);
        self.root = new_root.clone();
        self.stack = std::iter::once(new_root).chain(new_stack_rest).collect();
    }

    /// `put`, assuming `scope` was just obtained from `get_or_create` on
    /// this same `Context` (so it is exclusively owned by this tree).
    pub fn put(
        &mut self,
        scope: &ScopeHandle,
        value: Value,
        kind: ValueKind,
    ) -> Result<(), ContextError> {
        let key = scope.borrow().id.clone();
        let conflict = matches!(
            &scope.borrow().value,
            Some(existing) if existing.kind == ValueKind::External && kind == ValueKind::External
        );
        if conflict {
            return Err(ContextError::external_conflict(key));
        }
        scope.borrow_mut().put(value, kind);
        Ok(())
    }

    /// Resolves `key` to a value. A bare single-segment name runs the
    /// ancestor search (current scope's children, then each ancestor's
    /// children walking up to the root, nearest match wins); any other
    /// key (containing `~`, `..`, or dots) descends the path directly.
    pub fn get(&self, key: &str) -> Result<ScopeValue, ContextError> {
        if crate::key::is_plain_name(key) {
            return Ok(self.search_plain(key).unwrap_or(ScopeValue {
                value: Value::Empty,
                kind: ValueKind::Default,
            }));
        }

        let segments = parse_key(key)?;
        let mut trail = if matches!(segments.first(), Some(Segment::Root)) {
            vec![self.root.clone()]
        } else {
            self.stack.clone()
        };
        for segment in &segments {
            match segment {
                Segment::Root => trail = vec![self.root.clone()],
                Segment::Parent => {
                    if trail.len() > 1 {
                        trail.pop();
                    }
                }
                Segment::Name(name) => {
                    let parent = trail.last().unwrap().clone();
                    let child = parent.borrow().children.get(name).cloned();
                    match child {
                        Some(c) => trail.push(c),
                        None => {
                            return Ok(ScopeValue {
                                value: Value::Empty,
                                kind: ValueKind::Default,
                            })
                        }
                    }
                }
            }
        }
        let resolved = trail.last().unwrap().borrow().value.clone();
        Ok(resolved.unwrap_or(ScopeValue {
            value: Value::Empty,
            kind: ValueKind::Default,
        }))
    }

    fn search_plain(&self, name: &str) -> Option<ScopeValue> {
        for ancestor in self.stack.iter().rev() {
            if let Some(child) = ancestor.borrow().children.get(name) {
                if let Some(v) = &child.borrow().value {
                    return Some(v.clone());
                }
            }
        }
        None
    }

    /// Installs `map` as read-only `External` values, eagerly: every key
    /// is created (if needed) and `put` immediately.
    pub fn external_values(&mut self, map: &IndexMap<String, Value>) -> Result<(), ContextError> {
        for (key, value) in map {
            let scope = self.get_or_create(key, Visibility::Unset)?;
            self.put(&scope, value.clone(), ValueKind::External)?;
        }
        Ok(())
    }

    /// Installs `map` as lazy `Default` fallbacks: only scopes with no
    /// value yet are populated.
    pub fn external_defaults(&mut self, map: &IndexMap<String, Value>) -> Result<(), ContextError> {
        for (key, value) in map {
            let scope = self.get_or_create(key, Visibility::Unset)?;
            let has_value = scope.borrow().value.is_some();
            if !has_value {
                self.put(&scope, value.clone(), ValueKind::Default)?;
            }
        }
        Ok(())
    }

    /// Snapshot of every resolved value reachable from the root, keyed
    /// by its dotted path, rendered to its string projection.
    pub fn to_map(&self) -> IndexMap<String, String> {
        let mut out = IndexMap::new();
        collect(&self.root, String::new(), &mut out);
        out
    }

    /// Depth-first walk of every scope carrying a value, called with its
    /// dotted path and its `ScopeValue` as-is (no string projection).
    pub fn visit(&self, mut f: impl FnMut(&str, &ScopeValue)) {
        visit_scope(&self.root, String::new(), &mut f);
    }
}

fn visit_scope(scope: &ScopeHandle, prefix: String, f: &mut impl FnMut(&str, &ScopeValue)) {
    let inner = scope.borrow();
    if let Some(v) = &inner.value {
        if !prefix.is_empty() {
            f(&prefix, v);
        }
    }
    for (name, child) in &inner.children {
        let next = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        visit_scope(child, next, f);
    }
}


fn collect(scope: &ScopeHandle, prefix: String, out: &mut IndexMap<String, String>) {
    let inner = scope.borrow();
    if let Some(v) = &inner.value {
        if !prefix.is_empty() {
            out.insert(prefix.clone(), v.value.as_string());
        }
    }
    for (name, child) in &inner.children {
        let next = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        collect(child, next, out);
    }
}
