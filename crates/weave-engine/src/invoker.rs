//! The script invoker: a depth-first AST walk that gates subtrees on
//! `if` conditions, follows `source`/`exec`/`method`/`call` invocations,
//! pushes/pops scopes around inputs, applies presets and variables, and
//! accumulates the template model (`spec.md` §4.4).

use crate::condition;
use crate::error::{EngineError, InvocationError};
use crate::model::TemplateModel;
use crate::resolver::{self, Prompter};
use std::collections::HashSet;
use std::sync::Arc;
use weave_ast::{Kind, Node, Script, Site};
use weave_context::{Context, ValueKind, Visibility};
use weave_loader::{CanonicalPath, Loader, ScriptArchive, ScriptParser};

/// Early-exit signal a `Visitor` can return from a single node visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitResult {
    Continue,
    SkipChildren,
    SkipSiblings,
    Terminate,
}

/// Observes nodes as the invoker walks them. The default no-op visitor
/// is enough for pure model accumulation; a generator hooks in here to
/// receive `template`/`file`/`templates`/`files`/`transformation`/
/// `replace` events in declaration order.
pub trait Visitor {
    fn visit(&mut self, node: &Node, ctx: &Context) -> VisitResult;
}

pub struct NoopVisitor;

impl Visitor for NoopVisitor {
    fn visit(&mut self, _node: &Node, _ctx: &Context) -> VisitResult {
        VisitResult::Continue
    }
}

fn preset_kind(kind: Kind) -> Option<ValueKind> {
    if kind.is_preset() {
        Some(ValueKind::Presets)
    } else if kind.is_variable() {
        Some(ValueKind::Local)
    } else {
        None
    }
}

fn literal_of(node: &Node) -> weave_value::Value {
    use weave_value::Value;
    if let Some(raw) = &node.raw {
        return raw.clone();
    }
    match node.attr("value") {
        Some(v) => v.clone(),
        None => Value::Empty,
    }
}

/// Drives one invocation of a loaded script tree, threading a `Context`
/// and accumulating a `TemplateModel`. One `Invoker` corresponds to one
/// generation run; `active_methods`/`active_sources` track the call
/// chain so re-entrant `call`s and include cycles are caught.
/// `active_sources` pairs each canonical path currently on the chain
/// with the site it was first entered at, so a cycle back into it can
/// name both where it started and where the re-entry happened;
/// `sourced_once` remembers every canonical path ever entered during
/// this run (never popped) so a later non-cyclic re-inclusion of the
/// same path is still caught, as a duplicate rather than a cycle.
pub struct Invoker<'a, A: ScriptArchive, P: ScriptParser> {
    loader: &'a mut Loader<A, P>,
    model: TemplateModel,
    active_methods: Vec<String>,
    active_sources: Vec<(CanonicalPath, Site)>,
    sourced_once: HashSet<CanonicalPath>,
}

impl<'a, A: ScriptArchive, P: ScriptParser> Invoker<'a, A, P> {
    pub fn new(loader: &'a mut Loader<A, P>) -> Self {
        Self {
            loader,
            model: TemplateModel::new(),
            active_methods: Vec::new(),
            active_sources: Vec::new(),
            sourced_once: HashSet::new(),
        }
    }

    pub fn model(&self) -> &TemplateModel {
        &self.model
    }

    pub fn into_model(self) -> TemplateModel {
        self.model
    }

    /// Walks `node` and its subtree under `script`, threading `ctx`.
    pub fn invoke(
        &mut self,
        script: &Arc<Script>,
        node: &Node,
        ctx: &mut Context,
        prompter: Option<&mut dyn Prompter>,
        visitor: &mut dyn Visitor,
    ) -> Result<VisitResult, InvocationError> {
        if let Some(source) = node.condition_source() {
            let passes = condition::evaluate(source, ctx)
                .map_err(|e| InvocationError::new(node.site.clone(), e))?;
            if !passes {
                return Ok(VisitResult::SkipChildren);
            }
        }

        match visitor.visit(node, ctx) {
            VisitResult::Continue => {}
            other => return Ok(other),
        }

        match node.kind {
            Kind::Script => {
                return self
                    .invoke_script_root(script, node, ctx, prompter, visitor)
                    .map(|_| VisitResult::Continue);
            }
            Kind::InvokeMethod => return Ok(VisitResult::SkipChildren),
            Kind::InvokeSource | Kind::InvokeExec => {
                self.invoke_include(script, node, ctx, prompter, visitor)?;
                return Ok(VisitResult::Continue);
            }
            Kind::InvokeCall => {
                self.invoke_call(script, node, ctx, prompter, visitor)?;
                return Ok(VisitResult::Continue);
            }
            kind if kind.is_input() => {
                return self.invoke_input(script, node, ctx, prompter, visitor);
            }
            kind if kind.is_model() => {
                self.model
                    .add(node)
                    .map_err(|e| InvocationError::new(node.site.clone(), e))?;
                return Ok(VisitResult::Continue);
            }
            kind => {
                if let Some(value_kind) = preset_kind(kind) {
                    let id = node.attr_str("id").unwrap_or_default().to_string();
                    let value = literal_of(node);
                    let scope = ctx
                        .get_or_create(&id, Visibility::Unset)
                        .map_err(|e| InvocationError::new(node.site.clone(), e))?;
                    ctx.put(&scope, value, value_kind)
                        .map_err(|e| InvocationError::new(node.site.clone(), e))?;
                    return Ok(VisitResult::Continue);
                }
            }
        }

        self.visit_children(script, node, ctx, prompter, visitor)
    }

    fn visit_children(
        &mut self,
        script: &Arc<Script>,
        node: &Node,
        ctx: &mut Context,
        mut prompter: Option<&mut dyn Prompter>,
        visitor: &mut dyn Visitor,
    ) -> Result<VisitResult, InvocationError> {
        for child in &node.children {
            match self.invoke(script, child, ctx, prompter.as_deref_mut(), visitor)? {
                VisitResult::Continue | VisitResult::SkipChildren => {}
                VisitResult::SkipSiblings => break,
                VisitResult::Terminate => return Ok(VisitResult::Terminate),
            }
        }
        Ok(VisitResult::Continue)
    }

    fn invoke_input(
        &mut self,
        script: &Arc<Script>,
        node: &Node,
        ctx: &mut Context,
        mut prompter: Option<&mut dyn Prompter>,
        visitor: &mut dyn Visitor,
    ) -> Result<VisitResult, InvocationError> {
        let id = node.attr_str("id").unwrap_or_default().to_string();
        let visibility = if node.attr_bool("global").unwrap_or(false) {
            Visibility::Global
        } else {
            Visibility::Local
        };

        ctx.push(&id, None, visibility)
            .map_err(|e| InvocationError::new(node.site.clone(), e))?;
        let current = ctx.scope().borrow().value.clone();

        let result = (|| -> Result<VisitResult, EngineError> {
            let (value, kind) = resolver::resolve(node, current.as_ref(), prompter.as_deref_mut())?;
            self.check_validations(script, node, &value)?;
            let scope = ctx.scope();
            ctx.put(&scope, value.clone(), kind)?;

            self.walk_matching_children(script, node, &value, ctx, prompter.as_deref_mut(), visitor)
                .map_err(|invocation_err| invocation_err.source)?;
            Ok(VisitResult::Continue)
        })();

        ctx.pop().map_err(|e| InvocationError::new(node.site.clone(), e))?;
        result.map_err(|e| InvocationError::new(node.site.clone(), e))
    }

    fn walk_matching_children(
        &mut self,
        script: &Arc<Script>,
        node: &Node,
        value: &weave_value::Value,
        ctx: &mut Context,
        mut prompter: Option<&mut dyn Prompter>,
        visitor: &mut dyn Visitor,
    ) -> Result<(), InvocationError> {
        match node.kind {
            Kind::InputEnum => {
                let chosen = value.as_string();
                for option in node.children_of_kind(Kind::Option) {
                    if option
                        .attr_str("value")
                        .is_some_and(|v| v.eq_ignore_ascii_case(&chosen))
                    {
                        self.visit_children(script, option, ctx, prompter.as_deref_mut(), visitor)?;
                    }
                }
            }
            Kind::InputList => {
                let chosen = value.as_list().unwrap_or_default();
                for option in node.children_of_kind(Kind::Option) {
                    if option
                        .attr_str("value")
                        .is_some_and(|v| chosen.iter().any(|c| c.eq_ignore_ascii_case(v)))
                    {
                        self.visit_children(script, option, ctx, prompter.as_deref_mut(), visitor)?;
                    }
                }
            }
            _ => {
                self.visit_children(script, node, ctx, prompter.as_deref_mut(), visitor)?;
            }
        }
        Ok(())
    }

    fn check_validations(
        &self,
        script: &Arc<Script>,
        node: &Node,
        value: &weave_value::Value,
    ) -> Result<(), EngineError> {
        let Some(name) = node.attr_str("validations") else {
            return Ok(());
        };
        let Some(validation) = script
            .root
            .children_of_kind(Kind::Validation)
            .find(|v| v.attr_str("id") == Some(name))
        else {
            return Ok(());
        };

        let text = value.as_string();
        let mut failing = Vec::new();
        for regex_node in validation.children_of_kind(Kind::Regex) {
            let Some(pattern) = regex_node.attr_str("pattern").or_else(|| regex_node.attr_str("value")) else {
                continue;
            };
            let Ok(re) = regex::Regex::new(pattern) else {
                failing.push(pattern.to_string());
                continue;
            };
            if !re.is_match(&text) {
                failing.push(pattern.to_string());
            }
        }

        if failing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::InputValidation {
                input: node.attr_str("id").unwrap_or_default().to_string(),
                value: text,
                failing,
            })
        }
    }

    fn invoke_call(
        &mut self,
        script: &Arc<Script>,
        node: &Node,
        ctx: &mut Context,
        mut prompter: Option<&mut dyn Prompter>,
        visitor: &mut dyn Visitor,
    ) -> Result<(), InvocationError> {
        let name = node.attr_str("method").unwrap_or_default().to_string();
        let method = script.method(&name).ok_or_else(|| {
            InvocationError::new(
                node.site.clone(),
                EngineError::UndefinedMethod { name: name.clone() },
            )
        })?;

        if self.active_methods.contains(&name) {
            return Err(InvocationError::new(
                node.site.clone(),
                EngineError::MethodCycle { name },
            ));
        }

        self.active_methods.push(name);
        let result = self.visit_children(script, method, ctx, prompter.as_deref_mut(), visitor);
        self.active_methods.pop();
        result.map(|_| ())
    }

    /// Registers the entry script itself on the active-source chain
    /// before walking it, so that a later `source`/`exec` back into it
    /// (directly or through an intermediate file) is caught as a cycle
    /// rather than silently re-running the whole tree.
    fn invoke_script_root(
        &mut self,
        script: &Arc<Script>,
        node: &Node,
        ctx: &mut Context,
        prompter: Option<&mut dyn Prompter>,
        visitor: &mut dyn Visitor,
    ) -> Result<(), InvocationError> {
        let canonical = CanonicalPath::new(script.path.to_string());
        self.enter_source(&canonical, &node.site)
            .map_err(|e| InvocationError::new(node.site.clone(), e))?;
        let result = self.visit_children(script, node, ctx, prompter, visitor);
        self.active_sources.pop();
        result.map(|_| ())
    }

    /// Checks `canonical` against the active-source chain and the
    /// whole-run sourced set. A path still active on the chain is a
    /// cycle (carries the site it was first entered at); a path already
    /// seen but no longer active is a duplicate. Otherwise it's pushed
    /// onto both, paired with `site`.
    fn enter_source(&mut self, canonical: &CanonicalPath, site: &Site) -> Result<(), EngineError> {
        if let Some((_, first_site)) = self.active_sources.iter().find(|(path, _)| path == canonical) {
            return Err(EngineError::IncludeCycle {
                path: canonical.to_string(),
                first_site: first_site.clone(),
            });
        }
        if !self.sourced_once.insert(canonical.clone()) {
            return Err(EngineError::DuplicateInclude {
                path: canonical.to_string(),
            });
        }
        self.active_sources.push((canonical.clone(), site.clone()));
        Ok(())
    }

    fn invoke_include(
        &mut self,
        script: &Arc<Script>,
        node: &Node,
        ctx: &mut Context,
        mut prompter: Option<&mut dyn Prompter>,
        visitor: &mut dyn Visitor,
    ) -> Result<(), InvocationError> {
        let src = node.attr_str("src").unwrap_or_default();
        let (canonical, loaded) = self
            .loader
            .load(src)
            .map_err(|e| InvocationError::new(node.site.clone(), EngineError::from(e)))?;

        self.enter_source(&canonical, &node.site)
            .map_err(|e| InvocationError::new(node.site.clone(), e))?;

        ctx.push_cwd(canonical.parent_dir());
        let result = self.visit_children(&loaded, &loaded.root.clone(), ctx, prompter.as_deref_mut(), visitor);
        ctx.pop_cwd();
        self.active_sources.pop();
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use weave_ast::Site;
    use weave_loader::LoadError;
    use weave_value::Value;

    struct EmptyArchive;
    impl ScriptArchive for EmptyArchive {
        fn resolve(&self, logical_path: &str) -> Result<CanonicalPath, LoadError> {
            Ok(CanonicalPath::new(logical_path))
        }
        fn read(&self, _path: &CanonicalPath) -> Result<String, LoadError> {
            Ok(String::new())
        }
    }
    struct EmptyParser;
    impl ScriptParser for EmptyParser {
        fn parse(
            &self,
            _source: &str,
            path: &CanonicalPath,
        ) -> Result<Node, weave_loader::ParseError> {
            Ok(Node::new(Kind::Script, Site::new(path.as_arc_str(), 1)))
        }
    }

    fn site() -> Site {
        Site::new("m.xml", 1)
    }

    #[test]
    fn condition_false_skips_the_subtree_without_walking_children() {
        let mut loader = Loader::new(EmptyArchive, EmptyParser);
        let root = Node::new(Kind::Script, site()).with_attr("if", "false").with_child(
            Node::new(Kind::PresetBool, site())
                .with_attr("id", "x")
                .with_raw(Value::Bool(true)),
        );
        let script = Arc::new(Script::new("m.xml", root.clone()).unwrap());
        let mut invoker = Invoker::new(&mut loader);
        let mut ctx = Context::new();
        let result = invoker
            .invoke(&script, &script.root, &mut ctx, None, &mut NoopVisitor)
            .unwrap();
        assert_eq!(result, VisitResult::SkipChildren);
        assert!(matches!(ctx.get("x").unwrap().value, Value::Empty));
    }

    #[test]
    fn preset_node_puts_its_literal_value_into_context() {
        let mut loader = Loader::new(EmptyArchive, EmptyParser);
        let root = Node::new(Kind::Script, site()).with_child(
            Node::new(Kind::PresetBool, site())
                .with_attr("id", "flag")
                .with_raw(Value::Bool(true)),
        );
        let script = Arc::new(Script::new("m.xml", root).unwrap());
        let mut invoker = Invoker::new(&mut loader);
        let mut ctx = Context::new();
        invoker
            .invoke(&script, &script.root, &mut ctx, None, &mut NoopVisitor)
            .unwrap();
        assert_eq!(ctx.get("flag").unwrap().value, Value::Bool(true));
    }

    #[test]
    fn undefined_method_call_is_an_error() {
        let mut loader = Loader::new(EmptyArchive, EmptyParser);
        let root = Node::new(Kind::Script, site())
            .with_child(Node::new(Kind::InvokeCall, site()).with_attr("method", "nope"));
        let script = Arc::new(Script::new("m.xml", root).unwrap());
        let mut invoker = Invoker::new(&mut loader);
        let mut ctx = Context::new();
        let err = invoker
            .invoke(&script, &script.root, &mut ctx, None, &mut NoopVisitor)
            .unwrap_err();
        assert!(matches!(err.source, EngineError::UndefinedMethod { .. }));
    }

    #[test]
    fn bool_input_resolves_and_walks_into_its_children_when_true() {
        let mut loader = Loader::new(EmptyArchive, EmptyParser);
        let marker = Node::new(Kind::PresetBool, site())
            .with_attr("id", "entered")
            .with_raw(Value::Bool(true));
        let input = Node::new(Kind::InputBool, site())
            .with_attr("id", "go")
            .with_attr("default", "true")
            .with_attr("optional", true)
            .with_child(marker);
        let root = Node::new(Kind::Script, site()).with_child(input);
        let script = Arc::new(Script::new("m.xml", root).unwrap());
        let mut invoker = Invoker::new(&mut loader);
        let mut ctx = Context::new();
        invoker
            .invoke(&script, &script.root, &mut ctx, None, &mut NoopVisitor)
            .unwrap();
        assert_eq!(ctx.get("go").unwrap().value, Value::Bool(true));
        assert_eq!(ctx.get("entered").unwrap().value, Value::Bool(true));
    }

    #[test]
    fn unresolved_required_input_is_an_error() {
        let mut loader = Loader::new(EmptyArchive, EmptyParser);
        let input = Node::new(Kind::InputText, site()).with_attr("id", "name");
        let root = Node::new(Kind::Script, site()).with_child(input);
        let script = Arc::new(Script::new("m.xml", root).unwrap());
        let mut invoker = Invoker::new(&mut loader);
        let mut ctx = Context::new();
        let counter = Cell::new(0);
        let _ = &counter;
        let err = invoker
            .invoke(&script, &script.root, &mut ctx, None, &mut NoopVisitor)
            .unwrap_err();
        assert!(matches!(err.source, EngineError::UnresolvedInput { .. }));
    }
}
