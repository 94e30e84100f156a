//! A one-pass validator over a loaded entry-point, accumulating
//! structural and expression errors rather than failing on the first
//! one (`spec.md` §4.9).

use std::collections::HashSet;
use weave_ast::{Kind, Node, Site};
use weave_value::{Expression, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub site: Site,
    pub message: String,
}

impl ValidationError {
    fn new(site: &Site, message: impl Into<String>) -> Self {
        Self { site: site.clone(), message: message.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
    /// Run every check and keep going regardless of what's found.
    Full,
    /// Halt as soon as validation has run once; no further passes.
    ValidateOnly,
    /// Keep going even past errors a stricter mode would stop on.
    IgnoreErrors,
}

#[derive(Debug, Clone)]
pub struct CompileResult {
    pub errors: Vec<ValidationError>,
    pub canonical: String,
}

impl CompileResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Synthetic variables resolvable without being declared anywhere.
const SYNTHETIC_VARIABLES: &[&str] = &["current-date"];

pub fn compile(entry: &Node, mode: CompileMode) -> CompileResult {
    let mut errors = Vec::new();
    let declared = collect_declared_names(entry);

    check_inputs_in_steps(entry, false, &mut errors);
    check_step_optionality(entry, None, &mut errors);
    check_duplicates(entry, &mut Vec::new(), &mut errors);
    check_expressions(entry, &declared, &mut errors);

    if mode == CompileMode::ValidateOnly {
        return CompileResult { errors, canonical: String::new() };
    }

    let canonical = canonicalize(entry, 0);
    CompileResult { errors, canonical }
}

fn collect_declared_names(node: &Node) -> HashSet<String> {
    let mut out = HashSet::new();
    collect_declared_names_into(node, &mut out);
    out
}

fn collect_declared_names_into(node: &Node, out: &mut HashSet<String>) {
    if node.kind.is_input() || node.kind.is_variable() || node.kind.is_preset() {
        if let Some(id) = node.attr_str("id") {
            out.insert(id.to_string());
        }
    }
    for child in &node.children {
        collect_declared_names_into(child, out);
    }
}

/// Every non-preset input must have a `step` ancestor.
fn check_inputs_in_steps(node: &Node, in_step: bool, errors: &mut Vec<ValidationError>) {
    if node.kind.is_input() && !in_step {
        errors.push(ValidationError::new(
            &node.site,
            format!("input '{}' is not inside a step", node.attr_str("id").unwrap_or("?")),
        ));
    }
    let in_step = in_step || node.kind == Kind::Step;
    for child in &node.children {
        check_inputs_in_steps(child, in_step, errors);
    }
}

/// A step marked optional may only contain optional inputs, recursively;
/// a non-optional step must contain at least one required input; a
/// nested step cannot be non-optional inside an optional ancestor step.
fn check_step_optionality(node: &Node, enclosing_optional: Option<bool>, errors: &mut Vec<ValidationError>) {
    if node.kind == Kind::Step {
        let optional = node.attr_bool("optional").unwrap_or(false);
        if let Some(true) = enclosing_optional {
            if !optional {
                errors.push(ValidationError::new(
                    &node.site,
                    "a nested step may not be non-optional inside an optional step",
                ));
            }
        }
        if optional {
            if let Some(required) = first_required_input(node) {
                errors.push(ValidationError::new(
                    &required.site,
                    format!("required input '{}' inside an optional step", required.attr_str("id").unwrap_or("?")),
                ));
            }
        } else if !has_required_input(node) {
            errors.push(ValidationError::new(&node.site, "a non-optional step must contain at least one required input"));
        }
        for child in &node.children {
            check_step_optionality(child, Some(optional), errors);
        }
        return;
    }
    for child in &node.children {
        check_step_optionality(child, enclosing_optional, errors);
    }
}

fn has_required_input(node: &Node) -> bool {
    if node.kind.is_input() && !node.attr_bool("optional").unwrap_or(false) {
        return true;
    }
    if node.kind == Kind::Step {
        return false;
    }
    node.children.iter().any(has_required_input)
}

fn first_required_input(node: &Node) -> Option<&Node> {
    if node.kind.is_input() && !node.attr_bool("optional").unwrap_or(false) {
        return Some(node);
    }
    if node.kind == Kind::Step {
        return None;
    }
    node.children.iter().find_map(first_required_input)
}

/// Duplicate input ids along one traversal path, and duplicate option
/// values within one enum/list.
fn check_duplicates(node: &Node, path: &mut Vec<String>, errors: &mut Vec<ValidationError>) {
    let mut pushed = false;
    if node.kind.is_input() {
        let id = node.attr_str("id").unwrap_or_default().to_string();
        if path.contains(&id) {
            errors.push(ValidationError::new(&node.site, format!("input id '{id}' declared twice on the same path")));
        } else {
            path.push(id);
            pushed = true;
        }
    }

    if matches!(node.kind, Kind::InputEnum | Kind::InputList | Kind::PresetEnum | Kind::PresetList) {
        let mut seen = HashSet::new();
        for option in node.children_of_kind(Kind::Option) {
            let value = option.attr_str("value").unwrap_or_default();
            if !seen.insert(value.to_string()) {
                errors.push(ValidationError::new(&option.site, format!("duplicate option value '{value}'")));
            }
        }
    }

    for child in &node.children {
        check_duplicates(child, path, errors);
    }

    if pushed {
        path.pop();
    }
}

/// Every `if` expression must parse, reference only declared names (or a
/// synthetic such as `current-date`), and type-check: an operator applied
/// to a statically known operand type it can't evaluate against (e.g. `Not`
/// over a list) is rejected here instead of surfacing as an `eval` failure
/// at invocation time.
fn check_expressions(node: &Node, declared: &HashSet<String>, errors: &mut Vec<ValidationError>) {
    if let Some(source) = node.condition_source() {
        match Expression::parse(source) {
            Err(e) => errors.push(ValidationError::new(&node.site, format!("malformed expression: {e}"))),
            Ok(expr) => {
                check_expression_variables(&expr, &node.site, declared, errors);
                check_expression_types(&expr, &node.site, errors);
            }
        }
    }
    for child in &node.children {
        check_expressions(child, declared, errors);
    }
}

fn check_expression_variables(expr: &Expression, site: &Site, declared: &HashSet<String>, errors: &mut Vec<ValidationError>) {
    match expr {
        Expression::Var(name) => {
            if !declared.contains(name) && !SYNTHETIC_VARIABLES.contains(&name.as_str()) {
                errors.push(ValidationError::new(site, format!("unresolved variable '${{{name}}}'")));
            }
        }
        Expression::Not(e) | Expression::CastList(e) | Expression::CastString(e) | Expression::CastInt(e) | Expression::SizeOf(e) => {
            check_expression_variables(e, site, declared, errors);
        }
        Expression::And(l, r)
        | Expression::Or(l, r)
        | Expression::Eq(l, r)
        | Expression::NotEq(l, r)
        | Expression::Lt(l, r)
        | Expression::LtEq(l, r)
        | Expression::Gt(l, r)
        | Expression::GtEq(l, r)
        | Expression::Contains(l, r) => {
            check_expression_variables(l, site, declared, errors);
            check_expression_variables(r, site, declared, errors);
        }
        Expression::Lit(_) => {}
    }
}

/// The operand type an expression node evaluates to, when it is knowable
/// without a `Context` to resolve variables against. `Var` and `Empty` are
/// polymorphic — `None` here means "matches any operand", not "unknown
/// error"; the only thing this inference is used for is catching operand
/// kinds that an operator cannot accept under any variable binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StaticType {
    Bool,
    Int,
    String,
    List,
}

impl StaticType {
    fn name(self) -> &'static str {
        match self {
            StaticType::Bool => "bool",
            StaticType::Int => "int",
            StaticType::String => "string",
            StaticType::List => "list",
        }
    }
}

fn infer_static_type(expr: &Expression) -> Option<StaticType> {
    match expr {
        Expression::Lit(Value::Bool(_)) => Some(StaticType::Bool),
        Expression::Lit(Value::Int(_)) => Some(StaticType::Int),
        Expression::Lit(Value::String(_)) => Some(StaticType::String),
        Expression::Lit(Value::List(_)) => Some(StaticType::List),
        Expression::Lit(Value::Empty) | Expression::Var(_) => None,
        Expression::Not(_)
        | Expression::And(_, _)
        | Expression::Or(_, _)
        | Expression::Eq(_, _)
        | Expression::NotEq(_, _)
        | Expression::Lt(_, _)
        | Expression::LtEq(_, _)
        | Expression::Gt(_, _)
        | Expression::GtEq(_, _)
        | Expression::Contains(_, _) => Some(StaticType::Bool),
        Expression::CastList(_) => Some(StaticType::List),
        Expression::CastString(_) => Some(StaticType::String),
        Expression::CastInt(_) => Some(StaticType::Int),
        Expression::SizeOf(_) => Some(StaticType::Int),
    }
}

/// Rejects an operand whose statically known type the operator can never
/// accept, regardless of what a variable inside it resolves to. `site` is
/// the enclosing condition's site, matching how variable-resolution errors
/// are already reported against the attribute that carries the expression
/// rather than any sub-expression's own position (expressions carry no
/// finer-grained position of their own).
fn check_operand(ty: Option<StaticType>, allowed: &[StaticType], what: &str, op: &str, site: &Site, errors: &mut Vec<ValidationError>) {
    if let Some(ty) = ty {
        if !allowed.contains(&ty) {
            errors.push(ValidationError::new(
                site,
                format!("'{op}' cannot take a {what} operand of type {}", ty.name()),
            ));
        }
    }
}

fn check_expression_types(expr: &Expression, site: &Site, errors: &mut Vec<ValidationError>) {
    use StaticType::{Bool, Int, List, String as Str};

    match expr {
        Expression::Lit(_) | Expression::Var(_) => {}
        Expression::Not(e) => {
            check_expression_types(e, site, errors);
            check_operand(infer_static_type(e), &[Bool], "operand", "not", site, errors);
        }
        Expression::And(l, r) | Expression::Or(l, r) => {
            let op = if matches!(expr, Expression::And(_, _)) { "and" } else { "or" };
            check_expression_types(l, site, errors);
            check_expression_types(r, site, errors);
            check_operand(infer_static_type(l), &[Bool], "left", op, site, errors);
            check_operand(infer_static_type(r), &[Bool], "right", op, site, errors);
        }
        Expression::Lt(l, r) | Expression::LtEq(l, r) | Expression::Gt(l, r) | Expression::GtEq(l, r) => {
            let op = match expr {
                Expression::Lt(..) => "<",
                Expression::LtEq(..) => "<=",
                Expression::Gt(..) => ">",
                _ => ">=",
            };
            check_expression_types(l, site, errors);
            check_expression_types(r, site, errors);
            check_operand(infer_static_type(l), &[Int, Str], "left", op, site, errors);
            check_operand(infer_static_type(r), &[Int, Str], "right", op, site, errors);
        }
        Expression::Contains(l, r) => {
            check_expression_types(l, site, errors);
            check_expression_types(r, site, errors);
            check_operand(infer_static_type(l), &[Str, List], "left", "contains", site, errors);
            check_operand(infer_static_type(r), &[Str, List], "right", "contains", site, errors);
        }
        Expression::CastInt(e) => {
            check_expression_types(e, site, errors);
            check_operand(infer_static_type(e), &[Int, Str], "operand", "(int)", site, errors);
        }
        Expression::SizeOf(e) => {
            check_expression_types(e, site, errors);
            check_operand(infer_static_type(e), &[Str, List], "operand", "sizeof", site, errors);
        }
        Expression::Eq(l, r) | Expression::NotEq(l, r) => {
            check_expression_types(l, site, errors);
            check_expression_types(r, site, errors);
        }
        Expression::CastList(e) | Expression::CastString(e) => {
            check_expression_types(e, site, errors);
        }
    }
}

fn canonicalize(node: &Node, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    let mut attrs = String::new();
    for (key, value) in &node.attrs {
        attrs.push_str(&format!(" {key}=\"{}\"", value.as_string()));
    }
    if node.children.is_empty() {
        format!("{indent}<{}{attrs}/>\n", node.kind.name())
    } else {
        let mut out = format!("{indent}<{}{attrs}>\n", node.kind.name());
        for child in &node.children {
            out.push_str(&canonicalize(child, depth + 1));
        }
        out.push_str(&format!("{indent}</{}>\n", node.kind.name()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ast::Site;

    fn site() -> Site {
        Site::new("m.xml", 1)
    }

    #[test]
    fn input_outside_a_step_is_rejected() {
        let input = Node::new(Kind::InputText, site()).with_attr("id", "name");
        let root = Node::new(Kind::Script, site()).with_child(input);
        let result = compile(&root, CompileMode::Full);
        assert!(result.errors.iter().any(|e| e.message.contains("not inside a step")));
    }

    #[test]
    fn non_optional_step_without_a_required_input_is_rejected() {
        let input = Node::new(Kind::InputText, site()).with_attr("id", "name").with_attr("optional", true);
        let step = Node::new(Kind::Step, site()).with_child(input);
        let root = Node::new(Kind::Script, site()).with_child(step);
        let result = compile(&root, CompileMode::Full);
        assert!(result.errors.iter().any(|e| e.message.contains("at least one required input")));
    }

    #[test]
    fn duplicate_input_id_on_one_path_is_rejected() {
        let a = Node::new(Kind::InputText, site()).with_attr("id", "name");
        let b = Node::new(Kind::InputText, site()).with_attr("id", "name");
        let step = Node::new(Kind::Step, site()).with_child(a).with_child(b);
        let root = Node::new(Kind::Script, site()).with_child(step);
        let result = compile(&root, CompileMode::Full);
        assert!(result.errors.iter().any(|e| e.message.contains("declared twice")));
    }

    #[test]
    fn unresolved_variable_in_a_condition_is_rejected() {
        let input = Node::new(Kind::InputText, site())
            .with_attr("id", "name")
            .with_attr("if", "${ghost}");
        let step = Node::new(Kind::Step, site()).with_child(input);
        let root = Node::new(Kind::Script, site()).with_child(step);
        let result = compile(&root, CompileMode::Full);
        assert!(result.errors.iter().any(|e| e.message.contains("unresolved variable")));
    }

    #[test]
    fn synthetic_current_date_is_always_resolved() {
        let input = Node::new(Kind::InputText, site())
            .with_attr("id", "name")
            .with_attr("if", "${current-date} == 'x'");
        let step = Node::new(Kind::Step, site()).with_child(input);
        let root = Node::new(Kind::Script, site()).with_child(step);
        let result = compile(&root, CompileMode::Full);
        assert!(!result.errors.iter().any(|e| e.message.contains("current-date")));
    }

    #[test]
    fn not_over_a_list_literal_is_rejected() {
        let input = Node::new(Kind::InputText, site())
            .with_attr("id", "name")
            .with_attr("if", "!['a','b']");
        let step = Node::new(Kind::Step, site()).with_child(input);
        let root = Node::new(Kind::Script, site()).with_child(step);
        let result = compile(&root, CompileMode::Full);
        assert!(result.errors.iter().any(|e| e.message.contains("'not' cannot take")));
    }

    #[test]
    fn ordering_a_bool_literal_is_rejected() {
        let input = Node::new(Kind::InputText, site())
            .with_attr("id", "name")
            .with_attr("if", "true < 1");
        let step = Node::new(Kind::Step, site()).with_child(input);
        let root = Node::new(Kind::Script, site()).with_child(step);
        let result = compile(&root, CompileMode::Full);
        assert!(result.errors.iter().any(|e| e.message.contains("'<' cannot take")));
    }

    #[test]
    fn comparing_two_unresolved_variables_is_not_a_type_error() {
        let expr = Expression::parse("${left} < ${right}").unwrap();
        let mut errors = Vec::new();
        check_expression_types(&expr, &site(), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn validate_only_skips_canonicalization() {
        let root = Node::new(Kind::Script, site());
        let result = compile(&root, CompileMode::ValidateOnly);
        assert!(result.canonical.is_empty());
    }
}
