//! Input resolution: the per-input state machine driving both batch
//! (no prompting) and interactive generation (`spec.md` §4.5).

use crate::error::EngineError;
use weave_ast::{Kind, Node};
use weave_context::{ScopeValue, ValueKind};
use weave_value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Bool,
    Text,
    Enum,
    List,
}

/// Consumer-supplied interactive prompt. `None` means the user cancelled.
pub trait Prompter {
    fn prompt(
        &mut self,
        kind: PromptKind,
        id: &str,
        prompt_text: &str,
        help: Option<&str>,
        options: Option<&[String]>,
        default: Option<&str>,
    ) -> Option<String>;
}

fn prompt_kind(kind: Kind) -> PromptKind {
    match kind {
        Kind::InputBool => PromptKind::Bool,
        Kind::InputText => PromptKind::Text,
        Kind::InputEnum => PromptKind::Enum,
        Kind::InputList => PromptKind::List,
        other => unreachable!("not an input kind: {other}"),
    }
}

fn declared_options(node: &Node) -> Vec<String> {
    node.children_of_kind(Kind::Option)
        .filter_map(|o| o.attr_str("value").map(str::to_string))
        .collect()
}

/// Resolves one `input` node's value, given the value (if any) already
/// sitting on its just-pushed scope. Returns the resolved value and the
/// `ValueKind` it should be `put` under; the invoker performs the `put`.
pub fn resolve(
    node: &Node,
    current: Option<&ScopeValue>,
    prompter: Option<&mut dyn Prompter>,
) -> Result<(Value, ValueKind), EngineError> {
    let id = node.attr_str("id").unwrap_or_default();
    let optional = node.attr_bool("optional").unwrap_or(false);

    if let Some(existing) = current {
        if existing.kind == ValueKind::External {
            let value = normalize_against_options(node, id, &existing.value)?;
            return Ok((value, ValueKind::External));
        }
        if existing.kind == ValueKind::Default && optional {
            return Ok((existing.value.clone(), ValueKind::Default));
        }
    }

    if optional {
        if let Some(default) = node.attr_str("default") {
            let value = literal_for_kind(node.kind, default);
            return Ok((value, ValueKind::Default));
        }
    }

    if let Some(prompter) = prompter {
        return prompt_until_resolved(node, id, prompter);
    }

    Err(EngineError::UnresolvedInput {
        input: id.to_string(),
    })
}

fn prompt_until_resolved(
    node: &Node,
    id: &str,
    prompter: &mut dyn Prompter,
) -> Result<(Value, ValueKind), EngineError> {
    let kind = prompt_kind(node.kind);
    let options = declared_options(node);
    let options_arg = if options.is_empty() { None } else { Some(options.as_slice()) };
    let default = node.attr_str("default");
    let help = node.attr_str("help");
    let prompt_text = node.attr_str("prompt").unwrap_or(id);

    loop {
        let answer = prompter
            .prompt(kind, id, prompt_text, help, options_arg, default)
            .ok_or_else(|| EngineError::PromptCancelled { input: id.to_string() })?;

        if answer.trim().is_empty() {
            if let Some(default) = default {
                return Ok((literal_for_kind(node.kind, default), ValueKind::Default));
            }
            return Err(EngineError::UnresolvedInput { input: id.to_string() });
        }

        match parse_answer(node, id, kind, &options, &answer)? {
            Some(value) => return Ok((value, ValueKind::User)),
            None => continue,
        }
    }
}

fn parse_answer(
    node: &Node,
    id: &str,
    kind: PromptKind,
    options: &[String],
    answer: &str,
) -> Result<Option<Value>, EngineError> {
    match kind {
        PromptKind::Bool => match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Ok(Some(Value::Bool(true))),
            "n" | "no" => Ok(Some(Value::Bool(false))),
            _ => Ok(None),
        },
        PromptKind::Text => Ok(Some(Value::String(answer.to_string()))),
        PromptKind::Enum => Ok(resolve_enum_answer(options, answer)),
        PromptKind::List => {
            let mut resolved: Vec<String> = Vec::new();
            for token in answer.split_whitespace() {
                let Ok(index) = token.parse::<usize>() else {
                    return Ok(None);
                };
                let Some(value) = index.checked_sub(1).and_then(|i| options.get(i)) else {
                    return Ok(None);
                };
                if !resolved.iter().any(|r| r.eq_ignore_ascii_case(value)) {
                    resolved.push(value.clone());
                }
            }
            let _ = node;
            let _ = id;
            Ok(Some(Value::normalize_list(resolved)))
        }
    }
}

fn resolve_enum_answer(options: &[String], answer: &str) -> Option<Value> {
    if let Ok(index) = answer.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| options.get(i))
            .map(|v| Value::String(v.clone()));
    }
    options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(answer))
        .map(|v| Value::String(v.clone()))
}

fn literal_for_kind(kind: Kind, text: &str) -> Value {
    match kind {
        Kind::InputBool => Value::Bool(text.eq_ignore_ascii_case("true")),
        Kind::InputList => Value::normalize_list(
            text.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect(),
        ),
        _ => Value::String(text.to_string()),
    }
}

/// Checks an externally-supplied value against the input's declared
/// option set (enum/list only); case-insensitive, per `spec.md` E3.
fn normalize_against_options(node: &Node, id: &str, value: &Value) -> Result<Value, EngineError> {
    match node.kind {
        Kind::InputEnum => {
            let text = value.as_string();
            let options = declared_options(node);
            options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(&text))
                .map(|o| Value::String(o.clone()))
                .ok_or_else(|| EngineError::InvalidInput {
                    input: id.to_string(),
                    value: text,
                })
        }
        Kind::InputList => {
            let options = declared_options(node);
            let given = value.as_list().map_err(weave_value::ExpressionError::from)?;
            let mut resolved = Vec::with_capacity(given.len());
            for g in &given {
                let matched = options
                    .iter()
                    .find(|o| o.eq_ignore_ascii_case(g))
                    .ok_or_else(|| EngineError::InvalidInput {
                        input: id.to_string(),
                        value: g.clone(),
                    })?;
                resolved.push(matched.clone());
            }
            Ok(Value::normalize_list(resolved))
        }
        _ => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ast::Site;

    fn site() -> Site {
        Site::new("s.xml", 1)
    }

    fn enum_node(options: &[&str]) -> Node {
        let mut n = Node::new(Kind::InputEnum, site())
            .with_attr("id", "color")
            .with_attr("optional", true);
        for o in options {
            n = n.with_child(Node::new(Kind::Option, site()).with_attr("value", *o));
        }
        n
    }

    #[test]
    fn e3_external_enum_value_resolves_case_insensitively() {
        let node = enum_node(&["red", "blue"]);
        let current = ScopeValue {
            value: Value::String("BLUE".into()),
            kind: ValueKind::External,
        };
        let (value, kind) = resolve(&node, Some(&current), None).unwrap();
        assert_eq!(value, Value::String("blue".into()));
        assert_eq!(kind, ValueKind::External);
    }

    #[test]
    fn external_value_outside_the_option_set_is_rejected() {
        let node = enum_node(&["red", "blue"]);
        let current = ScopeValue {
            value: Value::String("green".into()),
            kind: ValueKind::External,
        };
        let err = resolve(&node, Some(&current), None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn declared_default_is_used_when_optional_and_unresolved() {
        let node = Node::new(Kind::InputText, site())
            .with_attr("id", "name")
            .with_attr("optional", true)
            .with_attr("default", "world");
        let (value, kind) = resolve(&node, None, None).unwrap();
        assert_eq!(value, Value::String("world".into()));
        assert_eq!(kind, ValueKind::Default);
    }

    #[test]
    fn no_default_and_no_prompter_is_unresolved() {
        let node = Node::new(Kind::InputText, site()).with_attr("id", "name");
        let err = resolve(&node, None, None).unwrap_err();
        assert!(matches!(err, EngineError::UnresolvedInput { .. }));
    }

    struct ScriptedPrompter {
        answers: Vec<String>,
    }

    impl Prompter for ScriptedPrompter {
        fn prompt(
            &mut self,
            _kind: PromptKind,
            _id: &str,
            _prompt_text: &str,
            _help: Option<&str>,
            _options: Option<&[String]>,
            _default: Option<&str>,
        ) -> Option<String> {
            if self.answers.is_empty() {
                None
            } else {
                Some(self.answers.remove(0))
            }
        }
    }

    #[test]
    fn interactive_enum_reprompts_until_matched() {
        let node = enum_node(&["red", "blue"]);
        let mut prompter = ScriptedPrompter {
            answers: vec!["green".to_string(), "2".to_string()],
        };
        let (value, kind) = resolve(&node, None, Some(&mut prompter)).unwrap();
        assert_eq!(value, Value::String("blue".into()));
        assert_eq!(kind, ValueKind::User);
    }

    #[test]
    fn interactive_bool_accepts_yes_no_case_insensitively() {
        let node = Node::new(Kind::InputBool, site()).with_attr("id", "ok");
        let mut prompter = ScriptedPrompter {
            answers: vec!["YES".to_string()],
        };
        let (value, _) = resolve(&node, None, Some(&mut prompter)).unwrap();
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn interactive_list_collapses_duplicate_indices() {
        let node = Node::new(Kind::InputList, site())
            .with_attr("id", "items")
            .with_child(Node::new(Kind::Option, site()).with_attr("value", "a"))
            .with_child(Node::new(Kind::Option, site()).with_attr("value", "b"));
        let mut prompter = ScriptedPrompter {
            answers: vec!["1 2 1".to_string()],
        };
        let (value, _) = resolve(&node, None, Some(&mut prompter)).unwrap();
        assert_eq!(value, Value::List(vec!["a".to_string(), "b".to_string()]));
    }
}
