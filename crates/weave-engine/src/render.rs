//! A Mustache subset over a merged `TemplateModel` (`spec.md` §4.7):
//! `{{name}}`, `{{#section}}...{{/section}}`, `{{^section}}...{{/section}}`,
//! `{{.}}`, and `{{^last}}...{{/last}}` inside a list iteration.

use crate::error::EngineError;
use crate::model::{ModelNode, TemplateModel};
use chrono::Local;
use indexmap::IndexMap;
use weave_context::{substitute, Context};
use weave_value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Var(String),
    Section { name: String, invert: bool, body: Vec<Node> },
}

fn parse(input: &str) -> Result<Vec<Node>, EngineError> {
    let (nodes, rest) = parse_nodes(input, None)?;
    if !rest.is_empty() {
        return Err(parse_error(rest));
    }
    Ok(nodes)
}

fn parse_error(fragment: &str) -> EngineError {
    weave_value::ExpressionError::Format {
        fragment: fragment.chars().take(24).collect(),
        offset: 0,
        reason: "unmatched closing section tag".to_string(),
    }
    .into()
}

/// Parses nodes until EOF or, when `closing` is set, until that
/// section's own `{{/closing}}` tag — which is consumed and not
/// included in the remainder returned.
fn parse_nodes<'a>(
    mut input: &'a str,
    closing: Option<&str>,
) -> Result<(Vec<Node>, &'a str), EngineError> {
    let mut nodes = Vec::new();
    loop {
        let Some(start) = input.find("{{") else {
            nodes.push(Node::Text(input.to_string()));
            return Ok((nodes, ""));
        };
        if start > 0 {
            nodes.push(Node::Text(input[..start].to_string()));
        }
        let after_open = &input[start + 2..];
        let Some(end) = after_open.find("}}") else {
            return Err(parse_error(input));
        };
        let tag = after_open[..end].trim();
        let rest = &after_open[end + 2..];

        if let Some(name) = tag.strip_prefix('#') {
            let name = name.trim().to_string();
            let (body, after_body) = parse_nodes(rest, Some(&name))?;
            nodes.push(Node::Section { name, invert: false, body });
            input = after_body;
        } else if let Some(name) = tag.strip_prefix('^') {
            let name = name.trim().to_string();
            let (body, after_body) = parse_nodes(rest, Some(&name))?;
            nodes.push(Node::Section { name, invert: true, body });
            input = after_body;
        } else if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim();
            match closing {
                Some(expected) if expected == name => return Ok((nodes, rest)),
                _ => return Err(parse_error(tag)),
            }
        } else {
            nodes.push(Node::Var(tag.to_string()));
            input = rest;
        }
    }
}

enum Frame<'a> {
    Root {
        model: &'a TemplateModel,
        extra: Option<&'a IndexMap<String, ModelNode>>,
    },
    Map(&'a IndexMap<String, ModelNode>),
    Scalar(&'a Value),
}

fn lookup<'a>(frames: &[Frame<'a>], name: &str) -> Option<Borrowed<'a>> {
    if name == "current-date" {
        return Some(Borrowed::Owned(Value::String(Local::now().date_naive().to_string())));
    }
    for frame in frames.iter().rev() {
        match frame {
            Frame::Root { model, extra } => {
                if let Some(extra) = extra {
                    if let Some(found) = extra.get(name) {
                        return Some(Borrowed::Node(found));
                    }
                }
                if let Some(found) = model.get(name) {
                    return Some(Borrowed::Node(found));
                }
            }
            Frame::Map(map) => {
                if let Some(found) = map.get(name) {
                    return Some(Borrowed::Node(found));
                }
            }
            Frame::Scalar(v) => {
                if name == "." {
                    return Some(Borrowed::Owned((*v).clone()));
                }
            }
        }
    }
    None
}

enum Borrowed<'a> {
    Node(&'a ModelNode),
    Owned(Value),
}

fn node_scalar(value: &Borrowed<'_>) -> Result<Value, EngineError> {
    match value {
        Borrowed::Owned(v) => Ok(v.clone()),
        Borrowed::Node(ModelNode::Value { value, .. }) => Ok(value.clone()),
        Borrowed::Node(_) => Err(EngineError::NotScalar { name: "".to_string() }),
    }
}

fn render_nodes(
    nodes: &[Node],
    frames: &mut Vec<Frame<'_>>,
    is_last: bool,
    ctx: &Context,
    out: &mut String,
) -> Result<(), EngineError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(name) => {
                match lookup(frames, name) {
                    None => {}
                    Some(found) => {
                        let value = node_scalar(&found).map_err(|_| EngineError::NotScalar {
                            name: name.clone(),
                        })?;
                        out.push_str(&substitute(ctx, &value.as_string()));
                    }
                }
            }
            Node::Section { name, invert, body } => {
                if name == "last" {
                    let shown = if *invert { !is_last } else { is_last };
                    if shown {
                        render_nodes(body, frames, is_last, ctx, out)?;
                    }
                    continue;
                }
                render_section(name, *invert, body, frames, ctx, out)?;
            }
        }
    }
    Ok(())
}

fn render_section(
    name: &str,
    invert: bool,
    body: &[Node],
    frames: &mut Vec<Frame<'_>>,
    ctx: &Context,
    out: &mut String,
) -> Result<(), EngineError> {
    let found = lookup(frames, name);
    match found {
        None => {
            if invert {
                render_nodes(body, frames, true, ctx, out)?;
            }
        }
        Some(Borrowed::Owned(value)) => {
            let falsy = value.is_empty_value() || matches!(value.as_bool(), Ok(false));
            if invert == falsy {
                render_nodes(body, frames, true, ctx, out)?;
            }
        }
        Some(Borrowed::Node(node)) => match node {
            ModelNode::Value { value, .. } => {
                let falsy = value.is_empty_value() || matches!(value.as_bool(), Ok(false));
                if invert {
                    if falsy {
                        render_nodes(body, frames, true, ctx, out)?;
                    }
                } else if !falsy {
                    frames.push(Frame::Scalar(value));
                    render_nodes(body, frames, true, ctx, out)?;
                    frames.pop();
                }
            }
            ModelNode::Map { entries, .. } => {
                if !invert {
                    frames.push(Frame::Map(entries));
                    render_nodes(body, frames, true, ctx, out)?;
                    frames.pop();
                }
            }
            ModelNode::List { items, .. } => {
                if invert {
                    if items.is_empty() {
                        render_nodes(body, frames, true, ctx, out)?;
                    }
                } else {
                    let len = items.len();
                    for (index, item) in items.iter().enumerate() {
                        let last = index + 1 == len;
                        match item {
                            ModelNode::Value { value, .. } => {
                                frames.push(Frame::Scalar(value));
                                render_nodes(body, frames, last, ctx, out)?;
                                frames.pop();
                            }
                            ModelNode::Map { entries, .. } => {
                                frames.push(Frame::Map(entries));
                                render_nodes(body, frames, last, ctx, out)?;
                                frames.pop();
                            }
                            ModelNode::List { .. } => {
                                render_nodes(body, frames, last, ctx, out)?;
                            }
                        }
                    }
                }
            }
        },
    }
    Ok(())
}

/// Renders `template` against `model`, with `extra` layered above it for
/// name resolution. Every resolved string is `${…}`-expanded against
/// `ctx` before being written out.
pub fn render(
    template: &str,
    model: &TemplateModel,
    extra: Option<&IndexMap<String, ModelNode>>,
    ctx: &Context,
) -> Result<String, EngineError> {
    let nodes = parse(template)?;
    let mut frames = vec![Frame::Root { model, extra }];
    let mut out = String::new();
    render_nodes(&nodes, &mut frames, true, ctx, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ast::{Kind, Node as AstNode, Site};

    fn site() -> Site {
        Site::new("m.xml", 1)
    }

    fn value_node(key: &str, value: Value, order: i64) -> AstNode {
        AstNode::new(Kind::ModelValue, site())
            .with_attr("key", key)
            .with_attr("order", Value::Int(order))
            .with_raw(value)
    }

    #[test]
    fn renders_a_name_bound_in_context() {
        let model = TemplateModel::new();
        let mut ctx = Context::new();
        ctx.push(
            "project",
            Some((Value::String("weave".into()), weave_context::ValueKind::User)),
            weave_context::Visibility::Unset,
        )
        .unwrap();
        let out = render("hello ${project}!", &model, None, &ctx).unwrap();
        assert_eq!(out, "hello weave!");
    }

    #[test]
    fn e4_merge_order_renders_higher_order_first() {
        let list_a = AstNode::new(Kind::ModelList, site())
            .with_attr("key", "data")
            .with_child(value_node("_", Value::String("bar1".into()), 0));
        let list_b = AstNode::new(Kind::ModelList, site())
            .with_attr("key", "data")
            .with_child(value_node("_", Value::String("bar2".into()), 100));

        let mut model = TemplateModel::new();
        model.add(&list_a).unwrap();
        model.add(&list_b).unwrap();

        let ctx = Context::new();
        let out = render("{{#data}}{{.}},{{/data}}", &model, None, &ctx).unwrap();
        assert_eq!(out, "bar2,bar1,");
    }

    #[test]
    fn absent_name_renders_empty() {
        let model = TemplateModel::new();
        let ctx = Context::new();
        assert_eq!(render("[{{missing}}]", &model, None, &ctx).unwrap(), "[]");
    }

    #[test]
    fn inverted_section_renders_when_value_is_false() {
        let mut model = TemplateModel::new();
        model.add(&value_node("flag", Value::Bool(false), 100)).unwrap();
        let ctx = Context::new();
        let out = render("{{^flag}}off{{/flag}}", &model, None, &ctx).unwrap();
        assert_eq!(out, "off");
    }

    #[test]
    fn last_is_true_for_every_element_but_the_final_one() {
        let list = AstNode::new(Kind::ModelList, site())
            .with_attr("key", "items")
            .with_child(value_node("_", Value::String("a".into()), 100))
            .with_child(value_node("_", Value::String("b".into()), 99));
        let mut model = TemplateModel::new();
        model.add(&list).unwrap();
        let ctx = Context::new();
        let out = render("{{#items}}{{.}}{{^last}},{{/last}}{{/items}}", &model, None, &ctx).unwrap();
        assert_eq!(out, "a,b");
    }

    #[test]
    fn map_section_exposes_its_entries_as_local_scope() {
        let map = AstNode::new(Kind::ModelMap, site())
            .with_attr("key", "person")
            .with_child(value_node("name", Value::String("ada".into()), 100));
        let mut model = TemplateModel::new();
        model.add(&map).unwrap();
        let ctx = Context::new();
        let out = render("{{#person}}{{name}}{{/person}}", &model, None, &ctx).unwrap();
        assert_eq!(out, "ada");
    }
}
