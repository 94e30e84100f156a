use crate::context::Context;
use std::collections::HashSet;

/// Expands every `${name}` occurrence in `template` by resolving `name`
/// against `ctx`. A name already being expanded further up the call
/// stack (a substitution cycle) resolves to the empty string instead of
/// recursing forever; an unresolved name also expands to empty — this
/// differs from `Expression::eval`, which treats an unresolved variable
/// as a hard error rather than silently defaulting.
pub fn substitute(ctx: &Context, template: &str) -> String {
    let mut visiting = HashSet::new();
    expand(ctx, template, &mut visiting)
}

fn expand(ctx: &Context, template: &str, visiting: &mut HashSet<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = &after[..end];
        out.push_str(&resolve_one(ctx, name, visiting));
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn resolve_one(ctx: &Context, name: &str, visiting: &mut HashSet<String>) -> String {
    if visiting.contains(name) {
        return String::new();
    }
    let Ok(scope_value) = ctx.get(name) else {
        return String::new();
    };
    if scope_value.value.is_empty_value() {
        return String::new();
    }

    visiting.insert(name.to_string());
    let rendered = scope_value.value.as_string();
    let expanded = expand(ctx, &rendered, visiting);
    visiting.remove(name);
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{ValueKind, Visibility};
    use weave_value::Value;

    #[test]
    fn expands_a_resolved_name() {
        let mut ctx = Context::new();
        ctx.push("name", Some((Value::String("weave".into()), ValueKind::User)), Visibility::Unset)
            .unwrap();
        assert_eq!(substitute(&ctx, "hello ${name}!"), "hello weave!");
    }

    #[test]
    fn unresolved_name_expands_to_empty() {
        let ctx = Context::new();
        assert_eq!(substitute(&ctx, "hello ${missing}!"), "hello !");
    }

    #[test]
    fn self_referential_substitution_breaks_the_cycle() {
        let mut ctx = Context::new();
        ctx.push(
            "a",
            Some((Value::String("${a}".into()), ValueKind::User)),
            Visibility::Unset,
        )
        .unwrap();
        assert_eq!(substitute(&ctx, "${a}"), "");
    }

    #[test]
    fn unterminated_reference_is_left_untouched() {
        let ctx = Context::new();
        assert_eq!(substitute(&ctx, "broken ${oops"), "broken ${oops");
    }
}
