use crate::error::ContextError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Root,
    Parent,
    Name(String),
}

fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Splits a key into its constituent segments: a leading `~` becomes
/// `Root`, each `..` becomes `Parent`, every other dot-separated piece
/// must match `[a-z0-9][a-z0-9-]*`.
pub fn parse_key(key: &str) -> Result<Vec<Segment>, ContextError> {
    if let Some(rest) = key.strip_prefix('~') {
        let rest = rest.strip_prefix('.').unwrap_or(rest);
        let mut segments = vec![Segment::Root];
        if !rest.is_empty() {
            segments.extend(parse_relative(rest)?);
        }
        return Ok(segments);
    }

    if key.starts_with('.') && !key.starts_with("..") {
        return Err(ContextError::relative_at_root(key));
    }

    parse_relative(key)
}

fn parse_relative(key: &str) -> Result<Vec<Segment>, ContextError> {
    let mut segments = Vec::new();
    for part in key.split('.') {
        if part == ".." {
            segments.push(Segment::Parent);
        } else if is_valid_name(part) {
            segments.push(Segment::Name(part.to_string()));
        } else {
            return Err(ContextError::invalid_key(key));
        }
    }
    Ok(segments)
}

/// Is this key a single plain name with no path operators? Those go
/// through the ancestor/global search algorithm; anything with a `~`,
/// `..`, or a dotted path descends directly instead.
pub fn is_plain_name(key: &str) -> bool {
    !key.contains('.') && !key.contains('~') && is_valid_name(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name_has_one_segment() {
        assert_eq!(parse_key("foo").unwrap(), vec![Segment::Name("foo".into())]);
        assert!(is_plain_name("foo"));
    }

    #[test]
    fn root_prefix_resets_to_root() {
        assert_eq!(
            parse_key("~.foo.bar").unwrap(),
            vec![
                Segment::Root,
                Segment::Name("foo".into()),
                Segment::Name("bar".into())
            ]
        );
    }

    #[test]
    fn double_dot_walks_up_one_level() {
        assert_eq!(
            parse_key("..foo").unwrap(),
            vec![Segment::Parent, Segment::Name("foo".into())]
        );
    }

    #[test]
    fn leading_dot_at_root_is_rejected() {
        assert!(matches!(
            parse_key(".foo"),
            Err(ContextError::InvalidPath { .. })
        ));
    }

    #[test]
    fn invalid_characters_are_rejected() {
        assert!(matches!(
            parse_key("Foo_Bar"),
            Err(ContextError::InvalidPath { .. })
        ));
    }
}
