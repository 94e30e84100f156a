//! The tagged value domain shared by the context, the expression language,
//! and the template model.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A dynamically tagged value.
///
/// Archetype scripts are untyped at the XML level; every attribute and every
/// resolved input ends up as one of these five shapes. Conversions are
/// partial projections — `asBool` on a `String` fails rather than coercing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Empty,
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<String>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("expected a bool, found {found}")]
    NotBool { found: &'static str },
    #[error("expected a string, found {found}")]
    NotString { found: &'static str },
    #[error("expected an int, found {found}")]
    NotInt { found: &'static str },
    #[error("expected a list, found {found}")]
    NotList { found: &'static str },
    #[error("'{text}' is not a valid integer")]
    BadIntLiteral { text: String },
    #[error("'contains' is not defined between {left} and {right}")]
    IncompatibleContains {
        left: &'static str,
        right: &'static str,
    },
}

impl Value {
    /// `["none"]` is the canonical spelling of an empty list; every other
    /// representation of "no value" funnels through `Value::Empty`.
    pub fn normalize_list(xs: Vec<String>) -> Value {
        if xs.len() == 1 && xs[0] == "none" {
            Value::List(Vec::new())
        } else {
            Value::List(xs)
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::List(_) => "list",
        }
    }

    pub fn is_empty_value(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::List(xs) => xs.is_empty(),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(ValueError::NotBool { found: other.tag() }),
        }
    }

    pub fn as_int(&self) -> Result<i64, ValueError> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::String(s) => s
                .parse::<i64>()
                .map_err(|_| ValueError::BadIntLiteral { text: s.clone() }),
            other => Err(ValueError::NotInt { found: other.tag() }),
        }
    }

    pub fn as_list(&self) -> Result<Vec<String>, ValueError> {
        match self {
            Value::List(xs) => Ok(xs.clone()),
            Value::String(s) => Ok(split_list_literal(s)),
            Value::Empty => Ok(Vec::new()),
            other => Err(ValueError::NotList { found: other.tag() }),
        }
    }

    /// String projection: never fails. Bools print `true`/`false`, ints
    /// print decimal, lists join on `,`, `Empty` prints as the empty string.
    pub fn as_string(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::String(s) => s.clone(),
            Value::List(xs) => xs.join(","),
        }
    }

    pub fn cast_to_list(&self) -> Value {
        Value::normalize_list(split_list_literal(&self.as_string()))
    }

    pub fn cast_to_string(&self) -> Value {
        Value::String(self.as_string())
    }

    pub fn cast_to_int(&self) -> Result<Value, ValueError> {
        self.as_int().map(Value::Int)
    }

    pub fn sizeof(&self) -> Result<i64, ValueError> {
        match self {
            Value::String(s) => Ok(s.chars().count() as i64),
            Value::List(xs) => Ok(xs.len() as i64),
            Value::Empty => Ok(0),
            other => Err(ValueError::NotString { found: other.tag() }),
        }
    }
}

fn split_list_literal(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(',').map(|part| part.to_string()).collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_list_is_canonically_empty() {
        let v = Value::normalize_list(vec!["none".to_string()]);
        assert_eq!(v, Value::List(Vec::new()));
        assert!(v.is_empty_value());
    }

    #[test]
    fn as_bool_rejects_non_bool() {
        let err = Value::String("true".into()).as_bool().unwrap_err();
        assert_eq!(err, ValueError::NotBool { found: "string" });
    }

    #[test]
    fn string_cast_splits_on_comma() {
        let v = Value::String("a,b,c".into());
        assert_eq!(v.as_list().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn string_cast_of_none_is_empty_list() {
        let v = Value::String("none".into());
        assert_eq!(v.cast_to_list(), Value::List(Vec::new()));
    }

    #[test]
    fn list_cast_to_string_joins_with_comma() {
        let v = Value::List(vec!["a".into(), "b".into()]);
        assert_eq!(v.cast_to_string(), Value::String("a,b".into()));
    }

    #[test]
    fn sizeof_counts_chars_and_elements() {
        assert_eq!(Value::String("héllo".into()).sizeof().unwrap(), 5);
        assert_eq!(
            Value::List(vec!["a".into(), "b".into()]).sizeof().unwrap(),
            2
        );
    }
}
