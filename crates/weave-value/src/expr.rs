//! The expression AST, its evaluator, and canonical literal printing
//! (`spec.md` §3/§4.1).

use crate::error::ExpressionError;
use crate::value::Value;
use std::fmt;

/// A parsed boolean/relational expression.
///
/// `Expression` trees are small and cheap to clone; `reduce`/`sub` both
/// build new trees rather than mutating in place, matching the teacher's
/// preference (`lumen-compiler::compiler::ast`) for immutable, structurally
/// shared nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Lit(Value),
    Var(String),
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Eq(Box<Expression>, Box<Expression>),
    NotEq(Box<Expression>, Box<Expression>),
    Lt(Box<Expression>, Box<Expression>),
    LtEq(Box<Expression>, Box<Expression>),
    Gt(Box<Expression>, Box<Expression>),
    GtEq(Box<Expression>, Box<Expression>),
    Contains(Box<Expression>, Box<Expression>),
    CastList(Box<Expression>),
    CastString(Box<Expression>),
    CastInt(Box<Expression>),
    SizeOf(Box<Expression>),
}

/// A variable lookup used during `eval`. The default lookup (used when no
/// variables are expected to appear, e.g. in isolated unit tests) always
/// fails — callers must supply a real one to resolve any `${name}`.
pub trait Lookup {
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl<F: Fn(&str) -> Option<Value>> Lookup for F {
    fn lookup(&self, name: &str) -> Option<Value> {
        self(name)
    }
}

pub struct NoLookup;

impl Lookup for NoLookup {
    fn lookup(&self, _name: &str) -> Option<Value> {
        None
    }
}

impl Expression {
    /// Parses `source` into an `Expression`. See [`crate::parser`].
    pub fn parse(source: &str) -> Result<Expression, ExpressionError> {
        crate::parser::parse(source)
    }

    /// Evaluates the expression against `lookup`. Unresolved variables are
    /// fatal here — `spec.md` §4.1: "Unresolved variables in `eval` are
    /// fatal; variables used during `reduce` are left symbolic."
    pub fn eval(&self, lookup: &dyn Lookup) -> Result<Value, ExpressionError> {
        match self {
            Expression::Lit(v) => Ok(v.clone()),
            Expression::Var(name) => lookup
                .lookup(name)
                .ok_or_else(|| ExpressionError::UnresolvedVariable { name: name.clone() }),
            Expression::Not(e) => Ok(Value::Bool(!e.eval(lookup)?.as_bool()?)),
            Expression::And(l, r) => {
                if !l.eval(lookup)?.as_bool()? {
                    Ok(Value::Bool(false))
                } else {
                    Ok(Value::Bool(r.eval(lookup)?.as_bool()?))
                }
            }
            Expression::Or(l, r) => {
                if l.eval(lookup)?.as_bool()? {
                    Ok(Value::Bool(true))
                } else {
                    Ok(Value::Bool(r.eval(lookup)?.as_bool()?))
                }
            }
            Expression::Eq(l, r) => Ok(Value::Bool(values_equal(
                &l.eval(lookup)?,
                &r.eval(lookup)?,
            ))),
            Expression::NotEq(l, r) => Ok(Value::Bool(!values_equal(
                &l.eval(lookup)?,
                &r.eval(lookup)?,
            ))),
            Expression::Lt(l, r) => Ok(Value::Bool(l.eval(lookup)?.as_int()? < r.eval(lookup)?.as_int()?)),
            Expression::LtEq(l, r) => {
                Ok(Value::Bool(l.eval(lookup)?.as_int()? <= r.eval(lookup)?.as_int()?))
            }
            Expression::Gt(l, r) => Ok(Value::Bool(l.eval(lookup)?.as_int()? > r.eval(lookup)?.as_int()?)),
            Expression::GtEq(l, r) => {
                Ok(Value::Bool(l.eval(lookup)?.as_int()? >= r.eval(lookup)?.as_int()?))
            }
            Expression::Contains(l, r) => {
                Ok(Value::Bool(eval_contains(&l.eval(lookup)?, &r.eval(lookup)?)?))
            }
            Expression::CastList(e) => Ok(e.eval(lookup)?.cast_to_list()),
            Expression::CastString(e) => Ok(e.eval(lookup)?.cast_to_string()),
            Expression::CastInt(e) => e.eval(lookup)?.cast_to_int().map_err(Into::into),
            Expression::SizeOf(e) => Ok(Value::Int(e.eval(lookup)?.sizeof()?)),
        }
    }

    /// For expressions `A - B`, replaces conjuncts of `A` already implied by
    /// `B` with `true`, then reduces. Used by variation filtering
    /// (`spec.md` §4.1).
    pub fn sub(&self, other: &Expression) -> Result<Expression, ExpressionError> {
        let implied = conjuncts(other);
        let replaced = strip_implied_conjuncts(self, &implied);
        replaced.reduce()
    }

    /// Deterministic canonical textual form; two reduced expressions are
    /// value-equal iff their `literal()` forms match (`spec.md` §4.1).
    pub fn literal(&self) -> String {
        render(self, 0)
    }
}

fn conjuncts(expr: &Expression) -> Vec<&Expression> {
    match expr {
        Expression::And(l, r) => {
            let mut v = conjuncts(l);
            v.extend(conjuncts(r));
            v
        }
        other => vec![other],
    }
}

fn strip_implied_conjuncts(expr: &Expression, implied: &[&Expression]) -> Expression {
    match expr {
        Expression::And(l, r) => Expression::And(
            Box::new(strip_implied_conjuncts(l, implied)),
            Box::new(strip_implied_conjuncts(r, implied)),
        ),
        other => {
            if implied.iter().any(|i| *i == other) {
                Expression::Lit(Value::Bool(true))
            } else {
                other.clone()
            }
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Bool(x), Value::String(_)) | (Value::String(_), Value::Bool(x)) => {
            let _ = x;
            false
        }
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::List(x), Value::List(y)) => x == y,
        (Value::Empty, Value::Empty) => true,
        (Value::Empty, other) | (other, Value::Empty) => other.is_empty_value(),
        _ => a.as_string() == b.as_string(),
    }
}

fn eval_contains(haystack: &Value, needle: &Value) -> Result<bool, ExpressionError> {
    match (haystack, needle) {
        (Value::String(s), Value::String(n)) => Ok(s.contains(n.as_str())),
        (Value::List(xs), Value::String(n)) => {
            Ok(xs.iter().any(|x| x.eq_ignore_ascii_case(n)))
        }
        (Value::List(xs), Value::List(ns)) => Ok(ns
            .iter()
            .all(|n| xs.iter().any(|x| x.eq_ignore_ascii_case(n)))),
        _ => Err(crate::value::ValueError::IncompatibleContains {
            left: haystack.tag(),
            right: needle.tag(),
        }
        .into()),
    }
}

// ---------------------------------------------------------------------------
// Literal printing
// ---------------------------------------------------------------------------

/// Precedence levels, low to high, mirroring `spec.md` §3's operator table.
fn precedence(expr: &Expression) -> u8 {
    match expr {
        Expression::Or(..) => 1,
        Expression::And(..) => 2,
        Expression::Eq(..)
        | Expression::NotEq(..)
        | Expression::Lt(..)
        | Expression::LtEq(..)
        | Expression::Gt(..)
        | Expression::GtEq(..)
        | Expression::Contains(..) => 3,
        Expression::Not(..)
        | Expression::CastList(..)
        | Expression::CastString(..)
        | Expression::CastInt(..)
        | Expression::SizeOf(..) => 4,
        Expression::Lit(_) | Expression::Var(_) => 5,
    }
}

fn render(expr: &Expression, min_prec: u8) -> String {
    // Synthetic equality collapse: `x == true` -> `x`, `x == false` -> `!x`.
    if let Expression::Eq(l, r) = expr {
        if let Expression::Lit(Value::Bool(b)) = r.as_ref() {
            return render(
                &if *b {
                    (**l).clone()
                } else {
                    Expression::Not(l.clone())
                },
                min_prec,
            );
        }
    }

    let prec = precedence(expr);
    let body = match expr {
        Expression::Lit(v) => render_literal_value(v),
        Expression::Var(name) => format!("${{{name}}}"),
        Expression::Not(e) => format!("!{}", render(e, prec)),
        Expression::And(l, r) => format!("{}&&{}", render(l, prec), render(r, prec + 1)),
        Expression::Or(l, r) => format!("{}||{}", render(l, prec), render(r, prec + 1)),
        Expression::Eq(l, r) => format!("{}=={}", render(l, prec + 1), render(r, prec + 1)),
        Expression::NotEq(l, r) => format!("{}!={}", render(l, prec + 1), render(r, prec + 1)),
        Expression::Lt(l, r) => format!("{}<{}", render(l, prec + 1), render(r, prec + 1)),
        Expression::LtEq(l, r) => format!("{}<={}", render(l, prec + 1), render(r, prec + 1)),
        Expression::Gt(l, r) => format!("{}>{}", render(l, prec + 1), render(r, prec + 1)),
        Expression::GtEq(l, r) => format!("{}>={}", render(l, prec + 1), render(r, prec + 1)),
        Expression::Contains(l, r) => {
            format!("{} contains {}", render(l, prec + 1), render(r, prec + 1))
        }
        Expression::CastList(e) => format!("(list){}", render(e, prec)),
        Expression::CastString(e) => format!("(string){}", render(e, prec)),
        Expression::CastInt(e) => format!("(int){}", render(e, prec)),
        Expression::SizeOf(e) => format!("sizeof {}", render(e, prec)),
    };
    if prec < min_prec {
        format!("({body})")
    } else {
        body
    }
}

fn render_literal_value(v: &Value) -> String {
    match v {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::String(s) => format!("'{s}'"),
        Value::List(xs) => format!("[{}]", xs.iter().map(|x| format!("'{x}'")).collect::<Vec<_>>().join(",")),
        Value::Empty => "''".to_string(),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal())
    }
}
