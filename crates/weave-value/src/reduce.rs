//! Quine–McCluskey-style algebraic reduction (`spec.md` §4.1 "Reduction").
//!
//! `reduce` treats every maximal non-boolean-combinator subexpression as an
//! opaque boolean "atom", builds the truth table of the expression over its
//! atoms, minimizes it to a sum-of-products via prime implicants + an
//! essential cover, and renders the result back through [`crate::expr`]'s
//! canonical printer.

use crate::error::ExpressionError;
use crate::expr::{Expression, NoLookup};
use crate::value::Value;

pub const MAX_REDUCE_VARIABLES: usize = 12;

impl Expression {
    pub fn reduce(&self) -> Result<Expression, ExpressionError> {
        let folded = fold_pure_literals(self);
        if let Expression::Lit(Value::Bool(b)) = folded {
            return Ok(Expression::Lit(Value::Bool(b)));
        }

        let mut atoms: Vec<Expression> = Vec::new();
        collect_atoms(&folded, &mut atoms);
        if atoms.len() > MAX_REDUCE_VARIABLES {
            return Err(ExpressionError::TooManyVariables {
                found: atoms.len(),
                max: MAX_REDUCE_VARIABLES,
            });
        }

        let n = atoms.len();
        let rows = 1usize << n;
        let mut minterms = Vec::with_capacity(rows);
        for bits in 0..rows {
            let assignment: Vec<bool> = (0..n).map(|i| (bits >> i) & 1 == 1).collect();
            if eval_with_assignment(&folded, &atoms, &assignment) {
                minterms.push(bits);
            }
        }

        if minterms.is_empty() {
            return Ok(Expression::Lit(Value::Bool(false)));
        }
        if minterms.len() == rows {
            return Ok(Expression::Lit(Value::Bool(true)));
        }

        let primes = prime_implicants(n, &minterms);
        let cover = essential_cover(&primes, &minterms);
        Ok(render_sum_of_products(&cover, &atoms))
    }
}

/// Bottom-up pass: any subtree that type-checks as a bool with no
/// unresolved variables is collapsed to a `Lit(Bool(_))` constant.
fn fold_pure_literals(expr: &Expression) -> Expression {
    match expr {
        Expression::Not(e) => {
            let e = fold_pure_literals(e);
            if let Expression::Lit(Value::Bool(b)) = e {
                Expression::Lit(Value::Bool(!b))
            } else {
                Expression::Not(Box::new(e))
            }
        }
        Expression::And(l, r) => {
            let l = fold_pure_literals(l);
            let r = fold_pure_literals(r);
            match (&l, &r) {
                (Expression::Lit(Value::Bool(a)), Expression::Lit(Value::Bool(b))) => {
                    Expression::Lit(Value::Bool(*a && *b))
                }
                _ => Expression::And(Box::new(l), Box::new(r)),
            }
        }
        Expression::Or(l, r) => {
            let l = fold_pure_literals(l);
            let r = fold_pure_literals(r);
            match (&l, &r) {
                (Expression::Lit(Value::Bool(a)), Expression::Lit(Value::Bool(b))) => {
                    Expression::Lit(Value::Bool(*a || *b))
                }
                _ => Expression::Or(Box::new(l), Box::new(r)),
            }
        }
        other => match other.eval(&NoLookup) {
            Ok(Value::Bool(b)) => Expression::Lit(Value::Bool(b)),
            _ => other.clone(),
        },
    }
}

fn collect_atoms(expr: &Expression, atoms: &mut Vec<Expression>) {
    match expr {
        Expression::Not(e) => collect_atoms(e, atoms),
        Expression::And(l, r) | Expression::Or(l, r) => {
            collect_atoms(l, atoms);
            collect_atoms(r, atoms);
        }
        Expression::Lit(Value::Bool(_)) => {}
        other => {
            if !atoms.contains(other) {
                atoms.push(other.clone());
            }
        }
    }
}

fn eval_with_assignment(expr: &Expression, atoms: &[Expression], assignment: &[bool]) -> bool {
    match expr {
        Expression::Lit(Value::Bool(b)) => *b,
        Expression::Not(e) => !eval_with_assignment(e, atoms, assignment),
        Expression::And(l, r) => {
            eval_with_assignment(l, atoms, assignment) && eval_with_assignment(r, atoms, assignment)
        }
        Expression::Or(l, r) => {
            eval_with_assignment(l, atoms, assignment) || eval_with_assignment(r, atoms, assignment)
        }
        other => {
            let idx = atoms
                .iter()
                .position(|a| a == other)
                .expect("every leaf was registered as an atom during collection");
            assignment[idx]
        }
    }
}

/// An implicant over `n` atom positions: `Some(true)`/`Some(false)` pins a
/// position, `None` means the position has been eliminated (don't-care for
/// this implicant).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Implicant {
    bits: Vec<Option<bool>>,
}

impl Implicant {
    fn from_minterm(n: usize, minterm: usize) -> Self {
        Self {
            bits: (0..n).map(|i| Some((minterm >> i) & 1 == 1)).collect(),
        }
    }

    fn combine(&self, other: &Implicant) -> Option<Implicant> {
        let mut diff_at = None;
        for i in 0..self.bits.len() {
            if self.bits[i] != other.bits[i] {
                if diff_at.is_some() {
                    return None;
                }
                diff_at = Some(i);
            }
        }
        let diff_at = diff_at?;
        if self.bits[diff_at].is_none() {
            return None;
        }
        let mut bits = self.bits.clone();
        bits[diff_at] = None;
        Some(Implicant { bits })
    }

    fn covers(&self, minterm: usize) -> bool {
        self.bits
            .iter()
            .enumerate()
            .all(|(i, b)| match b {
                None => true,
                Some(v) => *v == ((minterm >> i) & 1 == 1),
            })
    }
}

fn prime_implicants(n: usize, minterms: &[usize]) -> Vec<Implicant> {
    let mut current: Vec<Implicant> = minterms
        .iter()
        .map(|&m| Implicant::from_minterm(n, m))
        .collect();
    let mut primes: Vec<Implicant> = Vec::new();

    loop {
        let mut combined_flags = vec![false; current.len()];
        let mut next: Vec<Implicant> = Vec::new();
        for i in 0..current.len() {
            for j in (i + 1)..current.len() {
                if let Some(merged) = current[i].combine(&current[j]) {
                    combined_flags[i] = true;
                    combined_flags[j] = true;
                    if !next.contains(&merged) {
                        next.push(merged);
                    }
                }
            }
        }
        for (i, implicant) in current.iter().enumerate() {
            if !combined_flags[i] && !primes.contains(implicant) {
                primes.push(implicant.clone());
            }
        }
        if next.is_empty() {
            break;
        }
        current = next;
    }
    primes
}

/// Picks essential primes first (the sole implicant covering some minterm),
/// then greedily covers whatever remains.
fn essential_cover(primes: &[Implicant], minterms: &[usize]) -> Vec<Implicant> {
    let mut remaining: Vec<usize> = minterms.to_vec();
    let mut chosen: Vec<Implicant> = Vec::new();

    for &m in minterms {
        let covering: Vec<&Implicant> = primes.iter().filter(|p| p.covers(m)).collect();
        if covering.len() == 1 && !chosen.contains(covering[0]) {
            chosen.push(covering[0].clone());
        }
    }
    remaining.retain(|m| !chosen.iter().any(|c| c.covers(*m)));

    while !remaining.is_empty() {
        let best = primes
            .iter()
            .filter(|p| !chosen.contains(p))
            .max_by_key(|p| remaining.iter().filter(|&&m| p.covers(m)).count())
            .expect("remaining minterms must be covered by some prime implicant");
        chosen.push(best.clone());
        remaining.retain(|m| !best.covers(*m));
    }
    chosen
}

fn render_sum_of_products(cover: &[Implicant], atoms: &[Expression]) -> Expression {
    let mut products: Vec<Expression> = cover
        .iter()
        .map(|implicant| {
            let mut conjuncts: Vec<Expression> = Vec::new();
            for (i, bit) in implicant.bits.iter().enumerate() {
                if let Some(v) = bit {
                    let atom = atoms[i].clone();
                    conjuncts.push(if *v { atom } else { Expression::Not(Box::new(atom)) });
                }
            }
            conjuncts
                .into_iter()
                .reduce(|l, r| Expression::And(Box::new(l), Box::new(r)))
                .unwrap_or(Expression::Lit(Value::Bool(true)))
        })
        .collect();
    products.sort_by(|a, b| a.literal().cmp(&b.literal()));
    products.dedup();
    products
        .into_iter()
        .reduce(|l, r| Expression::Or(Box::new(l), Box::new(r)))
        .unwrap_or(Expression::Lit(Value::Bool(false)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expression {
        Expression::Var(name.to_string())
    }

    #[test]
    fn contradiction_reduces_to_false() {
        let e = Expression::And(Box::new(var("a")), Box::new(Expression::Not(Box::new(var("a")))));
        assert_eq!(e.reduce().unwrap(), Expression::Lit(Value::Bool(false)));
    }

    #[test]
    fn tautology_reduces_to_true() {
        let e = Expression::Or(Box::new(var("a")), Box::new(Expression::Not(Box::new(var("a")))));
        assert_eq!(e.reduce().unwrap(), Expression::Lit(Value::Bool(true)));
    }

    #[test]
    fn list_contains_literal_folds_to_true() {
        let e = Expression::Contains(
            Box::new(Expression::Lit(Value::List(vec!["a".into(), "b".into()]))),
            Box::new(Expression::Lit(Value::String("a".into()))),
        );
        assert_eq!(e.reduce().unwrap(), Expression::Lit(Value::Bool(true)));
    }

    #[test]
    fn reduce_is_idempotent() {
        let e = Expression::Or(
            Box::new(Expression::And(Box::new(var("a")), Box::new(var("b")))),
            Box::new(Expression::And(Box::new(var("a")), Box::new(Expression::Not(Box::new(var("b")))))),
        );
        let once = e.reduce().unwrap();
        let twice = once.reduce().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn reduce_is_sound_over_all_assignments() {
        // (a && b) || (a && !b) == a
        let e = Expression::Or(
            Box::new(Expression::And(Box::new(var("a")), Box::new(var("b")))),
            Box::new(Expression::And(Box::new(var("a")), Box::new(Expression::Not(Box::new(var("b")))))),
        );
        let reduced = e.reduce().unwrap();
        for a in [false, true] {
            for b in [false, true] {
                let lookup = move |name: &str| match name {
                    "a" => Some(Value::Bool(a)),
                    "b" => Some(Value::Bool(b)),
                    _ => None,
                };
                assert_eq!(e.eval(&lookup).unwrap(), reduced.eval(&lookup).unwrap());
            }
        }
        assert_eq!(reduced.literal(), "${a}");
    }

    #[test]
    fn too_many_variables_is_an_error() {
        let mut e = var("v0");
        for i in 1..=MAX_REDUCE_VARIABLES {
            e = Expression::Or(Box::new(e), Box::new(var(&format!("v{i}"))));
        }
        assert!(matches!(
            e.reduce(),
            Err(ExpressionError::TooManyVariables { .. })
        ));
    }
}
