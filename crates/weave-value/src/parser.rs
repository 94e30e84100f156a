//! Recursive-descent precedence-climbing parser for the expression
//! language, in the same shape as `lumen-compiler::compiler::parser::parse_expr`
//! (a binding-power table keyed on token kind) but scoped to the small
//! grammar in `spec.md` §3.

use crate::error::ExpressionError;
use crate::expr::Expression;
use crate::lexer::Lexer;
use crate::tokens::{Token, TokenKind};
use crate::value::Value;

pub fn parse(source: &str) -> Result<Expression, ExpressionError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr(0)?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Binding power of each binary operator, low to high per `spec.md` §3:
/// `|| < && < (== != < <= > >= contains)`.
fn binary_bp(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Or => Some(1),
        TokenKind::And => Some(2),
        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Gt
        | TokenKind::GtEq
        | TokenKind::Contains => Some(3),
        _ => None,
    }
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_n(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn expect_eof(&self) -> Result<(), ExpressionError> {
        if self.peek().kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(ExpressionError::Format {
                fragment: self.peek().kind.to_string(),
                offset: self.peek().offset,
                reason: "trailing input after expression".to_string(),
            })
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ExpressionError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(ExpressionError::Format {
                fragment: self.peek().kind.to_string(),
                offset: self.peek().offset,
                reason: format!("expected '{kind}'"),
            })
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expression, ExpressionError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some(bp) = binary_bp(&self.peek().kind) else {
                break;
            };
            if bp < min_bp {
                break;
            }
            let op = self.advance().kind;
            let rhs = self.parse_expr(bp + 1)?;
            lhs = build_binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expression, ExpressionError> {
        match &self.peek().kind {
            TokenKind::Not => {
                self.advance();
                Ok(Expression::Not(Box::new(self.parse_unary()?)))
            }
            TokenKind::SizeOf => {
                self.advance();
                Ok(Expression::SizeOf(Box::new(self.parse_unary()?)))
            }
            TokenKind::LParen if self.is_cast_ahead() => {
                self.advance();
                let kw = self.advance().kind;
                self.expect(TokenKind::RParen)?;
                let operand = Box::new(self.parse_unary()?);
                Ok(match kw {
                    TokenKind::KwList => Expression::CastList(operand),
                    TokenKind::KwString => Expression::CastString(operand),
                    TokenKind::KwInt => Expression::CastInt(operand),
                    _ => unreachable!("is_cast_ahead guarantees a cast keyword"),
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn is_cast_ahead(&self) -> bool {
        matches!(
            self.peek_n(1).map(|t| &t.kind),
            Some(TokenKind::KwList) | Some(TokenKind::KwString) | Some(TokenKind::KwInt)
        ) && matches!(self.peek_n(2).map(|t| &t.kind), Some(TokenKind::RParen))
    }

    fn parse_primary(&mut self) -> Result<Expression, ExpressionError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::BoolLit(b) => {
                self.advance();
                Ok(Expression::Lit(Value::Bool(b)))
            }
            TokenKind::IntLit(i) => {
                self.advance();
                Ok(Expression::Lit(Value::Int(i)))
            }
            TokenKind::StringLit(s) => {
                self.advance();
                Ok(Expression::Lit(Value::String(s)))
            }
            TokenKind::Var(name) => {
                self.advance();
                Ok(Expression::Var(name))
            }
            TokenKind::LBracket => self.parse_list_literal(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            other => Err(ExpressionError::Format {
                fragment: other.to_string(),
                offset: tok.offset,
                reason: "expected an operand".to_string(),
            }),
        }
    }

    fn parse_list_literal(&mut self) -> Result<Expression, ExpressionError> {
        self.expect(TokenKind::LBracket)?;
        let mut items = Vec::new();
        if self.peek().kind != TokenKind::RBracket {
            loop {
                match self.advance().kind {
                    TokenKind::StringLit(s) => items.push(s),
                    other => {
                        return Err(ExpressionError::Format {
                            fragment: other.to_string(),
                            offset: self.peek().offset,
                            reason: "list literal elements must be string literals".to_string(),
                        })
                    }
                }
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Expression::Lit(Value::normalize_list(items)))
    }
}

fn build_binary(op: TokenKind, lhs: Expression, rhs: Expression) -> Expression {
    let l = Box::new(lhs);
    let r = Box::new(rhs);
    match op {
        TokenKind::Or => Expression::Or(l, r),
        TokenKind::And => Expression::And(l, r),
        TokenKind::Eq => Expression::Eq(l, r),
        TokenKind::NotEq => Expression::NotEq(l, r),
        TokenKind::Lt => Expression::Lt(l, r),
        TokenKind::LtEq => Expression::LtEq(l, r),
        TokenKind::Gt => Expression::Gt(l, r),
        TokenKind::GtEq => Expression::GtEq(l, r),
        TokenKind::Contains => Expression::Contains(l, r),
        other => unreachable!("binary_bp only accepts binary operator tokens, got {other:?}"),
    }
}
