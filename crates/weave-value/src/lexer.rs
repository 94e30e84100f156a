//! Tokenizer for the expression language. `#…` runs to end of line as a
//! comment, matching the teacher's own `//` line-comment handling in
//! `lumen-compiler::compiler::lexer`.

use crate::error::ExpressionError;
use crate::tokens::{Token, TokenKind};

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ExpressionError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            if self.pos >= self.bytes.len() {
                tokens.push(Token::new(TokenKind::Eof, start));
                break;
            }
            let c = self.bytes[self.pos] as char;
            let kind = match c {
                '|' if self.peek_is('|', 1) => {
                    self.pos += 2;
                    TokenKind::Or
                }
                '&' if self.peek_is('&', 1) => {
                    self.pos += 2;
                    TokenKind::And
                }
                '!' if self.peek_is('=', 1) => {
                    self.pos += 2;
                    TokenKind::NotEq
                }
                '!' => {
                    self.pos += 1;
                    TokenKind::Not
                }
                '=' if self.peek_is('=', 1) => {
                    self.pos += 2;
                    TokenKind::Eq
                }
                '<' if self.peek_is('=', 1) => {
                    self.pos += 2;
                    TokenKind::LtEq
                }
                '<' => {
                    self.pos += 1;
                    TokenKind::Lt
                }
                '>' if self.peek_is('=', 1) => {
                    self.pos += 2;
                    TokenKind::GtEq
                }
                '>' => {
                    self.pos += 1;
                    TokenKind::Gt
                }
                '(' => {
                    self.pos += 1;
                    TokenKind::LParen
                }
                ')' => {
                    self.pos += 1;
                    TokenKind::RParen
                }
                ',' => {
                    self.pos += 1;
                    TokenKind::Comma
                }
                '[' => {
                    self.pos += 1;
                    TokenKind::LBracket
                }
                ']' => {
                    self.pos += 1;
                    TokenKind::RBracket
                }
                '\'' | '"' => self.lex_string(c, start)?,
                '$' if self.peek_is('{', 1) => self.lex_var(start)?,
                '-' | '0'..='9' => self.lex_int(start)?,
                _ if c.is_alphabetic() || c == '_' => self.lex_word(start)?,
                other => {
                    return Err(ExpressionError::Format {
                        fragment: other.to_string(),
                        offset: start,
                        reason: "unexpected character".to_string(),
                    })
                }
            };
            tokens.push(Token::new(kind, start));
        }
        Ok(tokens)
    }

    fn peek_is(&self, ch: char, ahead: usize) -> bool {
        self.bytes
            .get(self.pos + ahead)
            .map(|b| *b as char == ch)
            .unwrap_or(false)
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.pos < self.bytes.len() && (self.bytes[self.pos] as char).is_whitespace() {
                self.pos += 1;
            }
            if self.pos < self.bytes.len() && self.bytes[self.pos] as char == '#' {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    fn lex_string(&mut self, quote: char, start: usize) -> Result<TokenKind, ExpressionError> {
        self.pos += 1;
        let content_start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] as char != quote {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return Err(ExpressionError::Format {
                fragment: self.src[start..].to_string(),
                offset: start,
                reason: "unterminated string literal".to_string(),
            });
        }
        let text = self.src[content_start..self.pos].to_string();
        self.pos += 1; // closing quote
        Ok(TokenKind::StringLit(text))
    }

    fn lex_var(&mut self, start: usize) -> Result<TokenKind, ExpressionError> {
        self.pos += 2; // `${`
        let name_start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] as char != '}' {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return Err(ExpressionError::Format {
                fragment: self.src[start..].to_string(),
                offset: start,
                reason: "unterminated '${' variable reference".to_string(),
            });
        }
        let name = self.src[name_start..self.pos].to_string();
        self.pos += 1; // `}`
        if name.is_empty() || !is_valid_var_name(&name) {
            return Err(ExpressionError::Format {
                fragment: format!("${{{name}}}"),
                offset: start,
                reason: "invalid variable name".to_string(),
            });
        }
        Ok(TokenKind::Var(name))
    }

    fn lex_int(&mut self, start: usize) -> Result<TokenKind, ExpressionError> {
        if self.bytes[self.pos] as char == '-' {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while self.pos < self.bytes.len() && (self.bytes[self.pos] as char).is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos == digits_start {
            return Err(ExpressionError::Format {
                fragment: self.src[start..self.pos.max(start + 1)].to_string(),
                offset: start,
                reason: "expected digits".to_string(),
            });
        }
        self.src[start..self.pos]
            .parse::<i64>()
            .map(TokenKind::IntLit)
            .map_err(|_| ExpressionError::Format {
                fragment: self.src[start..self.pos].to_string(),
                offset: start,
                reason: "integer literal out of range".to_string(),
            })
    }

    fn lex_word(&mut self, start: usize) -> Result<TokenKind, ExpressionError> {
        while self.pos < self.bytes.len() {
            let ch = self.bytes[self.pos] as char;
            if ch.is_alphanumeric() || ch == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word = &self.src[start..self.pos];
        let kind = match word {
            "true" => TokenKind::BoolLit(true),
            "false" => TokenKind::BoolLit(false),
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            "contains" => TokenKind::Contains,
            "sizeof" => TokenKind::SizeOf,
            "list" => TokenKind::KwList,
            "string" => TokenKind::KwString,
            "int" => TokenKind::KwInt,
            other => {
                return Err(ExpressionError::Format {
                    fragment: other.to_string(),
                    offset: start,
                    reason: "bare identifiers must be written '${name}'".to_string(),
                })
            }
        };
        Ok(kind)
    }
}

fn is_valid_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_operators() {
        assert_eq!(
            kinds("${a} && !${b}"),
            vec![
                TokenKind::Var("a".into()),
                TokenKind::And,
                TokenKind::Not,
                TokenKind::Var("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strips_comment_to_end_of_line() {
        assert_eq!(
            kinds("true # trailing note"),
            vec![TokenKind::BoolLit(true), TokenKind::Eof]
        );
    }

    #[test]
    fn rejects_unterminated_var() {
        assert!(Lexer::new("${oops").tokenize().is_err());
    }
}
