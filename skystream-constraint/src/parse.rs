//! Recursive descent parser for the SQL92 WHERE clause subset.
//!
//! Grammar highlights: numeric, string and `TIMESTAMP '...'` literals,
//! NULL, column references, arithmetic with unary minus, `||`
//! concatenation, the six comparisons, `[NOT] BETWEEN`, `[NOT] IN`,
//! `[NOT] LIKE ... [ESCAPE ...]`, `IS [NOT] NULL`, and boolean
//! NOT/AND/OR with parenthesization. No functions, CAST or subqueries.

use chrono::NaiveDateTime;

use crate::ast::{ArithOp, CmpOp, ConstraintNode};
use crate::error::{ConstraintError, Result};
use crate::lex::{tokenize, Spanned, Token};

const RESERVED: [&str; 10] = [
    "AND", "OR", "IN", "IS", "NOT", "NULL", "LIKE", "BETWEEN", "ESCAPE", "TIMESTAMP",
];

/// A WHERE clause parser. Parsers carry no state between calls but are
/// intended to be owned one-per-worker rather than shared.
#[derive(Debug, Default)]
pub struct ConstraintParser;

impl ConstraintParser {
    pub fn new() -> ConstraintParser {
        ConstraintParser
    }

    pub fn parse(&self, input: &str) -> Result<ConstraintNode> {
        let tokens = tokenize(input)?;
        let mut p = Parser {
            tokens: &tokens,
            pos: 0,
            end: input.len(),
        };
        let node = p.search_condition()?;
        if p.pos < p.tokens.len() {
            return Err(p.error_here("unexpected trailing input"));
        }
        Ok(node)
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |s| s.offset)
    }

    fn error_here(&self, message: impl Into<String>) -> ConstraintError {
        ConstraintError::syntax(self.offset(), message)
    }

    fn bump(&mut self) -> Option<&'a Token> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected {what}")))
        }
    }

    /// Consumes the given keyword (case-insensitive) if it is next.
    fn eat_keyword(&mut self, kw: &str) -> bool {
        if let Some(Token::Ident(word)) = self.peek() {
            if word.eq_ignore_ascii_case(kw) {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected {kw}")))
        }
    }

    // search_condition := boolean_term [OR search_condition]
    fn search_condition(&mut self) -> Result<ConstraintNode> {
        let lhs = self.boolean_term()?;
        if self.eat_keyword("OR") {
            let rhs = self.search_condition()?;
            return Ok(ConstraintNode::Or(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    // boolean_term := boolean_factor [AND boolean_term]
    fn boolean_term(&mut self) -> Result<ConstraintNode> {
        let lhs = self.boolean_factor()?;
        if self.eat_keyword("AND") {
            let rhs = self.boolean_term()?;
            return Ok(ConstraintNode::And(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    // boolean_factor := [NOT] boolean_primary
    fn boolean_factor(&mut self) -> Result<ConstraintNode> {
        if self.eat_keyword("NOT") {
            let inner = self.boolean_primary()?;
            return Ok(ConstraintNode::Not(Box::new(inner)));
        }
        self.boolean_primary()
    }

    // boolean_primary := predicate | '(' search_condition ')'
    //
    // A leading '(' is ambiguous: it may open a parenthesized value
    // expression inside a predicate, or a parenthesized search
    // condition. Try the predicate first and roll back on failure.
    fn boolean_primary(&mut self) -> Result<ConstraintNode> {
        let checkpoint = self.pos;
        match self.predicate() {
            Ok(node) => Ok(node),
            Err(err) => {
                self.pos = checkpoint;
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let inner = self.search_condition()?;
                    self.expect(&Token::RParen, "')'")?;
                    Ok(inner)
                } else {
                    Err(err)
                }
            }
        }
    }

    // predicate := comparison | [NOT] BETWEEN/IN/LIKE | IS [NOT] NULL
    fn predicate(&mut self) -> Result<ConstraintNode> {
        let lhs = self.row_value_constructor()?;
        if let Some(op) = self.comparison_op() {
            let rhs = self.row_value_constructor()?;
            return Ok(ConstraintNode::Compare(op, Box::new(lhs), Box::new(rhs)));
        }
        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            self.expect_keyword("NULL")?;
            return Ok(ConstraintNode::IsNull {
                expr: Box::new(lhs),
                negated,
            });
        }
        let negated = self.eat_keyword("NOT");
        if self.eat_keyword("BETWEEN") {
            let low = self.row_value_constructor()?;
            self.expect_keyword("AND")?;
            let high = self.row_value_constructor()?;
            return Ok(ConstraintNode::Between {
                expr: Box::new(lhs),
                negated,
                low: Box::new(low),
                high: Box::new(high),
            });
        }
        if self.eat_keyword("IN") {
            self.expect(&Token::LParen, "'('")?;
            let mut list = Vec::new();
            if self.peek() != Some(&Token::RParen) {
                loop {
                    list.push(self.value_expression()?);
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
            }
            self.expect(&Token::RParen, "')'")?;
            return Ok(ConstraintNode::In {
                expr: Box::new(lhs),
                negated,
                list,
            });
        }
        if self.eat_keyword("LIKE") {
            let pattern = self.value_expression()?;
            let escape = if self.eat_keyword("ESCAPE") {
                Some(Box::new(self.value_expression()?))
            } else {
                None
            };
            return Ok(ConstraintNode::Like {
                expr: Box::new(lhs),
                negated,
                pattern: Box::new(pattern),
                escape,
            });
        }
        Err(self.error_here("expected a comparison, BETWEEN, IN, LIKE or IS"))
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek()? {
            Token::Eq => CmpOp::Eq,
            Token::Ne => CmpOp::Ne,
            Token::Lt => CmpOp::Lt,
            Token::Le => CmpOp::Le,
            Token::Gt => CmpOp::Gt,
            Token::Ge => CmpOp::Ge,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    // row_value_constructor := NULL | value_expression
    fn row_value_constructor(&mut self) -> Result<ConstraintNode> {
        if self.eat_keyword("NULL") {
            return Ok(ConstraintNode::Null);
        }
        self.value_expression()
    }

    // value_expression := term [('+' | '-' | '||') value_expression]
    fn value_expression(&mut self) -> Result<ConstraintNode> {
        let lhs = self.term()?;
        if self.eat(&Token::Plus) {
            let rhs = self.value_expression()?;
            return Ok(ConstraintNode::Arith(
                ArithOp::Add,
                Box::new(lhs),
                Box::new(rhs),
            ));
        }
        if self.eat(&Token::Minus) {
            let rhs = self.value_expression()?;
            return Ok(ConstraintNode::Arith(
                ArithOp::Sub,
                Box::new(lhs),
                Box::new(rhs),
            ));
        }
        if self.eat(&Token::Concat) {
            let rhs = self.value_expression()?;
            return Ok(ConstraintNode::Concat(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    // term := factor [('*' | '/') term]
    fn term(&mut self) -> Result<ConstraintNode> {
        let lhs = self.factor()?;
        if self.eat(&Token::Star) {
            let rhs = self.term()?;
            return Ok(ConstraintNode::Arith(
                ArithOp::Mul,
                Box::new(lhs),
                Box::new(rhs),
            ));
        }
        if self.eat(&Token::Slash) {
            let rhs = self.term()?;
            return Ok(ConstraintNode::Arith(
                ArithOp::Div,
                Box::new(lhs),
                Box::new(rhs),
            ));
        }
        Ok(lhs)
    }

    // factor := ['+' | '-'] value_expression_primary
    fn factor(&mut self) -> Result<ConstraintNode> {
        if self.eat(&Token::Minus) {
            let inner = self.primary()?;
            return Ok(ConstraintNode::Neg(Box::new(inner)));
        }
        if self.eat(&Token::Plus) {
            return self.primary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<ConstraintNode> {
        let offset = self.offset();
        match self.bump() {
            Some(Token::Number(lexeme)) => Ok(ConstraintNode::Number(lexeme.clone())),
            Some(Token::Str(s)) => Ok(ConstraintNode::Str(s.clone())),
            Some(Token::LParen) => {
                let inner = self.value_expression()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("TIMESTAMP") => {
                match self.bump() {
                    Some(Token::Str(s)) => {
                        if NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_err() {
                            return Err(ConstraintError::BadTimestamp(s.clone()));
                        }
                        Ok(ConstraintNode::Timestamp(s.clone()))
                    }
                    _ => Err(ConstraintError::syntax(
                        offset,
                        "TIMESTAMP must be followed by a quoted timestamp",
                    )),
                }
            }
            Some(Token::Ident(word)) => {
                if RESERVED.iter().any(|kw| word.eq_ignore_ascii_case(kw)) {
                    Err(ConstraintError::syntax(
                        offset,
                        format!("unexpected keyword {word}"),
                    ))
                } else {
                    Ok(ConstraintNode::Column(word.clone()))
                }
            }
            _ => Err(ConstraintError::syntax(offset, "expected a value expression")),
        }
    }
}
