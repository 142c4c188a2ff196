//! Recursive-descent parser for conditions and actions.

use super::ast::{AssignOp, Assignment, BinaryOp, CompareOp, Expr, UnaryOp};
use super::error::RuleError;
use super::lexer::{Spanned, Token, tokenize};

/// Parses a boolean condition such as `P_pv[t] > P_load[t] and SoC[t-1] < 1`.
///
/// # Errors
///
/// Returns [`RuleError::Syntax`] with the position of the first offending token.
pub fn parse_condition(src: &str) -> Result<Expr, RuleError> {
    let mut parser = Parser::new(src)?;
    if parser.at(&Token::Eof) {
        return Err(parser.error("empty condition"));
    }
    let expr = parser.or_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parses one or more `;`-separated assignments.
///
/// # Errors
///
/// Returns [`RuleError::Syntax`] with the position of the first offending token.
pub fn parse_action(src: &str) -> Result<Vec<Assignment>, RuleError> {
    let mut parser = Parser::new(src)?;
    if parser.at(&Token::Eof) {
        return Err(parser.error("empty action"));
    }
    let mut out = vec![parser.assignment()?];
    while parser.eat(&Token::Semicolon) {
        if parser.at(&Token::Eof) {
            break;
        }
        out.push(parser.assignment()?);
    }
    parser.expect_end()?;
    Ok(out)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Result<Self, RuleError> {
        Ok(Self {
            tokens: tokenize(src)?,
            pos: 0,
        })
    }

    fn current(&self) -> &Spanned {
        // tokenize always ends with Eof and the cursor never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at(&self, token: &Token) -> bool {
        &self.current().token == token
    }

    fn advance(&mut self) -> Token {
        let token = self.current().token.clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> RuleError {
        let current = self.current();
        RuleError::syntax(current.line, current.column, message)
    }

    fn unexpected(&self, expected: &str) -> RuleError {
        self.error(format!("expected {expected}, found {}", self.current().token))
    }

    fn expect(&mut self, token: &Token) -> Result<(), RuleError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    fn expect_end(&self) -> Result<(), RuleError> {
        match &self.current().token {
            Token::Eof => Ok(()),
            Token::Assign | Token::PlusAssign | Token::MinusAssign => {
                Err(self.error("assignment is not allowed here"))
            }
            other => Err(self.error(format!("unexpected {other}"))),
        }
    }

    fn assignment(&mut self) -> Result<Assignment, RuleError> {
        let Token::Name(target) = self.current().token.clone() else {
            return Err(self.unexpected("assignment target"));
        };
        self.advance();
        if !self.at(&Token::LBracket) {
            return Err(self.unexpected("`[` after assignment target"));
        }
        self.advance();
        let index = self.or_expr()?;
        self.expect(&Token::RBracket)?;
        let op = match self.current().token {
            Token::Assign => AssignOp::Set,
            Token::PlusAssign => AssignOp::Add,
            Token::MinusAssign => AssignOp::Sub,
            _ => return Err(self.unexpected("`=`, `+=` or `-=`")),
        };
        self.advance();
        let value = self.or_expr()?;
        Ok(Assignment {
            target,
            index,
            op,
            value,
        })
    }

    fn or_expr(&mut self) -> Result<Expr, RuleError> {
        let mut lhs = self.and_expr()?;
        while self.eat(&Token::Or) {
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, RuleError> {
        let mut lhs = self.not_expr()?;
        while self.eat(&Token::And) {
            let rhs = self.not_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, RuleError> {
        if self.eat(&Token::Not) {
            return Ok(Expr::Not(Box::new(self.not_expr()?)));
        }
        self.comparison()
    }

    fn compare_op(&self) -> Option<CompareOp> {
        Some(match self.current().token {
            Token::Eq => CompareOp::Eq,
            Token::Ne => CompareOp::Ne,
            Token::Lt => CompareOp::Lt,
            Token::Le => CompareOp::Le,
            Token::Gt => CompareOp::Gt,
            Token::Ge => CompareOp::Ge,
            _ => return None,
        })
    }

    fn comparison(&mut self) -> Result<Expr, RuleError> {
        let lhs = self.sum()?;
        let Some(op) = self.compare_op() else {
            return Ok(lhs);
        };
        self.advance();
        let rhs = self.sum()?;
        if self.compare_op().is_some() {
            return Err(self.error("chained comparisons are not supported; combine them with `and`"));
        }
        Ok(Expr::Compare(op, Box::new(lhs), Box::new(rhs)))
    }

    fn sum(&mut self) -> Result<Expr, RuleError> {
        let mut lhs = self.product()?;
        loop {
            let op = match self.current().token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.product()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn product(&mut self) -> Result<Expr, RuleError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.current().token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, RuleError> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        if self.eat(&Token::Plus) {
            return Ok(Expr::Unary(UnaryOp::Plus, Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, RuleError> {
        match self.current().token.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Token::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Token::LParen => {
                self.advance();
                let inner = self.or_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Name(name) => {
                self.advance();
                if self.eat(&Token::LBracket) {
                    let index = self.or_expr()?;
                    self.expect(&Token::RBracket)?;
                    Ok(Expr::Index {
                        name,
                        index: Box::new(index),
                    })
                } else if self.eat(&Token::LParen) {
                    let mut args = vec![self.or_expr()?];
                    while self.eat(&Token::Comma) {
                        args.push(self.or_expr()?);
                    }
                    self.expect(&Token::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }
}
