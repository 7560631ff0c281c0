//! Recursive-descent parser from formula tokens to the AST.
//!
//! Standard precedence: unary minus binds tightest, then `*` and `/`,
//! then `+` and `-`. A word or number immediately followed by a bare
//! `dN` dice literal supplies that term's count, which is how the
//! `Мастерство_d6` spelling parses.

use crate::ast::{BinOp, Expr};
use crate::lexer::{Token, lex};

/// Parse a formula string. Returns `None` on any lex or parse failure;
/// callers map that to 0.
pub fn parse(source: &str) -> Option<Expr> {
    let tokens = lex(source)?;
    if tokens.is_empty() {
        return None;
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;
    if parser.pos != parser.tokens.len() {
        return None;
    }
    Some(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expression(&mut self) -> Option<Expr> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinOp::Add),
            Some(Token::Minus) => Some(BinOp::Sub),
            _ => None,
        } {
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Some(lhs)
    }

    fn term(&mut self) -> Option<Expr> {
        let mut lhs = self.factor()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinOp::Mul),
            Some(Token::Slash) => Some(BinOp::Div),
            _ => None,
        } {
            self.advance();
            let rhs = self.factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Some(lhs)
    }

    fn factor(&mut self) -> Option<Expr> {
        match self.advance()? {
            Token::Minus => Some(Expr::Neg(Box::new(self.factor()?))),
            Token::Number(n) => self.with_count_prefix(Expr::Number(n)),
            Token::Word(w) => self.with_count_prefix(Expr::Token(w)),
            Token::Dice { count, sides, keep } => Some(Expr::Dice {
                count: count.map(|c| Box::new(Expr::Number(f64::from(c)))),
                sides,
                keep,
            }),
            Token::LParen => {
                let inner = self.expression()?;
                match self.advance()? {
                    Token::RParen => Some(inner),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// A number or word directly followed by a count-less dice literal
    /// becomes that term's count.
    fn with_count_prefix(&mut self, prefix: Expr) -> Option<Expr> {
        if let Some(Token::Dice {
            count: None,
            sides,
            keep,
        }) = self.peek().cloned()
        {
            self.advance();
            return Some(Expr::Dice {
                count: Some(Box::new(prefix)),
                sides,
                keep,
            });
        }
        Some(prefix)
    }
}
