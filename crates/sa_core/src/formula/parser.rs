//! Recursive-descent parser for metric formulas.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | power
//! power   := primary ('^' unary)?        // right-associative, binds above unary minus
//! primary := number | ident | ident '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! `-2 ^ 2` is `-(2 ^ 2)`, and `2 ^ -3` is accepted.

use super::token::{tokenize, Token};
use super::EvalError;

/// Whitelisted formula functions. Anything else is rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Min,
    Max,
    Abs,
    Round,
    Clamp,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(Func::Min),
            "max" => Some(Func::Max),
            "abs" => Some(Func::Abs),
            "round" => Some(Func::Round),
            "clamp" => Some(Func::Clamp),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Func::Min => "min",
            Func::Max => "max",
            Func::Abs => "abs",
            Func::Round => "round",
            Func::Clamp => "clamp",
        }
    }

    /// Validates the argument count for this function.
    fn check_arity(&self, found: usize) -> Result<(), EvalError> {
        let ok = match self {
            Func::Min | Func::Max => found >= 2,
            Func::Abs | Func::Round => found == 1,
            Func::Clamp => found == 3,
        };
        if ok {
            Ok(())
        } else {
            let expected = match self {
                Func::Min | Func::Max => "2 or more",
                Func::Abs | Func::Round => "1",
                Func::Clamp => "3",
            };
            Err(EvalError::WrongArity { name: self.name(), expected, found })
        }
    }
}

/// Parsed expression tree. Non-recursive at evaluation time in the language
/// sense: identifiers resolve to values, never to further formulas.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Ident(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

/// A parsed, reusable formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0, len: source.len() };
        let expr = parser.expr()?;
        if let Some((token, offset)) = parser.peek() {
            return Err(EvalError::syntax(
                *offset,
                format!("unexpected {} after end of expression", token.describe()),
            ));
        }
        Ok(Formula { source: source.to_string(), expr })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Identifiers referenced by this formula, in first-appearance order.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_idents(&self.expr, &mut out);
        out
    }
}

fn collect_idents<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Ident(name) => {
            if !out.contains(&name.as_str()) {
                out.push(name);
            }
        }
        Expr::Neg(inner) => collect_idents(inner, out),
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Pow(a, b) => {
            collect_idents(a, out);
            collect_idents(b, out);
        }
        Expr::Call(_, args) => {
            for arg in args {
                collect_idents(arg, out);
            }
        }
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&(Token, usize)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn expect(&mut self, want: &Token, what: &str) -> Result<(), EvalError> {
        match self.advance() {
            Some((token, _)) if &token == want => Ok(()),
            Some((token, offset)) => {
                Err(EvalError::syntax(offset, format!("expected {}, found {}", what, token.describe())))
            }
            None => Err(EvalError::syntax(self.len, format!("expected {}, found end of formula", what))),
        }
    }

    fn expr(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.term()?;
        while let Some((token, _)) = self.peek() {
            let op = match token {
                Token::Plus => Token::Plus,
                Token::Minus => Token::Minus,
                _ => break,
            };
            self.advance();
            let rhs = self.term()?;
            lhs = match op {
                Token::Plus => Expr::Add(Box::new(lhs), Box::new(rhs)),
                _ => Expr::Sub(Box::new(lhs), Box::new(rhs)),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.unary()?;
        while let Some((token, _)) = self.peek() {
            let op = match token {
                Token::Star => Token::Star,
                Token::Slash => Token::Slash,
                _ => break,
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = match op {
                Token::Star => Expr::Mul(Box::new(lhs), Box::new(rhs)),
                _ => Expr::Div(Box::new(lhs), Box::new(rhs)),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        if let Some((Token::Minus, _)) = self.peek() {
            self.advance();
            let inner = self.unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, EvalError> {
        let base = self.primary()?;
        if let Some((Token::Caret, _)) = self.peek() {
            self.advance();
            // Right-associative: a ^ b ^ c == a ^ (b ^ c). The exponent goes
            // through `unary` so `2 ^ -3` parses.
            let exponent = self.unary()?;
            return Ok(Expr::Pow(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            Some((Token::Number(value), _)) => Ok(Expr::Number(value)),
            Some((Token::Ident(name), _)) => {
                if let Some((Token::LParen, _)) = self.peek() {
                    self.advance();
                    let func = Func::from_name(&name)
                        .ok_or(EvalError::UnknownFunction { name: name.clone() })?;
                    let args = self.call_args()?;
                    func.check_arity(args.len())?;
                    Ok(Expr::Call(func, args))
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Some((Token::LParen, _)) => {
                let inner = self.expr()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Some((token, offset)) => {
                Err(EvalError::syntax(offset, format!("unexpected {}", token.describe())))
            }
            None => Err(EvalError::syntax(self.len, "unexpected end of formula")),
        }
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = vec![self.expr()?];
        loop {
            match self.peek() {
                Some((Token::Comma, _)) => {
                    self.advance();
                    args.push(self.expr()?);
                }
                Some((Token::RParen, _)) => {
                    self.advance();
                    return Ok(args);
                }
                Some((token, offset)) => {
                    return Err(EvalError::syntax(
                        *offset,
                        format!("expected `,` or `)` in argument list, found {}", token.describe()),
                    ));
                }
                None => {
                    return Err(EvalError::syntax(self.len, "unterminated argument list"));
                }
            }
        }
    }
}
