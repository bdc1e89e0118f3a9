//! Formula language for material quantities
//!
//! Material lines carry small arithmetic expressions written against the
//! quote's dimensions, e.g. `(ancho*2 + alto*2) / 6` or
//! `si(malla = 1, area, 0)`. Formulas are parsed once into an [`Expr`] tree
//! and evaluated against an explicit [`Environment`]; evaluation is pure, so
//! the same formula and environment always produce the same number.
//!
//! Grammar (lowest precedence first):
//!
//! ```text
//! comparison := additive (('=' | '==' | '!=' | '<>' | '<' | '<=' | '>' | '>=') additive)?
//! additive   := term (('+' | '-') term)*
//! term       := unary (('*' | '/') unary)*
//! unary      := ('-' | '+') unary | primary
//! primary    := NUMBER | IDENT | IDENT '(' comparison (',' comparison)* ')' | '(' comparison ')'
//! ```
//!
//! Identifiers are case-insensitive. Comparisons evaluate to `1` or `0`.

use miette::Diagnostic;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Named variables visible to a formula
pub type Environment = BTreeMap<String, f64>;

/// Tolerance used by `=` and `!=`
const EQ_EPSILON: f64 = 1e-9;

/// Deepest nesting of parentheses, calls and unary signs
const MAX_NESTING: usize = 64;

/// Longest formula, in tokens; bounds the depth of operator chains
const MAX_TOKENS: usize = 2048;

/// Errors raised while parsing or evaluating a formula
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum FormulaError {
    #[error("syntax error at position {position}: {message}")]
    #[diagnostic(
        code(cotizador::formula::syntax),
        help("Formulas support numbers, variables, + - * /, parentheses, comparisons and functions like si(), redondear_abajo()")
    )]
    Syntax { position: usize, message: String },

    #[error("unknown variable '{0}'")]
    #[diagnostic(
        code(cotizador::formula::unknown_variable),
        help("Built-in variables: ancho, alto, area, perimetro, malla, hojas, divisiones_horizontales, divisiones_verticales, divisiones_decorativas")
    )]
    UnknownVariable(String),

    #[error("unknown function '{0}'")]
    #[diagnostic(
        code(cotizador::formula::unknown_function),
        help("Available functions: si/if, redondear_abajo/piso/floor, redondear_arriba/techo/ceil, redondear/round, min, max, abs")
    )]
    UnknownFunction(String),

    #[error("function '{function}' expects {expected} argument(s), got {found}")]
    #[diagnostic(code(cotizador::formula::arity))]
    Arity {
        function: String,
        expected: &'static str,
        found: usize,
    },

    #[error("division by zero")]
    #[diagnostic(code(cotizador::formula::division_by_zero))]
    DivisionByZero,

    #[error("formula produced a non-finite value")]
    #[diagnostic(code(cotizador::formula::non_finite))]
    NonFinite,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `si(cond, then, else)` - only the selected branch is evaluated
    If,
    /// Round down
    Floor,
    /// Round up
    Ceil,
    /// Round half away from zero, optionally to N decimals
    Round,
    Min,
    Max,
    Abs,
}

impl Function {
    /// Resolve a (lower-cased) function name, including the Spanish aliases
    /// found in shop formulas
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "if" | "si" => Some(Function::If),
            "floor" | "piso" | "redondear_abajo" | "redondeo_abajo" => Some(Function::Floor),
            "ceil" | "techo" | "redondear_arriba" | "redondeo_arriba" => Some(Function::Ceil),
            "round" | "redondear" => Some(Function::Round),
            "min" | "minimo" => Some(Function::Min),
            "max" | "maximo" => Some(Function::Max),
            "abs" => Some(Function::Abs),
            _ => None,
        }
    }

    fn check_arity(&self, name: &str, found: usize) -> Result<(), FormulaError> {
        let (ok, expected) = match self {
            Function::If => (found == 3, "3"),
            Function::Floor | Function::Ceil | Function::Abs => (found == 1, "1"),
            Function::Round => ((1..=2).contains(&found), "1 or 2"),
            Function::Min | Function::Max => (found >= 1, "at least 1"),
        };
        if ok {
            Ok(())
        } else {
            Err(FormulaError::Arity {
                function: name.to_string(),
                expected,
                found,
            })
        }
    }
}

/// Parsed formula tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    Variable(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Evaluate against an environment
    pub fn eval(&self, env: &Environment) -> Result<f64, FormulaError> {
        match self {
            Expr::Literal(value) => Ok(*value),
            Expr::Variable(name) => env
                .get(name)
                .copied()
                .ok_or_else(|| FormulaError::UnknownVariable(name.clone())),
            Expr::Binary { op, lhs, rhs } => {
                let a = lhs.eval(env)?;
                let b = rhs.eval(env)?;
                apply_binary(*op, a, b)
            }
            Expr::Call { function, args } => apply_call(*function, args, env),
        }
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Variable(name) => {
                out.insert(name.clone());
            }
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
        }
    }
}

fn truth(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn apply_binary(op: BinaryOp, a: f64, b: f64) -> Result<f64, FormulaError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::Eq => truth((a - b).abs() < EQ_EPSILON),
        BinaryOp::Ne => truth((a - b).abs() >= EQ_EPSILON),
        BinaryOp::Lt => truth(a < b),
        BinaryOp::Le => truth(a <= b),
        BinaryOp::Gt => truth(a > b),
        BinaryOp::Ge => truth(a >= b),
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite)
    }
}

fn apply_call(function: Function, args: &[Expr], env: &Environment) -> Result<f64, FormulaError> {
    match function {
        Function::If => {
            let condition = args[0].eval(env)?;
            if condition != 0.0 {
                args[1].eval(env)
            } else {
                args[2].eval(env)
            }
        }
        Function::Floor => Ok(args[0].eval(env)?.floor()),
        Function::Ceil => Ok(args[0].eval(env)?.ceil()),
        Function::Abs => Ok(args[0].eval(env)?.abs()),
        Function::Round => {
            let value = args[0].eval(env)?;
            match args.get(1) {
                None => Ok(value.round()),
                Some(decimals) => {
                    let factor = 10f64.powi(decimals.eval(env)?.round() as i32);
                    let rounded = (value * factor).round() / factor;
                    if rounded.is_finite() {
                        Ok(rounded)
                    } else {
                        Err(FormulaError::NonFinite)
                    }
                }
            }
        }
        Function::Min | Function::Max => {
            let mut acc: Option<f64> = None;
            for arg in args {
                let value = arg.eval(env)?;
                acc = Some(match (acc, function) {
                    (None, _) => value,
                    (Some(current), Function::Min) => current.min(value),
                    (Some(current), _) => current.max(value),
                });
            }
            // arity is checked at parse time
            Ok(acc.unwrap_or(0.0))
        }
    }
}

/// A parsed, reusable formula
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse a formula string
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        if let Some((_, position)) = tokens.get(MAX_TOKENS) {
            return Err(FormulaError::Syntax {
                position: *position,
                message: format!("formula is longer than {} tokens", MAX_TOKENS),
            });
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            len: source.len(),
            depth: 0,
        };
        let expr = parser.comparison()?;
        if let Some((token, position)) = parser.tokens.get(parser.pos) {
            return Err(FormulaError::Syntax {
                position: *position,
                message: format!("unexpected {}", token),
            });
        }
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Evaluate against an environment
    pub fn evaluate(&self, env: &Environment) -> Result<f64, FormulaError> {
        let value = self.expr.eval(env)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite)
        }
    }

    /// Variables referenced anywhere in the formula (including untaken branches)
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.expr.collect_variables(&mut out);
        out
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Parse and evaluate in one step
pub fn evaluate(formula: &str, env: &Environment) -> Result<f64, FormulaError> {
    Formula::parse(formula)?.evaluate(env)
}

// =========================================================================
// Lexer
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(BinaryOp),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::Ident(name) => write!(f, "'{}'", name),
            Token::Op(op) => write!(f, "'{}'", op),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, FormulaError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || c == b'.' {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            let text = &source[start..i];
            let value = text.parse::<f64>().map_err(|_| FormulaError::Syntax {
                position: start,
                message: format!("invalid number '{}'", text),
            })?;
            tokens.push((Token::Number(value), start));
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push((Token::Ident(source[start..i].to_ascii_lowercase()), start));
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let (token, width) = match (c, next) {
            (b'+', _) => (Token::Op(BinaryOp::Add), 1),
            (b'-', _) => (Token::Op(BinaryOp::Sub), 1),
            (b'*', _) => (Token::Op(BinaryOp::Mul), 1),
            (b'/', _) => (Token::Op(BinaryOp::Div), 1),
            (b'(', _) => (Token::LParen, 1),
            (b')', _) => (Token::RParen, 1),
            (b',', _) => (Token::Comma, 1),
            (b'=', Some(b'=')) => (Token::Op(BinaryOp::Eq), 2),
            (b'=', _) => (Token::Op(BinaryOp::Eq), 1),
            (b'!', Some(b'=')) => (Token::Op(BinaryOp::Ne), 2),
            (b'<', Some(b'>')) => (Token::Op(BinaryOp::Ne), 2),
            (b'<', Some(b'=')) => (Token::Op(BinaryOp::Le), 2),
            (b'<', _) => (Token::Op(BinaryOp::Lt), 1),
            (b'>', Some(b'=')) => (Token::Op(BinaryOp::Ge), 2),
            (b'>', _) => (Token::Op(BinaryOp::Gt), 1),
            _ => {
                let ch = source[start..].chars().next().unwrap_or('?');
                return Err(FormulaError::Syntax {
                    position: start,
                    message: format!("unexpected character '{}'", ch),
                });
            }
        };
        tokens.push((token, start));
        i += width;
    }

    Ok(tokens)
}

// =========================================================================
// Parser
// =========================================================================

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    /// Source length, reported as the position of "end of input" errors
    len: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.len, |(_, p)| *p)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> FormulaError {
        FormulaError::Syntax {
            position: self.position(),
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        match self.peek() {
            Some(t) if *t == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(t) => Err(self.error(format!("expected {}, found {}", expected, t))),
            None => Err(self.error(format!("expected {}, found end of formula", expected))),
        }
    }

    fn comparison(&mut self) -> Result<Expr, FormulaError> {
        let lhs = self.additive()?;
        match self.peek() {
            Some(Token::Op(
                op @ (BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge),
            )) => {
                let op = *op;
                self.pos += 1;
                let rhs = self.additive()?;
                Ok(Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }
            _ => Ok(lhs),
        }
    }

    fn additive(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(op @ (BinaryOp::Add | BinaryOp::Sub))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some(Token::Op(op @ (BinaryOp::Mul | BinaryOp::Div))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("formula nested too deeply"));
        }
        self.depth += 1;
        let expr = self.signed();
        self.depth -= 1;
        expr
    }

    fn signed(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Op(BinaryOp::Sub)) => {
                self.pos += 1;
                let operand = self.unary()?;
                Ok(Expr::Binary {
                    op: BinaryOp::Sub,
                    lhs: Box::new(Expr::Literal(0.0)),
                    rhs: Box::new(operand),
                })
            }
            Some(Token::Op(BinaryOp::Add)) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Literal(value)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.call(name)
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.comparison()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(token) => Err(FormulaError::Syntax {
                position,
                message: format!("unexpected {}", token),
            }),
            None => Err(FormulaError::Syntax {
                position,
                message: "unexpected end of formula".to_string(),
            }),
        }
    }

    fn call(&mut self, name: String) -> Result<Expr, FormulaError> {
        let function =
            Function::from_name(&name).ok_or_else(|| FormulaError::UnknownFunction(name.clone()))?;

        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
        } else {
            loop {
                args.push(self.comparison()?);
                match self.advance() {
                    Some(Token::Comma) => continue,
                    Some(Token::RParen) => break,
                    Some(token) => {
                        self.pos -= 1;
                        return Err(self.error(format!("expected ',' or ')', found {}", token)));
                    }
                    None => return Err(self.error("unclosed '(' in function call")),
                }
            }
        }

        function.check_arity(&name, args.len())?;
        Ok(Expr::Call { function, args })
    }
}
