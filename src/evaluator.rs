use crate::error::EvalError;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::f64::consts::{E, PI, TAU};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref TOKEN_REGEX: Regex = Regex::new(
        r"^(?:(?P<num>(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)|(?P<ident>[A-Za-z_][A-Za-z0-9_]*)|(?P<op>[-+*/%^(),]))"
    )
    .unwrap();
}

const PHI: f64 = 1.618_033_988_749_895;

/// Deepest nesting of groups, calls, signs and operator chains the parser accepts
pub const MAX_DEPTH: usize = 256;

/// Variable bindings handed to an evaluator, e.g. `{"x": 1.5}`.
pub type Bindings = HashMap<String, f64>;

/// Numeric expression evaluation given a set of variable bindings.
///
/// Implementations report malformed or domain-invalid input through
/// [`EvalError`]; callers decide how to recover.
pub trait Evaluator {
    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<f64, EvalError>;
}

impl<F> Evaluator for F
where
    F: Fn(&str, &Bindings) -> Result<f64, EvalError>,
{
    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<f64, EvalError> {
        self(expression, bindings)
    }
}

/// The built-in evaluator: parses the expression and evaluates it in one go.
#[derive(Debug, Default, Clone, Copy)]
pub struct MathEvaluator;

impl Evaluator for MathEvaluator {
    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<f64, EvalError> {
        Expression::parse(expression)?.eval(bindings)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Op(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Lexeme {
    token: Token,
    /// Character offset in the source text
    pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    Symbol(String),
    Neg(Box<Node>),
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Call {
        name: String,
        args: Vec<Node>,
    },
}

/// A parsed expression that can be evaluated repeatedly with different bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    root: Node,
}

impl Expression {
    /// Parse an expression such as `2x^2 - sin(x)/3`.
    ///
    /// # Errors
    /// * `EvalError::Empty` for blank input
    /// * a token error for anything the grammar does not accept
    /// * `EvalError::TooDeep` past [`MAX_DEPTH`] levels of nesting
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(EvalError::Empty);
        }

        let mut parser = Parser {
            tokens,
            index: 0,
            depth: 0,
        };
        let root = parser.parse_additive()?;
        if let Some(lexeme) = parser.tokens.get(parser.index) {
            return Err(EvalError::UnexpectedToken {
                found: lexeme.token.to_string(),
                pos: lexeme.pos,
            });
        }

        Ok(Expression { root })
    }

    pub fn eval(&self, bindings: &Bindings) -> Result<f64, EvalError> {
        self.root.eval(bindings)
    }
}

impl FromStr for Expression {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::parse(s)
    }
}

fn tokenize(source: &str) -> Result<Vec<Lexeme>, EvalError> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    let mut pos = 0;

    loop {
        let rest = &source[offset..];
        let trimmed = rest.trim_start();
        let skipped = rest.len() - trimmed.len();
        pos += rest[..skipped].chars().count();
        offset += skipped;
        if trimmed.is_empty() {
            break;
        }

        let caps = match TOKEN_REGEX.captures(trimmed) {
            Some(caps) => caps,
            None => {
                let ch = trimmed.chars().next().unwrap_or('?');
                return Err(EvalError::UnexpectedChar { ch, pos });
            }
        };

        let (token, len) = if let Some(m) = caps.name("num") {
            let value = m
                .as_str()
                .parse::<f64>()
                .map_err(|_| EvalError::UnexpectedToken {
                    found: m.as_str().to_string(),
                    pos,
                })?;
            (Token::Number(value), m.end())
        } else if let Some(m) = caps.name("ident") {
            (Token::Ident(m.as_str().to_string()), m.end())
        } else if let Some(m) = caps.name("op") {
            let ch = m.as_str().chars().next().unwrap_or('?');
            (Token::Op(ch), m.end())
        } else {
            let ch = trimmed.chars().next().unwrap_or('?');
            return Err(EvalError::UnexpectedChar { ch, pos });
        };

        tokens.push(Lexeme { token, pos });
        // Tokens are ASCII, so bytes and characters agree
        offset += len;
        pos += len;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Lexeme>,
    index: usize,
    /// Height of the tree built so far along the current path
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|lexeme| &lexeme.token)
    }

    fn advance(&mut self) -> Option<Lexeme> {
        let lexeme = self.tokens.get(self.index).cloned();
        if lexeme.is_some() {
            self.index += 1;
        }
        lexeme
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    fn expect_op(&mut self, expected: char) -> Result<(), EvalError> {
        match self.advance() {
            Some(Lexeme {
                token: Token::Op(c),
                ..
            }) if c == expected => Ok(()),
            Some(lexeme) => Err(EvalError::UnexpectedToken {
                found: lexeme.token.to_string(),
                pos: lexeme.pos,
            }),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    fn parse_additive(&mut self) -> Result<Node, EvalError> {
        let base = self.depth;
        let mut lhs = self.parse_multiplicative()?;

        loop {
            let op = match self.peek() {
                Some(Token::Op('+')) => BinaryOp::Add,
                Some(Token::Op('-')) => BinaryOp::Sub,
                _ => break,
            };
            self.index += 1;
            // Each link of a chain adds a level to the left-leaning tree
            self.descend()?;
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }

        self.depth = base;
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, EvalError> {
        let base = self.depth;
        let mut lhs = self.parse_unary()?;

        loop {
            match self.peek() {
                Some(Token::Op(c @ ('*' | '/' | '%'))) => {
                    let op = match c {
                        '*' => BinaryOp::Mul,
                        '/' => BinaryOp::Div,
                        _ => BinaryOp::Mod,
                    };
                    self.index += 1;
                    self.descend()?;
                    let rhs = self.parse_unary()?;
                    lhs = binary(op, lhs, rhs);
                }
                // Implicit multiplication: 2x, 2(x+1), (x+1)(x-1), 2 sin(x)
                Some(Token::Number(_)) | Some(Token::Ident(_)) | Some(Token::Op('(')) => {
                    self.descend()?;
                    let rhs = self.parse_power()?;
                    lhs = binary(BinaryOp::Mul, lhs, rhs);
                }
                _ => break,
            }
        }

        self.depth = base;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Node, EvalError> {
        let negate = match self.peek() {
            Some(Token::Op('-')) => true,
            Some(Token::Op('+')) => false,
            _ => return self.parse_power(),
        };
        self.index += 1;
        self.descend()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;

        if negate {
            Ok(Node::Neg(Box::new(operand)))
        } else {
            Ok(operand)
        }
    }

    fn parse_power(&mut self) -> Result<Node, EvalError> {
        let base = self.parse_primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.index += 1;
            self.descend()?;
            // Right-associative; the exponent may carry its own sign (2^-1)
            let exponent = self.parse_unary()?;
            self.depth -= 1;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Node, EvalError> {
        let lexeme = self.advance().ok_or(EvalError::UnexpectedEnd)?;

        match lexeme.token {
            Token::Number(value) => Ok(Node::Number(value)),
            Token::Ident(name) => {
                if let Some(Token::Op('(')) = self.peek() {
                    self.index += 1;
                    self.descend()?;
                    let args = self.parse_arguments()?;
                    self.depth -= 1;
                    Ok(Node::Call { name, args })
                } else {
                    Ok(Node::Symbol(name))
                }
            }
            Token::Op('(') => {
                self.descend()?;
                let inner = self.parse_additive()?;
                self.expect_op(')')?;
                self.depth -= 1;
                Ok(inner)
            }
            token => Err(EvalError::UnexpectedToken {
                found: token.to_string(),
                pos: lexeme.pos,
            }),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Node>, EvalError> {
        let mut args = Vec::new();
        if let Some(Token::Op(')')) = self.peek() {
            self.index += 1;
            return Ok(args);
        }

        loop {
            args.push(self.parse_additive()?);
            match self.advance() {
                Some(Lexeme {
                    token: Token::Op(','),
                    ..
                }) => continue,
                Some(Lexeme {
                    token: Token::Op(')'),
                    ..
                }) => break,
                Some(lexeme) => {
                    return Err(EvalError::UnexpectedToken {
                        found: lexeme.token.to_string(),
                        pos: lexeme.pos,
                    });
                }
                None => return Err(EvalError::UnexpectedEnd),
            }
        }

        Ok(args)
    }
}

fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Node {
    Node::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

impl Node {
    fn eval(&self, bindings: &Bindings) -> Result<f64, EvalError> {
        match self {
            Node::Number(value) => Ok(*value),
            Node::Symbol(name) => bindings
                .get(name)
                .copied()
                .or_else(|| constant(name))
                .ok_or_else(|| EvalError::UndefinedSymbol(name.clone())),
            Node::Neg(inner) => Ok(-inner.eval(bindings)?),
            Node::Binary { op, lhs, rhs } => {
                let a = lhs.eval(bindings)?;
                let b = rhs.eval(bindings)?;
                apply_binary(*op, a, b)
            }
            Node::Call { name, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(bindings))
                    .collect::<Result<Vec<f64>, EvalError>>()?;
                call_function(name, &values)
            }
        }
    }
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" | "PI" => Some(PI),
        "e" | "E" => Some(E),
        "tau" => Some(TAU),
        "phi" => Some(PHI),
        _ => None,
    }
}

fn apply_binary(op: BinaryOp, a: f64, b: f64) -> Result<f64, EvalError> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Sub => Ok(a - b),
        BinaryOp::Mul => Ok(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::Domain("division by zero"));
            }
            Ok(a / b)
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::Domain("modulo by zero"));
            }
            // Result takes the sign of the divisor
            Ok(a - b * (a / b).floor())
        }
        BinaryOp::Pow => power(a, b),
    }
}

fn power(base: f64, exponent: f64) -> Result<f64, EvalError> {
    let result = base.powf(exponent);
    if result.is_nan() && !base.is_nan() && !exponent.is_nan() {
        return Err(EvalError::Domain("non-real power"));
    }
    Ok(result)
}

fn expect_args(name: &str, args: &[f64], count: usize) -> Result<(), EvalError> {
    if args.len() != count {
        return Err(EvalError::Arity {
            name: name.to_string(),
            expected: if count == 1 { "1" } else { "2" },
            found: args.len(),
        });
    }
    Ok(())
}

fn reciprocal(value: f64) -> Result<f64, EvalError> {
    if value == 0.0 {
        return Err(EvalError::Domain("division by zero"));
    }
    Ok(1.0 / value)
}

fn logarithm(value: f64) -> Result<f64, EvalError> {
    if value <= 0.0 {
        return Err(EvalError::Domain("logarithm of a non-positive number"));
    }
    Ok(value.ln())
}

fn call_function(name: &str, args: &[f64]) -> Result<f64, EvalError> {
    match name {
        "min" | "max" => {
            if args.is_empty() {
                return Err(EvalError::Arity {
                    name: name.to_string(),
                    expected: "at least 1",
                    found: 0,
                });
            }
            let fold = if name == "min" { f64::min } else { f64::max };
            Ok(args[1..].iter().fold(args[0], |acc, &v| fold(acc, v)))
        }
        "log" => match args {
            [x] => logarithm(*x),
            [x, base] => {
                if *base <= 0.0 || *base == 1.0 {
                    return Err(EvalError::Domain("invalid logarithm base"));
                }
                Ok(logarithm(*x)? / base.ln())
            }
            _ => Err(EvalError::Arity {
                name: name.to_string(),
                expected: "1 or 2",
                found: args.len(),
            }),
        },
        "atan2" | "pow" => {
            expect_args(name, args, 2)?;
            if name == "atan2" {
                Ok(args[0].atan2(args[1]))
            } else {
                power(args[0], args[1])
            }
        }
        _ => {
            let function = unary_function(name)
                .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
            expect_args(name, args, 1)?;
            function(args[0])
        }
    }
}

type UnaryFn = fn(f64) -> Result<f64, EvalError>;

fn unary_function(name: &str) -> Option<UnaryFn> {
    let function: UnaryFn = match name {
        "sin" => |x: f64| Ok(x.sin()),
        "cos" => |x: f64| Ok(x.cos()),
        "tan" => |x: f64| Ok(x.tan()),
        "sec" => |x: f64| reciprocal(x.cos()),
        "csc" => |x: f64| reciprocal(x.sin()),
        "cot" => |x: f64| reciprocal(x.tan()),
        "asin" => |x: f64| {
            if !(-1.0..=1.0).contains(&x) {
                return Err(EvalError::Domain("asin argument outside [-1, 1]"));
            }
            Ok(x.asin())
        },
        "acos" => |x: f64| {
            if !(-1.0..=1.0).contains(&x) {
                return Err(EvalError::Domain("acos argument outside [-1, 1]"));
            }
            Ok(x.acos())
        },
        "atan" => |x: f64| Ok(x.atan()),
        "sinh" => |x: f64| Ok(x.sinh()),
        "cosh" => |x: f64| Ok(x.cosh()),
        "tanh" => |x: f64| Ok(x.tanh()),
        "sqrt" => |x: f64| {
            if x < 0.0 {
                return Err(EvalError::Domain("square root of a negative number"));
            }
            Ok(x.sqrt())
        },
        "cbrt" => |x: f64| Ok(x.cbrt()),
        "exp" => |x: f64| Ok(x.exp()),
        "log10" => |x: f64| Ok(logarithm(x)? / std::f64::consts::LN_10),
        "log2" => |x: f64| Ok(logarithm(x)? / std::f64::consts::LN_2),
        "abs" => |x: f64| Ok(x.abs()),
        "sign" => |x: f64| Ok(if x == 0.0 { 0.0 } else { x.signum() }),
        "floor" => |x: f64| Ok(x.floor()),
        "ceil" => |x: f64| Ok(x.ceil()),
        "round" => |x: f64| Ok(x.round()),
        _ => return None,
    };
    Some(function)
}
