//! Boolean mini-language over properties.
//!
//! ```text
//! expr       = or
//! or         = and { ("||" | "or") and }
//! and        = unary { ("&&" | "and") unary }
//! unary      = ("!" | "not") unary | comparison
//! comparison = primary [ ("==" | "!=") primary ]
//! primary    = "(" expr ")" | string | number | "true" | "false" | "null" | property
//! ```
//!
//! `&&` binds tighter than `||`. A bare property evaluates to its truthiness:
//! absent, empty, `"false"` and `"null"` (case-insensitive) are false, anything else is true.

use super::{Condition, ConditionContext};
use crate::errors::ConditionErrorKind;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    And,
    Or,
    Not,
    Eq,
    Ne,
    LParen,
    RParen,
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    Property(String),
}

fn is_property_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-')
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, (usize, String)> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            ch if ch.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push((pos, Token::LParen));
            }
            ')' => {
                chars.next();
                tokens.push((pos, Token::RParen));
            }
            '&' | '|' | '=' => {
                chars.next();
                match chars.next() {
                    Some((_, next)) if next == ch => tokens.push((
                        pos,
                        match ch {
                            '&' => Token::And,
                            '|' => Token::Or,
                            _ => Token::Eq,
                        },
                    )),
                    _ => return Err((pos, format!("expected `{ch}{ch}`"))),
                }
            }
            '!' => {
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    tokens.push((pos, Token::Ne));
                } else {
                    tokens.push((pos, Token::Not));
                }
            }
            '"' | '\'' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, next)) if next == ch => break,
                        Some((_, next)) => value.push(next),
                        None => return Err((pos, "unterminated string literal".to_owned())),
                    }
                }
                tokens.push((pos, Token::Str(value)));
            }
            ch if ch.is_ascii_digit()
                || (ch == '-' && source[pos + 1..].starts_with(|next: char| next.is_ascii_digit())) =>
            {
                let mut raw = String::new();
                if ch == '-' {
                    raw.push(ch);
                    chars.next();
                }
                while let Some(&(_, next)) = chars.peek() {
                    if !(next.is_ascii_digit() || next == '.') {
                        break;
                    }
                    raw.push(next);
                    chars.next();
                }
                match raw.parse::<f64>() {
                    Ok(value) => tokens.push((pos, Token::Num(value))),
                    Err(_) => return Err((pos, format!("invalid number `{raw}`"))),
                }
            }
            ch if is_property_char(ch) && ch != '-' => {
                let mut word = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if !is_property_char(next) {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                let token = match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "null" => Token::Null,
                    keyword if keyword.eq_ignore_ascii_case("true") => Token::Bool(true),
                    keyword if keyword.eq_ignore_ascii_case("false") => Token::Bool(false),
                    _ => Token::Property(word.clone()),
                };
                tokens.push((pos, token));
            }
            ch => return Err((pos, format!("unexpected character `{ch}`"))),
        }
    }

    Ok(tokens)
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Or(Box<Node>, Box<Node>),
    And(Box<Node>, Box<Node>),
    Not(Box<Node>),
    Eq(Box<Node>, Box<Node>),
    Ne(Box<Node>, Box<Node>),
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    Property(String),
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(_, token)| token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.cursor).map_or(self.end, |(pos, _)| *pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|(_, token)| token.clone());
        self.cursor += 1;
        token
    }

    fn or(&mut self) -> Result<Node, (usize, String)> {
        let mut node = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            node = Node::Or(Box::new(node), Box::new(self.and()?));
        }
        Ok(node)
    }

    fn and(&mut self) -> Result<Node, (usize, String)> {
        let mut node = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            node = Node::And(Box::new(node), Box::new(self.unary()?));
        }
        Ok(node)
    }

    fn unary(&mut self) -> Result<Node, (usize, String)> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            return Ok(Node::Not(Box::new(self.unary()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Node, (usize, String)> {
        let left = self.primary()?;
        match self.peek() {
            Some(Token::Eq) => {
                self.advance();
                Ok(Node::Eq(Box::new(left), Box::new(self.primary()?)))
            }
            Some(Token::Ne) => {
                self.advance();
                Ok(Node::Ne(Box::new(left), Box::new(self.primary()?)))
            }
            _ => Ok(left),
        }
    }

    fn primary(&mut self) -> Result<Node, (usize, String)> {
        let position = self.position();
        match self.advance() {
            Some(Token::LParen) => {
                let node = self.or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(node),
                    _ => Err((position, "unclosed parenthesis".to_owned())),
                }
            }
            Some(Token::Str(value)) => Ok(Node::Str(value)),
            Some(Token::Num(value)) => Ok(Node::Num(value)),
            Some(Token::Bool(value)) => Ok(Node::Bool(value)),
            Some(Token::Null) => Ok(Node::Null),
            Some(Token::Property(name)) => Ok(Node::Property(name)),
            Some(token) => Err((position, format!("unexpected {}", describe_token(&token)))),
            None => Err((position, "unexpected end of expression".to_owned())),
        }
    }
}

fn describe_token(token: &Token) -> &'static str {
    match token {
        Token::And => "`&&`",
        Token::Or => "`||`",
        Token::Not => "`!`",
        Token::Eq => "`==`",
        Token::Ne => "`!=`",
        Token::LParen => "`(`",
        Token::RParen => "`)`",
        Token::Str(_) => "string literal",
        Token::Num(_) => "number",
        Token::Bool(_) => "boolean",
        Token::Null => "`null`",
        Token::Property(_) => "property",
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Value {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

impl Value {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Str(value) => {
                !(value.is_empty() || value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("null"))
            }
            Value::Num(value) => *value != 0.0,
            Value::Bool(value) => *value,
            Value::Null => false,
        }
    }

    /// Strings compared with numbers or booleans are parsed first
    fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Str(left), Value::Str(right)) => left == right,
            (Value::Num(left), Value::Num(right)) => left == right,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Str(raw), Value::Num(num)) | (Value::Num(num), Value::Str(raw)) => {
                raw.trim().parse::<f64>().is_ok_and(|parsed| parsed == *num)
            }
            (Value::Str(raw), Value::Bool(flag)) | (Value::Bool(flag), Value::Str(raw)) => {
                let raw = raw.trim();
                (raw.eq_ignore_ascii_case("true") && *flag) || (raw.eq_ignore_ascii_case("false") && !*flag)
            }
            (Value::Num(_), Value::Bool(_)) | (Value::Bool(_), Value::Num(_)) => false,
        }
    }
}

/// Parsed expression, reusable across contexts.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Expression {
    root: Option<Node>,
}

impl Expression {
    pub(crate) fn parse(source: &str) -> Result<Self, ConditionErrorKind> {
        let into_error = |(position, message): (usize, String)| ConditionErrorKind::Expression {
            expression: source.to_owned(),
            position,
            message,
        };

        let tokens = tokenize(source).map_err(into_error)?;
        if tokens.is_empty() {
            return Ok(Self { root: None });
        }

        let mut parser = Parser {
            tokens,
            cursor: 0,
            end: source.len(),
        };
        let root = parser.or().map_err(into_error)?;
        if let Some(token) = parser.peek() {
            return Err(into_error((
                parser.position(),
                format!("unexpected {} after end of expression", describe_token(token)),
            )));
        }

        Ok(Self { root: Some(root) })
    }

    /// Empty expressions match
    pub(crate) fn evaluate(&self, context: &ConditionContext) -> Result<bool, ConditionErrorKind> {
        Ok(self.root.as_ref().map_or(true, |root| eval(root, context).is_truthy()))
    }
}

fn eval(node: &Node, context: &ConditionContext) -> Value {
    match node {
        Node::Or(left, right) => Value::Bool(eval(left, context).is_truthy() || eval(right, context).is_truthy()),
        Node::And(left, right) => Value::Bool(eval(left, context).is_truthy() && eval(right, context).is_truthy()),
        Node::Not(inner) => Value::Bool(!eval(inner, context).is_truthy()),
        Node::Eq(left, right) => Value::Bool(eval(left, context).loose_eq(&eval(right, context))),
        Node::Ne(left, right) => Value::Bool(!eval(left, context).loose_eq(&eval(right, context))),
        Node::Str(value) => Value::Str(value.clone()),
        Node::Num(value) => Value::Num(*value),
        Node::Bool(value) => Value::Bool(*value),
        Node::Null => Value::Null,
        Node::Property(name) => context.property(name).map_or(Value::Null, Value::Str),
    }
}

/// Matches when the expression evaluates to true against the context's properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionCondition {
    expression: String,
}

impl ExpressionCondition {
    #[inline]
    #[must_use]
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl Condition for ExpressionCondition {
    fn matches(&self, context: &ConditionContext) -> Result<bool, ConditionErrorKind> {
        Expression::parse(&self.expression)?.evaluate(context)
    }

    fn describe(&self) -> String {
        format!("@ConditionalOnExpression(\"{}\")", self.expression)
    }

    fn failure_reason(&self, _context: &ConditionContext) -> Option<String> {
        Some(format!("Expression `{}` evaluated to false", self.expression))
    }
}
