use crate::ast::Expr;
use crate::error::{EvalError, EvalResult};
use crate::lexer::{Token, TokenKind};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Map(m) => !m.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Numeric view used by the arithmetic operators. Strings only count
    /// when the whole string is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Null => Some(0.0),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => Some(*n),
            Value::String(s) => parse_number(s),
            Value::Array(_) | Value::Map(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(_) => f.write_str("[object]"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// What a lookup of a missing variable produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndefinedBehavior {
    /// Missing paths resolve to `Value::Null`.
    #[default]
    Lenient,
    /// Missing paths fail with `EvalError::UnresolvedVariable`.
    Strict,
}

/// Variable bindings, innermost scope last.
#[derive(Debug, Clone)]
pub struct Context {
    scopes: Vec<HashMap<String, Value>>,
    undefined: UndefinedBehavior,
}

impl Context {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            undefined: UndefinedBehavior::default(),
        }
    }

    /// Top-level bindings from a JSON object. Anything else gives an empty
    /// context.
    pub fn from_json(json: serde_json::Value) -> Self {
        let mut ctx = Self::new();
        if let serde_json::Value::Object(map) = json {
            for (name, value) in map {
                ctx.set(name, value);
            }
        }
        ctx
    }

    pub fn with_undefined(mut self, behavior: UndefinedBehavior) -> Self {
        self.undefined = behavior;
        self
    }

    pub fn undefined_behavior(&self) -> UndefinedBehavior {
        self.undefined
    }

    /// Bind `name` in the innermost scope.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value.into());
        }
    }

    /// Rebind the nearest existing `name`, or bind it in the innermost
    /// scope when no scope has it yet.
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        let innermost = self.scopes.len() - 1;
        let target = self
            .scopes
            .iter()
            .rposition(|scope| scope.contains_key(&name))
            .unwrap_or(innermost);
        self.scopes[target].insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Resolve a dotted path. The whole path is tried as a key first, then
    /// the segments are walked through maps (and arrays, for numeric
    /// segments).
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.get(path) {
            return Some(value);
        }
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Map(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// `resolve` with the context's undefined-variable policy applied.
    pub fn lookup(&self, path: &str) -> EvalResult<Value> {
        match (self.resolve(path), self.undefined) {
            (Some(value), _) => Ok(value.clone()),
            (None, UndefinedBehavior::Lenient) => {
                debug!(path, "undefined variable resolves to null");
                Ok(Value::Null)
            }
            (None, UndefinedBehavior::Strict) => Err(EvalError::UnresolvedVariable {
                path: path.to_string(),
            }),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope. The root scope is never removed.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl From<HashMap<String, Value>> for Context {
    fn from(bindings: HashMap<String, Value>) -> Self {
        Self {
            scopes: vec![bindings],
            undefined: UndefinedBehavior::default(),
        }
    }
}

/// Whole-string number parse: integers and decimals, optional sign and
/// exponent. `inf`, `NaN` and partial matches like `2a3b` are rejected.
pub fn parse_number(s: &str) -> Option<f64> {
    let valid = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E');
    if s.is_empty() || !s.chars().all(valid) || !s.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Literal coercion for a raw token value.
pub fn to_value(token: Option<&str>) -> Value {
    match token {
        None => Value::Null,
        Some(s) => parse_number(s).map_or_else(|| Value::String(s.to_string()), Value::Number),
    }
}

/// `name` or `name.field.0`: an identifier followed by identifier or index
/// segments.
pub fn is_identifier_path(s: &str) -> bool {
    let ident = |seg: &str| {
        let mut chars = seg.chars();
        chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || c == '_')
    };
    let index = |seg: &str| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit());
    let mut segments = s.split('.');
    segments.next().is_some_and(ident) && segments.all(|seg| ident(seg) || index(seg))
}

/// Evaluate an expression against `context`.
pub fn evaluate(node: &Expr, context: &Context) -> EvalResult<Value> {
    match node {
        Expr::Leaf(token) => eval_leaf(token, context),
        Expr::Binary { op, lhs, rhs } => {
            let l = evaluate(lhs, context)?;
            let r = evaluate(rhs, context)?;
            op.apply(&l, &r)
        }
    }
}

fn eval_leaf(token: &Token, context: &Context) -> EvalResult<Value> {
    if token.kind != TokenKind::Word {
        return Ok(to_value(Some(&token.value)));
    }
    match token.value.as_str() {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "null" => Ok(Value::Null),
        word if parse_number(word).is_some() => Ok(to_value(Some(word))),
        word if is_identifier_path(word) => context.lookup(word),
        word => Ok(Value::String(word.to_string())),
    }
}

/// Operands with no numeric view (words, arrays, maps) become NaN.
fn operand(value: &Value) -> f64 {
    value.as_number().unwrap_or(f64::NAN)
}

fn arithmetic(lhs: &Value, rhs: &Value, f: fn(f64, f64) -> f64) -> EvalResult<Value> {
    Ok(Value::Number(f(operand(lhs), operand(rhs))))
}

pub(crate) fn add(lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    arithmetic(lhs, rhs, |a, b| a + b)
}

pub(crate) fn sub(lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    arithmetic(lhs, rhs, |a, b| a - b)
}

pub(crate) fn mul(lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    arithmetic(lhs, rhs, |a, b| a * b)
}

pub(crate) fn div(lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    arithmetic(lhs, rhs, |a, b| a / b)
}

pub(crate) fn gt(lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b))
            if parse_number(a).is_none() || parse_number(b).is_none() =>
        {
            Ok(Value::Bool(a > b))
        }
        _ => Ok(Value::Bool(operand(lhs) > operand(rhs))),
    }
}
