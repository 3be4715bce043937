use crate::error::EvalResult;
use crate::eval::{self, Value};
use crate::lexer::{Token, TokenKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Gt,
    Add,
    Sub,
    Mul,
    Div,
}

/// One row of the binary operator table.
pub struct OpSpec {
    pub op: BinOp,
    pub symbol: &'static str,
    pub precedence: u8,
    pub eval: fn(&Value, &Value) -> EvalResult<Value>,
}

/// All binary operators, left-associative. Higher precedence binds tighter.
pub static BINARY_OPERATORS: [OpSpec; 5] = [
    OpSpec {
        op: BinOp::Gt,
        symbol: ">",
        precedence: 0,
        eval: eval::gt,
    },
    OpSpec {
        op: BinOp::Add,
        symbol: "+",
        precedence: 1,
        eval: eval::add,
    },
    OpSpec {
        op: BinOp::Sub,
        symbol: "-",
        precedence: 1,
        eval: eval::sub,
    },
    OpSpec {
        op: BinOp::Mul,
        symbol: "*",
        precedence: 2,
        eval: eval::mul,
    },
    OpSpec {
        op: BinOp::Div,
        symbol: "/",
        precedence: 2,
        eval: eval::div,
    },
];

impl BinOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        BINARY_OPERATORS
            .iter()
            .find(|spec| spec.symbol == symbol)
            .map(|spec| spec.op)
    }

    pub fn spec(self) -> &'static OpSpec {
        // The table holds exactly one row per variant.
        match self {
            BinOp::Gt => &BINARY_OPERATORS[0],
            BinOp::Add => &BINARY_OPERATORS[1],
            BinOp::Sub => &BINARY_OPERATORS[2],
            BinOp::Mul => &BINARY_OPERATORS[3],
            BinOp::Div => &BINARY_OPERATORS[4],
        }
    }

    pub fn symbol(self) -> &'static str {
        self.spec().symbol
    }

    pub fn precedence(self) -> u8 {
        self.spec().precedence
    }

    pub fn apply(self, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
        (self.spec().eval)(lhs, rhs)
    }
}

/// Expression tree. Parenthesised groups leave no node of their own.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Leaf(Token),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

/// Fully parenthesised form, e.g. `((2 + (5 * 3)) + 1)`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Leaf(token) if token.kind == TokenKind::Quoted => write!(f, "'{}'", token.value),
            Expr::Leaf(token) => f.write_str(&token.value),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Literal {
        text: String,
    },
    Expression {
        ast: Expr,
    },
    Assignment {
        name: String,
        operator: String, // as written, usually `=`
        value: Expr,
    },
    Conditional {
        condition: Expr,
        body: Vec<DocNode>,
    },
    Loop {
        binding: String,
        source: Expr,
        body: Vec<DocNode>,
    },
}

pub type Template = Vec<DocNode>;
