use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Body of a predicate or member-accessor closure
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateExpr {
    Binary {
        op: BinaryOp,
        left: Box<PredicateExpr>,
        right: Box<PredicateExpr>,
    },
    /// Type coercion such as `p.category_id as i64`
    Convert {
        target: String,
        operand: Box<PredicateExpr>,
    },
    /// `parameter.field`
    Field { parameter: String, field: String },
    Literal(Value),
}

impl PredicateExpr {
    pub fn field(parameter: impl Into<String>, field: impl Into<String>) -> Self {
        PredicateExpr::Field {
            parameter: parameter.into(),
            field: field.into(),
        }
    }

    pub fn binary(op: BinaryOp, left: PredicateExpr, right: PredicateExpr) -> Self {
        PredicateExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Strips exactly one coercion layer, if present.
    pub fn unwrap_convert(&self) -> &PredicateExpr {
        match self {
            PredicateExpr::Convert { operand, .. } => operand,
            other => other,
        }
    }
}

impl fmt::Display for PredicateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateExpr::Binary { op, left, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            PredicateExpr::Convert { target, operand } => write!(f, "{} as {}", operand, target),
            PredicateExpr::Field { parameter, field } => write!(f, "{}.{}", parameter, field),
            PredicateExpr::Literal(value) => write!(f, "{}", value),
        }
    }
}

/// A closure: parameter names plus body.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub parameters: Vec<String>,
    pub body: PredicateExpr,
    /// Source text, echoed in diagnostics
    pub text: String,
}

impl Lambda {
    pub fn new(parameters: Vec<String>, body: PredicateExpr) -> Self {
        let text = format!("|{}| {}", parameters.join(", "), body);
        Self {
            parameters,
            body,
            text,
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
