//! Binary operators carried by internal nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operator tag of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Sub,
        Operation::Mul,
        Operation::Div,
    ];

    pub fn symbol(self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Sub => '-',
            Operation::Mul => '*',
            Operation::Div => '/',
        }
    }

    /// Combine two operand values.
    ///
    /// Plain IEEE-754 arithmetic: dividing by zero yields an infinity or NaN.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Operation::Add => left + right,
            Operation::Sub => left - right,
            Operation::Mul => left * right,
            Operation::Div => left / right,
        }
    }

    /// Whether rendered operands are wrapped in parentheses.
    ///
    /// Only `*` and `/` wrap; `+` and `-` concatenate operands as-is, so
    /// `a-(b+c)` renders as `a-b+c`. Known display wart, kept for output parity.
    pub fn wraps_operands(self) -> bool {
        matches!(self, Operation::Mul | Operation::Div)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
