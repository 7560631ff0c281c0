//! Formula expression AST.

use serde::{Deserialize, Serialize};

/// Keep/drop rule on a dice term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keep {
    /// Keep the `n` highest dice (`khN`).
    Highest(u32),
    /// Keep the `n` lowest dice (`klN`).
    Lowest(u32),
    /// Drop the `n` highest dice (`dhN`).
    DropHighest(u32),
    /// Drop the `n` lowest dice (`dlN`).
    DropLowest(u32),
}

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

/// A parsed formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// Attribute token reference, resolved through a scope at evaluation.
    Token(String),
    /// A dice term. The count is an expression so token-driven counts
    /// (`Мастерство_d6`) stay representable; absent means one die.
    Dice {
        /// Dice count expression, when present.
        count: Option<Box<Expr>>,
        /// Sides per die.
        sides: u32,
        /// Keep/drop rule, if any.
        keep: Option<Keep>,
    },
    /// Unary negation.
    Neg(Box<Expr>),
    /// Binary arithmetic.
    Binary {
        /// Operator.
        op: BinOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Returns true if any dice term appears in this expression.
    pub fn has_dice(&self) -> bool {
        match self {
            Self::Number(_) | Self::Token(_) => false,
            Self::Dice { .. } => true,
            Self::Neg(inner) => inner.has_dice(),
            Self::Binary { lhs, rhs, .. } => lhs.has_dice() || rhs.has_dice(),
        }
    }
}
