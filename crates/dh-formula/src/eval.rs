//! Formula evaluation.
//!
//! Both entry points are total: any lex, parse, or domain failure (dice
//! in the pure mode, division by zero, a non-finite result) evaluates to
//! 0 rather than erroring. Fractional results round toward positive
//! infinity via [`round_up`]: an expression worth `-1.5` yields `-1`,
//! not `-2`, and this must hold for every evaluation path.

use dh_core::DiceRoller;

use crate::ast::{BinOp, Expr, Keep};
use crate::parser::parse;

/// Resolves attribute tokens to numeric values.
pub trait Scope {
    /// Resolve a token name. `None` means unknown; the evaluator reads
    /// unknown and non-finite tokens as 0.
    fn resolve(&self, token: &str) -> Option<f64>;
}

/// A scope that resolves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScope;

impl Scope for EmptyScope {
    fn resolve(&self, _token: &str) -> Option<f64> {
        None
    }
}

/// Round toward positive infinity, the engine-wide rounding rule.
pub fn round_up(value: f64) -> i64 {
    if value.is_finite() {
        value.ceil() as i64
    } else {
        0
    }
}

/// Evaluate a pure arithmetic formula. Dice terms make the whole formula
/// evaluate to 0; persistent effects must be recomputable without
/// rolling.
pub fn evaluate(formula: &str, scope: &dyn Scope) -> i64 {
    let Some(expr) = parse(formula) else { return 0 };
    if expr.has_dice() {
        return 0;
    }
    eval_expr(&expr, scope, &mut NoDice).map_or(0, round_up)
}

/// Evaluate a dice-capable formula, rolling dice terms through the given
/// roller. Formulas without dice behave exactly like [`evaluate`].
pub fn evaluate_with_dice(
    formula: &str,
    scope: &dyn Scope,
    roller: &mut dyn DiceRoller,
) -> i64 {
    let Some(expr) = parse(formula) else { return 0 };
    eval_expr(&expr, scope, roller).map_or(0, round_up)
}

/// Roll a dice term: `count` dice of `sides`, keep/drop applied, summed.
pub fn roll_term(
    count: u32,
    sides: u32,
    keep: Option<Keep>,
    roller: &mut dyn DiceRoller,
) -> Vec<u32> {
    let mut values: Vec<u32> = (0..count).map(|_| roller.roll(sides)).collect();
    let Some(keep) = keep else { return values };

    let mut sorted = values.clone();
    sorted.sort_unstable();
    let kept: Vec<u32> = match keep {
        Keep::Highest(n) => sorted.iter().rev().take(n as usize).copied().collect(),
        Keep::Lowest(n) => sorted.iter().take(n as usize).copied().collect(),
        Keep::DropHighest(n) => sorted
            .iter()
            .take(values.len().saturating_sub(n as usize))
            .copied()
            .collect(),
        Keep::DropLowest(n) => sorted
            .iter()
            .skip((n as usize).min(values.len()))
            .copied()
            .collect(),
    };
    values = kept;
    values
}

/// A roller for the pure path; any roll attempt poisons the evaluation.
struct NoDice;

impl DiceRoller for NoDice {
    fn roll(&mut self, _sides: u32) -> u32 {
        0
    }
}

fn eval_expr(expr: &Expr, scope: &dyn Scope, roller: &mut dyn DiceRoller) -> Option<f64> {
    match expr {
        Expr::Number(n) => Some(*n),
        Expr::Token(name) => {
            let value = scope.resolve(name).unwrap_or(0.0);
            Some(if value.is_finite() { value } else { 0.0 })
        }
        Expr::Dice { count, sides, keep } => {
            let count = match count {
                Some(expr) => {
                    let n = eval_expr(expr, scope, roller)?;
                    if !n.is_finite() || n < 0.0 {
                        return None;
                    }
                    n.round() as u32
                }
                None => 1,
            };
            let total: u32 = roll_term(count, *sides, *keep, roller).iter().sum();
            Some(f64::from(total))
        }
        Expr::Neg(inner) => Some(-eval_expr(inner, scope, roller)?),
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, scope, roller)?;
            let rhs = eval_expr(rhs, scope, roller)?;
            match op {
                BinOp::Add => Some(lhs + rhs),
                BinOp::Sub => Some(lhs - rhs),
                BinOp::Mul => Some(lhs * rhs),
                BinOp::Div => {
                    if rhs == 0.0 {
                        None
                    } else {
                        Some(lhs / rhs)
                    }
                }
            }
        }
    }
}
