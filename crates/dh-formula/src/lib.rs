//! Formula expression language for the Daggerheart rules engine.
//!
//! Formulas are short user-authored strings like `2+@Agility`,
//! `Мастерство_d6+3`, or `(2d8+2)/2`. They reference named attribute
//! tokens, may contain dice terms, and always evaluate to a number;
//! malformed input evaluates to 0 rather than erroring, and fractional
//! results round toward positive infinity (a deliberate always-favor-the-
//! effect rule).
//!
//! Two evaluator entry points share one grammar: [`evaluate`] rejects
//! dice terms (persistent modifiers must be recomputable without rolling)
//! while [`evaluate_with_dice`] rolls them through a
//! [`dh_core::DiceRoller`]. A third, richer grammar in [`damage`] covers
//! weapon damage tags with scaling and critical maximization.

/// Expression AST.
pub mod ast;
/// Damage-formula grammar (dice terms, scaling, criticals).
pub mod damage;
/// Evaluation over the AST: token scopes, rounding, fail-to-zero.
pub mod eval;
/// Logos token stream for formula text.
pub mod lexer;
/// Recursive-descent parser from tokens to AST.
pub mod parser;

pub use ast::{Expr, Keep};
pub use damage::{DamageFormula, DamageTerm};
pub use eval::{EmptyScope, Scope, evaluate, evaluate_with_dice, round_up};
pub use lexer::Token;
