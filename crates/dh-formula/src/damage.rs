//! Damage-formula grammar.
//!
//! Damage tags are richer than plain formulas: `2d6+3`,
//! `Мастерство_d8+2` (token-driven dice count), nested pure-math
//! parentheses evaluated innermost-first, and an outer `(...)/N` or
//! `(...)*N` wrapper that scales both the dice count and the flat
//! modifier. Scaling rounds per sign (positive up, negative down) and
//! the dice count never drops below 1.
//!
//! A parsed [`DamageFormula`] is structured; the critical-hit rewrite
//! folds each term's maximum value into the flat modifier without
//! touching the stored original.

use std::fmt;

use dh_core::DiceRoller;
use serde::{Deserialize, Serialize};

use crate::ast::Keep;
use crate::eval::{Scope, evaluate, roll_term, round_up};
use crate::lexer::{Token, lex};

/// One dice term of a damage formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTerm {
    /// Number of dice (at least 1).
    pub count: u32,
    /// Sides per die.
    pub sides: u32,
    /// Keep/drop rule, if any.
    pub keep: Option<Keep>,
    /// Whether this term subtracts from the total.
    pub negative: bool,
}

impl DamageTerm {
    /// The maximum value this term can contribute (signed).
    pub fn max_value(&self) -> i64 {
        let kept = match self.keep {
            Some(Keep::Highest(n) | Keep::Lowest(n)) => n.min(self.count),
            Some(Keep::DropHighest(n) | Keep::DropLowest(n)) => self.count.saturating_sub(n),
            None => self.count,
        };
        let max = i64::from(kept) * i64::from(self.sides);
        if self.negative { -max } else { max }
    }
}

/// A parsed damage formula: dice terms plus a flat modifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DamageFormula {
    /// Dice terms in source order.
    pub terms: Vec<DamageTerm>,
    /// Flat modifier (signed).
    pub flat: i64,
}

/// One rolled die of a damage roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageDie {
    /// Sides on the die.
    pub sides: u32,
    /// The value rolled.
    pub value: u32,
    /// Whether the die subtracts from the total.
    pub negative: bool,
}

/// The result of rolling a damage formula.
#[derive(Debug, Clone, Default)]
pub struct DamageRoll {
    /// Every kept die that was rolled.
    pub dice: Vec<DamageDie>,
    /// Flat modifier included in the total.
    pub flat: i64,
}

impl DamageRoll {
    /// Total damage: signed dice plus the flat modifier.
    pub fn total(&self) -> i64 {
        let dice: i64 = self
            .dice
            .iter()
            .map(|d| {
                let v = i64::from(d.value);
                if d.negative { -v } else { v }
            })
            .sum();
        dice + self.flat
    }
}

impl DamageFormula {
    /// Parse a damage tag. Returns `None` on malformed input; callers
    /// treat that as zero damage.
    pub fn parse(text: &str, scope: &dyn Scope) -> Option<Self> {
        let normalized = text.replace(',', ".");
        let reduced = reduce_parens(normalized.trim(), scope)?;
        let mut formula = parse_flat(&reduced, scope)?;
        for term in &mut formula.terms {
            term.count = term.count.max(1);
        }
        Some(formula)
    }

    /// Sum of every term's maximum possible value.
    pub fn max_dice_value(&self) -> i64 {
        self.terms.iter().map(DamageTerm::max_value).sum()
    }

    /// The critical-hit variant: maximum dice value folded into the flat
    /// modifier, dice kept for the rolled half.
    pub fn critical(&self) -> Self {
        let mut crit = self.clone();
        crit.flat += self.max_dice_value();
        crit
    }

    /// Roll the formula.
    pub fn roll(&self, roller: &mut dyn DiceRoller) -> DamageRoll {
        let mut dice = Vec::new();
        for term in &self.terms {
            for value in roll_term(term.count, term.sides, term.keep, roller) {
                dice.push(DamageDie {
                    sides: term.sides,
                    value,
                    negative: term.negative,
                });
            }
        }
        DamageRoll {
            dice,
            flat: self.flat,
        }
    }

    /// Scale by an outer `/ n`: dice counts and positive flats round up,
    /// negative flats round down, count clamped to at least 1.
    fn scale_div(&mut self, n: i64) {
        if n <= 0 {
            return;
        }
        for term in &mut self.terms {
            term.count = (u64::from(term.count)
                .div_ceil(n as u64) as i64)
                .max(1) as u32;
        }
        self.flat = div_away_from_zero(self.flat, n);
    }

    /// Scale by an outer `* n`.
    fn scale_mul(&mut self, n: i64) {
        if n <= 0 {
            return;
        }
        for term in &mut self.terms {
            term.count = (i64::from(term.count) * n).max(1) as u32;
        }
        self.flat *= n;
    }
}

impl fmt::Display for DamageFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for term in &self.terms {
            if term.negative {
                write!(f, "-")?;
            } else if !first {
                write!(f, "+")?;
            }
            write!(f, "{}d{}", term.count, term.sides)?;
            match term.keep {
                Some(Keep::Highest(n)) => write!(f, "kh{n}")?,
                Some(Keep::Lowest(n)) => write!(f, "kl{n}")?,
                Some(Keep::DropHighest(n)) => write!(f, "dh{n}")?,
                Some(Keep::DropLowest(n)) => write!(f, "dl{n}")?,
                None => {}
            }
            first = false;
        }
        if self.flat != 0 || first {
            if self.flat >= 0 && !first {
                write!(f, "+")?;
            }
            write!(f, "{}", self.flat)?;
        }
        Ok(())
    }
}

/// Round `v / n` away from zero (positive up, negative down).
fn div_away_from_zero(v: i64, n: i64) -> i64 {
    if v >= 0 {
        (v as u64).div_ceil(n as u64) as i64
    } else {
        -(((-v) as u64).div_ceil(n as u64) as i64)
    }
}

/// Collapse parentheses: an outer `(...)/N` or `(...)*N` wrapper scales
/// the recursively-parsed inner formula; any other paren group must be
/// pure math and is evaluated innermost-first into a number.
fn reduce_parens(text: &str, scope: &dyn Scope) -> Option<ReducedDamage> {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix('(') {
        if let Some(close) = matching_paren(rest) {
            let inner = &rest[..close];
            let tail = rest[close + 1..].trim();
            if tail.is_empty() {
                return Some(ReducedDamage::Scaled(DamageFormula::parse(inner, scope)?));
            }
            if let Some(n_text) = tail.strip_prefix('/') {
                let n: i64 = n_text.trim().parse().ok()?;
                let mut formula = DamageFormula::parse(inner, scope)?;
                formula.scale_div(n);
                return Some(ReducedDamage::Scaled(formula));
            }
            if let Some(n_text) = tail.strip_prefix('*') {
                let n: i64 = n_text.trim().parse().ok()?;
                let mut formula = DamageFormula::parse(inner, scope)?;
                formula.scale_mul(n);
                return Some(ReducedDamage::Scaled(formula));
            }
        }
    }

    // No outer scaling wrapper: evaluate nested pure-math groups
    // innermost-first until no parentheses remain.
    let mut text = trimmed.to_string();
    while let Some(open) = text.rfind('(') {
        let close = open + 1 + text[open + 1..].find(')')?;
        let inner = &text[open + 1..close];
        if contains_dice(inner) {
            return None;
        }
        let value = evaluate(inner, scope);
        text.replace_range(open..=close, &value.to_string());
    }
    Some(ReducedDamage::Flat(text))
}

enum ReducedDamage {
    /// An outer wrapper already produced the scaled formula.
    Scaled(DamageFormula),
    /// Paren-free text left to parse.
    Flat(String),
}

/// Find the `)` matching an implicit `(` before `rest`.
fn matching_paren(rest: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Quick dice-pattern check on raw text.
fn contains_dice(text: &str) -> bool {
    lex(text).is_some_and(|tokens| {
        tokens
            .iter()
            .any(|t| matches!(t, Token::Dice { .. }))
    })
}

/// Parse paren-free damage text into terms and a flat modifier.
fn parse_flat(reduced: &ReducedDamage, scope: &dyn Scope) -> Option<DamageFormula> {
    let text = match reduced {
        ReducedDamage::Scaled(formula) => return Some(formula.clone()),
        ReducedDamage::Flat(text) => text,
    };

    let tokens = lex(text)?;
    if tokens.is_empty() {
        return None;
    }

    let mut formula = DamageFormula::default();
    let mut negative = false;
    let mut pending: Option<i64> = None;
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Plus | Token::Minus => {
                flush_pending(&mut formula, &mut pending, negative);
                negative = matches!(tokens[i], Token::Minus);
            }
            Token::Number(n) => {
                if pending.is_some() {
                    return None;
                }
                pending = Some(round_up(*n));
            }
            Token::Word(w) => {
                if pending.is_some() {
                    return None;
                }
                pending = Some(round_up(scope.resolve(w).unwrap_or(0.0)));
            }
            Token::Dice { count, sides, keep } => {
                let count = match (count, pending.take()) {
                    (Some(c), None) => i64::from(*c),
                    (None, Some(prefix)) => prefix,
                    (None, None) => 1,
                    // Both a prefix and a literal count is malformed.
                    (Some(_), Some(_)) => return None,
                };
                formula.terms.push(DamageTerm {
                    count: count.clamp(0, u32::MAX as i64) as u32,
                    sides: *sides,
                    keep: *keep,
                    negative,
                });
            }
            Token::Star | Token::Slash | Token::LParen | Token::RParen => return None,
        }
        i += 1;
    }
    flush_pending(&mut formula, &mut pending, negative);
    Some(formula)
}

fn flush_pending(formula: &mut DamageFormula, pending: &mut Option<i64>, negative: bool) {
    if let Some(value) = pending.take() {
        formula.flat += if negative { -value } else { value };
    }
}
