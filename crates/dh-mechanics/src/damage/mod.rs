//! Damage resolution: the severity ladder, resistance multipliers, and
//! batch application with per-target adjustments.
//!
//! Raw damage buckets into a wound severity against the target's two
//! thresholds. Resistance halves or doubles the incoming amount before
//! bucketing; direct damage skips resistance and armor entirely. NPC
//! targets take their wounds immediately; player targets get an armor
//! negotiation first (see [`negotiate`]).

pub mod negotiate;
pub mod undo;

use dh_core::{
    Actor, ActorId, ActorKind, Mutation, Session, Table, fields::path,
};
use dh_formula::damage::DamageDie;
use dh_status::{
    ModifierInstance, ModifierRegistry, ResilienceKind, applied_statuses, item_statuses,
    local_statuses,
};
use serde::{Deserialize, Serialize};

use crate::error::MechResult;
use crate::roll_state::ExtraDie;
use negotiate::Negotiation;
use undo::{UndoBatch, UndoEntry};

/// How hard a hit lands, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// No damage got through.
    None,
    /// Below the noticeable threshold.
    Minor,
    /// At or above noticeable, below heavy.
    Noticeable,
    /// At or above heavy, below double heavy.
    Heavy,
    /// Double the heavy threshold or more.
    Critical,
}

impl Severity {
    /// Wounds marked for this severity.
    pub fn wounds(self) -> i64 {
        match self {
            Severity::None => 0,
            Severity::Minor => 1,
            Severity::Noticeable => 2,
            Severity::Heavy => 3,
            Severity::Critical => 4,
        }
    }
}

/// A target's two damage thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// The noticeable threshold.
    pub noticeable: i64,
    /// The heavy threshold.
    pub heavy: i64,
}

impl Thresholds {
    /// Read an actor's thresholds from its fields.
    pub fn of(actor: &Actor) -> Self {
        Thresholds {
            noticeable: actor.fields.get(path::THRESHOLD_NOTICEABLE),
            heavy: actor.fields.get(path::THRESHOLD_HEAVY),
        }
    }
}

/// Bucket a damage amount against thresholds.
///
/// Thresholds are floored at 1 so a zeroed-out sheet still buckets
/// sanely. Comparisons are strict below each step: damage exactly at a
/// threshold belongs to the step above it.
pub fn severity(damage: i64, thresholds: Thresholds) -> Severity {
    let noticeable = thresholds.noticeable.max(1);
    let heavy = thresholds.heavy.max(1);
    if damage <= 0 {
        Severity::None
    } else if damage < noticeable {
        Severity::Minor
    } else if damage < heavy {
        Severity::Noticeable
    } else if damage < heavy * 2 {
        Severity::Heavy
    } else {
        Severity::Critical
    }
}

/// The damage channel a hit comes in on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    /// Physical damage.
    Physical,
    /// Magical damage.
    Magical,
    /// Direct damage bypasses resistance and armor.
    Direct,
}

/// A target's standing toward one damage channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resistance {
    /// Full damage.
    Normal,
    /// Half damage, rounded down.
    Resist,
    /// No damage.
    Immune,
    /// Double damage.
    Vulnerable,
}

impl Resistance {
    /// Scale a base amount by this resistance.
    pub fn apply(self, base: i64) -> i64 {
        match self {
            Resistance::Normal => base,
            Resistance::Resist => base.div_euclid(2),
            Resistance::Immune => 0,
            Resistance::Vulnerable => base * 2,
        }
    }
}

/// Compute an actor's standing toward one damage channel from its
/// active statuses (equipped items, local, and applied).
///
/// Immunity dominates. A lone resist halves, a lone vulnerability
/// doubles; both together cancel back to normal. Direct damage is
/// always taken at full value.
pub fn resistance(actor: &Actor, damage_type: DamageType, registry: &ModifierRegistry) -> Resistance {
    let physical = match damage_type {
        DamageType::Physical => true,
        DamageType::Magical => false,
        DamageType::Direct => return Resistance::Normal,
    };

    let mut resist = false;
    let mut immune = false;
    let mut vulnerable = false;
    let mut scan = |mods: &[ModifierInstance]| {
        for instance in mods {
            if let ModifierInstance::Resilience { value } = instance {
                if value.is_physical() != physical {
                    continue;
                }
                match value {
                    ResilienceKind::ImmunePhy | ResilienceKind::ImmuneMag => immune = true,
                    ResilienceKind::ResistPhy | ResilienceKind::ResistMag => resist = true,
                    ResilienceKind::VulnPhy | ResilienceKind::VulnMag => vulnerable = true,
                }
            }
        }
    };

    for item in &actor.items {
        for status in item_statuses(item, registry) {
            if status.active_on_item(item.is_equipped()) {
                scan(&status.mods);
            }
        }
    }
    for status in local_statuses(actor, registry)
        .iter()
        .chain(applied_statuses(actor, registry).iter())
    {
        if status.active_on_actor() {
            scan(&status.mods);
        }
    }

    if immune {
        Resistance::Immune
    } else {
        match (resist, vulnerable) {
            (true, false) => Resistance::Resist,
            (false, true) => Resistance::Vulnerable,
            _ => Resistance::Normal,
        }
    }
}

/// A per-target manual override on the computed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageOverride {
    /// No override.
    #[default]
    None,
    /// Double the amount.
    Double,
    /// Halve the amount, rounded down.
    Half,
    /// Zero the amount out.
    Zero,
}

impl DamageOverride {
    fn apply(self, base: i64) -> i64 {
        match self {
            DamageOverride::None => base,
            DamageOverride::Double => base * 2,
            DamageOverride::Half => base.div_euclid(2),
            DamageOverride::Zero => 0,
        }
    }
}

/// One target of a posted damage roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageTarget {
    /// The actor taking the hit.
    pub actor: ActorId,
    /// Display name captured when targeted.
    pub name: String,
    /// The attack roll missed this target.
    pub missed: bool,
    /// Standing toward the damage channel, captured at targeting time.
    pub resistance: Resistance,
    /// Manual per-target adjustment.
    pub adjustment: DamageOverride,
    /// Skip this target entirely.
    pub excluded: bool,
}

/// A posted damage roll awaiting application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageState {
    /// The formula this roll came from, for display.
    pub formula: String,
    /// The damage channel.
    pub damage_type: DamageType,
    /// Rolled dice.
    pub dice: Vec<DamageDie>,
    /// Ad-hoc dice added after posting.
    pub extra: Vec<ExtraDie>,
    /// Flat modifier.
    pub modifier: i64,
    /// Stress marked on each struck target alongside wounds.
    pub stress: i64,
    /// Missed targets take half damage instead of none.
    pub half_to_missed: bool,
    /// The targets.
    pub targets: Vec<DamageTarget>,
}

impl DamageState {
    /// The raw total before per-target adjustment.
    pub fn total(&self) -> i64 {
        let dice: i64 = self
            .dice
            .iter()
            .map(|d| {
                let v = i64::from(d.value);
                if d.negative { -v } else { v }
            })
            .sum();
        let extra: i64 = self.extra.iter().map(ExtraDie::signed).sum();
        dice + extra + self.modifier
    }

    /// The amount one target actually takes, after the miss rule,
    /// resistance, and the manual override, floored at zero.
    pub fn damage_for(&self, target: &DamageTarget) -> i64 {
        if target.excluded || (target.missed && !self.half_to_missed) {
            return 0;
        }
        let mut amount = self.total();
        if target.missed {
            amount = amount.div_euclid(2);
        }
        let resistance = match self.damage_type {
            DamageType::Direct => Resistance::Normal,
            _ => target.resistance,
        };
        amount = resistance.apply(amount);
        target.adjustment.apply(amount).max(0)
    }
}

/// The result of applying a damage state to its targets.
#[derive(Debug)]
pub struct DamageApplication {
    /// Deltas committed to NPC targets, for the undo stack.
    pub batch: UndoBatch,
    /// Armor negotiations opened for player targets.
    pub pending: Vec<Negotiation>,
}

/// Apply a posted damage roll to every live target.
///
/// NPC targets take wounds and stress immediately; player targets are
/// returned as open [`Negotiation`]s so armor can be spent before the
/// hit is committed. Nothing is written for a target whose computed
/// amount is zero.
pub fn apply_damage(
    session: &Session,
    table: &mut Table,
    state: &DamageState,
) -> MechResult<DamageApplication> {
    let mut batch = UndoBatch::new();
    let mut pending = Vec::new();

    for target in &state.targets {
        if target.excluded || (target.missed && !state.half_to_missed) {
            continue;
        }
        let amount = state.damage_for(target);
        if amount == 0 && state.stress == 0 {
            continue;
        }
        let actor = table.require_actor(target.actor)?;
        let thresholds = Thresholds::of(actor);
        match actor.kind {
            ActorKind::Npc => {
                let entry = commit_hit(
                    session,
                    table,
                    target.actor,
                    severity(amount, thresholds).wounds(),
                    state.stress,
                    0,
                )?;
                if !entry.is_noop() {
                    batch.push(entry);
                }
            }
            ActorKind::Player => {
                pending.push(Negotiation::open(
                    actor,
                    amount,
                    thresholds,
                    state.damage_type,
                    state.stress,
                ));
            }
        }
    }

    Ok(DamageApplication { batch, pending })
}

/// Write wounds, stress, and an armor spend to an actor, clamped to
/// the sheet's bounds, and return the literal deltas for undo.
pub(crate) fn commit_hit(
    session: &Session,
    table: &mut Table,
    actor_id: ActorId,
    wounds: i64,
    stress: i64,
    armor: i64,
) -> MechResult<UndoEntry> {
    let actor = table.require_actor(actor_id)?;
    let hp = actor.fields.get(path::HP_VALUE);
    let hp_max = actor.fields.get(path::HP_MAX);
    let stress_value = actor.fields.get(path::STRESS_VALUE);
    let stress_max = actor.fields.get(path::STRESS_MAX);
    let armor_value = actor.fields.get(path::ARMOR_VALUE);
    let armor_max = actor.fields.get(path::ARMOR_MAX);

    // Wounds count up toward max; a sheet with no max takes them raw.
    let hp_delta = if hp_max > 0 {
        (hp + wounds).clamp(0, hp_max) - hp
    } else {
        wounds
    };
    let stress_delta = if stress_max > 0 {
        (stress_value + stress).clamp(0, stress_max) - stress_value
    } else {
        stress
    };
    let armor_delta = (armor_value + armor).clamp(0, armor_max.max(armor_value)) - armor_value;

    for (field, delta) in [
        (path::HP_VALUE, hp_delta),
        (path::STRESS_VALUE, stress_delta),
        (path::ARMOR_VALUE, armor_delta),
    ] {
        if delta != 0 {
            session.execute(
                table,
                Mutation::AdjustField {
                    actor: actor_id,
                    path: field.to_string(),
                    delta,
                },
            )?;
        }
    }

    Ok(UndoEntry {
        actor: actor_id,
        hp: hp_delta,
        stress: stress_delta,
        armor: armor_delta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds(noticeable: i64, heavy: i64) -> Thresholds {
        Thresholds { noticeable, heavy }
    }

    #[test]
    fn severity_ladder_is_strict_below() {
        let t = thresholds(5, 10);
        assert_eq!(severity(0, t), Severity::None);
        assert_eq!(severity(-3, t), Severity::None);
        assert_eq!(severity(4, t), Severity::Minor);
        assert_eq!(severity(5, t), Severity::Noticeable);
        assert_eq!(severity(9, t), Severity::Noticeable);
        assert_eq!(severity(10, t), Severity::Heavy);
        assert_eq!(severity(19, t), Severity::Heavy);
        assert_eq!(severity(20, t), Severity::Critical);
    }

    #[test]
    fn zeroed_thresholds_floor_to_one() {
        let t = thresholds(0, 0);
        assert_eq!(severity(1, t), Severity::Noticeable);
        assert_eq!(severity(2, t), Severity::Critical);
    }

    #[test]
    fn resistance_scaling() {
        assert_eq!(Resistance::Resist.apply(9), 4);
        assert_eq!(Resistance::Resist.apply(-3), -2);
        assert_eq!(Resistance::Immune.apply(40), 0);
        assert_eq!(Resistance::Vulnerable.apply(7), 14);
    }

    fn target(actor: ActorId, resistance: Resistance) -> DamageTarget {
        DamageTarget {
            actor,
            name: "Guard".into(),
            missed: false,
            resistance,
            adjustment: DamageOverride::None,
            excluded: false,
        }
    }

    fn flat_state(amount: i64, damage_type: DamageType) -> DamageState {
        DamageState {
            formula: amount.to_string(),
            damage_type,
            dice: Vec::new(),
            extra: Vec::new(),
            modifier: amount,
            stress: 0,
            half_to_missed: false,
            targets: Vec::new(),
        }
    }

    #[test]
    fn direct_damage_ignores_resistance() {
        let id = ActorId::new();
        let state = flat_state(12, DamageType::Direct);
        let hit = target(id, Resistance::Immune);
        assert_eq!(state.damage_for(&hit), 12);
    }

    #[test]
    fn missed_target_takes_nothing_by_default() {
        let id = ActorId::new();
        let state = flat_state(12, DamageType::Physical);
        let mut hit = target(id, Resistance::Normal);
        hit.missed = true;
        assert_eq!(state.damage_for(&hit), 0);
    }

    #[test]
    fn half_to_missed_halves_before_resistance() {
        let id = ActorId::new();
        let mut state = flat_state(13, DamageType::Physical);
        state.half_to_missed = true;
        let mut hit = target(id, Resistance::Resist);
        hit.missed = true;
        // 13 halved to 6, then resisted to 3.
        assert_eq!(state.damage_for(&hit), 3);
    }

    #[test]
    fn override_applies_after_resistance() {
        let id = ActorId::new();
        let state = flat_state(10, DamageType::Physical);
        let mut hit = target(id, Resistance::Resist);
        hit.adjustment = DamageOverride::Double;
        assert_eq!(state.damage_for(&hit), 10);
        hit.adjustment = DamageOverride::Zero;
        assert_eq!(state.damage_for(&hit), 0);
    }

    #[test]
    fn excluded_target_takes_nothing() {
        let id = ActorId::new();
        let state = flat_state(10, DamageType::Physical);
        let mut hit = target(id, Resistance::Normal);
        hit.excluded = true;
        assert_eq!(state.damage_for(&hit), 0);
    }

    #[test]
    fn total_sums_signed_dice_and_extras() {
        let mut state = flat_state(2, DamageType::Physical);
        state.dice = vec![
            DamageDie {
                sides: 6,
                value: 4,
                negative: false,
            },
            DamageDie {
                sides: 4,
                value: 3,
                negative: true,
            },
        ];
        state.extra.push(ExtraDie {
            sides: 6,
            value: 5,
            negative: false,
        });
        assert_eq!(state.total(), 4 - 3 + 5 + 2);
    }
}
