//! Persisted roll state and its interactive edits.
//!
//! A [`RollState`] captures every input needed to regenerate a posted
//! roll's result: die faces per named slot, resolved values (nullable,
//! for a deleted die), the flat modifier, experience toggles, ad-hoc extra
//! dice, the target list, and the resource outcome already committed.
//! A host persists it as the chat message's flags payload and mutates
//! it in place on every edit; it is never deleted.

use std::fmt;

use dh_core::{Actor, ActorId, DiceRoller, fields::path};
use dh_formula::{DamageFormula, Scope};
use serde::{Deserialize, Serialize};

use crate::duality::{RollKind, RollOutcome, classify};
use crate::error::{MechError, MechResult};
use crate::reconcile::AppliedOutcome;

/// Sides on a duality die.
pub const DUALITY_SIDES: u32 = 12;
/// Sides on an edge-pool die.
pub const EDGE_SIDES: u32 = 6;
/// Sides on an NPC roll die.
pub const NPC_SIDES: u32 = 20;

/// A named die slot in a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DieSlot {
    /// The Hope d12.
    Hope,
    /// The Fear d12.
    Fear,
    /// The NPC d20.
    Npc,
    /// The second NPC d20 rolled under advantage or disadvantage.
    NpcAlt,
    /// One die of the edge pool.
    Edge(u32),
}

impl fmt::Display for DieSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hope => write!(f, "hope"),
            Self::Fear => write!(f, "fear"),
            Self::Npc => write!(f, "npc"),
            Self::NpcAlt => write!(f, "npc-alt"),
            Self::Edge(i) => write!(f, "edge-{i}"),
        }
    }
}

/// One die of a roll. A `None` value is a deleted die: it keeps its
/// slot (so the rendered layout is stable) but contributes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedDie {
    /// Which slot this die fills.
    pub slot: DieSlot,
    /// Die faces.
    pub sides: u32,
    /// Rolled value, or `None` after deletion.
    pub value: Option<u32>,
}

/// An ad-hoc die added after the roll was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraDie {
    /// Die faces.
    pub sides: u32,
    /// Rolled value.
    pub value: u32,
    /// Whether the die subtracts from the total.
    pub negative: bool,
}

impl ExtraDie {
    /// Signed contribution to the total.
    pub fn signed(&self) -> i64 {
        let v = i64::from(self.value);
        if self.negative { -v } else { v }
    }
}

/// A named experience bonus, toggleable after the roll is posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    /// Display name.
    pub name: String,
    /// Bonus contributed while active.
    pub value: i64,
    /// Whether the bonus currently counts.
    pub active: bool,
}

/// A targeted token, with its computed hit state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollTarget {
    /// Target actor.
    pub actor: ActorId,
    /// Display name at targeting time.
    pub name: String,
    /// The target's evasion when targeted.
    pub evasion: i64,
    /// Computed on every recompute: total at or above evasion, or any
    /// critical outcome.
    pub hit: bool,
}

/// Everything needed to regenerate a posted roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollState {
    /// The rolling actor.
    pub actor: ActorId,
    /// Duality or NPC roll.
    pub kind: RollKind,
    /// Reaction rolls have no outcome and no resource effects.
    pub is_reaction: bool,
    /// Advantage count at roll time.
    pub advantage: u32,
    /// Disadvantage count at roll time.
    pub disadvantage: u32,
    /// Flat modifier (trait value folded in at roll time).
    pub modifier: i64,
    /// Experience bonuses.
    pub experiences: Vec<Experience>,
    /// Named dice.
    pub dice: Vec<NamedDie>,
    /// Ad-hoc extra dice, signed.
    pub extra: Vec<ExtraDie>,
    /// Targeted tokens with computed hit state.
    pub targets: Vec<RollTarget>,
    /// The resource outcome last committed, for reconciliation.
    pub applied: Option<AppliedOutcome>,
    /// The weapon damage formula as authored; never rewritten.
    pub damage_formula: Option<String>,
}

impl RollState {
    /// The die in a slot.
    pub fn die(&self, slot: DieSlot) -> Option<&NamedDie> {
        self.dice.iter().find(|d| d.slot == slot)
    }

    /// The live value of a slot (0 when deleted or absent).
    fn slot_value(&self, slot: DieSlot) -> i64 {
        self.die(slot)
            .and_then(|d| d.value)
            .map_or(0, i64::from)
    }

    /// Live edge-pool values.
    fn edge_values(&self) -> Vec<u32> {
        self.dice
            .iter()
            .filter(|d| matches!(d.slot, DieSlot::Edge(_)))
            .filter_map(|d| d.value)
            .collect()
    }

    /// The edge pool's contribution: `+max(pool)` when advantage
    /// outnumbers disadvantage, `-max(pool)` when the reverse, 0 when
    /// the counts cancel or every pool die is deleted.
    pub fn edge_contribution(&self) -> i64 {
        let best = self.edge_values().into_iter().max().map_or(0, i64::from);
        match self.advantage.cmp(&self.disadvantage) {
            std::cmp::Ordering::Greater => best,
            std::cmp::Ordering::Less => -best,
            std::cmp::Ordering::Equal => 0,
        }
    }

    /// Sum of active experience bonuses.
    pub fn experience_total(&self) -> i64 {
        self.experiences
            .iter()
            .filter(|e| e.active)
            .map(|e| e.value)
            .sum()
    }

    /// The roll total.
    pub fn total(&self) -> i64 {
        let base = match self.kind {
            RollKind::Duality { .. } => {
                self.slot_value(DieSlot::Hope) + self.slot_value(DieSlot::Fear)
                    + self.edge_contribution()
            }
            RollKind::Npc => {
                let first = self.slot_value(DieSlot::Npc);
                match (self.die(DieSlot::NpcAlt), self.advantage.cmp(&self.disadvantage)) {
                    (Some(_), std::cmp::Ordering::Greater) => {
                        first.max(self.slot_value(DieSlot::NpcAlt))
                    }
                    (Some(_), std::cmp::Ordering::Less) => {
                        first.min(self.slot_value(DieSlot::NpcAlt))
                    }
                    _ => first,
                }
            }
        };
        base + self.modifier
            + self.experience_total()
            + self.extra.iter().map(ExtraDie::signed).sum::<i64>()
    }

    /// The narrative outcome. `None` for reactions, NPC rolls, and rolls
    /// whose Hope or Fear die has been deleted.
    pub fn outcome(&self) -> Option<RollOutcome> {
        if self.is_reaction || self.kind == RollKind::Npc {
            return None;
        }
        let hope = self.die(DieSlot::Hope)?.value?;
        let fear = self.die(DieSlot::Fear)?.value?;
        Some(classify(hope, fear))
    }

    /// Reroll the die in a slot, returning the new value.
    pub fn reroll(&mut self, slot: DieSlot, roller: &mut dyn DiceRoller) -> MechResult<u32> {
        let die = self
            .dice
            .iter_mut()
            .find(|d| d.slot == slot)
            .ok_or(MechError::UnknownDie(slot))?;
        let value = roller.roll(die.sides);
        die.value = Some(value);
        self.evaluate_targets();
        Ok(value)
    }

    /// Delete the die in a slot. The slot stays; its value becomes null.
    pub fn delete_die(&mut self, slot: DieSlot) -> MechResult<()> {
        let die = self
            .dice
            .iter_mut()
            .find(|d| d.slot == slot)
            .ok_or(MechError::UnknownDie(slot))?;
        die.value = None;
        self.evaluate_targets();
        Ok(())
    }

    /// Replace the flat modifier.
    pub fn set_modifier(&mut self, modifier: i64) {
        self.modifier = modifier;
        self.evaluate_targets();
    }

    /// Roll and add an ad-hoc extra die.
    pub fn add_extra(&mut self, sides: u32, negative: bool, roller: &mut dyn DiceRoller) -> u32 {
        let value = roller.roll(sides);
        self.extra.push(ExtraDie {
            sides,
            value,
            negative,
        });
        self.evaluate_targets();
        value
    }

    /// Remove an ad-hoc extra die by index.
    pub fn remove_extra(&mut self, index: usize) -> MechResult<()> {
        if index >= self.extra.len() {
            return Err(MechError::UnknownExtraDie(index));
        }
        self.extra.remove(index);
        self.evaluate_targets();
        Ok(())
    }

    /// Toggle an experience bonus by name. Returns the new state, or
    /// `None` when no experience has that name.
    pub fn toggle_experience(&mut self, name: &str) -> Option<bool> {
        let state = self.experiences.iter_mut().find_map(|e| {
            if e.name.eq_ignore_ascii_case(name) {
                e.active = !e.active;
                Some(e.active)
            } else {
                None
            }
        });
        if state.is_some() {
            self.evaluate_targets();
        }
        state
    }

    /// Add a target, evaluating its hit state immediately. Targets can
    /// be added after the message is posted.
    pub fn add_target(&mut self, target: &Actor) {
        self.targets.push(RollTarget {
            actor: target.id,
            name: target.name.clone(),
            evasion: target.fields.get(path::EVASION),
            hit: false,
        });
        self.evaluate_targets();
    }

    /// Remove a target.
    pub fn remove_target(&mut self, actor: ActorId) {
        self.targets.retain(|t| t.actor != actor);
    }

    /// Recompute every target's hit state from the current total.
    pub fn evaluate_targets(&mut self) {
        let total = self.total();
        let critical = self.outcome() == Some(RollOutcome::Critical);
        for target in &mut self.targets {
            target.hit = critical || total >= target.evasion;
        }
    }

    /// The damage formula to display: the authored formula, rewritten
    /// with its maximum dice value folded into the flat modifier on a
    /// critical. Reactions display no weapon damage. The stored
    /// original is never touched.
    pub fn display_damage(&self, scope: &dyn Scope) -> Option<String> {
        if self.is_reaction {
            return None;
        }
        let text = self.damage_formula.as_ref()?;
        let Some(parsed) = DamageFormula::parse(text, scope) else {
            return Some(text.clone());
        };
        if self.outcome() == Some(RollOutcome::Critical) {
            Some(parsed.critical().to_string())
        } else {
            Some(text.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duality::{RollInput, roll_duality, roll_npc};
    use dh_core::{ActorKind, ScriptedRoller};
    use dh_formula::EmptyScope;

    fn actor() -> Actor {
        Actor::new(ActorKind::Player, "Yara")
    }

    fn duality_with(hope: u32, fear: u32) -> RollState {
        let mut roller = ScriptedRoller::new([hope, fear]);
        roll_duality(&actor(), RollInput::default(), &mut roller)
    }

    #[test]
    fn total_sums_all_parts() {
        let mut state = duality_with(7, 4);
        state.modifier = 2;
        state.experiences.push(Experience {
            name: "Scout".to_string(),
            value: 2,
            active: true,
        });
        state.experiences.push(Experience {
            name: "Noble".to_string(),
            value: 1,
            active: false,
        });
        state.extra.push(ExtraDie {
            sides: 4,
            value: 3,
            negative: true,
        });
        assert_eq!(state.total(), 7 + 4 + 2 + 2 - 3);
    }

    #[test]
    fn edge_contribution_signs() {
        let mut roller = ScriptedRoller::new([7, 4, 2, 5]);
        let input = RollInput {
            advantage: 3,
            disadvantage: 1,
            ..RollInput::default()
        };
        let state = roll_duality(&actor(), input, &mut roller);
        // Net two d6 rolled: 2 and 5; advantage wins, +5.
        assert_eq!(state.edge_contribution(), 5);
        assert_eq!(state.total(), 7 + 4 + 5);

        let mut roller = ScriptedRoller::new([7, 4, 2, 5]);
        let input = RollInput {
            advantage: 1,
            disadvantage: 3,
            ..RollInput::default()
        };
        let state = roll_duality(&actor(), input, &mut roller);
        assert_eq!(state.edge_contribution(), -5);
    }

    #[test]
    fn deleted_edge_dice_leave_the_pool() {
        let mut roller = ScriptedRoller::new([7, 4, 2, 5]);
        let input = RollInput {
            advantage: 2,
            ..RollInput::default()
        };
        let mut state = roll_duality(&actor(), input, &mut roller);
        assert_eq!(state.edge_contribution(), 5);
        state.delete_die(DieSlot::Edge(1)).unwrap();
        assert_eq!(state.edge_contribution(), 2);
        state.delete_die(DieSlot::Edge(0)).unwrap();
        assert_eq!(state.edge_contribution(), 0);
    }

    #[test]
    fn outcome_reflects_live_values() {
        let mut state = duality_with(7, 7);
        assert_eq!(state.outcome(), Some(RollOutcome::Critical));
        let mut roller = ScriptedRoller::new([3]);
        state.reroll(DieSlot::Hope, &mut roller).unwrap();
        assert_eq!(state.outcome(), Some(RollOutcome::Fear));
        state.delete_die(DieSlot::Fear).unwrap();
        assert_eq!(state.outcome(), None);
    }

    #[test]
    fn reaction_has_no_outcome() {
        let mut roller = ScriptedRoller::new([8, 5]);
        let input = RollInput {
            is_reaction: true,
            ..RollInput::default()
        };
        let state = roll_duality(&actor(), input, &mut roller);
        assert_eq!(state.outcome(), None);
    }

    #[test]
    fn npc_advantage_takes_max() {
        let mut roller = ScriptedRoller::new([11, 17]);
        let input = RollInput {
            advantage: 1,
            ..RollInput::default()
        };
        let state = roll_npc(&actor(), input, &mut roller);
        assert_eq!(state.total(), 17);

        let mut roller = ScriptedRoller::new([11, 17]);
        let input = RollInput {
            disadvantage: 1,
            ..RollInput::default()
        };
        let state = roll_npc(&actor(), input, &mut roller);
        assert_eq!(state.total(), 11);
    }

    #[test]
    fn unknown_slot_errors() {
        let mut state = duality_with(7, 4);
        let mut roller = ScriptedRoller::new([1]);
        assert!(matches!(
            state.reroll(DieSlot::Npc, &mut roller),
            Err(MechError::UnknownDie(DieSlot::Npc))
        ));
        assert!(matches!(
            state.remove_extra(0),
            Err(MechError::UnknownExtraDie(0))
        ));
    }

    #[test]
    fn targets_recomputed_live() {
        let mut state = duality_with(6, 4);
        let mut guard = Actor::new(ActorKind::Npc, "Guard");
        guard.fields.set(path::EVASION, 12);
        state.add_target(&guard);
        assert!(!state.targets[0].hit);
        state.set_modifier(2);
        assert!(state.targets[0].hit);
    }

    #[test]
    fn critical_auto_hits() {
        let mut state = duality_with(5, 5);
        let mut keep = Actor::new(ActorKind::Npc, "Keep");
        keep.fields.set(path::EVASION, 99);
        state.add_target(&keep);
        assert!(state.targets[0].hit);
    }

    #[test]
    fn critical_rewrites_displayed_damage_only() {
        let mut state = duality_with(6, 6);
        state.damage_formula = Some("3d6+3".to_string());
        assert_eq!(state.display_damage(&EmptyScope).unwrap(), "3d6+21");
        assert_eq!(state.damage_formula.as_deref(), Some("3d6+3"));

        let mut roller = ScriptedRoller::new([2]);
        state.reroll(DieSlot::Hope, &mut roller).unwrap();
        assert_eq!(state.display_damage(&EmptyScope).unwrap(), "3d6+3");
    }

    #[test]
    fn reaction_suppresses_damage_display() {
        let mut roller = ScriptedRoller::new([8, 5]);
        let input = RollInput {
            is_reaction: true,
            damage_formula: Some("2d8".to_string()),
            ..RollInput::default()
        };
        let state = roll_duality(&actor(), input, &mut roller);
        assert_eq!(state.display_damage(&EmptyScope), None);
    }

    #[test]
    fn state_roundtrips_through_flags_payload() {
        let state = duality_with(7, 4);
        let payload = serde_json::to_value(&state).unwrap();
        let back: RollState = serde_json::from_value(payload).unwrap();
        assert_eq!(back, state);
    }
}
