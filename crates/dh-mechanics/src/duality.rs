//! Duality and NPC roll execution.
//!
//! A duality roll is a Hope d12 against a Fear d12, plus an edge pool
//! of `|advantage − disadvantage|` d6s. NPC rolls use a single d20,
//! doubled into a max/min pair under advantage or disadvantage, and
//! never produce a narrative outcome.

use dh_core::{Actor, DiceRoller, TraitKey};
use serde::{Deserialize, Serialize};

use crate::roll_state::{
    DUALITY_SIDES, DieSlot, EDGE_SIDES, Experience, NPC_SIDES, NamedDie, RollState,
};

/// What kind of roll a state describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollKind {
    /// A player duality roll.
    Duality {
        /// The trait the check was made with, if any.
        #[serde(rename = "trait")]
        trait_key: Option<TraitKey>,
    },
    /// A gamemaster-side single-die roll.
    Npc,
}

/// The narrative outcome of a duality roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollOutcome {
    /// Hope die wins.
    Hope,
    /// Fear die wins.
    Fear,
    /// The dice match.
    Critical,
}

/// Classify a duality roll from its two live die values.
pub fn classify(hope: u32, fear: u32) -> RollOutcome {
    if hope == fear {
        RollOutcome::Critical
    } else if fear > hope {
        RollOutcome::Fear
    } else {
        RollOutcome::Hope
    }
}

/// Inputs to a roll.
#[derive(Debug, Clone, Default)]
pub struct RollInput {
    /// Trait the check is made with; its value folds into the modifier.
    pub trait_key: Option<TraitKey>,
    /// Advantage count.
    pub advantage: u32,
    /// Disadvantage count.
    pub disadvantage: u32,
    /// Flat modifier before the trait value.
    pub modifier: i64,
    /// Experience bonuses, pre-toggled by the caller.
    pub experiences: Vec<Experience>,
    /// Reactions have no outcome, no resource effects, and no weapon
    /// damage display.
    pub is_reaction: bool,
    /// Weapon damage formula to carry on the message.
    pub damage_formula: Option<String>,
}

/// Execute a duality roll.
pub fn roll_duality(actor: &Actor, input: RollInput, roller: &mut dyn DiceRoller) -> RollState {
    let mut dice = vec![
        NamedDie {
            slot: DieSlot::Hope,
            sides: DUALITY_SIDES,
            value: Some(roller.roll(DUALITY_SIDES)),
        },
        NamedDie {
            slot: DieSlot::Fear,
            sides: DUALITY_SIDES,
            value: Some(roller.roll(DUALITY_SIDES)),
        },
    ];
    let pool = input.advantage.abs_diff(input.disadvantage);
    for i in 0..pool {
        dice.push(NamedDie {
            slot: DieSlot::Edge(i),
            sides: EDGE_SIDES,
            value: Some(roller.roll(EDGE_SIDES)),
        });
    }

    let trait_bonus = input.trait_key.map_or(0, |key| actor.trait_value(key));
    let mut state = RollState {
        actor: actor.id,
        kind: RollKind::Duality {
            trait_key: input.trait_key,
        },
        is_reaction: input.is_reaction,
        advantage: input.advantage,
        disadvantage: input.disadvantage,
        modifier: input.modifier + trait_bonus,
        experiences: input.experiences,
        dice,
        extra: Vec::new(),
        targets: Vec::new(),
        applied: None,
        damage_formula: input.damage_formula,
    };
    state.evaluate_targets();
    state
}

/// Execute an NPC roll: one d20, or a pair resolved as max under
/// advantage and min under disadvantage.
pub fn roll_npc(actor: &Actor, input: RollInput, roller: &mut dyn DiceRoller) -> RollState {
    let mut dice = vec![NamedDie {
        slot: DieSlot::Npc,
        sides: NPC_SIDES,
        value: Some(roller.roll(NPC_SIDES)),
    }];
    if input.advantage != input.disadvantage {
        dice.push(NamedDie {
            slot: DieSlot::NpcAlt,
            sides: NPC_SIDES,
            value: Some(roller.roll(NPC_SIDES)),
        });
    }

    let trait_bonus = input.trait_key.map_or(0, |key| actor.trait_value(key));
    let mut state = RollState {
        actor: actor.id,
        kind: RollKind::Npc,
        is_reaction: input.is_reaction,
        advantage: input.advantage,
        disadvantage: input.disadvantage,
        modifier: input.modifier + trait_bonus,
        experiences: input.experiences,
        dice,
        extra: Vec::new(),
        targets: Vec::new(),
        applied: None,
        damage_formula: input.damage_formula,
    };
    state.evaluate_targets();
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use dh_core::{ActorKind, ScriptedRoller};

    #[test]
    fn classification_table() {
        assert_eq!(classify(7, 7), RollOutcome::Critical);
        assert_eq!(classify(8, 5), RollOutcome::Hope);
        assert_eq!(classify(3, 9), RollOutcome::Fear);
    }

    #[test]
    fn trait_value_folds_into_modifier() {
        let mut actor = Actor::new(ActorKind::Player, "Yara");
        actor.set_trait(TraitKey::Agility, 2);
        let mut roller = ScriptedRoller::new([6, 3]);
        let input = RollInput {
            trait_key: Some(TraitKey::Agility),
            modifier: 1,
            ..RollInput::default()
        };
        let state = roll_duality(&actor, input, &mut roller);
        assert_eq!(state.modifier, 3);
        assert_eq!(state.total(), 6 + 3 + 3);
    }

    #[test]
    fn edge_pool_is_net_of_counts() {
        let actor = Actor::new(ActorKind::Player, "Yara");
        let mut roller = ScriptedRoller::new([6, 3, 4]);
        let input = RollInput {
            advantage: 2,
            disadvantage: 1,
            ..RollInput::default()
        };
        let state = roll_duality(&actor, input, &mut roller);
        assert_eq!(
            state
                .dice
                .iter()
                .filter(|d| matches!(d.slot, DieSlot::Edge(_)))
                .count(),
            1
        );
    }

    #[test]
    fn equal_counts_roll_no_pool() {
        let actor = Actor::new(ActorKind::Player, "Yara");
        let mut roller = ScriptedRoller::new([6, 3]);
        let input = RollInput {
            advantage: 2,
            disadvantage: 2,
            ..RollInput::default()
        };
        let state = roll_duality(&actor, input, &mut roller);
        assert_eq!(state.dice.len(), 2);
        assert_eq!(state.edge_contribution(), 0);
    }

    #[test]
    fn npc_single_die_without_edges() {
        let actor = Actor::new(ActorKind::Npc, "Guard");
        let mut roller = ScriptedRoller::new([14]);
        let state = roll_npc(&actor, RollInput::default(), &mut roller);
        assert_eq!(state.dice.len(), 1);
        assert_eq!(state.total(), 14);
        assert_eq!(state.outcome(), None);
    }
}
