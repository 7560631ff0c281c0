//! The armor negotiation for player targets.
//!
//! When a damage roll strikes a player character, the hit is not
//! committed immediately. A [`Negotiation`] holds the incoming amount
//! and lets the player spend armor slots before wounds are marked.
//! Each armor spend demotes the severity one step by capping the
//! effective damage just under the relevant threshold; a second spend
//! needs the gamemaster's sign-off.

use dh_core::{Actor, ActorId, CoreError, Session, Table};
use serde::{Deserialize, Serialize};

use crate::error::{MechError, MechResult};

use super::{DamageType, Severity, Thresholds, commit_hit, severity, undo::UndoBatch};

/// An open armor negotiation for one struck player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Negotiation {
    /// The struck actor.
    pub actor: ActorId,
    /// Display name captured when the negotiation opened.
    pub name: String,
    /// Incoming damage after resistance and overrides.
    pub damage: i64,
    /// The actor's thresholds, captured when the negotiation opened.
    pub thresholds: Thresholds,
    /// The damage channel of the hit.
    pub damage_type: DamageType,
    /// Stress marked alongside the wounds.
    pub stress: i64,
    /// Unspent armor slots available when the negotiation opened.
    pub armor_available: i64,
    /// Armor slots spent so far.
    pub armor_used: i64,
    /// Wounds cancelled by other effects.
    pub cancel_wounds: i64,
    /// Extra spends beyond the first granted by the gamemaster.
    pub extra_armor: i64,
}

impl Negotiation {
    /// Open a negotiation for a struck actor.
    pub fn open(
        actor: &Actor,
        damage: i64,
        thresholds: Thresholds,
        damage_type: DamageType,
        stress: i64,
    ) -> Self {
        Negotiation {
            actor: actor.id,
            name: actor.name.clone(),
            damage,
            thresholds,
            damage_type,
            stress,
            armor_available: actor.armor_capacity(),
            armor_used: 0,
            cancel_wounds: 0,
            extra_armor: 0,
        }
    }

    /// The damage amount after armor spends.
    ///
    /// Each spend demotes the current severity one step: the effective
    /// amount becomes the largest value that buckets into the step
    /// below (one under the threshold it sat at, or zero from Minor).
    pub fn effective_damage(&self) -> i64 {
        let mut amount = self.damage;
        for _ in 0..self.armor_used {
            let heavy = self.thresholds.heavy.max(1);
            let noticeable = self.thresholds.noticeable.max(1);
            amount = match severity(amount, self.thresholds) {
                Severity::Critical => heavy * 2 - 1,
                Severity::Heavy => heavy - 1,
                Severity::Noticeable => noticeable - 1,
                Severity::Minor | Severity::None => 0,
            };
        }
        amount
    }

    /// Wounds the hit will mark if committed now.
    pub fn wounds(&self) -> i64 {
        severity(self.effective_damage(), self.thresholds)
            .wounds()
            .saturating_sub(self.cancel_wounds)
            .max(0)
    }

    /// Spend one armor slot.
    ///
    /// Refused against direct damage, past the allowed spend count
    /// (one, plus any gamemaster-granted extras), or with no slots
    /// left on the sheet.
    pub fn spend_armor(&mut self) -> MechResult<()> {
        if self.damage_type == DamageType::Direct {
            return Err(MechError::ArmorAgainstDirect);
        }
        if self.armor_used >= 1 + self.extra_armor {
            return Err(MechError::ArmorLimit);
        }
        if self.armor_used >= self.armor_available {
            return Err(MechError::Core(CoreError::InsufficientResource {
                resource: "armor".into(),
                needed: self.armor_used + 1,
                available: self.armor_available,
            }));
        }
        self.armor_used += 1;
        Ok(())
    }

    /// Grant one extra armor spend beyond the first. Gamemaster only.
    pub fn allow_extra_armor(&mut self, session: &Session) -> MechResult<()> {
        session.require_gamemaster("extra armor spend")?;
        self.extra_armor += 1;
        Ok(())
    }

    /// Cancel one wound from the pending hit.
    pub fn cancel_wound(&mut self) {
        self.cancel_wounds += 1;
    }

    /// Commit the negotiated hit: mark wounds and stress, consume the
    /// spent armor slots, and record the literal deltas on `batch`.
    pub fn commit(
        &self,
        session: &Session,
        table: &mut Table,
        batch: &mut UndoBatch,
    ) -> MechResult<()> {
        let entry = commit_hit(
            session,
            table,
            self.actor,
            self.wounds(),
            self.stress,
            self.armor_used,
        )?;
        if !entry.is_noop() {
            batch.push(entry);
        }
        Ok(())
    }
}
