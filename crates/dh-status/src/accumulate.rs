//! Desired-map accumulation.
//!
//! Computes what every active status source *should* currently
//! contribute to an actor's numeric fields. The sync pass in
//! [`crate::sync`] diffs these maps against applied snapshots; nothing
//! here mutates a document.

use dh_core::{Actor, ActorId, DiceRoller, Item, ItemCategory, Table, TraitKey, fields::path};

use crate::error::StatusResult;
use crate::modifier::{
    DesiredMap, Edge, ModifierInstance, ModifierKind, ModifierRegistry, RollContext,
};
use crate::scope::{ActorScope, LabelIndex};
use crate::status::{StatusDefinition, StatusId, applied_statuses, item_statuses, local_statuses};

/// The persistent contributions one item currently owes its owner.
///
/// Every status with `when != Button` contributes while active (always
/// for `Backpack`, equip-gated for `Equip`). Instant modifiers are
/// skipped entirely; merely owning an item never fires them.
///
/// Equipped armor additionally injects its three raw stats directly.
/// This bypasses the modifier system on purpose: armor's injection is
/// gated only by equip state, never by a status trigger.
pub fn item_desired_map(
    item: &Item,
    owner: &Actor,
    registry: &ModifierRegistry,
    index: &LabelIndex,
) -> DesiredMap {
    let mut out = DesiredMap::new();
    let scope = ActorScope::new(owner, index);

    for status in item_statuses(item, registry) {
        if !status.active_on_item(item.is_equipped()) {
            continue;
        }
        for modifier in &status.mods {
            if modifier.kind() != ModifierKind::Persistent {
                continue;
            }
            if let Some(handler) = registry.handler_for(modifier) {
                handler.accumulate(&mut out, modifier, &scope);
            }
        }
    }

    if let ItemCategory::Armor {
        score,
        noticeable,
        heavy,
    } = item.category
    {
        if item.is_equipped() {
            *out.entry(path::ARMOR_MAX.to_string()).or_insert(0) += score;
            *out.entry(path::THRESHOLD_NOTICEABLE.to_string()).or_insert(0) += noticeable;
            *out.entry(path::THRESHOLD_HEAVY.to_string()).or_insert(0) += heavy;
        }
    }

    out
}

/// The outcome of one actor-level accumulation pass.
#[derive(Debug, Clone, Default)]
pub struct ActorPlan {
    /// Persistent contributions; diffed against the applied snapshot.
    pub desired: DesiredMap,
    /// One-shot contributions; applied once, never snapshotted.
    pub instant: DesiredMap,
    /// Local statuses to delete after the instant pass fires.
    pub consume_local: Vec<StatusId>,
    /// Applied statuses to delete after the instant pass fires.
    pub consume_applied: Vec<StatusId>,
}

/// Compute the actor-sourced plan: persistent and instant contributions
/// from local and applied statuses, plus the consumption sets.
///
/// Applied statuses with a resolvable caster evaluate their formulas
/// against the caster, not the target. Instant formulas may roll dice
/// through `roller`.
pub fn actor_plan(
    table: &Table,
    actor_id: ActorId,
    registry: &ModifierRegistry,
    index: &LabelIndex,
    roller: &mut dyn DiceRoller,
) -> StatusResult<ActorPlan> {
    let actor = table.require_actor(actor_id)?;
    let mut plan = ActorPlan::default();

    for status in local_statuses(actor, registry) {
        if !status.active_on_actor() {
            continue;
        }
        let scope = ActorScope::new(actor, index);
        accumulate_status(&status, &scope, registry, roller, &mut plan);
        if status.has_instant() {
            plan.consume_local.push(status.id);
        }
    }

    for status in applied_statuses(actor, registry) {
        if !status.active_on_actor() {
            continue;
        }
        let caster = status
            .source
            .as_ref()
            .and_then(|s| s.caster)
            .and_then(|id| table.actor(id));
        let subject = caster.unwrap_or(actor);
        let scope = ActorScope::new(subject, index);
        accumulate_status(&status, &scope, registry, roller, &mut plan);
        if status.has_instant() {
            plan.consume_applied.push(status.id);
        }
    }

    Ok(plan)
}

fn accumulate_status(
    status: &StatusDefinition,
    scope: &ActorScope<'_>,
    registry: &ModifierRegistry,
    roller: &mut dyn DiceRoller,
    plan: &mut ActorPlan,
) {
    for modifier in &status.mods {
        let Some(handler) = registry.handler_for(modifier) else {
            continue;
        };
        match modifier.kind() {
            ModifierKind::Persistent => {
                handler.accumulate(&mut plan.desired, modifier, scope);
            }
            ModifierKind::Instant => {
                if let Some((path, delta)) = handler.compute_instant(modifier, scope, roller) {
                    *plan.instant.entry(path).or_insert(0) += delta;
                }
            }
        }
    }
}

/// Net advantage and disadvantage counts a roll picks up from the
/// actor's active statuses: equipped items, local statuses, and applied
/// statuses, filtered by trait and roll context.
pub fn status_edge_counts(
    actor: &Actor,
    trait_key: Option<TraitKey>,
    context: RollContext,
    registry: &ModifierRegistry,
) -> (u32, u32) {
    let mut advantage = 0;
    let mut disadvantage = 0;
    let mut tally = |statuses: Vec<StatusDefinition>, active: &dyn Fn(&StatusDefinition) -> bool| {
        for status in statuses {
            if !active(&status) {
                continue;
            }
            for modifier in &status.mods {
                if let ModifierInstance::Advantage {
                    edge,
                    trait_scope,
                    context: mod_context,
                } = modifier
                {
                    if trait_scope.covers(trait_key) && mod_context.covers(context) {
                        match edge {
                            Edge::Advantage => advantage += 1,
                            Edge::Disadvantage => disadvantage += 1,
                        }
                    }
                }
            }
        }
    };

    for item in &actor.items {
        let equipped = item.is_equipped();
        tally(item_statuses(item, registry), &move |s| {
            s.active_on_item(equipped)
        });
    }
    tally(local_statuses(actor, registry), &|s| s.active_on_actor());
    tally(applied_statuses(actor, registry), &|s| s.active_on_actor());

    (advantage, disadvantage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dh_core::{ActorKind, Container, ScriptedRoller};
    use crate::modifier::{MarkTarget, TraitScope};
    use crate::status::{ActivationWhen, flag, write_statuses};

    fn registry() -> ModifierRegistry {
        ModifierRegistry::with_builtins()
    }

    fn attribute(path: &str, value: &str) -> ModifierInstance {
        ModifierInstance::Attribute {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    fn armor_item() -> Item {
        Item::new(
            ItemCategory::Armor {
                score: 3,
                noticeable: 5,
                heavy: 10,
            },
            "Chainmail",
        )
    }

    #[test]
    fn armor_injects_raw_stats_only_while_equipped() {
        let owner = Actor::new(ActorKind::Player, "Yara");
        let mut item = armor_item();
        let index = LabelIndex::new();

        let backpacked = item_desired_map(&item, &owner, &registry(), &index);
        assert!(backpacked.is_empty());

        item.container = Container::Equipped;
        let equipped = item_desired_map(&item, &owner, &registry(), &index);
        assert_eq!(equipped.get(path::ARMOR_MAX), Some(&3));
        assert_eq!(equipped.get(path::THRESHOLD_NOTICEABLE), Some(&5));
        assert_eq!(equipped.get(path::THRESHOLD_HEAVY), Some(&10));
    }

    #[test]
    fn equip_status_gated_by_container() {
        let owner = Actor::new(ActorKind::Player, "Yara");
        let mut item = Item::new(ItemCategory::Gear, "Ring");
        let mut status = StatusDefinition::new("Sharp", ActivationWhen::Equip);
        status.mods.push(attribute("evasion", "1"));
        write_statuses(&mut item.flags, flag::ITEM_STATUSES, &[status]);
        let index = LabelIndex::new();

        assert!(item_desired_map(&item, &owner, &registry(), &index).is_empty());
        item.container = Container::Equipped;
        let map = item_desired_map(&item, &owner, &registry(), &index);
        assert_eq!(map.get("evasion"), Some(&1));
    }

    #[test]
    fn button_and_instant_mods_skipped_on_items() {
        let owner = Actor::new(ActorKind::Player, "Yara");
        let mut item = Item::new(ItemCategory::Gear, "Potion");
        item.container = Container::Equipped;

        let mut button = StatusDefinition::new("Throw", ActivationWhen::Button);
        button.mods.push(attribute("evasion", "5"));
        let mut instant = StatusDefinition::new("Drink", ActivationWhen::Backpack);
        instant.mods.push(ModifierInstance::InstantAttribute {
            path: path::HOPE_VALUE.to_string(),
            value: "2".to_string(),
        });
        write_statuses(&mut item.flags, flag::ITEM_STATUSES, &[button, instant]);

        let map = item_desired_map(&item, &owner, &registry(), &LabelIndex::new());
        assert!(map.is_empty());
    }

    #[test]
    fn actor_plan_splits_persistent_and_instant() {
        let mut table = Table::new();
        let mut actor = Actor::new(ActorKind::Player, "Yara");
        let mut mixed = StatusDefinition::new("Blessing", ActivationWhen::Backpack);
        mixed.mods.push(attribute("evasion", "2"));
        mixed.mods.push(ModifierInstance::Marks {
            target: MarkTarget::Stress,
            value: "1d4".to_string(),
        });
        let mixed_id = mixed.id;
        write_statuses(&mut actor.flags, flag::ACTOR_STATUSES, &[mixed]);
        let id = table.add_actor(actor).unwrap();

        let mut roller = ScriptedRoller::new([3]);
        let plan = actor_plan(&table, id, &registry(), &LabelIndex::new(), &mut roller).unwrap();
        assert_eq!(plan.desired.get("evasion"), Some(&2));
        assert_eq!(plan.instant.get(path::STRESS_VALUE), Some(&3));
        // One instant modifier marks the whole status for consumption.
        assert_eq!(plan.consume_local, vec![mixed_id]);
        assert!(plan.consume_applied.is_empty());
    }

    #[test]
    fn applied_status_evaluates_against_caster() {
        let mut table = Table::new();
        let mut caster = Actor::new(ActorKind::Player, "Bren");
        caster.set_trait(TraitKey::Knowledge, 4);
        let caster_id = table.add_actor(caster).unwrap();

        let mut target = Actor::new(ActorKind::Player, "Yara");
        target.set_trait(TraitKey::Knowledge, 1);
        let mut status = StatusDefinition::new("Insight", ActivationWhen::Backpack);
        status.mods.push(attribute("evasion", "@Knowledge"));
        status.source = Some(crate::status::StatusSource {
            name: "Insight".to_string(),
            caster: Some(caster_id),
            caster_name: "Bren".to_string(),
            status_id: status.id,
        });
        write_statuses(&mut target.flags, flag::APPLIED_STATUSES, &[status]);
        let target_id = table.add_actor(target).unwrap();

        let mut roller = ScriptedRoller::new([]);
        let plan = actor_plan(
            &table,
            target_id,
            &registry(),
            &LabelIndex::standard(),
            &mut roller,
        )
        .unwrap();
        assert_eq!(plan.desired.get("evasion"), Some(&4));
    }

    #[test]
    fn edge_counts_filter_by_trait_and_context() {
        let mut actor = Actor::new(ActorKind::Player, "Yara");
        let mut status = StatusDefinition::new("Shaken", ActivationWhen::Backpack);
        status.mods.push(ModifierInstance::Advantage {
            edge: Edge::Disadvantage,
            trait_scope: TraitScope::Trait(TraitKey::Agility),
            context: RollContext::Any,
        });
        status.mods.push(ModifierInstance::Advantage {
            edge: Edge::Advantage,
            trait_scope: TraitScope::All,
            context: RollContext::Reaction,
        });
        write_statuses(&mut actor.flags, flag::ACTOR_STATUSES, &[status]);

        let registry = registry();
        assert_eq!(
            status_edge_counts(&actor, Some(TraitKey::Agility), RollContext::Any, &registry),
            (0, 1)
        );
        assert_eq!(
            status_edge_counts(&actor, Some(TraitKey::Finesse), RollContext::Any, &registry),
            (0, 0)
        );
        assert_eq!(
            status_edge_counts(
                &actor,
                Some(TraitKey::Agility),
                RollContext::Reaction,
                &registry
            ),
            (1, 1)
        );
    }
}
