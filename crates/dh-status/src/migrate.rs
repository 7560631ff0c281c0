//! One-shot startup migration of persisted status data.
//!
//! Runs once per session start, by a gamemaster session only, across
//! every actor and item on the table. Each status list is read through
//! the normalizer (which absorbs the legacy `activator` field and the
//! `{attrPath, attrDelta}` shorthand) and written back only when the
//! normalized form differs from what is stored.

use dh_core::{FlagBag, Session, Table};

use crate::error::StatusResult;
use crate::modifier::ModifierRegistry;
use crate::status::{StatusContext, flag, read_statuses};

/// How much a migration pass rewrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Actor documents whose status flags were rewritten.
    pub actors: usize,
    /// Item documents whose status flags were rewritten.
    pub items: usize,
}

/// Migrate every persisted status list on the table.
pub fn migrate(
    session: &Session,
    table: &mut Table,
    registry: &ModifierRegistry,
) -> StatusResult<MigrationReport> {
    session.require_gamemaster("run the status migration")?;

    let mut report = MigrationReport::default();
    for actor in table.all_actors_mut() {
        let mut changed = migrate_key(&mut actor.flags, flag::ACTOR_STATUSES, StatusContext::Actor, registry);
        changed |= migrate_key(
            &mut actor.flags,
            flag::APPLIED_STATUSES,
            StatusContext::Actor,
            registry,
        );
        if changed {
            report.actors += 1;
        }
        for item in &mut actor.items {
            if migrate_key(&mut item.flags, flag::ITEM_STATUSES, StatusContext::Item, registry) {
                report.items += 1;
            }
        }
    }
    Ok(report)
}

/// Normalize one status flag in place. Returns true if storage changed.
fn migrate_key(
    bag: &mut FlagBag,
    key: &str,
    context: StatusContext,
    registry: &ModifierRegistry,
) -> bool {
    let Some(stored) = bag.get(key).cloned() else {
        return false;
    };
    let normalized = read_statuses(bag, key, context, registry);
    let rewritten = serde_json::to_value(&normalized).unwrap_or_default();
    if rewritten == stored {
        return false;
    }
    bag.set(key, rewritten);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusError;
    use crate::modifier::ModifierInstance;
    use crate::status::{ActivationWhen, local_statuses};
    use dh_core::{Actor, ActorKind, CoreError, Item, ItemCategory};
    use serde_json::json;

    fn registry() -> ModifierRegistry {
        ModifierRegistry::with_builtins()
    }

    #[test]
    fn requires_gamemaster() {
        let mut table = Table::new();
        assert!(matches!(
            migrate(&Session::player([]), &mut table, &registry()),
            Err(StatusError::Core(CoreError::PermissionDenied(_)))
        ));
    }

    #[test]
    fn rewrites_legacy_data_once() {
        let mut table = Table::new();
        let mut actor = Actor::new(ActorKind::Player, "Yara");
        actor.flags.set(
            flag::ACTOR_STATUSES,
            json!([{"name": "Old", "activator": "backpack", "attrPath": "evasion", "attrDelta": 1}]),
        );
        let mut item = Item::new(ItemCategory::Gear, "Ring");
        item.flags.set(
            flag::ITEM_STATUSES,
            json!([{"name": "Sharp", "activator": "equip"}]),
        );
        actor.items.push(item);
        let actor_id = table.add_actor(actor).unwrap();

        let gm = Session::gamemaster();
        let report = migrate(&gm, &mut table, &registry()).unwrap();
        assert_eq!(report, MigrationReport { actors: 1, items: 1 });

        let statuses = local_statuses(table.actor(actor_id).unwrap(), &registry());
        assert_eq!(statuses[0].when, ActivationWhen::Backpack);
        assert_eq!(
            statuses[0].mods,
            vec![ModifierInstance::Attribute {
                path: "evasion".to_string(),
                value: "1".to_string()
            }]
        );

        // Second pass finds nothing to rewrite.
        let report = migrate(&gm, &mut table, &registry()).unwrap();
        assert_eq!(report, MigrationReport::default());
    }

    #[test]
    fn untouched_documents_not_rewritten() {
        let mut table = Table::new();
        table.add_actor(Actor::new(ActorKind::Player, "Yara")).unwrap();
        let report = migrate(&Session::gamemaster(), &mut table, &registry()).unwrap();
        assert_eq!(report, MigrationReport::default());
    }
}
