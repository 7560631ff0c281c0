//! Button-triggered status application.
//!
//! A `Button` status never auto-activates on its owner; an explicit
//! action pushes a copy onto each targeted actor's applied list, stamped
//! with provenance so formulas evaluate against the caster and so
//! re-application replaces the previous copy instead of stacking.

use dh_core::{Actor, ActorId, CoreError, Session, Table};

use crate::error::StatusResult;
use crate::modifier::ModifierRegistry;
use crate::status::{
    ActivationWhen, StatusDefinition, StatusId, StatusSource, applied_statuses, flag,
    item_statuses, local_statuses, write_statuses,
};

/// Find a button status on an actor by name, searching local statuses
/// first and then every owned item. Case-insensitive.
pub fn find_button_status(
    actor: &Actor,
    name: &str,
    registry: &ModifierRegistry,
) -> Option<StatusDefinition> {
    let matches = |s: &StatusDefinition| {
        s.when == ActivationWhen::Button && s.name.eq_ignore_ascii_case(name.trim())
    };
    local_statuses(actor, registry)
        .into_iter()
        .find(|s| matches(s))
        .or_else(|| {
            actor
                .items
                .iter()
                .flat_map(|item| item_statuses(item, registry))
                .find(|s| matches(s))
        })
}

/// Apply a caster's button status to each target.
///
/// Aborts before any mutation when the status name does not resolve or
/// no targets were given. Targets are then processed independently: one
/// target's permission failure is reported in its slot without blocking
/// the rest.
pub fn apply_status(
    session: &Session,
    table: &mut Table,
    caster_id: ActorId,
    status_name: &str,
    targets: &[ActorId],
    registry: &ModifierRegistry,
) -> StatusResult<Vec<(ActorId, StatusResult<()>)>> {
    if targets.is_empty() {
        return Err(CoreError::NoTargets.into());
    }
    let caster = table.require_actor(caster_id)?;
    let caster_name = caster.name.clone();
    let template = find_button_status(caster, status_name, registry)
        .ok_or_else(|| CoreError::StatusNotFound(status_name.to_string()))?;

    let mut results = Vec::with_capacity(targets.len());
    for &target_id in targets {
        results.push((
            target_id,
            apply_one(
                session,
                table,
                &template,
                caster_id,
                &caster_name,
                target_id,
                registry,
            ),
        ));
    }
    Ok(results)
}

fn apply_one(
    session: &Session,
    table: &mut Table,
    template: &StatusDefinition,
    caster_id: ActorId,
    caster_name: &str,
    target_id: ActorId,
    registry: &ModifierRegistry,
) -> StatusResult<()> {
    if !session.can_write(target_id) {
        return Err(CoreError::PermissionDenied(format!(
            "apply \"{}\" to {target_id}",
            template.name
        ))
        .into());
    }
    let target = table.require_actor_mut(target_id)?;

    let mut instance = template.clone();
    instance.id = StatusId::new();
    // Applied copies are always-on; actor statuses cannot be equip-gated.
    instance.when = ActivationWhen::Backpack;
    instance.source = Some(StatusSource {
        name: template.name.clone(),
        caster: Some(caster_id),
        caster_name: caster_name.to_string(),
        status_id: template.id,
    });

    let mut applied = applied_statuses(target, registry);
    // Re-application from the same caster replaces the previous copy.
    applied.retain(|existing| {
        existing.source.as_ref().is_none_or(|s| {
            s.caster != Some(caster_id) || s.status_id != template.id
        })
    });
    applied.push(instance);
    write_statuses(&mut target.flags, flag::APPLIED_STATUSES, &applied);
    Ok(())
}

/// Remove one applied status from a target by its instance ID.
pub fn remove_applied(
    session: &Session,
    table: &mut Table,
    target_id: ActorId,
    status_id: StatusId,
    registry: &ModifierRegistry,
) -> StatusResult<()> {
    if !session.can_write(target_id) {
        return Err(
            CoreError::PermissionDenied(format!("remove a status from {target_id}")).into(),
        );
    }
    let target = table.require_actor_mut(target_id)?;
    let mut applied = applied_statuses(target, registry);
    let before = applied.len();
    applied.retain(|s| s.id != status_id);
    if applied.len() == before {
        return Err(CoreError::StatusNotFound(status_id.to_string()).into());
    }
    write_statuses(&mut target.flags, flag::APPLIED_STATUSES, &applied);
    Ok(())
}
