//! Snapshot reconciliation.
//!
//! Each source (item or actor) persists an applied snapshot: the
//! desired map it last contributed. A sync pass recomputes the desired
//! map, diffs it against the snapshot, and applies only the increment;
//! the actor's live fields stay the source of truth and the snapshot is
//! never read as a total.
//!
//! Actor syncs run under a reentrancy guard (a second request for the
//! same actor while one is in flight is dropped, not queued) and
//! triggers are debounced so a burst of source mutations collapses into
//! one recomputation. The guard doubles as the self-write tag: a change
//! hook that observes field writes checks [`SyncGuard::is_syncing`] and
//! skips re-triggering on the sync's own writes.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use dh_core::{ActorId, CoreError, DiceRoller, ItemId, Table};

use crate::error::StatusResult;
use crate::modifier::{DesiredMap, ModifierRegistry};
use crate::scope::LabelIndex;
use crate::status::{flag, read_statuses, write_statuses, StatusContext, StatusId};
use crate::accumulate::{actor_plan, item_desired_map};

/// Flag key for an applied snapshot, on items and actors alike.
pub const SNAPSHOT_FLAG: &str = "applied_snapshot";

/// Default debounce window in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 50;

/// Per-path increment between a desired map and the snapshot it
/// replaces. Zero deltas are omitted.
pub fn diff(desired: &DesiredMap, before: &DesiredMap) -> DesiredMap {
    let paths: BTreeSet<&String> = desired.keys().chain(before.keys()).collect();
    let mut out = DesiredMap::new();
    for path in paths {
        let delta = desired.get(path).copied().unwrap_or(0)
            - before.get(path).copied().unwrap_or(0);
        if delta != 0 {
            out.insert(path.clone(), delta);
        }
    }
    out
}

/// Read a snapshot from a flag bag (empty when absent or malformed).
pub fn load_snapshot(bag: &dh_core::FlagBag) -> DesiredMap {
    bag.get(SNAPSHOT_FLAG)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Persist a snapshot into a flag bag.
pub fn store_snapshot(bag: &mut dh_core::FlagBag, snapshot: &DesiredMap) {
    bag.set(
        SNAPSHOT_FLAG,
        serde_json::to_value(snapshot).unwrap_or_default(),
    );
}

/// What one sync pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Increment actually applied to live fields, per path.
    pub applied: DesiredMap,
    /// Number of statuses consumed by the instant pass.
    pub consumed: usize,
}

/// Result of requesting an actor sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The pass ran.
    Synced(SyncReport),
    /// Another sync for the same actor was in flight; this request was
    /// dropped by design.
    Dropped,
}

/// Reentrancy guard over actor syncs.
///
/// Single-threaded interior mutability: the engine runs on a
/// cooperative event loop, so a `RefCell`-backed set is the whole lock.
#[derive(Debug, Default)]
pub struct SyncGuard {
    active: RefCell<HashSet<ActorId>>,
}

impl SyncGuard {
    /// Create an idle guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a sync for an actor. Returns `None` when one is already in
    /// flight; the permit releases the actor on drop.
    pub fn try_begin(&self, actor: ActorId) -> Option<SyncPermit<'_>> {
        if self.active.borrow_mut().insert(actor) {
            Some(SyncPermit { guard: self, actor })
        } else {
            None
        }
    }

    /// Returns true while a sync pass holds this actor. Change hooks use
    /// this to ignore the sync's own writes.
    pub fn is_syncing(&self, actor: ActorId) -> bool {
        self.active.borrow().contains(&actor)
    }
}

/// Held for the duration of one actor sync pass.
#[derive(Debug)]
pub struct SyncPermit<'a> {
    guard: &'a SyncGuard,
    actor: ActorId,
}

impl Drop for SyncPermit<'_> {
    fn drop(&mut self) {
        self.guard.active.borrow_mut().remove(&self.actor);
    }
}

/// Keyed trailing-edge debounce with an explicit clock.
///
/// `trigger` records the latest request time per key; `due` drains the
/// keys whose window has elapsed since their last trigger. Several
/// triggers inside one window collapse into a single due key.
#[derive(Debug)]
pub struct Debouncer<K> {
    window_ms: u64,
    pending: HashMap<K, u64>,
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    /// Create a debouncer with the given window.
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            pending: HashMap::new(),
        }
    }

    /// Record a trigger for a key at the given time.
    pub fn trigger(&mut self, key: K, now_ms: u64) {
        self.pending.insert(key, now_ms);
    }

    /// Drain the keys whose window elapsed.
    pub fn due(&mut self, now_ms: u64) -> Vec<K> {
        let ready: Vec<K> = self
            .pending
            .iter()
            .filter(|&(_, &at)| now_ms.saturating_sub(at) >= self.window_ms)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &ready {
            self.pending.remove(key);
        }
        ready
    }

    /// Number of keys waiting for their window.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl<K: Eq + Hash + Clone> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

/// Sync one item against its owner: recompute the item's desired map,
/// diff it against the item's snapshot, apply the increment to the
/// owner's live fields, and persist the new snapshot on the item.
///
/// No lock is needed: item sync never recurses into another sync.
pub fn sync_item(
    table: &mut Table,
    actor_id: ActorId,
    item_id: ItemId,
    registry: &ModifierRegistry,
    index: &LabelIndex,
) -> StatusResult<SyncReport> {
    let actor = table.require_actor(actor_id)?;
    let item = actor.item(item_id).ok_or(CoreError::ItemNotFound(item_id))?;
    let desired = item_desired_map(item, actor, registry, index);
    let before = load_snapshot(&item.flags);
    let delta = diff(&desired, &before);

    let actor = table.require_actor_mut(actor_id)?;
    for (path, d) in &delta {
        actor.fields.add(path, *d);
    }
    if let Some(item) = actor.item_mut(item_id) {
        store_snapshot(&mut item.flags, &desired);
    }

    Ok(SyncReport {
        applied: delta,
        consumed: 0,
    })
}

/// Sync an actor's own status sources: persistent diff plus instant
/// one-shots in a single combined increment, then consume every status
/// the instant pass marked.
///
/// The persistent-only desired map becomes the new snapshot; instant
/// deltas are never snapshotted, they fire exactly once.
pub fn sync_actor(
    table: &mut Table,
    actor_id: ActorId,
    registry: &ModifierRegistry,
    index: &LabelIndex,
    roller: &mut dyn DiceRoller,
    guard: &SyncGuard,
) -> StatusResult<SyncOutcome> {
    let Some(_permit) = guard.try_begin(actor_id) else {
        return Ok(SyncOutcome::Dropped);
    };

    let plan = actor_plan(table, actor_id, registry, index, roller)?;
    let actor = table.require_actor_mut(actor_id)?;
    let before = load_snapshot(&actor.flags);

    let mut combined = diff(&plan.desired, &before);
    for (path, delta) in &plan.instant {
        let entry = combined.entry(path.clone()).or_insert(0);
        *entry += delta;
        if *entry == 0 {
            combined.remove(path);
        }
    }

    for (path, delta) in &combined {
        actor.fields.add(path, *delta);
    }
    store_snapshot(&mut actor.flags, &plan.desired);

    let consumed = plan.consume_local.len() + plan.consume_applied.len();
    remove_statuses(actor, flag::ACTOR_STATUSES, &plan.consume_local, registry);
    remove_statuses(actor, flag::APPLIED_STATUSES, &plan.consume_applied, registry);

    Ok(SyncOutcome::Synced(SyncReport {
        applied: combined,
        consumed,
    }))
}

fn remove_statuses(
    actor: &mut dh_core::Actor,
    key: &str,
    ids: &[StatusId],
    registry: &ModifierRegistry,
) {
    if ids.is_empty() {
        return;
    }
    let mut statuses = read_statuses(&actor.flags, key, StatusContext::Actor, registry);
    statuses.retain(|s| !ids.contains(&s.id));
    write_statuses(&mut actor.flags, key, &statuses);
}
