//! End-to-end scenarios across statuses, rolls, and damage: an armored
//! player takes a hit and negotiates armor, an adversary resists a
//! spell, a posted roll is edited after its resources were committed,
//! and a whole damage application is undone.

use dh_core::{
    Actor, ActorKind, Container, Item, ItemCategory, ScriptedRoller, Session, Table, fields::path,
};
use dh_mechanics::{
    DamageOverride, DamageState, DamageTarget, DamageType, MechError, Resistance, RollInput,
    RollOutcome, Severity, Thresholds, UndoStack, apply_damage, reconcile, resistance,
    roll_duality, severity,
};
use dh_status::{
    ActivationWhen, ModifierInstance, ModifierRegistry, ResilienceKind, StatusDefinition,
    SyncGuard, SyncOutcome, apply_status, status::flag, status::write_statuses, sync_actor,
    sync_item,
};

fn registry() -> ModifierRegistry {
    ModifierRegistry::with_builtins()
}

fn index() -> dh_status::LabelIndex {
    dh_status::LabelIndex::standard()
}

fn player() -> Actor {
    let mut actor = Actor::new(ActorKind::Player, "Yara");
    actor.fields.set(path::HP_VALUE, 0);
    actor.fields.set(path::HP_MAX, 6);
    actor.fields.set(path::STRESS_VALUE, 0);
    actor.fields.set(path::STRESS_MAX, 6);
    actor.fields.set(path::HOPE_VALUE, 2);
    actor.fields.set(path::HOPE_MAX, 6);
    actor
}

fn adversary(noticeable: i64, heavy: i64) -> Actor {
    let mut actor = Actor::new(ActorKind::Npc, "Bandit");
    actor.fields.set(path::HP_VALUE, 0);
    actor.fields.set(path::HP_MAX, 8);
    actor.fields.set(path::STRESS_VALUE, 0);
    actor.fields.set(path::STRESS_MAX, 4);
    actor.fields.set(path::THRESHOLD_NOTICEABLE, noticeable);
    actor.fields.set(path::THRESHOLD_HEAVY, heavy);
    actor
}

fn chainmail() -> Item {
    let mut item = Item::new(
        ItemCategory::Armor {
            score: 3,
            noticeable: 5,
            heavy: 10,
        },
        "Chainmail",
    );
    item.container = Container::Equipped;
    item
}

fn flat_damage(amount: i64, damage_type: DamageType, targets: Vec<DamageTarget>) -> DamageState {
    DamageState {
        formula: amount.to_string(),
        damage_type,
        dice: Vec::new(),
        extra: Vec::new(),
        modifier: amount,
        stress: 0,
        half_to_missed: false,
        targets,
    }
}

fn struck(actor: &Actor, resistance: Resistance) -> DamageTarget {
    DamageTarget {
        actor: actor.id,
        name: actor.name.clone(),
        missed: false,
        resistance,
        adjustment: DamageOverride::None,
        excluded: false,
    }
}

#[test]
fn equipping_armor_raises_the_sheet_and_unequipping_reverts_it() {
    let registry = registry();
    let index = index();
    let mut table = Table::new();
    let mut actor = player();
    let item = chainmail();
    let (actor_id, item_id) = (actor.id, item.id);
    actor.items.push(item);
    table.add_actor(actor).unwrap();

    let report = sync_item(&mut table, actor_id, item_id, &registry, &index).unwrap();
    assert_eq!(report.applied.get(path::ARMOR_MAX), Some(&3));
    let actor = table.actor(actor_id).unwrap();
    assert_eq!(actor.fields.get(path::THRESHOLD_NOTICEABLE), 5);
    assert_eq!(actor.fields.get(path::THRESHOLD_HEAVY), 10);

    // Syncing again without changes is a no-op.
    let report = sync_item(&mut table, actor_id, item_id, &registry, &index).unwrap();
    assert!(report.applied.is_empty());

    // Unequipping takes back exactly what was granted.
    let actor = table.actor_mut(actor_id).unwrap();
    actor.items[0].container = Container::Backpack;
    sync_item(&mut table, actor_id, item_id, &registry, &index).unwrap();
    let actor = table.actor(actor_id).unwrap();
    assert_eq!(actor.fields.get(path::ARMOR_MAX), 0);
    assert_eq!(actor.fields.get(path::THRESHOLD_NOTICEABLE), 0);
    assert_eq!(actor.fields.get(path::THRESHOLD_HEAVY), 0);
}

#[test]
fn adversary_wounds_follow_the_severity_ladder() {
    let gm = Session::gamemaster();
    let registry = registry();
    let mut table = Table::new();
    let bandit = adversary(5, 10);
    let bandit_id = bandit.id;
    let hit = struck(&bandit, resistance(&bandit, DamageType::Physical, &registry));
    table.add_actor(bandit).unwrap();

    // 20 physical with no resistance doubles the heavy threshold.
    assert_eq!(
        severity(
            20,
            Thresholds {
                noticeable: 5,
                heavy: 10
            }
        ),
        Severity::Critical
    );
    let state = flat_damage(20, DamageType::Physical, vec![hit]);
    let application = apply_damage(&gm, &mut table, &state).unwrap();
    assert!(application.pending.is_empty());
    assert_eq!(table.actor(bandit_id).unwrap().fields.get(path::HP_VALUE), 4);
}

#[test]
fn physical_resistance_halves_before_bucketing() {
    let gm = Session::gamemaster();
    let registry = registry();
    let mut table = Table::new();
    let mut bandit = adversary(5, 10);
    let mut stoneskin = StatusDefinition::new("Stoneskin", ActivationWhen::Backpack);
    stoneskin.mods.push(ModifierInstance::Resilience {
        value: ResilienceKind::ResistPhy,
    });
    write_statuses(&mut bandit.flags, flag::ACTOR_STATUSES, &[stoneskin]);

    let standing = resistance(&bandit, DamageType::Physical, &registry);
    assert_eq!(standing, Resistance::Resist);
    let hit = struck(&bandit, standing);
    let bandit_id = bandit.id;
    table.add_actor(bandit).unwrap();

    // 20 halves to 10: Heavy, three wounds instead of four.
    let state = flat_damage(20, DamageType::Physical, vec![hit]);
    apply_damage(&gm, &mut table, &state).unwrap();
    assert_eq!(table.actor(bandit_id).unwrap().fields.get(path::HP_VALUE), 3);
}

#[test]
fn direct_damage_ignores_resistance_and_refuses_armor() {
    let registry = registry();
    let bandit = {
        let mut b = adversary(5, 10);
        let mut ward = StatusDefinition::new("Ward", ActivationWhen::Backpack);
        ward.mods.push(ModifierInstance::Resilience {
            value: ResilienceKind::ImmunePhy,
        });
        write_statuses(&mut b.flags, flag::ACTOR_STATUSES, &[ward]);
        b
    };
    assert_eq!(
        resistance(&bandit, DamageType::Direct, &registry),
        Resistance::Normal
    );

    let yara = player();
    let state = flat_damage(
        12,
        DamageType::Direct,
        vec![struck(&yara, Resistance::Normal)],
    );
    let gm = Session::gamemaster();
    let mut table = Table::new();
    table.add_actor(yara).unwrap();
    let mut application = apply_damage(&gm, &mut table, &state).unwrap();
    let negotiation = &mut application.pending[0];
    assert!(matches!(
        negotiation.spend_armor(),
        Err(MechError::ArmorAgainstDirect)
    ));
}

#[test]
fn player_hit_negotiates_armor_then_commits_and_undoes_exactly() {
    let gm = Session::gamemaster();
    let registry = registry();
    let index = index();
    let mut table = Table::new();
    let mut yara = player();
    let armor = chainmail();
    let (yara_id, armor_id) = (yara.id, armor.id);
    yara.items.push(armor);
    table.add_actor(yara).unwrap();
    sync_item(&mut table, yara_id, armor_id, &registry, &index).unwrap();

    let yara = table.actor(yara_id).unwrap();
    let state = flat_damage(
        12,
        DamageType::Physical,
        vec![struck(yara, Resistance::Normal)],
    );
    let mut application = apply_damage(&gm, &mut table, &state).unwrap();
    assert!(application.batch.is_empty());
    let negotiation = &mut application.pending[0];
    assert_eq!(negotiation.armor_available, 3);
    assert_eq!(negotiation.wounds(), 3);

    // One armor slot demotes Heavy to Noticeable.
    negotiation.spend_armor().unwrap();
    assert_eq!(negotiation.wounds(), 2);
    let mut batch = application.batch;
    negotiation.commit(&gm, &mut table, &mut batch).unwrap();

    let yara = table.actor(yara_id).unwrap();
    assert_eq!(yara.fields.get(path::HP_VALUE), 2);
    assert_eq!(yara.fields.get(path::ARMOR_VALUE), 1);

    let mut stack = UndoStack::new();
    stack.push(batch);
    stack.undo(&gm, &mut table).unwrap();
    let yara = table.actor(yara_id).unwrap();
    assert_eq!(yara.fields.get(path::HP_VALUE), 0);
    assert_eq!(yara.fields.get(path::ARMOR_VALUE), 0);
    assert!(matches!(
        stack.undo(&gm, &mut table),
        Err(MechError::NothingToUndo)
    ));
}

#[test]
fn editing_a_posted_roll_reconciles_its_resources() {
    let gm = Session::gamemaster();
    let mut table = Table::new();
    let yara = player();
    let yara_id = yara.id;

    let mut roller = ScriptedRoller::new([9, 4]);
    let mut state = roll_duality(&yara, RollInput::default(), &mut roller);
    table.add_actor(yara).unwrap();
    assert_eq!(state.outcome(), Some(RollOutcome::Hope));

    reconcile(&gm, &mut table, &mut state).unwrap();
    assert_eq!(table.actor(yara_id).unwrap().fields.get(path::HOPE_VALUE), 3);
    assert_eq!(table.fear.current, 0);

    // The gamemaster rerolls the Hope die low; Hope is taken back and
    // Fear goes up, as if the first outcome never happened.
    let mut roller = ScriptedRoller::new([1]);
    state
        .reroll(dh_mechanics::DieSlot::Hope, &mut roller)
        .unwrap();
    reconcile(&gm, &mut table, &mut state).unwrap();
    assert_eq!(table.actor(yara_id).unwrap().fields.get(path::HOPE_VALUE), 2);
    assert_eq!(table.fear.current, 1);
}

#[test]
fn applied_status_with_instant_marks_fires_once_and_is_consumed() {
    let gm = Session::gamemaster();
    let registry = registry();
    let index = index();
    let guard = SyncGuard::new();
    let mut table = Table::new();

    let mut caster = player();
    caster.name = "Mira".into();
    let mut smite = StatusDefinition::new("Smite", ActivationWhen::Button);
    smite.mods.push(ModifierInstance::Marks {
        target: dh_status::MarkTarget::Stress,
        value: "2".into(),
    });
    write_statuses(&mut caster.flags, flag::ACTOR_STATUSES, &[smite]);
    let caster_id = caster.id;

    let target = player();
    let target_id = target.id;
    table.add_actor(caster).unwrap();
    table.add_actor(target).unwrap();

    let results = apply_status(&gm, &mut table, caster_id, "smite", &[target_id], &registry).unwrap();
    assert!(results[0].1.is_ok());

    let mut roller = ScriptedRoller::new([]);
    let outcome = sync_actor(&mut table, target_id, &registry, &index, &mut roller, &guard).unwrap();
    let SyncOutcome::Synced(report) = outcome else {
        panic!("sync was dropped");
    };
    assert_eq!(report.consumed, 1);
    let target = table.actor(target_id).unwrap();
    assert_eq!(target.fields.get(path::STRESS_VALUE), 2);

    // A second sync finds the status gone and changes nothing.
    let mut roller = ScriptedRoller::new([]);
    let SyncOutcome::Synced(report) =
        sync_actor(&mut table, target_id, &registry, &index, &mut roller, &guard).unwrap()
    else {
        panic!("sync was dropped");
    };
    assert_eq!(report.consumed, 0);
    assert!(report.applied.is_empty());
}

#[test]
fn actors_deleted_between_commit_and_undo_are_skipped() {
    let gm = Session::gamemaster();
    let mut table = Table::new();
    let bandit = adversary(5, 10);
    let mut survivor = adversary(5, 10);
    survivor.name = "Second Bandit".into();
    let (bandit_id, survivor_id) = (bandit.id, survivor.id);
    let hits = vec![
        struck(&bandit, Resistance::Normal),
        struck(&survivor, Resistance::Normal),
    ];
    table.add_actor(bandit).unwrap();
    table.add_actor(survivor).unwrap();

    let state = flat_damage(7, DamageType::Physical, hits);
    let application = apply_damage(&gm, &mut table, &state).unwrap();
    let mut stack = UndoStack::new();
    stack.push(application.batch);

    table.remove_actor(bandit_id).unwrap();
    stack.undo(&gm, &mut table).unwrap();
    assert_eq!(
        table.actor(survivor_id).unwrap().fields.get(path::HP_VALUE),
        0
    );
    assert!(table.actor(bandit_id).is_none());
}
