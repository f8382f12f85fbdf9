//! Integration tests for the action queue: submission, accrual, merge and
//! commit through the in-memory world.
//!
//! All tests are pure logic with no SpacetimeDB and no clock: time is passed in.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use skillforge_logic::accrual::EntryStatus;
use skillforge_logic::catalog::{
    Action, ActionChoice, CombatStats, EquipPosition, GuaranteedReward, InMemoryCatalog, Item,
    ItemAmount, Travel, XpThresholdReward,
};
use skillforge_logic::config::EngineConfig;
use skillforge_logic::error::{EngineError, InvalidInputKind, XpGate};
use skillforge_logic::ledger::{InMemoryLedger, ResourceLedger};
use skillforge_logic::queue::{CombatStyle, MergeMode, QueuedActionInput};
use skillforge_logic::skills::{Skill, StartSkills};
use skillforge_logic::world::World;
use skillforge_logic::PlayerId;

// ── Fixture ────────────────────────────────────────────────────────────

const OWNER: u64 = 100;
const THIEF: u64 = 200;
const ADMIN: u64 = 1;

const CHOP: u16 = 1;
const FIRE: u16 = 2;
const COMBAT: u16 = 3;
const THIEVE: u16 = 4;
const TRAIN_AGILITY: u16 = 5;
const TRAVEL: u16 = 6;
const FOREST_THIEVE: u16 = 8;

const BURN_LOG: u16 = 1;
const MELEE: u16 = 2;
const TO_FOREST: u16 = 3;

const SWORD: u16 = 1;
const HELMET: u16 = 10;
const AXE: u16 = 256;
const FIRE_STARTER: u16 = 320;
const LOG: u16 = 600;
const SHRIMP: u16 = 900;
const TOKEN: u16 = 1000;
const BOOST: u16 = 1001;

/// One trip at 0.125 trips per hour.
const TRIP: u32 = 28_800;

fn action(id: u16, skill: Skill, xp_per_hour: u32) -> Action {
    Action {
        id,
        skill,
        xp_per_hour,
        min_xp: 0,
        action_choice_required: false,
        success_percent: 100,
        hand_item_range: None,
        guaranteed_rewards: vec![],
        num_spawned: 0,
        food_rate: 0,
        is_available: true,
        world_location: 0,
    }
}

fn item(id: u16, equip_position: EquipPosition, skill: Option<Skill>, min_xp: u32) -> Item {
    Item {
        id,
        equip_position,
        skill,
        min_xp,
        combat_stats: CombatStats::default(),
        health_restored: 0,
    }
}

fn catalog() -> InMemoryCatalog {
    let mut c = InMemoryCatalog::new();

    // 100 logs per hour.
    c.add_action(Action {
        hand_item_range: Some((256, 319)),
        guaranteed_rewards: vec![GuaranteedReward { item: LOG, rate: 1000 }],
        ..action(CHOP, Skill::Woodcutting, 3600)
    })
    .unwrap();
    c.add_action(Action {
        action_choice_required: true,
        hand_item_range: Some((320, 383)),
        ..action(FIRE, Skill::Firemaking, 0)
    })
    .unwrap();
    // 10 food per hour.
    c.add_action(Action {
        action_choice_required: true,
        hand_item_range: Some((1, 255)),
        food_rate: 10_000,
        ..action(COMBAT, Skill::Combat, 3600)
    })
    .unwrap();
    c.add_action(action(THIEVE, Skill::Thieving, 3600)).unwrap();
    c.add_action(action(TRAIN_AGILITY, Skill::Agility, 4_000_000_000))
        .unwrap();
    c.add_action(Action {
        action_choice_required: true,
        ..action(TRAVEL, Skill::Agility, 0)
    })
    .unwrap();
    c.add_action(Action {
        world_location: 1,
        ..action(FOREST_THIEVE, Skill::Thieving, 3600)
    })
    .unwrap();

    // 100 logs burnt per hour.
    c.add_action_choice(ActionChoice {
        id: BURN_LOG,
        skill: Skill::Firemaking,
        xp_per_hour: 3600,
        min_xp: 0,
        rate: 100_000,
        inputs: vec![ItemAmount { item: LOG, amount: 1 }],
        output: None,
        travel: None,
    })
    .unwrap();
    c.add_action_choice(ActionChoice {
        id: MELEE,
        skill: Skill::Melee,
        xp_per_hour: 0,
        min_xp: 0,
        rate: 0,
        inputs: vec![],
        output: None,
        travel: None,
    })
    .unwrap();
    c.add_action_choice(ActionChoice {
        id: TO_FOREST,
        skill: Skill::Agility,
        xp_per_hour: 3600,
        min_xp: 0,
        rate: 125,
        inputs: vec![],
        output: None,
        travel: Some(Travel { from: 0, to: 1 }),
    })
    .unwrap();

    c.add_item(item(SWORD, EquipPosition::Hand, Some(Skill::Melee), 0))
        .unwrap();
    c.add_item(item(HELMET, EquipPosition::Head, Some(Skill::Defence), 0))
        .unwrap();
    c.add_item(item(AXE, EquipPosition::Hand, Some(Skill::Woodcutting), 0))
        .unwrap();
    c.add_item(item(FIRE_STARTER, EquipPosition::Hand, Some(Skill::Firemaking), 0))
        .unwrap();
    c.add_item(item(LOG, EquipPosition::Aux, None, 0)).unwrap();
    c.add_item(item(SHRIMP, EquipPosition::Food, Some(Skill::Health), 0))
        .unwrap();
    c
}

struct Harness {
    world: World,
    catalog: InMemoryCatalog,
    ledger: InMemoryLedger,
    player: PlayerId,
}

impl Harness {
    fn new(start: StartSkills) -> Self {
        let mut world = World::new(EngineConfig::default(), ADMIN);
        let player = world.create_player(OWNER, start, true, 0);
        let mut ledger = InMemoryLedger::new();
        for tool in [SWORD, HELMET, AXE, FIRE_STARTER] {
            ledger.mint(OWNER, tool, 1);
        }
        Self {
            world,
            catalog: catalog(),
            ledger,
            player,
        }
    }

    /// A player whose start skill never matches anything trained here.
    fn plain() -> Self {
        Self::new(StartSkills::single(Skill::Fishing))
    }

    fn start(
        &mut self,
        actions: &[QueuedActionInput],
        mode: MergeMode,
        now: u64,
    ) -> Result<skillforge_logic::AccrualResult, EngineError> {
        self.world.start_actions(
            OWNER,
            self.player,
            actions,
            mode,
            now,
            &self.catalog,
            &mut self.ledger,
        )
    }

    fn process(&mut self, now: u64) -> skillforge_logic::AccrualResult {
        self.world
            .process_actions(OWNER, self.player, now, &self.catalog, &mut self.ledger)
            .unwrap()
    }

    fn xp(&self, skill: Skill) -> u32 {
        self.world.xp(self.player, skill).unwrap()
    }

    fn balance(&self, item: u16) -> u64 {
        self.ledger.balance_of(OWNER, item)
    }
}

fn chop(timespan: u32) -> QueuedActionInput {
    QueuedActionInput::new(CHOP, timespan).with_right_hand(AXE)
}

fn burn(timespan: u32) -> QueuedActionInput {
    QueuedActionInput::new(FIRE, timespan)
        .with_choice(BURN_LOG)
        .with_right_hand(FIRE_STARTER)
}

fn thieve(timespan: u32) -> QueuedActionInput {
    QueuedActionInput::new(THIEVE, timespan)
}

fn travel(timespan: u32) -> QueuedActionInput {
    QueuedActionInput::new(TRAVEL, timespan).with_choice(TO_FOREST)
}

fn fight(timespan: u32) -> QueuedActionInput {
    QueuedActionInput::new(COMBAT, timespan)
        .with_choice(MELEE)
        .with_right_hand(SWORD)
        .with_food(SHRIMP)
}

// ── Accrual arithmetic ─────────────────────────────────────────────────

#[test]
fn xp_is_credited_for_completed_units_only() {
    let mut h = Harness::plain();
    h.start(&[chop(3600)], MergeMode::Replace, 0).unwrap();

    let result = h.process(361);
    assert_eq!(h.xp(Skill::Woodcutting), 360);
    assert_eq!(h.balance(LOG), 10);
    assert_eq!(result.entries[0].status, EntryStatus::PartiallyConsumed);
    assert_eq!(result.entries[0].time_consumed, 361);
}

#[test]
fn plain_xp_floors_once() {
    let mut h = Harness::plain();
    h.start(&[thieve(3600)], MergeMode::Replace, 0).unwrap();
    h.process(361);
    assert_eq!(h.xp(Skill::Thieving), 361);
}

#[test]
fn split_accrual_matches_single_run() {
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _ in 0..20 {
        let mut split = Harness::plain();
        let mut whole = Harness::plain();
        let queue = [chop(5000), burn(2000), thieve(1234)];
        split.start(&queue, MergeMode::Replace, 0).unwrap();
        whole.start(&queue, MergeMode::Replace, 0).unwrap();

        let end: u64 = 5000 + 2000 + 1234 + 100;
        let mut now = 0;
        while now < end {
            now = (now + rng.gen_range(1..=700)).min(end);
            split.process(now);
        }
        whole.process(end);

        for skill in [Skill::Woodcutting, Skill::Firemaking, Skill::Thieving] {
            assert_eq!(split.xp(skill), whole.xp(skill), "{skill:?}");
        }
        assert_eq!(split.balance(LOG), whole.balance(LOG));
        assert_eq!(
            split.world.player(split.player).unwrap().total_xp,
            whole.world.player(whole.player).unwrap().total_xp
        );
    }
}

#[test]
fn unused_time_is_not_carried_forward() {
    let mut h = Harness::plain();
    h.start(&[thieve(600)], MergeMode::Replace, 0).unwrap();
    let result = h.process(1000);
    assert_eq!(h.xp(Skill::Thieving), 600);
    assert_eq!(result.unused_time, 400);
    assert!(result.remaining_queue.is_empty());

    h.start(&[thieve(600)], MergeMode::Append, 1000).unwrap();
    h.process(1100);
    assert_eq!(h.xp(Skill::Thieving), 700);
}

#[test]
fn affinity_bonus_single_and_dual() {
    let mut single = Harness::new(StartSkills::single(Skill::Thieving));
    single.start(&[thieve(3600)], MergeMode::Replace, 0).unwrap();
    assert_eq!(single.process(3600).xp_for(Skill::Thieving), 3960);

    let mut dual = Harness::new(StartSkills::new(Skill::Fishing, Some(Skill::Thieving)));
    dual.start(&[thieve(3600)], MergeMode::Replace, 0).unwrap();
    assert_eq!(dual.process(3600).xp_for(Skill::Thieving), 3780);
    assert_eq!(dual.xp(Skill::Thieving), 187 + 3780);
}

#[test]
fn xp_saturates_at_u32_max() {
    let mut h = Harness::plain();
    for day in 0..3u64 {
        let start = day * 86_400;
        h.start(
            &[QueuedActionInput::new(TRAIN_AGILITY, 86_400)],
            MergeMode::Replace,
            start,
        )
        .unwrap();
        h.process(start + 86_400);
        assert_eq!(h.xp(Skill::Agility), u32::MAX);
    }
    let total = h.world.player(h.player).unwrap().total_xp;
    assert_eq!(total, 374 + u32::MAX as u64);
}

// ── Chained entries and resources ──────────────────────────────────────

#[test]
fn later_entry_burns_logs_from_earlier_entry() {
    let mut h = Harness::plain();
    h.start(&[chop(3600), burn(3600)], MergeMode::Replace, 0)
        .unwrap();

    let predicted = h
        .world
        .preview(h.player, 5400, &h.catalog, &h.ledger)
        .unwrap();
    let committed = h.process(5400);
    assert_eq!(predicted, committed);

    assert_eq!(h.xp(Skill::Woodcutting), 3600);
    assert_eq!(h.xp(Skill::Firemaking), 1800);
    assert_eq!(h.balance(LOG), 50);
    assert_eq!(committed.entries[0].status, EntryStatus::Completed);
    assert_eq!(committed.entries[1].status, EntryStatus::PartiallyConsumed);

    let head = &h.world.player(h.player).unwrap().progress;
    assert_eq!(head.start_time, 3600);
    assert_eq!(head.base_inputs_consumed, 50);
    assert_eq!(head.xp_for(Skill::Firemaking), 1800);
}

#[test]
fn input_shortage_credits_affordable_units_then_aborts() {
    let mut h = Harness::plain();
    h.ledger.mint(OWNER, LOG, 10);
    h.start(&[burn(3600), thieve(600)], MergeMode::Replace, 0)
        .unwrap();

    let result = h.process(3600);
    assert_eq!(h.xp(Skill::Firemaking), 360);
    assert_eq!(h.xp(Skill::Thieving), 0);
    assert_eq!(h.balance(LOG), 0);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].status, EntryStatus::AbortedForResources);
    assert_eq!(result.dropped, vec![1, 2]);
    assert!(h.world.player(h.player).unwrap().queue.is_empty());
}

#[test]
fn starvation_mid_chain_keeps_earlier_output_and_drops_the_tail() {
    let mut h = Harness::plain();
    h.start(&[chop(360), burn(3600), thieve(600)], MergeMode::Replace, 0)
        .unwrap();

    let predicted = h
        .world
        .preview(h.player, 4560, &h.catalog, &h.ledger)
        .unwrap();
    let committed = h.process(4560);
    assert_eq!(predicted, committed);

    // Ten logs chopped, all ten burnt, then the fire starves.
    assert_eq!(h.xp(Skill::Woodcutting), 360);
    assert_eq!(h.xp(Skill::Firemaking), 360);
    assert_eq!(h.xp(Skill::Thieving), 0);
    assert_eq!(h.balance(LOG), 0);
    assert_eq!(committed.entries.len(), 2);
    assert_eq!(committed.entries[0].status, EntryStatus::Completed);
    assert_eq!(committed.entries[1].status, EntryStatus::AbortedForResources);
    assert_eq!(committed.entries[1].consumed, vec![ItemAmount { item: LOG, amount: 10 }]);
    assert_eq!(committed.dropped, vec![2, 3]);
    assert!(committed.remaining_queue.is_empty());

    let player = h.world.player(h.player).unwrap();
    assert!(player.queue.is_empty());
    assert_eq!(player.progress, Default::default());
    assert_eq!(player.last_processed_time, 4560);
}

#[test]
fn removing_equipment_aborts_but_keeps_committed_credit() {
    let mut h = Harness::plain();
    h.start(&[chop(3600), thieve(600)], MergeMode::Replace, 0)
        .unwrap();
    h.process(1800);
    assert_eq!(h.xp(Skill::Woodcutting), 1800);
    assert_eq!(h.balance(LOG), 50);

    h.ledger.transfer(OWNER, THIEF, AXE, 1).unwrap();
    let result = h.process(3000);

    assert_eq!(h.xp(Skill::Woodcutting), 1800);
    assert_eq!(h.balance(LOG), 50);
    assert!(result.item_deltas.is_empty());
    assert_eq!(result.entries[0].status, EntryStatus::AbortedForResources);
    assert_eq!(result.entries[0].time_consumed, 0);
    assert_eq!(
        result.entries[0].previously_credited,
        vec![(Skill::Woodcutting, 1800)]
    );
    assert_eq!(result.dropped, vec![1, 2]);
    let player = h.world.player(h.player).unwrap();
    assert!(player.queue.is_empty());
    assert_eq!(player.progress.start_time, 0);
}

#[test]
fn combat_trains_style_and_health_and_eats() {
    let mut h = Harness::plain();
    h.ledger.mint(OWNER, SHRIMP, 100);
    h.start(&[fight(3600)], MergeMode::Replace, 0).unwrap();
    let result = h.process(3600);

    assert_eq!(h.xp(Skill::Melee), 3600);
    assert_eq!(h.xp(Skill::Health), 1200);
    assert_eq!(h.balance(SHRIMP), 90);
    assert_eq!(result.entries[0].food_consumed, 10);

    let defensive = fight(3600).with_combat_style(CombatStyle::Defence);
    h.start(&[defensive], MergeMode::Replace, 3600).unwrap();
    h.process(7200);
    assert_eq!(h.xp(Skill::Defence), 3600);
    assert_eq!(h.xp(Skill::Melee), 3600);
    assert_eq!(h.xp(Skill::Health), 2400);
}

#[test]
fn running_out_of_food_is_starvation() {
    let mut h = Harness::plain();
    h.ledger.mint(OWNER, SHRIMP, 5);
    h.start(&[fight(3600)], MergeMode::Replace, 0).unwrap();
    let result = h.process(3600);

    assert_eq!(h.xp(Skill::Melee), 2159);
    assert_eq!(h.xp(Skill::Health), 719);
    assert_eq!(h.balance(SHRIMP), 0);
    assert_eq!(result.entries[0].status, EntryStatus::AbortedForResources);
}

// ── Areas and travel ───────────────────────────────────────────────────

#[test]
fn travel_needs_a_whole_trip() {
    let mut h = Harness::plain();
    assert!(matches!(
        h.start(&[travel(1800)], MergeMode::Replace, 0),
        Err(EngineError::InvalidInput(InvalidInputKind::InvalidTravellingTimespan {
            expected: 28_800,
            actual: 1800,
        }))
    ));
    assert!(h.world.player(h.player).unwrap().queue.is_empty());
}

#[test]
fn travel_moves_the_player_and_gates_area_actions() {
    let mut h = Harness::plain();
    h.start(&[travel(TRIP)], MergeMode::Replace, 0).unwrap();

    let halfway = h.process(TRIP as u64 / 2);
    assert_eq!(halfway.location, 0);
    let predicted = h
        .world
        .preview(h.player, TRIP as u64, &h.catalog, &h.ledger)
        .unwrap();
    assert_eq!(predicted.location, 1);
    h.process(TRIP as u64);
    assert_eq!(h.world.player(h.player).unwrap().location, 1);
    assert_eq!(h.xp(Skill::Agility), TRIP);

    // The route starts in area 0, so from area 1 it idles.
    let now = TRIP as u64;
    h.start(&[travel(TRIP)], MergeMode::Replace, now).unwrap();
    let idle = h.process(now + TRIP as u64);
    assert_eq!(idle.entries[0].status, EntryStatus::Completed);
    assert!(idle.entries[0].xp.is_empty());
    assert_eq!(h.xp(Skill::Agility), TRIP);
    assert_eq!(h.world.player(h.player).unwrap().location, 1);

    // Chopping belongs to area 0.
    let now = now + TRIP as u64;
    h.start(&[chop(3600)], MergeMode::Replace, now).unwrap();
    let away = h.process(now + 3600);
    assert_eq!(away.entries[0].time_consumed, 3600);
    assert!(away.item_deltas.is_empty());
    assert_eq!(h.xp(Skill::Woodcutting), 0);
    assert_eq!(h.balance(LOG), 0);
}

#[test]
fn entries_behind_a_trip_run_in_the_new_area() {
    let mut h = Harness::plain();
    let forest = QueuedActionInput::new(FOREST_THIEVE, 600);
    h.start(&[forest.clone(), travel(TRIP), forest], MergeMode::Replace, 0)
        .unwrap();
    let result = h.process(600 + TRIP as u64 + 600);

    // Only the second visit happens in the forest.
    assert_eq!(result.xp_for(Skill::Thieving), 600);
    assert_eq!(h.xp(Skill::Thieving), 600);
    assert_eq!(h.xp(Skill::Agility), TRIP);
    assert_eq!(result.location, 1);
}

// ── Threshold rewards ──────────────────────────────────────────────────

#[test]
fn crossing_xp_thresholds_grants_rewards_once() {
    let mut h = Harness::plain();
    for (threshold, item, amount) in [(500, TOKEN, 1), (1000, BOOST, 2)] {
        h.catalog
            .add_xp_threshold_reward(XpThresholdReward {
                threshold,
                rewards: vec![ItemAmount { item, amount }],
            })
            .unwrap();
    }
    h.start(&[thieve(3600)], MergeMode::Replace, 0).unwrap();

    // 374 start XP plus 126 lands exactly on 500.
    let first = h.process(126);
    assert_eq!(first.threshold_rewards, vec![ItemAmount { item: TOKEN, amount: 1 }]);
    assert_eq!(h.balance(TOKEN), 1);

    let predicted = h
        .world
        .preview(h.player, 1000, &h.catalog, &h.ledger)
        .unwrap();
    let committed = h.process(1000);
    assert_eq!(predicted, committed);
    assert_eq!(committed.item_delta(BOOST), 2);
    assert_eq!(h.world.player(h.player).unwrap().total_xp, 1374);

    let rest = h.process(3600);
    assert!(rest.threshold_rewards.is_empty());
    assert_eq!(h.balance(TOKEN), 1);
    assert_eq!(h.balance(BOOST), 2);
}

// ── Merge modes through the commit path ────────────────────────────────

#[test]
fn replace_after_partial_progress_discards_everything() {
    let mut h = Harness::plain();
    h.start(&[thieve(3600), thieve(3600)], MergeMode::Replace, 0)
        .unwrap();

    let live = h
        .world
        .get_queue(h.player, 1800, &h.catalog, &h.ledger)
        .unwrap();
    assert_eq!(live.len(), 2);
    assert_eq!(live[0].remaining(), 1800);
    assert_eq!(live[1].remaining(), 3600);

    h.start(&[], MergeMode::Replace, 1800).unwrap();
    let player = h.world.player(h.player).unwrap();
    assert!(player.queue.is_empty());
    assert_eq!(player.xp(Skill::Thieving), 1800);

    h.start(&[thieve(60), thieve(60)], MergeMode::Replace, 1800)
        .unwrap();
    let ids: Vec<u64> = h
        .world
        .player(h.player)
        .unwrap()
        .queue
        .iter()
        .map(|q| q.queue_id)
        .collect();
    assert_eq!(ids, vec![3, 4]);
}

#[test]
fn append_keeps_existing_entries_and_orders_ids() {
    let mut h = Harness::plain();
    h.start(&[thieve(3600)], MergeMode::Replace, 0).unwrap();
    h.start(&[thieve(60), chop(60)], MergeMode::Append, 100)
        .unwrap();

    let queue = &h.world.player(h.player).unwrap().queue;
    assert_eq!(queue.len(), 3);
    assert_eq!(queue[0].queue_id, 1);
    assert_eq!(queue[0].remaining(), 3500);
    assert!(queue[0].is_in_progress());
    assert!(queue[1].queue_id > queue[0].queue_id);
    assert!(queue[2].queue_id > queue[1].queue_id);
    assert!(!queue[1].is_in_progress());
}

#[test]
fn keep_in_progress_only_retains_the_head() {
    let mut h = Harness::plain();
    h.start(&[thieve(3600), thieve(3600)], MergeMode::Replace, 0)
        .unwrap();
    h.start(&[], MergeMode::KeepInProgressOnly, 1000).unwrap();

    let player = h.world.player(h.player).unwrap();
    assert_eq!(player.queue.len(), 1);
    assert_eq!(player.queue[0].queue_id, 1);
    assert_eq!(player.queue[0].remaining(), 2600);
    assert_eq!(player.progress.xp_for(Skill::Thieving), 1000);
}

#[test]
fn process_never_drops_pending_entries() {
    let mut h = Harness::plain();
    h.start(&[thieve(3600), thieve(3600), thieve(3600)], MergeMode::Replace, 0)
        .unwrap();
    h.process(4000);
    let queue = &h.world.player(h.player).unwrap().queue;
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].queue_id, 2);
    assert_eq!(queue[0].remaining(), 3200);
    assert_eq!(queue[1].queue_id, 3);
}

#[test]
fn too_deep_queue_is_rejected_without_side_effects() {
    let mut h = Harness::plain();
    h.start(&[thieve(3600)], MergeMode::Replace, 0).unwrap();
    let before = h.world.clone();

    let err = h
        .start(&[thieve(60), thieve(60), thieve(60)], MergeMode::Append, 500)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidInput(InvalidInputKind::QueueTooLong { len: 4, max: 3 })
    ));
    assert_eq!(h.world, before);
}

#[test]
fn many_appends_assign_strictly_increasing_ids() {
    let mut h = Harness::plain();
    let mut last_id = 0;
    for i in 0..50u64 {
        h.start(&[thieve(50)], MergeMode::Append, i * 60).unwrap();
        let queue = &h.world.player(h.player).unwrap().queue;
        assert_eq!(queue.len(), 1);
        assert!(queue[0].queue_id > last_id);
        last_id = queue[0].queue_id;
    }
    assert_eq!(last_id, 50);
    assert_eq!(h.xp(Skill::Thieving), 49 * 50);
}

// ── Gates and switches ─────────────────────────────────────────────────

#[test]
fn pause_blocks_mutation_but_not_preview() {
    let mut h = Harness::plain();
    h.start(&[thieve(3600)], MergeMode::Replace, 0).unwrap();
    assert!(matches!(
        h.world.pause(OWNER, true),
        Err(EngineError::CallerNotAuthorized)
    ));
    h.world.pause(ADMIN, true).unwrap();

    assert!(matches!(
        h.start(&[thieve(60)], MergeMode::Append, 10),
        Err(EngineError::GamePaused)
    ));
    assert!(matches!(
        h.world
            .process_actions(OWNER, h.player, 10, &h.catalog, &mut h.ledger),
        Err(EngineError::GamePaused)
    ));
    let preview = h.world.preview(h.player, 10, &h.catalog, &h.ledger).unwrap();
    assert_eq!(preview.xp_for(Skill::Thieving), 10);

    h.world.pause(ADMIN, false).unwrap();
    h.process(10);
    assert_eq!(h.xp(Skill::Thieving), 10);
}

#[test]
fn only_active_owner_may_submit() {
    let mut h = Harness::plain();
    let err = h
        .world
        .start_actions(
            THIEF,
            h.player,
            &[thieve(60)],
            MergeMode::Replace,
            0,
            &h.catalog,
            &mut h.ledger,
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::CallerNotAuthorized));
}

#[test]
fn modify_xp_blocked_while_queue_non_empty() {
    let mut h = Harness::plain();
    h.start(&[thieve(600)], MergeMode::Replace, 0).unwrap();
    assert!(matches!(
        h.world.modify_xp(ADMIN, h.player, Skill::Melee, 500),
        Err(EngineError::HasQueuedActions)
    ));
    h.process(600);
    assert!(matches!(
        h.world.modify_xp(OWNER, h.player, Skill::Melee, 500),
        Err(EngineError::CallerNotAuthorized)
    ));
    h.world
        .modify_xp(ADMIN, h.player, Skill::Melee, 500)
        .unwrap();
    assert_eq!(h.xp(Skill::Melee), 500);
}

#[test]
fn batch_probe_reports_each_candidate_independently() {
    let mut h = Harness::plain();
    let mut catalog = catalog();
    catalog
        .add_action(Action {
            min_xp: 1000,
            ..action(7, Skill::Mining, 3600)
        })
        .unwrap();
    h.catalog = catalog;

    let results = h
        .world
        .validate_actions(
            h.player,
            &[thieve(60), thieve(0), QueuedActionInput::new(7, 60), chop(60)],
            &h.catalog,
            &h.ledger,
        )
        .unwrap();
    assert!(results[0].0);
    assert!(matches!(
        results[1].1,
        Some(EngineError::InvalidInput(InvalidInputKind::EmptyTimespan))
    ));
    assert!(matches!(
        results[2].1,
        Some(EngineError::MinimumXpNotReached {
            gate: XpGate::Action,
            required: 1000,
            ..
        })
    ));
    assert!(results[3].0);
}
