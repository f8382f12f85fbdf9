//! SkillForge Headless Simulation Harness
//!
//! Drives the progression engine in-process against the shipped catalog:
//! scripted scenarios with known answers, then a seeded sweep of random
//! queues checking that split processing agrees with a single run.
//!
//! Usage:
//!   cargo run -p skillforge-simtest
//!   cargo run -p skillforge-simtest -- --verbose
//!   cargo run -p skillforge-simtest -- --json

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use skillforge_logic::accrual::{AccrualResult, EntryStatus};
use skillforge_logic::catalog::{EquipPosition, InMemoryCatalog};
use skillforge_logic::config::{validate_config, ConfigError, EngineConfig};
use skillforge_logic::error::EngineError;
use skillforge_logic::ledger::{InMemoryLedger, OwnerId, ResourceLedger};
use skillforge_logic::persistence::{load_world, save_world};
use skillforge_logic::queue::{CombatStyle, MergeMode, QueuedActionInput};
use skillforge_logic::skills::{Skill, StartSkills};
use skillforge_logic::world::World;
use skillforge_logic::PlayerId;

// ── Catalog (same JSON the server imports) ──────────────────────────────
const CATALOG_JSON: &str = include_str!("../../../data/catalog.json");

const CHOP: u16 = 1;
const FIRE: u16 = 2;
const FISH: u16 = 3;
const MINE: u16 = 4;
const FIGHT: u16 = 5;
const THIEVE: u16 = 6;
const COOK: u16 = 7;
const CHOP_WILLOW: u16 = 8;
const TRAVEL: u16 = 9;
const QUARRY: u16 = 10;

const BURN_OAK: u16 = 1;
const MELEE: u16 = 2;
const COOK_SHRIMP: u16 = 3;
const TO_QUARRY: u16 = 5;
const FROM_QUARRY: u16 = 6;

const SWORD: u16 = 1;
const BRONZE_AXE: u16 = 256;
const FIRE_STARTER: u16 = 320;
const NET: u16 = 384;
const PICKAXE: u16 = 448;
const OAK_LOG: u16 = 600;
const COPPER_ORE: u16 = 700;
const RAW_SHRIMP: u16 = 900;
const COOKED_SHRIMP: u16 = 901;
const TIN_ORE: u16 = 701;
const TOKEN: u16 = 1100;
const GEM: u16 = 1101;

/// One trip at 0.125 trips per hour.
const TRIP: u32 = 28_800;

const OWNER: OwnerId = 1;
const ADMIN: OwnerId = 1000;
const STRANGER: OwnerId = 2;

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

/// One world, one player, one ledger.
#[derive(Clone)]
struct Sim {
    world: World,
    ledger: InMemoryLedger,
    player: PlayerId,
}

impl Sim {
    fn new(start: StartSkills) -> Self {
        let mut world = World::new(EngineConfig::default(), ADMIN);
        let player = world.create_player(OWNER, start, true, 0);
        let mut ledger = InMemoryLedger::new();
        for tool in [SWORD, BRONZE_AXE, FIRE_STARTER, NET, PICKAXE] {
            ledger.mint(OWNER, tool, 1);
        }
        Self {
            world,
            ledger,
            player,
        }
    }

    fn start(
        &mut self,
        catalog: &InMemoryCatalog,
        actions: &[QueuedActionInput],
        mode: MergeMode,
        now: u64,
    ) -> Result<AccrualResult, EngineError> {
        self.world.start_actions(
            OWNER,
            self.player,
            actions,
            mode,
            now,
            catalog,
            &mut self.ledger,
        )
    }

    fn process(&mut self, catalog: &InMemoryCatalog, now: u64) -> Result<AccrualResult, EngineError> {
        self.world
            .process_actions(OWNER, self.player, now, catalog, &mut self.ledger)
    }

    fn xp(&self, skill: Skill) -> u32 {
        self.world.xp(self.player, skill).unwrap_or(0)
    }

    fn balance(&self, item: u16) -> u64 {
        self.ledger.balance_of(OWNER, item)
    }
}

fn chop(timespan: u32) -> QueuedActionInput {
    QueuedActionInput::new(CHOP, timespan).with_right_hand(BRONZE_AXE)
}

fn burn(timespan: u32) -> QueuedActionInput {
    QueuedActionInput::new(FIRE, timespan)
        .with_choice(BURN_OAK)
        .with_right_hand(FIRE_STARTER)
}

fn fish(timespan: u32) -> QueuedActionInput {
    QueuedActionInput::new(FISH, timespan).with_right_hand(NET)
}

fn mine(timespan: u32) -> QueuedActionInput {
    QueuedActionInput::new(MINE, timespan).with_right_hand(PICKAXE)
}

fn cook(timespan: u32) -> QueuedActionInput {
    QueuedActionInput::new(COOK, timespan).with_choice(COOK_SHRIMP)
}

fn quarry(timespan: u32) -> QueuedActionInput {
    QueuedActionInput::new(QUARRY, timespan).with_right_hand(PICKAXE)
}

fn travel(route: u16) -> QueuedActionInput {
    QueuedActionInput::new(TRAVEL, TRIP).with_choice(route)
}

fn fight(timespan: u32, style: CombatStyle) -> QueuedActionInput {
    QueuedActionInput::new(FIGHT, timespan)
        .with_choice(MELEE)
        .with_right_hand(SWORD)
        .with_food(COOKED_SHRIMP)
        .with_combat_style(style)
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let json = std::env::args().any(|a| a == "--json");
    if !json {
        println!("=== SkillForge Simulation Harness ===\n");
    }

    let mut results = Vec::new();

    // 1. Catalog data validation
    let catalog = match InMemoryCatalog::from_json(CATALOG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(check("catalog_parse", false, format!("JSON error: {}", e)));
            report(&results, verbose, json);
            return;
        }
    };
    results.extend(validate_catalog(&catalog));

    // 2. Engine config
    results.extend(validate_engine_config());

    // 3. Accrual arithmetic
    results.extend(validate_accrual(&catalog));

    // 4. Chained queues and starvation
    results.extend(validate_chains(&catalog));

    // 5. Merge policy, limits, authorization
    results.extend(validate_queue_rules(&catalog));

    // 6. Save / load
    results.extend(validate_persistence(&catalog));

    // 7. Randomized split-vs-single sweep
    results.extend(validate_split_sweep(&catalog, verbose && !json));

    report(&results, verbose, json);
}

fn report(results: &[TestResult], verbose: bool, json: bool) {
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    if json {
        match serde_json::to_string_pretty(results) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("failed to encode report: {}", e),
        }
    } else {
        println!();
        for r in results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }
        println!(
            "\n=== RESULT: {}/{} passed, {} failed ===",
            passed,
            results.len(),
            failed
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(catalog: &InMemoryCatalog) -> Vec<TestResult> {
    eprintln!("--- Catalog ---");
    let mut results = Vec::new();

    results.push(check(
        "catalog_not_empty",
        catalog.action_count() >= 8 && catalog.item_count() >= 10,
        format!(
            "{} actions, {} items",
            catalog.action_count(),
            catalog.item_count()
        ),
    ));

    // Every hand range must contain at least one hand item
    let uncovered: Vec<u16> = catalog
        .actions()
        .filter_map(|a| a.hand_item_range.map(|range| (a.id, range)))
        .filter(|(_, (lo, hi))| {
            !catalog
                .items()
                .any(|i| i.equip_position == EquipPosition::Hand && (*lo..=*hi).contains(&i.id))
        })
        .map(|(id, _)| id)
        .collect();
    results.push(check(
        "catalog_hand_ranges_covered",
        uncovered.is_empty(),
        if uncovered.is_empty() {
            "every hand range has a usable item".to_string()
        } else {
            format!("actions without hand items: {:?}", uncovered)
        },
    ));

    // Choice inputs and outputs reference known items
    let dangling: Vec<u16> = catalog
        .action_choices()
        .filter(|c| {
            c.inputs
                .iter()
                .map(|i| i.item)
                .chain(c.output.map(|o| o.item))
                .any(|item| !catalog.items().any(|i| i.id == item))
        })
        .map(|c| c.id)
        .collect();
    results.push(check(
        "catalog_choice_items_exist",
        dangling.is_empty(),
        format!("{} choices with unknown items", dangling.len()),
    ));

    // Guaranteed rewards reference known items
    let bad_rewards = catalog
        .actions()
        .flat_map(|a| a.guaranteed_rewards.iter())
        .filter(|r| !catalog.items().any(|i| i.id == r.item))
        .count();
    results.push(check(
        "catalog_rewards_exist",
        bad_rewards == 0,
        format!("{} rewards with unknown items", bad_rewards),
    ));

    // Food restores health
    let bad_food = catalog
        .items()
        .filter(|i| i.equip_position == EquipPosition::Food && i.health_restored == 0)
        .count();
    results.push(check(
        "catalog_food_restores_health",
        bad_food == 0,
        format!("{} food items restore nothing", bad_food),
    ));

    // Threshold rewards pay known items
    let bad_thresholds = catalog
        .threshold_rewards()
        .flat_map(|t| t.rewards.iter())
        .filter(|r| !catalog.items().any(|i| i.id == r.item))
        .count();
    results.push(check(
        "catalog_threshold_rewards_exist",
        bad_thresholds == 0,
        format!("{} threshold rewards with unknown items", bad_thresholds),
    ));

    // Every route is one whole trip
    let odd_routes: Vec<u16> = catalog
        .action_choices()
        .filter(|c| c.travel_timespan().is_some_and(|t| t != TRIP as u64))
        .map(|c| c.id)
        .collect();
    results.push(check(
        "catalog_travel_trip_length",
        odd_routes.is_empty(),
        format!("routes with other trip lengths: {:?}", odd_routes),
    ));

    // Combat actions with food need a food rate
    let hungry = catalog
        .actions()
        .filter(|a| a.is_combat() && a.food_rate == 0)
        .count();
    results.push(check(
        "catalog_combat_food_rate",
        hungry == 0,
        format!("{} combat actions without a food rate", hungry),
    ));

    results
}

// ── 2. Config ───────────────────────────────────────────────────────────

fn validate_engine_config() -> Vec<TestResult> {
    eprintln!("--- Engine Config ---");
    let mut results = Vec::new();

    let defaults = EngineConfig::default();
    let problems = validate_config(&defaults);
    results.push(check(
        "config_defaults_valid",
        problems.is_empty(),
        format!(
            "depth {}, max time {}s, bonuses {}%/{}%",
            defaults.max_queue_depth,
            defaults.max_queue_time,
            defaults.single_start_skill_bonus_percent,
            defaults.dual_start_skill_bonus_percent
        ),
    ));

    let broken = EngineConfig {
        max_queue_depth: 0,
        single_start_skill_bonus_percent: 150,
        ..EngineConfig::default()
    };
    let problems = validate_config(&broken);
    results.push(check(
        "config_reports_every_problem",
        problems == vec![ConfigError::ZeroQueueDepth, ConfigError::BonusTooLarge(150)],
        format!("{:?}", problems),
    ));

    results
}

// ── 3. Accrual ──────────────────────────────────────────────────────────

fn validate_accrual(catalog: &InMemoryCatalog) -> Vec<TestResult> {
    eprintln!("--- Accrual ---");
    let mut results = Vec::new();

    // 361s of 100 logs/h: ten logs, XP only for the 360s they took
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    let outcome = sim
        .start(catalog, &[chop(3600)], MergeMode::Replace, 0)
        .and_then(|_| sim.process(catalog, 361));
    let ok = outcome.is_ok() && sim.xp(Skill::Woodcutting) == 360 && sim.balance(OAK_LOG) == 10;
    results.push(check(
        "accrual_units_quantize_xp",
        ok,
        format!(
            "woodcutting {} xp, {} logs",
            sim.xp(Skill::Woodcutting),
            sim.balance(OAK_LOG)
        ),
    ));

    // Affinity: one start skill +10%, two start skills +5%
    let mut single = Sim::new(StartSkills::single(Skill::Woodcutting));
    let mut dual = Sim::new(StartSkills::new(Skill::Woodcutting, Some(Skill::Mining)));
    for sim in [&mut single, &mut dual] {
        let _ = sim.start(catalog, &[chop(3600)], MergeMode::Replace, 0);
        let _ = sim.process(catalog, 3600);
    }
    // Start XP (374 or 187) sits under the earned amount
    let single_earned = single.xp(Skill::Woodcutting).saturating_sub(374);
    let dual_earned = dual.xp(Skill::Woodcutting).saturating_sub(187);
    results.push(check(
        "accrual_affinity_bonus",
        single_earned == 3960 && dual_earned == 3780,
        format!("single {} / dual {}", single_earned, dual_earned),
    ));

    // Combat: Melee at the choice rate, Health a third, 5 food per hour
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    sim.ledger.mint(OWNER, COOKED_SHRIMP, 10);
    let outcome = sim
        .start(catalog, &[fight(3600, CombatStyle::Attack)], MergeMode::Replace, 0)
        .and_then(|_| sim.process(catalog, 3600));
    let ok = outcome.is_ok()
        && sim.xp(Skill::Melee) == 3000
        && sim.xp(Skill::Health) == 1000
        && sim.balance(COOKED_SHRIMP) == 5;
    results.push(check(
        "accrual_combat_routing",
        ok,
        format!(
            "melee {} health {} food left {}",
            sim.xp(Skill::Melee),
            sim.xp(Skill::Health),
            sim.balance(COOKED_SHRIMP)
        ),
    ));

    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    sim.ledger.mint(OWNER, COOKED_SHRIMP, 10);
    let _ = sim.start(catalog, &[fight(3600, CombatStyle::Defence)], MergeMode::Replace, 0);
    let _ = sim.process(catalog, 3600);
    results.push(check(
        "accrual_defence_style",
        sim.xp(Skill::Defence) == 3000 && sim.xp(Skill::Melee) == 0,
        format!("defence {} melee {}", sim.xp(Skill::Defence), sim.xp(Skill::Melee)),
    ));

    // Thieving has no unit clock, so XP is not quantized
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    let _ = sim.start(
        catalog,
        &[QueuedActionInput::new(THIEVE, 3600)],
        MergeMode::Replace,
        0,
    );
    let _ = sim.process(catalog, 361);
    results.push(check(
        "accrual_plain_xp",
        sim.xp(Skill::Thieving) == 180,
        format!("thieving {} xp after 361s at 1800/h", sim.xp(Skill::Thieving)),
    ));

    // Idle time after the queue empties is reported and discarded
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    let _ = sim.start(catalog, &[mine(600)], MergeMode::Replace, 0);
    let unused = sim.process(catalog, 1000).map(|r| r.unused_time).unwrap_or(0);
    results.push(check(
        "accrual_unused_time",
        unused == 400,
        format!("{}s unused", unused),
    ));

    results
}

// ── 4. Chains ───────────────────────────────────────────────────────────

fn validate_chains(catalog: &InMemoryCatalog) -> Vec<TestResult> {
    eprintln!("--- Chained Queues ---");
    let mut results = Vec::new();

    // Chop then burn: the fire eats logs the axe produced in the same run
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    let _ = sim.start(catalog, &[chop(3600), burn(1800)], MergeMode::Replace, 0);
    let predicted = sim
        .world
        .preview(sim.player, 5400, catalog, &sim.ledger)
        .ok();
    let committed = sim.process(catalog, 5400).ok();
    results.push(check(
        "chain_preview_matches_commit",
        predicted.is_some() && predicted == committed,
        "preview at 5400s equals processing at 5400s",
    ));
    results.push(check(
        "chain_logs_flow_between_entries",
        sim.xp(Skill::Woodcutting) == 3600
            && sim.xp(Skill::Firemaking) == 1800
            && sim.balance(OAK_LOG) == 50,
        format!(
            "woodcutting {} firemaking {} logs {}",
            sim.xp(Skill::Woodcutting),
            sim.xp(Skill::Firemaking),
            sim.balance(OAK_LOG)
        ),
    ));

    // 374 + 5400 total XP passes the 500, 1000, 2500 and 5000 thresholds
    results.push(check(
        "chain_threshold_rewards",
        sim.balance(TOKEN) == 8 && sim.balance(GEM) == 2,
        format!("tokens {} gems {}", sim.balance(TOKEN), sim.balance(GEM)),
    ));

    // Fishing then cooking: raw fish become food
    let mut sim = Sim::new(StartSkills::single(Skill::Mining));
    let _ = sim.start(catalog, &[fish(1800), cook(1800)], MergeMode::Replace, 0);
    let _ = sim.process(catalog, 3600);
    results.push(check(
        "chain_fish_then_cook",
        sim.balance(RAW_SHRIMP) == 0 && sim.balance(COOKED_SHRIMP) == 60,
        format!(
            "raw {} cooked {}",
            sim.balance(RAW_SHRIMP),
            sim.balance(COOKED_SHRIMP)
        ),
    ));

    // Five logs buy five burns; the rest of the queue goes with the fire
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    sim.ledger.mint(OWNER, OAK_LOG, 5);
    let _ = sim.start(catalog, &[burn(3600), mine(600)], MergeMode::Replace, 0);
    let result = sim.process(catalog, 3600);
    let (status, dropped) = match &result {
        Ok(r) => (r.entries.first().map(|e| e.status), r.dropped.len()),
        Err(_) => (None, 0),
    };
    results.push(check(
        "chain_starvation_drops_tail",
        status == Some(EntryStatus::AbortedForResources)
            && dropped == 2
            && sim.xp(Skill::Firemaking) == 180
            && sim.xp(Skill::Mining) == 0
            && sim.balance(OAK_LOG) == 0,
        format!(
            "{:?}, {} dropped, firemaking {}",
            status,
            dropped,
            sim.xp(Skill::Firemaking)
        ),
    ));

    // Quarry work only counts once the player is there
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    let _ = sim.start(catalog, &[quarry(600)], MergeMode::Replace, 0);
    let _ = sim.process(catalog, 600);
    results.push(check(
        "chain_wrong_area_idles",
        sim.xp(Skill::Mining) == 0 && sim.balance(TIN_ORE) == 0,
        format!("mining {} tin {}", sim.xp(Skill::Mining), sim.balance(TIN_ORE)),
    ));

    let trip = TRIP as u64;
    let _ = sim.start(
        catalog,
        &[travel(TO_QUARRY), quarry(3600), travel(FROM_QUARRY)],
        MergeMode::Replace,
        600,
    );
    let there = sim
        .world
        .preview(sim.player, 600 + trip + 3600, catalog, &sim.ledger)
        .map(|r| r.location)
        .ok();
    let back = sim.process(catalog, 600 + 2 * trip + 3600).map(|r| r.location).ok();
    results.push(check(
        "chain_travel_round_trip",
        there == Some(1)
            && back == Some(0)
            && sim.xp(Skill::Agility) == 2 * TRIP
            && sim.xp(Skill::Mining) == 3600
            && sim.balance(TIN_ORE) == 40,
        format!(
            "there {:?} back {:?} agility {} mining {} tin {}",
            there,
            back,
            sim.xp(Skill::Agility),
            sim.xp(Skill::Mining),
            sim.balance(TIN_ORE)
        ),
    ));

    // Out of food mid-fight
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    sim.ledger.mint(OWNER, COOKED_SHRIMP, 2);
    let _ = sim.start(catalog, &[fight(3600, CombatStyle::Attack)], MergeMode::Replace, 0);
    let starved = sim.process(catalog, 3600).map(|r| r.starved()).unwrap_or(false);
    results.push(check(
        "chain_food_starvation",
        starved
            && sim.balance(COOKED_SHRIMP) == 0
            && sim.xp(Skill::Melee) == 1799
            && sim.xp(Skill::Health) == 599,
        format!("melee {} after two shrimp", sim.xp(Skill::Melee)),
    ));

    results
}

// ── 5. Queue rules ──────────────────────────────────────────────────────

fn validate_queue_rules(catalog: &InMemoryCatalog) -> Vec<TestResult> {
    eprintln!("--- Queue Rules ---");
    let mut results = Vec::new();

    // Queue ids strictly increase across submissions
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    let mut ids = Vec::new();
    for step in 0..6u64 {
        let _ = sim.start(catalog, &[mine(60)], MergeMode::Append, step * 60);
        if let Ok(player) = sim.world.player(sim.player) {
            ids.extend(player.queue.iter().map(|q| q.queue_id));
        }
    }
    ids.dedup();
    results.push(check(
        "queue_ids_increase",
        ids.windows(2).all(|w| w[0] < w[1]) && ids.len() == 6,
        format!("ids {:?}", ids),
    ));

    // Depth limit rejects without touching state
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    let before = sim.clone();
    let err = sim
        .start(
            catalog,
            &[mine(60), mine(60), mine(60), mine(60)],
            MergeMode::Replace,
            0,
        )
        .err();
    results.push(check(
        "queue_depth_limit",
        err.is_some() && sim.world == before.world && sim.ledger == before.ledger,
        format!("{:?}", err),
    ));

    // Gated content needs XP
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    let err = sim
        .start(
            catalog,
            &[QueuedActionInput::new(CHOP_WILLOW, 600).with_right_hand(BRONZE_AXE)],
            MergeMode::Replace,
            0,
        )
        .err();
    results.push(check(
        "queue_xp_gate",
        matches!(err, Some(EngineError::MinimumXpNotReached { .. })),
        format!("{:?}", err),
    ));

    // Strangers and paused games are turned away
    let mut sim = Sim::new(StartSkills::single(Skill::Fishing));
    let stranger = sim.world.start_actions(
        STRANGER,
        sim.player,
        &[mine(60)],
        MergeMode::Replace,
        0,
        catalog,
        &mut sim.ledger,
    );
    results.push(check(
        "queue_rejects_stranger",
        matches!(stranger, Err(EngineError::CallerNotAuthorized)),
        format!("{:?}", stranger.err()),
    ));

    let owner_pause = sim.world.pause(OWNER, true);
    results.push(check(
        "queue_pause_admin_only",
        matches!(owner_pause, Err(EngineError::CallerNotAuthorized)) && !sim.world.is_paused(),
        format!("{:?}", owner_pause.err()),
    ));

    let admin_pause = sim.world.pause(ADMIN, true);
    let paused = sim.start(catalog, &[mine(60)], MergeMode::Replace, 0);
    let preview = sim.world.preview(sim.player, 10, catalog, &sim.ledger);
    results.push(check(
        "queue_pause_blocks_writes_only",
        admin_pause.is_ok() && matches!(paused, Err(EngineError::GamePaused)) && preview.is_ok(),
        "paused: submit rejected, preview served",
    ));

    results
}

// ── 6. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(catalog: &InMemoryCatalog) -> Vec<TestResult> {
    eprintln!("--- Persistence ---");
    let mut results = Vec::new();

    let mut sim = Sim::new(StartSkills::new(Skill::Woodcutting, Some(Skill::Firemaking)));
    let _ = sim.start(catalog, &[chop(3600), burn(1800)], MergeMode::Replace, 0);
    let _ = sim.process(catalog, 1000);

    let mut buffer = Vec::new();
    let saved = save_world(&mut buffer, &sim.world, &sim.ledger, 1000);
    let loaded = saved.and_then(|_| load_world(buffer.as_slice()));
    let ok = match &loaded {
        Ok(l) => l.world == sim.world && l.ledger == sim.ledger && l.saved_at == 1000,
        Err(_) => false,
    };
    results.push(check(
        "persistence_round_trip",
        ok,
        format!("{} bytes", buffer.len()),
    ));

    // A restored world keeps accruing where the live one left off
    if let Ok(mut restored) = loaded {
        let live = sim.process(catalog, 5400).ok();
        let resumed = restored
            .world
            .process_actions(OWNER, sim.player, 5400, catalog, &mut restored.ledger)
            .ok();
        results.push(check(
            "persistence_resume",
            live.is_some() && live == resumed,
            "restored world processes identically",
        ));
    }

    results
}

// ── 7. Split sweep ──────────────────────────────────────────────────────

const SWEEP_SEEDS: u64 = 64;
const TRACKED_ITEMS: [u16; 6] = [OAK_LOG, COPPER_ORE, RAW_SHRIMP, COOKED_SHRIMP, TOKEN, GEM];

fn random_entry(rng: &mut StdRng) -> QueuedActionInput {
    let timespan = rng.gen_range(60..20_000);
    match rng.gen_range(0..7) {
        0 => chop(timespan),
        1 => burn(timespan),
        2 => fish(timespan),
        3 => mine(timespan),
        4 => cook(timespan),
        5 => QueuedActionInput::new(THIEVE, timespan),
        _ => {
            let style = if rng.gen_bool(0.5) {
                CombatStyle::Attack
            } else {
                CombatStyle::Defence
            };
            fight(timespan, style)
        }
    }
}

fn validate_split_sweep(catalog: &InMemoryCatalog, verbose: bool) -> Vec<TestResult> {
    eprintln!("--- Split Sweep ({} seeds) ---", SWEEP_SEEDS);
    let mut results = Vec::new();
    let mut mismatches = Vec::new();
    let mut accounting_errors = 0;
    let mut rejected = 0;

    for seed in 0..SWEEP_SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let start = Skill::ALL[rng.gen_range(0..Skill::ALL.len())];
        let mut split = Sim::new(StartSkills::single(start));
        split.ledger.mint(OWNER, OAK_LOG, rng.gen_range(0..200));
        split.ledger.mint(OWNER, RAW_SHRIMP, rng.gen_range(0..60));
        split.ledger.mint(OWNER, COOKED_SHRIMP, rng.gen_range(1..20));

        let depth = rng.gen_range(1..=3);
        let queue: Vec<QueuedActionInput> = (0..depth).map(|_| random_entry(&mut rng)).collect();
        let horizon: u64 = queue.iter().map(|q| q.timespan as u64).sum::<u64>() + 600;

        if split.start(catalog, &queue, MergeMode::Replace, 0).is_err() {
            rejected += 1;
            continue;
        }
        let mut single = split.clone();

        let mut now = 0;
        while now < horizon {
            now = (now + rng.gen_range(1..3000)).min(horizon);
            let predicted = split.world.preview(split.player, now, catalog, &split.ledger);
            match split.process(catalog, now) {
                Ok(r) => {
                    let consumed: u64 = r.entries.iter().map(|e| e.time_consumed as u64).sum();
                    if consumed + r.unused_time != r.elapsed || predicted.ok() != Some(r) {
                        accounting_errors += 1;
                    }
                }
                Err(_) => accounting_errors += 1,
            }
        }
        if single.process(catalog, horizon).is_err() {
            accounting_errors += 1;
        }

        let xp_equal = Skill::ALL.iter().all(|s| split.xp(*s) == single.xp(*s));
        let items_equal = TRACKED_ITEMS
            .iter()
            .all(|i| split.balance(*i) == single.balance(*i));
        if !(xp_equal && items_equal) {
            mismatches.push(seed);
        }
        if verbose {
            println!(
                "  seed {:>2}: {} entries over {}s, total xp {}",
                seed,
                depth,
                horizon,
                split
                    .world
                    .player(split.player)
                    .map(|p| p.total_xp)
                    .unwrap_or(0)
            );
        }
    }

    results.push(check(
        "sweep_split_equals_single",
        mismatches.is_empty(),
        if mismatches.is_empty() {
            format!("{} seeds agree ({} rejected at submit)", SWEEP_SEEDS, rejected)
        } else {
            format!("seeds disagree: {:?}", mismatches)
        },
    ));
    results.push(check(
        "sweep_time_accounting",
        accounting_errors == 0,
        format!("{} runs with time or preview drift", accounting_errors),
    ));

    results
}
