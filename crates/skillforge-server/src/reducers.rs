//! Client-facing reducers: accounts, players, the action queue, and admin tools.
//!
//! Reducers fail with a `String` so SpacetimeDB rolls the transaction back and
//! reports the reason to the caller.

use crate::adapters::{
    action_from_row, action_to_row, choice_from_row, choice_to_row, game_state, item_to_row,
    load_player, player_to_row, store_player, threshold_to_row, TableCatalog, TableLedger,
};
use crate::tables::*;
use serde::Deserialize;
use skillforge_logic::commit;
use skillforge_logic::config::{validate_config, EngineConfig};
use skillforge_logic::constants::MAX_INPUTS_PER_CHOICE;
use skillforge_logic::error::EngineError;
use skillforge_logic::player::Player as LogicPlayer;
use skillforge_logic::queue::{MergeMode, QueuedActionInput};
use skillforge_logic::skills::{Skill, StartSkills};
use skillforge_logic::InMemoryCatalog;
use spacetimedb::{reducer, ReducerContext, Table};

const CONFIG_ID: u32 = 0;

fn now_secs(ctx: &ReducerContext) -> u64 {
    ctx.timestamp.to_micros_since_unix_epoch().max(0) as u64 / 1_000_000
}

fn config(ctx: &ReducerContext) -> Result<GameConfig, String> {
    ctx.db
        .game_config()
        .id()
        .find(CONFIG_ID)
        .ok_or_else(|| "game config missing".to_string())
}

fn account(ctx: &ReducerContext) -> Result<Account, String> {
    ctx.db
        .account()
        .identity()
        .find(ctx.sender)
        .ok_or_else(|| EngineError::CallerNotAuthorized.to_string())
}

fn require_admin(ctx: &ReducerContext) -> Result<GameConfig, String> {
    let config = config(ctx)?;
    if config.admin != ctx.sender {
        return Err(EngineError::CallerNotAuthorized.to_string());
    }
    Ok(config)
}

fn ensure_running(config: &GameConfig) -> Result<(), String> {
    if config.paused {
        return Err(EngineError::GamePaused.to_string());
    }
    Ok(())
}

/// Load a player the caller owns and has active.
fn authorized_player(ctx: &ReducerContext, player_id: u64) -> Result<LogicPlayer, String> {
    let account = account(ctx)?;
    let row = ctx
        .db
        .player()
        .id()
        .find(player_id)
        .ok_or_else(|| EngineError::UnknownPlayer(player_id).to_string())?;
    if row.owner_id != account.owner_id || account.active_player_id != Some(player_id) {
        return Err(EngineError::CallerNotAuthorized.to_string());
    }
    Ok(load_player(ctx, &row))
}

fn skill_arg(id: u8) -> Result<Skill, String> {
    Skill::from_u8(id).ok_or_else(|| format!("unknown skill id {}", id))
}

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Seed the config singleton; the publishing identity becomes admin
#[reducer(init)]
pub fn init(ctx: &ReducerContext) {
    let defaults = EngineConfig::default();
    ctx.db.game_config().insert(GameConfig {
        id: CONFIG_ID,
        admin: ctx.sender,
        paused: false,
        next_queue_id: 1,
        next_owner_id: 1,
        max_queue_depth: defaults.max_queue_depth as u32,
        max_queue_time: defaults.max_queue_time,
        single_start_skill_bonus_percent: defaults.single_start_skill_bonus_percent,
        dual_start_skill_bonus_percent: defaults.dual_start_skill_bonus_percent,
        start_xp: defaults.start_xp,
    });
    log::info!("SkillForge module initialized");
}

/// Called when a client connects; first connection registers an owner id
#[reducer(client_connected)]
pub fn client_connected(ctx: &ReducerContext) {
    log::info!("Client connected: {:?}", ctx.sender);
    if ctx.db.account().identity().find(ctx.sender).is_some() {
        return;
    }
    let Some(mut config) = ctx.db.game_config().id().find(CONFIG_ID) else {
        log::warn!("Client connected before init");
        return;
    };
    let owner_id = config.next_owner_id;
    config.next_owner_id += 1;
    ctx.db.game_config().id().update(config);
    ctx.db.account().insert(Account {
        identity: ctx.sender,
        owner_id,
        active_player_id: None,
        registered_at: ctx.timestamp,
    });
}

// ============================================================================
// PLAYERS
// ============================================================================

/// Create a player with one or two start skills (`second_start_skill` 0 = none)
#[reducer]
pub fn create_player(
    ctx: &ReducerContext,
    start_skill: u8,
    second_start_skill: u8,
    make_active: bool,
) -> Result<(), String> {
    let config = config(ctx)?;
    let mut account = account(ctx)?;
    let first = skill_arg(start_skill)?;
    let second = match second_start_skill {
        0 => None,
        id => Some(skill_arg(id)?),
    };

    let state = game_state(ctx, &config);
    let player = LogicPlayer::new(
        0,
        account.owner_id,
        StartSkills::new(first, second),
        &state.config,
        now_secs(ctx),
    );
    let player_id = ctx.db.player().insert(player_to_row(&player)).id;

    if make_active {
        account.active_player_id = Some(player_id);
        ctx.db.account().identity().update(account);
    }
    log::info!("Player {} created (active: {})", player_id, make_active);
    Ok(())
}

#[reducer]
pub fn set_active_player(ctx: &ReducerContext, player_id: u64) -> Result<(), String> {
    let mut account = account(ctx)?;
    let row = ctx
        .db
        .player()
        .id()
        .find(player_id)
        .ok_or_else(|| EngineError::UnknownPlayer(player_id).to_string())?;
    if row.owner_id != account.owner_id {
        return Err(EngineError::CallerNotAuthorized.to_string());
    }
    if account.active_player_id == Some(player_id) {
        return Err(EngineError::PlayerAlreadyActive.to_string());
    }
    account.active_player_id = Some(player_id);
    ctx.db.account().identity().update(account);
    Ok(())
}

/// Hand a player to another account; the sender loses it as active player
#[reducer]
pub fn transfer_player(
    ctx: &ReducerContext,
    player_id: u64,
    new_owner_id: u64,
) -> Result<(), String> {
    let mut account = account(ctx)?;
    let mut row = ctx
        .db
        .player()
        .id()
        .find(player_id)
        .ok_or_else(|| EngineError::UnknownPlayer(player_id).to_string())?;
    if row.owner_id != account.owner_id {
        return Err(EngineError::CallerNotAuthorized.to_string());
    }
    if account.active_player_id == Some(player_id) {
        account.active_player_id = None;
        ctx.db.account().identity().update(account);
    }
    row.owner_id = new_owner_id;
    ctx.db.player().id().update(row);
    log::info!("Player {} transferred to owner {}", player_id, new_owner_id);
    Ok(())
}

/// Admin: raise a skill to at least `xp` on an idle player
#[reducer]
pub fn modify_xp(ctx: &ReducerContext, player_id: u64, skill: u8, xp: u32) -> Result<(), String> {
    let config = config(ctx)?;
    ensure_running(&config)?;
    require_admin(ctx)?;
    let row = ctx
        .db
        .player()
        .id()
        .find(player_id)
        .ok_or_else(|| EngineError::UnknownPlayer(player_id).to_string())?;
    let mut player = load_player(ctx, &row);
    let skill = skill_arg(skill)?;
    let added = player.raise_xp(skill, xp).map_err(|e| e.to_string())?;
    store_player(ctx, &player);
    log::info!("Admin raised player {} {:?} by {}", player_id, skill, added);
    Ok(())
}

// ============================================================================
// ACTION QUEUE
// ============================================================================

/// Settle elapsed time, then merge `actions` into the queue (mode: 0 replace, 1 append, 2 keep in-progress)
#[reducer]
pub fn start_actions(
    ctx: &ReducerContext,
    player_id: u64,
    actions: Vec<ActionArgs>,
    mode: u8,
) -> Result<(), String> {
    let mut config = config(ctx)?;
    ensure_running(&config)?;
    let mut player = authorized_player(ctx, player_id)?;
    let mode = MergeMode::from_u8(mode).ok_or_else(|| format!("unknown merge mode {}", mode))?;
    let inputs: Vec<QueuedActionInput> = actions.iter().map(QueuedActionInput::from).collect();

    let mut state = game_state(ctx, &config);
    let catalog = TableCatalog { ctx };
    let mut ledger = TableLedger { ctx };
    let result = commit::start_actions(
        &mut state,
        &mut player,
        &inputs,
        mode,
        now_secs(ctx),
        &catalog,
        &mut ledger,
    )
    .map_err(|e| {
        log::warn!("start_actions rejected for player {}: {}", player_id, e);
        e.to_string()
    })?;

    store_player(ctx, &player);
    config.next_queue_id = state.next_queue_id;
    ctx.db.game_config().id().update(config);
    log::info!(
        "Player {} queue now {} entries ({} xp credited)",
        player_id,
        player.queue.len(),
        result.total_xp()
    );
    Ok(())
}

/// Settle elapsed time without changing the queue
#[reducer]
pub fn process_actions(ctx: &ReducerContext, player_id: u64) -> Result<(), String> {
    let config = config(ctx)?;
    ensure_running(&config)?;
    let mut player = authorized_player(ctx, player_id)?;

    let state = game_state(ctx, &config);
    let catalog = TableCatalog { ctx };
    let mut ledger = TableLedger { ctx };
    let result = commit::process_actions(&state, &mut player, now_secs(ctx), &catalog, &mut ledger)
        .map_err(|e| e.to_string())?;

    store_player(ctx, &player);
    if result.starved() {
        log::warn!("Player {} ran out of resources", player_id);
    }
    if !result.threshold_rewards.is_empty() {
        log::info!(
            "Player {} passed an XP threshold: {:?}",
            player_id,
            result.threshold_rewards
        );
    }
    Ok(())
}

// ============================================================================
// ADMIN
// ============================================================================

#[reducer]
pub fn pause_game(ctx: &ReducerContext, paused: bool) -> Result<(), String> {
    let mut config = require_admin(ctx)?;
    config.paused = paused;
    ctx.db.game_config().id().update(config);
    log::info!("Game paused: {}", paused);
    Ok(())
}

/// Partial engine config update; absent fields keep their value
#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    max_queue_depth: Option<u32>,
    max_queue_time: Option<u32>,
    single_start_skill_bonus_percent: Option<u32>,
    dual_start_skill_bonus_percent: Option<u32>,
    start_xp: Option<u32>,
}

/// Apply a JSON config patch, rejecting it if the result is invalid
#[reducer]
pub fn set_config(ctx: &ReducerContext, json: String) -> Result<(), String> {
    let mut config = require_admin(ctx)?;
    let patch: ConfigPatch = serde_json::from_str(&json).map_err(|e| e.to_string())?;

    config.max_queue_depth = patch.max_queue_depth.unwrap_or(config.max_queue_depth);
    config.max_queue_time = patch.max_queue_time.unwrap_or(config.max_queue_time);
    config.single_start_skill_bonus_percent = patch
        .single_start_skill_bonus_percent
        .unwrap_or(config.single_start_skill_bonus_percent);
    config.dual_start_skill_bonus_percent = patch
        .dual_start_skill_bonus_percent
        .unwrap_or(config.dual_start_skill_bonus_percent);
    config.start_xp = patch.start_xp.unwrap_or(config.start_xp);

    let problems = validate_config(&game_state(ctx, &config).config);
    if let Some(problem) = problems.first() {
        return Err(format!("invalid config: {:?}", problem));
    }
    ctx.db.game_config().id().update(config);
    Ok(())
}

#[reducer]
pub fn add_action(ctx: &ReducerContext, action: ActionDef) -> Result<(), String> {
    require_admin(ctx)?;
    if action.id == 0 {
        return Err("id 0 is reserved".to_string());
    }
    action_from_row(&action).ok_or_else(|| format!("unknown skill id {}", action.skill))?;
    if ctx.db.action_def().id().find(action.id).is_some() {
        ctx.db.action_def().id().update(action);
    } else {
        ctx.db.action_def().insert(action);
    }
    Ok(())
}

#[reducer]
pub fn add_action_choice(ctx: &ReducerContext, choice: ActionChoiceDef) -> Result<(), String> {
    require_admin(ctx)?;
    if choice.id == 0 {
        return Err("id 0 is reserved".to_string());
    }
    if choice.input_items.len() > MAX_INPUTS_PER_CHOICE
        || choice.input_items.len() != choice.input_amounts.len()
    {
        return Err(format!("action choice {} has malformed inputs", choice.id));
    }
    if choice.is_travel && choice.rate == 0 {
        return Err(format!("travel choice {} needs a non-zero rate", choice.id));
    }
    choice_from_row(&choice).ok_or_else(|| format!("unknown skill id {}", choice.skill))?;
    if ctx.db.action_choice_def().id().find(choice.id).is_some() {
        ctx.db.action_choice_def().id().update(choice);
    } else {
        ctx.db.action_choice_def().insert(choice);
    }
    Ok(())
}

#[reducer]
pub fn add_item(ctx: &ReducerContext, item: ItemDef) -> Result<(), String> {
    require_admin(ctx)?;
    if item.id == 0 {
        return Err("id 0 is reserved".to_string());
    }
    if item.skill != 0 {
        skill_arg(item.skill)?;
    }
    if ctx.db.item_def().id().find(item.id).is_some() {
        ctx.db.item_def().id().update(item);
    } else {
        ctx.db.item_def().insert(item);
    }
    Ok(())
}

#[reducer]
pub fn add_xp_threshold_reward(ctx: &ReducerContext, reward: XpThresholdRewardDef) -> Result<(), String> {
    require_admin(ctx)?;
    if reward.threshold == 0 {
        return Err("XP threshold 0 is reserved".to_string());
    }
    if reward.reward_items.len() != reward.reward_amounts.len() {
        return Err(format!("threshold {} has malformed rewards", reward.threshold));
    }
    if ctx
        .db
        .xp_threshold_reward_def()
        .threshold()
        .find(reward.threshold)
        .is_some()
    {
        ctx.db.xp_threshold_reward_def().threshold().update(reward);
    } else {
        ctx.db.xp_threshold_reward_def().insert(reward);
    }
    Ok(())
}

/// Bulk-load the JSON catalog layout used by the headless harness
#[reducer]
pub fn import_catalog(ctx: &ReducerContext, json: String) -> Result<(), String> {
    require_admin(ctx)?;
    let catalog = InMemoryCatalog::from_json(&json).map_err(|e| e.to_string())?;
    for action in catalog.actions() {
        let row = action_to_row(action);
        if ctx.db.action_def().id().find(row.id).is_some() {
            ctx.db.action_def().id().update(row);
        } else {
            ctx.db.action_def().insert(row);
        }
    }
    for choice in catalog.action_choices() {
        let row = choice_to_row(choice);
        if ctx.db.action_choice_def().id().find(row.id).is_some() {
            ctx.db.action_choice_def().id().update(row);
        } else {
            ctx.db.action_choice_def().insert(row);
        }
    }
    for item in catalog.items() {
        let row = item_to_row(item);
        if ctx.db.item_def().id().find(row.id).is_some() {
            ctx.db.item_def().id().update(row);
        } else {
            ctx.db.item_def().insert(row);
        }
    }
    for reward in catalog.threshold_rewards() {
        let row = threshold_to_row(reward);
        if ctx
            .db
            .xp_threshold_reward_def()
            .threshold()
            .find(row.threshold)
            .is_some()
        {
            ctx.db.xp_threshold_reward_def().threshold().update(row);
        } else {
            ctx.db.xp_threshold_reward_def().insert(row);
        }
    }
    log::info!(
        "Imported {} actions and {} items",
        catalog.action_count(),
        catalog.item_count()
    );
    Ok(())
}

/// Admin test helper: credit items to an owner
#[reducer]
pub fn test_mint(ctx: &ReducerContext, owner_id: u64, item_id: u16, amount: u64) -> Result<(), String> {
    require_admin(ctx)?;
    if item_id == 0 {
        return Err("id 0 is reserved".to_string());
    }
    TableLedger { ctx }.mint(owner_id, item_id, amount);
    log::info!("Minted {} of item {} to owner {}", amount, item_id, owner_id);
    Ok(())
}
