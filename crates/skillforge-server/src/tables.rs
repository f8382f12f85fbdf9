//! SpacetimeDB table definitions for the progression engine.
//!
//! Each table mirrors a type from skillforge-logic, flattened into columns
//! SpacetimeDB can store. Enums are stored as their `u8` ids and optional
//! item ids use 0 for "none".

use spacetimedb::{table, Identity, SpacetimeType, Timestamp};

// ============================================================================
// GAME STATE
// ============================================================================

/// Game state singleton (id always 0)
#[table(name = game_config, public)]
#[derive(Clone)]
pub struct GameConfig {
    #[primary_key]
    pub id: u32,
    /// Identity allowed to pause the game and edit the catalog
    pub admin: Identity,
    pub paused: bool,
    pub next_queue_id: u64,
    pub next_owner_id: u64,
    pub max_queue_depth: u32,
    pub max_queue_time: u32,
    pub single_start_skill_bonus_percent: u32,
    pub dual_start_skill_bonus_percent: u32,
    pub start_xp: u32,
}

// ============================================================================
// ACCOUNTS AND PLAYERS
// ============================================================================

/// A connected identity and the owner id its items and players belong to
#[table(name = account, public)]
#[derive(Clone)]
pub struct Account {
    #[primary_key]
    pub identity: Identity,
    pub owner_id: u64,
    pub active_player_id: Option<u64>,
    pub registered_at: Timestamp,
}

/// A player and its persisted progression state
#[table(name = player, public)]
#[derive(Clone)]
pub struct Player {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub owner_id: u64,
    pub start_skill: u8,
    /// 0 when the avatar has a single start skill
    pub second_start_skill: u8,
    /// XP per skill, indexed by skill id - 1
    pub skill_xp: Vec<u32>,
    pub total_xp: u64,
    /// Seconds since the epoch up to which the queue is accrued
    pub last_processed_time: u64,
    pub progress_start_time: u64,
    pub progress_skills: Vec<u8>,
    pub progress_xp: Vec<u32>,
    pub progress_inputs_consumed: u32,
    pub progress_food_consumed: u32,
    /// World area the player is in
    pub location: u16,
}

/// One entry of a player's action queue
#[table(name = queued_action, public)]
#[derive(Clone)]
pub struct QueuedAction {
    #[primary_key]
    pub queue_id: u64,
    pub player_id: u64,
    /// Order within the player's queue (0 = head)
    pub position: u32,
    pub action_id: u16,
    pub choice_id: u16,
    pub timespan: u32,
    /// Seconds already credited; `None` while pending
    pub consumed: Option<u32>,
    /// Head, neck, body, arms, legs, feet
    pub attire: Vec<u16>,
    pub right_hand: u16,
    pub left_hand: u16,
    pub regenerate: u16,
    pub combat_style: u8,
}

/// Reducer argument for one queued action; same column conventions as [`QueuedAction`]
#[derive(SpacetimeType, Clone, Debug)]
pub struct ActionArgs {
    pub action_id: u16,
    pub choice_id: u16,
    pub timespan: u32,
    pub attire: Vec<u16>,
    pub right_hand: u16,
    pub left_hand: u16,
    pub regenerate: u16,
    pub combat_style: u8,
}

// ============================================================================
// CATALOG
// ============================================================================

#[table(name = action_def, public)]
#[derive(Clone)]
pub struct ActionDef {
    #[primary_key]
    pub id: u16,
    pub skill: u8,
    pub xp_per_hour: u32,
    pub min_xp: u32,
    pub action_choice_required: bool,
    pub success_percent: u8,
    /// Inclusive hand item range; 0..0 when no hand item is used
    pub hand_item_min: u16,
    pub hand_item_max: u16,
    pub guaranteed_items: Vec<u16>,
    pub guaranteed_rates: Vec<u32>,
    pub num_spawned: u32,
    pub food_rate: u32,
    pub is_available: bool,
    /// World area the action runs in
    pub world_location: u16,
}

#[table(name = action_choice_def, public)]
#[derive(Clone)]
pub struct ActionChoiceDef {
    #[primary_key]
    pub id: u16,
    pub skill: u8,
    pub xp_per_hour: u32,
    pub min_xp: u32,
    pub rate: u32,
    pub input_items: Vec<u16>,
    pub input_amounts: Vec<u32>,
    pub output_item: u16,
    pub output_amount: u32,
    /// Travel choices move the player from `travel_from` to `travel_to`
    pub is_travel: bool,
    pub travel_from: u16,
    pub travel_to: u16,
}

#[table(name = item_def, public)]
#[derive(Clone)]
pub struct ItemDef {
    #[primary_key]
    pub id: u16,
    pub equip_position: u8,
    /// 0 when the item has no XP gate
    pub skill: u8,
    pub min_xp: u32,
    pub melee: i16,
    pub magic: i16,
    pub ranged: i16,
    pub melee_defence: i16,
    pub magic_defence: i16,
    pub ranged_defence: i16,
    pub health: i16,
    pub health_restored: u16,
}

/// Items granted when a player's total XP first reaches `threshold`
#[table(name = xp_threshold_reward_def, public)]
#[derive(Clone)]
pub struct XpThresholdRewardDef {
    #[primary_key]
    pub threshold: u64,
    pub reward_items: Vec<u16>,
    pub reward_amounts: Vec<u32>,
}

// ============================================================================
// BALANCES
// ============================================================================

/// Items held by an owner
#[table(name = item_balance, public)]
#[derive(Clone)]
pub struct ItemBalance {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub owner_id: u64,
    pub item_id: u16,
    pub amount: u64,
}
