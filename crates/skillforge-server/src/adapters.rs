//! Bridges between SpacetimeDB rows and skillforge-logic types.
//!
//! The logic crate reads the catalog and balances through its `Catalog` and
//! `ResourceLedger` traits; these adapters implement both over the tables.
//! Players are loaded into logic form, mutated by the commit path, then
//! written back row by row.

use skillforge_logic::catalog::{
    Action, ActionChoice, Catalog, CatalogError, CombatStats, EquipPosition, GuaranteedReward,
    Item, ItemAmount, ItemId, Travel, XpThresholdReward,
};
use skillforge_logic::commit::GameState;
use skillforge_logic::config::EngineConfig;
use skillforge_logic::ledger::{
    check_deltas, net_deltas, InsufficientBalance, ItemDelta, OwnerId, ResourceLedger,
};
use skillforge_logic::player::{CurrentActionProgress, Player as LogicPlayer};
use skillforge_logic::queue::{
    Attire, CombatStyle, QueuedAction as LogicQueuedAction, QueuedActionInput,
};
use skillforge_logic::skills::{Skill, SkillXp, StartSkills};
use spacetimedb::{ReducerContext, Table};

use crate::tables::*;

// ============================================================================
// CATALOG
// ============================================================================

fn opt_item(id: u16) -> Option<ItemId> {
    (id != 0).then_some(id)
}

fn skill_id(skill: Option<Skill>) -> u8 {
    skill.map_or(0, Skill::to_u8)
}

pub fn action_from_row(row: &ActionDef) -> Option<Action> {
    Some(Action {
        id: row.id,
        skill: Skill::from_u8(row.skill)?,
        xp_per_hour: row.xp_per_hour,
        min_xp: row.min_xp,
        action_choice_required: row.action_choice_required,
        success_percent: row.success_percent,
        hand_item_range: (row.hand_item_max != 0).then_some((row.hand_item_min, row.hand_item_max)),
        guaranteed_rewards: row
            .guaranteed_items
            .iter()
            .zip(&row.guaranteed_rates)
            .map(|(item, rate)| GuaranteedReward {
                item: *item,
                rate: *rate,
            })
            .collect(),
        num_spawned: row.num_spawned,
        food_rate: row.food_rate,
        is_available: row.is_available,
        world_location: row.world_location,
    })
}

pub fn action_to_row(action: &Action) -> ActionDef {
    let (hand_item_min, hand_item_max) = action.hand_item_range.unwrap_or((0, 0));
    ActionDef {
        id: action.id,
        skill: action.skill.to_u8(),
        xp_per_hour: action.xp_per_hour,
        min_xp: action.min_xp,
        action_choice_required: action.action_choice_required,
        success_percent: action.success_percent,
        hand_item_min,
        hand_item_max,
        guaranteed_items: action.guaranteed_rewards.iter().map(|r| r.item).collect(),
        guaranteed_rates: action.guaranteed_rewards.iter().map(|r| r.rate).collect(),
        num_spawned: action.num_spawned,
        food_rate: action.food_rate,
        is_available: action.is_available,
        world_location: action.world_location,
    }
}

pub fn choice_from_row(row: &ActionChoiceDef) -> Option<ActionChoice> {
    Some(ActionChoice {
        id: row.id,
        skill: Skill::from_u8(row.skill)?,
        xp_per_hour: row.xp_per_hour,
        min_xp: row.min_xp,
        rate: row.rate,
        inputs: item_amounts(&row.input_items, &row.input_amounts),
        output: opt_item(row.output_item).map(|item| ItemAmount {
            item,
            amount: row.output_amount,
        }),
        travel: row.is_travel.then_some(Travel {
            from: row.travel_from,
            to: row.travel_to,
        }),
    })
}

pub fn choice_to_row(choice: &ActionChoice) -> ActionChoiceDef {
    ActionChoiceDef {
        id: choice.id,
        skill: choice.skill.to_u8(),
        xp_per_hour: choice.xp_per_hour,
        min_xp: choice.min_xp,
        rate: choice.rate,
        input_items: choice.inputs.iter().map(|i| i.item).collect(),
        input_amounts: choice.inputs.iter().map(|i| i.amount).collect(),
        output_item: choice.output.map_or(0, |o| o.item),
        output_amount: choice.output.map_or(0, |o| o.amount),
        is_travel: choice.travel.is_some(),
        travel_from: choice.travel.map_or(0, |t| t.from),
        travel_to: choice.travel.map_or(0, |t| t.to),
    }
}

pub fn item_from_row(row: &ItemDef) -> Item {
    Item {
        id: row.id,
        equip_position: EquipPosition::from_u8(row.equip_position),
        skill: Skill::from_u8(row.skill),
        min_xp: row.min_xp,
        combat_stats: CombatStats {
            melee: row.melee,
            magic: row.magic,
            ranged: row.ranged,
            melee_defence: row.melee_defence,
            magic_defence: row.magic_defence,
            ranged_defence: row.ranged_defence,
            health: row.health,
        },
        health_restored: row.health_restored,
    }
}

pub fn item_to_row(item: &Item) -> ItemDef {
    let s = item.combat_stats;
    ItemDef {
        id: item.id,
        equip_position: item.equip_position.to_u8(),
        skill: skill_id(item.skill),
        min_xp: item.min_xp,
        melee: s.melee,
        magic: s.magic,
        ranged: s.ranged,
        melee_defence: s.melee_defence,
        magic_defence: s.magic_defence,
        ranged_defence: s.ranged_defence,
        health: s.health,
        health_restored: item.health_restored,
    }
}

fn item_amounts(items: &[u16], amounts: &[u32]) -> Vec<ItemAmount> {
    items
        .iter()
        .zip(amounts)
        .map(|(item, amount)| ItemAmount {
            item: *item,
            amount: *amount,
        })
        .collect()
}

pub fn threshold_from_row(row: &XpThresholdRewardDef) -> XpThresholdReward {
    XpThresholdReward {
        threshold: row.threshold,
        rewards: item_amounts(&row.reward_items, &row.reward_amounts),
    }
}

pub fn threshold_to_row(reward: &XpThresholdReward) -> XpThresholdRewardDef {
    XpThresholdRewardDef {
        threshold: reward.threshold,
        reward_items: reward.rewards.iter().map(|r| r.item).collect(),
        reward_amounts: reward.rewards.iter().map(|r| r.amount).collect(),
    }
}

/// Catalog served from the definition tables.
pub struct TableCatalog<'a> {
    pub ctx: &'a ReducerContext,
}

impl Catalog for TableCatalog<'_> {
    fn action(&self, id: u16) -> Result<Action, CatalogError> {
        self.ctx
            .db
            .action_def()
            .id()
            .find(id)
            .as_ref()
            .and_then(action_from_row)
            .ok_or(CatalogError::ActionNotFound(id))
    }

    fn action_choice(&self, id: u16) -> Result<ActionChoice, CatalogError> {
        self.ctx
            .db
            .action_choice_def()
            .id()
            .find(id)
            .as_ref()
            .and_then(choice_from_row)
            .ok_or(CatalogError::ActionChoiceNotFound(id))
    }

    fn item(&self, id: u16) -> Result<Item, CatalogError> {
        self.ctx
            .db
            .item_def()
            .id()
            .find(id)
            .map(|row| item_from_row(&row))
            .ok_or(CatalogError::ItemNotFound(id))
    }

    fn xp_threshold_rewards(&self) -> Vec<XpThresholdReward> {
        let mut rewards: Vec<XpThresholdReward> = self
            .ctx
            .db
            .xp_threshold_reward_def()
            .iter()
            .map(|row| threshold_from_row(&row))
            .collect();
        rewards.sort_by_key(|r| r.threshold);
        rewards
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// Item balances served from the `item_balance` table.
pub struct TableLedger<'a> {
    pub ctx: &'a ReducerContext,
}

impl TableLedger<'_> {
    fn row(&self, owner: OwnerId, item: ItemId) -> Option<ItemBalance> {
        self.ctx
            .db
            .item_balance()
            .iter()
            .find(|b| b.owner_id == owner && b.item_id == item)
    }

    /// Credit `amount` of `item` to `owner`.
    pub fn mint(&self, owner: OwnerId, item: ItemId, amount: u64) {
        match self.row(owner, item) {
            Some(mut row) => {
                row.amount = row.amount.saturating_add(amount);
                self.ctx.db.item_balance().id().update(row);
            }
            None => {
                self.ctx.db.item_balance().insert(ItemBalance {
                    id: 0,
                    owner_id: owner,
                    item_id: item,
                    amount,
                });
            }
        }
    }

    fn set(&self, owner: OwnerId, item: ItemId, amount: u64) {
        match (self.row(owner, item), amount) {
            (Some(row), 0) => {
                self.ctx.db.item_balance().id().delete(row.id);
            }
            (Some(mut row), amount) => {
                row.amount = amount;
                self.ctx.db.item_balance().id().update(row);
            }
            (None, 0) => {}
            (None, amount) => self.mint(owner, item, amount),
        }
    }
}

impl ResourceLedger for TableLedger<'_> {
    fn balance_of(&self, owner: OwnerId, item: ItemId) -> u64 {
        self.row(owner, item).map_or(0, |b| b.amount)
    }

    fn apply_deltas(
        &mut self,
        owner: OwnerId,
        deltas: &[ItemDelta],
    ) -> Result<(), InsufficientBalance> {
        check_deltas(&*self, owner, deltas)?;
        for d in net_deltas(deltas) {
            let current = self.balance_of(owner, d.item);
            let next = if d.amount < 0 {
                current.saturating_sub(d.amount.unsigned_abs())
            } else {
                current.saturating_add(d.amount as u64)
            };
            self.set(owner, d.item, next);
        }
        Ok(())
    }
}

// ============================================================================
// GAME STATE
// ============================================================================

/// The logic-side game state. The admin is the owner id of the admin
/// identity's account, or 0 before that identity has connected.
pub fn game_state(ctx: &ReducerContext, config: &GameConfig) -> GameState {
    let admin = ctx
        .db
        .account()
        .identity()
        .find(config.admin)
        .map(|account| account.owner_id)
        .unwrap_or(0);
    GameState {
        config: EngineConfig {
            max_queue_depth: config.max_queue_depth as usize,
            max_queue_time: config.max_queue_time,
            single_start_skill_bonus_percent: config.single_start_skill_bonus_percent,
            dual_start_skill_bonus_percent: config.dual_start_skill_bonus_percent,
            start_xp: config.start_xp,
        },
        paused: config.paused,
        next_queue_id: config.next_queue_id,
        admin,
    }
}

// ============================================================================
// PLAYERS
// ============================================================================

fn start_skills(row: &Player) -> StartSkills {
    let first = Skill::from_u8(row.start_skill).unwrap_or(Skill::Health);
    StartSkills::new(first, Skill::from_u8(row.second_start_skill))
}

fn attire_from_ids(ids: &[u16]) -> Attire {
    let slot = |i: usize| ids.get(i).copied().and_then(opt_item);
    Attire {
        head: slot(0),
        neck: slot(1),
        body: slot(2),
        arms: slot(3),
        legs: slot(4),
        feet: slot(5),
    }
}

impl From<&ActionArgs> for QueuedActionInput {
    fn from(args: &ActionArgs) -> Self {
        QueuedActionInput {
            action_id: args.action_id,
            choice_id: opt_item(args.choice_id),
            timespan: args.timespan,
            attire: attire_from_ids(&args.attire),
            right_hand: opt_item(args.right_hand),
            left_hand: opt_item(args.left_hand),
            regenerate: opt_item(args.regenerate),
            combat_style: combat_style_from_u8(args.combat_style),
        }
    }
}

fn queue_entry_from_row(row: &QueuedAction) -> LogicQueuedAction {
    LogicQueuedAction {
        queue_id: row.queue_id,
        input: QueuedActionInput {
            action_id: row.action_id,
            choice_id: opt_item(row.choice_id),
            timespan: row.timespan,
            attire: attire_from_ids(&row.attire),
            right_hand: opt_item(row.right_hand),
            left_hand: opt_item(row.left_hand),
            regenerate: opt_item(row.regenerate),
            combat_style: combat_style_from_u8(row.combat_style),
        },
        consumed: row.consumed,
    }
}

pub fn combat_style_from_u8(val: u8) -> CombatStyle {
    match val {
        1 => CombatStyle::Attack,
        2 => CombatStyle::Defence,
        _ => CombatStyle::None,
    }
}

fn combat_style_to_u8(style: CombatStyle) -> u8 {
    match style {
        CombatStyle::None => 0,
        CombatStyle::Attack => 1,
        CombatStyle::Defence => 2,
    }
}

/// Load a player row and its queue into logic form.
pub fn load_player(ctx: &ReducerContext, row: &Player) -> LogicPlayer {
    let mut xp = SkillXp::new();
    for skill in Skill::ALL {
        if let Some(amount) = row.skill_xp.get(skill.to_u8() as usize - 1) {
            xp.add(skill, *amount);
        }
    }

    let mut entries: Vec<QueuedAction> = ctx
        .db
        .queued_action()
        .iter()
        .filter(|q| q.player_id == row.id)
        .collect();
    entries.sort_by_key(|q| q.position);

    LogicPlayer {
        id: row.id,
        owner: row.owner_id,
        start_skills: start_skills(row),
        xp,
        total_xp: row.total_xp,
        progress: CurrentActionProgress {
            start_time: row.progress_start_time,
            skills: row
                .progress_skills
                .iter()
                .zip(&row.progress_xp)
                .filter_map(|(s, xp)| Skill::from_u8(*s).map(|s| (s, *xp)))
                .collect(),
            base_inputs_consumed: row.progress_inputs_consumed,
            food_consumed: row.progress_food_consumed,
        },
        queue: entries.iter().map(queue_entry_from_row).collect(),
        last_processed_time: row.last_processed_time,
        location: row.location,
    }
}

/// Row form of a logic player (queue excluded).
pub fn player_to_row(player: &LogicPlayer) -> Player {
    Player {
        id: player.id,
        owner_id: player.owner,
        start_skill: player.start_skills.first.to_u8(),
        second_start_skill: skill_id(player.start_skills.second),
        skill_xp: Skill::ALL.iter().map(|s| player.xp.get(*s)).collect(),
        total_xp: player.total_xp,
        last_processed_time: player.last_processed_time,
        progress_start_time: player.progress.start_time,
        progress_skills: player.progress.skills.iter().map(|(s, _)| s.to_u8()).collect(),
        progress_xp: player.progress.skills.iter().map(|(_, xp)| *xp).collect(),
        progress_inputs_consumed: player.progress.base_inputs_consumed,
        progress_food_consumed: player.progress.food_consumed,
        location: player.location,
    }
}

/// Write a player back, replacing its queue rows.
pub fn store_player(ctx: &ReducerContext, player: &LogicPlayer) {
    ctx.db.player().id().update(player_to_row(player));

    let stale: Vec<u64> = ctx
        .db
        .queued_action()
        .iter()
        .filter(|q| q.player_id == player.id)
        .map(|q| q.queue_id)
        .collect();
    for queue_id in stale {
        ctx.db.queued_action().queue_id().delete(queue_id);
    }

    for (position, entry) in player.queue.iter().enumerate() {
        let input = &entry.input;
        ctx.db.queued_action().insert(QueuedAction {
            queue_id: entry.queue_id,
            player_id: player.id,
            position: position as u32,
            action_id: input.action_id,
            choice_id: input.choice_id.unwrap_or(0),
            timespan: input.timespan,
            consumed: entry.consumed,
            attire: input
                .attire
                .slots()
                .iter()
                .map(|(_, item)| item.unwrap_or(0))
                .collect(),
            right_hand: input.right_hand.unwrap_or(0),
            left_hand: input.left_hand.unwrap_or(0),
            regenerate: input.regenerate.unwrap_or(0),
            combat_style: combat_style_to_u8(input.combat_style),
        });
    }
}
