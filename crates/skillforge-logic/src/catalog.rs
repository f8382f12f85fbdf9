//! Read-only reference data: actions, action choices and items.
//!
//! The engine never owns game content. It reads definitions through the
//! [`Catalog`] trait, which the in-memory [`InMemoryCatalog`] implements for
//! tests and the harness, and which the server implements over its tables.
//! A catalog is treated as immutable for the duration of one engine call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_INPUTS_PER_CHOICE, RATE_MUL, SECONDS_PER_HOUR};
use crate::skills::Skill;

pub type ActionId = u16;
pub type ChoiceId = u16;
pub type ItemId = u16;
/// A world area. Players start in area 0.
pub type AreaId = u16;

/// Where an item can be worn or used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipPosition {
    Head,
    Neck,
    Body,
    Arms,
    Legs,
    Feet,
    Hand,
    Food,
    Aux,
    None,
}

impl EquipPosition {
    pub fn to_u8(self) -> u8 {
        match self {
            EquipPosition::None => 0,
            EquipPosition::Head => 1,
            EquipPosition::Neck => 2,
            EquipPosition::Body => 3,
            EquipPosition::Arms => 4,
            EquipPosition::Legs => 5,
            EquipPosition::Feet => 6,
            EquipPosition::Hand => 7,
            EquipPosition::Food => 8,
            EquipPosition::Aux => 9,
        }
    }

    pub fn from_u8(val: u8) -> EquipPosition {
        match val {
            1 => EquipPosition::Head,
            2 => EquipPosition::Neck,
            3 => EquipPosition::Body,
            4 => EquipPosition::Arms,
            5 => EquipPosition::Legs,
            6 => EquipPosition::Feet,
            7 => EquipPosition::Hand,
            8 => EquipPosition::Food,
            9 => EquipPosition::Aux,
            _ => EquipPosition::None,
        }
    }
}

/// Combat bonuses granted while an item is equipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub melee: i16,
    pub magic: i16,
    pub ranged: i16,
    pub melee_defence: i16,
    pub magic_defence: i16,
    pub ranged_defence: i16,
    pub health: i16,
}

/// An item definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub equip_position: EquipPosition,
    /// Skill gating use of the item, with `min_xp`.
    #[serde(default)]
    pub skill: Option<Skill>,
    #[serde(default)]
    pub min_xp: u32,
    #[serde(default)]
    pub combat_stats: CombatStats,
    /// Health restored per unit when eaten (food only).
    #[serde(default)]
    pub health_restored: u16,
}

/// An item and a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAmount {
    pub item: ItemId,
    pub amount: u32,
}

/// Output produced by an action that needs no choice.
///
/// `rate` is items per hour scaled by [`GUAR_MUL`](crate::constants::GUAR_MUL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuaranteedReward {
    pub item: ItemId,
    pub rate: u32,
}

/// A catalog-defined task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub skill: Skill,
    pub xp_per_hour: u32,
    #[serde(default)]
    pub min_xp: u32,
    #[serde(default)]
    pub action_choice_required: bool,
    #[serde(default = "default_success_percent")]
    pub success_percent: u8,
    /// Inclusive id range for hand equipment. `None` means no hand item is used.
    #[serde(default)]
    pub hand_item_range: Option<(ItemId, ItemId)>,
    #[serde(default)]
    pub guaranteed_rewards: Vec<GuaranteedReward>,
    /// Monsters spawned per hour (scaled by `SPAWN_MUL` in the catalog tooling).
    #[serde(default)]
    pub num_spawned: u32,
    /// Food eaten per hour while fighting, scaled by `RATE_MUL`.
    #[serde(default)]
    pub food_rate: u32,
    #[serde(default = "default_available")]
    pub is_available: bool,
    /// Area the action can be performed in. Elsewhere it earns nothing.
    #[serde(default)]
    pub world_location: AreaId,
}

fn default_success_percent() -> u8 {
    100
}

fn default_available() -> bool {
    true
}

impl Action {
    pub fn is_combat(&self) -> bool {
        self.skill == Skill::Combat
    }
}

/// A route between two areas, walked by a travel choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Travel {
    pub from: AreaId,
    pub to: AreaId,
}

/// An input/output recipe selectable for an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionChoice {
    pub id: ChoiceId,
    pub skill: Skill,
    #[serde(default)]
    pub xp_per_hour: u32,
    #[serde(default)]
    pub min_xp: u32,
    /// Units per hour, scaled by [`RATE_MUL`](crate::constants::RATE_MUL).
    #[serde(default)]
    pub rate: u32,
    /// Up to two inputs consumed per unit.
    #[serde(default)]
    pub inputs: Vec<ItemAmount>,
    /// Output produced per unit.
    #[serde(default)]
    pub output: Option<ItemAmount>,
    /// Set for travel choices: one completed unit moves the player.
    #[serde(default)]
    pub travel: Option<Travel>,
}

impl ActionChoice {
    /// The only timespan a travel choice may be queued with: one unit at `rate`.
    pub fn travel_timespan(&self) -> Option<u64> {
        self.travel.map(|_| {
            (SECONDS_PER_HOUR as u64 * RATE_MUL as u64).div_ceil(self.rate.max(1) as u64)
        })
    }
}

/// Items granted once when a player's total XP first reaches `threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpThresholdReward {
    pub threshold: u64,
    pub rewards: Vec<ItemAmount>,
}

/// Catalog lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("action not found: {0}")]
    ActionNotFound(ActionId),
    #[error("action choice not found: {0}")]
    ActionChoiceNotFound(ChoiceId),
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),
    #[error("action choice {0} has more than two inputs")]
    TooManyInputs(ChoiceId),
    #[error("id 0 is reserved")]
    ReservedId,
    #[error("travel choice {0} needs a non-zero rate")]
    TravelWithoutRate(ChoiceId),
    #[error("XP threshold 0 is reserved")]
    ZeroThreshold,
}

/// Read-only access to game content by id.
pub trait Catalog {
    fn action(&self, id: ActionId) -> Result<Action, CatalogError>;
    fn action_choice(&self, id: ChoiceId) -> Result<ActionChoice, CatalogError>;
    fn item(&self, id: ItemId) -> Result<Item, CatalogError>;
    /// Every threshold reward, ascending by threshold.
    fn xp_threshold_rewards(&self) -> Vec<XpThresholdReward>;
}

/// Table-backed catalog held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    #[serde(default)]
    actions: BTreeMap<ActionId, Action>,
    #[serde(default)]
    action_choices: BTreeMap<ChoiceId, ActionChoice>,
    #[serde(default)]
    items: BTreeMap<ItemId, Item>,
    #[serde(default)]
    xp_threshold_rewards: BTreeMap<u64, XpThresholdReward>,
}

/// On-disk catalog layout: flat lists.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    actions: Vec<Action>,
    #[serde(default)]
    action_choices: Vec<ActionChoice>,
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    xp_threshold_rewards: Vec<XpThresholdReward>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from the JSON layout used by `data/catalog.json`.
    pub fn from_json(json: &str) -> Result<Self, crate::error::EngineError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for action in file.actions {
            catalog.add_action(action)?;
        }
        for choice in file.action_choices {
            catalog.add_action_choice(choice)?;
        }
        for item in file.items {
            catalog.add_item(item)?;
        }
        for reward in file.xp_threshold_rewards {
            catalog.add_xp_threshold_reward(reward)?;
        }
        Ok(catalog)
    }

    /// Insert or replace an action definition.
    pub fn add_action(&mut self, action: Action) -> Result<(), CatalogError> {
        if action.id == 0 {
            return Err(CatalogError::ReservedId);
        }
        self.actions.insert(action.id, action);
        Ok(())
    }

    /// Insert or replace an action choice.
    pub fn add_action_choice(&mut self, choice: ActionChoice) -> Result<(), CatalogError> {
        if choice.id == 0 {
            return Err(CatalogError::ReservedId);
        }
        if choice.inputs.len() > MAX_INPUTS_PER_CHOICE {
            return Err(CatalogError::TooManyInputs(choice.id));
        }
        if choice.travel.is_some() && choice.rate == 0 {
            return Err(CatalogError::TravelWithoutRate(choice.id));
        }
        self.action_choices.insert(choice.id, choice);
        Ok(())
    }

    /// Insert or replace an item definition.
    pub fn add_item(&mut self, item: Item) -> Result<(), CatalogError> {
        if item.id == 0 {
            return Err(CatalogError::ReservedId);
        }
        self.items.insert(item.id, item);
        Ok(())
    }

    /// Insert or replace the rewards for one total-XP threshold.
    pub fn add_xp_threshold_reward(&mut self, reward: XpThresholdReward) -> Result<(), CatalogError> {
        if reward.threshold == 0 {
            return Err(CatalogError::ZeroThreshold);
        }
        self.xp_threshold_rewards.insert(reward.threshold, reward);
        Ok(())
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    pub fn action_choices(&self) -> impl Iterator<Item = &ActionChoice> {
        self.action_choices.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn threshold_rewards(&self) -> impl Iterator<Item = &XpThresholdReward> {
        self.xp_threshold_rewards.values()
    }
}

impl Catalog for InMemoryCatalog {
    fn action(&self, id: ActionId) -> Result<Action, CatalogError> {
        self.actions
            .get(&id)
            .cloned()
            .ok_or(CatalogError::ActionNotFound(id))
    }

    fn action_choice(&self, id: ChoiceId) -> Result<ActionChoice, CatalogError> {
        self.action_choices
            .get(&id)
            .cloned()
            .ok_or(CatalogError::ActionChoiceNotFound(id))
    }

    fn item(&self, id: ItemId) -> Result<Item, CatalogError> {
        self.items
            .get(&id)
            .cloned()
            .ok_or(CatalogError::ItemNotFound(id))
    }

    fn xp_threshold_rewards(&self) -> Vec<XpThresholdReward> {
        self.xp_threshold_rewards.values().cloned().collect()
    }
}
